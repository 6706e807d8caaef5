#[macro_use]
extern crate diesel;

#[macro_use]
extern crate diesel_migrations;

pub mod catalog;
pub mod config;
pub mod database;
pub mod error;
pub mod ledger;
pub mod registry;
pub mod report;
pub mod seats;
pub mod service;
pub mod validation;

pub use error::ServiceError;
pub use service::{Clock, FixedClock, Listing, Outcome, SystemClock, TicketOffice};
