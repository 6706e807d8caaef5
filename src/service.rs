//! The boundary handed to front-ends.
//!
//! Every mutation answers with an [`Outcome`], every read with a [`Listing`];
//! failures become display-ready messages and never escape as errors.

use chrono::{Local, NaiveDate, NaiveDateTime};
use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;
use serde::Serialize;
use tracing::{info, warn};

use crate::catalog::{self, RouteStop, ScheduleRow, StopPlan, TicketOffer, TrainSummary};
use crate::database::models::{Customer, OperationDetail, OrderDetail, PriceDetail, Salesperson, Station};
use crate::database::types::{Decision, OrderStatus, StaffRole, TrainType};
use crate::database::Database;
use crate::error::{Result, ServiceError};
use crate::ledger::{self, BookingRequest};
use crate::registry;
use crate::report::{self, StaffSales};
use crate::validation;

/// Source of "now", swapped out in tests.
pub trait Clock {
    fn now(&self) -> NaiveDateTime;

    fn today(&self) -> NaiveDate {
        self.now().date()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDateTime);

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        self.0
    }
}

/// `(success, message)` answer of a mutating operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Outcome {
    pub success: bool,
    pub message: String,
    /// Identifier of what was created, e.g. the new order id.
    pub reference: Option<String>,
}

impl Outcome {
    fn ok(message: impl Into<String>) -> Outcome {
        Outcome { success: true, message: message.into(), reference: None }
    }

    fn failed(err: &ServiceError) -> Outcome {
        Outcome { success: false, message: err.to_string(), reference: None }
    }

    fn with_reference(mut self, reference: impl Into<String>) -> Outcome {
        self.reference = Some(reference.into());
        self
    }
}

/// `(rows, message)` answer of a read; `message` explains an empty or failed read.
#[derive(Debug, Clone, Serialize)]
pub struct Listing<T> {
    pub rows: Vec<T>,
    pub message: Option<String>,
}

impl<T> Listing<T> {
    pub fn is_ok(&self) -> bool {
        self.message.is_none()
    }
}

fn staff_record(id: &str, name: &str, contact_number: &str, email: &str, role: &str) -> Result<Salesperson> {
    Ok(Salesperson {
        salesperson_id: validation::staff_id(id)?.to_string(),
        salesperson_name: validation::text("Name", name, 50)?.to_string(),
        contact_number: validation::text("Contact number", contact_number, 20)?.to_string(),
        email: validation::text("Email", email, 100)?.to_string(),
        role: StaffRole::parse(role.trim()).ok_or_else(|| ServiceError::validation(format!("Unknown role {:?}", role)))?,
    })
}

/// The back-office core: catalog, ledger, seat engine and reports behind one handle.
pub struct TicketOffice<C: Clock = SystemClock> {
    db: Database,
    clock: C,
}

impl TicketOffice<SystemClock> {
    pub fn open(database_url: &str) -> Result<Self> {
        Ok(TicketOffice { db: Database::open(database_url)?, clock: SystemClock })
    }
}

impl<C: Clock> TicketOffice<C> {
    pub fn with_clock(db: Database, clock: C) -> Self {
        TicketOffice { db, clock }
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    pub fn close(self) {
        self.db.close();
    }

    fn mutate<T, F, M>(&mut self, action: &str, op: F, message: M) -> Outcome
    where
        F: FnOnce(&SqliteConnection) -> Result<T>,
        M: FnOnce(T) -> Outcome,
    {
        let result = self
            .db
            .run(|conn| conn.transaction::<_, ServiceError, _>(|| op(conn)));
        match result {
            Ok(value) => message(value),
            Err(err) => {
                warn!(action, %err, "operation failed");
                Outcome::failed(&err)
            }
        }
    }

    fn list<T, F>(&mut self, action: &str, empty: &str, op: F) -> Listing<T>
    where
        F: FnOnce(&SqliteConnection) -> Result<Vec<T>>,
    {
        match self.db.run(op) {
            Ok(rows) if rows.is_empty() => Listing { rows, message: Some(empty.to_string()) },
            Ok(rows) => Listing { rows, message: None },
            Err(err) => {
                warn!(action, %err, "query failed");
                Listing { rows: vec![], message: Some(err.to_string()) }
            }
        }
    }

    // Orders

    #[allow(clippy::too_many_arguments)]
    pub fn create_order(
        &mut self,
        train_number: &str,
        start_date: &str,
        departure_station: &str,
        arrival_station: &str,
        price: &str,
        customer_name: &str,
        customer_id_card: &str,
    ) -> Outcome {
        let now = self.clock.now();
        self.mutate(
            "create order",
            |conn| {
                let request = BookingRequest {
                    train_number: validation::train_number(train_number)?,
                    start_date: validation::date(start_date)?,
                    departure_station: validation::text("Departure station", departure_station, 50)?,
                    arrival_station: validation::text("Arrival station", arrival_station, 50)?,
                    price_cents: validation::price(price)?,
                    customer_name: validation::text("Customer name", customer_name, 50)?,
                    customer_id_card: validation::text("Id card", customer_id_card, 50)?,
                };
                ledger::create_order(conn, &request, now)
            },
            |order| {
                Outcome::ok(format!("Order created successfully! Order ID: {}", order.order_id))
                    .with_reference(order.order_id)
            },
        )
    }

    pub fn cancel_order(&mut self, order_id: &str) -> Outcome {
        let now = self.clock.now();
        self.mutate(
            "cancel order",
            |conn| ledger::cancel_order(conn, validation::order_id(order_id)?, now),
            |_| Outcome::ok("Order cancelled successfully"),
        )
    }

    pub fn request_refund(&mut self, order_id: &str) -> Outcome {
        let now = self.clock.now();
        self.mutate(
            "request refund",
            |conn| ledger::request_refund(conn, validation::order_id(order_id)?, now),
            |_| Outcome::ok("Refund request submitted successfully"),
        )
    }

    /// Staff approval (`approve = true`) or rejection of a pending order.
    pub fn process_order(&mut self, order_id: &str, approve: bool, salesperson_id: &str) -> Outcome {
        let now = self.clock.now();
        let decision = if approve { Decision::Approve } else { Decision::Reject };
        self.mutate(
            "process order",
            |conn| {
                let order_id = validation::order_id(order_id)?;
                ledger::process_order(conn, order_id, decision, validation::staff_id(salesperson_id)?, now)
            },
            |decided| {
                let message = match (decided.from, decided.to) {
                    (OrderStatus::Ready, OrderStatus::Success) => "Order approved successfully",
                    (OrderStatus::Ready, _) => "Order rejected successfully",
                    (_, OrderStatus::Refunded) => "Refund approved successfully",
                    _ => "Refund request rejected successfully",
                };
                Outcome::ok(message).with_reference(decided.order_id)
            },
        )
    }

    pub fn order(&mut self, order_id: &str) -> Listing<OrderDetail> {
        self.list("order detail", "Order not found", |conn| {
            ledger::order_detail(conn, validation::order_id(order_id)?).map(|order| vec![order])
        })
    }

    pub fn orders_by_passenger(&mut self, name: &str, id_card: &str) -> Listing<OrderDetail> {
        self.list("passenger orders", "No orders found for this passenger", |conn| {
            ledger::orders_by_passenger(conn, name.trim(), id_card.trim())
        })
    }

    pub fn pending_orders(&mut self) -> Listing<OrderDetail> {
        self.list("pending orders", "No pending orders found", ledger::pending_orders)
    }

    pub fn order_operations(&mut self, order_id: Option<&str>) -> Listing<OperationDetail> {
        self.list("order operations", "No operations recorded", |conn| {
            ledger::operations(conn, order_id.map(str::trim))
        })
    }

    // Catalog

    pub fn search_available_tickets(&mut self, departure: &str, arrival: &str, date: Option<&str>) -> Listing<TicketOffer> {
        self.list(
            "ticket search",
            "No trains found passing through both stations in the correct order.",
            |conn| catalog::search_tickets(conn, departure.trim(), arrival.trim(), validation::optional_date(date)?),
        )
    }

    pub fn train_route(&mut self, train_number: &str, date: Option<&str>) -> Listing<RouteStop> {
        let empty = match date {
            Some(date) if !date.trim().is_empty() => format!("No route information found for date {}", date.trim()),
            _ => "No route information found".to_string(),
        };
        self.list("train route", &empty, |conn| {
            catalog::find_route(conn, validation::train_number(train_number)?, validation::optional_date(date)?)
        })
    }

    pub fn list_stations(&mut self) -> Listing<Station> {
        self.list("stations", "No stations found.", catalog::list_stations)
    }

    pub fn add_station(&mut self, name: &str, code: Option<&str>) -> Outcome {
        self.mutate(
            "add station",
            |conn| {
                let code = code.map(str::trim).filter(|c| !c.is_empty());
                if let Some(code) = code {
                    validation::text("Station code", code, 10)?;
                }
                catalog::add_station(conn, validation::text("Station name", name, 50)?, code)
            },
            |station| Outcome::ok(format!("Station {} added", station.station_name)).with_reference(station.station_id.to_string()),
        )
    }

    pub fn rename_station(&mut self, old_name: &str, new_name: &str) -> Outcome {
        self.mutate(
            "rename station",
            |conn| catalog::rename_station(conn, old_name.trim(), validation::text("Station name", new_name, 50)?),
            |station| Outcome::ok(format!("Station renamed to {}", station.station_name)),
        )
    }

    pub fn list_trains(&mut self) -> Listing<TrainSummary> {
        self.list("trains", "No trains found.", catalog::list_trains)
    }

    pub fn list_schedules(&mut self) -> Listing<ScheduleRow> {
        self.list("schedules", "No train schedules found", catalog::list_schedules)
    }

    pub fn upsert_train(
        &mut self,
        train_number: &str,
        train_type: &str,
        total_seats: i32,
        departure_station: &str,
        arrival_station: &str,
    ) -> Outcome {
        self.mutate(
            "save train",
            |conn| {
                let train_type = TrainType::parse(train_type.trim())
                    .ok_or_else(|| ServiceError::validation(format!("Unknown train type {:?}", train_type)))?;
                catalog::upsert_train(
                    conn,
                    validation::train_number(train_number)?,
                    train_type,
                    total_seats,
                    validation::text("Departure station", departure_station, 50)?,
                    validation::text("Arrival station", arrival_station, 50)?,
                )
            },
            |train| Outcome::ok(format!("Train {} saved", train.train_number)).with_reference(train.train_number),
        )
    }

    pub fn delete_train(&mut self, train_number: &str) -> Outcome {
        let today = self.clock.today();
        self.mutate(
            "delete train",
            |conn| catalog::delete_train(conn, train_number.trim(), today),
            |removal| {
                info!(?removal, "train removal complete");
                Outcome::ok(format!(
                    "Train {} has been deleted ({} orders refunded, {} stopovers and {} prices removed)",
                    train_number.trim(),
                    removal.refunded_orders,
                    removal.stopovers,
                    removal.prices
                ))
            },
        )
    }

    #[allow(clippy::too_many_arguments)]
    pub fn schedule_stop(
        &mut self,
        train_number: &str,
        station_name: &str,
        start_date: &str,
        arrival_time: Option<&str>,
        departure_time: Option<&str>,
        stop_order: i32,
    ) -> Outcome {
        self.mutate(
            "schedule stop",
            |conn| {
                let parse_time = |raw: Option<&str>| -> Result<Option<NaiveDateTime>> {
                    match raw.map(str::trim) {
                        None | Some("") => Ok(None),
                        Some(raw) => validation::datetime(raw).map(Some),
                    }
                };
                let plan = StopPlan {
                    train_number: validation::train_number(train_number)?,
                    station_name: station_name.trim(),
                    start_date: validation::date(start_date)?,
                    arrival_time: parse_time(arrival_time)?,
                    departure_time: parse_time(departure_time)?,
                    stop_order,
                };
                catalog::schedule_stop(conn, &plan)
            },
            |stop| Outcome::ok(format!("Stop {} scheduled with {} seats", stop.stop_order, stop.seats)),
        )
    }

    pub fn list_prices(&mut self, train_number: Option<&str>) -> Listing<PriceDetail> {
        self.list("prices", "No prices found", |conn| catalog::list_prices(conn, train_number.map(str::trim)))
    }

    pub fn upsert_price(&mut self, train_number: &str, departure_station: &str, arrival_station: &str, price: &str) -> Outcome {
        self.mutate(
            "save price",
            |conn| {
                catalog::upsert_price(
                    conn,
                    validation::train_number(train_number)?,
                    departure_station.trim(),
                    arrival_station.trim(),
                    validation::price(price)?,
                )
            },
            |price| Outcome::ok(format!("Price set to {}", validation::format_cents(price.price_cents))),
        )
    }

    pub fn delete_price(&mut self, train_number: &str, departure_station: &str, arrival_station: &str) -> Outcome {
        self.mutate(
            "delete price",
            |conn| catalog::delete_price(conn, train_number.trim(), departure_station.trim(), arrival_station.trim()),
            |_| Outcome::ok("Price deleted"),
        )
    }

    // People

    pub fn register_customer(&mut self, name: &str, phone: &str, id_card: &str) -> Outcome {
        self.mutate(
            "register customer",
            |conn| {
                let customer = Customer {
                    id_card: validation::text("Id card", id_card, 50)?.to_string(),
                    name: validation::text("Name", name, 50)?.to_string(),
                    phone: validation::text("Phone", phone, 20)?.to_string(),
                };
                registry::register_customer(conn, &customer)?;
                Ok(customer)
            },
            |customer| Outcome::ok(format!("Customer {} registered", customer.name)).with_reference(customer.id_card),
        )
    }

    pub fn register_salesperson(&mut self, id: &str, name: &str, contact_number: &str, email: &str, role: &str) -> Outcome {
        self.mutate(
            "register salesperson",
            |conn| {
                let salesperson = staff_record(id, name, contact_number, email, role)?;
                registry::register_salesperson(conn, &salesperson)?;
                Ok(salesperson)
            },
            |sp| Outcome::ok(format!("Salesperson {} registered", sp.salesperson_name)).with_reference(sp.salesperson_id),
        )
    }

    pub fn update_salesperson(&mut self, id: &str, name: &str, contact_number: &str, email: &str, role: &str) -> Outcome {
        self.mutate(
            "update salesperson",
            |conn| {
                let salesperson = staff_record(id, name, contact_number, email, role)?;
                registry::update_salesperson(conn, &salesperson)?;
                Ok(salesperson)
            },
            |sp| Outcome::ok(format!("Staff {} updated successfully", sp.salesperson_id)).with_reference(sp.salesperson_id),
        )
    }

    pub fn remove_salesperson(&mut self, id: &str) -> Outcome {
        self.mutate(
            "remove salesperson",
            |conn| registry::remove_salesperson(conn, id.trim()),
            |_| Outcome::ok("Salesperson removed"),
        )
    }

    pub fn list_staff(&mut self) -> Listing<Salesperson> {
        self.list("staff", "No staff found", registry::list_staff)
    }

    // Reports

    pub fn daily_sales_report(&mut self, date: &str, staff_id: Option<&str>) -> Listing<StaffSales> {
        self.list("daily sales report", "No data found", |conn| {
            let staff_id = staff_id.map(str::trim).filter(|s| !s.is_empty());
            report::daily_sales(conn, validation::date(date)?, staff_id)
        })
    }
}
