//! Seat reconciliation.
//!
//! A passenger travelling from stop `a` to stop `b` of a run occupies every leg
//! whose stop order lies in `[a, b)`. Availability is the minimum counter over
//! those legs, approval takes one seat from each of them and an approved refund
//! hands it back. All functions expect to run inside the caller's transaction.

use chrono::NaiveDate;
use diesel::dsl::{count_star, min};
use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;
use tracing::{debug, info, warn};

use crate::database::models::SalesOrder;
use crate::database::schema::{sales_orders, stopovers, trains};
use crate::database::types::{OperationType, OrderStatus};
use crate::error::{Result, ServiceError};
use crate::ledger::state::{self, Trigger};

/// The legs of one run a passenger occupies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Itinerary {
    pub train_number: String,
    pub start_date: NaiveDate,
    pub departure_stop: i32,
    pub arrival_stop: i32,
}

fn stop_order_of(conn: &SqliteConnection, train_number: &str, start_date: NaiveDate, station_id: i32) -> Result<Option<i32>> {
    Ok(stopovers::table
        .filter(stopovers::train_number.eq(train_number))
        .filter(stopovers::start_date.eq(start_date))
        .filter(stopovers::station_id.eq(station_id))
        .select(stopovers::stop_order)
        .first::<i32>(conn)
        .optional()?)
}

/// Resolves the stop order range of a journey on one specific run.
pub fn itinerary(
    conn: &SqliteConnection,
    train_number: &str,
    start_date: NaiveDate,
    departure_station_id: i32,
    arrival_station_id: i32,
) -> Result<Itinerary> {
    let dep = stop_order_of(conn, train_number, start_date, departure_station_id)?;
    let arr = stop_order_of(conn, train_number, start_date, arrival_station_id)?;

    match (dep, arr) {
        (Some(departure_stop), Some(arrival_stop)) if departure_stop < arrival_stop => Ok(Itinerary {
            train_number: train_number.to_string(),
            start_date,
            departure_stop,
            arrival_stop,
        }),
        (Some(_), Some(_)) => Err(ServiceError::validation(format!(
            "Train {} on {} does not travel in that direction",
            train_number, start_date
        ))),
        _ => Err(ServiceError::not_found(format!(
            "Train {} does not stop at both stations on {}",
            train_number, start_date
        ))),
    }
}

pub fn itinerary_of(conn: &SqliteConnection, order: &SalesOrder) -> Result<Itinerary> {
    itinerary(
        conn,
        &order.train_number,
        order.start_date,
        order.departure_station_id,
        order.arrival_station_id,
    )
}

/// Minimum remaining seats over the occupied legs. The arrival leg is never read.
pub fn available_seats(conn: &SqliteConnection, it: &Itinerary) -> Result<Option<i32>> {
    let seats = stopovers::table
        .filter(stopovers::train_number.eq(it.train_number.as_str()))
        .filter(stopovers::start_date.eq(it.start_date))
        .filter(stopovers::stop_order.ge(it.departure_stop))
        .filter(stopovers::stop_order.lt(it.arrival_stop))
        .select(min(stopovers::seats))
        .first::<Option<i32>>(conn)?;
    debug!(?it, ?seats, "seat availability");
    Ok(seats)
}

fn legs_in_range(conn: &SqliteConnection, it: &Itinerary) -> Result<i64> {
    Ok(stopovers::table
        .filter(stopovers::train_number.eq(it.train_number.as_str()))
        .filter(stopovers::start_date.eq(it.start_date))
        .filter(stopovers::stop_order.ge(it.departure_stop))
        .filter(stopovers::stop_order.lt(it.arrival_stop))
        .select(count_star())
        .first(conn)?)
}

/// Takes one seat on every leg of the itinerary.
///
/// The decrement is conditional on `seats > 0`; when any leg could not be
/// decremented the error aborts the surrounding transaction, so racing
/// approvals can never oversell a leg.
pub fn reserve(conn: &SqliteConnection, it: &Itinerary) -> Result<usize> {
    match available_seats(conn, it)? {
        Some(seats) if seats > 0 => {}
        _ => return Err(ServiceError::NoSeatsAvailable),
    }

    let legs = legs_in_range(conn, it)?;
    let updated = diesel::update(
        stopovers::table
            .filter(stopovers::train_number.eq(it.train_number.as_str()))
            .filter(stopovers::start_date.eq(it.start_date))
            .filter(stopovers::stop_order.ge(it.departure_stop))
            .filter(stopovers::stop_order.lt(it.arrival_stop))
            .filter(stopovers::seats.gt(0)),
    )
    .set(stopovers::seats.eq(stopovers::seats - 1))
    .execute(conn)?;

    if updated as i64 != legs {
        warn!(?it, updated, legs, "seat decrement raced, aborting");
        return Err(ServiceError::NoSeatsAvailable);
    }

    info!(train = %it.train_number, date = %it.start_date, legs = updated, "seats reserved");
    Ok(updated)
}

/// Hands one seat back on every leg of the itinerary, never above the train's capacity.
pub fn release(conn: &SqliteConnection, it: &Itinerary) -> Result<usize> {
    let total_seats = trains::table
        .find(it.train_number.as_str())
        .select(trains::total_seats)
        .first::<i32>(conn)?;

    let legs = legs_in_range(conn, it)?;
    let updated = diesel::update(
        stopovers::table
            .filter(stopovers::train_number.eq(it.train_number.as_str()))
            .filter(stopovers::start_date.eq(it.start_date))
            .filter(stopovers::stop_order.ge(it.departure_stop))
            .filter(stopovers::stop_order.lt(it.arrival_stop))
            .filter(stopovers::seats.lt(total_seats)),
    )
    .set(stopovers::seats.eq(stopovers::seats + 1))
    .execute(conn)?;

    if (updated as i64) < legs {
        warn!(?it, updated, legs, "some legs were already at capacity");
    }
    info!(train = %it.train_number, date = %it.start_date, legs = updated, "seats released");
    Ok(updated)
}

/// Forces every sold order of a train travelling after `today` to Refunded.
///
/// Runs right before the train and its stopovers disappear, so no counters are
/// touched and no audit row is written. Past journeys keep their status.
pub fn cascade_refund(conn: &SqliteConnection, train_number: &str, today: NaiveDate) -> Result<usize> {
    let forced = state::transition(OrderStatus::Success, Trigger::TrainDeleted)?;
    let refunded = diesel::update(
        sales_orders::table
            .filter(sales_orders::train_number.eq(train_number))
            .filter(sales_orders::status.eq_any(vec![OrderStatus::Success, OrderStatus::RefundPending]))
            .filter(sales_orders::start_date.gt(today)),
    )
    .set((
        sales_orders::status.eq(forced.to),
        sales_orders::operation_type.eq(forced.operation_type.unwrap_or(OperationType::Refund)),
    ))
    .execute(conn)?;

    if refunded > 0 {
        info!(train = train_number, refunded, "orders refunded by train removal");
    }
    Ok(refunded)
}
