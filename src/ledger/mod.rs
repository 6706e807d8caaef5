//! The order ledger: sales orders, their status machine and the staff audit trail.

pub mod state;

use chrono::{NaiveDate, NaiveDateTime};
use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;
use rand::Rng;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::catalog;
use crate::database::models::{
    Customer, NewOrderOperation, OperationDetail, OrderDetail, SalesOrder, Salesperson,
};
use crate::database::schema::{customers, operation_details, order_details, order_operations, sales_orders, salespersons};
use crate::database::types::{Decision, OperationType, OrderStatus};
use crate::error::{Result, ServiceError};
use crate::seats::{self, Itinerary};
use self::state::{SeatEffect, Transition, Trigger};

/// Everything the booking form hands over.
#[derive(Debug, Clone)]
pub struct BookingRequest<'a> {
    pub train_number: &'a str,
    pub start_date: NaiveDate,
    pub departure_station: &'a str,
    pub arrival_station: &'a str,
    pub price_cents: i64,
    pub customer_name: &'a str,
    pub customer_id_card: &'a str,
}

/// Result of a staff decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Decided {
    pub order_id: String,
    pub decision: Decision,
    pub from: OrderStatus,
    pub to: OrderStatus,
    pub legs_adjusted: usize,
}

/// Order ids are the creation timestamp followed by four random digits.
fn generate_order_id(conn: &SqliteConnection, now: NaiveDateTime) -> Result<String> {
    let mut rng = rand::thread_rng();
    loop {
        let candidate = format!("{}{}", now.format("%Y%m%d%H%M%S"), rng.gen_range(1000..=9999));
        let taken = sales_orders::table
            .find(candidate.as_str())
            .select(sales_orders::order_id)
            .first::<String>(conn)
            .optional()?;
        if taken.is_none() {
            return Ok(candidate);
        }
    }
}

pub fn find_order(conn: &SqliteConnection, order_id: &str) -> Result<SalesOrder> {
    sales_orders::table
        .find(order_id)
        .first::<SalesOrder>(conn)
        .optional()?
        .ok_or_else(|| ServiceError::not_found("Order not found"))
}

/// Books a ticket in status Ready. The customer must already be registered.
pub fn create_order(conn: &SqliteConnection, request: &BookingRequest, now: NaiveDateTime) -> Result<SalesOrder> {
    conn.transaction::<_, ServiceError, _>(|| {
        customers::table
            .filter(customers::name.eq(request.customer_name))
            .filter(customers::id_card.eq(request.customer_id_card))
            .first::<Customer>(conn)
            .optional()?
            .ok_or_else(|| ServiceError::not_found("Customer information not found or incorrect."))?;

        let dep = catalog::find_station(conn, request.departure_station)?;
        let arr = catalog::find_station(conn, request.arrival_station)?;
        let (dep, arr) = match (dep, arr) {
            (Some(dep), Some(arr)) => (dep, arr),
            _ => return Err(ServiceError::not_found("Departure or arrival station not found.")),
        };

        catalog::find_train(conn, request.train_number)?;
        seats::itinerary(conn, request.train_number, request.start_date, dep.station_id, arr.station_id)?;

        let order = SalesOrder {
            order_id: generate_order_id(conn, now)?,
            train_number: request.train_number.to_string(),
            start_date: request.start_date,
            departure_station_id: dep.station_id,
            arrival_station_id: arr.station_id,
            price_cents: request.price_cents,
            customer_id: request.customer_id_card.to_string(),
            operation_type: OperationType::Booking,
            operation_time: now,
            status: OrderStatus::Ready,
        };
        diesel::insert_into(sales_orders::table).values(&order).execute(conn)?;

        info!(order = %order.order_id, train = request.train_number, date = %request.start_date, "order created");
        Ok(order)
    })
}

/// Moves an order along `transition`, guarded on the status it was read in.
fn apply(conn: &SqliteConnection, order: &SalesOrder, transition: &Transition, now: NaiveDateTime) -> Result<()> {
    let target = sales_orders::table
        .filter(sales_orders::order_id.eq(order.order_id.as_str()))
        .filter(sales_orders::status.eq(transition.from));

    let updated = match transition.operation_type {
        Some(operation_type) => diesel::update(target)
            .set((
                sales_orders::status.eq(transition.to),
                sales_orders::operation_type.eq(operation_type),
                sales_orders::operation_time.eq(now),
            ))
            .execute(conn)?,
        None => diesel::update(target)
            .set(sales_orders::status.eq(transition.to))
            .execute(conn)?,
    };

    if updated != 1 {
        warn!(order = %order.order_id, from = %transition.from, "order changed concurrently");
        return Err(ServiceError::invalid_state("Order status changed in the meantime, please retry"));
    }
    Ok(())
}

fn customer_transition(conn: &SqliteConnection, order_id: &str, trigger: Trigger, now: NaiveDateTime) -> Result<SalesOrder> {
    conn.transaction::<_, ServiceError, _>(|| {
        let order = find_order(conn, order_id)?;
        let transition = state::transition(order.status, trigger)?;
        apply(conn, &order, &transition, now)?;
        info!(order = order_id, from = %transition.from, to = %transition.to, ?trigger, "order updated");
        find_order(conn, order_id)
    })
}

/// Customer withdraws a booking that has not been approved yet.
pub fn cancel_order(conn: &SqliteConnection, order_id: &str, now: NaiveDateTime) -> Result<SalesOrder> {
    customer_transition(conn, order_id, Trigger::CustomerCancel, now)
}

/// Customer asks for money back on an approved order.
pub fn request_refund(conn: &SqliteConnection, order_id: &str, now: NaiveDateTime) -> Result<SalesOrder> {
    customer_transition(conn, order_id, Trigger::RequestRefund, now)
}

/// Staff approval or rejection of a Ready or RefundPending order.
///
/// Status change, seat adjustment and audit row commit together: when any of
/// them fails nothing is written, in particular no seat is taken without an
/// approved order and no decision goes unlogged.
pub fn process_order(
    conn: &SqliteConnection,
    order_id: &str,
    decision: Decision,
    salesperson_id: &str,
    now: NaiveDateTime,
) -> Result<Decided> {
    conn.transaction::<_, ServiceError, _>(|| {
        let order = find_order(conn, order_id)?;
        salespersons::table
            .find(salesperson_id)
            .first::<Salesperson>(conn)
            .optional()?
            .ok_or_else(|| ServiceError::not_found(format!("Salesperson {} not found", salesperson_id)))?;

        let transition = state::transition(order.status, Trigger::staff(decision))?;

        let legs_adjusted = match transition.seats {
            SeatEffect::Reserve => {
                let it = seats::itinerary_of(conn, &order)?;
                seats::reserve(conn, &it)?
            }
            SeatEffect::Release => release_if_scheduled(conn, &order)?,
            SeatEffect::Untouched => 0,
        };

        apply(conn, &order, &transition, now)?;

        let remarks = state::remark(transition.from, decision);
        diesel::insert_into(order_operations::table)
            .values(NewOrderOperation {
                order_id,
                salesperson_id,
                operation_type: decision,
                original_status: transition.from,
                new_status: transition.to,
                operation_time: now,
                remarks: Some(remarks.as_str()),
            })
            .execute(conn)
            .map_err(|err| ServiceError::AuditLog(err.to_string()))?;

        info!(
            order = order_id,
            salesperson = salesperson_id,
            %decision,
            from = %transition.from,
            to = %transition.to,
            legs_adjusted,
            "order processed"
        );

        Ok(Decided {
            order_id: order_id.to_string(),
            decision,
            from: transition.from,
            to: transition.to,
            legs_adjusted,
        })
    })
}

// Refunds of runs that were removed from the catalog have no counters left to restore
fn release_if_scheduled(conn: &SqliteConnection, order: &SalesOrder) -> Result<usize> {
    let it: Itinerary = match seats::itinerary_of(conn, order) {
        Ok(it) => it,
        Err(ServiceError::NotFound(_)) => {
            warn!(order = %order.order_id, "run no longer scheduled, no seats to release");
            return Ok(0);
        }
        Err(err) => return Err(err),
    };
    seats::release(conn, &it)
}

pub fn order_detail(conn: &SqliteConnection, order_id: &str) -> Result<OrderDetail> {
    order_details::table
        .find(order_id)
        .first::<OrderDetail>(conn)
        .optional()?
        .ok_or_else(|| ServiceError::not_found("Order not found"))
}

pub fn orders_by_passenger(conn: &SqliteConnection, name: &str, id_card: &str) -> Result<Vec<OrderDetail>> {
    debug!(name, id_card, "looking up passenger orders");
    Ok(order_details::table
        .filter(order_details::customer_name.eq(name))
        .filter(order_details::customer_id_card.eq(id_card))
        .order((order_details::operation_time.desc(), order_details::order_id.desc()))
        .load(conn)?)
}

/// Orders waiting for a staff decision, newest first.
pub fn pending_orders(conn: &SqliteConnection) -> Result<Vec<OrderDetail>> {
    Ok(order_details::table
        .filter(order_details::status.eq_any(vec![OrderStatus::Ready, OrderStatus::RefundPending]))
        .order((order_details::operation_time.desc(), order_details::order_id.desc()))
        .load(conn)?)
}

/// Audit trail, optionally for one order, newest first.
pub fn operations(conn: &SqliteConnection, order_id: Option<&str>) -> Result<Vec<OperationDetail>> {
    let mut query = operation_details::table
        .order((operation_details::operation_time.desc(), operation_details::operation_id.desc()))
        .into_boxed();
    if let Some(order_id) = order_id {
        query = query.filter(operation_details::order_id.eq(order_id));
    }
    Ok(query.load(conn)?)
}
