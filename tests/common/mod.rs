//! Shared fixture: train G1 (1200 seats) running A → B → C on two dates, one
//! customer and one salesperson, on a fresh in-memory store.

#![allow(dead_code)]

use chrono::{NaiveDate, NaiveDateTime};
use diesel::connection::SimpleConnection;
use diesel::prelude::*;

use ticket_office::database::schema::{stations, stopovers};
use ticket_office::database::types::OrderStatus;
use ticket_office::database::Database;
use ticket_office::{FixedClock, Outcome, TicketOffice};

pub const TRAIN: &str = "G1";
pub const CAPACITY: i32 = 1200;
/// Travel date after "today".
pub const RUN: &str = "2026-11-01";
/// Travel date before "today".
pub const PAST_RUN: &str = "2026-10-10";

pub const CUSTOMER: &str = "Alice Zhang";
pub const ID_CARD: &str = "110101199001011234";
pub const STAFF: &str = "S001";

pub type Office = TicketOffice<FixedClock>;

pub fn now() -> NaiveDateTime {
    NaiveDate::from_ymd(2026, 10, 17).and_hms(9, 30, 0)
}

pub fn date(raw: &str) -> NaiveDate {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").unwrap()
}

pub fn empty_office() -> Office {
    TicketOffice::with_clock(Database::in_memory().unwrap(), FixedClock(now()))
}

pub fn assert_ok(outcome: &Outcome) {
    assert!(outcome.success, "operation failed: {}", outcome.message);
}

pub fn schedule_run(office: &mut Office, train: &str, run: &str, stops: &[&str]) {
    for (i, station) in stops.iter().enumerate() {
        let departure = format!("{} {:02}:00", run, 8 + 2 * i);
        let arrival = format!("{} {:02}:50", run, 7 + 2 * i);
        let arrival = if i == 0 { None } else { Some(arrival.as_str()) };
        let departure = if i + 1 == stops.len() { None } else { Some(departure.as_str()) };
        assert_ok(&office.schedule_stop(train, station, run, arrival, departure, i as i32 + 1));
    }
}

/// G1 A → B → C with prices on every segment, running on `RUN` and `PAST_RUN`.
pub fn office() -> Office {
    let mut office = empty_office();
    assert_ok(&office.upsert_train(TRAIN, "High-Speed", CAPACITY, "A", "C"));
    assert_ok(&office.add_station("B", Some("BBB")));
    schedule_run(&mut office, TRAIN, RUN, &["A", "B", "C"]);
    schedule_run(&mut office, TRAIN, PAST_RUN, &["A", "B", "C"]);

    assert_ok(&office.upsert_price(TRAIN, "A", "B", "50.00"));
    assert_ok(&office.upsert_price(TRAIN, "B", "C", "60.00"));
    assert_ok(&office.upsert_price(TRAIN, "A", "C", "100.00"));

    assert_ok(&office.register_customer(CUSTOMER, "13800000000", ID_CARD));
    assert_ok(&office.register_salesperson(STAFF, "Bob Li", "13900000000", "bob@example.com", "Salesperson"));
    office
}

/// Books a ticket and returns the new order id.
pub fn book(office: &mut Office, run: &str, from: &str, to: &str, price: &str) -> String {
    let outcome = office.create_order(TRAIN, run, from, to, price, CUSTOMER, ID_CARD);
    assert_ok(&outcome);
    outcome.reference.expect("order id")
}

pub fn approve(office: &mut Office, order_id: &str) -> Outcome {
    office.process_order(order_id, true, STAFF)
}

pub fn reject(office: &mut Office, order_id: &str) -> Outcome {
    office.process_order(order_id, false, STAFF)
}

/// Seat counters of one run, by stop order.
pub fn seats(office: &Office, train: &str, run: &str) -> Vec<i32> {
    stopovers::table
        .filter(stopovers::train_number.eq(train))
        .filter(stopovers::start_date.eq(date(run)))
        .order(stopovers::stop_order.asc())
        .select(stopovers::seats)
        .load(office.database().connection())
        .unwrap()
}

/// Overwrites the counter of the stop of `train` at `station` on `run`.
pub fn set_seats(office: &Office, train: &str, run: &str, station: &str, value: i32) {
    let conn = office.database().connection();
    let station_id: i32 = stations::table
        .filter(stations::station_name.eq(station))
        .select(stations::station_id)
        .first(conn)
        .unwrap();
    let updated = diesel::update(
        stopovers::table
            .filter(stopovers::train_number.eq(train))
            .filter(stopovers::start_date.eq(date(run)))
            .filter(stopovers::station_id.eq(station_id)),
    )
    .set(stopovers::seats.eq(value))
    .execute(conn)
    .unwrap();
    assert_eq!(updated, 1);
}

pub fn status(office: &mut Office, order_id: &str) -> OrderStatus {
    let listing = office.order(order_id);
    assert!(listing.is_ok(), "{:?}", listing.message);
    listing.rows[0].status
}

/// Makes every audit insert on this store fail.
pub fn break_audit_log(office: &Office) {
    office
        .database()
        .connection()
        .batch_execute(
            "CREATE TEMP TRIGGER audit_offline BEFORE INSERT ON order_operations
             BEGIN SELECT RAISE(ABORT, 'audit log offline'); END;",
        )
        .unwrap();
}
