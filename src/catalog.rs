//! Stations, trains, their scheduled runs and the priced segments between stops.

use std::collections::HashMap;

use chrono::{NaiveDate, NaiveDateTime};
use diesel::dsl::{count_star, min};
use diesel::prelude::*;
use diesel::sql_types::{BigInt, Date, Integer, Nullable, Text, Timestamp};
use diesel::sqlite::SqliteConnection;
use itertools::Itertools;
use serde::Serialize;
use tracing::{debug, info};

use crate::database::models::{Price, PriceDetail, Station, Stopover, Train};
use crate::database::schema::{price_details, prices, stations, stopovers, trains};
use crate::database::types::{TrainType, TrainTypeMapping};
use crate::error::{Result, ServiceError};
use crate::seats;

/// Role of a stop relative to the train's overall endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum StopRole {
    Departure,
    Stopover,
    Arrival,
}

impl StopRole {
    fn of(train: &Train, station_id: i32) -> StopRole {
        if station_id == train.departure_station_id {
            StopRole::Departure
        } else if station_id == train.arrival_station_id {
            StopRole::Arrival
        } else {
            StopRole::Stopover
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RouteStop {
    pub train_number: String,
    pub start_date: NaiveDate,
    pub station_name: String,
    pub station_code: Option<String>,
    pub arrival_time: Option<NaiveDateTime>,
    pub departure_time: Option<NaiveDateTime>,
    pub role: StopRole,
    pub stop_order: i32,
    pub sold: i32,
}

#[derive(Debug, Clone, Serialize)]
pub struct TicketOffer {
    pub train_number: String,
    pub start_date: NaiveDate,
    pub departure_station: String,
    pub departure_time: Option<NaiveDateTime>,
    pub arrival_station: String,
    pub arrival_time: Option<NaiveDateTime>,
    pub price_cents: i64,
    pub available_seats: i32,
    pub train_type: TrainType,
}

#[derive(Debug, Clone, Serialize)]
pub struct TrainSummary {
    pub train_number: String,
    pub train_type: TrainType,
    pub total_seats: i32,
    pub departure_station: String,
    pub arrival_station: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScheduleRow {
    pub train_number: String,
    pub train_type: TrainType,
    pub departure_station: String,
    pub arrival_station: String,
    pub start_date: Option<NaiveDate>,
    pub stopover_station: Option<String>,
    pub stop_order: Option<i32>,
    pub seats: Option<i32>,
    pub arrival_time: Option<NaiveDateTime>,
    pub departure_time: Option<NaiveDateTime>,
}

/// Outcome of a train removal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TrainRemoval {
    pub refunded_orders: usize,
    pub stopovers: i64,
    pub prices: i64,
}

/// One stop of a run as handed in by the management front-end.
#[derive(Debug, Clone)]
pub struct StopPlan<'a> {
    pub train_number: &'a str,
    pub station_name: &'a str,
    pub start_date: NaiveDate,
    pub arrival_time: Option<NaiveDateTime>,
    pub departure_time: Option<NaiveDateTime>,
    pub stop_order: i32,
}

// Stations

pub fn find_station(conn: &SqliteConnection, name: &str) -> Result<Option<Station>> {
    Ok(stations::table
        .filter(stations::station_name.eq(name))
        .first::<Station>(conn)
        .optional()?)
}

pub fn station_by_name(conn: &SqliteConnection, name: &str) -> Result<Station> {
    find_station(conn, name)?.ok_or_else(|| ServiceError::not_found(format!("Station {:?} not found", name)))
}

pub fn add_station(conn: &SqliteConnection, name: &str, code: Option<&str>) -> Result<Station> {
    #[derive(Debug, Insertable)]
    #[table_name = "stations"]
    struct StationInsertable<'a> { station_name: &'a str, station_code: Option<&'a str> }

    if find_station(conn, name)?.is_some() {
        return Err(ServiceError::validation(format!("Station {:?} already exists", name)));
    }
    diesel::insert_into(stations::table)
        .values(StationInsertable { station_name: name, station_code: code })
        .execute(conn)?;
    info!(station = name, "station added");
    station_by_name(conn, name)
}

/// Renaming is the only change allowed once a station is referenced.
pub fn rename_station(conn: &SqliteConnection, old_name: &str, new_name: &str) -> Result<Station> {
    let station = station_by_name(conn, old_name)?;
    if find_station(conn, new_name)?.is_some() {
        return Err(ServiceError::validation(format!("Station {:?} already exists", new_name)));
    }
    diesel::update(stations::table.find(station.station_id))
        .set(stations::station_name.eq(new_name))
        .execute(conn)?;
    info!(from = old_name, to = new_name, "station renamed");
    station_by_name(conn, new_name)
}

pub fn list_stations(conn: &SqliteConnection) -> Result<Vec<Station>> {
    Ok(stations::table.order(stations::station_id.asc()).load(conn)?)
}

fn station_names(conn: &SqliteConnection) -> Result<HashMap<i32, String>> {
    Ok(stations::table
        .select((stations::station_id, stations::station_name))
        .load::<(i32, String)>(conn)?
        .into_iter()
        .collect())
}

fn station_or_create(conn: &SqliteConnection, name: &str) -> Result<Station> {
    match find_station(conn, name)? {
        Some(station) => Ok(station),
        None => add_station(conn, name, None),
    }
}

// Trains

pub fn find_train(conn: &SqliteConnection, train_number: &str) -> Result<Train> {
    trains::table
        .find(train_number)
        .first::<Train>(conn)
        .optional()?
        .ok_or_else(|| ServiceError::not_found(format!("Train {} not found", train_number)))
}

/// Creates or updates a train. Unknown endpoint stations are created on the fly.
///
/// A capacity change shifts every stopover counter of the train by the same
/// delta, keeping the number of sold seats per leg intact.
pub fn upsert_train(
    conn: &SqliteConnection,
    train_number: &str,
    train_type: TrainType,
    total_seats: i32,
    departure_station: &str,
    arrival_station: &str,
) -> Result<Train> {
    #[derive(Debug, Insertable, AsChangeset)]
    #[table_name = "trains"]
    struct TrainInsertable<'a> {
        train_number: &'a str,
        train_type: TrainType,
        total_seats: i32,
        departure_station_id: i32,
        arrival_station_id: i32,
    }

    if total_seats <= 0 {
        return Err(ServiceError::validation("Total seats must be greater than zero"));
    }
    if departure_station == arrival_station {
        return Err(ServiceError::validation("Departure and arrival station must differ"));
    }

    let dep = station_or_create(conn, departure_station)?;
    let arr = station_or_create(conn, arrival_station)?;
    let row = TrainInsertable {
        train_number,
        train_type,
        total_seats,
        departure_station_id: dep.station_id,
        arrival_station_id: arr.station_id,
    };

    let existing = trains::table.find(train_number).first::<Train>(conn).optional()?;
    match existing {
        None => {
            diesel::insert_into(trains::table).values(&row).execute(conn)?;
            info!(train = train_number, %train_type, total_seats, "train added");
        }
        Some(old) => {
            let delta = total_seats - old.total_seats;
            if delta != 0 {
                let lowest = stopovers::table
                    .filter(stopovers::train_number.eq(train_number))
                    .select(min(stopovers::seats))
                    .first::<Option<i32>>(conn)?;
                if lowest.map_or(false, |seats| seats + delta < 0) {
                    return Err(ServiceError::validation(format!(
                        "Cannot reduce train {} to {} seats, more tickets are already sold",
                        train_number, total_seats
                    )));
                }
                diesel::update(stopovers::table.filter(stopovers::train_number.eq(train_number)))
                    .set(stopovers::seats.eq(stopovers::seats + delta))
                    .execute(conn)?;
            }
            diesel::update(trains::table.find(train_number)).set(&row).execute(conn)?;
            info!(train = train_number, %train_type, total_seats, delta, "train updated");
        }
    }

    find_train(conn, train_number)
}

pub fn list_trains(conn: &SqliteConnection) -> Result<Vec<TrainSummary>> {
    let names = station_names(conn)?;
    let name_of = |id: i32| names.get(&id).cloned().unwrap_or_else(|| "Unknown".to_string());

    Ok(trains::table
        .order(trains::train_number.asc())
        .load::<Train>(conn)?
        .into_iter()
        .map(|t| TrainSummary {
            departure_station: name_of(t.departure_station_id),
            arrival_station: name_of(t.arrival_station_id),
            train_number: t.train_number,
            train_type: t.train_type,
            total_seats: t.total_seats,
        })
        .collect())
}

/// Removes a train with its stopovers and prices, refunding future sold orders first.
pub fn delete_train(conn: &SqliteConnection, train_number: &str, today: NaiveDate) -> Result<TrainRemoval> {
    find_train(conn, train_number)?;

    let refunded_orders = seats::cascade_refund(conn, train_number, today)?;
    let stopover_count = stopovers::table
        .filter(stopovers::train_number.eq(train_number))
        .select(count_star())
        .first::<i64>(conn)?;
    let price_count = prices::table
        .filter(prices::train_number.eq(train_number))
        .select(count_star())
        .first::<i64>(conn)?;

    // stopovers and prices follow through ON DELETE CASCADE
    diesel::delete(trains::table.find(train_number)).execute(conn)?;
    info!(train = train_number, refunded_orders, stopovers = stopover_count, prices = price_count, "train deleted");

    Ok(TrainRemoval { refunded_orders, stopovers: stopover_count, prices: price_count })
}

// Runs

/// Adds one stop to a run. The counter starts at the train's full capacity.
pub fn schedule_stop(conn: &SqliteConnection, plan: &StopPlan) -> Result<Stopover> {
    use crate::database::models::NewStopover;

    if plan.stop_order <= 0 {
        return Err(ServiceError::validation("Stop order must be greater than zero"));
    }
    if let (Some(arrival), Some(departure)) = (plan.arrival_time, plan.departure_time) {
        if departure < arrival {
            return Err(ServiceError::validation("Departure time lies before arrival time"));
        }
    }

    let train = find_train(conn, plan.train_number)?;
    let station = station_by_name(conn, plan.station_name)?;

    let taken = stopovers::table
        .filter(stopovers::train_number.eq(plan.train_number))
        .filter(stopovers::start_date.eq(plan.start_date))
        .filter(stopovers::stop_order.eq(plan.stop_order).or(stopovers::station_id.eq(station.station_id)))
        .select(count_star())
        .first::<i64>(conn)?;
    if taken > 0 {
        return Err(ServiceError::validation(format!(
            "Train {} on {} already has stop {} or visits {}",
            plan.train_number, plan.start_date, plan.stop_order, plan.station_name
        )));
    }

    diesel::insert_into(stopovers::table)
        .values(NewStopover {
            train_number: plan.train_number,
            station_id: station.station_id,
            start_date: plan.start_date,
            arrival_time: plan.arrival_time,
            departure_time: plan.departure_time,
            stop_order: plan.stop_order,
            seats: train.total_seats,
        })
        .execute(conn)?;
    debug!(train = plan.train_number, station = plan.station_name, date = %plan.start_date, order = plan.stop_order, "stop scheduled");

    Ok(stopovers::table
        .filter(stopovers::train_number.eq(plan.train_number))
        .filter(stopovers::start_date.eq(plan.start_date))
        .filter(stopovers::station_id.eq(station.station_id))
        .first(conn)?)
}

/// Route of a train, tagged with stop roles and the seats sold per leg.
///
/// Without a date every scheduled run is returned, ordered by date and stop order.
pub fn find_route(conn: &SqliteConnection, train_number: &str, date: Option<NaiveDate>) -> Result<Vec<RouteStop>> {
    let train = find_train(conn, train_number)?;

    let mut query = stopovers::table
        .inner_join(stations::table)
        .filter(stopovers::train_number.eq(train_number))
        .select((
            stopovers::start_date,
            stations::station_id,
            stations::station_name,
            stations::station_code,
            stopovers::arrival_time,
            stopovers::departure_time,
            stopovers::stop_order,
            stopovers::seats,
        ))
        .order((stopovers::start_date.asc(), stopovers::stop_order.asc()))
        .into_boxed();
    if let Some(date) = date {
        query = query.filter(stopovers::start_date.eq(date));
    }

    let rows = query.load::<(
        NaiveDate,
        i32,
        String,
        Option<String>,
        Option<NaiveDateTime>,
        Option<NaiveDateTime>,
        i32,
        i32,
    )>(conn)?;

    Ok(rows
        .into_iter()
        .map(|(start_date, station_id, station_name, station_code, arrival_time, departure_time, stop_order, seats)| RouteStop {
            train_number: train.train_number.clone(),
            start_date,
            station_name,
            station_code,
            arrival_time,
            departure_time,
            role: StopRole::of(&train, station_id),
            stop_order,
            sold: train.total_seats - seats,
        })
        .collect())
}

/// Every train with its scheduled stops; trains without runs yield one row with empty stop columns.
pub fn list_schedules(conn: &SqliteConnection) -> Result<Vec<ScheduleRow>> {
    let names = station_names(conn)?;
    let name_of = |id: i32| names.get(&id).cloned().unwrap_or_else(|| "Unknown".to_string());

    let all_trains = trains::table.order(trains::train_number.asc()).load::<Train>(conn)?;
    let stops = stopovers::table
        .order((stopovers::train_number.asc(), stopovers::start_date.asc(), stopovers::stop_order.asc()))
        .load::<Stopover>(conn)?;
    let mut by_train: HashMap<String, Vec<Stopover>> = stops
        .into_iter()
        .group_by(|s| s.train_number.clone())
        .into_iter()
        .map(|(number, group)| (number, group.collect()))
        .collect();

    let mut rows = vec![];
    for train in all_trains {
        let base = ScheduleRow {
            train_number: train.train_number.clone(),
            train_type: train.train_type,
            departure_station: name_of(train.departure_station_id),
            arrival_station: name_of(train.arrival_station_id),
            start_date: None,
            stopover_station: None,
            stop_order: None,
            seats: None,
            arrival_time: None,
            departure_time: None,
        };

        match by_train.remove(&train.train_number) {
            None => rows.push(base),
            Some(stops) => rows.extend(stops.into_iter().map(|s| ScheduleRow {
                start_date: Some(s.start_date),
                stopover_station: Some(name_of(s.station_id)),
                stop_order: Some(s.stop_order),
                seats: Some(s.seats),
                arrival_time: s.arrival_time,
                departure_time: s.departure_time,
                ..base.clone()
            })),
        }
    }
    Ok(rows)
}

// Prices

pub fn upsert_price(
    conn: &SqliteConnection,
    train_number: &str,
    departure_station: &str,
    arrival_station: &str,
    price_cents: i64,
) -> Result<Price> {
    #[derive(Debug, Insertable)]
    #[table_name = "prices"]
    struct PriceInsertable<'a> {
        train_number: &'a str,
        departure_station_id: i32,
        arrival_station_id: i32,
        price_cents: i64,
    }

    find_train(conn, train_number)?;
    let dep = station_by_name(conn, departure_station)?;
    let arr = station_by_name(conn, arrival_station)?;
    if dep.station_id == arr.station_id {
        return Err(ServiceError::validation("Departure and arrival station must differ"));
    }

    let segment = || {
        prices::table
            .filter(prices::train_number.eq(train_number))
            .filter(prices::departure_station_id.eq(dep.station_id))
            .filter(prices::arrival_station_id.eq(arr.station_id))
    };

    let updated = diesel::update(segment())
        .set(prices::price_cents.eq(price_cents))
        .execute(conn)?;
    if updated == 0 {
        diesel::insert_into(prices::table)
            .values(PriceInsertable {
                train_number,
                departure_station_id: dep.station_id,
                arrival_station_id: arr.station_id,
                price_cents,
            })
            .execute(conn)?;
    }
    info!(train = train_number, from = departure_station, to = arrival_station, price_cents, "price set");

    Ok(segment().first(conn)?)
}

pub fn delete_price(conn: &SqliteConnection, train_number: &str, departure_station: &str, arrival_station: &str) -> Result<()> {
    let dep = station_by_name(conn, departure_station)?;
    let arr = station_by_name(conn, arrival_station)?;

    let deleted = diesel::delete(
        prices::table
            .filter(prices::train_number.eq(train_number))
            .filter(prices::departure_station_id.eq(dep.station_id))
            .filter(prices::arrival_station_id.eq(arr.station_id)),
    )
    .execute(conn)?;
    if deleted == 0 {
        return Err(ServiceError::not_found(format!(
            "No price for train {} from {} to {}",
            train_number, departure_station, arrival_station
        )));
    }
    info!(train = train_number, from = departure_station, to = arrival_station, "price removed");
    Ok(())
}

pub fn list_prices(conn: &SqliteConnection, train_number: Option<&str>) -> Result<Vec<PriceDetail>> {
    let mut query = price_details::table
        .order((
            price_details::train_number.asc(),
            price_details::departure_station.asc(),
            price_details::arrival_station.asc(),
        ))
        .into_boxed();
    if let Some(train_number) = train_number {
        query = query.filter(price_details::train_number.eq(train_number));
    }
    Ok(query.load(conn)?)
}

// Ticket search

#[derive(Debug, QueryableByName)]
struct OfferRow {
    #[sql_type = "Text"]
    train_number: String,
    #[sql_type = "Date"]
    start_date: NaiveDate,
    #[sql_type = "Nullable<Timestamp>"]
    departure_time: Option<NaiveDateTime>,
    #[sql_type = "Nullable<Timestamp>"]
    arrival_time: Option<NaiveDateTime>,
    #[sql_type = "Integer"]
    available_seats: i32,
    #[sql_type = "TrainTypeMapping"]
    train_type: TrainType,
    #[sql_type = "BigInt"]
    price_cents: i64,
}

// s1 is the boarding stop, s2 the alighting stop and s3 ranges over every leg in between
const OFFER_QUERY: &str = "
    SELECT
        s1.train_number AS train_number,
        s1.start_date AS start_date,
        s1.departure_time AS departure_time,
        s2.arrival_time AS arrival_time,
        MIN(s3.seats) AS available_seats,
        t.train_type AS train_type,
        p.price_cents AS price_cents
    FROM stopovers s1
    JOIN stopovers s2 ON s1.train_number = s2.train_number AND s1.start_date = s2.start_date
    JOIN stopovers s3 ON s1.train_number = s3.train_number AND s1.start_date = s3.start_date
    JOIN trains t ON s1.train_number = t.train_number
    JOIN prices p ON s1.train_number = p.train_number
        AND s1.station_id = p.departure_station_id
        AND s2.station_id = p.arrival_station_id
    WHERE s1.station_id = ?
        AND s2.station_id = ?
        AND s1.stop_order < s2.stop_order
        AND s3.stop_order >= s1.stop_order
        AND s3.stop_order < s2.stop_order
        AND (? IS NULL OR DATE(COALESCE(s1.departure_time, s1.start_date)) = ?)
    GROUP BY s1.train_number, s1.start_date, s1.departure_time, s2.arrival_time, t.train_type, p.price_cents
    ORDER BY s1.departure_time, s1.train_number";

/// Every run that visits `departure` strictly before `arrival` and has a price for
/// exactly that segment. Unknown stations simply yield no offers.
pub fn search_tickets(
    conn: &SqliteConnection,
    departure: &str,
    arrival: &str,
    date: Option<NaiveDate>,
) -> Result<Vec<TicketOffer>> {
    let (dep, arr) = match (find_station(conn, departure)?, find_station(conn, arrival)?) {
        (Some(dep), Some(arr)) => (dep, arr),
        _ => {
            debug!(departure, arrival, "unknown station in search");
            return Ok(vec![]);
        }
    };

    let rows = diesel::sql_query(OFFER_QUERY)
        .bind::<Integer, _>(dep.station_id)
        .bind::<Integer, _>(arr.station_id)
        .bind::<Nullable<Date>, _>(date)
        .bind::<Nullable<Date>, _>(date)
        .load::<OfferRow>(conn)?;

    Ok(rows
        .into_iter()
        .map(|row| TicketOffer {
            train_number: row.train_number,
            start_date: row.start_date,
            departure_station: dep.station_name.clone(),
            departure_time: row.departure_time,
            arrival_station: arr.station_name.clone(),
            arrival_time: row.arrival_time,
            price_cents: row.price_cents,
            available_seats: row.available_seats,
            train_type: row.train_type,
        })
        .collect())
}
