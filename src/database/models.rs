use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;

use super::schema::{customers, order_operations, salespersons, sales_orders, stopovers};
use super::types::{Decision, OperationType, OrderStatus, StaffRole, TrainType};

#[derive(Debug, Clone, Queryable, Serialize)]
pub struct Station {
    pub station_id: i32,
    pub station_name: String,
    pub station_code: Option<String>,
}

#[derive(Debug, Clone, Queryable, Serialize)]
pub struct Train {
    pub train_number: String,
    pub train_type: TrainType,
    pub total_seats: i32,
    pub departure_station_id: i32,
    pub arrival_station_id: i32,
}

#[derive(Debug, Clone, Queryable, Serialize)]
pub struct Stopover {
    pub stopover_id: i32,
    pub train_number: String,
    pub station_id: i32,
    pub start_date: NaiveDate,
    pub arrival_time: Option<NaiveDateTime>,
    pub departure_time: Option<NaiveDateTime>,
    pub stop_order: i32,
    pub seats: i32,
}

#[derive(Debug, Insertable)]
#[table_name = "stopovers"]
pub struct NewStopover<'a> {
    pub train_number: &'a str,
    pub station_id: i32,
    pub start_date: NaiveDate,
    pub arrival_time: Option<NaiveDateTime>,
    pub departure_time: Option<NaiveDateTime>,
    pub stop_order: i32,
    pub seats: i32,
}

#[derive(Debug, Clone, Queryable, Serialize)]
pub struct Price {
    pub price_id: i32,
    pub train_number: String,
    pub departure_station_id: i32,
    pub arrival_station_id: i32,
    pub price_cents: i64,
}

#[derive(Debug, Clone, Queryable, Insertable, Serialize)]
#[table_name = "customers"]
pub struct Customer {
    pub id_card: String,
    pub name: String,
    pub phone: String,
}

#[derive(Debug, Clone, Queryable, Insertable, Serialize)]
#[table_name = "salespersons"]
pub struct Salesperson {
    pub salesperson_id: String,
    pub salesperson_name: String,
    pub contact_number: String,
    pub email: String,
    pub role: StaffRole,
}

#[derive(Debug, Clone, Queryable, Insertable, Serialize)]
#[table_name = "sales_orders"]
pub struct SalesOrder {
    pub order_id: String,
    pub train_number: String,
    pub start_date: NaiveDate,
    pub departure_station_id: i32,
    pub arrival_station_id: i32,
    pub price_cents: i64,
    pub customer_id: String,
    pub operation_type: OperationType,
    pub operation_time: NaiveDateTime,
    pub status: OrderStatus,
}

#[derive(Debug, Insertable)]
#[table_name = "order_operations"]
pub struct NewOrderOperation<'a> {
    pub order_id: &'a str,
    pub salesperson_id: &'a str,
    pub operation_type: Decision,
    pub original_status: OrderStatus,
    pub new_status: OrderStatus,
    pub operation_time: NaiveDateTime,
    pub remarks: Option<&'a str>,
}

/// Row of the `order_details` view; `train_type` is gone once the train is deleted.
#[derive(Debug, Clone, Queryable, Serialize)]
pub struct OrderDetail {
    pub order_id: String,
    pub train_number: String,
    pub train_type: Option<TrainType>,
    pub start_date: NaiveDate,
    pub departure_station: String,
    pub arrival_station: String,
    pub price_cents: i64,
    pub customer_name: String,
    pub customer_id_card: String,
    pub customer_phone: String,
    pub operation_type: OperationType,
    pub operation_time: NaiveDateTime,
    pub status: OrderStatus,
}

#[derive(Debug, Clone, Queryable, Serialize)]
pub struct PriceDetail {
    pub price_id: i32,
    pub train_number: String,
    pub train_type: TrainType,
    pub departure_station: String,
    pub arrival_station: String,
    pub price_cents: i64,
}

#[derive(Debug, Clone, Queryable, Serialize)]
pub struct OperationDetail {
    pub operation_id: i32,
    pub order_id: String,
    pub train_number: String,
    pub customer_name: String,
    pub salesperson_id: String,
    pub salesperson_name: String,
    pub operation_type: Decision,
    pub original_status: OrderStatus,
    pub new_status: OrderStatus,
    pub price_cents: i64,
    pub operation_time: NaiveDateTime,
    pub remarks: Option<String>,
}
