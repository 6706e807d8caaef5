use chrono::NaiveDate;
use diesel::prelude::*;
use diesel::sql_types::{BigInt, Date, Nullable, Text};
use diesel::sqlite::SqliteConnection;
use serde::Serialize;

use crate::error::Result;

/// Sales figures of one salesperson for one day, money in cents.
#[derive(Debug, Clone, PartialEq, Eq, QueryableByName, Serialize)]
pub struct StaffSales {
    #[sql_type = "Text"]
    pub salesperson_id: String,
    #[sql_type = "Text"]
    pub salesperson_name: String,
    #[sql_type = "BigInt"]
    pub total_orders: i64,
    #[sql_type = "BigInt"]
    pub booking_revenue: i64,
    #[sql_type = "BigInt"]
    pub refund_amount: i64,
}

// Every approval a salesperson made that day is weighed by where its order ended up:
// a booking still in Success counts as revenue, an order now Refunded (by a
// refund approval or by a train removal) counts as a refund.
const DAILY_SALES: &str = "
    SELECT
        s.salesperson_id AS salesperson_id,
        s.salesperson_name AS salesperson_name,
        COUNT(DISTINCT o.order_id) AS total_orders,
        COALESCE(SUM(CASE WHEN o.operation_type = 'Booking' AND o.status = 'Success'
            THEN o.price_cents ELSE 0 END), 0) AS booking_revenue,
        COALESCE(SUM(CASE WHEN o.operation_type = 'Refund' AND o.status = 'Refunded'
            THEN o.price_cents ELSE 0 END), 0) AS refund_amount
    FROM salespersons s
    JOIN order_operations op ON s.salesperson_id = op.salesperson_id
    JOIN sales_orders o ON op.order_id = o.order_id
    WHERE DATE(op.operation_time) = ?
        AND op.operation_type = 'Approve'
        AND o.status IN ('Success', 'Refunded')
        AND (? IS NULL OR s.salesperson_id = ?)
    GROUP BY s.salesperson_id, s.salesperson_name
    ORDER BY (booking_revenue + refund_amount) DESC, s.salesperson_id";

pub fn daily_sales(conn: &SqliteConnection, date: NaiveDate, staff_id: Option<&str>) -> Result<Vec<StaffSales>> {
    Ok(diesel::sql_query(DAILY_SALES)
        .bind::<Date, _>(date)
        .bind::<Nullable<Text>, _>(staff_id)
        .bind::<Nullable<Text>, _>(staff_id)
        .load(conn)?)
}
