use chrono::{NaiveDate, NaiveDateTime};
use lazy_static::lazy_static;
use regex::Regex;

use crate::error::{Result, ServiceError};

lazy_static! {
    static ref RE_TRAIN_NUMBER: Regex = Regex::new(r"^[A-Za-z0-9]{1,10}$").unwrap();
    static ref RE_STAFF_ID: Regex     = Regex::new(r"^[A-Za-z0-9_\-]{1,10}$").unwrap();
    static ref RE_ORDER_ID: Regex     = Regex::new(r"^\d{18}$").unwrap();
    static ref RE_PRICE: Regex        = Regex::new(r"^\$?(?P<units>\d+)(?:\.(?P<fraction>\d{1,2}))?$").unwrap();
}

pub fn train_number(raw: &str) -> Result<&str> {
    let raw = raw.trim();
    if RE_TRAIN_NUMBER.is_match(raw) {
        Ok(raw)
    } else {
        Err(ServiceError::validation(format!("Invalid train number: {:?}", raw)))
    }
}

pub fn staff_id(raw: &str) -> Result<&str> {
    let raw = raw.trim();
    if RE_STAFF_ID.is_match(raw) {
        Ok(raw)
    } else {
        Err(ServiceError::validation(format!("Invalid salesperson id: {:?}", raw)))
    }
}

pub fn order_id(raw: &str) -> Result<&str> {
    let raw = raw.trim();
    if RE_ORDER_ID.is_match(raw) {
        Ok(raw)
    } else {
        Err(ServiceError::validation(format!("Invalid order id: {:?}", raw)))
    }
}

/// Non-empty, trimmed free text bounded by the column width.
pub fn text<'a>(field: &str, raw: &'a str, max_len: usize) -> Result<&'a str> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(ServiceError::validation(format!("{} must not be empty", field)));
    }
    if raw.chars().count() > max_len {
        return Err(ServiceError::validation(format!("{} is longer than {} characters", field, max_len)));
    }
    Ok(raw)
}

pub fn date(raw: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|_| ServiceError::validation(format!("Invalid date format {:?}, please use YYYY-MM-DD", raw)))
}

pub fn optional_date(raw: Option<&str>) -> Result<Option<NaiveDate>> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(raw) => date(raw).map(Some),
    }
}

pub fn datetime(raw: &str) -> Result<NaiveDateTime> {
    let raw = raw.trim();
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M"))
        .map_err(|_| ServiceError::validation(format!("Invalid time {:?}, please use YYYY-MM-DD HH:MM[:SS]", raw)))
}

/// Parses a price like `553.50` or `$12` into cents; zero and negative amounts are refused.
pub fn price(raw: &str) -> Result<i64> {
    let caps = RE_PRICE
        .captures(raw.trim())
        .ok_or_else(|| ServiceError::validation(format!("Invalid price: {:?}", raw)))?;

    let units: i64 = caps["units"]
        .parse()
        .map_err(|_| ServiceError::validation(format!("Price out of range: {:?}", raw)))?;
    let fraction = match caps.name("fraction").map(|m| m.as_str()) {
        Some(f) if f.len() == 1 => f.parse::<i64>().unwrap_or(0) * 10,
        Some(f) => f.parse::<i64>().unwrap_or(0),
        None => 0,
    };

    let cents = units
        .checked_mul(100)
        .and_then(|c| c.checked_add(fraction))
        .ok_or_else(|| ServiceError::validation(format!("Price out of range: {:?}", raw)))?;
    positive_cents(cents)
}

pub fn positive_cents(cents: i64) -> Result<i64> {
    if cents > 0 {
        Ok(cents)
    } else {
        Err(ServiceError::validation("Price must be greater than zero"))
    }
}

pub fn format_cents(cents: i64) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    format!("{}${}.{:02}", sign, cents.abs() / 100, cents.abs() % 100)
}
