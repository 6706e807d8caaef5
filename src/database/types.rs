use std::fmt;

use diesel_derive_enum::DbEnum;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, DbEnum, Serialize)]
#[DieselType = "TrainTypeMapping"]
pub enum TrainType {
    #[db_rename = "High-Speed"]
    #[serde(rename = "High-Speed")]
    HighSpeed,
    #[db_rename = "Bullet"]
    Bullet,
    #[db_rename = "Express"]
    Express,
    #[db_rename = "Fast"]
    Fast,
    #[db_rename = "Direct"]
    Direct,
}

impl TrainType {
    pub fn parse(label: &str) -> Option<TrainType> {
        match label {
            "High-Speed" => Some(TrainType::HighSpeed),
            "Bullet" => Some(TrainType::Bullet),
            "Express" => Some(TrainType::Express),
            "Fast" => Some(TrainType::Fast),
            "Direct" => Some(TrainType::Direct),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            TrainType::HighSpeed => "High-Speed",
            TrainType::Bullet => "Bullet",
            TrainType::Express => "Express",
            TrainType::Fast => "Fast",
            TrainType::Direct => "Direct",
        }
    }
}

/// Lifecycle of a sales order, see `ledger::state` for the allowed moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, DbEnum, Serialize)]
#[DieselType = "OrderStatusMapping"]
pub enum OrderStatus {
    #[db_rename = "Ready"]
    Ready,
    #[db_rename = "Success"]
    Success,
    #[db_rename = "Cancelled"]
    Cancelled,
    #[db_rename = "RefundPending"]
    RefundPending,
    #[db_rename = "Refunded"]
    Refunded,
}

impl OrderStatus {
    pub fn label(&self) -> &'static str {
        match self {
            OrderStatus::Ready => "Ready",
            OrderStatus::Success => "Success",
            OrderStatus::Cancelled => "Cancelled",
            OrderStatus::RefundPending => "RefundPending",
            OrderStatus::Refunded => "Refunded",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Cancelled | OrderStatus::Refunded)
    }
}

/// What the customer last asked for on an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, DbEnum, Serialize)]
#[DieselType = "OperationTypeMapping"]
pub enum OperationType {
    #[db_rename = "Booking"]
    Booking,
    #[db_rename = "Refund"]
    Refund,
}

/// Staff verdict recorded in the audit trail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, DbEnum, Serialize)]
#[DieselType = "DecisionMapping"]
pub enum Decision {
    #[db_rename = "Approve"]
    Approve,
    #[db_rename = "Reject"]
    Reject,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, DbEnum, Serialize)]
#[DieselType = "StaffRoleMapping"]
pub enum StaffRole {
    #[db_rename = "Manager"]
    Manager,
    #[db_rename = "Salesperson"]
    Salesperson,
}

impl StaffRole {
    pub fn parse(label: &str) -> Option<StaffRole> {
        match label {
            "Manager" => Some(StaffRole::Manager),
            "Salesperson" => Some(StaffRole::Salesperson),
            _ => None,
        }
    }
}

// Display impls feed user facing messages
macro_rules! display_as_label {
    ($($ty:ty),*) => {
        $(
            impl fmt::Display for $ty {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    write!(f, "{:?}", self)
                }
            }
        )*
    };
}

display_as_label!(OperationType, Decision, StaffRole);

impl fmt::Display for TrainType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
