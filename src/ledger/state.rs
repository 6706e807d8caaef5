//! The order state machine.
//!
//! ```text
//!            staffApprove            requestRefund             staffApprove
//!   Ready ─────────────────▶ Success ─────────────▶ RefundPending ─────────────▶ Refunded
//!     │                         ▲                        │
//!     │ customerCancel          └────── staffReject ─────┘
//!     │ staffReject
//!     ▼
//!   Cancelled
//! ```
//!
//! A deleted train additionally forces future Success and RefundPending orders
//! straight to Refunded. Cancelled and Refunded are terminal.

use serde::Serialize;

use crate::database::types::{Decision, OperationType, OrderStatus};
use crate::error::{Result, ServiceError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Trigger {
    CustomerCancel,
    RequestRefund,
    StaffApprove,
    StaffReject,
    TrainDeleted,
}

impl Trigger {
    pub fn staff(decision: Decision) -> Trigger {
        match decision {
            Decision::Approve => Trigger::StaffApprove,
            Decision::Reject => Trigger::StaffReject,
        }
    }

    pub const ALL: [Trigger; 5] = [
        Trigger::CustomerCancel,
        Trigger::RequestRefund,
        Trigger::StaffApprove,
        Trigger::StaffReject,
        Trigger::TrainDeleted,
    ];
}

/// What a transition does to the stopover seat counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeatEffect {
    Untouched,
    Reserve,
    Release,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub from: OrderStatus,
    pub to: OrderStatus,
    pub seats: SeatEffect,
    /// Set when the transition also rewrites `operation_type`.
    pub operation_type: Option<OperationType>,
}

pub fn transition(from: OrderStatus, trigger: Trigger) -> Result<Transition> {
    use OrderStatus::*;

    let (to, seats, operation_type) = match (from, trigger) {
        (Ready, Trigger::CustomerCancel) => (Cancelled, SeatEffect::Untouched, None),
        (Success, Trigger::RequestRefund) => (RefundPending, SeatEffect::Untouched, Some(OperationType::Refund)),
        (Ready, Trigger::StaffApprove) => (Success, SeatEffect::Reserve, None),
        (Ready, Trigger::StaffReject) => (Cancelled, SeatEffect::Untouched, None),
        (RefundPending, Trigger::StaffApprove) => (Refunded, SeatEffect::Release, None),
        (RefundPending, Trigger::StaffReject) => (Success, SeatEffect::Untouched, None),
        (Success, Trigger::TrainDeleted) | (RefundPending, Trigger::TrainDeleted) => {
            (Refunded, SeatEffect::Untouched, Some(OperationType::Refund))
        }
        (_, Trigger::CustomerCancel) => {
            return Err(ServiceError::invalid_state("Only orders in Ready status can be cancelled"))
        }
        (_, Trigger::RequestRefund) => {
            return Err(ServiceError::invalid_state("Only successful orders can request refund"))
        }
        (_, Trigger::StaffApprove) | (_, Trigger::StaffReject) => {
            return Err(ServiceError::invalid_state(format!(
                "Order cannot be processed in current status ({})",
                from
            )))
        }
        (_, Trigger::TrainDeleted) => {
            return Err(ServiceError::invalid_state(format!("Order in status {} is not affected by train removal", from)))
        }
    };

    Ok(Transition { from, to, seats, operation_type })
}

/// Remark stored alongside a staff decision.
pub fn remark(from: OrderStatus, decision: Decision) -> String {
    let verb = match decision {
        Decision::Approve => "approved",
        Decision::Reject => "rejected",
    };
    match from {
        OrderStatus::RefundPending => format!("Refund request {} by salesperson", verb),
        _ => format!("Order {} by salesperson", verb),
    }
}
