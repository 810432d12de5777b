use serde::{Deserialize, Serialize};

use super::entity;

pub const STATUSES: &[&str] = &["pending", "active", "completed", "cancelled"];
pub const DEFAULT_STATUS: &str = "pending";

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NewOrder {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    pub amount: f64,
}

/// Absent fields are left unchanged.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OrderPatch {
    pub status: Option<String>,
    pub description: Option<String>,
    pub amount: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderDto {
    pub id: i32,
    pub company_id: i32,
    pub status: String,
    pub description: Option<String>,
    pub amount: f64,
    pub created_by: i32,
}

impl From<entity::Model> for OrderDto {
    fn from(m: entity::Model) -> Self {
        Self {
            id: m.id,
            company_id: m.company_id,
            status: m.status,
            description: m.description,
            amount: m.amount,
            created_by: m.created_by,
        }
    }
}

/// Returns the message for an unknown status.
pub(crate) fn check_status(status: &str) -> Result<(), String> {
    if STATUSES.contains(&status) {
        Ok(())
    } else {
        Err(format!(
            "unknown status {status:?}; expected one of {}",
            STATUSES.join(", ")
        ))
    }
}

/// Returns the message for a negative or non-finite amount.
pub(crate) fn check_amount(amount: f64) -> Result<(), String> {
    if amount.is_finite() && amount >= 0.0 {
        Ok(())
    } else {
        Err(format!("amount must be a non-negative number, got {amount}"))
    }
}
