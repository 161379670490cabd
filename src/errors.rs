use serde::Serialize;
use uuid::Uuid;

use crate::models::order::OrderStatus;

/// Error taxonomy for the order-management core.
///
/// The two computation components (slot advisor, collection ledger) are
/// total functions and never construct these; errors come from the
/// validation surface around them: status transitions, configuration
/// loading, and caller-supplied lookup keys.
#[derive(Debug, thiserror::Error, Serialize)]
pub enum ServiceError {
    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Invalid status transition from {from} to {to}")]
    InvalidStatusTransition { from: OrderStatus, to: OrderStatus },

    #[error("Order {0} has no recorded weight")]
    MissingWeight(Uuid),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    #[error("Configuration error: {0}")]
    ConfigError(
        #[from]
        #[serde(skip)]
        config::ConfigError,
    ),

    #[error("Other error: {0}")]
    Other(
        #[from]
        #[serde(skip)]
        anyhow::Error,
    ),
}

impl From<validator::ValidationErrors> for ServiceError {
    fn from(err: validator::ValidationErrors) -> Self {
        ServiceError::ValidationError(err.to_string())
    }
}
