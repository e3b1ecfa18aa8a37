//! API route handlers
//!
//! - `health`: liveness and Prometheus metrics
//! - `sync`: the cron trigger that runs one relay pass

pub mod health;
pub mod sync;

use crate::error::RelayError;

/// 404 Not Found handler
pub async fn not_found() -> RelayError {
    RelayError::NotFound
}
