//! HTTP client for the reconciliation backend.

pub mod client;
pub mod error;
pub mod types;

pub use client::ApiClient;
pub use error::ApiError;
pub use types::{
    ApiCallEvent, ApiCallObserver, ConsolidatedContact, HealthStatus, IdentifyRequest,
    IdentifyResponse,
};
