//! Common transport-layer types shared between the API server, the compute
//! crate and the CLI. These structs mirror the handlers' response payloads
//! so every layer agrees on the same JSON shapes.

mod page;
mod period;

pub use page::Page;
pub use period::{ParsePeriodError, Period};

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Generic API response wrapper used by the backend.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ApiResponse<T> {
    /// Response data
    pub data: T,
    /// Response message
    pub message: String,
    /// Success flag
    pub success: bool,
}

impl<T> ApiResponse<T> {
    /// Wraps `data` in a successful response with the given message.
    pub fn ok(data: T, message: impl Into<String>) -> Self {
        Self {
            data,
            message: message.into(),
            success: true,
        }
    }
}
