// HTTP API routes
//
// This module contains all HTTP route handlers for the public API.
// Each submodule handles a specific resource type with its own state.

pub mod comments;
pub mod common;
pub mod error;
pub mod profiles;
pub mod recipes;
pub mod validation;

// Re-export common types
pub use common::{ErrorResponse, ListResponse, MessageResponse};
pub use error::{ApiError, ApiJson, ApiResult};
