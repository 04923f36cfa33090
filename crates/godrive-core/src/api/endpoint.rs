//! Typed endpoint descriptions.
//!
//! Every backend call is a request struct implementing [`Endpoint`]. The
//! struct carries its own path, method, body and query, is validated before
//! anything goes on the wire, and decides how HTTP failures map onto
//! [`ApiError`] variants.

use crate::error::ApiError;
use crate::utils::error_helpers::as_validation_error;
use reqwest::Method;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Statuses every endpoint reports as semantic validation failures.
pub const VALIDATION_STATUSES: &[u16] = &[400, 422];

/// Statuses credential endpoints report as validation failures.
pub const CREDENTIAL_STATUSES: &[u16] = &[400, 401, 422];

pub trait Endpoint: Send + Sync {
    type Response: DeserializeOwned + Send + 'static;

    /// Stable name used in logs.
    const NAME: &'static str;
    const METHOD: Method;

    fn path(&self) -> String;

    fn body(&self) -> serde_json::Result<Option<Value>> {
        Ok(None)
    }

    fn query(&self) -> Vec<(&'static str, String)> {
        Vec::new()
    }

    /// Boundary checks run before the request is sent.
    fn validate(&self) -> Result<(), String> {
        Ok(())
    }

    fn map_error(error: ApiError) -> ApiError {
        as_validation_error(error, VALIDATION_STATUSES)
    }
}

/// Serialize a request struct as a JSON body.
pub fn json_body<T: Serialize>(value: &T) -> serde_json::Result<Option<Value>> {
    serde_json::to_value(value).map(Some)
}

pub(crate) fn require_non_empty(field: &str, value: &str) -> Result<(), String> {
    if value.trim().is_empty() {
        Err(format!("{} cannot be empty", field))
    } else {
        Ok(())
    }
}
