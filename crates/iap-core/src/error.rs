//! # Error Types
//!
//! Typed error handling for the purchase coordination bridge.
//! Every detected error condition is translated immediately into a terminal
//! failure event; there is no retry layer anywhere in this crate family.

use crate::code::ResponseCode;
use thiserror::Error;

/// Core error type for all bridge operations
#[derive(Debug, Error)]
pub enum IapError {
    /// Configuration errors (malformed config document, missing fields)
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The billing session is not initialized or the connection dropped
    #[error("billing service not ready")]
    SessionNotReady,

    /// Product id not present in the catalog index
    #[error("product details not found: {product_id}")]
    ProductNotFound { product_id: String },

    /// The billing service answered with a non-OK response code
    #[error("service error [{code}]: {message}")]
    Service {
        code: ResponseCode,
        message: String,
    },

    /// Event/record payload could not be serialized
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// The user dismissed the purchase flow UI
    #[error("purchase canceled by user")]
    UserCancelled,
}

impl IapError {
    /// Response code to surface in failure events for this error.
    pub fn response_code(&self) -> ResponseCode {
        match self {
            IapError::Configuration(_) => ResponseCode::DeveloperError,
            IapError::SessionNotReady => ResponseCode::BillingUnavailable,
            IapError::ProductNotFound { .. } => ResponseCode::ItemUnavailable,
            IapError::Service { code, .. } => *code,
            IapError::Serialization(_) => ResponseCode::Error,
            IapError::UserCancelled => ResponseCode::UserCanceled,
        }
    }
}

/// Result type alias for bridge operations
pub type IapResult<T> = Result<T, IapError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_code_mapping() {
        assert_eq!(
            IapError::SessionNotReady.response_code(),
            ResponseCode::BillingUnavailable
        );
        assert_eq!(
            IapError::ProductNotFound {
                product_id: "x".into()
            }
            .response_code(),
            ResponseCode::ItemUnavailable
        );
        assert_eq!(
            IapError::Service {
                code: ResponseCode::ItemNotOwned,
                message: "not owned".into()
            }
            .response_code(),
            ResponseCode::ItemNotOwned
        );
        assert_eq!(
            IapError::UserCancelled.response_code(),
            ResponseCode::UserCanceled
        );
    }

    #[test]
    fn test_display() {
        let err = IapError::ProductNotFound {
            product_id: "coin_100".into(),
        };
        assert_eq!(err.to_string(), "product details not found: coin_100");
    }
}
