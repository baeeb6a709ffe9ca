//! # Billing Response Codes
//!
//! The fixed response vocabulary of the platform billing service.
//! Listeners on the other side of the bridge match on these exact string
//! labels, so the set is wire-stable and closed.

use serde::{Deserialize, Serialize};

/// Response code returned by every billing service call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResponseCode {
    Ok,
    UserCanceled,
    ServiceUnavailable,
    ServiceTimeout,
    ServiceDisconnected,
    ItemUnavailable,
    ItemNotOwned,
    ItemAlreadyOwned,
    FeatureNotSupported,
    Error,
    DeveloperError,
    BillingUnavailable,
    /// Fallback for codes outside the known set.
    Unknown,
}

impl ResponseCode {
    /// Returns the stable wire label for this code.
    pub fn as_str(&self) -> &'static str {
        match self {
            ResponseCode::Ok => "OK",
            ResponseCode::UserCanceled => "USER_CANCELED",
            ResponseCode::ServiceUnavailable => "SERVICE_UNAVAILABLE",
            ResponseCode::ServiceTimeout => "SERVICE_TIMEOUT",
            ResponseCode::ServiceDisconnected => "SERVICE_DISCONNECTED",
            ResponseCode::ItemUnavailable => "ITEM_UNAVAILABLE",
            ResponseCode::ItemNotOwned => "ITEM_NOT_OWNED",
            ResponseCode::ItemAlreadyOwned => "ITEM_ALREADY_OWNED",
            ResponseCode::FeatureNotSupported => "FEATURE_NOT_SUPPORTED",
            ResponseCode::Error => "ERROR",
            ResponseCode::DeveloperError => "DEVELOPER_ERROR",
            ResponseCode::BillingUnavailable => "BILLING_UNAVAILABLE",
            ResponseCode::Unknown => "UNKNOWN",
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, ResponseCode::Ok)
    }
}

impl std::fmt::Display for ResponseCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Result envelope carried by every billing service response: a response code
/// plus the service's human-readable debug message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceResult {
    pub code: ResponseCode,
    #[serde(default)]
    pub debug_message: String,
}

impl ServiceResult {
    pub fn new(code: ResponseCode, debug_message: impl Into<String>) -> Self {
        Self {
            code,
            debug_message: debug_message.into(),
        }
    }

    /// An `OK` result with no debug message.
    pub fn ok() -> Self {
        Self::new(ResponseCode::Ok, "")
    }

    pub fn is_ok(&self) -> bool {
        self.code.is_ok()
    }
}

impl std::fmt::Display for ServiceResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "responseCode={}, debugMessage={}",
            self.code, self.debug_message
        )
    }
}
