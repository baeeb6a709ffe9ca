//! # Billing Service Trait
//!
//! The seam to the platform billing service. The real service (product
//! catalog authority, purchase flow UI, token issuance) sits behind this
//! trait; the bridge only sees its fixed response vocabulary.
//!
//! Purchase flow launches are fire-and-forget: the terminal outcome arrives
//! later on the unsolicited purchase-update channel, never as a direct
//! return value.

use crate::code::{ResponseCode, ServiceResult};
use crate::error::{IapError, IapResult};
use crate::product::ServiceProductDescriptor;
use crate::purchase::{ServiceHistoryRecord, ServicePurchase};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// The two query namespaces of the billing service catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProductCategory {
    /// One-time purchase products (consumable and non-consumable)
    OneTime,
    /// Subscription products
    Subscription,
}

impl ProductCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProductCategory::OneTime => "inapp",
            ProductCategory::Subscription => "subs",
        }
    }
}

/// Parameters for launching the purchase flow UI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PurchaseFlowRequest {
    pub product_id: String,
    /// Subscription offer token; `None` for one-time products
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offer_token: Option<String>,
}

/// Response envelope for billing service queries: the service result plus an
/// optional payload. A missing payload is a failure even when the result
/// code looks OK.
#[derive(Debug, Clone)]
pub struct ServiceResponse<T> {
    pub result: ServiceResult,
    pub payload: Option<T>,
}

impl<T> ServiceResponse<T> {
    pub fn ok(payload: T) -> Self {
        Self {
            result: ServiceResult::ok(),
            payload: Some(payload),
        }
    }

    pub fn err(result: ServiceResult) -> Self {
        Self {
            result,
            payload: None,
        }
    }

    /// Collapse the envelope into a typed result. Non-OK codes become
    /// `IapError::Service` (or `UserCancelled`), and an OK result with no
    /// payload is an error too.
    pub fn into_result(self) -> IapResult<T> {
        match self.result.code {
            ResponseCode::Ok => self.payload.ok_or_else(|| IapError::Service {
                code: ResponseCode::Error,
                message: "response payload missing".into(),
            }),
            ResponseCode::UserCanceled => Err(IapError::UserCancelled),
            code => Err(IapError::Service {
                code,
                message: self.result.debug_message,
            }),
        }
    }
}

/// Asynchronous interface to the platform billing service.
///
/// All calls are non-blocking; there are no internal retries and no
/// timeouts. Implementations must deliver unsolicited purchase updates
/// through the coordinator's single dispatch context.
#[async_trait]
pub trait BillingService: Send + Sync {
    /// Run one connection attempt. Never retried automatically.
    async fn start_connection(&self) -> ServiceResult;

    /// Whether the service currently accepts calls.
    fn is_ready(&self) -> bool;

    /// Query product descriptors for one category of the declared ids.
    async fn query_product_details(
        &self,
        category: ProductCategory,
        product_ids: &[String],
    ) -> ServiceResponse<Vec<ServiceProductDescriptor>>;

    /// Launch the purchase flow UI. Fire-and-forget; the outcome arrives on
    /// the purchase-update channel.
    async fn launch_purchase_flow(&self, request: PurchaseFlowRequest) -> ServiceResult;

    /// Purchases currently known to the service for a category.
    async fn query_purchases(
        &self,
        category: ProductCategory,
    ) -> ServiceResponse<Vec<ServicePurchase>>;

    /// Historical (possibly consumed) purchase records for a category.
    async fn query_purchase_history(
        &self,
        category: ProductCategory,
    ) -> ServiceResponse<Vec<ServiceHistoryRecord>>;

    /// Mark a consumable purchase consumed.
    async fn consume(&self, purchase_token: &str) -> ServiceResult;

    /// Acknowledge a non-consumable purchase.
    async fn acknowledge(&self, purchase_token: &str) -> ServiceResult;

    /// Tear down the connection.
    async fn end_connection(&self);
}

/// Shared handle to a billing service implementation.
pub type SharedBillingService = Arc<dyn BillingService>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_labels() {
        assert_eq!(ProductCategory::OneTime.as_str(), "inapp");
        assert_eq!(ProductCategory::Subscription.as_str(), "subs");
    }

    #[test]
    fn test_response_into_result() {
        let ok: ServiceResponse<u32> = ServiceResponse::ok(7);
        assert_eq!(ok.into_result().unwrap(), 7);

        let missing: ServiceResponse<u32> = ServiceResponse {
            result: ServiceResult::ok(),
            payload: None,
        };
        assert!(matches!(
            missing.into_result(),
            Err(IapError::Service {
                code: ResponseCode::Error,
                ..
            })
        ));

        let cancelled: ServiceResponse<u32> = ServiceResponse::err(ServiceResult::new(
            ResponseCode::UserCanceled,
            "dismissed",
        ));
        assert!(matches!(cancelled.into_result(), Err(IapError::UserCancelled)));

        let failed: ServiceResponse<u32> = ServiceResponse::err(ServiceResult::new(
            ResponseCode::ServiceTimeout,
            "timed out",
        ));
        match failed.into_result() {
            Err(IapError::Service { code, message }) => {
                assert_eq!(code, ResponseCode::ServiceTimeout);
                assert_eq!(message, "timed out");
            }
            other => panic!("unexpected: {other:?}"),
        }
    }
}
