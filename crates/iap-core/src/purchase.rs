//! # Purchase Records
//!
//! Service-side purchase facts and the listener-facing history model.
//! Live purchases carry the full fact set; historical records are the
//! thinner shape the service keeps for already-consumed purchases.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// State of a purchase as reported by the billing service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PurchaseState {
    #[serde(rename = "PURCHASED")]
    Purchased,
    #[serde(rename = "PENDING")]
    Pending,
    #[serde(rename = "UNSPECIFIED_STATE")]
    Unspecified,
}

impl PurchaseState {
    pub fn as_str(&self) -> &'static str {
        match self {
            PurchaseState::Purchased => "PURCHASED",
            PurchaseState::Pending => "PENDING",
            PurchaseState::Unspecified => "UNSPECIFIED_STATE",
        }
    }
}

/// A purchase currently known to the billing service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServicePurchase {
    /// Product ids covered by this purchase; the first is authoritative
    pub product_ids: Vec<String>,
    pub order_id: String,
    pub purchase_time_millis: i64,
    pub purchase_token: String,
    /// Raw purchase payload as issued by the service
    pub original_payload: String,
    pub signature: String,
    pub quantity: u32,
    pub state: PurchaseState,
    pub acknowledged: bool,
}

impl ServicePurchase {
    /// The product id this purchase is attributed to.
    pub fn primary_product_id(&self) -> Option<&str> {
        self.product_ids.first().map(|id| id.as_str())
    }

    /// Purchase time as a UTC timestamp, when the epoch millis are in range.
    pub fn purchase_time(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_millis_opt(self.purchase_time_millis).single()
    }
}

/// A historical (possibly consumed) purchase record. Carries no order id and
/// no purchase state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceHistoryRecord {
    pub product_ids: Vec<String>,
    pub purchase_time_millis: i64,
    pub purchase_token: String,
    pub original_payload: String,
    pub signature: String,
    pub quantity: u32,
}

impl ServiceHistoryRecord {
    pub fn primary_product_id(&self) -> Option<&str> {
        self.product_ids.first().map(|id| id.as_str())
    }
}

/// One entry of the merged purchase-history sequence delivered to the
/// listener. Live purchases come first (with order id and state), historical
/// records follow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryRecord {
    #[serde(rename = "productId")]
    pub product_id: String,
    #[serde(rename = "orderId", default, skip_serializing_if = "Option::is_none")]
    pub order_id: Option<String>,
    #[serde(rename = "purchaseTime")]
    pub purchase_time: i64,
    #[serde(rename = "purchaseToken")]
    pub purchase_token: String,
    #[serde(rename = "originalJson")]
    pub original_json: String,
    pub signature: String,
    pub quantity: u32,
    #[serde(
        rename = "purchaseState",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub purchase_state: Option<PurchaseState>,
}

impl HistoryRecord {
    /// Build from a live purchase. Returns `None` for records with no product
    /// id; malformed entries are skipped, never fatal to the batch.
    pub fn from_purchase(purchase: &ServicePurchase) -> Option<Self> {
        let product_id = purchase.primary_product_id()?.to_string();
        Some(Self {
            product_id,
            order_id: Some(purchase.order_id.clone()),
            purchase_time: purchase.purchase_time_millis,
            purchase_token: purchase.purchase_token.clone(),
            original_json: purchase.original_payload.clone(),
            signature: purchase.signature.clone(),
            quantity: purchase.quantity,
            purchase_state: Some(purchase.state),
        })
    }

    /// Build from a historical record.
    pub fn from_history(record: &ServiceHistoryRecord) -> Option<Self> {
        let product_id = record.primary_product_id()?.to_string();
        Some(Self {
            product_id,
            order_id: None,
            purchase_time: record.purchase_time_millis,
            purchase_token: record.purchase_token.clone(),
            original_json: record.original_payload.clone(),
            signature: record.signature.clone(),
            quantity: record.quantity,
            purchase_state: None,
        })
    }
}
