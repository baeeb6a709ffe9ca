//! # Event Vocabulary
//!
//! The fixed set of named events the bridge delivers to its listener,
//! together with the listener trait and the dispatch helper. The serialized
//! form of each event payload is a cross-boundary contract; event names and
//! field names are wire-stable.

use crate::code::ResponseCode;
use crate::error::{IapError, IapResult};
use crate::product::ProductRecord;
use crate::purchase::HistoryRecord;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// A terminal outcome of a bridge operation, delivered to the registered
/// listener. Every event carries a fully-built payload; records are value
/// objects and never mutated after emission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "payload", rename_all = "snake_case")]
pub enum PurchaseEvent {
    Initialized {
        success: bool,
    },
    CatalogSuccess {
        products: Vec<ProductRecord>,
    },
    CatalogFailure {
        message: String,
    },
    HistorySuccess {
        records: Vec<HistoryRecord>,
    },
    PurchaseSuccess {
        product: ProductRecord,
    },
    PurchaseFailure {
        product: ProductRecord,
        code: ResponseCode,
        message: String,
    },
    PurchaseCancelled {
        product: ProductRecord,
    },
    ConsumeSuccess {
        product: ProductRecord,
    },
    ConsumeFailure {
        product: ProductRecord,
        code: ResponseCode,
        message: String,
    },
    QueryPurchasesSuccess {
        products: Vec<ProductRecord>,
    },
    QueryPurchasesFailure {
        code: ResponseCode,
        message: String,
    },
    PassStatus {
        active: bool,
        token: String,
    },
    UnconsumedUpdate {
        products: Vec<ProductRecord>,
    },
}

impl PurchaseEvent {
    /// Stable event name, matching the serde tag.
    pub fn name(&self) -> &'static str {
        match self {
            PurchaseEvent::Initialized { .. } => "initialized",
            PurchaseEvent::CatalogSuccess { .. } => "catalog_success",
            PurchaseEvent::CatalogFailure { .. } => "catalog_failure",
            PurchaseEvent::HistorySuccess { .. } => "history_success",
            PurchaseEvent::PurchaseSuccess { .. } => "purchase_success",
            PurchaseEvent::PurchaseFailure { .. } => "purchase_failure",
            PurchaseEvent::PurchaseCancelled { .. } => "purchase_cancelled",
            PurchaseEvent::ConsumeSuccess { .. } => "consume_success",
            PurchaseEvent::ConsumeFailure { .. } => "consume_failure",
            PurchaseEvent::QueryPurchasesSuccess { .. } => "query_purchases_success",
            PurchaseEvent::QueryPurchasesFailure { .. } => "query_purchases_failure",
            PurchaseEvent::PassStatus { .. } => "pass_status",
            PurchaseEvent::UnconsumedUpdate { .. } => "unconsumed_update",
        }
    }

    /// Serialize for transport across a process/language boundary.
    pub fn to_json(&self) -> IapResult<serde_json::Value> {
        serde_json::to_value(self).map_err(|e| IapError::Serialization(e.to_string()))
    }
}

/// Listener for bridge events. Exactly one listener is registered at a time;
/// implement the methods you care about, the defaults just log.
#[allow(unused_variables)]
pub trait PurchaseEventListener: Send + Sync {
    fn on_initialized(&self, success: bool) {
        info!(success, "billing bridge initialized");
    }

    fn on_catalog_success(&self, products: &[ProductRecord]) {
        info!(count = products.len(), "catalog query succeeded");
    }

    fn on_catalog_failure(&self, message: &str) {
        warn!(message, "catalog query failed");
    }

    fn on_history_success(&self, records: &[HistoryRecord]) {
        info!(count = records.len(), "purchase history delivered");
    }

    fn on_purchase_success(&self, product: &ProductRecord) {
        info!(product_id = %product.id, "purchase fulfilled");
    }

    fn on_purchase_failure(&self, product: &ProductRecord, code: ResponseCode, message: &str) {
        warn!(product_id = %product.id, %code, message, "purchase failed");
    }

    fn on_purchase_cancelled(&self, product: &ProductRecord) {
        info!(product_id = %product.id, "purchase cancelled by user");
    }

    fn on_consume_success(&self, product: &ProductRecord) {
        info!(product_id = %product.id, "consume succeeded");
    }

    fn on_consume_failure(&self, product: &ProductRecord, code: ResponseCode, message: &str) {
        warn!(product_id = %product.id, %code, message, "consume failed");
    }

    fn on_query_purchases_success(&self, products: &[ProductRecord]) {
        info!(count = products.len(), "purchases query succeeded");
    }

    fn on_query_purchases_failure(&self, code: ResponseCode, message: &str) {
        warn!(%code, message, "purchases query failed");
    }

    fn on_pass_status(&self, active: bool, token: &str) {
        info!(active, "pass status updated");
    }

    fn on_unconsumed_update(&self, products: &[ProductRecord]) {
        debug!(count = products.len(), "unconsumed products updated");
    }
}

/// Default listener that only logs events.
pub struct LoggingEventListener;

impl PurchaseEventListener for LoggingEventListener {}

/// Dispatch an event to the matching listener method.
pub fn dispatch_event(listener: &dyn PurchaseEventListener, event: &PurchaseEvent) {
    match event {
        PurchaseEvent::Initialized { success } => listener.on_initialized(*success),
        PurchaseEvent::CatalogSuccess { products } => listener.on_catalog_success(products),
        PurchaseEvent::CatalogFailure { message } => listener.on_catalog_failure(message),
        PurchaseEvent::HistorySuccess { records } => listener.on_history_success(records),
        PurchaseEvent::PurchaseSuccess { product } => listener.on_purchase_success(product),
        PurchaseEvent::PurchaseFailure {
            product,
            code,
            message,
        } => listener.on_purchase_failure(product, *code, message),
        PurchaseEvent::PurchaseCancelled { product } => listener.on_purchase_cancelled(product),
        PurchaseEvent::ConsumeSuccess { product } => listener.on_consume_success(product),
        PurchaseEvent::ConsumeFailure {
            product,
            code,
            message,
        } => listener.on_consume_failure(product, *code, message),
        PurchaseEvent::QueryPurchasesSuccess { products } => {
            listener.on_query_purchases_success(products)
        }
        PurchaseEvent::QueryPurchasesFailure { code, message } => {
            listener.on_query_purchases_failure(*code, message)
        }
        PurchaseEvent::PassStatus { active, token } => listener.on_pass_status(*active, token),
        PurchaseEvent::UnconsumedUpdate { products } => listener.on_unconsumed_update(products),
    }
}
