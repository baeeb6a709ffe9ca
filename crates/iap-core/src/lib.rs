//! # iap-core
//!
//! Core types and traits for the iap-bridge purchase coordination engine.
//!
//! This crate provides:
//! - `BillingService` trait for the platform billing service seam
//! - `ProductRecord`, `ProductKind` and `CatalogIndex` for the product catalog
//! - `ServicePurchase`, `HistoryRecord` for purchase facts and history
//! - `PurchaseEvent` and `PurchaseEventListener` for the listener contract
//! - `ResponseCode` / `ServiceResult` — the fixed service response vocabulary
//! - `IapError` for typed error handling
//!
//! ## Example
//!
//! ```rust,ignore
//! use iap_core::{BillingService, ProductKind, PurchaseEventListener};
//! use iap_bridge::PurchaseCoordinator;
//!
//! let mut coordinator = PurchaseCoordinator::new(service);
//! coordinator.set_listener(listener);
//! coordinator.initialize(config_json).await;
//! coordinator.query_catalog().await;
//! coordinator.purchase("coin_100").await;
//! // terminal event arrives through the listener
//! ```

pub mod catalog;
pub mod code;
pub mod error;
pub mod event;
pub mod product;
pub mod purchase;
pub mod service;

// Re-exports for convenience
pub use catalog::CatalogIndex;
pub use code::{ResponseCode, ServiceResult};
pub use error::{IapError, IapResult};
pub use event::{
    dispatch_event, LoggingEventListener, PurchaseEvent, PurchaseEventListener,
};
pub use product::{
    OneTimeOffer, PricingPhase, ProductKind, ProductRecord, ServiceProductDescriptor,
    SubscriptionOffer,
};
pub use purchase::{
    HistoryRecord, PurchaseState, ServiceHistoryRecord, ServicePurchase,
};
pub use service::{
    BillingService, ProductCategory, PurchaseFlowRequest, ServiceResponse,
    SharedBillingService,
};
