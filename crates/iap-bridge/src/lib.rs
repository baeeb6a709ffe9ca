//! # iap-bridge
//!
//! Purchase-state coordination bridge over a platform billing service.
//!
//! The bridge exposes a small asynchronous command API (query catalog,
//! purchase, consume, query purchases/history, pass status, lifecycle hooks)
//! and delivers every terminal outcome as a named event to one registered
//! listener. All billing logic stays in the injected [`iap_core::BillingService`];
//! the bridge owns only the coordination state: the catalog index and the
//! single outstanding purchase request.
//!
//! ## Ownership model
//!
//! The coordinator has a single logical owner. Methods take `&mut self`, and
//! unsolicited service callbacks (`on_purchases_updated`,
//! `on_service_disconnected`) must be funneled through the same owner —
//! typically an actor task that also runs the host commands. No internal
//! locking exists; none is needed under that model.
//!
//! ## Example
//!
//! ```rust,ignore
//! use iap_bridge::PurchaseCoordinator;
//! use std::sync::Arc;
//!
//! let mut coordinator = PurchaseCoordinator::new(service);
//! coordinator.set_listener(Arc::new(listener));
//! coordinator.initialize(config_json).await;   // emits Initialized
//! coordinator.query_catalog().await;           // emits CatalogSuccess + UnconsumedUpdate
//! coordinator.purchase("coin_100").await;      // terminal event via on_purchases_updated
//! ```

pub mod config;
pub mod coordinator;
pub mod emitter;
pub mod session;

// Re-exports
pub use config::{ConfigItem, IapConfig};
pub use coordinator::PurchaseCoordinator;
pub use emitter::EventEmitter;
pub use session::{BillingSession, ConnectionState, OpenOutcome};
