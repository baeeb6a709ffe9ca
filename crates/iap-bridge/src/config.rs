//! # Bridge Configuration
//!
//! The configuration document supplied by the host application at
//! initialization: a license key, the declared product map, and optionally
//! the id of the subscription-pass product.

use iap_core::{IapError, IapResult, ProductKind};
use serde::Deserialize;
use std::collections::HashMap;

/// One declared product: the store id and the caller-declared kind.
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigItem {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: ProductKind,
}

/// Parsed configuration document.
///
/// `items` maps host-side product names to declared products; the names are
/// only meaningful to the host, the bridge keys everything by product id.
#[derive(Debug, Clone, Deserialize)]
pub struct IapConfig {
    /// License key. Stored for the host's benefit, not used by the bridge.
    pub key: String,

    pub items: HashMap<String, ConfigItem>,

    /// Product id granted by the platform's subscription pass, if any
    #[serde(default, rename = "passProductId")]
    pub pass_product_id: Option<String>,
}

impl IapConfig {
    /// Parse and validate a configuration document.
    pub fn from_json(document: &str) -> IapResult<Self> {
        let config: IapConfig = serde_json::from_str(document)
            .map_err(|e| IapError::Configuration(format!("invalid config document: {e}")))?;

        for (name, item) in &config.items {
            if item.id.is_empty() {
                return Err(IapError::Configuration(format!(
                    "item {name} has an empty product id"
                )));
            }
        }

        Ok(config)
    }

    /// The declared-type map keyed by product id, as loaded into the catalog
    /// index.
    pub fn kind_map(&self) -> HashMap<String, ProductKind> {
        self.items
            .values()
            .map(|item| (item.id.clone(), item.kind))
            .collect()
    }
}
