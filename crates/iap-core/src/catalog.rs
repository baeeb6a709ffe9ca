//! # Catalog Index
//!
//! Per-product metadata cache: the declared-type map (loaded once from the
//! host configuration) and the latest service product descriptors (replaced
//! wholesale on every successful catalog refresh).

use crate::product::{ProductKind, ProductRecord, ServiceProductDescriptor};
use std::collections::HashMap;
use tracing::warn;

/// Mapping from product id to declared kind and service metadata.
///
/// The declared-type map is caller-supplied ground truth and is immutable
/// after load. The descriptor map is replaced atomically by each refresh;
/// stale entries from a previous query never merge with fresh ones.
#[derive(Debug, Clone, Default)]
pub struct CatalogIndex {
    kinds: HashMap<String, ProductKind>,
    descriptors: HashMap<String, ServiceProductDescriptor>,
}

impl CatalogIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the declared-type mapping wholesale. Called once at init from
    /// the configuration document.
    pub fn load_kinds(&mut self, kinds: HashMap<String, ProductKind>) {
        self.kinds = kinds;
    }

    /// Replace the service descriptor map with the result of a completed
    /// refresh. The previous map is discarded in one step.
    pub fn replace_descriptors(
        &mut self,
        descriptors: HashMap<String, ServiceProductDescriptor>,
    ) {
        self.descriptors = descriptors;
    }

    /// Product ids declared by the configuration, used to build service
    /// catalog queries.
    pub fn declared_ids(&self) -> Vec<String> {
        self.kinds.keys().cloned().collect()
    }

    pub fn declared_kind(&self, product_id: &str) -> Option<ProductKind> {
        self.kinds.get(product_id).copied()
    }

    /// Declared kind for a product, falling back to consumable when the
    /// service returns an id the configuration never declared.
    pub fn kind_or_default(&self, product_id: &str) -> ProductKind {
        self.declared_kind(product_id).unwrap_or_else(|| {
            warn!(product_id, "no declared kind for product, assuming consumable");
            ProductKind::default()
        })
    }

    pub fn descriptor(&self, product_id: &str) -> Option<&ServiceProductDescriptor> {
        self.descriptors.get(product_id)
    }

    /// True once at least one catalog refresh has completed.
    pub fn has_descriptors(&self) -> bool {
        !self.descriptors.is_empty()
    }

    /// Build a record for a known descriptor, with the declared kind merged in.
    pub fn record_from(&self, descriptor: &ServiceProductDescriptor) -> ProductRecord {
        ProductRecord::from_descriptor(descriptor, self.kind_or_default(&descriptor.product_id))
    }

    /// All cached descriptors as listener-facing records, in stable id order.
    pub fn records(&self) -> Vec<ProductRecord> {
        let mut records: Vec<ProductRecord> = self
            .descriptors
            .values()
            .map(|descriptor| self.record_from(descriptor))
            .collect();
        records.sort_by(|a, b| a.id.cmp(&b.id));
        records
    }
}
