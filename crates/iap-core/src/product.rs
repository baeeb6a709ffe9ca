//! # Product Types
//!
//! Catalog item types for the purchase bridge. The declared kind of every
//! product comes from the host configuration document; the pricing and copy
//! come from the billing service's product descriptors. A `ProductRecord`
//! merges both views into the value object handed to the event listener.

use serde::{Deserialize, Serialize};

/// Micros-to-decimal divisor used by the billing service price fields.
const MICROS_PER_UNIT: f64 = 1_000_000.0;

/// Declared product kind (caller-supplied ground truth, never inferred from
/// the billing service response).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductKind {
    /// Can be purchased repeatedly after being marked consumed.
    #[default]
    Consumable,
    /// One-time entitlement, acknowledged but never consumed.
    NonConsumable,
    /// Recurring entitlement with offer/pricing-phase structure.
    #[serde(rename = "subs")]
    Subscription,
}

impl ProductKind {
    /// Returns the wire label used in config documents and event payloads.
    pub fn as_str(&self) -> &'static str {
        match self {
            ProductKind::Consumable => "consumable",
            ProductKind::NonConsumable => "non_consumable",
            ProductKind::Subscription => "subs",
        }
    }
}

impl std::fmt::Display for ProductKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single pricing phase of a subscription offer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricingPhase {
    /// Localized display price (e.g. "$0.99")
    pub formatted_price: String,
    /// ISO 4217 currency code
    pub currency_code: String,
    /// Price in micro-units of the currency
    pub price_micros: i64,
}

/// A subscription offer as described by the billing service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubscriptionOffer {
    /// Opaque token required to launch the purchase flow for this offer
    pub offer_token: String,
    /// Pricing phases in billing order (intro phase first)
    pub pricing_phases: Vec<PricingPhase>,
}

/// One-time purchase offer details.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OneTimeOffer {
    pub formatted_price: String,
    pub currency_code: String,
    pub price_micros: i64,
}

/// Product metadata as returned by the billing service catalog queries.
///
/// Descriptors are cached wholesale in the catalog index and replaced on
/// every successful refresh; they are never mutated in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceProductDescriptor {
    pub product_id: String,
    pub title: String,
    pub description: String,
    /// Present for one-time purchase products
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub one_time_offer: Option<OneTimeOffer>,
    /// Present for subscription products; first offer is the default
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub subscription_offers: Vec<SubscriptionOffer>,
}

impl ServiceProductDescriptor {
    /// Token of the default (first) subscription offer, if any.
    pub fn default_offer_token(&self) -> Option<&str> {
        self.subscription_offers
            .first()
            .map(|offer| offer.offer_token.as_str())
    }
}

/// A catalog item merged with purchase facts, as delivered to the listener.
///
/// Field names are part of the cross-boundary wire contract and must not
/// change. Receipt, transaction and token fields stay empty until a purchase
/// completes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductRecord {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: ProductKind,
    pub title: String,
    pub description: String,
    /// Localized display price
    pub price: String,
    #[serde(rename = "priceValue")]
    pub price_value: f64,
    #[serde(rename = "currencyCode")]
    pub currency_code: String,
    /// Raw purchase payload, opaque to the bridge
    pub receipt: String,
    #[serde(rename = "receiptCipheredPayload")]
    pub receipt_ciphered_payload: String,
    #[serde(rename = "transactionID")]
    pub transaction_id: String,
    #[serde(rename = "purchaseToken")]
    pub purchase_token: String,
}

impl ProductRecord {
    /// Well-formed all-fields-present record used for failure events when no
    /// catalog context exists. Listeners always receive a record, never a null.
    pub fn placeholder() -> Self {
        Self::default()
    }

    /// Build a record from a service descriptor and the declared kind.
    ///
    /// Subscriptions price from the first offer's first pricing phase;
    /// one-time products price from the one-time offer. Only the first
    /// subscription phase is considered, which is sufficient for display but
    /// not for multi-phase billing.
    pub fn from_descriptor(descriptor: &ServiceProductDescriptor, kind: ProductKind) -> Self {
        let mut record = Self {
            id: descriptor.product_id.clone(),
            kind,
            title: descriptor.title.clone(),
            description: descriptor.description.clone(),
            ..Self::default()
        };

        match kind {
            ProductKind::Subscription => {
                if let Some(phase) = descriptor
                    .subscription_offers
                    .first()
                    .and_then(|offer| offer.pricing_phases.first())
                {
                    record.price = phase.formatted_price.clone();
                    record.currency_code = phase.currency_code.clone();
                    record.price_value = phase.price_micros as f64 / MICROS_PER_UNIT;
                }
            }
            _ => {
                if let Some(offer) = &descriptor.one_time_offer {
                    record.price = offer.formatted_price.clone();
                    record.currency_code = offer.currency_code.clone();
                    record.price_value = offer.price_micros as f64 / MICROS_PER_UNIT;
                }
            }
        }

        record
    }
}
