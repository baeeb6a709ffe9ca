//! # Purchase Coordinator
//!
//! The single-flight purchase tracker. Serializes purchase attempts,
//! reconciles asynchronous billing-service callbacks against locally known
//! catalog metadata, and emits the terminal event for every operation.
//!
//! All coordinator state is owned by one logical caller: methods take
//! `&mut self`, and every billing-service callback must be funneled through
//! that owner (an actor task, a dispatch queue). There is no internal
//! locking, and none is needed under that ownership model.

use crate::config::IapConfig;
use crate::emitter::EventEmitter;
use crate::session::{BillingSession, OpenOutcome};
use iap_core::{
    CatalogIndex, HistoryRecord, IapError, IapResult, ProductCategory, ProductKind,
    ProductRecord, PurchaseEvent, PurchaseEventListener, PurchaseFlowRequest, PurchaseState,
    ResponseCode, ServiceProductDescriptor, ServicePurchase, ServiceResult,
    SharedBillingService,
};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

/// The purchase attempt currently awaiting its terminal purchase update.
///
/// At most one exists process-wide. It is overwritten at the start of every
/// `purchase()` call and deliberately NOT cleared on completion: a late
/// callback always resolves against the most recent attempt's context.
#[derive(Debug, Clone)]
struct OutstandingRequest {
    descriptor: ServiceProductDescriptor,
    attempt_id: Uuid,
}

/// Coordinates purchase flows between the host application and the platform
/// billing service.
pub struct PurchaseCoordinator {
    session: BillingSession,
    catalog: CatalogIndex,
    emitter: EventEmitter,
    outstanding: Option<OutstandingRequest>,
    /// Rebuilt from scratch on every `get_purchase_history` call
    history: Vec<HistoryRecord>,
    pass_product_id: Option<String>,
    license_key: Option<String>,
}

impl PurchaseCoordinator {
    pub fn new(service: SharedBillingService) -> Self {
        Self {
            session: BillingSession::new(service),
            catalog: CatalogIndex::new(),
            emitter: EventEmitter::new(),
            outstanding: None,
            history: Vec::new(),
            pass_product_id: None,
            license_key: None,
        }
    }

    /// Register the event listener, replacing any previous one.
    pub fn set_listener(&mut self, listener: Arc<dyn PurchaseEventListener>) {
        self.emitter.set_listener(listener);
    }

    pub fn remove_listener(&mut self) {
        self.emitter.remove_listener();
    }

    pub fn has_listener(&self) -> bool {
        self.emitter.has_listener()
    }

    /// Whether purchase-affecting calls would currently be accepted.
    pub fn is_ready(&self) -> bool {
        self.session.is_ready()
    }

    pub fn license_key(&self) -> Option<&str> {
        self.license_key.as_deref()
    }

    /// Correlation id of the outstanding purchase attempt, if any.
    pub fn current_attempt_id(&self) -> Option<Uuid> {
        self.outstanding.as_ref().map(|request| request.attempt_id)
    }

    /// Product id of the outstanding purchase attempt, if any.
    pub fn outstanding_product_id(&self) -> Option<&str> {
        self.outstanding
            .as_ref()
            .map(|request| request.descriptor.product_id.as_str())
    }

    /// Parse the configuration document, load the declared product map and
    /// open the billing session. Emits `Initialized` with the outcome.
    #[instrument(skip(self, config_document))]
    pub async fn initialize(&mut self, config_document: &str) {
        let config = match IapConfig::from_json(config_document) {
            Ok(config) => config,
            Err(err) => {
                warn!(%err, "rejecting configuration document");
                self.emitter
                    .emit(PurchaseEvent::Initialized { success: false });
                return;
            }
        };

        self.license_key = Some(config.key.clone());
        if config.pass_product_id.is_some() {
            self.pass_product_id = config.pass_product_id.clone();
        }
        self.catalog.load_kinds(config.kind_map());
        self.open_session().await;
    }

    async fn open_session(&mut self) {
        match self.session.open().await {
            OpenOutcome::AlreadyConnected => {}
            OpenOutcome::Attempted(result) => {
                self.emitter.emit(PurchaseEvent::Initialized {
                    success: result.is_ok(),
                });
                if result.is_ok() && self.pass_product_id.is_some() {
                    self.refresh_pass_status().await;
                }
            }
        }
    }

    /// Refresh the product catalog: one query per category, merged into a
    /// single wholesale index replacement. Success triggers the unconsumed
    /// sweep so callers always observe a consistent post-refresh state.
    #[instrument(skip(self))]
    pub async fn query_catalog(&mut self) {
        if !self.emitter.has_listener() {
            return;
        }
        if !self.session.is_ready() {
            self.emitter.emit(PurchaseEvent::CatalogFailure {
                message: "billing service is not initialized".into(),
            });
            return;
        }

        let service = Arc::clone(self.session.service());
        let ids = self.catalog.declared_ids();

        let mut fresh: HashMap<String, ServiceProductDescriptor> = HashMap::new();
        for category in [ProductCategory::OneTime, ProductCategory::Subscription] {
            let response = service.query_product_details(category, &ids).await;
            match response.into_result() {
                Ok(descriptors) => {
                    for descriptor in descriptors {
                        fresh.insert(descriptor.product_id.clone(), descriptor);
                    }
                }
                Err(err) => {
                    self.emitter.emit(PurchaseEvent::CatalogFailure {
                        message: format!(
                            "{} product details query failed: {err}",
                            category.as_str()
                        ),
                    });
                    return;
                }
            }
        }

        self.catalog.replace_descriptors(fresh);
        let products = self.catalog.records();
        self.emitter.emit(PurchaseEvent::CatalogSuccess { products });

        self.query_unconsumed_purchases().await;
    }

    /// Launch a purchase flow for a catalog product. The terminal event
    /// (`PurchaseSuccess` / `PurchaseFailure` / `PurchaseCancelled`) arrives
    /// via [`Self::on_purchases_updated`], not from this call.
    #[instrument(skip(self))]
    pub async fn purchase(&mut self, product_id: &str) {
        // a stale context from a previous attempt must never leak into this
        // attempt's correlation
        self.outstanding = None;

        if !self.emitter.has_listener() {
            return;
        }
        if let Err(err) = self.ensure_ready() {
            self.emit_purchase_error(err);
            return;
        }
        let descriptor = match self.catalog.descriptor(product_id) {
            Some(descriptor) => descriptor.clone(),
            None => {
                self.emit_purchase_error(IapError::ProductNotFound {
                    product_id: product_id.to_string(),
                });
                return;
            }
        };

        let offer_token = descriptor.default_offer_token().map(str::to_string);
        let attempt_id = Uuid::new_v4();
        info!(%attempt_id, "launching purchase flow");
        self.outstanding = Some(OutstandingRequest {
            descriptor,
            attempt_id,
        });

        let service = Arc::clone(self.session.service());
        let result = service
            .launch_purchase_flow(PurchaseFlowRequest {
                product_id: product_id.to_string(),
                offer_token,
            })
            .await;
        if !result.is_ok() {
            // the terminal event still belongs to the purchase-update channel
            warn!(%result, "purchase flow launch reported an error");
        }
    }

    /// Unsolicited purchase-update channel. May fire any time the flow UI
    /// completes, independent of the call stack that launched it.
    pub async fn on_purchases_updated(
        &mut self,
        result: ServiceResult,
        purchases: Option<Vec<ServicePurchase>>,
    ) {
        match (result.code, purchases) {
            (ResponseCode::Ok, Some(purchases)) => {
                for purchase in purchases {
                    self.handle_purchase(purchase).await;
                }
            }
            (ResponseCode::UserCanceled, _) => {
                let product = self.outstanding_record();
                self.emitter
                    .emit(PurchaseEvent::PurchaseCancelled { product });
            }
            (code, _) => {
                let product = self.outstanding_record();
                self.emitter.emit(PurchaseEvent::PurchaseFailure {
                    product,
                    code,
                    message: code.as_str().to_string(),
                });
            }
        }
    }

    async fn handle_purchase(&mut self, purchase: ServicePurchase) {
        if purchase.state != PurchaseState::Purchased {
            return;
        }
        // Updates arriving outside a launch flow (e.g. app relaunch with a
        // pending purchase) are left for the unconsumed sweep to discover.
        let Some(request) = &self.outstanding else {
            debug!(
                token = %purchase.purchase_token,
                "purchase update with no outstanding request, ignoring"
            );
            return;
        };
        debug!(
            attempt_id = %request.attempt_id,
            purchase_time = ?purchase.purchase_time(),
            "reconciling purchase update"
        );

        let product = self.stamped_record(&request.descriptor, &purchase);
        let needs_ack = product.kind != ProductKind::Consumable && !purchase.acknowledged;
        self.emitter.emit(PurchaseEvent::PurchaseSuccess { product });

        if needs_ack {
            self.acknowledge_purchase(&purchase.purchase_token).await;
        }
    }

    async fn acknowledge_purchase(&self, purchase_token: &str) {
        let result = self.session.service().acknowledge(purchase_token).await;
        if result.is_ok() {
            debug!("purchase acknowledged");
        } else {
            // acknowledgement failures stay off the event channel
            warn!(%result, "purchase acknowledge failed");
        }
    }

    /// Consume a consumable purchase by token.
    #[instrument(skip(self, purchase_token))]
    pub async fn consume(&mut self, product_id: &str, purchase_token: &str) {
        if let Err(err) = self.ensure_ready() {
            self.emit_consume_error(purchase_token, err);
            return;
        }
        let descriptor = match self.catalog.descriptor(product_id) {
            Some(descriptor) => descriptor.clone(),
            None => {
                self.emit_consume_error(
                    purchase_token,
                    IapError::ProductNotFound {
                        product_id: product_id.to_string(),
                    },
                );
                return;
            }
        };

        let mut product = self.catalog.record_from(&descriptor);
        product.purchase_token = purchase_token.to_string();

        let service = Arc::clone(self.session.service());
        let result = service.consume(purchase_token).await;
        if result.is_ok() {
            debug!("product consumed");
            self.emitter.emit(PurchaseEvent::ConsumeSuccess { product });
        } else {
            debug!(%result, "product consume failed");
            self.emitter.emit(PurchaseEvent::ConsumeFailure {
                product,
                code: result.code,
                message: result.debug_message,
            });
        }
    }

    /// Sweep current one-time purchases for declared-consumable products that
    /// were never consumed. Always emits the batch, even when empty.
    #[instrument(skip(self))]
    pub async fn query_unconsumed_purchases(&mut self) {
        debug!("querying unconsumed purchases");
        if !self.emitter.has_listener() || !self.session.is_ready() {
            return;
        }

        let service = Arc::clone(self.session.service());
        let response = service.query_purchases(ProductCategory::OneTime).await;
        if !response.result.is_ok() {
            warn!(result = %response.result, "unconsumed purchase query failed");
            return;
        }

        let purchases = response.payload.unwrap_or_default();
        let mut unconsumed = Vec::new();
        for purchase in &purchases {
            let Some(product_id) = purchase.primary_product_id() else {
                continue;
            };
            let Some(descriptor) = self.catalog.descriptor(product_id) else {
                continue;
            };
            if self.catalog.kind_or_default(product_id) != ProductKind::Consumable {
                continue;
            }
            unconsumed.push(self.stamped_record(descriptor, purchase));
        }

        self.emitter
            .emit(PurchaseEvent::UnconsumedUpdate {
                products: unconsumed,
            });
    }

    /// Combined purchase history: live purchases first (with state labels),
    /// historical records appended second, emitted as one ordered sequence.
    /// The sequence is rebuilt from scratch on every call.
    #[instrument(skip(self))]
    pub async fn get_purchase_history(&mut self) {
        self.history.clear();

        if !self.emitter.has_listener() {
            return;
        }
        if !self.session.is_ready() {
            self.emitter.emit(PurchaseEvent::HistorySuccess {
                records: Vec::new(),
            });
            return;
        }

        let service = Arc::clone(self.session.service());

        let live = service.query_purchases(ProductCategory::OneTime).await;
        if live.result.is_ok() {
            for purchase in live.payload.unwrap_or_default() {
                if let Some(record) = HistoryRecord::from_purchase(&purchase) {
                    self.history.push(record);
                }
            }
        }

        let past = service
            .query_purchase_history(ProductCategory::OneTime)
            .await;
        if past.result.is_ok() {
            if let Some(records) = past.payload {
                for historical in &records {
                    if let Some(record) = HistoryRecord::from_history(historical) {
                        self.history.push(record);
                    }
                }
            }
        }

        self.emitter.emit(PurchaseEvent::HistorySuccess {
            records: self.history.clone(),
        });
    }

    /// Current one-time purchases resolved against the catalog index.
    #[instrument(skip(self))]
    pub async fn query_purchases(&mut self) {
        if let Err(err) = self.ensure_ready() {
            self.emitter.emit(PurchaseEvent::QueryPurchasesFailure {
                code: err.response_code(),
                message: err.to_string(),
            });
            return;
        }

        let service = Arc::clone(self.session.service());
        let response = service.query_purchases(ProductCategory::OneTime).await;
        if !response.result.is_ok() {
            self.emitter.emit(PurchaseEvent::QueryPurchasesFailure {
                code: response.result.code,
                message: response.result.debug_message,
            });
            return;
        }

        let purchases = response.payload.unwrap_or_default();
        let mut products = Vec::new();
        for purchase in &purchases {
            let Some(product_id) = purchase.primary_product_id() else {
                continue;
            };
            let Some(descriptor) = self.catalog.descriptor(product_id) else {
                continue;
            };
            products.push(self.stamped_record(descriptor, purchase));
        }

        self.emitter
            .emit(PurchaseEvent::QueryPurchasesSuccess { products });
    }

    /// Check whether the configured pass product is among current purchases
    /// and emit its status. The id is remembered for resume-time re-checks.
    #[instrument(skip(self))]
    pub async fn check_pass_status(&mut self, product_id: &str) {
        self.pass_product_id = Some(product_id.to_string());
        self.refresh_pass_status().await;
    }

    async fn refresh_pass_status(&mut self) {
        let Some(pass_id) = self.pass_product_id.clone() else {
            return;
        };
        if !self.emitter.has_listener() || !self.session.is_ready() {
            return;
        }

        let service = Arc::clone(self.session.service());
        let response = service.query_purchases(ProductCategory::OneTime).await;
        if !response.result.is_ok() {
            return;
        }

        let mut active = false;
        let mut token = String::new();
        for purchase in response.payload.unwrap_or_default() {
            match purchase.primary_product_id() {
                Some(product_id) if product_id == pass_id => {
                    active = true;
                    token = purchase.purchase_token.clone();
                    break;
                }
                Some(_) => {}
                None => warn!("purchase with no product id in pass scan, skipping"),
            }
        }

        self.emitter.emit(PurchaseEvent::PassStatus { active, token });
    }

    /// App-foreground hook: re-open a dropped session, re-check the pass
    /// product, re-run the unconsumed sweep once a catalog is loaded.
    pub async fn on_resume(&mut self) {
        if self.session.is_initialized() && !self.session.is_valid() {
            self.open_session().await;
        }
        if self.pass_product_id.is_some() {
            self.refresh_pass_status().await;
        }
        if self.catalog.has_descriptors() {
            self.query_unconsumed_purchases().await;
        }
    }

    /// App-stop hook: tear down the billing connection.
    pub async fn on_stop(&mut self) {
        if self.session.is_initialized() {
            self.session.close().await;
        }
    }

    pub fn on_pause(&self) {}

    pub fn on_start(&self) {}

    /// Spontaneous disconnect callback from the billing service.
    pub fn on_service_disconnected(&mut self) {
        info!("billing service disconnected");
        self.session.invalidate();
    }

    fn ensure_ready(&self) -> IapResult<()> {
        if self.session.is_ready() {
            Ok(())
        } else {
            Err(IapError::SessionNotReady)
        }
    }

    fn emit_purchase_error(&self, err: IapError) {
        self.emitter.emit(PurchaseEvent::PurchaseFailure {
            product: ProductRecord::placeholder(),
            code: err.response_code(),
            message: err.to_string(),
        });
    }

    fn emit_consume_error(&self, purchase_token: &str, err: IapError) {
        let mut product = ProductRecord::placeholder();
        product.purchase_token = purchase_token.to_string();
        self.emitter.emit(PurchaseEvent::ConsumeFailure {
            product,
            code: err.response_code(),
            message: err.to_string(),
        });
    }

    /// Record for the outstanding attempt, or the placeholder when an update
    /// arrives with no launch context.
    fn outstanding_record(&self) -> ProductRecord {
        match &self.outstanding {
            Some(request) => self.catalog.record_from(&request.descriptor),
            None => ProductRecord::placeholder(),
        }
    }

    /// Catalog record with the live purchase facts stamped in.
    fn stamped_record(
        &self,
        descriptor: &ServiceProductDescriptor,
        purchase: &ServicePurchase,
    ) -> ProductRecord {
        let mut product = self.catalog.record_from(descriptor);
        product.transaction_id = purchase.order_id.clone();
        product.receipt = purchase.original_payload.clone();
        product.receipt_ciphered_payload = purchase.signature.clone();
        product.purchase_token = purchase.purchase_token.clone();
        product
    }
}
