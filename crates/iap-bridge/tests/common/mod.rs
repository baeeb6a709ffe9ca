//! Shared test doubles: a scripted in-memory billing service and a listener
//! that records every delivered event.

#![allow(dead_code)]

use async_trait::async_trait;
use iap_bridge::PurchaseCoordinator;
use iap_core::{
    BillingService, OneTimeOffer, PricingPhase, ProductCategory, PurchaseEvent,
    PurchaseEventListener, PurchaseFlowRequest, PurchaseState, HistoryRecord, ProductRecord,
    ResponseCode, ServiceHistoryRecord, ServiceProductDescriptor, ServicePurchase,
    ServiceResponse, ServiceResult, SubscriptionOffer,
};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Scripted billing service. Every response can be replaced mid-test; every
/// call is recorded.
pub struct MockBillingService {
    pub connect_result: Mutex<ServiceResult>,
    pub ready: AtomicBool,
    pub connect_calls: AtomicUsize,

    pub one_time_details: Mutex<ServiceResponse<Vec<ServiceProductDescriptor>>>,
    pub subscription_details: Mutex<ServiceResponse<Vec<ServiceProductDescriptor>>>,
    pub purchases: Mutex<ServiceResponse<Vec<ServicePurchase>>>,
    pub history: Mutex<ServiceResponse<Vec<ServiceHistoryRecord>>>,

    pub launch_result: Mutex<ServiceResult>,
    pub consume_result: Mutex<ServiceResult>,
    pub acknowledge_result: Mutex<ServiceResult>,

    pub launches: Mutex<Vec<PurchaseFlowRequest>>,
    pub consumed_tokens: Mutex<Vec<String>>,
    pub acknowledged_tokens: Mutex<Vec<String>>,
}

impl MockBillingService {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            connect_result: Mutex::new(ServiceResult::ok()),
            ready: AtomicBool::new(false),
            connect_calls: AtomicUsize::new(0),
            one_time_details: Mutex::new(ServiceResponse::ok(Vec::new())),
            subscription_details: Mutex::new(ServiceResponse::ok(Vec::new())),
            purchases: Mutex::new(ServiceResponse::ok(Vec::new())),
            history: Mutex::new(ServiceResponse::ok(Vec::new())),
            launch_result: Mutex::new(ServiceResult::ok()),
            consume_result: Mutex::new(ServiceResult::ok()),
            acknowledge_result: Mutex::new(ServiceResult::ok()),
            launches: Mutex::new(Vec::new()),
            consumed_tokens: Mutex::new(Vec::new()),
            acknowledged_tokens: Mutex::new(Vec::new()),
        })
    }

    pub fn set_connect_result(&self, result: ServiceResult) {
        *self.connect_result.lock().unwrap() = result;
    }

    pub fn set_one_time_details(&self, response: ServiceResponse<Vec<ServiceProductDescriptor>>) {
        *self.one_time_details.lock().unwrap() = response;
    }

    pub fn set_subscription_details(
        &self,
        response: ServiceResponse<Vec<ServiceProductDescriptor>>,
    ) {
        *self.subscription_details.lock().unwrap() = response;
    }

    pub fn set_purchases(&self, response: ServiceResponse<Vec<ServicePurchase>>) {
        *self.purchases.lock().unwrap() = response;
    }

    pub fn set_history(&self, response: ServiceResponse<Vec<ServiceHistoryRecord>>) {
        *self.history.lock().unwrap() = response;
    }

    pub fn set_consume_result(&self, result: ServiceResult) {
        *self.consume_result.lock().unwrap() = result;
    }

    pub fn launched(&self) -> Vec<PurchaseFlowRequest> {
        self.launches.lock().unwrap().clone()
    }
}

#[async_trait]
impl BillingService for MockBillingService {
    async fn start_connection(&self) -> ServiceResult {
        self.connect_calls.fetch_add(1, Ordering::SeqCst);
        let result = self.connect_result.lock().unwrap().clone();
        self.ready.store(result.is_ok(), Ordering::SeqCst);
        result
    }

    fn is_ready(&self) -> bool {
        self.ready.load(Ordering::SeqCst)
    }

    async fn query_product_details(
        &self,
        category: ProductCategory,
        _product_ids: &[String],
    ) -> ServiceResponse<Vec<ServiceProductDescriptor>> {
        match category {
            ProductCategory::OneTime => self.one_time_details.lock().unwrap().clone(),
            ProductCategory::Subscription => self.subscription_details.lock().unwrap().clone(),
        }
    }

    async fn launch_purchase_flow(&self, request: PurchaseFlowRequest) -> ServiceResult {
        self.launches.lock().unwrap().push(request);
        self.launch_result.lock().unwrap().clone()
    }

    async fn query_purchases(
        &self,
        _category: ProductCategory,
    ) -> ServiceResponse<Vec<ServicePurchase>> {
        self.purchases.lock().unwrap().clone()
    }

    async fn query_purchase_history(
        &self,
        _category: ProductCategory,
    ) -> ServiceResponse<Vec<ServiceHistoryRecord>> {
        self.history.lock().unwrap().clone()
    }

    async fn consume(&self, purchase_token: &str) -> ServiceResult {
        self.consumed_tokens
            .lock()
            .unwrap()
            .push(purchase_token.to_string());
        self.consume_result.lock().unwrap().clone()
    }

    async fn acknowledge(&self, purchase_token: &str) -> ServiceResult {
        self.acknowledged_tokens
            .lock()
            .unwrap()
            .push(purchase_token.to_string());
        self.acknowledge_result.lock().unwrap().clone()
    }

    async fn end_connection(&self) {
        self.ready.store(false, Ordering::SeqCst);
    }
}

/// Listener that records every event it receives, in order.
pub struct RecordingListener {
    events: Mutex<Vec<PurchaseEvent>>,
}

impl RecordingListener {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            events: Mutex::new(Vec::new()),
        })
    }

    fn push(&self, event: PurchaseEvent) {
        self.events.lock().unwrap().push(event);
    }

    pub fn events(&self) -> Vec<PurchaseEvent> {
        self.events.lock().unwrap().clone()
    }

    /// Drain recorded events, resetting the log for the next test phase.
    pub fn take(&self) -> Vec<PurchaseEvent> {
        std::mem::take(&mut self.events.lock().unwrap())
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.events.lock().unwrap().iter().map(|e| e.name()).collect()
    }
}

impl PurchaseEventListener for RecordingListener {
    fn on_initialized(&self, success: bool) {
        self.push(PurchaseEvent::Initialized { success });
    }

    fn on_catalog_success(&self, products: &[ProductRecord]) {
        self.push(PurchaseEvent::CatalogSuccess {
            products: products.to_vec(),
        });
    }

    fn on_catalog_failure(&self, message: &str) {
        self.push(PurchaseEvent::CatalogFailure {
            message: message.to_string(),
        });
    }

    fn on_history_success(&self, records: &[HistoryRecord]) {
        self.push(PurchaseEvent::HistorySuccess {
            records: records.to_vec(),
        });
    }

    fn on_purchase_success(&self, product: &ProductRecord) {
        self.push(PurchaseEvent::PurchaseSuccess {
            product: product.clone(),
        });
    }

    fn on_purchase_failure(&self, product: &ProductRecord, code: ResponseCode, message: &str) {
        self.push(PurchaseEvent::PurchaseFailure {
            product: product.clone(),
            code,
            message: message.to_string(),
        });
    }

    fn on_purchase_cancelled(&self, product: &ProductRecord) {
        self.push(PurchaseEvent::PurchaseCancelled {
            product: product.clone(),
        });
    }

    fn on_consume_success(&self, product: &ProductRecord) {
        self.push(PurchaseEvent::ConsumeSuccess {
            product: product.clone(),
        });
    }

    fn on_consume_failure(&self, product: &ProductRecord, code: ResponseCode, message: &str) {
        self.push(PurchaseEvent::ConsumeFailure {
            product: product.clone(),
            code,
            message: message.to_string(),
        });
    }

    fn on_query_purchases_success(&self, products: &[ProductRecord]) {
        self.push(PurchaseEvent::QueryPurchasesSuccess {
            products: products.to_vec(),
        });
    }

    fn on_query_purchases_failure(&self, code: ResponseCode, message: &str) {
        self.push(PurchaseEvent::QueryPurchasesFailure {
            code,
            message: message.to_string(),
        });
    }

    fn on_pass_status(&self, active: bool, token: &str) {
        self.push(PurchaseEvent::PassStatus {
            active,
            token: token.to_string(),
        });
    }

    fn on_unconsumed_update(&self, products: &[ProductRecord]) {
        self.push(PurchaseEvent::UnconsumedUpdate {
            products: products.to_vec(),
        });
    }
}

/// Standard config: one consumable, one non-consumable, one subscription.
pub const CONFIG: &str = r#"{
    "key": "license-abc",
    "items": {
        "coins_small": { "id": "coin_100", "type": "consumable" },
        "remove_ads": { "id": "no_ads", "type": "non_consumable" },
        "gold": { "id": "gold_monthly", "type": "subs" }
    }
}"#;

pub fn one_time_descriptor(id: &str, price_micros: i64) -> ServiceProductDescriptor {
    ServiceProductDescriptor {
        product_id: id.to_string(),
        title: format!("{id} title"),
        description: format!("{id} description"),
        one_time_offer: Some(OneTimeOffer {
            formatted_price: "$0.99".into(),
            currency_code: "USD".into(),
            price_micros,
        }),
        subscription_offers: Vec::new(),
    }
}

pub fn subscription_descriptor(id: &str, offer_token: &str) -> ServiceProductDescriptor {
    ServiceProductDescriptor {
        product_id: id.to_string(),
        title: format!("{id} title"),
        description: format!("{id} description"),
        one_time_offer: None,
        subscription_offers: vec![SubscriptionOffer {
            offer_token: offer_token.to_string(),
            pricing_phases: vec![PricingPhase {
                formatted_price: "$4.99".into(),
                currency_code: "USD".into(),
                price_micros: 4_990_000,
            }],
        }],
    }
}

pub fn purchased(product_id: &str, token: &str) -> ServicePurchase {
    ServicePurchase {
        product_ids: vec![product_id.to_string()],
        order_id: format!("order-{token}"),
        purchase_time_millis: 1_700_000_000_000,
        purchase_token: token.to_string(),
        original_payload: format!("{{\"productId\":\"{product_id}\"}}"),
        signature: format!("sig-{token}"),
        quantity: 1,
        state: PurchaseState::Purchased,
        acknowledged: false,
    }
}

/// Install the test log subscriber once; later calls are no-ops.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// A coordinator initialized against the mock with the standard config and a
/// completed catalog refresh. The listener log starts empty.
pub async fn ready_coordinator() -> (
    PurchaseCoordinator,
    Arc<MockBillingService>,
    Arc<RecordingListener>,
) {
    init_tracing();

    let service = MockBillingService::new();
    service.set_one_time_details(ServiceResponse::ok(vec![
        one_time_descriptor("coin_100", 990_000),
        one_time_descriptor("no_ads", 2_990_000),
    ]));
    service.set_subscription_details(ServiceResponse::ok(vec![subscription_descriptor(
        "gold_monthly",
        "offer-gold",
    )]));

    let listener = RecordingListener::new();
    let mut coordinator = PurchaseCoordinator::new(service.clone());
    coordinator.set_listener(listener.clone());
    coordinator.initialize(CONFIG).await;
    coordinator.query_catalog().await;
    listener.take();

    (coordinator, service, listener)
}
