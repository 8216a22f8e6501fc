use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::response::Response;
use serde_json::Value;

use crate::quote::pricing::{
    ComponentKind, PriceSource, PricingError, PricingProvider, StaticReferencePricing, UnitPrice,
};
use crate::quote::{
    quote_router, EngineSettings, FacilityInput, IndustryRegistry, MappingRegistry, QuoteEngine,
    QuoteSession, QuoteSessions,
};

pub(super) fn engine_with<P>(pricing: P, settings: EngineSettings) -> Arc<QuoteEngine<P>>
where
    P: PricingProvider + 'static,
{
    Arc::new(QuoteEngine::new(
        Arc::new(IndustryRegistry::builtin()),
        Arc::new(MappingRegistry::builtin()),
        Arc::new(pricing),
        settings,
    ))
}

pub(super) fn reference_engine() -> Arc<QuoteEngine<StaticReferencePricing>> {
    engine_with(StaticReferencePricing, EngineSettings::default())
}

pub(super) fn session_with<P>(pricing: P) -> QuoteSession<P>
where
    P: PricingProvider + 'static,
{
    QuoteSession::new(engine_with(pricing, EngineSettings::default()))
}

pub(super) fn reference_router() -> axum::Router {
    quote_router(Arc::new(QuoteSessions::new(reference_engine())))
}

pub(super) fn hotel(rooms: u32, class: &str) -> FacilityInput {
    FacilityInput::new()
        .with("numberOfRooms", rooms)
        .with("hotelClass", class)
}

pub(super) fn car_wash(bays: u32, wash_type: &str) -> FacilityInput {
    FacilityInput::new()
        .with("bayCount", bays)
        .with("washType", wash_type)
}

fn vendor_price(component: ComponentKind) -> UnitPrice {
    UnitPrice {
        price_per_unit: StaticReferencePricing::reference(component).price_per_unit * 0.9,
        source: PriceSource::Vendor,
        confidence: 0.9,
    }
}

/// Vendor prices after a fixed delay; counts every lookup.
pub(super) struct SlowPricing {
    delay: Duration,
    calls: Arc<AtomicUsize>,
}

impl SlowPricing {
    pub(super) fn new(delay_ms: u64) -> (Self, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        (
            Self {
                delay: Duration::from_millis(delay_ms),
                calls: calls.clone(),
            },
            calls,
        )
    }
}

#[async_trait]
impl PricingProvider for SlowPricing {
    async fn unit_price(
        &self,
        component: ComponentKind,
        _capacity: f64,
    ) -> Result<UnitPrice, PricingError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        Ok(vendor_price(component))
    }
}

/// Vendor prices for everything except one component, which never answers.
pub(super) struct StalledOn(pub(super) ComponentKind);

#[async_trait]
impl PricingProvider for StalledOn {
    async fn unit_price(
        &self,
        component: ComponentKind,
        _capacity: f64,
    ) -> Result<UnitPrice, PricingError> {
        if component == self.0 {
            std::future::pending::<()>().await;
        }
        Ok(vendor_price(component))
    }
}

/// Vendor prices for everything except one component, which is refused.
pub(super) struct UnavailableFor(pub(super) ComponentKind);

#[async_trait]
impl PricingProvider for UnavailableFor {
    async fn unit_price(
        &self,
        component: ComponentKind,
        _capacity: f64,
    ) -> Result<UnitPrice, PricingError> {
        if component == self.0 {
            return Err(PricingError::Unavailable("vendor API offline".to_string()));
        }
        Ok(vendor_price(component))
    }
}

pub(super) fn fast_timeout() -> EngineSettings {
    EngineSettings {
        pricing_timeout_ms: 20,
        ..EngineSettings::default()
    }
}

pub(super) fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-6,
        "expected {expected}, got {actual}"
    );
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
