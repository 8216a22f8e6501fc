use async_trait::async_trait;
use merlin_quote::config::QuoteConfig;
use merlin_quote::error::AppError;
use merlin_quote::quote::{
    ComponentKind, FieldValue, IndustryRegistry, MappingAudit, MappingRegistry, PriceSheetPricing,
    PricingError, PricingProvider, QuoteEngine, StaticReferencePricing, UnitPrice,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Price sheet rows when one is configured, the static reference table otherwise. A sheet
/// that does not quote a component reports `NotQuoted` so the engine can flag the fallback.
#[derive(Debug, Clone, Default)]
pub(crate) struct ConfiguredPricing {
    sheet: Option<PriceSheetPricing>,
}

impl ConfiguredPricing {
    pub(crate) fn new(sheet: Option<PriceSheetPricing>) -> Self {
        Self { sheet }
    }
}

#[async_trait]
impl PricingProvider for ConfiguredPricing {
    async fn unit_price(
        &self,
        component: ComponentKind,
        capacity: f64,
    ) -> Result<UnitPrice, PricingError> {
        match &self.sheet {
            Some(sheet) => sheet.unit_price(component, capacity).await,
            None => StaticReferencePricing.unit_price(component, capacity).await,
        }
    }
}

pub(crate) type Engine = QuoteEngine<ConfiguredPricing>;

/// Registry, mappings and pricing from the configured paths, falling back to the built-in
/// tables. Mapping tables are audited against the registry at load.
pub(crate) fn build_engine(config: &QuoteConfig) -> Result<Arc<Engine>, AppError> {
    let registry = match &config.registry_path {
        Some(path) => {
            let registry = IndustryRegistry::from_path(path)?;
            info!(path = %path.display(), industries = registry.len(), "loaded industry registry");
            registry
        }
        None => IndustryRegistry::builtin(),
    };

    let mappings = match &config.mappings_path {
        Some(path) => {
            let mappings = MappingRegistry::from_path(path)?;
            info!(path = %path.display(), "loaded mapping tables");
            mappings
        }
        None => MappingRegistry::builtin(),
    };

    for violation in MappingAudit::new(&registry, &mappings).check_tables() {
        warn!(%violation, "mapping table inconsistency");
    }

    let sheet = match &config.price_sheet_path {
        Some(path) => {
            let sheet = PriceSheetPricing::from_path(path)?;
            info!(path = %path.display(), rows = sheet.len(), "loaded price sheet");
            Some(sheet)
        }
        None => None,
    };

    Ok(Arc::new(QuoteEngine::new(
        Arc::new(registry),
        Arc::new(mappings),
        Arc::new(ConfiguredPricing::new(sheet)),
        config.engine.clone(),
    )))
}

/// Parses a `name=value` questionnaire answer. `true`/`false` become flags, numbers become
/// numbers and anything else is kept as text.
pub(crate) fn parse_field(raw: &str) -> Result<(String, FieldValue), String> {
    let (name, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected name=value, got '{raw}'"))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("missing field name in '{raw}'"));
    }

    let value = value.trim();
    let value = match value.to_ascii_lowercase().as_str() {
        "true" | "yes" => FieldValue::Flag(true),
        "false" | "no" => FieldValue::Flag(false),
        _ => match value.parse::<f64>() {
            Ok(number) if number.is_finite() => FieldValue::Number(number),
            _ => FieldValue::Text(value.to_string()),
        },
    };

    Ok((name.to_string(), value))
}
