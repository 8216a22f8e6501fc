//! Pricing collaborator boundary and the unit-price book a quote is rolled up against.

use super::domain::CalculationNotice;
use super::sizing::SizingResult;
use async_trait::async_trait;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::io::Read;
use std::path::Path;
use std::time::Duration;
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComponentKind {
    /// Battery energy, priced per kWh.
    Battery,
    /// Power conversion system, priced per kW.
    PowerConversion,
    /// Solar array, priced per kW.
    Solar,
    Level2Charger,
    DcfcCharger,
    HpcCharger,
    /// Backup generator, priced per kW.
    Generator,
}

impl ComponentKind {
    pub const ALL: [ComponentKind; 7] = [
        ComponentKind::Battery,
        ComponentKind::PowerConversion,
        ComponentKind::Solar,
        ComponentKind::Level2Charger,
        ComponentKind::DcfcCharger,
        ComponentKind::HpcCharger,
        ComponentKind::Generator,
    ];

    pub const fn key(self) -> &'static str {
        match self {
            ComponentKind::Battery => "battery",
            ComponentKind::PowerConversion => "power_conversion",
            ComponentKind::Solar => "solar",
            ComponentKind::Level2Charger => "level2_charger",
            ComponentKind::DcfcCharger => "dcfc_charger",
            ComponentKind::HpcCharger => "hpc_charger",
            ComponentKind::Generator => "generator",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.key().eq_ignore_ascii_case(key.trim()))
    }

    /// Quantity of this component in `sizing`, in the unit it is priced by.
    pub fn quantity(self, sizing: &SizingResult) -> f64 {
        match self {
            ComponentKind::Battery => sizing.bess_kwh,
            ComponentKind::PowerConversion => sizing.bess_kw,
            ComponentKind::Solar => sizing.solar_kw,
            ComponentKind::Level2Charger => f64::from(sizing.ev_chargers.level2),
            ComponentKind::DcfcCharger => f64::from(sizing.ev_chargers.dcfc),
            ComponentKind::HpcCharger => f64::from(sizing.ev_chargers.hpc),
            ComponentKind::Generator => sizing.generator_kw,
        }
    }
}

impl fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceSource {
    Vendor,
    MarketData,
    StaticReference,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UnitPrice {
    pub price_per_unit: f64,
    pub source: PriceSource,
    /// Provider confidence in [0, 1].
    pub confidence: f64,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PricingError {
    #[error("no quote available for this component")]
    NotQuoted,
    #[error("pricing source unavailable: {0}")]
    Unavailable(String),
    #[error("pricing lookup timed out after {after_ms} ms")]
    TimedOut { after_ms: u64 },
}

/// `getUnitPrice(componentType, capacity)`. Implementations may fail or stall; the engine
/// bounds every call and falls back to [`StaticReferencePricing`].
#[async_trait]
pub trait PricingProvider: Send + Sync {
    async fn unit_price(
        &self,
        component: ComponentKind,
        capacity: f64,
    ) -> Result<UnitPrice, PricingError>;
}

/// Reference prices used when no better source answers.
#[derive(Debug, Clone, Copy, Default)]
pub struct StaticReferencePricing;

impl StaticReferencePricing {
    pub const CONFIDENCE: f64 = 0.5;

    pub const fn price_per_unit(component: ComponentKind) -> f64 {
        match component {
            ComponentKind::Battery => 350.0,
            ComponentKind::PowerConversion => 150.0,
            ComponentKind::Solar => 1_500.0,
            ComponentKind::Level2Charger => 6_000.0,
            ComponentKind::DcfcCharger => 45_000.0,
            ComponentKind::HpcCharger => 120_000.0,
            ComponentKind::Generator => 800.0,
        }
    }

    pub fn reference(component: ComponentKind) -> UnitPrice {
        UnitPrice {
            price_per_unit: Self::price_per_unit(component),
            source: PriceSource::StaticReference,
            confidence: Self::CONFIDENCE,
        }
    }
}

#[async_trait]
impl PricingProvider for StaticReferencePricing {
    async fn unit_price(
        &self,
        component: ComponentKind,
        _capacity: f64,
    ) -> Result<UnitPrice, PricingError> {
        Ok(Self::reference(component))
    }
}

#[derive(Debug)]
pub enum PriceSheetError {
    Io(std::io::Error),
    Csv(csv::Error),
    UnknownComponent(String),
    UnknownSource(String),
}

impl fmt::Display for PriceSheetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PriceSheetError::Io(err) => write!(f, "failed to read price sheet: {}", err),
            PriceSheetError::Csv(err) => write!(f, "invalid price sheet CSV: {}", err),
            PriceSheetError::UnknownComponent(value) => {
                write!(f, "price sheet names unknown component '{}'", value)
            }
            PriceSheetError::UnknownSource(value) => {
                write!(f, "price sheet names unknown source '{}'", value)
            }
        }
    }
}

impl std::error::Error for PriceSheetError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PriceSheetError::Io(err) => Some(err),
            PriceSheetError::Csv(err) => Some(err),
            PriceSheetError::UnknownComponent(_) | PriceSheetError::UnknownSource(_) => None,
        }
    }
}

impl From<std::io::Error> for PriceSheetError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<csv::Error> for PriceSheetError {
    fn from(err: csv::Error) -> Self {
        Self::Csv(err)
    }
}

#[derive(Debug, Deserialize)]
struct PriceRow {
    component: String,
    price_per_unit: f64,
    source: String,
    #[serde(default, deserialize_with = "empty_as_none")]
    confidence: Option<f64>,
    #[serde(default, deserialize_with = "empty_as_none")]
    min_capacity: Option<f64>,
}

fn empty_as_none<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => value.parse().map(Some).map_err(serde::de::Error::custom),
    }
}

#[derive(Debug, Clone, PartialEq)]
struct SheetEntry {
    min_capacity: f64,
    price: UnitPrice,
}

/// Vendor and market-data prices loaded from a CSV sheet with columns
/// `component,price_per_unit,source,confidence,min_capacity`. Volume breaks are expressed by
/// several rows for one component; the row with the largest `min_capacity` not above the
/// requested capacity wins.
#[derive(Debug, Clone, Default)]
pub struct PriceSheetPricing {
    entries: BTreeMap<ComponentKind, Vec<SheetEntry>>,
}

impl PriceSheetPricing {
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, PriceSheetError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);
        let mut entries: BTreeMap<ComponentKind, Vec<SheetEntry>> = BTreeMap::new();

        for record in csv_reader.deserialize::<PriceRow>() {
            let row = record?;
            let component = ComponentKind::from_key(&row.component)
                .ok_or_else(|| PriceSheetError::UnknownComponent(row.component.clone()))?;
            let (source, default_confidence) = match row.source.to_ascii_lowercase().as_str() {
                "vendor" => (PriceSource::Vendor, 0.9),
                "market" | "market_data" => (PriceSource::MarketData, 0.75),
                _ => return Err(PriceSheetError::UnknownSource(row.source)),
            };

            entries.entry(component).or_default().push(SheetEntry {
                min_capacity: row.min_capacity.unwrap_or(0.0),
                price: UnitPrice {
                    price_per_unit: row.price_per_unit,
                    source,
                    confidence: row.confidence.unwrap_or(default_confidence).clamp(0.0, 1.0),
                },
            });
        }

        for rows in entries.values_mut() {
            rows.sort_by(|a, b| a.min_capacity.total_cmp(&b.min_capacity));
        }

        Ok(Self { entries })
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, PriceSheetError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    pub fn len(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl PricingProvider for PriceSheetPricing {
    async fn unit_price(
        &self,
        component: ComponentKind,
        capacity: f64,
    ) -> Result<UnitPrice, PricingError> {
        self.entries
            .get(&component)
            .and_then(|rows| {
                rows.iter()
                    .rev()
                    .find(|entry| entry.min_capacity <= capacity)
            })
            .map(|entry| entry.price)
            .ok_or(PricingError::NotQuoted)
    }
}

/// A resolved unit price and where it came from.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ComponentPrice {
    pub component: ComponentKind,
    pub price_per_unit: f64,
    pub source: PriceSource,
    pub confidence: f64,
    /// True when the collaborator failed and the reference price was substituted.
    pub fallback: bool,
}

/// Unit prices for every component, resolved once per base calculation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceBook {
    prices: BTreeMap<ComponentKind, ComponentPrice>,
}

impl PriceBook {
    /// Book made only of reference prices, used when nothing needs pricing.
    pub fn reference() -> Self {
        let prices = ComponentKind::ALL
            .into_iter()
            .map(|component| (component, reference_entry(component, false)))
            .collect();
        Self { prices }
    }

    pub fn price(&self, component: ComponentKind) -> f64 {
        self.prices
            .get(&component)
            .map(|entry| entry.price_per_unit)
            .unwrap_or_else(|| StaticReferencePricing::price_per_unit(component))
    }

    pub fn entries(&self) -> impl Iterator<Item = &ComponentPrice> {
        self.prices.values()
    }

    pub fn degraded(&self) -> bool {
        self.prices.values().any(|entry| entry.fallback)
    }
}

fn reference_entry(component: ComponentKind, fallback: bool) -> ComponentPrice {
    let reference = StaticReferencePricing::reference(component);
    ComponentPrice {
        component,
        price_per_unit: reference.price_per_unit,
        source: reference.source,
        confidence: reference.confidence,
        fallback,
    }
}

/// Ask `provider` for every component present in `sizing`, each call bounded by `timeout`.
/// Failures, stalls and unusable prices fall back to the reference table and are recorded
/// as [`CalculationNotice::PricingUnavailable`].
pub async fn resolve_prices<P>(
    provider: &P,
    sizing: &SizingResult,
    timeout: Duration,
    notices: &mut Vec<CalculationNotice>,
) -> PriceBook
where
    P: PricingProvider + ?Sized,
{
    let mut book = PriceBook::reference();

    for component in ComponentKind::ALL {
        let capacity = component.quantity(sizing);
        if capacity <= 0.0 {
            continue;
        }

        let outcome = match tokio::time::timeout(timeout, provider.unit_price(component, capacity))
            .await
        {
            Ok(result) => result,
            Err(_) => Err(PricingError::TimedOut {
                after_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
            }),
        };

        let entry = match outcome {
            Ok(price) if price.price_per_unit.is_finite() && price.price_per_unit >= 0.0 => {
                ComponentPrice {
                    component,
                    price_per_unit: price.price_per_unit,
                    source: price.source,
                    confidence: price.confidence,
                    fallback: false,
                }
            }
            Ok(price) => {
                let reason = format!("unusable price {}", price.price_per_unit);
                warn!(%component, %reason, "pricing fell back to reference");
                notices.push(CalculationNotice::PricingUnavailable {
                    component: component.to_string(),
                    reason,
                });
                reference_entry(component, true)
            }
            Err(err) => {
                warn!(%component, error = %err, "pricing fell back to reference");
                notices.push(CalculationNotice::PricingUnavailable {
                    component: component.to_string(),
                    reason: err.to_string(),
                });
                reference_entry(component, true)
            }
        };
        book.prices.insert(component, entry);
    }

    book
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quote::sizing::{EvChargers, GeneratorReason};
    use std::io::Cursor;

    fn sizing() -> SizingResult {
        SizingResult {
            bess_kw: 500.0,
            bess_kwh: 2_000.0,
            duration_hours: 4.0,
            solar_kw: 0.0,
            ev_chargers: EvChargers::default(),
            ev_power_kw: 0.0,
            generator_kw: 0.0,
            generator_reason: GeneratorReason::NotProposed,
            degenerate: false,
        }
    }

    struct Stalled;

    #[async_trait]
    impl PricingProvider for Stalled {
        async fn unit_price(
            &self,
            _component: ComponentKind,
            _capacity: f64,
        ) -> Result<UnitPrice, PricingError> {
            std::future::pending().await
        }
    }

    #[tokio::test]
    async fn stalled_provider_falls_back_to_reference() {
        let mut notices = Vec::new();
        let book = resolve_prices(&Stalled, &sizing(), Duration::from_millis(10), &mut notices).await;

        assert!(book.degraded());
        assert_eq!(book.price(ComponentKind::Battery), 350.0);
        assert_eq!(notices.len(), 2, "battery and power conversion were priced");
        assert!(matches!(
            &notices[0],
            CalculationNotice::PricingUnavailable { component, reason }
                if component == "battery" && reason.contains("timed out")
        ));
    }

    #[tokio::test]
    async fn reference_provider_is_not_degraded() {
        let mut notices = Vec::new();
        let book = resolve_prices(
            &StaticReferencePricing,
            &sizing(),
            Duration::from_millis(50),
            &mut notices,
        )
        .await;

        assert!(!book.degraded());
        assert!(notices.is_empty());
    }

    #[tokio::test]
    async fn price_sheet_applies_volume_breaks() {
        let csv = "component,price_per_unit,source,confidence,min_capacity\n\
battery,320,vendor,,\n\
battery,290,vendor,0.95,1000\n\
solar,1200,market,,\n";
        let sheet = PriceSheetPricing::from_reader(Cursor::new(csv)).expect("sheet parses");

        let small = sheet
            .unit_price(ComponentKind::Battery, 400.0)
            .await
            .expect("quoted");
        let large = sheet
            .unit_price(ComponentKind::Battery, 2_000.0)
            .await
            .expect("quoted");
        let solar = sheet
            .unit_price(ComponentKind::Solar, 100.0)
            .await
            .expect("quoted");

        assert_eq!(small.price_per_unit, 320.0);
        assert_eq!(large.price_per_unit, 290.0);
        assert_eq!(large.confidence, 0.95);
        assert_eq!(solar.source, PriceSource::MarketData);
        assert_eq!(
            sheet.unit_price(ComponentKind::Generator, 10.0).await,
            Err(PricingError::NotQuoted)
        );
    }

    #[test]
    fn price_sheet_rejects_unknown_components() {
        let csv = "component,price_per_unit,source,confidence,min_capacity\nflux_capacitor,1,vendor,,\n";
        assert!(matches!(
            PriceSheetPricing::from_reader(Cursor::new(csv)),
            Err(PriceSheetError::UnknownComponent(name)) if name == "flux_capacitor"
        ));
    }
}
