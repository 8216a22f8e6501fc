use super::domain::{CalculationNotice, CanonicalInput, FacilityInput};
use super::error::QuoteError;
use super::financial::{roll_up, utility_rates, FinancialSummary};
use super::fingerprint::Fingerprint;
use super::load::{compute_peak_demand, LoadProfile};
use super::mapping::MappingRegistry;
use super::pricing::{resolve_prices, PriceBook, PricingProvider};
use super::registry::{FinancialDefaults, IndustryRegistry, RegistryError, TierMultipliers};
use super::settings::{EngineSettings, UtilityRates};
use super::sizing::{compute_sizing, opted_into_solar, SizingResult};
use super::tiers::{generate_tiers, TierSet};
use super::validator::{authenticate, QuoteRecord};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuoteConfidence {
    Full,
    /// At least one component was priced from the static reference table after the
    /// collaborator failed.
    Degraded,
}

/// Load, sizing and financial result for one canonical input. Never mutated; tiers are
/// derived from it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BaseCalculation {
    pub industry: String,
    pub subtype: String,
    pub load: LoadProfile,
    pub sizing: SizingResult,
    pub prices: PriceBook,
    pub rates: UtilityRates,
    pub financial_defaults: FinancialDefaults,
    pub tier_multipliers: TierMultipliers,
    pub financials: FinancialSummary,
    pub confidence: QuoteConfidence,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub notices: Vec<CalculationNotice>,
}

/// Stateless pipeline from raw answers to an authenticated quote. Shared read-only by every
/// session.
pub struct QuoteEngine<P> {
    registry: Arc<IndustryRegistry>,
    mappings: Arc<MappingRegistry>,
    pricing: Arc<P>,
    settings: EngineSettings,
}

impl<P> QuoteEngine<P>
where
    P: PricingProvider + 'static,
{
    pub fn new(
        registry: Arc<IndustryRegistry>,
        mappings: Arc<MappingRegistry>,
        pricing: Arc<P>,
        settings: EngineSettings,
    ) -> Self {
        Self {
            registry,
            mappings,
            pricing,
            settings,
        }
    }

    pub fn registry(&self) -> &IndustryRegistry {
        &self.registry
    }

    pub fn mappings(&self) -> &MappingRegistry {
        &self.mappings
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    pub fn normalize(&self, slug: &str, input: &FacilityInput) -> Result<CanonicalInput, QuoteError> {
        self.mappings.normalize(&self.registry, slug, input)
    }

    /// Load, sizing, pricing and the base financial roll-up.
    pub async fn calculate(&self, input: &CanonicalInput) -> Result<BaseCalculation, QuoteError> {
        let industry = self.registry.get(&input.industry)?;
        let subtype = industry
            .subtype(&input.subtype)
            .ok_or_else(|| RegistryError::UnknownSubtype {
                industry: industry.slug.clone(),
                subtype: input.subtype.clone(),
            })?;

        let mut notices = input.notices.clone();
        let load = compute_peak_demand(input, industry);
        let sizing = compute_sizing(
            load.peak_demand_kw,
            industry,
            subtype,
            input,
            &self.settings.sizing,
        );

        if sizing.degenerate {
            let detail = format!(
                "{} = {} yields no peak demand",
                industry.quantity_field, load.quantity
            );
            warn!(industry = %industry.slug, %detail, "degenerate facility input");
            notices.push(CalculationNotice::DegenerateInput {
                field: industry.quantity_field.clone(),
                detail,
            });
        }

        if !sizing.degenerate && opted_into_solar(input) && !industry.recommendations.solar {
            debug!(industry = %industry.slug, "solar opt-in ignored");
            notices.push(CalculationNotice::SolarNotRecommended {
                industry: industry.slug.clone(),
            });
        }

        let prices = if sizing.degenerate {
            PriceBook::reference()
        } else {
            resolve_prices(
                self.pricing.as_ref(),
                &sizing,
                self.settings.pricing_timeout(),
                &mut notices,
            )
            .await
        };

        let rates = utility_rates(input, self.settings.utility);
        let financials = roll_up(
            &sizing,
            load.peak_demand_kw,
            &prices,
            &industry.financial,
            rates,
            &self.settings.financial,
        );
        let confidence = if prices.degraded() {
            QuoteConfidence::Degraded
        } else {
            QuoteConfidence::Full
        };

        Ok(BaseCalculation {
            industry: industry.slug.clone(),
            subtype: input.subtype.clone(),
            load,
            sizing,
            prices,
            rates,
            financial_defaults: industry.financial.clone(),
            tier_multipliers: industry.tiers,
            financials,
            confidence,
            notices,
        })
    }

    pub fn tiers(&self, base: &BaseCalculation) -> TierSet {
        generate_tiers(base, &self.settings.financial)
    }

    /// Calculation, tiers and authentication for an already fingerprinted input.
    pub async fn quote(
        &self,
        input: &CanonicalInput,
        fingerprint: &Fingerprint,
    ) -> Result<QuoteRecord, QuoteError> {
        let base = self.calculate(input).await?;
        let tiers = self.tiers(&base);
        let industry = self.registry.get(&input.industry)?;

        let record = authenticate(industry, input, base, tiers, fingerprint)?;
        info!(
            quote_id = %record.quote_id,
            industry = %record.industry,
            subtype = %record.subtype,
            fingerprint = %fingerprint.short(),
            confidence = ?record.confidence,
            "quote authenticated"
        );
        Ok(record)
    }
}
