use crate::infra::{build_engine, parse_field, Engine};
use clap::Args;
use merlin_quote::config::{AppConfig, QuoteConfig};
use merlin_quote::error::AppError;
use merlin_quote::quote::{
    FacilityInput, FieldValue, Fingerprint, IndustryRegistry, MappingAudit, MappingRegistry,
    MappingViolation, QuoteConfidence, QuoteRecord, TierOption,
};
use serde::Serialize;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub(crate) struct QuoteArgs {
    /// Industry slug, e.g. hotel or car_wash
    #[arg(long)]
    pub(crate) industry: String,
    /// Questionnaire answer as name=value; repeat for each answer
    #[arg(long = "field", value_parser = parse_field)]
    pub(crate) fields: Vec<(String, FieldValue)>,
    /// Print the authenticated quote record as JSON
    #[arg(long)]
    pub(crate) json: bool,
}

#[derive(Args, Debug, Default)]
pub(crate) struct AuditArgs {
    /// CSV of observed answers with columns industry,field,value
    #[arg(long)]
    pub(crate) observed: Option<PathBuf>,
    /// Print violations as JSON
    #[arg(long)]
    pub(crate) json: bool,
}

fn quote_config() -> Result<QuoteConfig, AppError> {
    Ok(AppConfig::load()?.quote)
}

pub(crate) async fn run_quote(args: QuoteArgs) -> Result<(), AppError> {
    let engine = build_engine(&quote_config()?)?;
    let record = quote_once(&engine, &args.industry, &args.fields).await?;

    if args.json {
        let rendered =
            serde_json::to_string_pretty(&record).map_err(|err| AppError::Input(err.to_string()))?;
        println!("{rendered}");
    } else {
        render_quote(&record);
    }
    Ok(())
}

pub(crate) async fn quote_once(
    engine: &Engine,
    industry: &str,
    fields: &[(String, FieldValue)],
) -> Result<QuoteRecord, AppError> {
    let mut input = FacilityInput::new();
    for (name, value) in fields {
        input.insert(name.clone(), value.clone());
    }

    let canonical = engine.normalize(industry, &input)?;
    let fingerprint = Fingerprint::of(&canonical);
    Ok(engine.quote(&canonical, &fingerprint).await?)
}

fn render_quote(record: &QuoteRecord) {
    let base = &record.base;
    println!(
        "Quote {} | {} / {} | fingerprint {}",
        record.quote_id,
        record.industry,
        record.subtype,
        record.fingerprint.short()
    );
    println!(
        "- Peak demand {:.1} kW | annual consumption {:.0} kWh",
        base.load.peak_demand_kw, base.load.annual_consumption_kwh
    );
    if record.confidence == QuoteConfidence::Degraded {
        println!("- Pricing confidence: degraded (reference prices substituted)");
    }
    for notice in &record.notices {
        println!("  ! {}", notice.summary());
    }

    println!("Options:");
    for option in record.tiers.iter() {
        render_tier(option);
    }
}

fn render_tier(option: &TierOption) {
    let sizing = &option.sizing;
    let money = &option.financials;
    println!(
        "  - {}: {:.0} kW / {:.0} kWh storage | {:.0} kW solar | {:.0} kW generator | {} EV chargers",
        option.tier.label(),
        sizing.bess_kw,
        sizing.bess_kwh,
        sizing.solar_kw,
        sizing.generator_kw,
        sizing.ev_chargers.total()
    );
    let payback = money
        .payback_years
        .map(|years| format!("{years:.1} yrs"))
        .unwrap_or_else(|| "n/a".to_string());
    println!(
        "    ${:.0} investment | ${:.0} net after incentive | ${:.0}/yr savings | payback {}",
        money.total_investment, money.net_investment, money.annual_savings, payback
    );
}

pub(crate) fn run_industries() -> Result<(), AppError> {
    let config = quote_config()?;
    let registry = match &config.registry_path {
        Some(path) => IndustryRegistry::from_path(path)?,
        None => IndustryRegistry::builtin(),
    };

    println!("{} industries", registry.len());
    for industry in registry.iter() {
        let subtypes: Vec<&str> = industry.subtypes.keys().map(String::as_str).collect();
        println!(
            "- {} ({}) by {}: default {} [{}]",
            industry.slug,
            industry.name,
            industry.quantity_field,
            industry.default_subtype,
            subtypes.join(", ")
        );
    }
    Ok(())
}

#[derive(Debug, Serialize)]
struct AuditReport<'a> {
    observed: Option<&'a PathBuf>,
    violations: &'a [MappingViolation],
}

/// Static table check plus, when given, the observed-answers check. Any violation is an error
/// so the command exits non-zero.
pub(crate) fn run_mappings_audit(args: AuditArgs) -> Result<(), AppError> {
    let config = quote_config()?;
    let registry = match &config.registry_path {
        Some(path) => IndustryRegistry::from_path(path)?,
        None => IndustryRegistry::builtin(),
    };
    let mappings = match &config.mappings_path {
        Some(path) => MappingRegistry::from_path(path)?,
        None => MappingRegistry::builtin(),
    };

    let violations = audit(&registry, &mappings, args.observed.as_ref())?;

    if args.json {
        let report = AuditReport {
            observed: args.observed.as_ref(),
            violations: &violations,
        };
        let rendered =
            serde_json::to_string_pretty(&report).map_err(|err| AppError::Input(err.to_string()))?;
        println!("{rendered}");
    } else if violations.is_empty() {
        println!("Mapping audit passed: no violations");
    } else {
        println!("Mapping audit found {} violation(s):", violations.len());
        for violation in &violations {
            println!("  - {violation}");
        }
    }

    if violations.is_empty() {
        Ok(())
    } else {
        Err(AppError::MappingViolations(violations.len()))
    }
}

pub(crate) fn audit(
    registry: &IndustryRegistry,
    mappings: &MappingRegistry,
    observed: Option<&PathBuf>,
) -> Result<Vec<MappingViolation>, AppError> {
    let audit = MappingAudit::new(registry, mappings);
    let mut violations = audit.check_tables();
    if let Some(path) = observed {
        violations.extend(audit.check_observed_path(path)?);
    }
    Ok(violations)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::ConfiguredPricing;
    use merlin_quote::quote::{EngineSettings, QuoteError, Tier};
    use std::sync::Arc;

    fn engine() -> Engine {
        Engine::new(
            Arc::new(IndustryRegistry::builtin()),
            Arc::new(MappingRegistry::builtin()),
            Arc::new(ConfiguredPricing::default()),
            EngineSettings::default(),
        )
    }

    #[tokio::test]
    async fn quote_once_builds_three_tiers() {
        let fields = vec![
            parse_field("numberOfRooms=400").expect("field"),
            parse_field("hotelClass=upscale").expect("field"),
        ];

        let record = quote_once(&engine(), "hotel", &fields)
            .await
            .expect("quote authenticates");

        assert_eq!(record.subtype, "upscale");
        assert_eq!(record.tiers.get(Tier::Standard).sizing.bess_kw, 1100.0);
        assert_eq!(record.confidence, QuoteConfidence::Full);
    }

    #[tokio::test]
    async fn quote_once_surfaces_validation_failures() {
        let fields = vec![parse_field("peakLoad=1.2").expect("field")];

        let error = quote_once(&engine(), "hotel", &fields)
            .await
            .expect_err("room count is required");

        assert!(matches!(error, AppError::Quote(QuoteError::Validation(_))));
    }

    #[test]
    fn audit_of_builtin_tables_is_clean() {
        let violations = audit(
            &IndustryRegistry::builtin(),
            &MappingRegistry::builtin(),
            None,
        )
        .expect("audit runs");
        assert!(violations.is_empty(), "{violations:?}");
    }
}
