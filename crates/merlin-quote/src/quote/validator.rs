use super::domain::{CalculationNotice, CanonicalInput, QuoteId};
use super::engine::{BaseCalculation, QuoteConfidence};
use super::error::{ValidationFailure, Violation};
use super::fingerprint::Fingerprint;
use super::pricing::ComponentPrice;
use super::registry::IndustryConfig;
use super::tiers::{TierOption, TierSet};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationStatus {
    Authenticated,
}

/// An authenticated quote. Immutable; new input produces a new record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuoteRecord {
    pub quote_id: QuoteId,
    pub fingerprint: Fingerprint,
    pub industry: String,
    pub subtype: String,
    pub base: BaseCalculation,
    pub tiers: TierSet,
    pub validation_status: ValidationStatus,
    pub pricing: Vec<ComponentPrice>,
    pub confidence: QuoteConfidence,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub notices: Vec<CalculationNotice>,
    pub created_at: DateTime<Utc>,
}

/// `authenticate(candidateTiers)`: structural checks, then a fresh quote id and timestamp.
pub fn authenticate(
    industry: &IndustryConfig,
    input: &CanonicalInput,
    base: BaseCalculation,
    tiers: TierSet,
    fingerprint: &Fingerprint,
) -> Result<QuoteRecord, ValidationFailure> {
    let mut violations = Vec::new();

    for field in &industry.required_fields {
        if !input.provided(field) {
            violations.push(Violation::new(field.as_str(), "provided", "missing"));
        }
    }

    if base.sizing.degenerate {
        let received = input
            .value(&industry.quantity_field)
            .map(|value| value.to_string())
            .unwrap_or_else(|| "missing".to_string());
        violations.push(Violation::new(
            industry.quantity_field.as_str(),
            "positive quantity producing peak demand",
            received,
        ));
    }

    for option in tiers.iter() {
        check_numbers(option, &mut violations);
    }

    if tiers.standard.sizing.bess_kw <= 0.0 {
        violations.push(Violation::new(
            "standard.bess_kw",
            "> 0",
            tiers.standard.sizing.bess_kw.to_string(),
        ));
    }

    check_ordering(&tiers, &mut violations);

    if !violations.is_empty() {
        return Err(ValidationFailure {
            fingerprint: fingerprint.to_string(),
            violations,
        });
    }

    let pricing = base.prices.entries().copied().collect();
    let notices = base.notices.clone();
    Ok(QuoteRecord {
        quote_id: QuoteId::generate(),
        fingerprint: fingerprint.clone(),
        industry: base.industry.clone(),
        subtype: base.subtype.clone(),
        confidence: base.confidence,
        base,
        tiers,
        validation_status: ValidationStatus::Authenticated,
        pricing,
        notices,
        created_at: Utc::now(),
    })
}

fn check_numbers(option: &TierOption, violations: &mut Vec<Violation>) {
    let tier = option.tier.label().to_ascii_lowercase();
    let sizing = &option.sizing;
    let money = &option.financials;

    let mut non_negative = vec![
        ("bess_kw", sizing.bess_kw),
        ("bess_kwh", sizing.bess_kwh),
        ("solar_kw", sizing.solar_kw),
        ("ev_power_kw", sizing.ev_power_kw),
        ("generator_kw", sizing.generator_kw),
        ("total_investment", money.total_investment),
        ("federal_incentive", money.federal_incentive),
        ("net_investment", money.net_investment),
        ("annual_savings", money.annual_savings),
    ];
    if let Some(payback) = money.payback_years {
        non_negative.push(("payback_years", payback));
    }

    for (name, value) in non_negative {
        if !(value.is_finite() && value >= 0.0) {
            violations.push(Violation::new(
                format!("{tier}.{name}"),
                "finite, non-negative",
                value.to_string(),
            ));
        }
    }

    if let Some(roi) = money.return_on_investment {
        if !roi.is_finite() {
            violations.push(Violation::new(
                format!("{tier}.return_on_investment"),
                "finite",
                roi.to_string(),
            ));
        }
    }
}

fn check_ordering(tiers: &TierSet, violations: &mut Vec<Violation>) {
    let metrics: [(&str, fn(&TierOption) -> f64); 3] = [
        ("bess_kw", |option| option.sizing.bess_kw),
        ("bess_kwh", |option| option.sizing.bess_kwh),
        ("total_investment", |option| option.financials.total_investment),
    ];

    for (name, metric) in metrics {
        let pairs = [
            (&tiers.starter, &tiers.standard),
            (&tiers.standard, &tiers.maximum),
        ];
        for (lower, upper) in pairs {
            if metric(lower) > metric(upper) {
                violations.push(Violation::new(
                    format!("{}.{name}", upper.tier.label().to_ascii_lowercase()),
                    format!(">= {}", metric(lower)),
                    metric(upper).to_string(),
                ));
            }
        }
    }
}
