use super::engine::BaseCalculation;
use super::financial::{roll_up, FinancialSummary};
use super::settings::FinancialSettings;
use super::sizing::{GeneratorReason, SizingResult};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    Starter,
    Standard,
    Maximum,
}

impl Tier {
    pub const ALL: [Tier; 3] = [Tier::Starter, Tier::Standard, Tier::Maximum];

    pub const fn label(self) -> &'static str {
        match self {
            Tier::Starter => "Starter",
            Tier::Standard => "Standard",
            Tier::Maximum => "Maximum",
        }
    }
}

/// One ranked option: a scaled copy of the base sizing with its own financial roll-up.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TierOption {
    pub tier: Tier,
    pub multiplier: f64,
    pub sizing: SizingResult,
    pub financials: FinancialSummary,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TierSet {
    pub starter: TierOption,
    pub standard: TierOption,
    pub maximum: TierOption,
}

impl TierSet {
    pub fn get(&self, tier: Tier) -> &TierOption {
        match tier {
            Tier::Starter => &self.starter,
            Tier::Standard => &self.standard,
            Tier::Maximum => &self.maximum,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &TierOption> {
        [&self.starter, &self.standard, &self.maximum].into_iter()
    }
}

/// Sizing increment, chosen from the standard option's unrounded storage power.
pub fn sizing_increment(standard_kw: f64) -> f64 {
    if standard_kw < 100.0 {
        5.0
    } else if standard_kw < 1_000.0 {
        10.0
    } else {
        50.0
    }
}

/// Round each tier's storage power to `increment` without breaking starter ≤ standard ≤
/// maximum. On a collision between tiers whose raw values differ, the smaller tier is
/// floored and the larger ceiled.
fn round_storage_power(raw: [f64; 3], increment: f64) -> [f64; 3] {
    let snap = |value: f64, op: fn(f64) -> f64| op(value / increment) * increment;
    let mut kw = raw.map(|value| snap(value, f64::round));
    let mut raised = [false; 3];

    for lower in 0..2 {
        let upper = lower + 1;
        if kw[lower] >= kw[upper] && raw[lower] < raw[upper] {
            if !raised[lower] {
                kw[lower] = snap(raw[lower], f64::floor);
            }
            kw[upper] = snap(raw[upper], f64::ceil);
            if kw[lower] >= kw[upper] {
                kw[upper] = kw[lower] + increment;
            }
            raised[upper] = true;
        }
    }

    if raw[1] > 0.0 && kw[1] <= 0.0 {
        kw[1] = increment;
    }
    kw[2] = kw[2].max(kw[1]);
    kw[0] = kw[0].min(kw[1]).max(0.0);
    kw
}

/// `generateTiers(BaseCalculation)`. Only the financial roll-up is re-run; load, sizing and
/// pricing come from `base` unchanged.
pub fn generate_tiers(base: &BaseCalculation, settings: &FinancialSettings) -> TierSet {
    let multipliers = base.tier_multipliers;
    let factors = [multipliers.starter, multipliers.standard, multipliers.maximum];
    let raw = factors.map(|factor| base.sizing.bess_kw * factor);
    let increment = sizing_increment(raw[1]);
    let kw = if base.sizing.degenerate {
        [0.0; 3]
    } else {
        round_storage_power(raw, increment)
    };

    let [starter, standard, maximum] =
        [0, 1, 2].map(|index| scale(base, Tier::ALL[index], factors[index], kw[index], settings));

    TierSet {
        starter,
        standard,
        maximum,
    }
}

fn scale(
    base: &BaseCalculation,
    tier: Tier,
    multiplier: f64,
    bess_kw: f64,
    settings: &FinancialSettings,
) -> TierOption {
    // An opted-in generator is a share of storage power and follows the tier's storage.
    let generator_kw = match base.sizing.generator_reason {
        GeneratorReason::FacilityRequest if base.sizing.bess_kw > 0.0 => {
            base.sizing.generator_kw * bess_kw / base.sizing.bess_kw
        }
        _ => base.sizing.generator_kw,
    };
    let sizing = SizingResult {
        bess_kw,
        bess_kwh: bess_kw * base.sizing.duration_hours,
        solar_kw: base.sizing.solar_kw * multiplier,
        generator_kw,
        ..base.sizing.clone()
    };
    let financials = roll_up(
        &sizing,
        base.load.peak_demand_kw,
        &base.prices,
        &base.financial_defaults,
        base.rates,
        settings,
    );

    TierOption {
        tier,
        multiplier,
        sizing,
        financials,
    }
}
