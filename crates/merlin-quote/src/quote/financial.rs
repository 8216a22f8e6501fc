use super::domain::CanonicalInput;
use super::pricing::{ComponentKind, PriceBook};
use super::registry::{fields, FinancialDefaults};
use super::settings::{FinancialSettings, UtilityRates};
use super::sizing::SizingResult;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    pub component: ComponentKind,
    pub quantity: f64,
    pub unit_price: f64,
    pub cost: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SavingsBreakdown {
    pub demand_charge_reduction: f64,
    pub energy_arbitrage: f64,
    pub grid_services: f64,
    pub solar_offset: f64,
}

impl SavingsBreakdown {
    pub fn total(&self) -> f64 {
        self.demand_charge_reduction + self.energy_arbitrage + self.grid_services + self.solar_offset
    }
}

/// `computeFinancials` output for one option.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinancialSummary {
    pub line_items: Vec<LineItem>,
    pub equipment_cost: f64,
    pub balance_of_system: f64,
    pub total_investment: f64,
    pub federal_incentive: f64,
    pub net_investment: f64,
    pub savings: SavingsBreakdown,
    pub annual_savings: f64,
    /// `None` when the option saves nothing ("n/a").
    pub payback_years: Option<f64>,
    /// Simple return over the analysis horizon, in percent. `None` without net investment.
    pub return_on_investment: Option<f64>,
}

/// Tariff for a facility: its own answers where usable, otherwise the configured defaults.
pub fn utility_rates(input: &CanonicalInput, defaults: UtilityRates) -> UtilityRates {
    let positive = |field: &str| input.number(field).filter(|value| *value > 0.0);
    UtilityRates {
        electricity_rate: positive(fields::ELECTRICITY_RATE).unwrap_or(defaults.electricity_rate),
        demand_charge: positive(fields::DEMAND_CHARGE).unwrap_or(defaults.demand_charge),
    }
}

/// Pure roll-up of cost and savings for `sizing`. Tiers call this with their scaled sizing
/// and the base calculation's peak demand and prices.
pub fn roll_up(
    sizing: &SizingResult,
    peak_demand_kw: f64,
    prices: &PriceBook,
    defaults: &FinancialDefaults,
    rates: UtilityRates,
    settings: &FinancialSettings,
) -> FinancialSummary {
    let line_items: Vec<LineItem> = ComponentKind::ALL
        .into_iter()
        .filter_map(|component| {
            let quantity = component.quantity(sizing);
            (quantity > 0.0).then(|| {
                let unit_price = prices.price(component);
                LineItem {
                    component,
                    quantity,
                    unit_price,
                    cost: quantity * unit_price,
                }
            })
        })
        .collect();

    let equipment_cost: f64 = line_items.iter().map(|item| item.cost).sum();
    let balance_of_system = equipment_cost * settings.balance_of_system_rate;
    let total_investment = equipment_cost + balance_of_system;
    let federal_incentive = total_investment * settings.incentive_rate;
    let net_investment = total_investment - federal_incentive;

    let shaved_kw = sizing
        .bess_kw
        .min(peak_demand_kw.max(0.0) * defaults.peak_shaving_fraction);
    let savings = SavingsBreakdown {
        demand_charge_reduction: shaved_kw * rates.demand_charge * 12.0,
        energy_arbitrage: sizing.bess_kwh
            * settings.annual_cycles
            * settings.round_trip_efficiency
            * rates.electricity_rate
            * defaults.arbitrage_spread,
        grid_services: sizing.bess_kw * defaults.grid_services_per_kw_year,
        solar_offset: sizing.solar_kw * settings.solar_yield_kwh_per_kw * rates.electricity_rate,
    };
    let annual_savings = savings.total();

    let payback_years = (annual_savings > 0.0).then(|| net_investment / annual_savings);
    let return_on_investment = (net_investment > 0.0).then(|| {
        (annual_savings * settings.analysis_years - net_investment) / net_investment * 100.0
    });

    FinancialSummary {
        line_items,
        equipment_cost,
        balance_of_system,
        total_investment,
        federal_incentive,
        net_investment,
        savings,
        annual_savings,
        payback_years,
        return_on_investment,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quote::domain::{FieldValue, SubtypeResolution};
    use crate::quote::sizing::{EvChargers, GeneratorReason};

    fn sizing(bess_kw: f64, hours: f64) -> SizingResult {
        SizingResult {
            bess_kw,
            bess_kwh: bess_kw * hours,
            duration_hours: hours,
            solar_kw: 0.0,
            ev_chargers: EvChargers::default(),
            ev_power_kw: 0.0,
            generator_kw: 0.0,
            generator_reason: GeneratorReason::NotProposed,
            degenerate: false,
        }
    }

    fn defaults() -> FinancialDefaults {
        FinancialDefaults {
            peak_shaving_fraction: 0.25,
            arbitrage_spread: 0.35,
            grid_services_per_kw_year: 0.0,
        }
    }

    #[test]
    fn investment_and_incentive_follow_reference_prices() {
        let summary = roll_up(
            &sizing(1_000.0, 4.0),
            2_000.0,
            &PriceBook::reference(),
            &defaults(),
            UtilityRates::default(),
            &FinancialSettings::default(),
        );

        let equipment = 4_000.0 * 350.0 + 1_000.0 * 150.0;
        assert!((summary.equipment_cost - equipment).abs() < 1e-6);
        assert!((summary.total_investment - equipment * 1.12).abs() < 1e-6);
        assert!((summary.federal_incentive - summary.total_investment * 0.30).abs() < 1e-6);
        assert!(
            (summary.net_investment - (summary.total_investment - summary.federal_incentive)).abs()
                < 1e-6
        );
    }

    #[test]
    fn demand_savings_are_capped_by_peak_shaving_share() {
        let summary = roll_up(
            &sizing(1_000.0, 4.0),
            2_000.0,
            &PriceBook::reference(),
            &defaults(),
            UtilityRates::default(),
            &FinancialSettings::default(),
        );

        assert!((summary.savings.demand_charge_reduction - 500.0 * 15.0 * 12.0).abs() < 1e-6);
        let payback = summary.payback_years.expect("savings are positive");
        assert!((payback - summary.net_investment / summary.annual_savings).abs() < 1e-9);
    }

    #[test]
    fn zero_savings_leave_payback_undefined() {
        let summary = roll_up(
            &sizing(0.0, 4.0),
            0.0,
            &PriceBook::reference(),
            &defaults(),
            UtilityRates::default(),
            &FinancialSettings::default(),
        );

        assert_eq!(summary.annual_savings, 0.0);
        assert_eq!(summary.payback_years, None);
        assert_eq!(summary.return_on_investment, None);
    }

    #[test]
    fn facility_tariff_overrides_defaults() {
        let input = CanonicalInput {
            industry: "office".to_string(),
            subtype: "class_b".to_string(),
            subtype_resolution: SubtypeResolution::Canonical,
            fields: [
                (fields::ELECTRICITY_RATE.to_string(), FieldValue::Number(0.22)),
                (fields::DEMAND_CHARGE.to_string(), FieldValue::Number(-4.0)),
            ]
            .into_iter()
            .collect(),
            notices: Vec::new(),
        };

        let rates = utility_rates(&input, UtilityRates::default());
        assert_eq!(rates.electricity_rate, 0.22);
        assert_eq!(rates.demand_charge, 15.0);
    }
}
