use super::registry::Criticality;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Fixed constants used by the sizing calculator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SizingConstants {
    /// Share of peak demand proposed as solar when the facility opts in.
    pub solar_fraction_of_peak: f64,
    pub level2_charger_kw: f64,
    pub dcfc_charger_kw: f64,
    pub hpc_charger_kw: f64,
    /// Reserve margin applied to the critical load when a generator is auto-recommended.
    pub generator_reserve_margin: f64,
    /// Generator size as a share of storage power when the facility merely opts in.
    pub opt_in_generator_fraction: f64,
    /// Subtypes at or above this tier get a generator without asking.
    pub generator_criticality_threshold: Criticality,
}

impl Default for SizingConstants {
    fn default() -> Self {
        Self {
            solar_fraction_of_peak: 0.40,
            level2_charger_kw: 7.2,
            dcfc_charger_kw: 150.0,
            hpc_charger_kw: 350.0,
            generator_reserve_margin: 1.25,
            opt_in_generator_fraction: 0.50,
            generator_criticality_threshold: Criticality::Critical,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinancialSettings {
    pub incentive_rate: f64,
    /// Installation and interconnection adder on equipment cost.
    pub balance_of_system_rate: f64,
    pub annual_cycles: f64,
    pub round_trip_efficiency: f64,
    /// Annual kWh produced per kW of installed solar.
    pub solar_yield_kwh_per_kw: f64,
    pub analysis_years: f64,
}

impl Default for FinancialSettings {
    fn default() -> Self {
        Self {
            incentive_rate: 0.30,
            balance_of_system_rate: 0.12,
            annual_cycles: 250.0,
            round_trip_efficiency: 0.88,
            solar_yield_kwh_per_kw: 1400.0,
            analysis_years: 10.0,
        }
    }
}

/// Utility tariff used when the facility did not supply its own.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UtilityRates {
    /// $ per kWh.
    pub electricity_rate: f64,
    /// $ per kW-month.
    pub demand_charge: f64,
}

impl Default for UtilityRates {
    fn default() -> Self {
        Self {
            electricity_rate: 0.15,
            demand_charge: 15.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineSettings {
    pub sizing: SizingConstants,
    pub financial: FinancialSettings,
    pub utility: UtilityRates,
    pub pricing_timeout_ms: u64,
}

impl EngineSettings {
    pub fn pricing_timeout(&self) -> Duration {
        Duration::from_millis(self.pricing_timeout_ms)
    }
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            sizing: SizingConstants::default(),
            financial: FinancialSettings::default(),
            utility: UtilityRates::default(),
            pricing_timeout_ms: 2_000,
        }
    }
}
