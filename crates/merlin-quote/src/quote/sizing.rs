use super::domain::CanonicalInput;
use super::registry::{fields, IndustryConfig, SubtypeConfig};
use super::settings::SizingConstants;
use serde::{Deserialize, Serialize};

/// Grid connection quality reported by the facility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GridConnection {
    Reliable,
    Unreliable,
    Limited,
    OffGrid,
    Microgrid,
}

impl GridConnection {
    pub fn from_answer(answer: Option<&str>) -> Self {
        let Some(answer) = answer else {
            return Self::Reliable;
        };
        match answer
            .trim()
            .to_ascii_lowercase()
            .replace(['-', ' '], "_")
            .as_str()
        {
            "unreliable" | "poor" => Self::Unreliable,
            "limited" | "constrained" => Self::Limited,
            "off_grid" | "offgrid" | "none" => Self::OffGrid,
            "microgrid" => Self::Microgrid,
            _ => Self::Reliable,
        }
    }

    fn demands_generator(self) -> bool {
        matches!(self, Self::Unreliable | Self::OffGrid | Self::Microgrid)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GeneratorReason {
    NotProposed,
    Criticality,
    GridQuality,
    FacilityRequest,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct EvChargers {
    pub level2: u32,
    pub dcfc: u32,
    pub hpc: u32,
}

impl EvChargers {
    pub fn from_input(input: &CanonicalInput) -> Self {
        Self {
            level2: input.count(fields::LEVEL2_CHARGERS),
            dcfc: input.count(fields::DCFC_CHARGERS),
            hpc: input.count(fields::HPC_CHARGERS),
        }
    }

    pub fn total(&self) -> u64 {
        u64::from(self.level2) + u64::from(self.dcfc) + u64::from(self.hpc)
    }

    pub fn power_kw(&self, constants: &SizingConstants) -> f64 {
        f64::from(self.level2) * constants.level2_charger_kw
            + f64::from(self.dcfc) * constants.dcfc_charger_kw
            + f64::from(self.hpc) * constants.hpc_charger_kw
    }
}

/// Equipment sizing for one option. Tiers carry their own scaled copy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SizingResult {
    pub bess_kw: f64,
    pub bess_kwh: f64,
    pub duration_hours: f64,
    pub solar_kw: f64,
    pub ev_chargers: EvChargers,
    pub ev_power_kw: f64,
    pub generator_kw: f64,
    pub generator_reason: GeneratorReason,
    /// Set when peak demand was not positive and every size is zero.
    pub degenerate: bool,
}

impl SizingResult {
    fn degenerate(duration_hours: f64) -> Self {
        Self {
            bess_kw: 0.0,
            bess_kwh: 0.0,
            duration_hours,
            solar_kw: 0.0,
            ev_chargers: EvChargers::default(),
            ev_power_kw: 0.0,
            generator_kw: 0.0,
            generator_reason: GeneratorReason::NotProposed,
            degenerate: true,
        }
    }
}

pub(crate) fn opted_into_solar(input: &CanonicalInput) -> bool {
    input.flag(fields::WANTS_SOLAR).unwrap_or(false)
}

/// `computeSizing(peakDemandKW, IndustryConfig, subtype)`.
pub fn compute_sizing(
    peak_demand_kw: f64,
    industry: &IndustryConfig,
    subtype: &SubtypeConfig,
    input: &CanonicalInput,
    constants: &SizingConstants,
) -> SizingResult {
    let duration_hours = input
        .number(fields::BACKUP_HOURS)
        .filter(|hours| *hours > 0.0)
        .unwrap_or(subtype.backup_hours);

    if !(peak_demand_kw.is_finite() && peak_demand_kw > 0.0) {
        return SizingResult::degenerate(duration_hours);
    }

    let grid = GridConnection::from_answer(input.text(fields::GRID_CONNECTION));
    let critical_load_kw = peak_demand_kw * subtype.critical_load_fraction;

    let mut bess_kw = peak_demand_kw * subtype.storage_multiplier;
    match grid {
        GridConnection::Limited => {
            let capacity_kw = input
                .number(fields::GRID_CAPACITY_MW)
                .filter(|mw| *mw > 0.0)
                .map(|mw| mw * 1_000.0);
            if let Some(capacity_kw) = capacity_kw {
                let shortfall = (peak_demand_kw - capacity_kw).min(peak_demand_kw);
                bess_kw = bess_kw.max(shortfall);
            }
        }
        GridConnection::OffGrid => bess_kw = bess_kw.max(critical_load_kw),
        _ => {}
    }

    let solar_kw = if industry.recommendations.solar && opted_into_solar(input) {
        peak_demand_kw * constants.solar_fraction_of_peak
    } else {
        0.0
    };

    let ev_chargers = EvChargers::from_input(input);

    let auto_generator = industry.recommendations.generator
        && subtype.criticality >= constants.generator_criticality_threshold;
    let (generator_kw, generator_reason) = if auto_generator {
        (
            critical_load_kw * constants.generator_reserve_margin,
            GeneratorReason::Criticality,
        )
    } else if grid.demands_generator() {
        (
            critical_load_kw * constants.generator_reserve_margin,
            GeneratorReason::GridQuality,
        )
    } else if input.flag(fields::WANTS_GENERATOR).unwrap_or(false) {
        (
            bess_kw * constants.opt_in_generator_fraction,
            GeneratorReason::FacilityRequest,
        )
    } else {
        (0.0, GeneratorReason::NotProposed)
    };

    SizingResult {
        bess_kw,
        bess_kwh: bess_kw * duration_hours,
        duration_hours,
        solar_kw,
        ev_power_kw: ev_chargers.power_kw(constants),
        ev_chargers,
        generator_kw,
        generator_reason,
        degenerate: false,
    }
}
