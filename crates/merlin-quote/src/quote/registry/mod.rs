//! Declarative per-industry rules driving the load, sizing and financial calculators.

mod industries;

use super::error::QuoteError;
use super::mapping::normalize_key;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;

/// Canonical field names shared by every industry.
pub mod fields {
    pub const SUBTYPE: &str = "subtype";
    pub const SQUARE_FOOTAGE: &str = "square_footage";
    pub const OPERATING_HOURS: &str = "operating_hours";
    pub const PEAK_LOAD_MW: &str = "peak_load_mw";
    pub const GRID_CONNECTION: &str = "grid_connection";
    pub const GRID_CAPACITY_MW: &str = "grid_capacity_mw";
    pub const BACKUP_HOURS: &str = "backup_hours";
    pub const WANTS_SOLAR: &str = "wants_solar";
    pub const WANTS_GENERATOR: &str = "wants_generator";
    pub const LEVEL2_CHARGERS: &str = "level2_chargers";
    pub const DCFC_CHARGERS: &str = "dcfc_chargers";
    pub const HPC_CHARGERS: &str = "hpc_chargers";
    pub const ELECTRICITY_RATE: &str = "electricity_rate";
    pub const DEMAND_CHARGE: &str = "demand_charge";

    pub const UNIVERSAL: &[&str] = &[
        SUBTYPE,
        SQUARE_FOOTAGE,
        OPERATING_HOURS,
        PEAK_LOAD_MW,
        GRID_CONNECTION,
        GRID_CAPACITY_MW,
        BACKUP_HOURS,
        WANTS_SOLAR,
        WANTS_GENERATOR,
        LEVEL2_CHARGERS,
        DCFC_CHARGERS,
        HPC_CHARGERS,
        ELECTRICITY_RATE,
        DEMAND_CHARGE,
    ];
}

/// Which facility quantity drives the peak-demand estimate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PowerMethod {
    /// Watts per counted unit (rooms, beds, bays, dwellings).
    PerUnit,
    /// Watts per square foot of conditioned area.
    PerArea,
}

/// Reliability tier of a subtype; generator backup is auto-proposed above a threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Criticality {
    Standard,
    Elevated,
    Critical,
    MissionCritical,
}

impl Criticality {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Standard => "Standard",
            Self::Elevated => "Elevated",
            Self::Critical => "Critical",
            Self::MissionCritical => "Mission critical",
        }
    }
}

/// Sizing parameters for one operating subtype of an industry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubtypeConfig {
    pub label: String,
    /// Watts per unit or per square foot, depending on the industry's [`PowerMethod`].
    pub rate_watts: f64,
    /// Share of peak demand covered by storage power, in (0, 1].
    pub storage_multiplier: f64,
    /// Share of peak demand that must stay up during an outage.
    pub critical_load_fraction: f64,
    pub backup_hours: f64,
    pub criticality: Criticality,
}

/// Premium classification within an industry that raises the per-unit rate, keyed by a
/// secondary canonical field (for example a resort property class).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateOverride {
    pub field: String,
    pub value: String,
    /// Restricts the override to a single subtype; `None` applies to every subtype.
    #[serde(default)]
    pub subtype: Option<String>,
    pub rate_watts: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinancialDefaults {
    /// Share of peak demand the battery is expected to shave each month.
    pub peak_shaving_fraction: f64,
    /// Share of the utility energy rate captured per cycled kWh.
    pub arbitrage_spread: f64,
    /// Grid-services revenue in $ per kW-year; zero when the market is not accessible.
    #[serde(default)]
    pub grid_services_per_kw_year: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recommendations {
    pub solar: bool,
    pub generator: bool,
}

/// Scale factors applied to the base calculation for the three options.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TierMultipliers {
    pub starter: f64,
    pub standard: f64,
    pub maximum: f64,
}

impl Default for TierMultipliers {
    fn default() -> Self {
        Self {
            starter: 0.6,
            standard: 1.0,
            maximum: 1.4,
        }
    }
}

/// Everything the calculators need to know about one industry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndustryConfig {
    pub slug: String,
    pub name: String,
    pub power_method: PowerMethod,
    /// Canonical field holding the unit count or the floor area.
    pub quantity_field: String,
    /// Average load over peak load, used to derive annual consumption.
    pub load_factor: f64,
    pub default_subtype: String,
    pub subtypes: BTreeMap<String, SubtypeConfig>,
    #[serde(default)]
    pub rate_overrides: Vec<RateOverride>,
    /// Industry-specific canonical fields in addition to [`fields::UNIVERSAL`].
    #[serde(default)]
    pub fields: Vec<String>,
    /// Canonical fields the facility must answer; defaults are not accepted for these.
    #[serde(default)]
    pub required_fields: Vec<String>,
    pub financial: FinancialDefaults,
    pub recommendations: Recommendations,
    #[serde(default)]
    pub tiers: TierMultipliers,
}

impl IndustryConfig {
    pub fn subtype(&self, key: &str) -> Option<&SubtypeConfig> {
        self.subtypes.get(key)
    }

    pub fn default_subtype_config(&self) -> Option<&SubtypeConfig> {
        self.subtypes.get(&self.default_subtype)
    }

    pub fn is_canonical_field(&self, name: &str) -> bool {
        fields::UNIVERSAL.contains(&name)
            || self.quantity_field == name
            || self.fields.iter().any(|field| field == name)
    }

    pub fn canonical_fields(&self) -> Vec<&str> {
        let mut names: Vec<&str> = fields::UNIVERSAL.to_vec();
        names.push(self.quantity_field.as_str());
        names.extend(self.fields.iter().map(String::as_str));
        names.sort_unstable();
        names.dedup();
        names
    }

    /// Rate for `subtype`, applying the first matching premium classification.
    /// Subtype-specific overrides win over industry-wide ones.
    pub fn rate_for<'a>(
        &self,
        subtype: &str,
        classification: impl Fn(&str) -> Option<&'a str>,
    ) -> Option<f64> {
        let base = self.subtype(subtype)?.rate_watts;
        let matches = |rule: &RateOverride| {
            classification(&rule.field)
                .map(|value| normalize_key(value) == normalize_key(&rule.value))
                .unwrap_or(false)
        };

        let rate = self
            .rate_overrides
            .iter()
            .filter(|rule| rule.subtype.as_deref() == Some(subtype))
            .find(|rule| matches(rule))
            .or_else(|| {
                self.rate_overrides
                    .iter()
                    .filter(|rule| rule.subtype.is_none())
                    .find(|rule| matches(rule))
            })
            .map(|rule| rule.rate_watts)
            .unwrap_or(base);

        Some(rate)
    }

    fn validate(&self) -> Result<(), RegistryError> {
        let invalid = |subtype: Option<&str>, parameter: &str, value: f64| {
            RegistryError::InvalidParameter {
                industry: self.slug.clone(),
                subtype: subtype.map(str::to_string),
                parameter: parameter.to_string(),
                value,
            }
        };

        if self.subtypes.is_empty() || self.subtype(&self.default_subtype).is_none() {
            return Err(RegistryError::MissingDefaultSubtype {
                industry: self.slug.clone(),
                subtype: self.default_subtype.clone(),
            });
        }

        if !(self.load_factor > 0.0 && self.load_factor <= 1.0) {
            return Err(invalid(None, "load_factor", self.load_factor));
        }

        for (key, subtype) in &self.subtypes {
            let key = Some(key.as_str());
            if !subtype.rate_watts.is_finite() || subtype.rate_watts < 0.0 {
                return Err(invalid(key, "rate_watts", subtype.rate_watts));
            }
            if !(subtype.storage_multiplier > 0.0 && subtype.storage_multiplier <= 1.0) {
                return Err(invalid(key, "storage_multiplier", subtype.storage_multiplier));
            }
            if !(0.0..=1.0).contains(&subtype.critical_load_fraction) {
                return Err(invalid(
                    key,
                    "critical_load_fraction",
                    subtype.critical_load_fraction,
                ));
            }
            if !(subtype.backup_hours.is_finite() && subtype.backup_hours > 0.0) {
                return Err(invalid(key, "backup_hours", subtype.backup_hours));
            }
        }

        for rule in &self.rate_overrides {
            if let Some(subtype) = &rule.subtype {
                if self.subtype(subtype).is_none() {
                    return Err(RegistryError::UnknownSubtype {
                        industry: self.slug.clone(),
                        subtype: subtype.clone(),
                    });
                }
            }
            if !self.is_canonical_field(&rule.field) {
                return Err(RegistryError::UnknownField {
                    industry: self.slug.clone(),
                    field: rule.field.clone(),
                });
            }
            if !rule.rate_watts.is_finite() || rule.rate_watts < 0.0 {
                return Err(invalid(rule.subtype.as_deref(), "rate_override", rule.rate_watts));
            }
        }

        if let Some(field) = self
            .required_fields
            .iter()
            .find(|field| !self.is_canonical_field(field))
        {
            return Err(RegistryError::UnknownField {
                industry: self.slug.clone(),
                field: field.clone(),
            });
        }

        let tiers = self.tiers;
        if !(tiers.starter > 0.0 && tiers.starter <= tiers.standard && tiers.standard <= tiers.maximum)
            || !tiers.maximum.is_finite()
        {
            return Err(RegistryError::TierOrder {
                industry: self.slug.clone(),
            });
        }

        Ok(())
    }
}

/// Contract violations in registry data. These are fatal: a registry that fails validation is
/// never used for calculation.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RegistryError {
    #[error("failed to read registry data from {path}: {reason}")]
    Read { path: String, reason: String },
    #[error("invalid registry document: {0}")]
    Parse(String),
    #[error("registry contains no industries")]
    Empty,
    #[error("industry '{slug}' is defined more than once")]
    Duplicate { slug: String },
    #[error("industry '{industry}' default subtype '{subtype}' is not defined")]
    MissingDefaultSubtype { industry: String, subtype: String },
    #[error("industry '{industry}' references undefined subtype '{subtype}'")]
    UnknownSubtype { industry: String, subtype: String },
    #[error("industry '{industry}' references non-canonical field '{field}'")]
    UnknownField { industry: String, field: String },
    #[error("industry '{industry}' has invalid {parameter} = {value} (subtype {subtype:?})")]
    InvalidParameter {
        industry: String,
        subtype: Option<String>,
        parameter: String,
        value: f64,
    },
    #[error("industry '{industry}' tier multipliers must be positive and ordered")]
    TierOrder { industry: String },
}

/// Read-only lookup of industry configurations, shared by every session.
#[derive(Debug, Clone)]
pub struct IndustryRegistry {
    industries: BTreeMap<String, IndustryConfig>,
}

impl IndustryRegistry {
    /// The built-in industry table.
    pub fn builtin() -> Self {
        Self::from_configs(industries::builtin())
            .unwrap_or_else(|err| panic!("built-in industry registry is invalid: {err}"))
    }

    pub fn from_configs(configs: Vec<IndustryConfig>) -> Result<Self, RegistryError> {
        if configs.is_empty() {
            return Err(RegistryError::Empty);
        }

        let mut industries = BTreeMap::new();
        for config in configs {
            config.validate()?;
            if industries.contains_key(&config.slug) {
                return Err(RegistryError::Duplicate { slug: config.slug });
            }
            industries.insert(config.slug.clone(), config);
        }

        Ok(Self { industries })
    }

    /// Load a JSON array of [`IndustryConfig`] documents.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, RegistryError> {
        let configs: Vec<IndustryConfig> =
            serde_json::from_reader(reader).map_err(|err| RegistryError::Parse(err.to_string()))?;
        Self::from_configs(configs)
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, RegistryError> {
        let path = path.as_ref();
        let file = std::fs::File::open(path).map_err(|err| RegistryError::Read {
            path: path.display().to_string(),
            reason: err.to_string(),
        })?;
        Self::from_reader(std::io::BufReader::new(file))
    }

    pub fn get(&self, slug: &str) -> Result<&IndustryConfig, QuoteError> {
        self.industries
            .get(slug)
            .ok_or_else(|| QuoteError::UnknownIndustry {
                slug: slug.to_string(),
            })
    }

    pub fn contains(&self, slug: &str) -> bool {
        self.industries.contains_key(slug)
    }

    pub fn iter(&self) -> impl Iterator<Item = &IndustryConfig> {
        self.industries.values()
    }

    pub fn len(&self) -> usize {
        self.industries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.industries.is_empty()
    }
}
