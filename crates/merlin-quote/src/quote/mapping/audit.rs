//! Offline completeness check of the mapping tables against the registry and, optionally,
//! against raw values observed in questionnaire exports.

use super::{normalize_key, MappingRegistry};
use crate::quote::registry::{fields, IndustryRegistry};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeSet;
use std::io::Read;
use std::path::Path;

#[derive(Debug)]
pub enum MappingAuditError {
    Io(std::io::Error),
    Csv(csv::Error),
    Json(serde_json::Error),
}

impl std::fmt::Display for MappingAuditError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MappingAuditError::Io(err) => write!(f, "failed to read mapping data: {}", err),
            MappingAuditError::Csv(err) => write!(f, "invalid observed-values CSV: {}", err),
            MappingAuditError::Json(err) => write!(f, "invalid mapping document: {}", err),
        }
    }
}

impl std::error::Error for MappingAuditError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            MappingAuditError::Io(err) => Some(err),
            MappingAuditError::Csv(err) => Some(err),
            MappingAuditError::Json(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for MappingAuditError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<csv::Error> for MappingAuditError {
    fn from(err: csv::Error) -> Self {
        Self::Csv(err)
    }
}

impl From<serde_json::Error> for MappingAuditError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MappingViolationKind {
    /// A registry industry has no mapping table.
    MissingIndustryTable,
    /// A mapping table exists for an industry the registry does not know.
    UnknownIndustryTable,
    /// A field alias points at a name outside the industry vocabulary.
    NonCanonicalFieldTarget,
    /// A subtype alias points at a subtype the industry does not define.
    DanglingSubtypeTarget,
    /// The mapping's default subtype is not defined by the industry.
    DanglingDefaultSubtype,
    /// A subtype value seen in real answers resolves to nothing.
    UnmappedObservedSubtype,
    /// A field name seen in real answers resolves to nothing.
    UnmappedObservedField,
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct MappingViolation {
    pub industry: String,
    pub kind: MappingViolationKind,
    pub subject: String,
}

impl std::fmt::Display for MappingViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {:?} '{}'", self.industry, self.kind, self.subject)
    }
}

#[derive(Debug, Deserialize)]
struct ObservedRow {
    industry: String,
    field: String,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    value: Option<String>,
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    Ok(opt.filter(|value| !value.trim().is_empty()))
}

pub struct MappingAudit<'a> {
    registry: &'a IndustryRegistry,
    mappings: &'a MappingRegistry,
}

impl<'a> MappingAudit<'a> {
    pub fn new(registry: &'a IndustryRegistry, mappings: &'a MappingRegistry) -> Self {
        Self { registry, mappings }
    }

    /// Structural check: every mapping target exists and every industry has a table.
    pub fn check_tables(&self) -> Vec<MappingViolation> {
        let mut violations = BTreeSet::new();

        for industry in self.registry.iter() {
            let Some(config) = self.mappings.config(&industry.slug) else {
                violations.insert(violation(
                    &industry.slug,
                    MappingViolationKind::MissingIndustryTable,
                    &industry.slug,
                ));
                continue;
            };

            for (alias, target) in &config.fields {
                if !industry.is_canonical_field(target) {
                    violations.insert(violation(
                        &industry.slug,
                        MappingViolationKind::NonCanonicalFieldTarget,
                        &format!("{alias} -> {target}"),
                    ));
                }
            }

            for (alias, target) in &config.subtypes {
                if industry.subtype(target).is_none() {
                    violations.insert(violation(
                        &industry.slug,
                        MappingViolationKind::DanglingSubtypeTarget,
                        &format!("{alias} -> {target}"),
                    ));
                }
            }

            if industry.subtype(&config.default_subtype).is_none() {
                violations.insert(violation(
                    &industry.slug,
                    MappingViolationKind::DanglingDefaultSubtype,
                    &config.default_subtype,
                ));
            }
        }

        for (alias, target) in &self.mappings.document().universal {
            if !fields::UNIVERSAL.contains(&target.as_str()) {
                violations.insert(violation(
                    "*",
                    MappingViolationKind::NonCanonicalFieldTarget,
                    &format!("{alias} -> {target}"),
                ));
            }
        }

        for slug in self.mappings.document().industries.keys() {
            if !self.registry.contains(slug) {
                violations.insert(violation(
                    slug,
                    MappingViolationKind::UnknownIndustryTable,
                    slug,
                ));
            }
        }

        violations.into_iter().collect()
    }

    /// Check observed `industry,field,value` rows. Rows naming unknown industries are
    /// reported as missing tables; subtype rows must resolve without falling back.
    pub fn check_observed<R: Read>(
        &self,
        reader: R,
    ) -> Result<Vec<MappingViolation>, MappingAuditError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);
        let mut violations = BTreeSet::new();

        for record in csv_reader.deserialize::<ObservedRow>() {
            let row = record?;
            let Ok(industry) = self.registry.get(&row.industry) else {
                violations.insert(violation(
                    &row.industry,
                    MappingViolationKind::MissingIndustryTable,
                    &row.industry,
                ));
                continue;
            };

            let (field, resolution) = self.mappings.resolve_field(industry, &row.field);
            if resolution == super::FieldResolution::PassThrough {
                violations.insert(violation(
                    &industry.slug,
                    MappingViolationKind::UnmappedObservedField,
                    &row.field,
                ));
                continue;
            }

            if field == fields::SUBTYPE {
                if let Some(value) = row.value {
                    let (_, resolution) = self
                        .mappings
                        .resolve_subtype(industry, Some(value.as_str().into()));
                    if resolution.is_fallback() {
                        violations.insert(violation(
                            &industry.slug,
                            MappingViolationKind::UnmappedObservedSubtype,
                            &normalize_key(&value),
                        ));
                    }
                }
            }
        }

        Ok(violations.into_iter().collect())
    }

    pub fn check_observed_path<P: AsRef<Path>>(
        &self,
        path: P,
    ) -> Result<Vec<MappingViolation>, MappingAuditError> {
        let file = std::fs::File::open(path)?;
        self.check_observed(file)
    }
}

fn violation(industry: &str, kind: MappingViolationKind, subject: &str) -> MappingViolation {
    MappingViolation {
        industry: industry.to_string(),
        kind,
        subject: subject.to_string(),
    }
}
