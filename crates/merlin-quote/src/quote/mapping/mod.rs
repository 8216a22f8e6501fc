//! Reconciles the questionnaire's inconsistent field names and subtype strings with the
//! registry vocabulary. Misses never fail: unknown fields pass through and unknown subtypes
//! fall back to the industry default, each recorded as a [`CalculationNotice`].

pub mod audit;
mod normalizer;
mod tables;

pub use audit::{MappingAudit, MappingAuditError, MappingViolation, MappingViolationKind};
pub use normalizer::normalize_key;

use super::domain::{CalculationNotice, CanonicalInput, FacilityInput, FieldValue, SubtypeResolution};
use super::error::QuoteError;
use super::registry::{fields, IndustryConfig, IndustryRegistry};
use serde::{Deserialize, Serialize};
use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;
use tracing::{debug, warn};

/// Per-industry translation tables. Keys are raw questionnaire spellings; values are
/// canonical names. Many raw spellings may point at one canonical name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MappingConfig {
    #[serde(default)]
    pub fields: BTreeMap<String, String>,
    #[serde(default)]
    pub subtypes: BTreeMap<String, String>,
    pub default_subtype: String,
}

/// Serialized form of a [`MappingRegistry`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MappingDocument {
    #[serde(default)]
    pub universal: BTreeMap<String, String>,
    pub industries: BTreeMap<String, MappingConfig>,
}

#[derive(Debug, Clone, Default)]
struct LookupIndex {
    fields: BTreeMap<String, String>,
    subtypes: BTreeMap<String, String>,
}

impl LookupIndex {
    fn from_config(config: &MappingConfig) -> Self {
        Self {
            fields: normalized(&config.fields),
            subtypes: normalized(&config.subtypes),
        }
    }
}

fn normalized(table: &BTreeMap<String, String>) -> BTreeMap<String, String> {
    table
        .iter()
        .map(|(raw, canonical)| (normalize_key(raw), canonical.clone()))
        .collect()
}

/// How a raw field name was resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FieldResolution {
    Canonical,
    Alias,
    PassThrough,
}

/// Read-only mapping tables shared by every session.
#[derive(Debug, Clone)]
pub struct MappingRegistry {
    document: MappingDocument,
    universal_index: BTreeMap<String, String>,
    indexes: BTreeMap<String, LookupIndex>,
}

impl MappingRegistry {
    pub fn builtin() -> Self {
        Self::from_document(MappingDocument {
            universal: tables::universal_fields(),
            industries: tables::industry_mappings(),
        })
    }

    pub fn from_document(document: MappingDocument) -> Self {
        let universal_index = normalized(&document.universal);
        let indexes = document
            .industries
            .iter()
            .map(|(slug, config)| (slug.clone(), LookupIndex::from_config(config)))
            .collect();

        Self {
            document,
            universal_index,
            indexes,
        }
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, serde_json::Error> {
        let document: MappingDocument = serde_json::from_reader(reader)?;
        Ok(Self::from_document(document))
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, MappingAuditError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(std::io::BufReader::new(file)).map_err(MappingAuditError::from)
    }

    pub fn document(&self) -> &MappingDocument {
        &self.document
    }

    pub fn config(&self, slug: &str) -> Option<&MappingConfig> {
        self.document.industries.get(slug)
    }

    /// `normalize(industrySlug, FacilityInput) -> CanonicalInput`. Fails only when the
    /// industry is unknown.
    pub fn normalize(
        &self,
        registry: &IndustryRegistry,
        slug: &str,
        input: &FacilityInput,
    ) -> Result<CanonicalInput, QuoteError> {
        let industry = registry.get(slug)?;
        Ok(self.normalize_for(industry, input))
    }

    pub(crate) fn normalize_for(
        &self,
        industry: &IndustryConfig,
        input: &FacilityInput,
    ) -> CanonicalInput {
        let mut canonical: BTreeMap<String, (FieldValue, FieldResolution)> = BTreeMap::new();
        let mut subtype_answer: Option<(FieldValue, FieldResolution)> = None;
        let mut notices = Vec::new();

        for (raw_name, value) in input.iter() {
            let (name, resolution) = self.resolve_field(industry, raw_name);

            if resolution == FieldResolution::PassThrough {
                warn!(industry = %industry.slug, field = %raw_name, "unmapped facility field passed through");
                notices.push(CalculationNotice::UnmappedField {
                    field: raw_name.clone(),
                });
            }

            if name == fields::SUBTYPE {
                let replace = match &subtype_answer {
                    None => true,
                    Some((_, existing)) => {
                        *existing != FieldResolution::Canonical
                            && resolution == FieldResolution::Canonical
                    }
                };
                if replace {
                    subtype_answer = Some((value.clone(), resolution));
                }
                continue;
            }

            match canonical.entry(name) {
                Entry::Vacant(slot) => {
                    slot.insert((value.clone(), resolution));
                }
                Entry::Occupied(mut slot) => {
                    if slot.get().1 != FieldResolution::Canonical
                        && resolution == FieldResolution::Canonical
                    {
                        slot.insert((value.clone(), resolution));
                    } else {
                        debug!(
                            industry = %industry.slug,
                            field = %slot.key(),
                            ignored = %raw_name,
                            "duplicate answer for canonical field ignored"
                        );
                    }
                }
            }
        }

        let raw_subtype = subtype_answer.map(|(value, _)| value);
        let (subtype, subtype_resolution) = self.resolve_subtype(industry, raw_subtype.clone());

        match (subtype_resolution, raw_subtype) {
            (SubtypeResolution::FallbackMissing, _) => {
                notices.push(CalculationNotice::MissingSubtype {
                    fallback: subtype.clone(),
                });
            }
            (SubtypeResolution::FallbackUnmapped, Some(raw)) => {
                let raw = raw.to_string();
                warn!(industry = %industry.slug, %raw, fallback = %subtype, "unmapped subtype replaced by default");
                notices.push(CalculationNotice::UnmappedSubtype {
                    raw,
                    fallback: subtype.clone(),
                });
            }
            _ => {}
        }

        CanonicalInput {
            industry: industry.slug.clone(),
            subtype,
            subtype_resolution,
            fields: canonical
                .into_iter()
                .map(|(name, (value, _))| (name, value))
                .collect(),
            notices,
        }
    }

    pub(crate) fn resolve_field(
        &self,
        industry: &IndustryConfig,
        raw_name: &str,
    ) -> (String, FieldResolution) {
        if industry.is_canonical_field(raw_name) {
            return (raw_name.to_string(), FieldResolution::Canonical);
        }

        let key = normalize_key(raw_name);
        let alias = self
            .indexes
            .get(&industry.slug)
            .and_then(|index| index.fields.get(&key))
            .or_else(|| self.universal_index.get(&key));
        if let Some(canonical) = alias {
            return (canonical.clone(), FieldResolution::Alias);
        }

        if let Some(canonical) = industry
            .canonical_fields()
            .into_iter()
            .find(|field| normalize_key(field) == key)
        {
            return (canonical.to_string(), FieldResolution::Alias);
        }

        (raw_name.to_string(), FieldResolution::PassThrough)
    }

    /// Resolve a raw subtype answer, falling back to the mapping's default subtype (or the
    /// registry's when the mapping default is not a defined subtype).
    pub(crate) fn resolve_subtype(
        &self,
        industry: &IndustryConfig,
        answer: Option<FieldValue>,
    ) -> (String, SubtypeResolution) {
        let fallback = self
            .config(&industry.slug)
            .map(|config| config.default_subtype.as_str())
            .filter(|key| industry.subtype(key).is_some())
            .unwrap_or(industry.default_subtype.as_str())
            .to_string();

        let Some(answer) = answer else {
            return (fallback, SubtypeResolution::FallbackMissing);
        };

        let key = normalize_key(&answer.to_string());
        if let Some(canonical) = industry
            .subtypes
            .keys()
            .find(|subtype| normalize_key(subtype) == key)
        {
            return (canonical.clone(), SubtypeResolution::Canonical);
        }

        let mapped = self
            .indexes
            .get(&industry.slug)
            .and_then(|index| index.subtypes.get(&key));
        match mapped {
            Some(canonical) if industry.subtype(canonical).is_some() => {
                (canonical.clone(), SubtypeResolution::Mapped)
            }
            Some(dangling) => {
                warn!(industry = %industry.slug, target = %dangling, "subtype mapping targets an undefined subtype");
                (fallback, SubtypeResolution::FallbackUnmapped)
            }
            None => (fallback, SubtypeResolution::FallbackUnmapped),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn normalize(slug: &str, input: FacilityInput) -> CanonicalInput {
        MappingRegistry::builtin()
            .normalize(&IndustryRegistry::builtin(), slug, &input)
            .expect("industry is registered")
    }

    #[test]
    fn aliases_map_to_canonical_field_names() {
        let canonical = normalize(
            "hotel",
            FacilityInput::new()
                .with("numberOfRooms", 400u32)
                .with("hotelClass", "Upscale")
                .with("facilitySize", 250_000.0)
                .with("gridConnection", "unreliable"),
        );

        assert_eq!(canonical.number("room_count"), Some(400.0));
        assert_eq!(canonical.number("square_footage"), Some(250_000.0));
        assert_eq!(canonical.text("grid_connection"), Some("unreliable"));
        assert_eq!(canonical.subtype, "upscale");
        assert_eq!(canonical.subtype_resolution, SubtypeResolution::Canonical);
        assert!(canonical.notices.is_empty());
    }

    #[test]
    fn unknown_fields_pass_through_with_notice() {
        let canonical = normalize(
            "hotel",
            FacilityInput::new()
                .with("roomCount", 120u32)
                .with("favouriteColour", "teal"),
        );

        assert_eq!(canonical.text("favouriteColour"), Some("teal"));
        assert!(canonical.notices.contains(&CalculationNotice::UnmappedField {
            field: "favouriteColour".to_string()
        }));
    }

    #[test]
    fn mapped_subtype_values_translate() {
        let canonical = normalize(
            "car_wash",
            FacilityInput::new()
                .with("bayCount", 4u32)
                .with("washType", "flex-serve"),
        );

        assert_eq!(canonical.subtype, "full_service");
        assert_eq!(canonical.subtype_resolution, SubtypeResolution::Mapped);
    }

    #[test]
    fn unmapped_subtype_falls_back_to_default() {
        let canonical = normalize(
            "car_wash",
            FacilityInput::new()
                .with("bayCount", 4u32)
                .with("washType", "hand-polish-deluxe"),
        );

        assert_eq!(canonical.subtype, "express_tunnel");
        assert_eq!(
            canonical.subtype_resolution,
            SubtypeResolution::FallbackUnmapped
        );
        assert!(canonical
            .notices
            .iter()
            .any(|notice| matches!(notice, CalculationNotice::UnmappedSubtype { raw, .. } if raw == "hand-polish-deluxe")));
    }

    #[test]
    fn missing_subtype_uses_default_and_records_notice() {
        let canonical = normalize("office", FacilityInput::new().with("sqft", 40_000.0));

        assert_eq!(canonical.subtype, "class_b");
        assert_eq!(
            canonical.subtype_resolution,
            SubtypeResolution::FallbackMissing
        );
    }

    #[test]
    fn canonical_spelling_wins_over_alias() {
        let canonical = normalize(
            "hotel",
            FacilityInput::new()
                .with("numRooms", 90u32)
                .with("room_count", 110u32),
        );

        assert_eq!(canonical.number("room_count"), Some(110.0));
    }

    #[test]
    fn separator_variants_of_canonical_names_resolve() {
        let canonical = normalize(
            "hospital",
            FacilityInput::new().with("Bed Count", 250u32).with("hospitalType", "Regional"),
        );

        assert_eq!(canonical.number("bed_count"), Some(250.0));
        assert_eq!(canonical.subtype, "regional_medical_center");
    }

    #[test]
    fn unknown_industry_is_the_only_failure() {
        let result = MappingRegistry::builtin().normalize(
            &IndustryRegistry::builtin(),
            "lunar_base",
            &FacilityInput::new(),
        );

        assert!(matches!(result, Err(QuoteError::UnknownIndustry { .. })));
    }

    #[test]
    fn mapping_documents_load_from_json() {
        let json = r#"{
            "universal": {"facilitySize": "square_footage"},
            "industries": {
                "warehouse": {
                    "fields": {"whType": "subtype"},
                    "subtypes": {"ecom": "fulfillment"},
                    "default_subtype": "dry_storage"
                }
            }
        }"#;
        let mappings = MappingRegistry::from_reader(json.as_bytes()).expect("document parses");
        let canonical = mappings
            .normalize(
                &IndustryRegistry::builtin(),
                "warehouse",
                &FacilityInput::new().with("whType", "ECOM").with("facilitySize", 90_000.0),
            )
            .expect("warehouse registered");

        assert_eq!(canonical.subtype, "fulfillment");
        assert_eq!(canonical.number("square_footage"), Some(90_000.0));
    }
}
