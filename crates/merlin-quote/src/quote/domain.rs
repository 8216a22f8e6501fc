use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Scalar answer captured by the questionnaire for a single field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Flag(bool),
    Number(f64),
    Text(String),
}

impl FieldValue {
    /// Numeric view of the value. Text answers such as `"400"` are accepted because the
    /// upstream collector does not type its fields consistently.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            FieldValue::Number(value) if value.is_finite() => Some(*value),
            FieldValue::Number(_) => None,
            FieldValue::Text(text) => text
                .trim()
                .replace(',', "")
                .parse::<f64>()
                .ok()
                .filter(|value| value.is_finite()),
            FieldValue::Flag(_) => None,
        }
    }

    pub fn as_flag(&self) -> Option<bool> {
        match self {
            FieldValue::Flag(flag) => Some(*flag),
            FieldValue::Number(value) => Some(*value != 0.0),
            FieldValue::Text(text) => match text.trim().to_ascii_lowercase().as_str() {
                "true" | "yes" | "y" | "1" | "on" => Some(true),
                "false" | "no" | "n" | "0" | "off" | "" => Some(false),
                _ => None,
            },
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(text) => Some(text.as_str()),
            _ => None,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Flag(flag) => write!(f, "{flag}"),
            FieldValue::Number(value) => write!(f, "{value}"),
            FieldValue::Text(text) => f.write_str(text),
        }
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<u32> for FieldValue {
    fn from(value: u32) -> Self {
        Self::Number(value as f64)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        Self::Flag(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

/// Flat raw answers as produced by the questionnaire, keyed by whatever field name the
/// upstream form happened to use.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FacilityInput {
    fields: BTreeMap<String, FieldValue>,
}

impl FacilityInput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<FieldValue>) {
        self.fields.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &FieldValue)> {
        self.fields.iter()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for FacilityInput
where
    K: Into<String>,
    V: Into<FieldValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut input = FacilityInput::new();
        for (name, value) in iter {
            input.insert(name, value);
        }
        input
    }
}

/// How the canonical subtype was obtained from the raw answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubtypeResolution {
    /// The raw value already was a canonical subtype key.
    Canonical,
    /// The raw value was translated by the industry's subtype table.
    Mapped,
    /// The raw value was unknown; the industry default was substituted.
    FallbackUnmapped,
    /// No subtype answer was supplied; the industry default was substituted.
    FallbackMissing,
}

impl SubtypeResolution {
    pub const fn is_fallback(self) -> bool {
        matches!(self, Self::FallbackUnmapped | Self::FallbackMissing)
    }
}

/// Answers after mapping: field names and the subtype use the registry vocabulary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalInput {
    pub industry: String,
    pub subtype: String,
    pub subtype_resolution: SubtypeResolution,
    pub fields: BTreeMap<String, FieldValue>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub notices: Vec<CalculationNotice>,
}

impl CanonicalInput {
    /// Whether the facility actually answered `field` (as opposed to it being absent).
    pub fn provided(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    pub fn value(&self, field: &str) -> Option<&FieldValue> {
        self.fields.get(field)
    }

    pub fn number(&self, field: &str) -> Option<f64> {
        self.fields.get(field).and_then(FieldValue::as_number)
    }

    pub fn flag(&self, field: &str) -> Option<bool> {
        self.fields.get(field).and_then(FieldValue::as_flag)
    }

    pub fn text(&self, field: &str) -> Option<&str> {
        self.fields.get(field).and_then(FieldValue::as_text)
    }

    /// Non-negative whole count, truncating fractional answers.
    pub fn count(&self, field: &str) -> u32 {
        self.number(field)
            .filter(|value| *value > 0.0)
            .map(|value| value.floor().min(u32::MAX as f64) as u32)
            .unwrap_or(0)
    }
}

/// Recoverable data-quality condition observed while producing a quote.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CalculationNotice {
    UnmappedField {
        field: String,
    },
    UnmappedSubtype {
        raw: String,
        fallback: String,
    },
    MissingSubtype {
        fallback: String,
    },
    DegenerateInput {
        field: String,
        detail: String,
    },
    PricingUnavailable {
        component: String,
        reason: String,
    },
    SolarNotRecommended {
        industry: String,
    },
}

impl CalculationNotice {
    pub fn summary(&self) -> String {
        match self {
            CalculationNotice::UnmappedField { field } => {
                format!("field '{field}' is not part of the industry vocabulary")
            }
            CalculationNotice::UnmappedSubtype { raw, fallback } => {
                format!("subtype '{raw}' is not recognised; using '{fallback}'")
            }
            CalculationNotice::MissingSubtype { fallback } => {
                format!("no subtype supplied; using '{fallback}'")
            }
            CalculationNotice::DegenerateInput { field, detail } => {
                format!("missing data for '{field}': {detail}")
            }
            CalculationNotice::PricingUnavailable { component, reason } => {
                format!("{component} pricing unavailable ({reason}); reference price used")
            }
            CalculationNotice::SolarNotRecommended { industry } => {
                format!("solar is not proposed for {industry} facilities")
            }
        }
    }
}

/// Identifier stamped on authenticated quotes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QuoteId(pub String);

impl QuoteId {
    pub fn generate() -> Self {
        Self(format!("mq-{}", uuid::Uuid::new_v4().simple()))
    }
}

impl fmt::Display for QuoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_answers_parse_as_numbers() {
        assert_eq!(FieldValue::from("1,250").as_number(), Some(1250.0));
        assert_eq!(FieldValue::from(" 400 ").as_number(), Some(400.0));
        assert_eq!(FieldValue::from("many").as_number(), None);
        assert_eq!(FieldValue::Number(f64::NAN).as_number(), None);
    }

    #[test]
    fn flags_accept_questionnaire_spellings() {
        assert_eq!(FieldValue::from("Yes").as_flag(), Some(true));
        assert_eq!(FieldValue::from("no").as_flag(), Some(false));
        assert_eq!(FieldValue::Number(1.0).as_flag(), Some(true));
        assert_eq!(FieldValue::from("maybe").as_flag(), None);
    }

    #[test]
    fn facility_input_deserializes_from_flat_json() {
        let input: FacilityInput = serde_json::from_str(
            r#"{"roomCount": 400, "hotelType": "upscale", "wantsSolar": true}"#,
        )
        .expect("flat object parses");

        assert_eq!(input.len(), 3);
        assert_eq!(input.get("roomCount"), Some(&FieldValue::Number(400.0)));
        assert_eq!(input.get("wantsSolar"), Some(&FieldValue::Flag(true)));
    }

    #[test]
    fn quote_ids_are_unique() {
        assert_ne!(QuoteId::generate(), QuoteId::generate());
    }
}
