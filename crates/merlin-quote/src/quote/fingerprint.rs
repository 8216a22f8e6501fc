use super::domain::{CanonicalInput, FieldValue};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// Stable hash over the industry, the subtype and every canonical field.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fingerprint(String);

impl Fingerprint {
    pub fn of(input: &CanonicalInput) -> Self {
        let mut hasher = Sha256::new();
        write_str(&mut hasher, &input.industry);
        write_str(&mut hasher, &input.subtype);

        // BTreeMap iteration is ordered, so the digest is independent of answer order.
        for (name, value) in &input.fields {
            write_str(&mut hasher, name);
            match value {
                FieldValue::Flag(flag) => {
                    hasher.update([b'b', u8::from(*flag)]);
                }
                FieldValue::Number(number) => {
                    let normalized = if *number == 0.0 { 0.0 } else { *number };
                    hasher.update([b'n']);
                    hasher.update(normalized.to_bits().to_be_bytes());
                }
                FieldValue::Text(text) => {
                    hasher.update([b't']);
                    write_str(&mut hasher, text);
                }
            }
        }

        let digest = hasher.finalize();
        Self(digest.iter().map(|byte| format!("{byte:02x}")).collect())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn short(&self) -> &str {
        &self.0[..12.min(self.0.len())]
    }
}

fn write_str(hasher: &mut Sha256, value: &str) {
    hasher.update((value.len() as u64).to_be_bytes());
    hasher.update(value.as_bytes());
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
