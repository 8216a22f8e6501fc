//! Energy-storage quote engine: industry registry, input mapping, load/sizing/financial
//! calculators, tier generation, quote authentication and the per-session fingerprint cache.

pub mod config;
pub mod error;
pub mod quote;
pub mod telemetry;

pub use quote::{
    CalculationNotice, FacilityInput, FieldValue, Fingerprint, IndustryRegistry, MappingRegistry,
    QuoteEngine, QuoteError, QuoteRecord, QuoteSession, QuoteSessions, Tier,
};
