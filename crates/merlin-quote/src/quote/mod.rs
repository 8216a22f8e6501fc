//! Quote calculation and mapping engine.
//!
//! Raw questionnaire answers are normalized against the industry registry, sized, priced
//! and rolled up into three ranked options, then authenticated into an immutable
//! [`QuoteRecord`]. [`QuoteSession`] wraps the pipeline behind a per-session fingerprint
//! cache so identical input is calculated at most once.

pub mod domain;
pub mod engine;
pub mod error;
pub mod financial;
pub mod fingerprint;
pub mod load;
pub mod mapping;
pub mod pricing;
pub mod registry;
pub mod router;
pub mod session;
pub mod settings;
pub mod sizing;
pub mod tiers;
pub mod validator;

#[cfg(test)]
mod tests;

pub use domain::{
    CalculationNotice, CanonicalInput, FacilityInput, FieldValue, QuoteId, SubtypeResolution,
};
pub use engine::{BaseCalculation, QuoteConfidence, QuoteEngine};
pub use error::{QuoteError, ValidationFailure, Violation};
pub use financial::{FinancialSummary, LineItem, SavingsBreakdown};
pub use fingerprint::Fingerprint;
pub use load::LoadProfile;
pub use mapping::{
    MappingAudit, MappingAuditError, MappingConfig, MappingDocument, MappingRegistry,
    MappingViolation, MappingViolationKind,
};
pub use pricing::{
    ComponentKind, ComponentPrice, PriceSheetError, PriceSheetPricing, PriceSource,
    PricingError, PricingProvider, StaticReferencePricing, UnitPrice,
};
pub use registry::{
    Criticality, IndustryConfig, IndustryRegistry, PowerMethod, RegistryError, SubtypeConfig,
};
pub use router::{quote_router, IndustrySummary, QuoteRequest};
pub use session::{QuoteSession, QuoteSessions, SessionLimits, SessionPhase};
pub use settings::{EngineSettings, FinancialSettings, SizingConstants, UtilityRates};
pub use sizing::{EvChargers, GeneratorReason, GridConnection, SizingResult};
pub use tiers::{Tier, TierOption, TierSet};
pub use validator::{QuoteRecord, ValidationStatus};
