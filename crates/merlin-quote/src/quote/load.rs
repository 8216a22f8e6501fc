use super::domain::CanonicalInput;
use super::registry::{fields, IndustryConfig};
use serde::{Deserialize, Serialize};

const HOURS_PER_YEAR: f64 = 8_760.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LoadProfile {
    pub peak_demand_kw: f64,
    pub annual_consumption_kwh: f64,
    /// Watts per unit or per square foot actually applied; zero when the peak was supplied.
    pub applied_rate_watts: f64,
    pub quantity: f64,
    /// True when the facility's known peak replaced the estimate.
    pub peak_supplied: bool,
}

/// `computePeakDemand`: rate (with premium override) times quantity, or the facility's own
/// known peak when one is supplied.
pub fn compute_peak_demand(input: &CanonicalInput, industry: &IndustryConfig) -> LoadProfile {
    let known_peak_kw = input
        .number(fields::PEAK_LOAD_MW)
        .filter(|mw| *mw > 0.0)
        .map(|mw| mw * 1_000.0);

    let quantity = input
        .number(&industry.quantity_field)
        .filter(|value| *value > 0.0)
        .unwrap_or(0.0);

    let (peak_demand_kw, applied_rate_watts) = match known_peak_kw {
        Some(peak) => (peak, 0.0),
        None => {
            let rate = industry
                .rate_for(&input.subtype, |field| input.text(field))
                .unwrap_or(0.0);
            (rate * quantity / 1_000.0, rate)
        }
    };

    let peak_demand_kw = if peak_demand_kw.is_finite() {
        peak_demand_kw.max(0.0)
    } else {
        0.0
    };

    let hours = input
        .number(fields::OPERATING_HOURS)
        .filter(|hours| (1.0..=24.0).contains(hours))
        .map(|hours| hours * 365.0)
        .unwrap_or(HOURS_PER_YEAR);

    LoadProfile {
        peak_demand_kw,
        annual_consumption_kwh: peak_demand_kw * industry.load_factor * hours,
        applied_rate_watts,
        quantity,
        peak_supplied: known_peak_kw.is_some(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quote::domain::FacilityInput;
    use crate::quote::{IndustryRegistry, MappingRegistry};

    fn profile(slug: &str, input: FacilityInput) -> LoadProfile {
        let registry = IndustryRegistry::builtin();
        let canonical = MappingRegistry::builtin()
            .normalize(&registry, slug, &input)
            .expect("industry registered");
        compute_peak_demand(&canonical, registry.get(slug).expect("industry registered"))
    }

    #[test]
    fn upscale_hotel_peak_uses_room_rate() {
        let load = profile(
            "hotel",
            FacilityInput::new()
                .with("roomCount", 400u32)
                .with("hotelType", "upscale"),
        );

        assert!((load.peak_demand_kw - 2_200.0).abs() < 1e-9);
        assert_eq!(load.applied_rate_watts, 5_500.0);
        assert!((load.annual_consumption_kwh - 2_200.0 * 0.45 * 8_760.0).abs() < 1e-6);
    }

    #[test]
    fn resort_classification_raises_rate() {
        let load = profile(
            "hotel",
            FacilityInput::new()
                .with("roomCount", 100u32)
                .with("hotelType", "luxury")
                .with("propertyClass", "Resort"),
        );

        assert!((load.peak_demand_kw - 850.0).abs() < 1e-9);
    }

    #[test]
    fn known_peak_overrides_estimate() {
        let load = profile(
            "office",
            FacilityInput::new()
                .with("sqft", 100_000.0)
                .with("peakLoad", 1.2),
        );

        assert!(load.peak_supplied);
        assert!((load.peak_demand_kw - 1_200.0).abs() < 1e-9);
    }

    #[test]
    fn operating_hours_shorten_the_year() {
        let load = profile(
            "restaurant",
            FacilityInput::new()
                .with("sqft", 4_000.0)
                .with("operatingHours", 12u32),
        );

        let expected = load.peak_demand_kw * 0.35 * 12.0 * 365.0;
        assert!((load.annual_consumption_kwh - expected).abs() < 1e-6);
    }

    #[test]
    fn missing_quantity_yields_zero_peak() {
        let load = profile("hotel", FacilityInput::new().with("hotelType", "economy"));

        assert_eq!(load.peak_demand_kw, 0.0);
        assert_eq!(load.annual_consumption_kwh, 0.0);
    }
}
