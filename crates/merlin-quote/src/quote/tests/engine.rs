use super::common::*;

use crate::quote::pricing::{ComponentKind, PriceSource, StaticReferencePricing};
use crate::quote::{
    CalculationNotice, EngineSettings, FacilityInput, Fingerprint, GeneratorReason, PowerMethod,
    QuoteConfidence, QuoteError, SubtypeResolution, Tier, ValidationStatus,
};

#[tokio::test]
async fn upscale_hotel_sizes_storage_from_room_rate() {
    let engine = reference_engine();
    let input = engine
        .normalize("hotel", &hotel(400, "upscale"))
        .expect("hotel registered");

    let base = engine.calculate(&input).await.expect("calculates");

    assert_eq!(base.subtype, "upscale");
    assert_close(base.load.peak_demand_kw, 2200.0);
    assert_close(base.sizing.bess_kw, 1100.0);
    assert_close(base.sizing.bess_kwh, 4400.0);
    assert_eq!(base.confidence, QuoteConfidence::Full);
}

#[tokio::test]
async fn midscale_hotel_uses_its_own_multiplier() {
    let engine = reference_engine();
    let input = engine
        .normalize("hotel", &hotel(400, "midscale"))
        .expect("hotel registered");

    let base = engine.calculate(&input).await.expect("calculates");

    assert_close(base.load.peak_demand_kw, 1600.0);
    assert_close(base.sizing.bess_kw, 640.0);
    assert_close(base.sizing.bess_kwh, 2560.0);
}

#[tokio::test]
async fn mapped_subtype_sizes_like_the_explicit_subtype() {
    let engine = reference_engine();
    let mapped = engine
        .normalize("car_wash", &car_wash(4, "flex-serve"))
        .expect("car wash registered");
    let explicit = engine
        .normalize("car_wash", &car_wash(4, "full_service"))
        .expect("car wash registered");

    assert_eq!(mapped.subtype, "full_service");
    assert_eq!(mapped.subtype_resolution, SubtypeResolution::Mapped);
    assert_eq!(explicit.subtype_resolution, SubtypeResolution::Canonical);

    let mapped = engine.calculate(&mapped).await.expect("calculates");
    let explicit = engine.calculate(&explicit).await.expect("calculates");
    assert_eq!(mapped.sizing, explicit.sizing);
    assert_eq!(mapped.financials, explicit.financials);
}

#[tokio::test]
async fn unmapped_subtype_falls_back_to_industry_default() {
    let engine = reference_engine();
    let input = engine
        .normalize("car_wash", &car_wash(4, "waterless pop-up"))
        .expect("car wash registered");

    let base = engine.calculate(&input).await.expect("calculates");

    assert_eq!(base.subtype, "express_tunnel");
    assert!(base.notices.iter().any(|notice| matches!(
        notice,
        CalculationNotice::UnmappedSubtype { raw, fallback }
            if raw == "waterless pop-up" && fallback == "express_tunnel"
    )));
    assert!(base.sizing.bess_kw > 0.0);
}

#[tokio::test]
async fn zero_rooms_yield_flagged_zero_sizing() {
    let engine = reference_engine();
    let input = engine
        .normalize("hotel", &hotel(0, "upscale"))
        .expect("hotel registered");

    let base = engine.calculate(&input).await.expect("degenerate input is not an error");

    assert!(base.sizing.degenerate);
    assert_eq!(base.sizing.bess_kw, 0.0);
    assert_eq!(base.sizing.bess_kwh, 0.0);
    assert_eq!(base.sizing.solar_kw, 0.0);
    assert_eq!(base.sizing.generator_kw, 0.0);
    assert!(base
        .notices
        .iter()
        .any(|notice| matches!(notice, CalculationNotice::DegenerateInput { field, .. } if field == "room_count")));

    let tiers = engine.tiers(&base);
    assert!(tiers.iter().all(|option| option.sizing.bess_kw == 0.0));
}

#[tokio::test]
async fn zero_rooms_are_rejected_at_authentication() {
    let engine = reference_engine();
    let input = engine
        .normalize("hotel", &hotel(0, "upscale"))
        .expect("hotel registered");
    let fingerprint = Fingerprint::of(&input);

    let error = engine
        .quote(&input, &fingerprint)
        .await
        .expect_err("degenerate quote must not authenticate");

    let violations = error.violations().expect("validation failure");
    assert!(violations.iter().any(|violation| violation.field == "room_count"));
    assert!(violations
        .iter()
        .any(|violation| violation.field == "standard.bess_kw"));
}

#[tokio::test]
async fn stalled_battery_pricing_degrades_confidence() {
    let engine = engine_with(StalledOn(ComponentKind::Battery), fast_timeout());
    let input = engine
        .normalize("hotel", &hotel(400, "upscale"))
        .expect("hotel registered");
    let fingerprint = Fingerprint::of(&input);

    let record = engine
        .quote(&input, &fingerprint)
        .await
        .expect("degraded quote still authenticates");

    assert_eq!(record.confidence, QuoteConfidence::Degraded);
    assert_eq!(record.validation_status, ValidationStatus::Authenticated);

    let battery = record
        .pricing
        .iter()
        .find(|entry| entry.component == ComponentKind::Battery)
        .expect("battery priced");
    assert!(battery.fallback);
    assert_eq!(battery.source, PriceSource::StaticReference);
    assert_close(
        battery.price_per_unit,
        StaticReferencePricing::price_per_unit(ComponentKind::Battery),
    );

    let conversion = record
        .pricing
        .iter()
        .find(|entry| entry.component == ComponentKind::PowerConversion)
        .expect("power conversion priced");
    assert!(!conversion.fallback);
    assert_eq!(conversion.source, PriceSource::Vendor);

    assert!(record.notices.iter().any(|notice| matches!(
        notice,
        CalculationNotice::PricingUnavailable { component, .. } if component == "battery"
    )));
}

#[tokio::test]
async fn refused_pricing_falls_back_like_a_timeout() {
    let engine = engine_with(
        UnavailableFor(ComponentKind::PowerConversion),
        EngineSettings::default(),
    );
    let input = engine
        .normalize("hotel", &hotel(400, "upscale"))
        .expect("hotel registered");

    let base = engine.calculate(&input).await.expect("calculates");

    assert_eq!(base.confidence, QuoteConfidence::Degraded);
    assert_close(
        base.prices.price(ComponentKind::PowerConversion),
        StaticReferencePricing::price_per_unit(ComponentKind::PowerConversion),
    );
}

#[tokio::test]
async fn solar_opt_in_follows_industry_recommendation() {
    let engine = reference_engine();
    let data_center = engine
        .normalize(
            "data_center",
            &FacilityInput::new()
                .with("facilitySize", 20_000u32)
                .with("dataCenterType", "enterprise")
                .with("wantsSolar", true),
        )
        .expect("data center registered");

    let base = engine.calculate(&data_center).await.expect("calculates");

    assert_eq!(base.sizing.solar_kw, 0.0);
    assert!(base.notices.contains(&CalculationNotice::SolarNotRecommended {
        industry: "data_center".to_string(),
    }));
    assert_eq!(base.confidence, QuoteConfidence::Full);

    let warehouse = engine
        .normalize(
            "warehouse",
            &FacilityInput::new()
                .with("facilitySize", 200_000u32)
                .with("wantsSolar", true),
        )
        .expect("warehouse registered");
    let base = engine.calculate(&warehouse).await.expect("calculates");

    assert!(base.sizing.solar_kw > 0.0);
    assert!(!base
        .notices
        .iter()
        .any(|notice| matches!(notice, CalculationNotice::SolarNotRecommended { .. })));
}

#[tokio::test]
async fn calculation_is_deterministic() {
    let engine = reference_engine();
    let input = engine
        .normalize(
            "hotel",
            &hotel(250, "luxury")
                .with("propertyClass", "resort")
                .with("wantsSolar", true)
                .with("level2Chargers", 6u32),
        )
        .expect("hotel registered");

    let first = engine.calculate(&input).await.expect("calculates");
    let second = engine.calculate(&input).await.expect("calculates");

    assert_eq!(first, second);
    assert_eq!(engine.tiers(&first), engine.tiers(&second));
}

#[tokio::test]
async fn missing_required_field_is_a_validation_failure() {
    let engine = reference_engine();
    let input = engine
        .normalize("hotel", &FacilityInput::new().with("peakLoad", 1.5))
        .expect("hotel registered");
    let fingerprint = Fingerprint::of(&input);

    let base = engine.calculate(&input).await.expect("calculates from the known peak");
    assert_close(base.load.peak_demand_kw, 1500.0);

    let error = engine
        .quote(&input, &fingerprint)
        .await
        .expect_err("room count is required");

    match error {
        QuoteError::Validation(failure) => {
            assert_eq!(failure.fingerprint, fingerprint.as_str());
            assert_eq!(failure.violations.len(), 1);
            assert_eq!(failure.violations[0].field, "room_count");
            assert_eq!(failure.violations[0].received, "missing");
        }
        other => panic!("expected validation failure, got {other:?}"),
    }
}

#[tokio::test]
async fn unknown_industry_is_fatal() {
    let engine = reference_engine();

    let error = engine
        .normalize("lunar_base", &FacilityInput::new().with("squareFootage", 1000u32))
        .expect_err("no such industry");

    assert_eq!(
        error,
        QuoteError::UnknownIndustry {
            slug: "lunar_base".to_string()
        }
    );
}

#[tokio::test]
async fn tiers_are_monotonic_for_every_industry() {
    let engine = reference_engine();
    let slugs: Vec<(String, String, PowerMethod)> = engine
        .registry()
        .iter()
        .map(|industry| {
            (
                industry.slug.clone(),
                industry.quantity_field.clone(),
                industry.power_method,
            )
        })
        .collect();

    for (slug, quantity_field, method) in slugs {
        let quantity = match method {
            PowerMethod::PerArea => 42_000.0,
            PowerMethod::PerUnit => 37.0,
        };
        let input = engine
            .normalize(&slug, &FacilityInput::new().with(quantity_field, quantity))
            .expect("registered industry");
        let base = engine.calculate(&input).await.expect("calculates");
        let tiers = engine.tiers(&base);

        let starter = tiers.get(Tier::Starter);
        let standard = tiers.get(Tier::Standard);
        let maximum = tiers.get(Tier::Maximum);

        assert!(
            starter.sizing.bess_kw <= standard.sizing.bess_kw
                && standard.sizing.bess_kw <= maximum.sizing.bess_kw,
            "{slug}: storage power out of order"
        );
        assert!(
            starter.sizing.bess_kwh <= standard.sizing.bess_kwh
                && standard.sizing.bess_kwh <= maximum.sizing.bess_kwh,
            "{slug}: storage energy out of order"
        );
        assert!(
            starter.financials.total_investment <= standard.financials.total_investment
                && standard.financials.total_investment <= maximum.financials.total_investment,
            "{slug}: investment out of order"
        );
        assert!(standard.sizing.bess_kw > 0.0, "{slug}: empty standard tier");
    }
}

#[tokio::test]
async fn tiers_reuse_base_prices_and_round_power() {
    let engine = reference_engine();
    let input = engine
        .normalize("hotel", &hotel(400, "upscale"))
        .expect("hotel registered");
    let base = engine.calculate(&input).await.expect("calculates");

    let tiers = engine.tiers(&base);

    assert_close(tiers.standard.sizing.bess_kw, 1100.0);
    assert_close(tiers.starter.sizing.bess_kw, 650.0);
    assert_close(tiers.maximum.sizing.bess_kw, 1550.0);
    assert_close(tiers.maximum.sizing.bess_kwh, 1550.0 * base.sizing.duration_hours);
    assert_eq!(tiers.standard.sizing.ev_chargers, base.sizing.ev_chargers);
    assert_eq!(tiers.standard.sizing.generator_kw, base.sizing.generator_kw);
}

#[tokio::test]
async fn requested_generator_scales_with_tier_storage() {
    let engine = reference_engine();
    let input = engine
        .normalize(
            "office",
            &FacilityInput::new()
                .with("facilitySize", 150_000u32)
                .with("wantsGenerator", "yes"),
        )
        .expect("office registered");
    let base = engine.calculate(&input).await.expect("calculates");
    assert_eq!(base.sizing.generator_reason, GeneratorReason::FacilityRequest);

    let tiers = engine.tiers(&base);
    let share = base.sizing.generator_kw / base.sizing.bess_kw;
    for option in tiers.iter() {
        assert_close(option.sizing.generator_kw, option.sizing.bess_kw * share);
    }
    assert!(tiers.starter.sizing.generator_kw < tiers.maximum.sizing.generator_kw);

    let hospital = engine
        .normalize("hospital", &FacilityInput::new().with("bedCount", 180u32))
        .expect("hospital registered");
    let base = engine.calculate(&hospital).await.expect("calculates");
    assert_eq!(base.sizing.generator_reason, GeneratorReason::Criticality);
    for option in engine.tiers(&base).iter() {
        assert_eq!(option.sizing.generator_kw, base.sizing.generator_kw);
    }
}
