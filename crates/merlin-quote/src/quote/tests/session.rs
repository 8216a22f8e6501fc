use super::common::*;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use crate::quote::pricing::StaticReferencePricing;
use crate::quote::{QuoteError, QuoteSessions, SessionLimits, SessionPhase};

#[tokio::test]
async fn identical_input_is_served_from_cache() {
    let (pricing, calls) = SlowPricing::new(1);
    let session = session_with(pricing);

    let first = session
        .submit("hotel", &hotel(400, "upscale"))
        .await
        .expect("first quote");
    let lookups = calls.load(Ordering::SeqCst);
    let second = session
        .submit("hotel", &hotel(400, "upscale"))
        .await
        .expect("cached quote");

    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(session.calculations(), 1);
    assert_eq!(calls.load(Ordering::SeqCst), lookups);
    assert_eq!(session.phase(), SessionPhase::Idle);
}

#[tokio::test]
async fn alias_spelling_does_not_change_the_cache_key() {
    let session = session_with(StaticReferencePricing);

    let first = session
        .submit("hotel", &hotel(400, "upscale"))
        .await
        .expect("first quote");
    let second = session
        .submit(
            "hotel",
            &crate::quote::FacilityInput::new()
                .with("hotelClass", "upscale")
                .with("roomCount", 400u32),
        )
        .await
        .expect("cached quote");

    assert_eq!(first.quote_id, second.quote_id);
    assert_eq!(session.calculations(), 1);
}

#[tokio::test]
async fn concurrent_duplicate_joins_the_in_flight_calculation() {
    let (pricing, calls) = SlowPricing::new(30);
    let session = session_with(pricing);
    let input = hotel(400, "upscale");

    let (first, second) = tokio::join!(
        session.submit("hotel", &input),
        session.submit("hotel", &input)
    );

    let first = first.expect("first caller");
    let second = second.expect("joined caller");
    assert_eq!(first.quote_id, second.quote_id);
    assert_eq!(session.calculations(), 1);
    // Battery and power conversion are the only priced components for this facility.
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn newer_input_supersedes_the_in_flight_calculation() {
    let (pricing, _calls) = SlowPricing::new(40);
    let session = session_with(pricing);
    let older = hotel(400, "upscale");
    let newer = hotel(420, "upscale");

    let (stale, fresh) = tokio::join!(session.submit("hotel", &older), async {
        tokio::time::sleep(Duration::from_millis(10)).await;
        session.submit("hotel", &newer).await
    });

    assert!(matches!(stale, Err(QuoteError::Superseded { .. })));
    let fresh = fresh.expect("latest input wins");
    assert_close(fresh.base.load.peak_demand_kw, 420.0 * 5.5);

    let current = session.current().expect("latest committed");
    assert_eq!(current.quote_id, fresh.quote_id);
    assert_eq!(session.calculations(), 2);
}

#[tokio::test]
async fn returning_input_joins_its_original_calculation() {
    let (pricing, _calls) = SlowPricing::new(40);
    let session = session_with(pricing);
    let original = hotel(400, "upscale");
    let detour = hotel(420, "upscale");

    let (first, second, third) = tokio::join!(
        session.submit("hotel", &original),
        async {
            tokio::time::sleep(Duration::from_millis(5)).await;
            session.submit("hotel", &detour).await
        },
        async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            session.submit("hotel", &original).await
        }
    );

    let first = first.expect("original input is latest again");
    let third = third.expect("joined the original calculation");
    assert!(matches!(second, Err(QuoteError::Superseded { .. })));
    assert_eq!(first.quote_id, third.quote_id);
    assert_eq!(session.calculations(), 2);

    let current = session.current().expect("original committed");
    assert_eq!(current.quote_id, first.quote_id);

    let cached = session
        .submit("hotel", &original)
        .await
        .expect("served from cache");
    assert_eq!(cached.quote_id, first.quote_id);
    assert_eq!(session.calculations(), 2);
}

#[tokio::test]
async fn rejected_input_evicts_the_committed_quote() {
    let session = session_with(StaticReferencePricing);

    session
        .submit("hotel", &hotel(400, "upscale"))
        .await
        .expect("valid quote");
    assert!(session.current().is_some());

    let error = session
        .submit("hotel", &hotel(0, "upscale"))
        .await
        .expect_err("zero rooms rejected");

    assert!(error.violations().is_some());
    assert_eq!(session.phase(), SessionPhase::Rejected);
    assert!(session.current().is_none());

    let recovered = session
        .submit("hotel", &hotel(400, "upscale"))
        .await
        .expect("valid quote again");
    assert_eq!(session.phase(), SessionPhase::Idle);
    assert_eq!(
        session.current().map(|record| record.quote_id.clone()),
        Some(recovered.quote_id.clone())
    );
    assert_eq!(session.calculations(), 3);
}

#[tokio::test]
async fn returning_to_earlier_input_does_not_serve_a_stale_record() {
    let session = session_with(StaticReferencePricing);

    let first = session
        .submit("hotel", &hotel(400, "upscale"))
        .await
        .expect("first quote");
    session
        .submit("hotel", &hotel(400, "midscale"))
        .await
        .expect("second quote");
    let third = session
        .submit("hotel", &hotel(400, "upscale"))
        .await
        .expect("recalculated quote");

    assert_ne!(first.quote_id, third.quote_id);
    assert_eq!(first.fingerprint, third.fingerprint);
    assert_eq!(session.calculations(), 3);
}

#[tokio::test]
async fn sessions_are_isolated() {
    let sessions = QuoteSessions::new(reference_engine());

    let alpha = sessions.session("alpha");
    let beta = sessions.session("beta");
    alpha
        .submit("hotel", &hotel(400, "upscale"))
        .await
        .expect("alpha quote");

    assert!(alpha.current().is_some());
    assert!(beta.current().is_none());
    assert_eq!(beta.calculations(), 0);
    assert_eq!(sessions.len(), 2);
    assert!(Arc::ptr_eq(&alpha, &sessions.session("alpha")));
    assert!(sessions.get("gamma").is_none());
}

#[tokio::test]
async fn unknown_industry_leaves_session_untouched() {
    let session = session_with(StaticReferencePricing);

    let error = session
        .submit("lunar_base", &hotel(10, "upscale"))
        .await
        .expect_err("no such industry");

    assert!(matches!(error, QuoteError::UnknownIndustry { .. }));
    assert_eq!(session.phase(), SessionPhase::Idle);
    assert_eq!(session.calculations(), 0);
}

#[tokio::test]
async fn session_store_evicts_least_recently_used() {
    let sessions = QuoteSessions::with_limits(
        reference_engine(),
        SessionLimits {
            capacity: 2,
            ..SessionLimits::default()
        },
    );

    let alpha = sessions.session("alpha");
    sessions.session("beta");
    tokio::time::sleep(Duration::from_millis(2)).await;
    assert!(sessions.get("alpha").is_some_and(|found| Arc::ptr_eq(&found, &alpha)));
    tokio::time::sleep(Duration::from_millis(2)).await;
    sessions.session("gamma");

    assert_eq!(sessions.len(), 2);
    assert!(sessions.get("alpha").is_some());
    assert!(sessions.get("beta").is_none());
    assert!(sessions.get("gamma").is_some());
}

#[tokio::test]
async fn idle_sessions_expire() {
    let sessions = QuoteSessions::with_limits(
        reference_engine(),
        SessionLimits {
            idle_timeout: Duration::from_millis(20),
            ..SessionLimits::default()
        },
    );

    sessions
        .session("lobby")
        .submit("hotel", &hotel(400, "upscale"))
        .await
        .expect("quote");
    assert!(sessions.get("lobby").is_some());

    tokio::time::sleep(Duration::from_millis(40)).await;
    assert!(sessions.get("lobby").is_none());
    assert!(sessions.is_empty());
}

#[tokio::test]
async fn removed_session_starts_fresh() {
    let sessions = QuoteSessions::new(reference_engine());
    let original = sessions.session("lobby");
    original
        .submit("hotel", &hotel(400, "upscale"))
        .await
        .expect("quote");

    let removed = sessions.remove("lobby").expect("session existed");
    assert!(Arc::ptr_eq(&removed, &original));
    assert!(sessions.remove("lobby").is_none());

    let reopened = sessions.session("lobby");
    assert!(!Arc::ptr_eq(&reopened, &original));
    assert!(reopened.current().is_none());
}
