use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::domain::FacilityInput;
use super::error::QuoteError;
use super::pricing::PricingProvider;
use super::registry::PowerMethod;
use super::session::QuoteSessions;

/// Body of a quote submission: the industry slug and the raw questionnaire answers.
#[derive(Debug, Clone, Deserialize)]
pub struct QuoteRequest {
    pub industry: String,
    #[serde(default)]
    pub facility: FacilityInput,
}

#[derive(Debug, Clone, Serialize)]
pub struct IndustrySummary {
    pub slug: String,
    pub name: String,
    pub power_method: PowerMethod,
    pub default_subtype: String,
    pub subtypes: Vec<String>,
    pub required_fields: Vec<String>,
}

/// Router builder exposing quote sessions and the industry catalogue.
pub fn quote_router<P>(sessions: Arc<QuoteSessions<P>>) -> Router
where
    P: PricingProvider + 'static,
{
    Router::new()
        .route("/api/v1/industries", get(industries_handler::<P>))
        .route(
            "/api/v1/quote-sessions/:session_id/quotes",
            post(submit_handler::<P>),
        )
        .route(
            "/api/v1/quote-sessions/:session_id/quote",
            get(current_handler::<P>),
        )
        .route(
            "/api/v1/quote-sessions/:session_id",
            delete(close_handler::<P>),
        )
        .with_state(sessions)
}

pub(crate) async fn submit_handler<P>(
    State(sessions): State<Arc<QuoteSessions<P>>>,
    Path(session_id): Path<String>,
    axum::Json(request): axum::Json<QuoteRequest>,
) -> Response
where
    P: PricingProvider + 'static,
{
    let session = sessions.session(&session_id);
    match session.submit(&request.industry, &request.facility).await {
        Ok(record) => (StatusCode::OK, axum::Json(record.as_ref())).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn current_handler<P>(
    State(sessions): State<Arc<QuoteSessions<P>>>,
    Path(session_id): Path<String>,
) -> Response
where
    P: PricingProvider + 'static,
{
    let Some(session) = sessions.get(&session_id) else {
        let payload = json!({
            "session_id": session_id,
            "error": "unknown quote session",
        });
        return (StatusCode::NOT_FOUND, axum::Json(payload)).into_response();
    };

    match session.current() {
        Some(record) => (StatusCode::OK, axum::Json(record.as_ref())).into_response(),
        None => {
            let payload = json!({
                "session_id": session_id,
                "phase": session.phase(),
                "error": "no authenticated quote for the latest input",
            });
            (StatusCode::NOT_FOUND, axum::Json(payload)).into_response()
        }
    }
}

pub(crate) async fn close_handler<P>(
    State(sessions): State<Arc<QuoteSessions<P>>>,
    Path(session_id): Path<String>,
) -> Response
where
    P: PricingProvider + 'static,
{
    match sessions.remove(&session_id) {
        Some(_) => StatusCode::NO_CONTENT.into_response(),
        None => {
            let payload = json!({
                "session_id": session_id,
                "error": "unknown quote session",
            });
            (StatusCode::NOT_FOUND, axum::Json(payload)).into_response()
        }
    }
}

pub(crate) async fn industries_handler<P>(State(sessions): State<Arc<QuoteSessions<P>>>) -> Response
where
    P: PricingProvider + 'static,
{
    let summaries: Vec<IndustrySummary> = sessions
        .engine()
        .registry()
        .iter()
        .map(|industry| IndustrySummary {
            slug: industry.slug.clone(),
            name: industry.name.clone(),
            power_method: industry.power_method,
            default_subtype: industry.default_subtype.clone(),
            subtypes: industry.subtypes.keys().cloned().collect(),
            required_fields: industry.required_fields.clone(),
        })
        .collect();

    (StatusCode::OK, axum::Json(summaries)).into_response()
}

fn error_response(error: QuoteError) -> Response {
    let (status, payload) = match &error {
        QuoteError::UnknownIndustry { slug } => (
            StatusCode::NOT_FOUND,
            json!({ "error": error.to_string(), "industry": slug }),
        ),
        QuoteError::Validation(failure) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            json!({
                "error": error.to_string(),
                "fingerprint": failure.fingerprint,
                "violations": failure.violations,
            }),
        ),
        QuoteError::Superseded { fingerprint } => (
            StatusCode::CONFLICT,
            json!({ "error": error.to_string(), "fingerprint": fingerprint }),
        ),
        QuoteError::Registry(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            json!({ "error": error.to_string() }),
        ),
    };
    (status, axum::Json(payload)).into_response()
}
