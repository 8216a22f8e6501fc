use crate::cli::ServeArgs;
use crate::infra::{build_engine, AppState};
use crate::routes::with_quote_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use merlin_quote::config::AppConfig;
use merlin_quote::error::AppError;
use merlin_quote::quote::QuoteSessions;
use merlin_quote::telemetry;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::info;

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let engine = build_engine(&config.quote)?;
    let industries = engine.registry().len();
    let sessions = Arc::new(QuoteSessions::with_limits(engine, config.quote.sessions));

    let app = with_quote_routes(sessions)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        industries,
        session_capacity = config.quote.sessions.capacity,
        "quote engine ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
