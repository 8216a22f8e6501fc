use crate::quote::{EngineSettings, SessionLimits};
use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub quote: QuoteConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
        let format = LogFormat::from_str(
            &env::var("APP_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string()),
        );

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level, format },
            quote: QuoteConfig::from_env()?,
        })
    }
}

/// Settings controlling the HTTP server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }

        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|source| ConfigError::InvalidHost { source })?;

        Ok(SocketAddr::new(ip, self.port))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Compact,
    Json,
}

impl LogFormat {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "json" => Self::Json,
            _ => Self::Compact,
        }
    }
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
    pub format: LogFormat,
}

/// Engine tuning plus optional data sources replacing the built-in tables.
#[derive(Debug, Clone, Default)]
pub struct QuoteConfig {
    pub engine: EngineSettings,
    pub sessions: SessionLimits,
    pub registry_path: Option<PathBuf>,
    pub mappings_path: Option<PathBuf>,
    pub price_sheet_path: Option<PathBuf>,
}

impl QuoteConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let mut engine = EngineSettings::default();

        if let Some(rate) = number("QUOTE_INCENTIVE_RATE")? {
            engine.financial.incentive_rate = rate;
        }
        if let Some(rate) = number("QUOTE_ELECTRICITY_RATE")? {
            engine.utility.electricity_rate = rate;
        }
        if let Some(charge) = number("QUOTE_DEMAND_CHARGE")? {
            engine.utility.demand_charge = charge;
        }
        if let Some(timeout) = integer("QUOTE_PRICING_TIMEOUT_MS")? {
            engine.pricing_timeout_ms = timeout;
        }

        let mut sessions = SessionLimits::default();
        if let Some(capacity) = integer("QUOTE_SESSION_CAPACITY")? {
            sessions.capacity = usize::try_from(capacity).unwrap_or(usize::MAX).max(1);
        }
        if let Some(secs) = integer("QUOTE_SESSION_IDLE_SECS")? {
            sessions.idle_timeout = Duration::from_secs(secs);
        }

        Ok(Self {
            engine,
            sessions,
            registry_path: path("QUOTE_REGISTRY_PATH"),
            mappings_path: path("QUOTE_MAPPINGS_PATH"),
            price_sheet_path: path("QUOTE_PRICE_SHEET"),
        })
    }
}

fn number(key: &'static str) -> Result<Option<f64>, ConfigError> {
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|value| value.is_finite() && *value >= 0.0)
            .map(Some)
            .ok_or(ConfigError::InvalidNumber { key }),
        Err(_) => Ok(None),
    }
}

fn integer(key: &'static str) -> Result<Option<u64>, ConfigError> {
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<u64>()
            .map(Some)
            .map_err(|_| ConfigError::InvalidNumber { key }),
        Err(_) => Ok(None),
    }
}

fn path(key: &str) -> Option<PathBuf> {
    env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidNumber { key: &'static str },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidNumber { key } => {
                write!(f, "{key} must be a non-negative number")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidPort | ConfigError::InvalidNumber { .. } => None,
            ConfigError::InvalidHost { source } => Some(source),
        }
    }
}
