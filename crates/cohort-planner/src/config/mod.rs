use crate::planner::gaps::{DEFAULT_GAP_WINDOW, MAX_GAP_WINDOW};
use crate::planner::occupancy::{year_span, MAX_YEAR_SPAN};
use crate::planner::roster::{SortKey, YearFilter};
use crate::planner::schema::{CohortSchema, SchemaError};
use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;

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
    pub planner: PlannerConfig,
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

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            planner: PlannerConfig::from_env()?,
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

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Planning inputs that stay fixed for a run: the program's cohorts, the year
/// window to chart, the capacity ceiling and the default roster presentation.
#[derive(Debug, Clone, PartialEq)]
pub struct PlannerConfig {
    pub schema: CohortSchema,
    pub start_year: i32,
    pub end_year: i32,
    pub capacity: u32,
    pub sort_by: SortKey,
    pub filter_year: YearFilter,
    pub gap_window: u32,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            schema: CohortSchema::uk_sections(),
            start_year: 2020,
            end_year: 2050,
            capacity: 10,
            sort_by: SortKey::EntryDate,
            filter_year: YearFilter::All,
            gap_window: DEFAULT_GAP_WINDOW,
        }
    }
}

impl PlannerConfig {
    /// Reads `PLANNER_*` variables, falling back to the defaults for any that
    /// are unset.
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let schema = match env::var("PLANNER_COHORTS") {
            Ok(raw) => CohortSchema::parse(&raw).map_err(ConfigError::Schema)?,
            Err(_) => defaults.schema,
        };

        let config = Self {
            schema,
            start_year: read_var("PLANNER_START_YEAR", defaults.start_year)?,
            end_year: read_var("PLANNER_END_YEAR", defaults.end_year)?,
            capacity: read_var("PLANNER_CAPACITY", defaults.capacity)?,
            sort_by: read_var("PLANNER_SORT_BY", defaults.sort_by)?,
            filter_year: read_var("PLANNER_FILTER_YEAR", defaults.filter_year)?,
            gap_window: read_var("PLANNER_GAP_WINDOW", defaults.gap_window)?,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.start_year > self.end_year {
            return Err(ConfigError::InvertedYearRange {
                start: self.start_year,
                end: self.end_year,
            });
        }
        if year_span(self.start_year, self.end_year) > u64::from(MAX_YEAR_SPAN) {
            return Err(ConfigError::YearSpanTooLarge {
                start: self.start_year,
                end: self.end_year,
            });
        }
        if self.gap_window > MAX_GAP_WINDOW {
            return Err(ConfigError::GapWindowTooLarge(self.gap_window));
        }
        Ok(())
    }
}

fn read_var<T: FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(raw) => raw.trim().parse::<T>().map_err(|_| ConfigError::InvalidValue {
            name,
            value: raw,
        }),
        Err(_) => Ok(default),
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidValue { name: &'static str, value: String },
    InvertedYearRange { start: i32, end: i32 },
    YearSpanTooLarge { start: i32, end: i32 },
    GapWindowTooLarge(u32),
    Schema(SchemaError),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidValue { name, value } => {
                write!(f, "{name} has an invalid value '{value}'")
            }
            ConfigError::InvertedYearRange { start, end } => write!(
                f,
                "PLANNER_START_YEAR ({start}) must not be after PLANNER_END_YEAR ({end})"
            ),
            ConfigError::YearSpanTooLarge { start, end } => write!(
                f,
                "PLANNER_START_YEAR ({start}) to PLANNER_END_YEAR ({end}) spans more than {MAX_YEAR_SPAN} years"
            ),
            ConfigError::GapWindowTooLarge(window) => write!(
                f,
                "PLANNER_GAP_WINDOW ({window}) must not exceed {MAX_GAP_WINDOW}"
            ),
            ConfigError::Schema(err) => write!(f, "PLANNER_COHORTS is invalid: {err}"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::Schema(err) => Some(err),
            ConfigError::InvalidPort
            | ConfigError::InvalidValue { .. }
            | ConfigError::InvertedYearRange { .. }
            | ConfigError::YearSpanTooLarge { .. }
            | ConfigError::GapWindowTooLarge(_) => None,
        }
    }
}
