//! Gateway configuration loaded from environment variables.
//!
//! Follows 12-factor style: all settings come from environment variables
//! (or a `.env` file via `dotenvy`). Unset or unparsable numeric values fall
//! back to their defaults; an unparsable listen address, CORS origin, log
//! format or user list is rejected at startup, as is a zero duration or a
//! short JWT secret.

use std::fmt;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use axum::http::HeaderValue;

use crate::auth::UserSeed;
use crate::error::ConfigError;

/// Origins the dashboard front-end is served from during development.
const DEFAULT_CORS_ORIGINS: &str = "http://localhost:5173,http://127.0.0.1:5173,\
http://localhost:5174,http://127.0.0.1:5174,http://localhost:3000,http://127.0.0.1:3000";

/// User list applied when `AUTH_USERS` is unset.
const DEFAULT_USERS: &str = "admin:admin123:admin";

/// Shortest accepted `JWT_SECRET`.
const MIN_SECRET_LEN: usize = 32;

/// Default token lifetime: one day.
const DEFAULT_TOKEN_MINUTES: u64 = 1440;

/// A string that never shows up in `Debug` output.
#[derive(Clone, PartialEq, Eq)]
pub struct Secret(String);

impl Secret {
    /// Wraps `value`.
    #[must_use]
    pub const fn new(value: String) -> Self {
        Self(value)
    }

    /// The wrapped value.
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret(***)")
    }
}

/// Login and token settings.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// HS256 signing key.
    pub jwt_secret: Secret,
    /// Access token lifetime.
    pub token_ttl: Duration,
    /// Users allowed to log in.
    pub users: Vec<UserSeed>,
}

/// Output format of the tracing subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable multi-field lines.
    Pretty,
    /// One JSON object per event.
    Json,
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pretty" | "text" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            _ => Err(ConfigError::LogFormat(s.to_string())),
        }
    }
}

/// WebSocket manager tuning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WsConfig {
    /// Interval between heartbeat pings on each connection.
    pub heartbeat_interval: Duration,
    /// Upper bound on a single frame write before it counts as failed.
    pub write_timeout: Duration,
}

impl Default for WsConfig {
    fn default() -> Self {
        Self {
            heartbeat_interval: Duration::from_secs(30),
            write_timeout: Duration::from_secs(10),
        }
    }
}

/// Top-level gateway configuration.
///
/// Loaded once at startup via [`ServerConfig::from_env`].
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Socket address to bind the HTTP server to (e.g. `0.0.0.0:8000`).
    pub listen_addr: SocketAddr,

    /// WebSocket heartbeat and write-timeout settings.
    pub ws: WsConfig,

    /// Root directory holding `<type>/<type>_<date>.log` files.
    pub log_dir: PathBuf,

    /// Tracing output format.
    pub log_format: LogFormat,

    /// Origins allowed by the CORS layer.
    pub cors_origins: Vec<HeaderValue>,

    /// Directory holding `settings.yaml`, `ladders.yaml` and `secrets.yaml`.
    pub config_dir: PathBuf,
}

impl ServerConfig {
    /// Loads configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv().ok()` to optionally load a `.env` file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if `LISTEN_ADDR`, `LOG_FORMAT` or an entry of
    /// `CORS_ALLOWED_ORIGINS` cannot be parsed, or if
    /// `WS_HEARTBEAT_INTERVAL_SECS` or `WS_WRITE_TIMEOUT_SECS` is zero.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let raw_addr = std::env::var("LISTEN_ADDR").unwrap_or_else(|_| "0.0.0.0:8000".to_string());
        let listen_addr = raw_addr
            .parse()
            .map_err(|source| ConfigError::ListenAddr {
                value: raw_addr.clone(),
                source,
            })?;

        let defaults = WsConfig::default();
        let ws = WsConfig {
            heartbeat_interval: Duration::from_secs(parse_positive(
                "WS_HEARTBEAT_INTERVAL_SECS",
                env("WS_HEARTBEAT_INTERVAL_SECS").as_deref(),
                defaults.heartbeat_interval.as_secs(),
            )?),
            write_timeout: Duration::from_secs(parse_positive(
                "WS_WRITE_TIMEOUT_SECS",
                env("WS_WRITE_TIMEOUT_SECS").as_deref(),
                defaults.write_timeout.as_secs(),
            )?),
        };

        let log_dir = std::env::var("LOG_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("logs"));

        let log_format = match std::env::var("LOG_FORMAT") {
            Ok(v) => v.parse()?,
            Err(_) => LogFormat::Pretty,
        };

        let cors_origins = parse_origins(
            &std::env::var("CORS_ALLOWED_ORIGINS")
                .unwrap_or_else(|_| DEFAULT_CORS_ORIGINS.to_string()),
        )?;

        let config_dir = env("CONFIG_DIR").map_or_else(|| PathBuf::from("config"), PathBuf::from);

        Ok(Self {
            listen_addr,
            ws,
            log_dir,
            log_format,
            cors_origins,
            config_dir,
        })
    }
}

impl AuthConfig {
    /// Reads `JWT_SECRET`, `ACCESS_TOKEN_EXPIRE_MINUTES` and `AUTH_USERS`.
    ///
    /// Without `JWT_SECRET` a random secret is generated, so tokens do not
    /// survive a restart. Without `AUTH_USERS` the single default admin is
    /// configured. Both cases log a warning, so call this after tracing is
    /// installed.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if `JWT_SECRET` is shorter than 32
    /// characters, `ACCESS_TOKEN_EXPIRE_MINUTES` is zero, or an `AUTH_USERS`
    /// entry is malformed.
    pub fn from_env() -> Result<Self, ConfigError> {
        let jwt_secret = match env("JWT_SECRET") {
            Some(raw) => parse_secret(raw)?,
            None => {
                tracing::warn!("JWT_SECRET not set; generated a random secret for this process");
                generate_secret()
            }
        };

        let minutes = parse_positive(
            "ACCESS_TOKEN_EXPIRE_MINUTES",
            env("ACCESS_TOKEN_EXPIRE_MINUTES").as_deref(),
            DEFAULT_TOKEN_MINUTES,
        )?;
        let token_ttl = Duration::from_secs(minutes.saturating_mul(60));

        let users = match env("AUTH_USERS") {
            Some(raw) => UserSeed::parse_list(&raw)?,
            None => {
                tracing::warn!("AUTH_USERS not set; using the default admin account");
                UserSeed::parse_list(DEFAULT_USERS)?
            }
        };
        if users.is_empty() {
            tracing::warn!("AUTH_USERS is empty; nobody can log in");
        }

        Ok(Self {
            jwt_secret,
            token_ttl,
            users,
        })
    }
}

/// Reads a non-blank environment variable.
fn env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Parses a duration count for `key`. Missing or unparsable input yields
/// `default`; zero is rejected.
fn parse_positive(key: &'static str, raw: Option<&str>, default: u64) -> Result<u64, ConfigError> {
    match raw.and_then(|v| v.trim().parse::<u64>().ok()) {
        Some(0) => Err(ConfigError::ZeroDuration { key }),
        Some(n) => Ok(n),
        None => Ok(default),
    }
}

/// Accepts a signing secret of at least [`MIN_SECRET_LEN`] characters.
fn parse_secret(raw: String) -> Result<Secret, ConfigError> {
    if raw.chars().count() < MIN_SECRET_LEN {
        return Err(ConfigError::JwtSecret {
            min: MIN_SECRET_LEN,
        });
    }
    Ok(Secret::new(raw))
}

/// 64 hex characters from two v4 UUIDs.
fn generate_secret() -> Secret {
    Secret::new(format!(
        "{}{}",
        uuid::Uuid::new_v4().simple(),
        uuid::Uuid::new_v4().simple()
    ))
}

/// Splits a comma-separated origin list, skipping blanks.
fn parse_origins(raw: &str) -> Result<Vec<HeaderValue>, ConfigError> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| HeaderValue::from_str(s).map_err(|_| ConfigError::CorsOrigin(s.to_string())))
        .collect()
}
