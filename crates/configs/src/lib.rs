//! # configs
//!
//! Deployment settings for ita-board, resolved exactly once at process
//! start from the environment (plus a local `.env` in development) into
//! an immutable structure that is dependency-injected into handlers.
//! Secrets never appear in `Debug` output thanks to `secrecy`.

use config::{Config, ConfigError};
use secrecy::SecretString;
use serde::Deserialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Deployment environment flag. Drives the CSRF enforcement default and
/// the `Secure` attribute on cookies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    pub fn is_production(self) -> bool {
        matches!(self, Environment::Production)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Production => "production",
        }
    }
}

/// Immutable process-wide settings.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// Base URL of the hosted datastore (no trailing `/rest/v1`).
    pub supabase_url: String,
    /// The datastore's public (anon) key; sent on every REST call and
    /// exposed to the browser client for its realtime channel.
    pub supabase_anon_key: SecretString,
    /// HMAC key for the CSRF double-submit tokens.
    pub csrf_secret: SecretString,
    pub environment: Environment,
    pub port: u16,
    /// The single origin CORS admits, credentials enabled.
    pub allowed_origin: String,
    /// Filesystem path the static browser client is served from.
    pub static_dir: String,
    /// Per-client request ceiling: at most `rate_limit_max` requests per
    /// `rate_limit_window_secs` window, keyed by client address.
    pub rate_limit_max: u32,
    pub rate_limit_window_secs: u64,
    /// Explicit CSRF toggle; absent means "on in production only".
    pub enforce_csrf: Option<bool>,
    pub board_title: String,
    pub board_comment: String,
}

impl Settings {
    /// Loads settings from the process environment. `SUPABASE_URL`,
    /// `SUPABASE_ANON_KEY` and `CSRF_SECRET` are required; everything
    /// else has a development-friendly default.
    pub fn load() -> Result<Self, SettingsError> {
        dotenvy::dotenv().ok();

        let settings: Settings = Config::builder()
            .set_default("environment", "development")?
            .set_default("port", 3000_i64)?
            .set_default("allowed_origin", "http://localhost:3000")?
            .set_default("static_dir", "crates/ib-ui/static")?
            .set_default("rate_limit_max", 100_i64)?
            .set_default("rate_limit_window_secs", 15_i64 * 60)?
            .set_default("board_title", "リアルタイムちゃんねる")?
            .set_default("board_comment", "新世代の掲示板")?
            .add_source(config::Environment::default().try_parsing(true))
            .build()?
            .try_deserialize()?;

        tracing::debug!(
            environment = settings.environment.as_str(),
            port = settings.port,
            "settings resolved"
        );
        Ok(settings)
    }

    /// Whether non-GET API requests must carry a valid anti-forgery
    /// token. Explicit `ENFORCE_CSRF` wins; otherwise enforcement
    /// follows the environment (on in production, off in development).
    pub fn csrf_enforced(&self) -> bool {
        self.enforce_csrf
            .unwrap_or_else(|| self.environment.is_production())
    }
}
