//! Bot configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `BOT_TOKEN` - Telegram bot token (`<bot id>:<secret>`)
//! - `BOT_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//!
//! ## Optional
//! - `ADMIN_IDS` - Comma-separated Telegram ids with bootstrap admin rights
//! - `UPLOADS_DIR` - Root directory for stored files (default: uploads)
//! - `TELEGRAM_API_URL` - Bot API base URL (default: <https://api.telegram.org>)
//! - `POLL_TIMEOUT_SECS` - Long-poll timeout (default: 30)
//! - `BROADCAST_DELAY_MS` - Pause between broadcast messages (default: 50)
//! - `DIALOGUE_TTL_SECS` - Idle expiry of unfinished wizards (default: 3600)
//! - `HEALTH_ADDR` - Bind address for `/health` and `/health/ready` (disabled if unset)
//! - `LOG_FORMAT` - `json` for structured logs, anything else for text
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_SAMPLE_RATE` / `SENTRY_TRACES_SAMPLE_RATE` - Sample rates (default: 1.0 / 0.0)

use std::collections::{HashMap, HashSet};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;
use url::Url;

use studybot_core::TelegramId;

const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;
const DEFAULT_TELEGRAM_API_URL: &str = "https://api.telegram.org";

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "your_",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "token",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "put-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Bot application configuration.
#[derive(Debug, Clone)]
pub struct BotConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// Telegram Bot API settings
    pub telegram: TelegramConfig,
    /// Telegram ids granted admin rights without a database row
    pub admin_ids: HashSet<TelegramId>,
    /// Root directory for uploaded deliverables
    pub uploads_dir: PathBuf,
    /// Pause between two broadcast messages
    pub broadcast_delay: Duration,
    /// Idle time after which an unfinished wizard is forgotten
    pub dialogue_ttl: Duration,
    /// Address for the health endpoints, if enabled
    pub health_addr: Option<SocketAddr>,
    /// Emit JSON logs instead of text
    pub json_logs: bool,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g., "development", "production")
    pub sentry_environment: Option<String>,
    /// Sentry error sample rate (0.0 to 1.0)
    pub sentry_sample_rate: f32,
    /// Sentry traces sample rate (0.0 to 1.0)
    pub sentry_traces_sample_rate: f32,
}

/// Telegram Bot API configuration.
///
/// Implements `Debug` manually to redact the bot token.
#[derive(Clone)]
pub struct TelegramConfig {
    /// Bot token issued by `@BotFather`
    pub token: SecretString,
    /// Base URL of the Bot API (a local Bot API server may be used)
    pub api_url: Url,
    /// Long-poll timeout passed to `getUpdates`
    pub poll_timeout: Duration,
}

impl std::fmt::Debug for TelegramConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramConfig")
            .field("token", &"[REDACTED]")
            .field("api_url", &self.api_url.as_str())
            .field("poll_timeout", &self.poll_timeout)
            .finish()
    }
}

impl BotConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if the bot token fails validation.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let database_url = get_database_url("BOT_DATABASE_URL")?;
        let telegram = TelegramConfig::from_env()?;
        let admin_ids = parse_admin_ids(&get_env_or_default("ADMIN_IDS", ""))?;
        let uploads_dir = PathBuf::from(get_env_or_default("UPLOADS_DIR", "uploads"));
        let broadcast_delay = Duration::from_millis(parse_env_or("BROADCAST_DELAY_MS", 50)?);
        let dialogue_ttl = Duration::from_secs(parse_env_or("DIALOGUE_TTL_SECS", 3600)?);
        let health_addr = get_optional_env("HEALTH_ADDR")
            .map(|addr| {
                addr.parse::<SocketAddr>()
                    .map_err(|e| ConfigError::InvalidEnvVar("HEALTH_ADDR".to_string(), e.to_string()))
            })
            .transpose()?;
        let json_logs = get_optional_env("LOG_FORMAT").is_some_and(|f| f.eq_ignore_ascii_case("json"));
        let sentry_dsn = get_optional_env("SENTRY_DSN");
        let sentry_environment = get_optional_env("SENTRY_ENVIRONMENT");
        let sentry_sample_rate = get_optional_env("SENTRY_SAMPLE_RATE")
            .and_then(|s| s.parse().ok())
            .unwrap_or(1.0);
        let sentry_traces_sample_rate = get_optional_env("SENTRY_TRACES_SAMPLE_RATE")
            .and_then(|s| s.parse().ok())
            .unwrap_or(0.0);

        Ok(Self {
            database_url,
            telegram,
            admin_ids,
            uploads_dir,
            broadcast_delay,
            dialogue_ttl,
            health_addr,
            json_logs,
            sentry_dsn,
            sentry_environment,
            sentry_sample_rate,
            sentry_traces_sample_rate,
        })
    }

    /// Returns true if the Telegram id is listed in `ADMIN_IDS`.
    #[must_use]
    pub fn is_bootstrap_admin(&self, telegram_id: TelegramId) -> bool {
        self.admin_ids.contains(&telegram_id)
    }
}

impl TelegramConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let token = get_required_env("BOT_TOKEN")?;
        validate_bot_token(&token, "BOT_TOKEN")?;

        let api_url = Url::parse(&get_env_or_default("TELEGRAM_API_URL", DEFAULT_TELEGRAM_API_URL))
            .map_err(|e| ConfigError::InvalidEnvVar("TELEGRAM_API_URL".to_string(), e.to_string()))?;

        Ok(Self {
            token: SecretString::from(token),
            api_url,
            poll_timeout: Duration::from_secs(parse_env_or("POLL_TIMEOUT_SECS", 30)?),
        })
    }

    /// The numeric bot id, which is the part of the token before the colon.
    #[must_use]
    pub fn bot_id(&self) -> Option<i64> {
        self.token
            .expose_secret()
            .split_once(':')
            .and_then(|(id, _)| id.parse().ok())
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get database URL with fallback to generic `DATABASE_URL`.
fn get_database_url(primary_key: &str) -> Result<SecretString, ConfigError> {
    if let Ok(value) = std::env::var(primary_key) {
        return Ok(SecretString::from(value));
    }
    if let Ok(value) = std::env::var("DATABASE_URL") {
        return Ok(SecretString::from(value));
    }
    Err(ConfigError::MissingEnvVar(primary_key.to_string()))
}

/// Get an optional environment variable, treating empty values as unset.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Parse a numeric environment variable, using `default` when unset.
fn parse_env_or(key: &str, default: u64) -> Result<u64, ConfigError> {
    get_optional_env(key).map_or(Ok(default), |value| {
        value
            .trim()
            .parse()
            .map_err(|e: std::num::ParseIntError| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
    })
}

/// Parse the comma-separated `ADMIN_IDS` list. Blank entries are skipped.
fn parse_admin_ids(raw: &str) -> Result<HashSet<TelegramId>, ConfigError> {
    raw.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| {
            part.parse::<TelegramId>().map_err(|e| {
                ConfigError::InvalidEnvVar("ADMIN_IDS".to_string(), format!("'{part}': {e}"))
            })
        })
        .collect()
}

/// Check the `<digits>:<secret>` shape of a bot token and the strength of its secret half.
fn validate_bot_token(token: &str, var_name: &str) -> Result<(), ConfigError> {
    let (id, secret) = token.split_once(':').ok_or_else(|| {
        ConfigError::InvalidEnvVar(var_name.to_string(), "expected '<bot id>:<secret>'".to_string())
    })?;

    if id.is_empty() || !id.chars().all(|c| c.is_ascii_digit()) {
        return Err(ConfigError::InvalidEnvVar(
            var_name.to_string(),
            "bot id before ':' must be numeric".to_string(),
        ));
    }

    validate_secret_strength(secret, var_name)
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.chars().count() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)] // Character count will never exceed f64 precision
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Copy the token issued by @BotFather."
            ),
        ));
    }

    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const REALISTIC_TOKEN: &str = "7012345678:AAHk3vQ9zL0pXc2mR7tYw8bN4sD1fG6jK5e";

    #[test]
    fn test_shannon_entropy_empty() {
        assert!((shannon_entropy("") - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_shannon_entropy_two_chars() {
        let entropy = shannon_entropy("ab");
        assert!((entropy - 1.0).abs() < 0.01);
    }

    #[test]
    fn test_validate_bot_token_realistic() {
        assert!(validate_bot_token(REALISTIC_TOKEN, "BOT_TOKEN").is_ok());
    }

    #[test]
    fn test_validate_bot_token_shape() {
        assert!(matches!(
            validate_bot_token("no-colon-here", "BOT_TOKEN"),
            Err(ConfigError::InvalidEnvVar(_, _))
        ));
        assert!(matches!(
            validate_bot_token("abc:AAHk3vQ9zL0pXc2mR7tYw8bN4sD1fG6jK5e", "BOT_TOKEN"),
            Err(ConfigError::InvalidEnvVar(_, _))
        ));
    }

    #[test]
    fn test_validate_bot_token_placeholder() {
        let result = validate_bot_token("123:your-bot-token-here", "BOT_TOKEN");
        assert!(matches!(result, Err(ConfigError::InsecureSecret(_, _))));
    }

    #[test]
    fn test_validate_bot_token_low_entropy() {
        let result = validate_bot_token("123:aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa", "BOT_TOKEN");
        assert!(matches!(result, Err(ConfigError::InsecureSecret(_, _))));
    }

    #[test]
    fn test_parse_admin_ids() {
        let ids = parse_admin_ids("123, 456,,789 ").unwrap();
        assert_eq!(ids.len(), 3);
        assert!(ids.contains(&TelegramId::new(456)));
        assert!(parse_admin_ids("").unwrap().is_empty());
    }

    #[test]
    fn test_parse_admin_ids_rejects_garbage() {
        let err = parse_admin_ids("123,admin").unwrap_err();
        assert!(err.to_string().contains("'admin'"));
    }

    #[test]
    fn test_bot_id() {
        let config = TelegramConfig {
            token: SecretString::from(REALISTIC_TOKEN),
            api_url: Url::parse(DEFAULT_TELEGRAM_API_URL).unwrap(),
            poll_timeout: Duration::from_secs(30),
        };
        assert_eq!(config.bot_id(), Some(7_012_345_678));
    }

    #[test]
    fn test_telegram_config_debug_redacts_token() {
        let config = TelegramConfig {
            token: SecretString::from(REALISTIC_TOKEN),
            api_url: Url::parse(DEFAULT_TELEGRAM_API_URL).unwrap(),
            poll_timeout: Duration::from_secs(30),
        };

        let debug_output = format!("{config:?}");

        assert!(debug_output.contains("api.telegram.org"));
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("AAHk3vQ9"));
    }
}
