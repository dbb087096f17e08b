//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `GAMEVAULT_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//! - `GAMEVAULT_JWT_SECRET` - Token signing secret (min 32 chars, high entropy)
//!
//! ## Optional
//! - `GAMEVAULT_HOST` - Bind address (default: 127.0.0.1)
//! - `GAMEVAULT_PORT` - Listen port (default: 3000)
//! - `GAMEVAULT_BASE_URL` - Public URL (default: <http://localhost:3000>)
//! - `GAMEVAULT_TOKEN_TTL_HOURS` - Access token lifetime (default: 24)
//! - `GAMEVAULT_LOW_STOCK_THRESHOLD` - Stock level flagged on the admin dashboard (default: 5)
//! - `GAMEVAULT_CORS_ORIGINS` - Comma-separated origins allowed to call the API
//! - `GAMEVAULT_TRUSTED_PROXIES` - Comma-separated proxy IPs whose `X-Forwarded-For` is honoured
//! - `STRIPE_SECRET_KEY` - Stripe API key; payments are disabled without it
//! - `STRIPE_WEBHOOK_SECRET` - Stripe webhook signing secret
//! - `STRIPE_CURRENCY` - ISO currency for payment intents (default: usd)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT`, `SENTRY_SAMPLE_RATE`, `SENTRY_TRACES_SAMPLE_RATE`

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

const MIN_JWT_SECRET_LENGTH: usize = 32;
const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "secret",
    "password",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "enter-",
    "put-your",
    "add-your",
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

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for the storefront
    pub base_url: String,
    /// Access token settings
    pub auth: AuthConfig,
    /// Stripe settings; `None` disables the payment endpoints
    pub stripe: Option<StripeConfig>,
    /// Products at or below this stock level show up as low stock
    pub low_stock_threshold: i32,
    /// Origins allowed to call the API from a browser
    pub cors_origins: Vec<String>,
    /// Reverse proxies allowed to report the client address
    pub trusted_proxies: Vec<IpAddr>,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
    /// Fraction of errors sent to Sentry
    pub sentry_sample_rate: f32,
    /// Fraction of transactions traced
    pub sentry_traces_sample_rate: f32,
}

/// Signed access token configuration.
#[derive(Clone)]
pub struct AuthConfig {
    /// HMAC key for HS256 tokens
    pub jwt_secret: SecretString,
    /// Token lifetime in hours
    pub token_ttl_hours: i64,
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("jwt_secret", &"[REDACTED]")
            .field("token_ttl_hours", &self.token_ttl_hours)
            .finish()
    }
}

/// Stripe API configuration.
#[derive(Clone)]
pub struct StripeConfig {
    /// Secret API key (`sk_...`)
    pub secret_key: SecretString,
    /// Webhook endpoint signing secret (`whsec_...`)
    pub webhook_secret: Option<SecretString>,
    /// Lower-case ISO 4217 currency code
    pub currency: String,
    /// API base URL, overridable for testing against a mock
    pub api_base: String,
}

impl std::fmt::Debug for StripeConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StripeConfig")
            .field("secret_key", &"[REDACTED]")
            .field(
                "webhook_secret",
                &self.webhook_secret.as_ref().map(|_| "[REDACTED]"),
            )
            .field("currency", &self.currency)
            .field("api_base", &self.api_base)
            .finish()
    }
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if secrets fail validation (placeholder detection, entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let database_url = get_database_url("GAMEVAULT_DATABASE_URL")?;
        let host = parse_env_or_default::<IpAddr>("GAMEVAULT_HOST", "127.0.0.1")?;
        let port = parse_env_or_default::<u16>("GAMEVAULT_PORT", "3000")?;
        let base_url = get_env_or_default("GAMEVAULT_BASE_URL", "http://localhost:3000");

        let auth = AuthConfig::from_env()?;
        let stripe = StripeConfig::from_env()?;
        let low_stock_threshold =
            parse_env_or_default::<i32>("GAMEVAULT_LOW_STOCK_THRESHOLD", "5")?;
        let cors_origins = get_optional_env("GAMEVAULT_CORS_ORIGINS")
            .map(|v| parse_origins(&v))
            .unwrap_or_default();
        let trusted_proxies = get_optional_env("GAMEVAULT_TRUSTED_PROXIES")
            .map(|v| parse_ip_list("GAMEVAULT_TRUSTED_PROXIES", &v))
            .transpose()?
            .unwrap_or_default();

        Ok(Self {
            database_url,
            host,
            port,
            base_url,
            auth,
            stripe,
            low_stock_threshold,
            cors_origins,
            trusted_proxies,
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
            sentry_sample_rate: parse_env_or_default::<f32>("SENTRY_SAMPLE_RATE", "1.0")?,
            sentry_traces_sample_rate: parse_env_or_default::<f32>(
                "SENTRY_TRACES_SAMPLE_RATE",
                "0.0",
            )?,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Whether payment endpoints are available.
    #[must_use]
    pub const fn payments_enabled(&self) -> bool {
        self.stripe.is_some()
    }
}

impl AuthConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let jwt_secret = get_validated_secret("GAMEVAULT_JWT_SECRET")?;
        validate_secret_length(&jwt_secret, "GAMEVAULT_JWT_SECRET")?;
        let token_ttl_hours = parse_env_or_default::<i64>("GAMEVAULT_TOKEN_TTL_HOURS", "24")?;
        if token_ttl_hours <= 0 {
            return Err(ConfigError::InvalidEnvVar(
                "GAMEVAULT_TOKEN_TTL_HOURS".to_string(),
                "must be positive".to_string(),
            ));
        }

        Ok(Self {
            jwt_secret,
            token_ttl_hours,
        })
    }
}

impl StripeConfig {
    /// Stripe's public API endpoint.
    pub const DEFAULT_API_BASE: &'static str = "https://api.stripe.com";

    fn from_env() -> Result<Option<Self>, ConfigError> {
        let Some(secret_key) = get_optional_env("STRIPE_SECRET_KEY") else {
            return Ok(None);
        };
        if !secret_key.starts_with("sk_") && !secret_key.starts_with("rk_") {
            return Err(ConfigError::InvalidEnvVar(
                "STRIPE_SECRET_KEY".to_string(),
                "expected a key starting with sk_ or rk_".to_string(),
            ));
        }

        Ok(Some(Self {
            secret_key: SecretString::from(secret_key),
            webhook_secret: get_optional_env("STRIPE_WEBHOOK_SECRET").map(SecretString::from),
            currency: get_env_or_default("STRIPE_CURRENCY", "usd").to_lowercase(),
            api_base: get_env_or_default("STRIPE_API_BASE", Self::DEFAULT_API_BASE),
        }))
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

/// Parse an environment variable, falling back to `default` when unset.
fn parse_env_or_default<T>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    get_env_or_default(key, default)
        .trim()
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

/// Split a comma-separated origin list.
fn parse_origins(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim().trim_end_matches('/').to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Parse a comma-separated list of IP addresses.
fn parse_ip_list(key: &str, value: &str) -> Result<Vec<IpAddr>, ConfigError> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<IpAddr>()
                .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), format!("{s}: {e}")))
        })
        .collect()
}

/// Validate that a signing secret meets minimum length requirements.
fn validate_secret_length(secret: &SecretString, var_name: &str) -> Result<(), ConfigError> {
    let value = secret.expose_secret();
    if value.len() < MIN_JWT_SECRET_LENGTH {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "must be at least {} characters (got {})",
                MIN_JWT_SECRET_LENGTH,
                value.len()
            ),
        ));
    }
    Ok(())
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
            #[allow(clippy::cast_precision_loss)]
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    if let Some(pattern) = PLACEHOLDER_PATTERNS.iter().find(|p| lower.contains(*p)) {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!("appears to be a placeholder (contains '{pattern}')"),
        ));
    }

    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Use a randomly generated secret."
            ),
        ));
    }

    Ok(())
}

/// Load and validate a secret from environment.
fn get_validated_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    validate_secret_strength(&value, key)?;
    Ok(SecretString::from(value))
}
