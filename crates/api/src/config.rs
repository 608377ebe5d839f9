//! API configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `THREADCART_DATABASE_URL` - `PostgreSQL` connection string
//!   (falls back to `DATABASE_URL`)
//! - `THREADCART_BASE_URL` - Public URL for the API
//! - `RAZORPAY_KEY_ID` - Razorpay API key id
//! - `RAZORPAY_KEY_SECRET` - Razorpay API key secret
//!
//! ## Optional
//! - `THREADCART_HOST` - Bind address (default: 127.0.0.1)
//! - `THREADCART_PORT` - Listen port (default: 3000)
//! - `RAZORPAY_CALLBACK_URL` - Post-payment redirect
//!   (default: `<THREADCART_BASE_URL>/checkout`)
//! - `SENTRY_DSN` - Sentry error tracking DSN

use std::net::{IpAddr, SocketAddr};

use secrecy::SecretString;
use thiserror::Error;

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

/// API application configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for the API
    pub base_url: String,
    /// Razorpay payment gateway configuration
    pub razorpay: RazorpayConfig,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
}

/// Razorpay payment gateway configuration.
///
/// Implements `Debug` manually to redact the key secret.
#[derive(Clone)]
pub struct RazorpayConfig {
    /// API key id (safe to expose to the client)
    pub key_id: String,
    /// API key secret (server-side only)
    pub key_secret: SecretString,
    /// URL the buyer is redirected to after paying
    pub callback_url: String,
}

impl std::fmt::Debug for RazorpayConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RazorpayConfig")
            .field("key_id", &self.key_id)
            .field("key_secret", &"[REDACTED]")
            .field("callback_url", &self.callback_url)
            .finish()
    }
}

impl ApiConfig {
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

        let database_url = database_url("THREADCART_DATABASE_URL")?;
        let host = env_or("THREADCART_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("THREADCART_HOST".to_owned(), e.to_string())
            })?;
        let port = env_or("THREADCART_PORT", "3000").parse::<u16>().map_err(|e| {
            ConfigError::InvalidEnvVar("THREADCART_PORT".to_owned(), e.to_string())
        })?;
        let base_url = require("THREADCART_BASE_URL")?;

        let razorpay = RazorpayConfig::from_env(&base_url)?;
        let sentry_dsn = std::env::var("SENTRY_DSN").ok();

        Ok(Self {
            database_url,
            host,
            port,
            base_url,
            razorpay,
            sentry_dsn,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl RazorpayConfig {
    fn from_env(base_url: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            key_id: require("RAZORPAY_KEY_ID")?,
            key_secret: validated_secret("RAZORPAY_KEY_SECRET")?,
            callback_url: env_or("RAZORPAY_CALLBACK_URL", &format!("{base_url}/checkout")),
        })
    }
}

fn require(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_owned()))
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_owned())
}

/// Database URL, preferring the prefixed variable over plain `DATABASE_URL`.
fn database_url(primary: &str) -> Result<SecretString, ConfigError> {
    std::env::var(primary)
        .or_else(|_| std::env::var("DATABASE_URL"))
        .map(SecretString::from)
        .map_err(|_| ConfigError::MissingEnvVar(primary.to_owned()))
}

/// Shannon entropy of the byte distribution, in bits per byte.
///
/// API secrets are ASCII, where this matches per-character entropy.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }
    let mut counts = [0u32; 256];
    for &b in s.as_bytes() {
        counts[usize::from(b)] += 1;
    }
    #[allow(clippy::cast_precision_loss)] // secrets are far below f64 integer range
    let len = s.len() as f64;
    counts
        .iter()
        .filter(|&&c| c > 0)
        .map(|&c| {
            let p = f64::from(c) / len;
            -p * p.log2()
        })
        .sum()
}

/// Reject placeholder-looking or low-entropy secrets.
fn check_secret_strength(secret: &str, var: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();
    if let Some(hit) = PLACEHOLDER_PATTERNS.iter().find(|p| lower.contains(**p)) {
        return Err(ConfigError::InsecureSecret(
            var.to_owned(),
            format!("looks like a placeholder (contains '{hit}')"),
        ));
    }

    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var.to_owned(),
            format!(
                "entropy {entropy:.2} bits/char is below {MIN_ENTROPY_BITS_PER_CHAR:.1}; use a generated secret"
            ),
        ));
    }
    Ok(())
}

fn validated_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = require(key)?;
    check_secret_strength(&value, key)?;
    Ok(SecretString::from(value))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn entropy_of_repeated_char_is_zero() {
        assert!(shannon_entropy("aaaaaaa").abs() < f64::EPSILON);
    }

    #[test]
    fn entropy_of_mixed_secret_clears_threshold() {
        assert!(shannon_entropy("aB3$xY9!mK2@nL5#") > MIN_ENTROPY_BITS_PER_CHAR);
    }

    #[test]
    fn placeholder_secrets_are_rejected() {
        let err = check_secret_strength("your-api-key-here", "TEST_VAR").unwrap_err();
        assert!(matches!(err, ConfigError::InsecureSecret(_, _)));
    }

    #[test]
    fn low_entropy_secrets_are_rejected() {
        assert!(check_secret_strength("aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa", "TEST_VAR").is_err());
    }

    #[test]
    fn strong_secrets_pass() {
        assert!(check_secret_strength("aB3$xY9!mK2@nL5#pQ7&rT0*uW4^zC6", "TEST_VAR").is_ok());
    }

    #[test]
    fn socket_addr_combines_host_and_port() {
        let config = ApiConfig {
            database_url: SecretString::from("postgres://localhost/test"),
            host: "127.0.0.1".parse().unwrap(),
            port: 3000,
            base_url: "http://localhost:3000".to_owned(),
            razorpay: RazorpayConfig {
                key_id: "rzp_test_key".to_owned(),
                key_secret: SecretString::from("k"),
                callback_url: "http://localhost:3000/checkout".to_owned(),
            },
            sentry_dsn: None,
        };
        assert_eq!(config.socket_addr().to_string(), "127.0.0.1:3000");
    }
}
