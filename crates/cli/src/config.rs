//! CLI configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `SUPERMARKET_DATA_URL` - Base URL of the cart data service
//!
//! ## Checkout email (required together, only for `cart checkout`)
//! - `SUPERMARKET_SMTP_HOST` - SMTP relay host
//! - `SUPERMARKET_SMTP_USERNAME` - SMTP username
//! - `SUPERMARKET_SMTP_PASSWORD` - SMTP password
//! - `SUPERMARKET_FROM_ADDRESS` - Sender address for checkout emails
//! - `SUPERMARKET_SMTP_PORT` - SMTP port (default: 587)
//! - `SUPERMARKET_FROM_NAME` - Sender display name (default: Supermarket)
//!
//! ## Optional
//! - `SUPERMARKET_DATA_TOKEN` - Bearer token for the data service
//! - `SUPERMARKET_HTTP_TIMEOUT_SECS` - Data service request timeout (default: 30)
//! - `SUPERMARKET_USER_NAME` - Signed-in user's name
//! - `SUPERMARKET_USER_EMAIL` - Signed-in user's email
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::time::Duration;

use secrecy::SecretString;
use supermarket_cart::SenderIdentity;
use supermarket_core::Email;
use thiserror::Error;
use url::Url;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// CLI configuration.
#[derive(Debug, Clone)]
pub struct CliConfig {
    /// Cart data service configuration
    pub data: DataServiceConfig,
    /// SMTP configuration for checkout emails, present when
    /// `SUPERMARKET_SMTP_HOST` is set
    pub email: Option<EmailConfig>,
    /// Signed-in user's name
    pub user_name: Option<String>,
    /// Signed-in user's email
    pub user_email: Option<Email>,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
}

/// Cart data service configuration.
///
/// Implements `Debug` manually to redact the token.
#[derive(Clone)]
pub struct DataServiceConfig {
    /// Base URL; cart endpoints are resolved relative to it
    pub base_url: Url,
    /// Bearer token, if the service requires one
    pub token: Option<SecretString>,
    /// Per-request timeout
    pub timeout: Duration,
}

impl std::fmt::Debug for DataServiceConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DataServiceConfig")
            .field("base_url", &self.base_url.as_str())
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// SMTP configuration.
///
/// Implements `Debug` manually to redact the password.
#[derive(Clone)]
pub struct EmailConfig {
    /// SMTP relay host
    pub smtp_host: String,
    /// SMTP port
    pub smtp_port: u16,
    /// SMTP username
    pub smtp_username: String,
    /// SMTP password
    pub smtp_password: SecretString,
    /// Sender display name
    pub from_name: String,
    /// Sender address
    pub from_address: Email,
}

impl std::fmt::Debug for EmailConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmailConfig")
            .field("smtp_host", &self.smtp_host)
            .field("smtp_port", &self.smtp_port)
            .field("smtp_username", &self.smtp_username)
            .field("smtp_password", &"[REDACTED]")
            .field("from_name", &self.from_name)
            .field("from_address", &self.from_address)
            .finish()
    }
}

impl EmailConfig {
    /// Load the SMTP section, or `None` when no SMTP host is configured.
    fn from_lookup<F>(env: &Env<F>) -> Result<Option<Self>, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let Some(smtp_host) = env.optional("SUPERMARKET_SMTP_HOST") else {
            return Ok(None);
        };

        Ok(Some(Self {
            smtp_host,
            smtp_port: env.parsed_or("SUPERMARKET_SMTP_PORT", 587)?,
            smtp_username: env.required("SUPERMARKET_SMTP_USERNAME")?,
            smtp_password: SecretString::from(env.required("SUPERMARKET_SMTP_PASSWORD")?),
            from_name: env
                .optional("SUPERMARKET_FROM_NAME")
                .unwrap_or_else(|| "Supermarket".to_string()),
            from_address: env.email("SUPERMARKET_FROM_ADDRESS")?.ok_or_else(|| {
                ConfigError::MissingEnvVar("SUPERMARKET_FROM_ADDRESS".to_string())
            })?,
        }))
    }

    /// Sender identity for checkout emails.
    #[must_use]
    pub fn sender(&self) -> SenderIdentity {
        SenderIdentity {
            name: self.from_name.clone(),
            address: self.from_address.clone(),
        }
    }
}

impl CliConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();
        Self::from_lookup(&Env(|key: &str| std::env::var(key).ok()))
    }

    fn from_lookup<F>(env: &Env<F>) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let base_url = env.required("SUPERMARKET_DATA_URL")?;
        let base_url = Url::parse(&base_url).map_err(|e| {
            ConfigError::InvalidEnvVar("SUPERMARKET_DATA_URL".to_string(), e.to_string())
        })?;
        let timeout_secs: u64 = env.parsed_or("SUPERMARKET_HTTP_TIMEOUT_SECS", 30)?;

        let data = DataServiceConfig {
            base_url,
            token: env.optional("SUPERMARKET_DATA_TOKEN").map(SecretString::from),
            timeout: Duration::from_secs(timeout_secs),
        };

        Ok(Self {
            data,
            email: EmailConfig::from_lookup(env)?,
            user_name: env.optional("SUPERMARKET_USER_NAME"),
            user_email: env.email("SUPERMARKET_USER_EMAIL")?,
            sentry_dsn: env.optional("SENTRY_DSN"),
            sentry_environment: env.optional("SENTRY_ENVIRONMENT"),
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Variable lookup; `std::env` in production, a map in tests.
struct Env<F>(F);

impl<F> Env<F>
where
    F: Fn(&str) -> Option<String>,
{
    /// Get an optional variable, treating blank values as unset.
    fn optional(&self, key: &str) -> Option<String> {
        (self.0)(key).filter(|value| !value.trim().is_empty())
    }

    /// Get a required variable.
    fn required(&self, key: &str) -> Result<String, ConfigError> {
        self.optional(key)
            .ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))
    }

    /// Parse an optional variable, falling back to `default` when unset.
    fn parsed_or<T>(&self, key: &str, default: T) -> Result<T, ConfigError>
    where
        T: std::str::FromStr,
        T::Err: std::fmt::Display,
    {
        self.optional(key).map_or(Ok(default), |value| {
            value
                .trim()
                .parse()
                .map_err(|e: T::Err| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
        })
    }

    /// Parse an optional email variable.
    fn email(&self, key: &str) -> Result<Option<Email>, ConfigError> {
        self.optional(key)
            .map(|value| {
                Email::parse(&value)
                    .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
            })
            .transpose()
    }
}
