//! CLI error type.

use lettre::transport::smtp::Error as SmtpError;
use supermarket_cart::{CartError, LoadError};
use supermarket_core::EmailError;
use thiserror::Error;

use crate::config::ConfigError;

/// Errors that end a CLI command.
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration could not be loaded.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The data service client could not be built.
    #[error("Data service error: {0}")]
    DataService(#[from] LoadError),

    /// The SMTP relay could not be configured.
    #[error("SMTP error: {0}")]
    Smtp(#[from] SmtpError),

    /// The cart rejected a request.
    #[error("Cart error: {0}")]
    Cart(#[from] CartError),

    /// A checkout recipient address is invalid.
    #[error("Invalid email: {0}")]
    InvalidEmail(#[from] EmailError),

    /// No user name or email was given for checkout.
    #[error("Missing {0}: pass --{0} or set SUPERMARKET_USER_{upper}", upper = .0.to_uppercase())]
    MissingUser(&'static str),

    /// The cart could not be loaded.
    #[error("Could not load products")]
    LoadFailed,

    /// Checkout was requested without SMTP settings.
    #[error("Checkout email is not configured: set SUPERMARKET_SMTP_HOST and related variables")]
    EmailNotConfigured,

    /// The checkout email could not be sent.
    #[error("Failed to send checkout email")]
    CheckoutFailed,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_user_display() {
        assert_eq!(
            CliError::MissingUser("email").to_string(),
            "Missing email: pass --email or set SUPERMARKET_USER_EMAIL"
        );
    }

    #[test]
    fn test_cart_error_wraps() {
        let err = CliError::from(CartError::EmptyCart);
        assert_eq!(err.to_string(), "Cart error: Cart is empty");
    }

    #[test]
    fn test_email_not_configured_names_variable() {
        assert!(
            CliError::EmailNotConfigured
                .to_string()
                .contains("SUPERMARKET_SMTP_HOST")
        );
    }
}
