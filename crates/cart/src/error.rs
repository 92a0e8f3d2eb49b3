//! Error types for the cart subsystem.
//!
//! None of these errors are fatal to a cart session. Load and notify
//! failures surface to the presentation layer as one-shot notices; request
//! errors are returned directly to the caller.

use thiserror::Error;

/// Errors reported by a [`CartSource`](crate::CartSource).
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LoadError {
    /// The request never produced a response.
    #[error("Transport error: {0}")]
    Transport(String),

    /// The data service answered with an error status.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// The response body could not be decoded.
    #[error("Parse error: {0}")]
    Parse(String),
}

/// Errors reported by a [`CheckoutMailer`](crate::CheckoutMailer).
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum NotifyError {
    /// The mail transport failed.
    #[error("Transport error: {0}")]
    Transport(String),

    /// A recipient or sender address was rejected.
    #[error("Invalid email address: {0}")]
    InvalidAddress(String),

    /// The message body could not be rendered.
    #[error("Template error: {0}")]
    Template(String),
}

/// Errors returned synchronously from cart session requests.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum CartError {
    /// The session has been torn down.
    #[error("Cart session is closed")]
    Closed,

    /// Checkout was requested with nothing in the cart.
    #[error("Cart is empty")]
    EmptyCart,

    /// Checkout was requested on a session opened without a notifier.
    #[error("Checkout is not available in this session")]
    CheckoutUnavailable,
}
