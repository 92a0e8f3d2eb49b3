//! Adapters for the services the cart talks to.
//!
//! - `data` - HTTP cart data service ([`HttpCartSource`])
//! - `email` - SMTP checkout mailer ([`SmtpCheckoutMailer`])

pub mod data;
pub mod email;

pub use data::HttpCartSource;
pub use email::SmtpCheckoutMailer;
