//! External services the cart depends on.
//!
//! Implementations live outside this crate: the CLI ships an HTTP data
//! source and an SMTP mailer, tests use in-memory fakes.

use async_trait::async_trait;
use supermarket_core::{CartItem, CartItemId};

use crate::checkout::CheckoutMessage;
use crate::error::{LoadError, NotifyError};

/// Data service holding the signed-in user's cart.
#[async_trait]
pub trait CartSource: Send + Sync {
    /// Fetch every line in the cart.
    ///
    /// `Ok(None)` means the service had no cart for the user; callers treat
    /// it like an empty list, not like an error.
    async fn fetch_cart_items(&self) -> Result<Option<Vec<CartItem>>, LoadError>;

    /// Delete one line from the remote cart.
    async fn delete_cart_item(&self, id: &CartItemId) -> Result<(), LoadError>;
}

/// Notification service that emails a checkout summary.
#[async_trait]
pub trait CheckoutMailer: Send + Sync {
    /// Send the checkout email described by `message`.
    async fn send_checkout_email(&self, message: &CheckoutMessage) -> Result<(), NotifyError>;
}
