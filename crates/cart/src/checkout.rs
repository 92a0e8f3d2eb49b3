//! Checkout notification: one email per confirmed checkout.

use std::sync::Arc;

use supermarket_core::{CartSnapshot, Email, Price};

use crate::error::NotifyError;
use crate::ports::CheckoutMailer;

/// Who checkout emails are sent from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SenderIdentity {
    /// Display name.
    pub name: String,
    /// From address.
    pub address: Email,
}

/// Everything needed to send one checkout email.
///
/// Built from a [`CartSnapshot`] taken at confirmation time, so changes to
/// the cart after the user confirmed never alter a message in flight.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutMessage {
    /// Recipient's display name.
    pub user_name: String,
    /// Recipient's address.
    pub user_email: Email,
    /// Sender identity.
    pub sender: SenderIdentity,
    /// Items being checked out.
    pub items: CartSnapshot,
    /// Sum of item prices.
    pub total: Price,
}

impl CheckoutMessage {
    /// Email subject line.
    #[must_use]
    pub fn subject(&self) -> String {
        format!("{} - your order ({} items)", self.sender.name, self.items.len())
    }
}

/// Assembles and sends checkout emails.
///
/// Sending is attempted once. Success and failure are both terminal: a
/// failed send is logged and reported, never retried, so a flaky mail
/// server can't produce duplicate emails.
#[derive(Clone)]
pub struct CheckoutNotifier {
    mailer: Arc<dyn CheckoutMailer>,
    sender: SenderIdentity,
}

impl CheckoutNotifier {
    /// Create a notifier that sends through `mailer` as `sender`.
    #[must_use]
    pub fn new(mailer: Arc<dyn CheckoutMailer>, sender: SenderIdentity) -> Self {
        Self { mailer, sender }
    }

    /// Sender identity used for every message.
    #[must_use]
    pub const fn sender(&self) -> &SenderIdentity {
        &self.sender
    }

    /// Build the message for `items`.
    #[must_use]
    pub fn prepare(&self, user_name: &str, user_email: Email, items: CartSnapshot) -> CheckoutMessage {
        CheckoutMessage {
            user_name: user_name.to_owned(),
            user_email,
            sender: self.sender.clone(),
            total: items.total(),
            items,
        }
    }

    /// Send `message` once.
    ///
    /// # Errors
    ///
    /// Returns the mailer's [`NotifyError`] unchanged.
    pub async fn dispatch(&self, message: &CheckoutMessage) -> Result<(), NotifyError> {
        match self.mailer.send_checkout_email(message).await {
            Ok(()) => {
                tracing::info!(
                    to = %message.user_email,
                    items = message.items.len(),
                    total = %message.total,
                    "Checkout email sent"
                );
                Ok(())
            }
            Err(e) => {
                tracing::error!(to = %message.user_email, error = %e, "Failed to send checkout email");
                Err(e)
            }
        }
    }
}

impl std::fmt::Debug for CheckoutNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CheckoutNotifier")
            .field("sender", &self.sender)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use supermarket_core::CartItem;

    use super::*;

    #[derive(Default)]
    struct RecordingMailer {
        sent: Mutex<Vec<CheckoutMessage>>,
        fail: bool,
    }

    #[async_trait]
    impl CheckoutMailer for RecordingMailer {
        async fn send_checkout_email(&self, message: &CheckoutMessage) -> Result<(), NotifyError> {
            self.sent.lock().unwrap().push(message.clone());
            if self.fail {
                Err(NotifyError::Transport("connection reset".to_string()))
            } else {
                Ok(())
            }
        }
    }

    fn sender() -> SenderIdentity {
        SenderIdentity {
            name: "Supermarket".to_string(),
            address: Email::parse("orders@supermarket.example").unwrap(),
        }
    }

    fn snapshot() -> CartSnapshot {
        CartSnapshot::from(vec![
            CartItem::new("1", "a", Price::from_cents(250).unwrap()),
            CartItem::new("2", "b", Price::from_cents(300).unwrap()),
        ])
    }

    #[test]
    fn test_prepare_fills_payload() {
        let notifier = CheckoutNotifier::new(Arc::new(RecordingMailer::default()), sender());
        let message = notifier.prepare(
            "Ada",
            Email::parse("ada@example.com").unwrap(),
            snapshot(),
        );
        assert_eq!(message.user_name, "Ada");
        assert_eq!(message.total, Price::from_cents(550).unwrap());
        assert_eq!(message.sender, sender());
        assert_eq!(message.subject(), "Supermarket - your order (2 items)");
    }

    #[tokio::test]
    async fn test_dispatch_sends_once() {
        let mailer = Arc::new(RecordingMailer::default());
        let notifier = CheckoutNotifier::new(mailer.clone(), sender());
        let message = notifier.prepare("Ada", Email::parse("ada@example.com").unwrap(), snapshot());

        notifier.dispatch(&message).await.unwrap();
        assert_eq!(mailer.sent.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_dispatch_failure_is_not_retried() {
        let mailer = Arc::new(RecordingMailer {
            fail: true,
            ..RecordingMailer::default()
        });
        let notifier = CheckoutNotifier::new(mailer.clone(), sender());
        let message = notifier.prepare("Ada", Email::parse("ada@example.com").unwrap(), snapshot());

        let err = notifier.dispatch(&message).await.unwrap_err();
        assert_eq!(err, NotifyError::Transport("connection reset".to_string()));
        assert_eq!(mailer.sent.lock().unwrap().len(), 1);
    }
}
