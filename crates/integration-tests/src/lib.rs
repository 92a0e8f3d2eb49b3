//! Integration tests for the Supermarket cart.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p supermarket-integration-tests
//! ```
//!
//! No network or mail server is needed: the fakes below stand in for the
//! cart data service and the SMTP relay.
//!
//! - [`ScriptedSource`] - replays queued fetch results, optionally holding
//!   each fetch until the test releases it
//! - [`RecordingMailer`] - keeps every checkout message it is asked to send

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, PoisonError};

use async_trait::async_trait;
use supermarket_cart::{
    CartEvent, CartSession, CartSource, CheckoutMailer, CheckoutMessage, CheckoutNotifier,
    LoadError, NotifyError, SenderIdentity,
};
use supermarket_core::{CartItem, CartItemId, Email, Price};
use tokio::sync::{Semaphore, mpsc};

/// What a single cart fetch returns.
pub type FetchResult = Result<Option<Vec<CartItem>>, LoadError>;

// =============================================================================
// Fakes
// =============================================================================

/// Cart source that answers fetches from a queue.
///
/// Once the queue runs dry every fetch returns `Ok(None)`.
#[derive(Debug)]
pub struct ScriptedSource {
    responses: Mutex<VecDeque<FetchResult>>,
    gate: Option<Semaphore>,
    fetches: AtomicUsize,
    finished: AtomicUsize,
    deleted: Mutex<Vec<CartItemId>>,
}

impl ScriptedSource {
    /// A source whose fetches answer immediately.
    #[must_use]
    pub fn new(responses: impl IntoIterator<Item = FetchResult>) -> Arc<Self> {
        Arc::new(Self::build(responses, None))
    }

    /// A source whose fetches wait for [`release`](Self::release).
    #[must_use]
    pub fn gated(responses: impl IntoIterator<Item = FetchResult>) -> Arc<Self> {
        Arc::new(Self::build(responses, Some(Semaphore::new(0))))
    }

    fn build(responses: impl IntoIterator<Item = FetchResult>, gate: Option<Semaphore>) -> Self {
        Self {
            responses: Mutex::new(responses.into_iter().collect()),
            gate,
            fetches: AtomicUsize::new(0),
            finished: AtomicUsize::new(0),
            deleted: Mutex::new(Vec::new()),
        }
    }

    /// Let one held fetch return.
    pub fn release(&self) {
        if let Some(gate) = &self.gate {
            gate.add_permits(1);
        }
    }

    /// Number of fetches started.
    #[must_use]
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    /// Number of fetches that have produced their result.
    #[must_use]
    pub fn finished_count(&self) -> usize {
        self.finished.load(Ordering::SeqCst)
    }

    /// Ids passed to `delete_cart_item`, in call order.
    #[must_use]
    pub fn deleted(&self) -> Vec<CartItemId> {
        self.deleted
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl CartSource for ScriptedSource {
    async fn fetch_cart_items(&self) -> FetchResult {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.gate
            && let Ok(permit) = gate.acquire().await
        {
            permit.forget();
        }
        let result = self
            .responses
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
            .unwrap_or(Ok(None));
        self.finished.fetch_add(1, Ordering::SeqCst);
        result
    }

    async fn delete_cart_item(&self, id: &CartItemId) -> Result<(), LoadError> {
        self.deleted
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(id.clone());
        Ok(())
    }
}

/// Mailer that records messages instead of sending them.
#[derive(Debug, Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<CheckoutMessage>>,
    fail: bool,
}

impl RecordingMailer {
    /// A mailer that accepts every message.
    #[must_use]
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// A mailer that records every message and then reports a transport
    /// failure.
    #[must_use]
    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            sent: Mutex::new(Vec::new()),
            fail: true,
        })
    }

    /// Messages handed to the mailer so far.
    #[must_use]
    pub fn sent(&self) -> Vec<CheckoutMessage> {
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl CheckoutMailer for RecordingMailer {
    async fn send_checkout_email(&self, message: &CheckoutMessage) -> Result<(), NotifyError> {
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(message.clone());
        if self.fail {
            Err(NotifyError::Transport("connection refused".to_string()))
        } else {
            Ok(())
        }
    }
}

// =============================================================================
// Helpers
// =============================================================================

/// Price from a whole number of cents.
///
/// # Panics
///
/// Panics on negative input.
#[must_use]
#[allow(clippy::unwrap_used)]
pub fn price(cents: i64) -> Price {
    Price::from_cents(cents).unwrap()
}

/// Cart item with a generated product id.
#[must_use]
pub fn item(id: &str, cents: i64) -> CartItem {
    CartItem::new(id, format!("product-{id}"), price(cents))
}

/// Parse an address known to be valid.
///
/// # Panics
///
/// Panics if `address` is not a valid email.
#[must_use]
#[allow(clippy::unwrap_used)]
pub fn email(address: &str) -> Email {
    Email::parse(address).unwrap()
}

/// Open a session backed by the given fakes.
#[must_use]
pub fn open_session(
    source: Arc<ScriptedSource>,
    mailer: Arc<RecordingMailer>,
) -> (CartSession, mpsc::UnboundedReceiver<CartEvent>) {
    let notifier = CheckoutNotifier::new(
        mailer,
        SenderIdentity {
            name: "Supermarket".to_string(),
            address: email("orders@supermarket.example"),
        },
    );
    CartSession::new(source, notifier)
}

/// Take every event currently queued.
pub fn drain(events: &mut mpsc::UnboundedReceiver<CartEvent>) -> Vec<CartEvent> {
    std::iter::from_fn(|| events.try_recv().ok()).collect()
}
