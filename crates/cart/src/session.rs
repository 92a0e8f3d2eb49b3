//! A cart screen's logical execution context.
//!
//! [`CartSession`] owns the store, the load controller and the checkout
//! notifier. Requests from the presentation layer run synchronously on
//! `&mut self`. The slow parts (fetching the cart, deleting a line remotely,
//! sending the checkout email) run as spawned tokio tasks whose results come
//! back over a channel and are only applied when the session processes them,
//! so the cart is never mutated from two places at once.
//!
//! # Example
//!
//! ```rust,ignore
//! let (mut session, mut events) = CartSession::new(source, notifier);
//! session.request_load()?;
//! session.settle().await;
//!
//! while let Ok(event) = events.try_recv() {
//!     render(event);
//! }
//! ```

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::instrument;

use supermarket_core::{CartItem, CartItemId, Email, LoadStatus, ViewState};

use crate::checkout::CheckoutNotifier;
use crate::error::{CartError, LoadError, NotifyError};
use crate::loader::{CartLoadController, LoadOutcome, LoadTicket};
use crate::ports::CartSource;
use crate::projector::ViewStateProjector;
use crate::store::CartStore;

/// Signals for the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CartEvent {
    /// The view state was recomputed.
    ViewStateChanged(ViewState),
    /// The cart could not be loaded. Shown once, never replayed.
    LoadFailureNotice,
    /// The checkout email could not be sent. Shown once, never replayed.
    CheckoutFailureNotice,
    /// The checkout email was accepted by the mailer.
    CheckoutSent,
}

/// Requests accepted by [`CartSession::run`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CartCommand {
    /// Load (or reload) the cart.
    Load,
    /// Delete one line.
    Delete(CartItemId),
    /// Send the checkout email for the current cart.
    Checkout {
        /// Recipient's display name.
        user_name: String,
        /// Recipient's address.
        user_email: Email,
    },
}

/// Results of spawned work, applied back on the session.
#[derive(Debug)]
enum Completion {
    Loaded {
        ticket: LoadTicket,
        result: Result<Option<Vec<CartItem>>, LoadError>,
    },
    Deleted {
        id: CartItemId,
        result: Result<(), LoadError>,
    },
    CheckoutDispatched(Result<(), NotifyError>),
}

/// The cart subsystem for one view activation.
pub struct CartSession {
    source: Arc<dyn CartSource>,
    notifier: Option<CheckoutNotifier>,
    store: CartStore,
    loader: CartLoadController,
    events: mpsc::UnboundedSender<CartEvent>,
    completion_tx: mpsc::UnboundedSender<Completion>,
    completion_rx: mpsc::UnboundedReceiver<Completion>,
    in_flight: usize,
}

impl CartSession {
    /// Create a session and the receiver for its events.
    #[must_use]
    pub fn new(
        source: Arc<dyn CartSource>,
        notifier: CheckoutNotifier,
    ) -> (Self, mpsc::UnboundedReceiver<CartEvent>) {
        Self::open(source, Some(notifier))
    }

    /// Create a session that can load and delete but not check out.
    ///
    /// [`request_checkout`](Self::request_checkout) returns
    /// [`CartError::CheckoutUnavailable`].
    #[must_use]
    pub fn without_checkout(
        source: Arc<dyn CartSource>,
    ) -> (Self, mpsc::UnboundedReceiver<CartEvent>) {
        Self::open(source, None)
    }

    fn open(
        source: Arc<dyn CartSource>,
        notifier: Option<CheckoutNotifier>,
    ) -> (Self, mpsc::UnboundedReceiver<CartEvent>) {
        let (events, events_rx) = mpsc::unbounded_channel();
        let (completion_tx, completion_rx) = mpsc::unbounded_channel();

        let session = Self {
            source,
            notifier,
            store: CartStore::new(),
            loader: CartLoadController::new(),
            events,
            completion_tx,
            completion_rx,
            in_flight: 0,
        };
        (session, events_rx)
    }

    /// Read-only view of the cart.
    #[must_use]
    pub const fn store(&self) -> &CartStore {
        &self.store
    }

    /// Current load status.
    #[must_use]
    pub const fn load_status(&self) -> &LoadStatus {
        self.loader.status()
    }

    /// Current view state.
    #[must_use]
    pub fn view_state(&self) -> ViewState {
        ViewStateProjector::project(self.loader.status(), &self.store)
    }

    /// Number of spawned operations whose results have not been applied.
    #[must_use]
    pub const fn in_flight(&self) -> usize {
        self.in_flight
    }

    /// Returns `true` once the session has been torn down.
    #[must_use]
    pub const fn is_closed(&self) -> bool {
        self.loader.is_torn_down()
    }

    /// Start loading the cart.
    ///
    /// Does nothing if a load is already in flight. Must be called inside a
    /// tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::Closed`] after [`teardown`](Self::teardown).
    #[instrument(skip(self))]
    pub fn request_load(&mut self) -> Result<(), CartError> {
        self.ensure_open()?;
        let Some(ticket) = self.loader.start() else {
            tracing::debug!("Cart load already in flight");
            return Ok(());
        };
        // A cart emptied by deletion shows `Loading` again once a new load starts.
        if self.store.emptied_by_removal() {
            self.store.clear();
        }

        let source = Arc::clone(&self.source);
        self.spawn(async move {
            let result = source.fetch_cart_items().await;
            Completion::Loaded { ticket, result }
        });
        self.emit_view_state();
        Ok(())
    }

    /// Delete a line from the cart.
    ///
    /// The line disappears locally right away and the view state is
    /// re-projected; the remote delete runs in the background and its
    /// outcome is only logged. Unknown ids are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::Closed`] after [`teardown`](Self::teardown).
    #[instrument(skip(self, id), fields(id = %id))]
    pub fn request_delete(&mut self, id: &CartItemId) -> Result<(), CartError> {
        self.ensure_open()?;
        if self.store.remove(id).is_none() {
            tracing::debug!("Ignoring delete for item not in cart");
            return Ok(());
        }

        let source = Arc::clone(&self.source);
        let id = id.clone();
        self.spawn(async move {
            let result = source.delete_cart_item(&id).await;
            Completion::Deleted { id, result }
        });
        self.emit_view_state();
        Ok(())
    }

    /// Send the checkout email for the cart as it is right now.
    ///
    /// The message is built from a snapshot taken before this returns;
    /// deleting items afterwards does not change what is sent. The outcome
    /// arrives later as [`CartEvent::CheckoutSent`] or
    /// [`CartEvent::CheckoutFailureNotice`].
    ///
    /// # Errors
    ///
    /// Returns [`CartError::Closed`] after [`teardown`](Self::teardown),
    /// [`CartError::CheckoutUnavailable`] for a session opened with
    /// [`without_checkout`](Self::without_checkout) and
    /// [`CartError::EmptyCart`] if there is nothing to check out.
    #[instrument(skip(self, user_email))]
    pub fn request_checkout(&mut self, user_name: &str, user_email: Email) -> Result<(), CartError> {
        self.ensure_open()?;
        let notifier = self
            .notifier
            .clone()
            .ok_or(CartError::CheckoutUnavailable)?;
        if self.store.is_empty() {
            return Err(CartError::EmptyCart);
        }

        let message = notifier.prepare(user_name, user_email, self.store.snapshot());
        self.spawn(async move {
            Completion::CheckoutDispatched(notifier.dispatch(&message).await)
        });
        Ok(())
    }

    /// Wait for the next spawned operation to finish and apply its result.
    ///
    /// Returns `false` straight away when nothing is in flight or the session
    /// is closed.
    pub async fn process_next(&mut self) -> bool {
        if self.is_closed() || self.in_flight == 0 {
            return false;
        }
        match self.completion_rx.recv().await {
            Some(completion) => {
                self.apply(completion);
                true
            }
            None => false,
        }
    }

    /// Apply results until nothing is in flight.
    pub async fn settle(&mut self) {
        while self.process_next().await {}
    }

    /// Close the session.
    ///
    /// Work still in flight keeps running, but its results are dropped and
    /// no further events are emitted.
    #[instrument(skip(self))]
    pub fn teardown(&mut self) {
        if self.is_closed() {
            return;
        }
        self.loader.teardown();
        self.completion_rx.close();
        self.in_flight = 0;
        tracing::debug!("Cart session torn down");
    }

    /// Serve `commands` until the channel closes, then tear down.
    ///
    /// Commands and completed work are handled one at a time on this task.
    pub async fn run(mut self, mut commands: mpsc::Receiver<CartCommand>) {
        loop {
            tokio::select! {
                command = commands.recv() => match command {
                    Some(command) => self.handle(command),
                    None => break,
                },
                Some(completion) = self.completion_rx.recv(), if self.in_flight > 0 => {
                    self.apply(completion);
                }
            }
        }
        self.teardown();
    }

    fn handle(&mut self, command: CartCommand) {
        let result = match command {
            CartCommand::Load => self.request_load(),
            CartCommand::Delete(id) => self.request_delete(&id),
            CartCommand::Checkout {
                user_name,
                user_email,
            } => self.request_checkout(&user_name, user_email),
        };
        if let Err(e) = result {
            tracing::warn!(error = %e, "Cart command rejected");
        }
    }

    fn apply(&mut self, completion: Completion) {
        self.in_flight = self.in_flight.saturating_sub(1);
        match completion {
            Completion::Loaded { ticket, result } => {
                match self.loader.complete(ticket, result, &mut self.store) {
                    LoadOutcome::Loaded(count) => {
                        tracing::info!(count, total = %self.store.total(), "Cart loaded");
                    }
                    LoadOutcome::Empty => tracing::info!("Cart is empty"),
                    LoadOutcome::Failed(e) => {
                        tracing::warn!(error = %e, "Could not load cart");
                        self.emit(CartEvent::LoadFailureNotice);
                    }
                    LoadOutcome::Discarded => {
                        tracing::warn!("Dropping stale cart load result");
                        return;
                    }
                }
                self.emit_view_state();
            }
            Completion::Deleted { id, result } => match result {
                Ok(()) => tracing::debug!(%id, "Cart item deleted remotely"),
                Err(e) => tracing::warn!(%id, error = %e, "Failed to delete cart item remotely"),
            },
            Completion::CheckoutDispatched(result) => match result {
                Ok(()) => self.emit(CartEvent::CheckoutSent),
                Err(_) => self.emit(CartEvent::CheckoutFailureNotice),
            },
        }
    }

    fn spawn<F>(&mut self, work: F)
    where
        F: Future<Output = Completion> + Send + 'static,
    {
        let tx = self.completion_tx.clone();
        self.in_flight += 1;
        tokio::spawn(async move {
            // The receiver is gone once the session is torn down.
            let _ = tx.send(work.await);
        });
    }

    fn emit_view_state(&self) {
        self.emit(CartEvent::ViewStateChanged(self.view_state()));
    }

    fn emit(&self, event: CartEvent) {
        if self.events.send(event).is_err() {
            tracing::debug!("Cart event receiver dropped");
        }
    }

    const fn ensure_open(&self) -> Result<(), CartError> {
        if self.is_closed() {
            Err(CartError::Closed)
        } else {
            Ok(())
        }
    }
}

impl std::fmt::Debug for CartSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CartSession")
            .field("store", &self.store)
            .field("loader", &self.loader)
            .field("in_flight", &self.in_flight)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use supermarket_core::Price;

    use super::*;
    use crate::checkout::{CheckoutMessage, SenderIdentity};
    use crate::ports::CheckoutMailer;

    struct FixedSource {
        items: Mutex<Result<Option<Vec<CartItem>>, LoadError>>,
        fetches: AtomicUsize,
    }

    impl FixedSource {
        fn new(result: Result<Option<Vec<CartItem>>, LoadError>) -> Arc<Self> {
            Arc::new(Self {
                items: Mutex::new(result),
                fetches: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl CartSource for FixedSource {
        async fn fetch_cart_items(&self) -> Result<Option<Vec<CartItem>>, LoadError> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            self.items.lock().unwrap().clone()
        }

        async fn delete_cart_item(&self, _id: &CartItemId) -> Result<(), LoadError> {
            Ok(())
        }
    }

    struct NullMailer;

    #[async_trait]
    impl CheckoutMailer for NullMailer {
        async fn send_checkout_email(&self, _message: &CheckoutMessage) -> Result<(), NotifyError> {
            Ok(())
        }
    }

    fn notifier() -> CheckoutNotifier {
        CheckoutNotifier::new(
            Arc::new(NullMailer),
            SenderIdentity {
                name: "Supermarket".to_string(),
                address: Email::parse("orders@supermarket.example").unwrap(),
            },
        )
    }

    fn item(id: &str, cents: i64) -> CartItem {
        CartItem::new(id, "p", Price::from_cents(cents).unwrap())
    }

    fn drain(events: &mut mpsc::UnboundedReceiver<CartEvent>) -> Vec<CartEvent> {
        std::iter::from_fn(|| events.try_recv().ok()).collect()
    }

    #[tokio::test]
    async fn test_load_emits_loading_then_populated() {
        let source = FixedSource::new(Ok(Some(vec![item("1", 250)])));
        let (mut session, mut events) = CartSession::new(source, notifier());

        session.request_load().unwrap();
        session.settle().await;

        assert_eq!(
            drain(&mut events),
            [
                CartEvent::ViewStateChanged(ViewState::Loading),
                CartEvent::ViewStateChanged(ViewState::Populated {
                    total: Price::from_cents(250).unwrap()
                }),
            ]
        );
    }

    #[tokio::test]
    async fn test_repeated_load_fetches_once() {
        let source = FixedSource::new(Ok(None));
        let (mut session, _events) = CartSession::new(source.clone(), notifier());

        session.request_load().unwrap();
        session.request_load().unwrap();
        assert_eq!(session.in_flight(), 1);
        session.settle().await;

        assert_eq!(source.fetches.load(Ordering::SeqCst), 1);
        assert_eq!(session.load_status(), &LoadStatus::EmptySucceeded);
    }

    #[tokio::test]
    async fn test_delete_unknown_id_emits_nothing() {
        let source = FixedSource::new(Ok(Some(vec![item("1", 100)])));
        let (mut session, mut events) = CartSession::new(source, notifier());
        session.request_load().unwrap();
        session.settle().await;
        drain(&mut events);

        session.request_delete(&CartItemId::new("nope")).unwrap();
        assert!(drain(&mut events).is_empty());
        assert_eq!(session.store().count(), 1);
    }

    #[tokio::test]
    async fn test_checkout_rejects_empty_cart() {
        let source = FixedSource::new(Ok(None));
        let (mut session, _events) = CartSession::new(source, notifier());
        session.request_load().unwrap();
        session.settle().await;

        let email = Email::parse("ada@example.com").unwrap();
        assert_eq!(
            session.request_checkout("Ada", email),
            Err(CartError::EmptyCart)
        );
    }

    #[tokio::test]
    async fn test_session_without_checkout_rejects_checkout() {
        let source = FixedSource::new(Ok(Some(vec![item("1", 100)])));
        let (mut session, _events) = CartSession::without_checkout(source);
        session.request_load().unwrap();
        session.settle().await;
        assert_eq!(session.store().count(), 1);

        let email = Email::parse("ada@example.com").unwrap();
        assert_eq!(
            session.request_checkout("Ada", email),
            Err(CartError::CheckoutUnavailable)
        );
        assert_eq!(session.in_flight(), 0);
    }

    #[tokio::test]
    async fn test_requests_after_teardown_are_rejected() {
        let source = FixedSource::new(Ok(None));
        let (mut session, _events) = CartSession::new(source, notifier());
        session.teardown();

        assert_eq!(session.request_load(), Err(CartError::Closed));
        assert_eq!(
            session.request_delete(&CartItemId::new("1")),
            Err(CartError::Closed)
        );
        assert!(!session.process_next().await);
    }

    #[tokio::test]
    async fn test_run_serves_commands_until_closed() {
        let source = FixedSource::new(Ok(Some(vec![item("1", 100), item("2", 200)])));
        let (session, mut events) = CartSession::new(source, notifier());
        let (tx, rx) = mpsc::channel(8);
        let handle = tokio::spawn(session.run(rx));

        tx.send(CartCommand::Load).await.unwrap();
        // Wait for the populated state before deleting.
        loop {
            let event = events.recv().await.unwrap();
            if matches!(event, CartEvent::ViewStateChanged(ViewState::Populated { .. })) {
                break;
            }
        }
        tx.send(CartCommand::Delete(CartItemId::new("1"))).await.unwrap();
        assert_eq!(
            events.recv().await.unwrap(),
            CartEvent::ViewStateChanged(ViewState::Populated {
                total: Price::from_cents(200).unwrap()
            })
        );

        drop(tx);
        handle.await.unwrap();
    }
}
