//! One asynchronous cart fetch per view activation.
//!
//! The controller never performs I/O. [`CartLoadController::start`] hands out
//! a [`LoadTicket`] that authorises exactly one fetch; the caller runs the
//! fetch wherever it likes and brings the result back to
//! [`CartLoadController::complete`] together with the ticket. A ticket that no
//! longer matches the controller (torn down, or superseded) is discarded.

use supermarket_core::{CartItem, LoadStatus};

use crate::error::LoadError;
use crate::store::CartStore;

/// Permission to run one fetch, issued by [`CartLoadController::start`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use = "a ticket authorises a fetch that must be issued"]
pub struct LoadTicket {
    generation: u64,
}

/// What applying a fetch result did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    /// The cart now holds this many items.
    Loaded(usize),
    /// The source had no items; the cart was cleared.
    Empty,
    /// The fetch failed; the cart was left as it was.
    Failed(LoadError),
    /// The result belonged to a stale ticket and was dropped.
    Discarded,
}

/// Drives the load lifecycle and owns the current [`LoadStatus`].
#[derive(Debug, Default)]
pub struct CartLoadController {
    status: LoadStatus,
    generation: u64,
    torn_down: bool,
}

impl CartLoadController {
    /// Create a controller that has not started loading.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current load status.
    #[must_use]
    pub const fn status(&self) -> &LoadStatus {
        &self.status
    }

    /// Returns `true` once [`teardown`](Self::teardown) has been called.
    #[must_use]
    pub const fn is_torn_down(&self) -> bool {
        self.torn_down
    }

    /// Move to `Loading` and authorise one fetch.
    ///
    /// Returns `None` without changing anything if a fetch is already in
    /// flight or the controller has been torn down, so rapid re-entry never
    /// issues duplicate requests.
    pub fn start(&mut self) -> Option<LoadTicket> {
        if self.torn_down || self.status.is_loading() {
            return None;
        }
        self.generation += 1;
        self.status = LoadStatus::Loading;
        Some(LoadTicket {
            generation: self.generation,
        })
    }

    /// Apply the result of the fetch authorised by `ticket`.
    ///
    /// Non-empty results replace the cart; `None` or an empty list clears
    /// it. Errors leave the cart untouched so a failed reload never wipes a
    /// cart that loaded earlier.
    pub fn complete(
        &mut self,
        ticket: LoadTicket,
        result: Result<Option<Vec<CartItem>>, LoadError>,
        store: &mut CartStore,
    ) -> LoadOutcome {
        if self.torn_down || ticket.generation != self.generation || !self.status.is_loading() {
            return LoadOutcome::Discarded;
        }

        match result {
            Ok(Some(items)) if !items.is_empty() => {
                store.replace(Some(items));
                self.status = LoadStatus::Succeeded(store.snapshot());
                LoadOutcome::Loaded(store.count())
            }
            Ok(_) => {
                store.clear();
                self.status = LoadStatus::EmptySucceeded;
                LoadOutcome::Empty
            }
            Err(err) => {
                self.status = LoadStatus::Failed;
                LoadOutcome::Failed(err)
            }
        }
    }

    /// Stop accepting results. Any fetch still in flight will be discarded
    /// when it completes.
    pub fn teardown(&mut self) {
        self.torn_down = true;
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use supermarket_core::Price;

    use super::*;

    fn items(n: usize) -> Vec<CartItem> {
        (0..n)
            .map(|i| CartItem::new(i.to_string(), "p", Price::from_cents(100).unwrap()))
            .collect()
    }

    #[test]
    fn test_start_moves_to_loading() {
        let mut loader = CartLoadController::new();
        assert_eq!(loader.status(), &LoadStatus::Idle);
        assert!(loader.start().is_some());
        assert_eq!(loader.status(), &LoadStatus::Loading);
    }

    #[test]
    fn test_start_while_loading_is_noop() {
        let mut loader = CartLoadController::new();
        let first = loader.start();
        assert!(first.is_some());
        assert!(loader.start().is_none());
        assert_eq!(loader.status(), &LoadStatus::Loading);
    }

    #[test]
    fn test_complete_with_items_succeeds() {
        let mut loader = CartLoadController::new();
        let mut store = CartStore::new();
        let ticket = loader.start().unwrap();

        let outcome = loader.complete(ticket, Ok(Some(items(2))), &mut store);
        assert_eq!(outcome, LoadOutcome::Loaded(2));
        assert_eq!(store.count(), 2);
        assert!(matches!(loader.status(), LoadStatus::Succeeded(items) if items.len() == 2));
    }

    #[test]
    fn test_complete_with_none_or_empty_clears() {
        for result in [None, Some(Vec::new())] {
            let mut loader = CartLoadController::new();
            let mut store = CartStore::new();
            store.replace(Some(items(1)));
            let ticket = loader.start().unwrap();

            let outcome = loader.complete(ticket, Ok(result), &mut store);
            assert_eq!(outcome, LoadOutcome::Empty);
            assert_eq!(loader.status(), &LoadStatus::EmptySucceeded);
            assert!(store.is_empty());
        }
    }

    #[test]
    fn test_failed_reload_preserves_cart() {
        let mut loader = CartLoadController::new();
        let mut store = CartStore::new();
        let ticket = loader.start().unwrap();
        loader.complete(ticket, Ok(Some(items(3))), &mut store);

        let ticket = loader.start().unwrap();
        let err = LoadError::Transport("offline".to_string());
        let outcome = loader.complete(ticket, Err(err.clone()), &mut store);

        assert_eq!(outcome, LoadOutcome::Failed(err));
        assert_eq!(loader.status(), &LoadStatus::Failed);
        assert_eq!(store.count(), 3);
    }

    #[test]
    fn test_can_restart_after_completion() {
        let mut loader = CartLoadController::new();
        let mut store = CartStore::new();
        let ticket = loader.start().unwrap();
        loader.complete(ticket, Ok(None), &mut store);
        assert!(loader.start().is_some());
    }

    #[test]
    fn test_result_after_teardown_is_discarded() {
        let mut loader = CartLoadController::new();
        let mut store = CartStore::new();
        let ticket = loader.start().unwrap();
        loader.teardown();

        let outcome = loader.complete(ticket, Ok(Some(items(2))), &mut store);
        assert_eq!(outcome, LoadOutcome::Discarded);
        assert!(store.is_empty());
        assert!(loader.start().is_none());
    }

    #[test]
    fn test_stale_ticket_is_discarded() {
        let mut loader = CartLoadController::new();
        let mut store = CartStore::new();
        let stale = loader.start().unwrap();
        loader.complete(stale, Ok(None), &mut store);
        let _current = loader.start().unwrap();

        let outcome = loader.complete(stale, Ok(Some(items(1))), &mut store);
        assert_eq!(outcome, LoadOutcome::Discarded);
        assert_eq!(loader.status(), &LoadStatus::Loading);
        assert!(store.is_empty());
    }
}
