//! Derives what the cart screen shows from the load status and the store.

use supermarket_core::{LoadStatus, ViewState};

use crate::store::CartStore;

/// Pure mapping from `(LoadStatus, CartStore)` to [`ViewState`].
///
/// Re-run after every load completion and every deletion; it holds no state
/// of its own, so the result never depends on call history.
#[derive(Debug, Clone, Copy, Default)]
pub struct ViewStateProjector;

impl ViewStateProjector {
    /// Project the current view state.
    ///
    /// A failed load keeps showing whatever the cart already held, which is
    /// `Empty` unless an earlier load succeeded. Deleting the last item shows
    /// `Empty` straight away, even while a reload is still in flight.
    #[must_use]
    pub fn project(status: &LoadStatus, store: &CartStore) -> ViewState {
        match status {
            LoadStatus::Idle | LoadStatus::Loading if store.emptied_by_removal() => {
                ViewState::Empty
            }
            LoadStatus::Idle | LoadStatus::Loading => ViewState::Loading,
            LoadStatus::EmptySucceeded => ViewState::Empty,
            LoadStatus::Succeeded(_) | LoadStatus::Failed => {
                if store.is_empty() {
                    ViewState::Empty
                } else {
                    ViewState::Populated {
                        total: store.total(),
                    }
                }
            }
        }
    }
}
