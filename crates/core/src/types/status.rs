//! Load and view state enums for the cart screen.
//!
//! Both are tagged variants rather than independent flags, so "loading and
//! populated at the same time" cannot be represented.

use serde::{Deserialize, Serialize};

use crate::{CartSnapshot, Price};

/// Outcome of the most recent cart load.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "status", content = "items", rename_all = "snake_case")]
pub enum LoadStatus {
    /// No load has been started yet.
    #[default]
    Idle,
    /// A fetch is in flight.
    Loading,
    /// The fetch returned at least one item.
    ///
    /// Holds the items as delivered. Later deletions change the cart store,
    /// not this copy.
    Succeeded(CartSnapshot),
    /// The fetch failed.
    Failed,
    /// The fetch returned no data or an empty list.
    EmptySucceeded,
}

impl LoadStatus {
    /// Returns `true` while a fetch is in flight.
    #[must_use]
    pub const fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }
}

/// What the cart screen should show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ViewState {
    /// Spinner; no list, no button.
    Loading,
    /// Empty-cart message with a "start shopping" button.
    Empty,
    /// Cart list with a checkout button showing the running total.
    Populated {
        /// Sum of all item prices.
        total: Price,
    },
}

impl ViewState {
    /// Caption for the screen's action button, if it is visible.
    #[must_use]
    pub fn button_label(&self) -> Option<String> {
        match self {
            Self::Loading => None,
            Self::Empty => Some("Start shopping".to_owned()),
            Self::Populated { total } => Some(format!("Checkout: {}", total.display())),
        }
    }
}

impl std::fmt::Display for ViewState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Loading => write!(f, "loading"),
            Self::Empty => write!(f, "empty"),
            Self::Populated { total } => write!(f, "populated ({total})"),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_idle() {
        assert_eq!(LoadStatus::default(), LoadStatus::Idle);
        assert!(!LoadStatus::Idle.is_loading());
        assert!(LoadStatus::Loading.is_loading());
    }

    #[test]
    fn test_button_label() {
        let populated = ViewState::Populated {
            total: Price::from_cents(550).unwrap(),
        };
        assert_eq!(populated.button_label().as_deref(), Some("Checkout: 5.50"));
        assert_eq!(
            ViewState::Empty.button_label().as_deref(),
            Some("Start shopping")
        );
        assert_eq!(ViewState::Loading.button_label(), None);
    }

    #[test]
    fn test_view_state_serializes_tagged() {
        let json = serde_json::to_string(&ViewState::Empty).unwrap();
        assert_eq!(json, r#"{"state":"empty"}"#);
    }
}
