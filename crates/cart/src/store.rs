//! The live list of items in the cart.

use std::collections::HashSet;

use supermarket_core::{CartItem, CartItemId, CartSnapshot, Price};

/// Holds the cart's items in arrival order.
///
/// The store is the only owner of the live item list. Readers get a borrowed
/// slice via [`items`](Self::items) or an owned [`CartSnapshot`].
#[derive(Debug, Clone, Default)]
pub struct CartStore {
    items: Vec<CartItem>,
    emptied_by_removal: bool,
}

impl CartStore {
    /// Create an empty store.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            items: Vec::new(),
            emptied_by_removal: false,
        }
    }

    /// Replace the whole cart. `None` empties it.
    ///
    /// Ids must be unique within a cart: if the source repeats one, the first
    /// occurrence wins and later ones are dropped.
    pub fn replace(&mut self, items: Option<Vec<CartItem>>) {
        self.clear();
        let Some(items) = items else {
            return;
        };

        let mut seen = HashSet::with_capacity(items.len());
        for item in items {
            if seen.insert(item.id.clone()) {
                self.items.push(item);
            } else {
                tracing::warn!(id = %item.id, "Dropping cart item with duplicate id");
            }
        }
    }

    /// Empty the cart.
    pub fn clear(&mut self) {
        self.items.clear();
        self.emptied_by_removal = false;
    }

    /// Remove the item with `id`, keeping the others in order.
    ///
    /// Returns the removed item, or `None` if no item had that id.
    pub fn remove(&mut self, id: &CartItemId) -> Option<CartItem> {
        let index = self.items.iter().position(|item| &item.id == id)?;
        let removed = self.items.remove(index);
        self.emptied_by_removal = self.items.is_empty();
        Some(removed)
    }

    /// Returns `true` if the last [`remove`](Self::remove) took the cart to
    /// zero items and nothing has been loaded into it since.
    #[must_use]
    pub const fn emptied_by_removal(&self) -> bool {
        self.emptied_by_removal
    }

    /// Sum of all unit prices; zero for an empty cart.
    #[must_use]
    pub fn total(&self) -> Price {
        self.items.iter().map(|item| item.product_price).sum()
    }

    /// Number of items.
    #[must_use]
    pub fn count(&self) -> usize {
        self.items.len()
    }

    /// Returns `true` if the cart has no items.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Items in order.
    #[must_use]
    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    /// Owned copy of the current items.
    #[must_use]
    pub fn snapshot(&self) -> CartSnapshot {
        CartSnapshot::from(self.items.clone())
    }
}
