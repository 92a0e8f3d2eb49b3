//! Cart line items and point-in-time snapshots of them.

use serde::{Deserialize, Serialize};

use crate::{CartItemId, Price, ProductId};

/// A single line in the shopping cart.
///
/// Every line holds exactly one unit of a product. Only `id` and
/// `product_price` mean anything to the cart logic; the remaining fields are
/// carried through for display and for the checkout email.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    /// Cart entry ID, unique within a cart.
    pub id: CartItemId,
    /// Referenced product.
    pub product_id: ProductId,
    /// Product title shown in the cart list.
    #[serde(default)]
    pub product_title: String,
    /// Product image URL.
    #[serde(default)]
    pub product_image: Option<String>,
    /// Unit price.
    pub product_price: Price,
}

impl CartItem {
    /// Create a cart line with no display attributes.
    #[must_use]
    pub fn new(id: impl Into<CartItemId>, product_id: impl Into<ProductId>, price: Price) -> Self {
        Self {
            id: id.into(),
            product_id: product_id.into(),
            product_title: String::new(),
            product_image: None,
            product_price: price,
        }
    }

    /// Set the product title.
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.product_title = title.into();
        self
    }
}

/// An ordered, owned copy of cart items at one point in time.
///
/// Snapshots are handed out for dispatch and stored in a successful load
/// status; later changes to the live cart never reach them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CartSnapshot(Vec<CartItem>);

impl CartSnapshot {
    /// Create an empty snapshot.
    #[must_use]
    pub const fn empty() -> Self {
        Self(Vec::new())
    }

    /// Items in arrival order.
    #[must_use]
    pub fn items(&self) -> &[CartItem] {
        &self.0
    }

    /// Number of items.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if the snapshot holds no items.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Sum of all unit prices, zero when empty.
    #[must_use]
    pub fn total(&self) -> Price {
        self.0.iter().map(|item| item.product_price).sum()
    }

    /// Iterate over the items.
    pub fn iter(&self) -> std::slice::Iter<'_, CartItem> {
        self.0.iter()
    }

    /// Consume the snapshot and return its items.
    #[must_use]
    pub fn into_vec(self) -> Vec<CartItem> {
        self.0
    }
}

impl From<Vec<CartItem>> for CartSnapshot {
    fn from(items: Vec<CartItem>) -> Self {
        Self(items)
    }
}

impl<'a> IntoIterator for &'a CartSnapshot {
    type Item = &'a CartItem;
    type IntoIter = std::slice::Iter<'a, CartItem>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
