//! Supermarket Cart - the shopping-cart subsystem.
//!
//! Everything between the cart screen and the two services it talks to:
//! loading the cart, keeping a running total, deleting lines, and sending
//! the checkout email. Rendering is left to whichever presentation layer
//! consumes [`CartEvent`]s.
//!
//! # Architecture
//!
//! - [`CartStore`] - the live, ordered list of cart items
//! - [`CartLoadController`] - one fetch per activation, tracked as a
//!   [`LoadStatus`](supermarket_core::LoadStatus)
//! - [`ViewStateProjector`] - pure derivation of the
//!   [`ViewState`](supermarket_core::ViewState)
//! - [`CheckoutNotifier`] - builds and sends the checkout email once
//! - [`CartSession`] - owns the above, spawns the async work and applies its
//!   results on a single logical thread
//!
//! External services are reached through the [`CartSource`] and
//! [`CheckoutMailer`] traits.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod checkout;
pub mod error;
pub mod loader;
pub mod ports;
pub mod projector;
pub mod session;
pub mod store;

pub use checkout::{CheckoutMessage, CheckoutNotifier, SenderIdentity};
pub use error::{CartError, LoadError, NotifyError};
pub use loader::{CartLoadController, LoadOutcome, LoadTicket};
pub use ports::{CartSource, CheckoutMailer};
pub use projector::ViewStateProjector;
pub use session::{CartCommand, CartEvent, CartSession};
pub use store::CartStore;
