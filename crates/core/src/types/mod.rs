//! Core types for the Supermarket cart.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod cart_item;
pub mod email;
pub mod id;
pub mod price;
pub mod status;

pub use cart_item::{CartItem, CartSnapshot};
pub use email::{Email, EmailError};
pub use id::*;
pub use price::{Price, PriceError};
pub use status::*;
