//! Supermarket Core - Shared cart types.
//!
//! This crate provides the types shared by every Supermarket component:
//! - `cart` - Cart store, load controller, view projection and checkout
//! - `cli` - Command-line client driving a cart session
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no async runtime, no HTTP
//! clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for ids, prices and emails, plus the cart
//!   item entity and the load/view state enums

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
