//! CLI subcommands.

pub mod cart;
