//! tradejournal: personal trading journal.
//!
//! Hexagonal architecture: domain logic in [`domain`], port traits in [`ports`],
//! concrete implementations in [`adapters`], front end in [`cli`].

pub mod domain;
pub mod ports;
pub mod adapters;
#[cfg(feature = "sqlite")]
pub mod cli;
pub mod logging;
