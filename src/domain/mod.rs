//! Core domain types and logic.

pub mod trade;
pub mod journal;
pub mod stats;
pub mod error;
