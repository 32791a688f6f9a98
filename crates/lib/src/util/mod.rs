//! Shared utilities.
//!
//! Common utilities used across the crate including hashing, JSON files and test helpers.

pub mod hash;
pub mod json;

#[cfg(test)]
pub mod testutil;
