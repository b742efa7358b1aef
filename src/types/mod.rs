//! Type definitions module.
//!
//! Contains shared types used across the client.

pub mod amount;
pub mod transaction;

pub use amount::*;
pub use transaction::*;
