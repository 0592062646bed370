//! Fundamental types for the accrue reward ledger.
//!
//! This crate defines the types shared across every other crate in the workspace:
//! account identities, position identifiers, timestamps and pool parameters.

pub mod account;
pub mod error;
pub mod params;
pub mod position;
pub mod time;

pub use account::AccountId;
pub use error::TypeError;
pub use params::{PoolParams, PRECISION};
pub use position::PositionId;
pub use time::Timestamp;
