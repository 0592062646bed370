//! Abstract storage traits for the accrue reward ledger.
//!
//! Storage backends (in-memory for testing, anything durable in a host)
//! implement these traits. The pool depends only on the traits.

pub mod error;
pub mod pool;

pub use error::StoreError;
pub use pool::PoolStore;
