//! Nullable infrastructure for deterministic testing.
//!
//! Every collaborator the pool talks to (clock, custody, category validator,
//! reward vault, storage) has an in-memory implementation here that:
//! - Returns deterministic values
//! - Can be set up and inspected programmatically
//! - Never touches the filesystem or network
//!
//! Usage: swap real implementations for nullables in tests and simulations.

pub mod clock;
pub mod custody;
pub mod store;
pub mod validator;
pub mod vault;

pub use clock::NullClock;
pub use custody::{CustodyRecord, NullCustody};
pub use store::NullStore;
pub use validator::NullValidator;
pub use vault::NullRewardVault;
