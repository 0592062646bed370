//! Errors raised while parsing shared types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TypeError {
    #[error("invalid account identity: {0:?}")]
    InvalidAccount(String),

    #[error("invalid position identifier: {0:?}")]
    InvalidPosition(String),
}
