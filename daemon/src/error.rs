use accrue_pool::PoolError;
use accrue_types::TypeError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SimError {
    #[error("config error: {0}")]
    Config(String),

    #[error("script error: {0}")]
    Script(String),

    #[error(transparent)]
    InvalidAccount(#[from] TypeError),

    #[error("pool error: {0}")]
    Pool(#[from] PoolError),

    #[error("restored pool diverged: {0}")]
    Divergence(String),
}
