//! Error types for take aggregation.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("operator not supported: {0}")]
    UnsupportedOperator(String),

    #[error("no data to return: {0}")]
    NoData(String),

    #[error("step iteration failed: {0}")]
    Upstream(#[source] anyhow::Error),

    #[error("block builder error: {0}")]
    Builder(String),

    #[error("step index {index} out of bounds: block has {steps} steps")]
    Bounds { index: usize, steps: usize },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub fn upstream(err: impl Into<anyhow::Error>) -> Self {
        Error::Upstream(err.into())
    }

    pub fn builder(msg: impl Into<String>) -> Self {
        Error::Builder(msg.into())
    }
}
