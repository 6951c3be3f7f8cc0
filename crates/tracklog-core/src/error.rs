//! Error types shared across the tracklog crates.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid header: {0}")]
    HeaderParse(String),

    #[error("invalid time frame: {0}")]
    FrameParse(String),

    #[error("protocol violation: {0}")]
    Protocol(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("no time frames in the requested range")]
    EmptyRange,
}

pub type Result<T> = std::result::Result<T, Error>;
