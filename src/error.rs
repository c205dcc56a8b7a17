#![forbid(unsafe_code)]
#![deny(warnings)]
#![warn(clippy::pedantic)]

use thiserror::Error;

pub type Result<T> = std::result::Result<T, BurstError>;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum BurstError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("a burst is already running")]
    AlreadyRunning,
}
