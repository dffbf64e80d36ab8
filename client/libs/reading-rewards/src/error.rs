//! Error types for reading rewards

use inboxzing_common::ConfigError;
use thiserror::Error;
use uuid::Uuid;

pub type RewardsResult<T> = Result<T, RewardsError>;

#[derive(Error, Debug)]
pub enum RewardsError {
    /// Only one article can be open at a time
    #[error("Article {open} is still open; close it before opening another")]
    ConcurrentReadNotSupported { open: String },

    #[error("No article is currently open")]
    NoActiveRead,

    #[error("Read session {0} is not open")]
    SessionAlreadyClosed(Uuid),

    /// Article already earned points in either mode
    #[error("Article already rewarded: {0}")]
    AlreadyRewarded(String),

    #[error("Invalid scoring configuration: {0}")]
    Config(String),
}

impl From<ConfigError> for RewardsError {
    fn from(err: ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}
