//! Crate-wide error type.
//!
//! Each component (`codec`, `sram`, `fetch`, `streamer`, `transport`) owns a small
//! `thiserror` enum describing exactly how it can fail. This top-level `Error`
//! composes them so library callers have one `Result` to match on, while the
//! streamer's error-reporting layer (`streamer::errors`) maps each variant onto
//! the exact ASCII strings the console is allowed to see.

use thiserror::Error;

use crate::codec::CodecError;
use crate::fetch::FetchError;
use crate::sram::SramError;
use crate::streamer::StreamerError;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error(transparent)]
    Sram(#[from] SramError),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Streamer(#[from] StreamerError),

    #[error("{0}")]
    Message(String),
}

impl Error {
    pub(crate) fn msg(message: impl Into<String>) -> Self {
        Self::Message(message.into())
    }
}

impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::Message(format!("{err:#}"))
    }
}
