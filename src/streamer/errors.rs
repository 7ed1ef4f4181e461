//! The streamer's error taxonomy and the single function that maps it onto the
//! exact ASCII strings the console is allowed to read back via `GET_ERROR`.

use thiserror::Error;

use crate::codec::CodecError;
use crate::fetch::FetchError;
use crate::sram::SramError;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StreamerError {
    #[error("failed to download video catalog")]
    FetchCatalog,

    #[error("failed to fetch catalog index {index}")]
    FetchCatalogIndex { index: u32 },

    #[error("failed to fetch header")]
    FetchHeader,

    #[error("failed to fetch index")]
    FetchIndex,

    #[error("failed to fetch video chunk {chunk}")]
    FetchChunk { chunk: u32 },

    #[error("invalid video index requested: {index}")]
    InvalidVideoIndex { index: u32 },

    #[error("invalid catalog data at index {index}")]
    InvalidCatalogData { index: u32 },

    #[error("unrecognized command 0x{code:02X}")]
    UnrecognizedCommand { code: u8 },

    #[error("underflow detected")]
    Underflow,

    #[error("command conflict: streamer busy")]
    CommandConflict,

    #[error("network unavailable")]
    NetworkUnavailable,

    #[error("command {command} timed out")]
    Timeout { command: &'static str },

    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Sram(#[from] SramError),
}

/// The single, tested mapping from "what went wrong" (a Rust type callers can
/// match on) to "what the console sees" (the exact ASCII error string), per
/// the container format's error handling design.
pub fn describe_error(error: &StreamerError) -> String {
    match error {
        StreamerError::FetchCatalog => "Failed to download video catalog!".to_string(),
        StreamerError::FetchCatalogIndex { index } => format!("Failed to fetch catalog index! ({index})"),
        StreamerError::FetchHeader => "Failed to fetch header!".to_string(),
        StreamerError::FetchIndex => "Failed to fetch index!".to_string(),
        StreamerError::FetchChunk { chunk } => format!("Failed to fetch video! (chunk {chunk})"),
        StreamerError::InvalidVideoIndex { index } => format!("Invalid video index requested! ({index})"),
        StreamerError::InvalidCatalogData { index } => format!("Invalid catalog data at index! ({index})"),
        StreamerError::UnrecognizedCommand { code } => format!("Unrecognized command 0x{code:02X}!"),
        StreamerError::Underflow => "Underflow detected! Internet too slow?".to_string(),
        StreamerError::CommandConflict => "Command conflict! Busy!".to_string(),
        StreamerError::NetworkUnavailable => "Wired connection failed and WiFi not configured!".to_string(),
        StreamerError::Timeout { command } => format!("{command} timed out!"),
        StreamerError::Codec(_) | StreamerError::Fetch(_) | StreamerError::Sram(_) => error.to_string(),
    }
}

/// The console only ever reads back up to this many ASCII bytes of an error
/// message (§4.4: "≤ 256 ASCII bytes").
pub const MAX_ERROR_MESSAGE_LEN: usize = 256;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_known_variants_to_the_documented_strings() {
        assert_eq!(
            describe_error(&StreamerError::FetchChunk { chunk: 3 }),
            "Failed to fetch video! (chunk 3)"
        );
        assert_eq!(
            describe_error(&StreamerError::FetchCatalog),
            "Failed to download video catalog!"
        );
        assert_eq!(
            describe_error(&StreamerError::InvalidVideoIndex { index: 200 }),
            "Invalid video index requested! (200)"
        );
        assert_eq!(
            describe_error(&StreamerError::UnrecognizedCommand { code: 0x09 }),
            "Unrecognized command 0x09!"
        );
        assert_eq!(
            describe_error(&StreamerError::Underflow),
            "Underflow detected! Internet too slow?"
        );
    }
}
