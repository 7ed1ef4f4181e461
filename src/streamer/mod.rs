//! The streamer state machine: accepts one command at a time over the
//! memory-mapped port, produces a reply via SRAM plus a completion token, and
//! tracks at most one outstanding fetch.

mod commands;
mod context;
mod dispatch;
mod errors;
mod stages;

pub use commands::Command;
pub use context::{StreamerContext, VideoPlaybackState};
pub use errors::{describe_error, StreamerError, MAX_ERROR_MESSAGE_LEN};
pub use stages::{ListStage, StartVideoStage};
