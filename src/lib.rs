//! Kinetoscope: a streaming video subsystem split across a 1988-era console
//! and a download server, emulated here as two halves of one process talking
//! over a shared memory-mapped port.
//!
//! - [`codec`] — the on-wire/on-disk video container: header, chunk index,
//!   chunk framing, and the RLE codec. Pure functions over byte ranges.
//! - [`sram`] — the dual-bank SRAM the streamer decodes into and the console
//!   displays out of.
//! - [`transport`] — the memory-mapped port the two sides exchange commands
//!   and tokens through.
//! - [`fetch`] — HTTP range fetching against the download server.
//! - [`streamer`] — the command dispatch state machine living on the
//!   streamer side of the port.
//! - [`player`] — the console-side UI state machine and frame-sync loop.
//! - [`config`] — runtime knobs (host, timeouts, processing delay).
//! - [`logging`] — structured logging bootstrap.

pub mod codec;
pub mod config;
pub mod error;
pub mod fetch;
pub mod logging;
pub mod player;
pub mod sram;
pub mod streamer;
pub mod transport;

pub use config::Config;
pub use error::{Error, Result};
pub use logging::init_logging;
