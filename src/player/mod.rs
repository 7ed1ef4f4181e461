//! Console-side player: the UI state machine plus the frame-sync loop that
//! drives tile uploads off the audio clock. Everything here is pure state and
//! narrow traits — no direct hardware access — so it's exercised with plain
//! unit tests rather than against real SRAM or a real PPU.

pub mod frame_sync;
pub mod state;

pub use frame_sync::{ConsolePort, FrameSyncState, TileUploader};
pub use state::{CatalogEntry, Player, PlayerState};
