//! The console-side player's top-level UI state machine.
//!
//! Deliberately thin: the actual ECHO handshake, catalog fetch, and tile
//! upload are driven by the streamer/transport and `frame_sync` respectively.
//! This module only owns the state that's meaningful at the UI layer —
//! which screen is showing, what's in the catalog, which entry is selected —
//! so it's testable as plain data transitions.

use crate::codec::{VideoHeader, HEADER_SIZE};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerState {
    Idle,
    Setup,
    Menu,
    Player,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEntry {
    pub title: String,
}

#[derive(Debug, Clone)]
pub struct Player {
    pub state: PlayerState,
    pub catalog: Vec<CatalogEntry>,
    pub selected_index: usize,
    pub error_message: Option<String>,
}

impl Default for Player {
    fn default() -> Self {
        Self::new()
    }
}

impl Player {
    pub fn new() -> Self {
        Self {
            state: PlayerState::Idle,
            catalog: Vec::new(),
            selected_index: 0,
            error_message: None,
        }
    }

    /// Idle -> Setup, on boot.
    pub fn boot(&mut self) {
        self.state = PlayerState::Setup;
    }

    /// Split a catalog buffer into up to 127 headers, stopping at the first
    /// all-zero header (§6: "terminated by a zero header or hitting 127
    /// entries"). A header that fails to parse also stops the scan — the
    /// rest of the catalog is presumed corrupt, not merely absent.
    pub fn parse_catalog(bytes: &[u8]) -> Vec<CatalogEntry> {
        let mut entries = Vec::new();
        for raw in bytes.chunks(HEADER_SIZE).take(127) {
            if raw.len() < HEADER_SIZE || raw.iter().all(|&b| b == 0) {
                break;
            }
            let Ok(header) = VideoHeader::parse(raw) else {
                break;
            };
            let Ok(title) = header.title_str() else {
                break;
            };
            entries.push(CatalogEntry {
                title: title.to_string(),
            });
        }
        entries
    }

    /// Setup -> Menu, once the catalog has been fetched.
    pub fn enter_menu(&mut self, catalog_bytes: &[u8]) {
        self.catalog = Self::parse_catalog(catalog_bytes);
        self.selected_index = 0;
        self.state = PlayerState::Menu;
    }

    pub fn select_next(&mut self) {
        if !self.catalog.is_empty() {
            self.selected_index = (self.selected_index + 1) % self.catalog.len();
        }
    }

    pub fn select_prev(&mut self) {
        if !self.catalog.is_empty() {
            self.selected_index = (self.selected_index + self.catalog.len() - 1) % self.catalog.len();
        }
    }

    /// Menu -> Player, on the user pressing start.
    pub fn start_selected(&mut self) -> Option<usize> {
        if self.catalog.is_empty() {
            return None;
        }
        self.state = PlayerState::Player;
        Some(self.selected_index)
    }

    /// Player -> Menu, on end-of-stream or an explicit stop.
    pub fn stop_to_menu(&mut self) {
        self.state = PlayerState::Menu;
    }

    /// Any state -> Error.
    pub fn enter_error(&mut self, message: impl Into<String>) {
        self.error_message = Some(message.into());
        self.state = PlayerState::Error;
    }

    /// Error -> Menu (or Setup, if there's no catalog yet), after the user
    /// dismisses the error and it's been cleared on the streamer side.
    pub fn dismiss_error(&mut self) {
        self.error_message = None;
        self.state = if self.catalog.is_empty() {
            PlayerState::Setup
        } else {
            PlayerState::Menu
        };
    }
}
