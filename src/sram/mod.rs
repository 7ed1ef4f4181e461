//! Dual-bank SRAM writer.
//!
//! The cartridge exposes two 1 MiB SRAM banks. The streamer decodes a chunk's
//! frame payload straight into one bank while the console displays tiles out of
//! the other; [`Bank::opposite`] is how the `FLIP_REGION` command swaps which
//! bank is "live" without copying anything.
//!
//! One quirk both implementations below must honor identically: the SRAM is
//! wired to a 16-bit data bus such that the byte at any even address and the
//! byte at the following odd address are transposed relative to how the
//! console addresses them. Concretely, a byte logically destined for address
//! `p` is physically stored at address `p ^ 1`. Applying that same XOR on
//! read-back cancels it out, so every caller above this module works with a
//! plain, linearly-addressed view and never has to think about it.

pub mod emulated;
#[cfg(feature = "hardware")]
pub mod hardware;

pub use emulated::EmulatedSram;
#[cfg(feature = "hardware")]
pub use hardware::HardwareSram;

use thiserror::Error;

/// Size of a single SRAM bank.
pub const BANK_SIZE: usize = 1 << 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bank {
    Zero,
    One,
}

impl Bank {
    pub fn index(self) -> usize {
        match self {
            Bank::Zero => 0,
            Bank::One => 1,
        }
    }

    pub fn opposite(self) -> Bank {
        match self {
            Bank::Zero => Bank::One,
            Bank::One => Bank::Zero,
        }
    }

    pub fn from_index(index: usize) -> Bank {
        if index & 1 == 0 {
            Bank::Zero
        } else {
            Bank::One
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SramError {
    #[error("SRAM bank write would exceed the {BANK_SIZE}-byte bank")]
    Overflow,

    #[error("write attempted with no bank started")]
    NoBankStarted,
}

/// A destination for decoded chunk bytes, addressed bank-at-a-time.
///
/// Implementations also double as [`crate::codec::ByteSink`]s so the RLE
/// decoder can write straight into a bank with no intermediate buffer.
pub trait SramBankWriter {
    /// Flush and release whichever bank is currently open, then begin writing
    /// `bank` from offset 0.
    fn start_bank(&mut self, bank: Bank);

    /// Append `bytes` at the current cursor in the open bank.
    fn write(&mut self, bytes: &[u8]) -> Result<(), SramError>;

    /// Commit any pending half-word and disable the bank-write enable. Safe to
    /// call with no bank open.
    fn flush_and_release(&mut self);

    /// Bytes written into the currently open bank so far.
    fn cursor(&self) -> usize;
}
