//! Real SRAM bank writer: raw volatile writes into the cartridge's
//! memory-mapped 2 MiB SRAM window.
//!
//! Never compiled into a host test build — see the `hardware` feature in
//! `Cargo.toml`. Everything below the volatile write itself (pin timing, bus
//! arbitration) is out of scope; this module only needs to get bytes into the
//! window with the right address transposition.

use super::{Bank, SramBankWriter, SramError, BANK_SIZE};

/// Base address of the SRAM window in the streamer microcontroller's address
/// space, per the cartridge's fixed memory map.
const SRAM_BASE: usize = 0x0020_0000;

pub struct HardwareSram {
    current: Option<Bank>,
    cursor: usize,
}

impl HardwareSram {
    /// # Safety
    /// `SRAM_BASE..SRAM_BASE + 2 * BANK_SIZE` must be mapped, and no other
    /// writer may be driving the bank this instance opens for the lifetime of
    /// that write.
    pub unsafe fn new() -> Self {
        Self {
            current: None,
            cursor: 0,
        }
    }

    fn bank_base(bank: Bank) -> usize {
        SRAM_BASE + bank.index() * BANK_SIZE
    }
}

impl SramBankWriter for HardwareSram {
    fn start_bank(&mut self, bank: Bank) {
        self.flush_and_release();
        self.current = Some(bank);
        self.cursor = 0;
    }

    fn write(&mut self, bytes: &[u8]) -> Result<(), SramError> {
        let bank = self.current.ok_or(SramError::NoBankStarted)?;
        if self.cursor + bytes.len() > BANK_SIZE {
            return Err(SramError::Overflow);
        }
        let base = Self::bank_base(bank);
        for (offset, &b) in bytes.iter().enumerate() {
            let addr = (self.cursor + offset) ^ 1;
            // SAFETY: addr < BANK_SIZE is checked above, and the caller of
            // `new` guarantees the window is mapped and exclusively ours.
            unsafe {
                std::ptr::write_volatile((base + addr) as *mut u8, b);
            }
        }
        self.cursor += bytes.len();
        Ok(())
    }

    fn flush_and_release(&mut self) {
        self.current = None;
    }

    fn cursor(&self) -> usize {
        self.cursor
    }
}
