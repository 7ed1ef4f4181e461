//! Host-side SRAM emulation: two plain byte buffers standing in for the
//! cartridge's dual SRAM banks.

use crate::codec::{ByteSink, CodecError};

use super::{Bank, SramBankWriter, SramError, BANK_SIZE};

/// An in-memory stand-in for the cartridge's dual SRAM banks.
///
/// Storage is kept in the bus's physical (address-xor-1) order; [`read_bank`]
/// undoes that to hand back the logical, linearly-addressed view tests and the
/// player state machine actually want.
pub struct EmulatedSram {
    banks: [Box<[u8]>; 2],
    current: Option<Bank>,
    cursor: usize,
}

impl Default for EmulatedSram {
    fn default() -> Self {
        Self::new()
    }
}

impl EmulatedSram {
    pub fn new() -> Self {
        Self {
            banks: [
                vec![0u8; BANK_SIZE].into_boxed_slice(),
                vec![0u8; BANK_SIZE].into_boxed_slice(),
            ],
            current: None,
            cursor: 0,
        }
    }

    /// The logical (address-ordered) contents of `bank`, undoing the
    /// low-address-bit swap described in the module docs.
    pub fn read_bank(&self, bank: Bank) -> Vec<u8> {
        let phys = &self.banks[bank.index()];
        let mut out = vec![0u8; phys.len()];
        for (addr, slot) in out.iter_mut().enumerate() {
            *slot = phys[addr ^ 1];
        }
        out
    }

    pub fn current_bank(&self) -> Option<Bank> {
        self.current
    }
}

impl SramBankWriter for EmulatedSram {
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
        let buf = &mut self.banks[bank.index()];
        for (offset, &b) in bytes.iter().enumerate() {
            let addr = self.cursor + offset;
            buf[addr ^ 1] = b;
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

impl ByteSink for EmulatedSram {
    fn push_slice(&mut self, bytes: &[u8]) -> Result<(), CodecError> {
        self.write(bytes).map_err(|_| CodecError::TooShort {
            needed: self.cursor + bytes.len(),
            got: BANK_SIZE,
        })
    }
}
