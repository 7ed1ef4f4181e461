//! The run-length codec used for both audio and frame payloads.
//!
//! Control bytes: `0x01..=0x7F` introduce that many literal bytes; `0x81..=0xFF`
//! introduce a run of `(control & 0x7F)` repeats of the single byte that follows.
//! `0x00` and `0x80` are reserved and never emitted by the current encoder —
//! [`RleDecoder`] rejects them as corruption rather than guessing at a meaning.
//!
//! [`RleDecoder`] is a state machine, not a one-shot function, because chunk
//! payloads arrive over the network in arbitrarily-sized pieces: a control byte
//! and the run it introduces can straddle two different `decode_into` calls, and
//! the decoder has to pick up exactly where it left off.

use super::CodecError;

const MAX_RUN_LEN: u8 = 0x7F;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RleState {
    AwaitingControl,
    ReadingLiteral { left: u8 },
    AwaitingRepeatByte { length: u8 },
}

/// Destination for decoded bytes. Implemented for `Vec<u8>` for tests and
/// encoders; the SRAM bank writer implements it directly so decoded bytes land
/// straight in a bank without an intermediate buffer.
pub trait ByteSink {
    fn push_slice(&mut self, bytes: &[u8]) -> Result<(), CodecError>;
}

impl ByteSink for Vec<u8> {
    fn push_slice(&mut self, bytes: &[u8]) -> Result<(), CodecError> {
        self.extend_from_slice(bytes);
        Ok(())
    }
}

/// Streaming RLE decoder. Carries just enough state to resume mid-run across
/// `decode_into` calls.
#[derive(Debug, Clone)]
pub struct RleDecoder {
    state: RleState,
}

impl Default for RleDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl RleDecoder {
    pub fn new() -> Self {
        Self {
            state: RleState::AwaitingControl,
        }
    }

    /// Reset to the start-of-stream state. Call this at a chunk boundary — the
    /// codec never carries a run across two different chunks' payloads.
    pub fn reset(&mut self) {
        self.state = RleState::AwaitingControl;
    }

    pub fn is_idle(&self) -> bool {
        matches!(self.state, RleState::AwaitingControl)
    }

    pub fn decode_into<S: ByteSink>(&mut self, input: &[u8], sink: &mut S) -> Result<(), CodecError> {
        let mut i = 0;
        while i < input.len() {
            match self.state {
                RleState::AwaitingControl => {
                    let ctl = input[i];
                    i += 1;
                    self.state = match ctl {
                        0x01..=0x7F => RleState::ReadingLiteral { left: ctl },
                        0x81..=0xFF => RleState::AwaitingRepeatByte {
                            length: ctl & MAX_RUN_LEN,
                        },
                        _ => return Err(CodecError::CodecCorrupt(ctl)),
                    };
                }
                RleState::ReadingLiteral { left } => {
                    let avail = (input.len() - i).min(left as usize);
                    sink.push_slice(&input[i..i + avail])?;
                    i += avail;
                    let remaining = left - avail as u8;
                    self.state = if remaining == 0 {
                        RleState::AwaitingControl
                    } else {
                        RleState::ReadingLiteral { left: remaining }
                    };
                }
                RleState::AwaitingRepeatByte { length } => {
                    let byte = input[i];
                    i += 1;
                    let run = [byte; MAX_RUN_LEN as usize];
                    sink.push_slice(&run[..length as usize])?;
                    self.state = RleState::AwaitingControl;
                }
            }
        }
        Ok(())
    }
}

/// Encode `input` with a straightforward greedy RLE pass. Not byte-for-byte
/// compatible with whatever produced a real catalog's chunk data — this exists
/// so the decoder above has something to round-trip against in tests.
pub fn rle_encode(input: &[u8]) -> Vec<u8> {
    let max_run = MAX_RUN_LEN as usize;
    let mut out = Vec::new();
    let mut i = 0;
    while i < input.len() {
        let run_len = run_length_at(input, i, max_run);
        if run_len >= 2 {
            out.push(0x80 | run_len as u8);
            out.push(input[i]);
            i += run_len;
            continue;
        }
        let literal_start = i;
        let mut literal_len = 0usize;
        while i < input.len() && literal_len < max_run && run_length_at(input, i, max_run) < 2 {
            i += 1;
            literal_len += 1;
        }
        out.push(literal_len as u8);
        out.extend_from_slice(&input[literal_start..literal_start + literal_len]);
    }
    out
}

fn run_length_at(input: &[u8], start: usize, max_run: usize) -> usize {
    let byte = input[start];
    let mut len = 1;
    while start + len < input.len() && input[start + len] == byte && len < max_run {
        len += 1;
    }
    len
}
