//! The streamer's single state record.
//!
//! "All streamer state lives in one record with defined initialization; tests
//! construct fresh contexts" — generic over the SRAM and fetch backends so the
//! same dispatch code (see `dispatch.rs`) runs against `EmulatedSram` +
//! `WorkerThreadRangeFetcher` in tests and, modulo the `hardware` feature,
//! against real hardware.

use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};

use crate::codec::VideoIndex;
use crate::config::Config;
use crate::fetch::RangeFetcher;
use crate::sram::SramBankWriter;

use super::errors::{describe_error, StreamerError, MAX_ERROR_MESSAGE_LEN};
use super::stages::{ListStage, StartVideoStage};

/// Everything the streamer knows about the video currently playing, if any.
#[derive(Debug, Clone)]
pub struct VideoPlaybackState {
    pub video_url: String,
    /// Always 0 once written to SRAM (§4.4 step 4); kept here to decide
    /// whether fetched chunks need RLE decoding first.
    pub compression: u16,
    pub chunk_size: u32,
    pub total_chunks: u32,
    pub header_len: usize,
    pub index: Option<VideoIndex>,
    /// Number of the next chunk `FLIP_REGION`/`START_VIDEO` will fetch.
    pub next_chunk: u32,
}

pub struct StreamerContext<S, F> {
    pub(super) sram: Arc<Mutex<S>>,
    pub(super) fetcher: F,
    pub config: Config,
    pub(super) current_error: Option<String>,
    pub(super) video: Option<VideoPlaybackState>,
    pub(super) cancel_requested: Arc<AtomicBool>,
    pub(super) fetch_in_flight: Arc<AtomicBool>,
    /// Which step of `START_VIDEO`'s continuation chain is running, if any —
    /// diagnostic only, not read by dispatch itself.
    pub(super) start_video_stage: Option<StartVideoStage>,
    pub(super) list_stage: Option<ListStage>,
}

impl<S, F> StreamerContext<S, F>
where
    S: SramBankWriter + Send + 'static,
    F: RangeFetcher,
{
    pub fn new(sram: S, fetcher: F, config: Config) -> Self {
        Self {
            sram: Arc::new(Mutex::new(sram)),
            fetcher,
            config,
            current_error: None,
            video: None,
            cancel_requested: Arc::new(AtomicBool::new(false)),
            fetch_in_flight: Arc::new(AtomicBool::new(false)),
            start_video_stage: None,
            list_stage: None,
        }
    }

    pub fn has_error(&self) -> bool {
        self.current_error.is_some()
    }

    pub fn current_error(&self) -> Option<&str> {
        self.current_error.as_deref()
    }

    /// Record an error if none is currently set. Idempotent while an error is
    /// already set (§8 property 7: error stickiness).
    pub fn report_error(&mut self, error: &StreamerError) {
        if self.current_error.is_some() {
            tracing::debug!(error = %error, "suppressing error, one already sticky");
            return;
        }
        tracing::error!(error = %error, "streamer error");
        let mut message = describe_error(error);
        message.truncate(MAX_ERROR_MESSAGE_LEN);
        self.current_error = Some(message);
    }

    /// Console-side: clear the sticky error bit.
    pub fn clear_error(&mut self) {
        self.current_error = None;
    }

    pub fn is_fetch_in_flight(&self) -> bool {
        self.fetch_in_flight.load(std::sync::atomic::Ordering::SeqCst)
    }

    pub fn with_sram<R>(&self, f: impl FnOnce(&mut S) -> R) -> R {
        let mut guard = self.sram.lock().expect("sram mutex poisoned");
        f(&mut guard)
    }

    pub fn video_state(&self) -> Option<&VideoPlaybackState> {
        self.video.as_ref()
    }

    /// The `START_VIDEO` continuation step currently running, if that command
    /// is in flight.
    pub fn start_video_stage(&self) -> Option<StartVideoStage> {
        self.start_video_stage
    }

    /// The `LIST_VIDEOS` continuation step currently running, if that command
    /// is in flight.
    pub fn list_stage(&self) -> Option<ListStage> {
        self.list_stage
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::WorkerThreadRangeFetcher;
    use crate::sram::EmulatedSram;

    fn fresh_context() -> StreamerContext<EmulatedSram, WorkerThreadRangeFetcher> {
        StreamerContext::new(
            EmulatedSram::new(),
            WorkerThreadRangeFetcher::new(),
            Config::for_tests("127.0.0.1", 0),
        )
    }

    #[test]
    fn error_reporting_is_sticky() {
        let mut ctx = fresh_context();
        ctx.report_error(&StreamerError::Underflow);
        let first = ctx.current_error().unwrap().to_string();
        ctx.report_error(&StreamerError::FetchCatalog);
        assert_eq!(ctx.current_error().unwrap(), first);
        ctx.clear_error();
        assert!(!ctx.has_error());
        ctx.report_error(&StreamerError::FetchCatalog);
        assert_eq!(ctx.current_error().unwrap(), "Failed to download video catalog!");
    }

    #[test]
    fn error_message_is_truncated_to_256_bytes() {
        let mut ctx = fresh_context();
        ctx.report_error(&StreamerError::UnrecognizedCommand { code: 0xFF });
        assert!(ctx.current_error().unwrap().len() <= MAX_ERROR_MESSAGE_LEN);
    }
}
