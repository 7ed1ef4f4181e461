//! Command dispatch: the streamer's reaction to each of the eight console
//! commands, built on top of [`StreamerContext`].
//!
//! Every dispatched command simulates the processing delay from §4.4 before
//! doing anything, then runs to completion and reports any error via
//! `report_error` rather than propagating it further — a fatal class stops
//! *this* command, not the streamer, which stays available for the next one.

use std::ops::Range;
use std::sync::atomic::Ordering;
use std::sync::{Arc, Mutex};

use tokio::sync::oneshot;

use crate::codec::{ByteSink, CodecError, RleDecoder, VideoHeader, VideoIndex, HEADER_SIZE, INDEX_SIZE};
use crate::fetch::{FetchRequest, RangeFetcher};
use crate::sram::{Bank, SramBankWriter, SramError};

use super::commands::Command;
use super::context::{StreamerContext, VideoPlaybackState};
use super::errors::StreamerError;
use super::stages::{ListStage, StartVideoStage};

impl<S, F> StreamerContext<S, F>
where
    S: SramBankWriter + Send + 'static,
    F: RangeFetcher,
{
    /// Observe a dispatched command: simulate the processing delay, run it
    /// under its §5 timeout, and turn any failure into the streamer's sticky
    /// error state.
    pub async fn dispatch(&mut self, command_code: u8, arg: u16) {
        let command = match Command::from_code(command_code) {
            Some(command) => command,
            None => {
                self.report_error(&StreamerError::UnrecognizedCommand { code: command_code });
                return;
            }
        };

        // FLIP_REGION and STOP_VIDEO are the only commands defined while a
        // background fetch is running (§5); everything else would race the
        // fetch context's SRAM writes.
        if self.fetch_in_flight.load(Ordering::SeqCst) && !matches!(command, Command::FlipRegion | Command::StopVideo) {
            tracing::warn!(command = command.name(), "command conflict: streamer busy with an in-flight fetch");
            self.report_error(&StreamerError::CommandConflict);
            return;
        }

        tracing::debug!(command = command.name(), arg, "dispatching command");
        tokio::time::sleep(self.config.command_processing_delay).await;

        let timeout = match command {
            Command::Echo => self.config.echo_timeout,
            Command::ConnectNet => self.config.connect_timeout,
            _ => self.config.default_command_timeout,
        };

        let result = match tokio::time::timeout(timeout, self.run_command(command, arg)).await {
            Ok(result) => result,
            Err(_) => {
                // The awaited future was dropped mid-fetch; nothing is left
                // running that would ever clear this on its own.
                self.fetch_in_flight.store(false, Ordering::SeqCst);
                Err(StreamerError::Timeout { command: command.name() })
            }
        };

        if let Err(error) = &result {
            tracing::warn!(command = command.name(), error = %error, "command failed");
        } else {
            tracing::debug!(command = command.name(), "command completed");
        }

        if let Err(error) = result {
            self.report_error(&error);
        }
    }

    async fn run_command(&mut self, command: Command, arg: u16) -> Result<(), StreamerError> {
        match command {
            Command::Echo => self.dispatch_echo(arg).await,
            Command::ListVideos => self.dispatch_list_videos().await,
            Command::StartVideo => self.dispatch_start_video(arg).await,
            Command::StopVideo => self.dispatch_stop_video().await,
            Command::FlipRegion => self.dispatch_flip_region().await,
            Command::GetError => self.dispatch_get_error().await,
            Command::ConnectNet => self.dispatch_connect_net().await,
            Command::MarchTest => self.dispatch_march_test(arg).await,
        }
    }

    async fn dispatch_echo(&mut self, arg: u16) -> Result<(), StreamerError> {
        self.with_sram(|sram| -> Result<(), SramError> {
            sram.start_bank(Bank::Zero);
            sram.write(&arg.to_be_bytes())?;
            sram.flush_and_release();
            Ok(())
        })?;
        Ok(())
    }

    async fn dispatch_list_videos(&mut self) -> Result<(), StreamerError> {
        self.fetch_in_flight.store(true, Ordering::SeqCst);
        self.list_stage = Some(ListStage::FetchCatalog);
        self.with_sram(|sram| sram.start_bank(Bank::Zero));

        let sram = self.sram.clone();
        let request = FetchRequest {
            url: self.config.catalog_url(),
            first_byte: 0,
            size: None,
        };
        tracing::info!(url = %request.url, "fetching video catalog");
        let result = run_fetch(&mut self.fetcher, request, move |bytes| {
            sram.lock().expect("sram mutex poisoned").write(bytes).is_ok()
        })
        .await;

        self.with_sram(|sram| sram.flush_and_release());
        self.fetch_in_flight.store(false, Ordering::SeqCst);
        self.list_stage = None;

        if let Err(err) = &result {
            tracing::warn!(error = %err, "catalog fetch failed");
        }
        result.map_err(|_| StreamerError::FetchCatalog)
    }

    async fn dispatch_start_video(&mut self, arg: u16) -> Result<(), StreamerError> {
        let index = arg as u32;
        if index >= 128 {
            return Err(StreamerError::InvalidVideoIndex { index });
        }

        self.fetch_in_flight.store(true, Ordering::SeqCst);
        let outcome = self.run_start_video(index).await;
        self.fetch_in_flight.store(false, Ordering::SeqCst);
        self.start_video_stage = None;
        outcome
    }

    async fn run_start_video(&mut self, index: u32) -> Result<(), StreamerError> {
        // Step 1: fetch the catalog's header entry for `index`.
        self.start_video_stage = Some(StartVideoStage::FetchCatalogHeader);
        let catalog_header_bytes = fetch_into_buffer(
            &mut self.fetcher,
            FetchRequest {
                url: self.config.catalog_url(),
                first_byte: index as u64 * HEADER_SIZE as u64,
                size: Some(HEADER_SIZE as u64),
            },
        )
        .await
        .map_err(|_| StreamerError::FetchCatalogIndex { index })?;

        let catalog_header =
            VideoHeader::parse(&catalog_header_bytes).map_err(|_| StreamerError::InvalidCatalogData { index })?;

        // Step 2: build the video URL; reject an unterminated URL field.
        let relative_url = catalog_header
            .relative_url_str()
            .map_err(|_| StreamerError::InvalidCatalogData { index })?;
        let video_url = format!("{}/{}", self.config.base_url(), relative_url);

        // Step 3: fetch the full video header.
        self.start_video_stage = Some(StartVideoStage::FetchVideoHeader);
        let header_bytes = fetch_into_buffer(
            &mut self.fetcher,
            FetchRequest {
                url: video_url.clone(),
                first_byte: 0,
                size: Some(HEADER_SIZE as u64),
            },
        )
        .await
        .map_err(|_| StreamerError::FetchHeader)?;
        let mut header = VideoHeader::parse(&header_bytes).map_err(|_| StreamerError::FetchHeader)?;

        let compression = header.compression;
        let chunk_size = header.chunk_size;
        let total_chunks = header.total_chunks;

        // Step 4: the console always sees an uncompressed header.
        header.compression = 0;

        // Step 5: compressed streams carry a chunk index.
        let index_table = if compression != 0 {
            self.start_video_stage = Some(StartVideoStage::FetchIndex);
            let index_bytes = fetch_into_buffer(
                &mut self.fetcher,
                FetchRequest {
                    url: video_url.clone(),
                    first_byte: HEADER_SIZE as u64,
                    size: Some(INDEX_SIZE as u64),
                },
            )
            .await
            .map_err(|_| StreamerError::FetchIndex)?;
            Some(VideoIndex::parse(&index_bytes).map_err(|_| StreamerError::FetchIndex)?)
        } else {
            None
        };

        // Step 6: reset to bank 0 and write the (modified) header.
        let header_bytes_out = header.to_bytes();
        self.with_sram(|sram| -> Result<(), SramError> {
            sram.start_bank(Bank::Zero);
            sram.write(&header_bytes_out)
        })?;

        self.video = Some(VideoPlaybackState {
            video_url,
            compression,
            chunk_size,
            total_chunks,
            header_len: HEADER_SIZE + if compression != 0 { INDEX_SIZE } else { 0 },
            index: index_table,
            next_chunk: 0,
        });

        // Step 7: chunk 0 continues straight on in the bank the header opened.
        self.fetch_chunk_into_bank(0, Bank::Zero, false).await?;

        // Step 8: chunk 1, if there is one, starts bank 1 fresh.
        if total_chunks > 1 {
            self.fetch_chunk_into_bank(1, Bank::One, true).await?;
        }

        Ok(())
    }

    fn chunk_source_range(&self, chunk_num: u32) -> Result<(Range<u64>, bool), StreamerError> {
        let video = self.video.as_ref().expect("video state present during chunk fetch");
        if video.compression != 0 {
            let index = video.index.as_ref().expect("index present for a compressed video");
            let start = index
                .chunk_offset(chunk_num as usize)
                .ok_or(StreamerError::FetchIndex)? as u64;
            let end = index
                .chunk_offset(chunk_num as usize + 1)
                .ok_or(StreamerError::FetchIndex)? as u64;
            Ok((start..end, true))
        } else {
            let start = video.header_len as u64 + chunk_num as u64 * video.chunk_size as u64;
            let end = start + video.chunk_size as u64;
            Ok((start..end, false))
        }
    }

    async fn fetch_chunk_into_bank(&mut self, chunk_num: u32, bank: Bank, start_fresh: bool) -> Result<(), StreamerError> {
        self.start_video_stage = Some(StartVideoStage::FetchChunk {
            bank: bank.index() as u8,
            chunk_num,
        });
        if start_fresh {
            self.with_sram(|sram| sram.start_bank(bank));
        }
        let (range, compressed) = self.chunk_source_range(chunk_num)?;
        let video_url = self.video.as_ref().expect("video state present").video_url.clone();
        tracing::debug!(chunk_num, bank = ?bank, compressed, range = ?range, "fetching chunk");

        let sram = self.sram.clone();
        let cancel = self.cancel_requested.clone();
        let request = FetchRequest {
            url: video_url,
            first_byte: range.start,
            size: Some(range.end - range.start),
        };

        let result = if compressed {
            let decoder = Arc::new(Mutex::new(RleDecoder::new()));
            run_fetch(&mut self.fetcher, request, move |bytes| {
                decode_and_write(&decoder, &sram, &cancel, bytes)
            })
            .await
        } else {
            run_fetch(&mut self.fetcher, request, move |bytes| {
                write_raw(&sram, &cancel, bytes)
            })
            .await
        };

        self.with_sram(|sram| sram.flush_and_release());
        result.map_err(|_| StreamerError::FetchChunk { chunk: chunk_num })?;

        if let Some(video) = self.video.as_mut() {
            video.next_chunk = chunk_num + 1;
        }
        Ok(())
    }

    /// Starts the fetch of the next chunk into the opposite bank and returns
    /// immediately — the caller must not await fetch completion here, or the
    /// console would starve waiting on the next frame (§4.4, §9).
    async fn dispatch_flip_region(&mut self) -> Result<(), StreamerError> {
        let (chunk_num, total_chunks) = {
            let video = self.video.as_ref().ok_or(StreamerError::InvalidVideoIndex { index: 0 })?;
            (video.next_chunk, video.total_chunks)
        };

        if chunk_num >= total_chunks {
            tracing::debug!("flip_region past the last chunk; finishing playback");
            return Ok(());
        }
        if self.fetch_in_flight.load(Ordering::SeqCst) {
            tracing::warn!(chunk_num, "underflow: previous chunk fetch still in flight");
            return Err(StreamerError::Underflow);
        }

        let bank = Bank::from_index(chunk_num as usize & 1);
        let (range, compressed) = self.chunk_source_range(chunk_num)?;
        let video_url = self.video.as_ref().expect("video state present").video_url.clone();
        self.with_sram(|sram| sram.start_bank(bank));

        if let Some(video) = self.video.as_mut() {
            video.next_chunk = chunk_num + 1;
        }

        self.fetch_in_flight.store(true, Ordering::SeqCst);
        let sram_bytes = self.sram.clone();
        let sram_done = self.sram.clone();
        let cancel = self.cancel_requested.clone();
        let fetch_in_flight = self.fetch_in_flight.clone();

        let request = FetchRequest {
            url: video_url,
            first_byte: range.start,
            size: Some(range.end - range.start),
        };

        let on_done: Box<dyn FnOnce(Result<(), crate::fetch::FetchError>) + Send> = Box::new(move |_result| {
            sram_done.lock().expect("sram mutex poisoned").flush_and_release();
            fetch_in_flight.store(false, Ordering::SeqCst);
        });

        if compressed {
            let decoder = Arc::new(Mutex::new(RleDecoder::new()));
            self.fetcher.fetch(
                request,
                Box::new(move |bytes| decode_and_write(&decoder, &sram_bytes, &cancel, bytes)),
                on_done,
            );
        } else {
            self.fetcher.fetch(
                request,
                Box::new(move |bytes| write_raw(&sram_bytes, &cancel, bytes)),
                on_done,
            );
        }

        Ok(())
    }

    async fn dispatch_stop_video(&mut self) -> Result<(), StreamerError> {
        tracing::info!("stop_video: cancelling any in-flight fetch");
        self.cancel_requested.store(true, Ordering::SeqCst);
        for _ in 0..100 {
            if !self.fetch_in_flight.load(Ordering::SeqCst) {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
        self.cancel_requested.store(false, Ordering::SeqCst);
        self.video = None;
        Ok(())
    }

    async fn dispatch_get_error(&mut self) -> Result<(), StreamerError> {
        let mut message = self.current_error.clone().unwrap_or_default().into_bytes();
        message.push(0);
        self.with_sram(|sram| -> Result<(), SramError> {
            sram.start_bank(Bank::Zero);
            sram.write(&message)?;
            sram.flush_and_release();
            Ok(())
        })?;
        Ok(())
    }

    async fn dispatch_connect_net(&mut self) -> Result<(), StreamerError> {
        let request = FetchRequest {
            url: self.config.catalog_url(),
            first_byte: 0,
            size: Some(1),
        };
        run_fetch(&mut self.fetcher, request, move |_bytes| true)
            .await
            .map_err(|_| StreamerError::NetworkUnavailable)
    }

    async fn dispatch_march_test(&mut self, arg: u16) -> Result<(), StreamerError> {
        let pass = (arg & 0xFF) as u8;
        let bank = Bank::from_index((pass & 1) as usize);
        let pattern: Vec<u8> = (0..crate::sram::BANK_SIZE)
            .map(|addr| (addr as u8).wrapping_add(pass))
            .collect();
        self.with_sram(|sram| -> Result<(), SramError> {
            sram.start_bank(bank);
            sram.write(&pattern)?;
            sram.flush_and_release();
            Ok(())
        })?;
        Ok(())
    }
}

fn write_raw<S: SramBankWriter>(
    sram: &Arc<Mutex<S>>,
    cancel: &Arc<std::sync::atomic::AtomicBool>,
    bytes: &[u8],
) -> bool {
    if cancel.load(Ordering::SeqCst) {
        return false;
    }
    sram.lock().expect("sram mutex poisoned").write(bytes).is_ok()
}

fn decode_and_write<S: SramBankWriter>(
    decoder: &Arc<Mutex<RleDecoder>>,
    sram: &Arc<Mutex<S>>,
    cancel: &Arc<std::sync::atomic::AtomicBool>,
    bytes: &[u8],
) -> bool {
    if cancel.load(Ordering::SeqCst) {
        return false;
    }
    let mut decoded = Vec::new();
    if decoder
        .lock()
        .expect("rle decoder mutex poisoned")
        .decode_into(bytes, &mut decoded)
        .is_err()
    {
        return false;
    }
    sram.lock().expect("sram mutex poisoned").write(&decoded).is_ok()
}

/// Drive one `RangeFetcher::fetch` to completion as an awaitable.
async fn run_fetch<F: RangeFetcher>(
    fetcher: &mut F,
    request: FetchRequest,
    on_bytes: impl FnMut(&[u8]) -> bool + Send + 'static,
) -> Result<(), crate::fetch::FetchError> {
    let (tx, rx) = oneshot::channel();
    let mut on_bytes = on_bytes;
    fetcher.fetch(
        request,
        Box::new(move |bytes| on_bytes(bytes)),
        Box::new(move |result| {
            let _ = tx.send(result);
        }),
    );
    match rx.await {
        Ok(result) => result,
        Err(_) => Err(crate::fetch::FetchError::Transport(
            "fetch task dropped before completion".to_string(),
        )),
    }
}

/// Fetch an entire (small, bounded) resource into an owned buffer.
async fn fetch_into_buffer<F: RangeFetcher>(
    fetcher: &mut F,
    request: FetchRequest,
) -> Result<Vec<u8>, crate::fetch::FetchError> {
    let buffer = Arc::new(Mutex::new(Vec::new()));
    let sink = buffer.clone();
    run_fetch(fetcher, request, move |bytes| {
        let mut sink: ByteSinkGuard = ByteSinkGuard(&sink);
        sink.push_slice(bytes).is_ok()
    })
    .await?;
    Ok(Arc::try_unwrap(buffer)
        .expect("sink dropped after fetch completion")
        .into_inner()
        .expect("buffer mutex poisoned"))
}

/// Thin adapter so `fetch_into_buffer`'s sink can reuse `ByteSink` without
/// taking ownership of the shared buffer.
struct ByteSinkGuard<'a>(&'a Arc<Mutex<Vec<u8>>>);

impl ByteSink for ByteSinkGuard<'_> {
    fn push_slice(&mut self, bytes: &[u8]) -> Result<(), CodecError> {
        self.0.lock().expect("buffer mutex poisoned").extend_from_slice(bytes);
        Ok(())
    }
}
