//! Console-side frame sync: the nine-step loop that keeps tile uploads locked
//! to the audio PCM playback pointer.
//!
//! Kept pure and hardware-free by routing every side effect through two
//! narrow traits, [`ConsolePort`] and [`TileUploader`], the same decoupling
//! style the streamer side uses for `SramBankWriter`/`RangeFetcher` — a test
//! harness can record calls instead of touching real audio/tile hardware.

/// Read/write access to the bits of the console the frame-sync loop drives
/// directly: the audio PCM position, the loop-region pointers, and the
/// `FLIP_REGION` command line.
pub trait ConsolePort {
    /// Current play position of the audio DMA, in samples since the start of
    /// the *current* chunk's audio region. `None` once playback has run past
    /// the end of the stream (there is no more audio to chase).
    fn read_pcm_pointer(&self) -> Option<u32>;

    /// Rewrite the audio loop region so that, if playback runs past the
    /// current chunk's audio before the next chunk has landed, it loops back
    /// into `start..end` instead of reading garbage.
    fn set_loop_region(&mut self, start: u32, end: u32);

    /// Disable audio looping outright (there is no next chunk).
    fn clear_loop_region(&mut self);

    /// Fire `FLIP_REGION` without waiting for it to complete (§4.4).
    fn send_flip_region(&mut self);
}

/// Pushes one decoded frame's tile data to the PPU. Implementations must
/// perform the three sub-uploads in the order `upload_frame`'s default
/// provides — tile data before the palette before the tile map — since a
/// half-updated palette displayed against new tile data (or vice versa)
/// flashes garbage for one vblank.
pub trait TileUploader {
    fn upload_tile_data(&mut self, frame_num: u32);
    fn upload_palette(&mut self, frame_num: u32);
    fn upload_tile_map(&mut self, frame_num: u32);

    fn upload_frame(&mut self, frame_num: u32) {
        self.upload_tile_data(frame_num);
        self.upload_palette(frame_num);
        self.upload_tile_map(frame_num);
    }
}

/// One chunk's worth of bookkeeping for the frame-sync loop.
#[derive(Debug, Clone)]
pub struct FrameSyncState {
    frame_rate: u32,
    sample_rate: u32,
    frames_in_chunk: u32,
    current_chunk: u32,
    total_chunks: u32,
    next_frame_num: u32,
    dropped_frames: u64,
    /// Audio range of the chunk after this one, if known — set once the
    /// streamer has confirmed the next chunk's fetch landed, so step 8 can
    /// rewrite the loop target to point at real data.
    next_chunk_audio_range: Option<(u32, u32)>,
    finished: bool,
}

impl FrameSyncState {
    pub fn new(frame_rate: u16, sample_rate: u16, frames_in_chunk: u32, current_chunk: u32, total_chunks: u32) -> Self {
        Self {
            frame_rate: frame_rate as u32,
            sample_rate: sample_rate as u32,
            frames_in_chunk,
            current_chunk,
            total_chunks,
            next_frame_num: 0,
            dropped_frames: 0,
            next_chunk_audio_range: None,
            finished: false,
        }
    }

    /// Call once the streamer confirms the next chunk's audio has been
    /// written to SRAM, so step 8 has somewhere real to loop to.
    pub fn set_next_chunk_audio_range(&mut self, start: u32, end: u32) {
        self.next_chunk_audio_range = Some((start, end));
    }

    /// Reset bookkeeping for the chunk that `FLIP_REGION` just made current.
    pub fn begin_chunk(&mut self, frames_in_chunk: u32, current_chunk: u32) {
        self.frames_in_chunk = frames_in_chunk;
        self.current_chunk = current_chunk;
        self.next_frame_num = 0;
        self.next_chunk_audio_range = None;
        self.finished = current_chunk >= self.total_chunks;
    }

    pub fn dropped_frames(&self) -> u64 {
        self.dropped_frames
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn current_chunk(&self) -> u32 {
        self.current_chunk
    }

    /// Run one iteration of the sync loop: read the audio pointer, upload
    /// whatever frame it implies we should be showing, and (near the end of
    /// the chunk) rewrite the loop target or flip to the next chunk.
    ///
    /// A no-op once [`FrameSyncState::is_finished`].
    pub fn tick(&mut self, console: &mut impl ConsolePort, uploader: &mut impl TileUploader) {
        if self.finished || self.frames_in_chunk == 0 {
            return;
        }

        // 1. Read the audio PCM pointer.
        let Some(samples_played) = console.read_pcm_pointer() else {
            self.finished = true;
            return;
        };

        // 2. Compute which frame that position implies.
        let desired_frame = ((samples_played as u64 * self.frame_rate as u64) / self.sample_rate as u64) as u32;

        // 3. Not time for the next frame yet.
        if desired_frame < self.next_frame_num {
            return;
        }

        // 4. Detect dropped frames: audio ran ahead of what we'd displayed.
        if desired_frame > self.next_frame_num {
            let just_dropped = (desired_frame - self.next_frame_num) as u64;
            tracing::warn!(
                chunk = self.current_chunk,
                from = self.next_frame_num,
                to = desired_frame,
                just_dropped,
                total_dropped = self.dropped_frames + just_dropped,
                "dropped frames, audio ran ahead of display"
            );
            self.dropped_frames += just_dropped;
        }

        let last_frame = self.frames_in_chunk - 1;
        let frame_to_show = desired_frame.min(last_frame);

        // 5-7. Upload tile data, palette, then tile map for that frame.
        uploader.upload_frame(frame_to_show);

        // 8. Two frames before the chunk's last frame, rewrite the loop
        // target so an audio DMA that outruns us loops into real data
        // instead of reading past the chunk (or disable looping, at the
        // final chunk).
        if self.frames_in_chunk >= 2 && frame_to_show + 2 == last_frame {
            match self.next_chunk_audio_range {
                Some((start, end)) => console.set_loop_region(start, end),
                None if self.current_chunk + 1 >= self.total_chunks => console.clear_loop_region(),
                None => {}
            }
        }

        // 9. After the chunk's last frame has been displayed, advance and
        // flip without waiting.
        if frame_to_show >= last_frame {
            if self.current_chunk + 1 >= self.total_chunks {
                self.finished = true;
            } else {
                console.send_flip_region();
            }
        } else {
            self.next_frame_num = frame_to_show + 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct RecordingConsole {
        pointer_samples: Vec<u32>,
        read_index: usize,
        loop_regions: Vec<(u32, u32)>,
        loop_cleared: u32,
        flips: u32,
    }

    impl ConsolePort for RecordingConsole {
        fn read_pcm_pointer(&self) -> Option<u32> {
            self.pointer_samples.get(self.read_index).copied()
        }

        fn set_loop_region(&mut self, start: u32, end: u32) {
            self.loop_regions.push((start, end));
        }

        fn clear_loop_region(&mut self) {
            self.loop_cleared += 1;
        }

        fn send_flip_region(&mut self) {
            self.flips += 1;
        }
    }

    #[derive(Default)]
    struct RecordingUploader {
        order: Vec<(&'static str, u32)>,
    }

    impl TileUploader for RecordingUploader {
        fn upload_tile_data(&mut self, frame_num: u32) {
            self.order.push(("tile_data", frame_num));
        }
        fn upload_palette(&mut self, frame_num: u32) {
            self.order.push(("palette", frame_num));
        }
        fn upload_tile_map(&mut self, frame_num: u32) {
            self.order.push(("tile_map", frame_num));
        }
    }

    // 10 fps, 100 samples/sec -> one frame every 10 samples.
    fn state(frames_in_chunk: u32, current_chunk: u32, total_chunks: u32) -> FrameSyncState {
        FrameSyncState::new(10, 100, frames_in_chunk, current_chunk, total_chunks)
    }

    #[test]
    fn uploads_in_tile_palette_map_order() {
        let mut fs = state(5, 0, 2);
        let mut console = RecordingConsole {
            pointer_samples: vec![0],
            ..Default::default()
        };
        let mut uploader = RecordingUploader::default();
        fs.tick(&mut console, &mut uploader);
        assert_eq!(uploader.order, vec![("tile_data", 0), ("palette", 0), ("tile_map", 0)]);
    }

    #[test]
    fn does_not_advance_before_its_time() {
        let mut fs = state(5, 0, 2);
        fs.next_frame_num = 1;
        let mut console = RecordingConsole {
            pointer_samples: vec![5], // desired_frame = 0, still behind frame 1
            ..Default::default()
        };
        let mut uploader = RecordingUploader::default();
        fs.tick(&mut console, &mut uploader);
        assert!(uploader.order.is_empty());
    }

    #[test]
    fn counts_dropped_frames_when_audio_runs_ahead() {
        let mut fs = state(10, 0, 2);
        let mut console = RecordingConsole {
            pointer_samples: vec![35], // desired_frame = 3, expected next was 0
            ..Default::default()
        };
        let mut uploader = RecordingUploader::default();
        fs.tick(&mut console, &mut uploader);
        assert_eq!(fs.dropped_frames(), 3);
        assert_eq!(uploader.order.last(), Some(&("tile_map", 3)));
    }

    #[test]
    fn rewrites_loop_target_two_frames_before_the_end() {
        let mut fs = state(5, 0, 2); // last_frame = 4, rewrite point = frame 2
        fs.set_next_chunk_audio_range(1000, 2000);
        let mut console = RecordingConsole {
            pointer_samples: vec![20], // desired_frame = 2
            ..Default::default()
        };
        let mut uploader = RecordingUploader::default();
        fs.tick(&mut console, &mut uploader);
        assert_eq!(console.loop_regions, vec![(1000, 2000)]);
        assert_eq!(console.flips, 0);
    }

    #[test]
    fn clears_loop_target_on_final_chunk() {
        let mut fs = state(5, 1, 2); // current_chunk 1 of 2 -> no next chunk
        let mut console = RecordingConsole {
            pointer_samples: vec![20], // desired_frame = 2, rewrite point
            ..Default::default()
        };
        let mut uploader = RecordingUploader::default();
        fs.tick(&mut console, &mut uploader);
        assert_eq!(console.loop_cleared, 1);
        assert!(console.loop_regions.is_empty());
    }

    #[test]
    fn flips_after_the_last_frame_and_finishes_on_final_chunk() {
        let mut fs = state(3, 1, 2); // last_frame = 2, final chunk
        let mut console = RecordingConsole {
            pointer_samples: vec![20], // desired_frame clamps to last_frame = 2
            ..Default::default()
        };
        let mut uploader = RecordingUploader::default();
        fs.tick(&mut console, &mut uploader);
        assert_eq!(console.flips, 0);
        assert!(fs.is_finished());
    }

    #[test]
    fn flips_after_the_last_frame_of_a_non_final_chunk() {
        let mut fs = state(3, 0, 2); // last_frame = 2, not final
        let mut console = RecordingConsole {
            pointer_samples: vec![20],
            ..Default::default()
        };
        let mut uploader = RecordingUploader::default();
        fs.tick(&mut console, &mut uploader);
        assert_eq!(console.flips, 1);
        assert!(!fs.is_finished());
    }

    #[test]
    fn finishes_when_pointer_runs_out() {
        let mut fs = state(5, 0, 2);
        let mut console = RecordingConsole::default(); // no samples queued
        let mut uploader = RecordingUploader::default();
        fs.tick(&mut console, &mut uploader);
        assert!(fs.is_finished());
        assert!(uploader.order.is_empty());
    }
}
