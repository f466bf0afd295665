use std::sync::Arc;

use crate::audio::{AudioBlock, CrossfadeWindow, Splice, StreamAssembler, normalize};
use crate::channel::BlockReceiver;
use crate::config::{StreamConfig, UnderflowPolicy};
use crate::error::PlaybackError;
use crate::shutdown::ShutdownToken;

use super::stats::PlaybackStats;

/// Conditions reported by the audio driver alongside a callback
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallbackStatus {
    /// The previous period reached the hardware incomplete
    pub output_underflow: bool,
}

/// Result of one callback invocation that did not fail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FillOutcome {
    /// The output was filled with buffered audio
    Emitted,
    /// Not enough audio was available; the output is silent and nothing was consumed
    Underrun,
    /// Shutdown was requested before enough audio could be gathered; the output is silent
    Stopped,
}

/// Real-time side of the pipeline
///
/// Owns the rolling buffer and the consumer end of the transfer channel.
/// Each call to `fill` makes sure at least `frames + W` samples are
/// buffered (pulling and stitching blocks as needed) and then hands out
/// exactly `frames` samples. The extra window stays behind so the next
/// block always has a tail to blend against.
///
/// `fill` never waits: the channel is only polled.
pub struct PlaybackDriver {
    assembler: StreamAssembler,
    receiver: BlockReceiver,
    policy: UnderflowPolicy,
    shutdown: ShutdownToken,
    stats: Arc<PlaybackStats>,
    blocks_taken: u64,
    in_underrun: bool,
}

impl PlaybackDriver {
    pub fn new(config: &StreamConfig, receiver: BlockReceiver, shutdown: ShutdownToken) -> Self {
        Self::with_window(
            CrossfadeWindow::new(config.crossfade_samples()),
            receiver,
            config.playback.underflow_policy,
            shutdown,
        )
    }

    pub fn with_window(
        window: CrossfadeWindow,
        receiver: BlockReceiver,
        policy: UnderflowPolicy,
        shutdown: ShutdownToken,
    ) -> Self {
        Self {
            assembler: StreamAssembler::new(window),
            receiver,
            policy,
            shutdown,
            stats: PlaybackStats::new(),
            blocks_taken: 0,
            in_underrun: false,
        }
    }

    /// Shared handle to the callback counters
    pub fn stats(&self) -> Arc<PlaybackStats> {
        Arc::clone(&self.stats)
    }

    /// Samples currently waiting in the rolling buffer
    pub fn buffered(&self) -> usize {
        self.assembler.buffer().len()
    }

    pub fn window_len(&self) -> usize {
        self.assembler.window_len()
    }

    pub fn shutdown_requested(&self) -> bool {
        self.shutdown.is_cancelled()
    }

    /// Fill `out` completely for one driver period
    ///
    /// On error the output has already been silenced; the caller decides
    /// whether to stop the stream.
    pub fn fill(
        &mut self,
        out: &mut [f32],
        status: CallbackStatus,
    ) -> Result<FillOutcome, PlaybackError> {
        self.stats.record_callback();

        if status.output_underflow {
            self.stats.record_driver_underflow();
            match self.policy {
                UnderflowPolicy::Abort => {
                    log::error!("Driver reported output underflow, aborting stream");
                    out.fill(0.0);
                    return Err(PlaybackError::DriverUnderflow);
                }
                UnderflowPolicy::Continue => {
                    log::warn!("Driver reported output underflow, continuing");
                }
            }
        }

        let frames = out.len();
        let required = frames + self.assembler.window_len();

        while self.assembler.buffer().len() < required {
            if self.shutdown.is_cancelled() {
                out.fill(0.0);
                return Ok(FillOutcome::Stopped);
            }

            let Some(block) = self.receiver.try_take() else {
                out.fill(0.0);
                self.note_underrun(required);
                return Ok(FillOutcome::Underrun);
            };

            if let Err(e) = self.ingest(&block) {
                out.fill(0.0);
                return Err(e);
            }
        }

        let emitted = self.assembler.buffer_mut().pop_into(out);
        debug_assert!(emitted);

        if self.in_underrun {
            self.in_underrun = false;
            log::info!("Playback resumed, {} samples buffered", self.buffered());
        }
        self.stats.record_emit(frames, self.buffered());

        Ok(FillOutcome::Emitted)
    }

    fn ingest(&mut self, block: &AudioBlock) -> Result<(), PlaybackError> {
        let ordinal = self.blocks_taken;
        self.blocks_taken += 1;

        let samples = normalize(block).map_err(|source| PlaybackError::Format {
            block: ordinal,
            source,
        })?;
        let splice = self.assembler.append(&samples);

        match splice {
            Splice::Blended => {
                log::debug!("Block #{} crossfaded ({} samples)", ordinal, samples.len())
            }
            Splice::ColdStart => log::debug!(
                "Block #{} appended without blend ({} samples)",
                ordinal,
                samples.len()
            ),
            Splice::ShortBlock => log::warn!(
                "Block #{} shorter than crossfade window ({} < {}), appended with hard seam",
                ordinal,
                samples.len(),
                self.assembler.window_len()
            ),
        }
        self.stats.record_splice(splice, self.buffered());

        Ok(())
    }

    fn note_underrun(&mut self, required: usize) {
        let new_episode = !self.in_underrun;
        if new_episode {
            self.in_underrun = true;
            log::warn!(
                "Transfer channel empty with {} of {} samples buffered, emitting silence",
                self.buffered(),
                required
            );
        }
        self.stats.record_underrun(new_episode);
    }
}
