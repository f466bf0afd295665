use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use serde::Serialize;

use crate::audio::Splice;

/// Counters updated by the playback callback and read from other threads
///
/// Every update is a relaxed atomic add, so recording never blocks the
/// callback.
#[derive(Debug, Default)]
pub struct PlaybackStats {
    callbacks: AtomicU64,
    frames_emitted: AtomicU64,
    underrun_periods: AtomicU64,
    underrun_episodes: AtomicU64,
    blocks_ingested: AtomicU64,
    seams_blended: AtomicU64,
    cold_starts: AtomicU64,
    short_blocks: AtomicU64,
    driver_underflows: AtomicU64,
    buffered_samples: AtomicUsize,
}

/// Point-in-time copy of `PlaybackStats`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PlaybackSnapshot {
    pub callbacks: u64,
    pub frames_emitted: u64,
    pub underrun_periods: u64,
    pub underrun_episodes: u64,
    pub blocks_ingested: u64,
    pub seams_blended: u64,
    pub cold_starts: u64,
    pub short_blocks: u64,
    pub driver_underflows: u64,
    pub buffered_samples: usize,
}

impl PlaybackStats {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub(crate) fn record_callback(&self) {
        self.callbacks.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_emit(&self, frames: usize, buffered: usize) {
        self.frames_emitted.fetch_add(frames as u64, Ordering::Relaxed);
        self.buffered_samples.store(buffered, Ordering::Relaxed);
    }

    pub(crate) fn record_underrun(&self, new_episode: bool) {
        self.underrun_periods.fetch_add(1, Ordering::Relaxed);
        if new_episode {
            self.underrun_episodes.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub(crate) fn record_splice(&self, splice: Splice, buffered: usize) {
        self.blocks_ingested.fetch_add(1, Ordering::Relaxed);
        let counter = match splice {
            Splice::Blended => &self.seams_blended,
            Splice::ColdStart => &self.cold_starts,
            Splice::ShortBlock => &self.short_blocks,
        };
        counter.fetch_add(1, Ordering::Relaxed);
        self.buffered_samples.store(buffered, Ordering::Relaxed);
    }

    pub(crate) fn record_driver_underflow(&self) {
        self.driver_underflows.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> PlaybackSnapshot {
        PlaybackSnapshot {
            callbacks: self.callbacks.load(Ordering::Relaxed),
            frames_emitted: self.frames_emitted.load(Ordering::Relaxed),
            underrun_periods: self.underrun_periods.load(Ordering::Relaxed),
            underrun_episodes: self.underrun_episodes.load(Ordering::Relaxed),
            blocks_ingested: self.blocks_ingested.load(Ordering::Relaxed),
            seams_blended: self.seams_blended.load(Ordering::Relaxed),
            cold_starts: self.cold_starts.load(Ordering::Relaxed),
            short_blocks: self.short_blocks.load(Ordering::Relaxed),
            driver_underflows: self.driver_underflows.load(Ordering::Relaxed),
            buffered_samples: self.buffered_samples.load(Ordering::Relaxed),
        }
    }
}
