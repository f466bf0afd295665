//! Producer side of the pipeline.
//!
//! A `BlockGenerator` stands for whatever produces audio (a generative
//! model in production, `SyntheticGenerator` here). The `GenerationWorker`
//! runs it on its own thread and feeds the transfer channel.

pub mod synthetic;
pub mod worker;

pub use synthetic::SyntheticGenerator;
pub use worker::{GenerationReport, GenerationWorker, StatsSummary};

use crate::audio::AudioBlock;

/// Source of audio blocks
///
/// Calls may take far longer than the audio they return and may fail;
/// the worker logs failures and keeps going.
pub trait BlockGenerator: Send {
    /// First block of a session
    fn generate_seed(&mut self, description: &str) -> anyhow::Result<AudioBlock>;

    /// Next block, conditioned on the trailing samples of the previous one
    ///
    /// The returned block should pick up where `tail` ends so that the
    /// crossfade joins related material.
    fn generate_continuation(
        &mut self,
        tail: &[f32],
        description: &str,
    ) -> anyhow::Result<AudioBlock>;

    fn sample_rate(&self) -> u32;
}
