use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use rolling_stats::Stats;
use serde::Serialize;

use crate::audio::normalize;
use crate::channel::{BlockSender, PutError};
use crate::config::GenerationConfig;
use crate::error::Result;
use crate::shutdown::ShutdownToken;

use super::BlockGenerator;

#[derive(Debug, Clone, Serialize)]
pub struct StatsSummary {
    pub count: usize,
    pub mean: f32,
    pub std_dev: f32,
    pub min: f32,
    pub max: f32,
}

impl StatsSummary {
    fn from_stats(stats: &Stats<f32>) -> Option<Self> {
        if stats.count == 0 {
            return None;
        }
        Some(Self {
            count: stats.count,
            mean: stats.mean,
            std_dev: stats.std_dev,
            min: stats.min,
            max: stats.max,
        })
    }
}

/// What the generation loop did before it stopped
#[derive(Debug, Clone, Default, Serialize)]
pub struct GenerationReport {
    /// Blocks handed to the transfer channel
    pub blocks: u64,
    /// Generator calls that failed or returned unusable blocks
    pub failures: u64,
    /// Seconds of audio handed to the transfer channel
    pub audio_secs: f64,
    /// Wall time per second of generated audio (> 1 is slower than playback)
    pub realtime_factor: Option<StatsSummary>,
}

/// Generation context: runs a `BlockGenerator` on a dedicated thread
///
/// The loop produces a seed block, then continuations conditioned on the
/// last `conditioning_secs` of the previous block. Each block is pushed
/// into the transfer channel, waiting while it is full. The loop ends when
/// the shutdown token fires or the playback side goes away.
pub struct GenerationWorker {
    handle: JoinHandle<GenerationReport>,
}

impl GenerationWorker {
    pub fn spawn(
        generator: Box<dyn BlockGenerator>,
        sender: BlockSender,
        config: &GenerationConfig,
        shutdown: ShutdownToken,
    ) -> Result<Self> {
        let config = config.clone();
        let handle = thread::Builder::new()
            .name("generation".into())
            .spawn(move || run_generation_loop(generator, sender, config, shutdown))?;
        Ok(Self { handle })
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Wait for the loop to exit; cancel the shutdown token first
    pub fn join(self) -> GenerationReport {
        match self.handle.join() {
            Ok(report) => report,
            Err(_) => {
                log::error!("Generation thread panicked");
                GenerationReport::default()
            }
        }
    }
}

fn run_generation_loop(
    mut generator: Box<dyn BlockGenerator>,
    sender: BlockSender,
    config: GenerationConfig,
    shutdown: ShutdownToken,
) -> GenerationReport {
    let sample_rate = generator.sample_rate();
    let tail_len = (config.conditioning_secs * sample_rate as f32) as usize;
    let pause = Duration::from_millis(config.yield_ms);

    let mut report = GenerationReport::default();
    let mut rtf_stats: Stats<f32> = Stats::new();
    let mut tail: Option<Vec<f32>> = None;

    while !shutdown.is_cancelled() {
        let started = Instant::now();
        let result = match tail.as_deref() {
            None => generator.generate_seed(&config.description),
            Some(t) => generator.generate_continuation(t, &config.description),
        };
        let elapsed = started.elapsed();

        match result {
            Ok(block) => match normalize(&block) {
                Ok(samples) => {
                    let audio_secs = samples.len() as f32 / sample_rate as f32;
                    if audio_secs > 0.0 {
                        rtf_stats.update(elapsed.as_secs_f32() / audio_secs);
                    }
                    log::info!(
                        "Generated block #{}: {:.2}s of audio in {:.2}s",
                        report.blocks,
                        audio_secs,
                        elapsed.as_secs_f32()
                    );

                    match sender.put_until(block, &shutdown) {
                        Ok(()) => {
                            report.blocks += 1;
                            report.audio_secs += audio_secs as f64;
                            let start = samples.len() - tail_len.min(samples.len());
                            tail = Some(samples[start..].to_vec());
                        }
                        Err(PutError::Cancelled(_)) => break,
                        Err(PutError::Closed(_)) => {
                            log::info!("Playback side closed, stopping generation");
                            break;
                        }
                    }
                }
                Err(e) => {
                    report.failures += 1;
                    log::error!("Generator returned a malformed block: {}", e);
                }
            },
            Err(_) if shutdown.is_cancelled() => break,
            Err(e) => {
                report.failures += 1;
                log::error!("Generation failed: {:#}", e);
            }
        }

        thread::sleep(pause);
    }

    report.realtime_factor = StatsSummary::from_stats(&rtf_stats);
    log::debug!(
        "Generation loop exiting after {} blocks, {} failures",
        report.blocks,
        report.failures
    );
    report
}
