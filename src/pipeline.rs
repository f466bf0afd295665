use crate::channel::block_channel;
use crate::config::StreamConfig;
use crate::error::{Result, StreamError};
use crate::generation::{BlockGenerator, GenerationWorker};
use crate::playback::PlaybackDriver;
use crate::shutdown::ShutdownToken;

/// Both halves of a running session
///
/// The generation worker is already running; the driver still has to be
/// handed to a device stream or an `OfflineRenderer`. Cancel `shutdown`
/// and join the worker to tear the session down.
pub struct Pipeline {
    pub driver: PlaybackDriver,
    pub worker: GenerationWorker,
    pub shutdown: ShutdownToken,
}

impl Pipeline {
    pub fn start(config: &StreamConfig, generator: Box<dyn BlockGenerator>) -> Result<Self> {
        Self::start_with_shutdown(config, generator, ShutdownToken::new())
    }

    /// Like `start`, tied to a token the caller already shares, e.g. with
    /// the generator itself
    pub fn start_with_shutdown(
        config: &StreamConfig,
        generator: Box<dyn BlockGenerator>,
        shutdown: ShutdownToken,
    ) -> Result<Self> {
        config.validate()?;
        if generator.sample_rate() != config.audio.sample_rate {
            return Err(StreamError::Config(format!(
                "generator runs at {} Hz but the output is configured for {} Hz",
                generator.sample_rate(),
                config.audio.sample_rate
            )));
        }

        let (tx, rx) = block_channel(config.channel.capacity);
        let driver = PlaybackDriver::new(config, rx, shutdown.clone());
        let worker = GenerationWorker::spawn(generator, tx, &config.generation, shutdown.clone())?;

        log::info!(
            "Pipeline started: {} Hz, crossfade {} samples, channel capacity {}",
            config.audio.sample_rate,
            config.crossfade_samples(),
            config.channel.capacity
        );

        Ok(Self {
            driver,
            worker,
            shutdown,
        })
    }
}
