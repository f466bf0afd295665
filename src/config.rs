//! Configuration for the seamless-stream pipeline.
//!
//! Every section has sensible defaults; a TOML file only needs to name the
//! fields it overrides:
//!
//! ```toml
//! [crossfade]
//! window = "40ms"
//!
//! [channel]
//! capacity = 4
//!
//! [playback]
//! underflow_policy = "continue"
//! ```

use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use serde::Deserialize;

use crate::constants::{CHANNELS, DEFAULT_CHANNEL_CAPACITY, DEFAULT_CROSSFADE_SAMPLES, SAMPLE_RATE};
use crate::error::{Result, StreamError};

/// Crossfade length as written in a config file or on the command line
///
/// Can be given either as a sample count or as a duration, which is
/// converted to samples at the session sample rate.
///
/// # Parsing formats
/// - `1000` - samples (no suffix)
/// - `1000smp` - samples (explicit)
/// - `31.25ms` - milliseconds
/// - `0.05s` - seconds
///
/// # Example
/// ```
/// use seamless_stream::config::CrossfadeLength;
///
/// let len: CrossfadeLength = "31.25ms".parse().unwrap();
/// assert_eq!(len.to_samples(32_000), 1000);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(try_from = "CrossfadeLengthRepr")]
pub enum CrossfadeLength {
    Samples(usize),
    Millis(f32),
}

impl CrossfadeLength {
    /// Resolve to a whole number of samples at `sample_rate`
    pub fn to_samples(&self, sample_rate: u32) -> usize {
        match *self {
            Self::Samples(n) => n,
            Self::Millis(ms) => (ms * sample_rate as f32 / 1000.0).round() as usize,
        }
    }
}

impl Default for CrossfadeLength {
    fn default() -> Self {
        Self::Samples(DEFAULT_CROSSFADE_SAMPLES)
    }
}

impl fmt::Display for CrossfadeLength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Samples(n) => write!(f, "{}smp", n),
            Self::Millis(ms) => write!(f, "{:.3}ms", ms),
        }
    }
}

impl FromStr for CrossfadeLength {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let s = s.trim();

        if let Some(num) = s.strip_suffix("ms") {
            let ms: f32 = num
                .trim()
                .parse()
                .map_err(|_| format!("invalid duration: {}", s))?;
            if !(ms >= 0.0) {
                return Err("duration must not be negative".to_string());
            }
            return Ok(Self::Millis(ms));
        }

        if let Some(num) = s.strip_suffix('s') {
            let secs: f32 = num
                .trim()
                .parse()
                .map_err(|_| format!("invalid duration: {}", s))?;
            if !(secs >= 0.0) {
                return Err("duration must not be negative".to_string());
            }
            return Ok(Self::Millis(secs * 1000.0));
        }

        let num = s.strip_suffix("smp").unwrap_or(s);
        let samples: usize = num
            .trim()
            .parse()
            .map_err(|_| format!("invalid sample count: {}", s))?;
        Ok(Self::Samples(samples))
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum CrossfadeLengthRepr {
    Samples(usize),
    Text(String),
}

impl TryFrom<CrossfadeLengthRepr> for CrossfadeLength {
    type Error = String;

    fn try_from(repr: CrossfadeLengthRepr) -> std::result::Result<Self, Self::Error> {
        match repr {
            CrossfadeLengthRepr::Samples(n) => Ok(Self::Samples(n)),
            CrossfadeLengthRepr::Text(s) => s.parse(),
        }
    }
}

/// What the playback callback does when the driver reports that the
/// previous period was not delivered in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum UnderflowPolicy {
    /// Emit silence and report a fatal error so the stream is torn down
    #[default]
    Abort,
    /// Log the underflow and keep streaming
    Continue,
}

/// System-wide streaming configuration
///
/// Use `StreamConfig::default()` for the standard 32 kHz mono session.
///
/// # Example
/// ```
/// use seamless_stream::config::StreamConfig;
///
/// let mut config = StreamConfig::default();
/// config.channel.capacity = 4;
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct StreamConfig {
    /// Output device configuration
    pub audio: AudioConfig,
    /// Seam blending configuration
    pub crossfade: CrossfadeConfig,
    /// Producer/consumer channel configuration
    pub channel: ChannelConfig,
    /// Generation loop configuration
    pub generation: GenerationConfig,
    /// Synthetic producer configuration
    pub synthetic: SyntheticConfig,
    /// Playback callback configuration
    pub playback: PlaybackConfig,
}

/// Output device configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    /// Sample rate in Hz, shared with the producer
    pub sample_rate: u32,
    /// Number of output channels (must be 1)
    pub channels: u16,
    /// Device period in frames; `None` lets the driver choose
    pub buffer_size: Option<usize>,
}

/// Crossfade stitching configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CrossfadeConfig {
    /// Length of the blend between consecutive blocks
    pub window: CrossfadeLength,
}

/// Transfer channel configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ChannelConfig {
    /// Maximum number of blocks buffered between producer and playback
    pub capacity: usize,
}

/// Generation context configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// Text prompt handed to every generation request
    pub description: String,
    /// Seconds of trailing audio used to condition each continuation
    pub conditioning_secs: f32,
    /// Pause between iterations in milliseconds
    pub yield_ms: u64,
}

/// Synthetic producer configuration
///
/// The synthetic generator stands in for a generative model. It renders
/// tones and can be slowed down or made to fail to exercise underrun and
/// error paths.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SyntheticConfig {
    /// Length of every generated block in seconds
    pub block_secs: f32,
    /// Wall time spent per second of audio (1.33 = 40 s for a 30 s block)
    pub latency_factor: f32,
    /// Relative standard deviation of the simulated latency
    pub latency_jitter: f32,
    /// Probability (0-1) that a continuation request fails
    pub failure_rate: f32,
    /// Emit 16-bit fixed-point blocks shaped `[1, 1, n]` instead of flat f32
    pub fixed_point: bool,
    /// RNG seed for reproducible runs
    pub seed: Option<u64>,
}

/// Playback callback configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PlaybackConfig {
    /// Reaction to driver-reported underflow
    pub underflow_policy: UnderflowPolicy,
}

impl StreamConfig {
    /// Parse a TOML document; missing sections and fields take defaults
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| StreamError::Config(e.to_string()))
    }

    /// Read and parse a TOML configuration file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .map_err(|e| StreamError::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_toml_str(&content)
    }

    /// Crossfade window length in samples at the configured sample rate
    pub fn crossfade_samples(&self) -> usize {
        self.crossfade.window.to_samples(self.audio.sample_rate)
    }

    /// Reject combinations the pipeline cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.audio.sample_rate == 0 {
            return Err(StreamError::Config("sample rate must be positive".into()));
        }
        if self.audio.channels != CHANNELS {
            return Err(StreamError::Config(format!(
                "only mono output is supported, got {} channels",
                self.audio.channels
            )));
        }
        if self.audio.buffer_size == Some(0) {
            return Err(StreamError::Config("buffer size must be positive".into()));
        }
        if self.channel.capacity == 0 {
            return Err(StreamError::Config("channel capacity must be positive".into()));
        }
        if !(self.generation.conditioning_secs >= 0.0) {
            return Err(StreamError::Config(
                "conditioning window must not be negative".into(),
            ));
        }
        if !(self.synthetic.block_secs > 0.0) {
            return Err(StreamError::Config("block duration must be positive".into()));
        }
        if !(self.synthetic.latency_factor >= 0.0) || !(self.synthetic.latency_jitter >= 0.0) {
            return Err(StreamError::Config(
                "latency factor and jitter must not be negative".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.synthetic.failure_rate) {
            return Err(StreamError::Config(
                "failure rate must be between 0 and 1".into(),
            ));
        }
        Ok(())
    }
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            sample_rate: SAMPLE_RATE,
            channels: CHANNELS,
            buffer_size: None,
        }
    }
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            description: "Tech House, Deep, Medium, F Minor, 124 bpm".to_string(),
            conditioning_secs: 5.0,
            yield_ms: 100,
        }
    }
}

impl Default for SyntheticConfig {
    fn default() -> Self {
        Self {
            block_secs: 30.0,
            latency_factor: 0.5,
            latency_jitter: 0.1,
            failure_rate: 0.0,
            fixed_point: false,
            seed: None,
        }
    }
}
