use thiserror::Error;

#[derive(Error, Debug)]
pub enum StreamError {
    #[error("Audio device error: {0}")]
    AudioDevice(String),

    #[error("Audio stream error: {0}")]
    AudioStream(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to start worker thread: {0}")]
    Spawn(#[from] std::io::Error),

    #[error(transparent)]
    Format(#[from] FormatError),

    #[error(transparent)]
    Playback(#[from] PlaybackError),
}

/// A block whose layout cannot be reduced to mono samples.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FormatError {
    #[error("Shape {shape:?} describes {expected} samples, block holds {actual}")]
    ShapeMismatch {
        shape: Vec<usize>,
        expected: usize,
        actual: usize,
    },

    #[error("Shape {shape:?} describes more samples than can be addressed")]
    ShapeOverflow { shape: Vec<usize> },

    #[error("Fixed-point sample {value} at index {index} is outside [-32768, 32768]")]
    SampleOutOfRange { index: usize, value: i32 },

    #[error("Unsupported rank {rank} after squeezing shape {shape:?}")]
    UnsupportedRank { shape: Vec<usize>, rank: usize },

    #[error("Block has an empty channel axis")]
    NoChannels,
}

/// Fatal conditions reported by the playback callback.
///
/// Recoverable underruns are not errors; see `FillOutcome::Underrun`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PlaybackError {
    #[error("Driver reported output underflow")]
    DriverUnderflow,

    #[error("Block #{block} is malformed: {source}")]
    Format {
        block: u64,
        #[source]
        source: FormatError,
    },
}

/// The other end of the transfer channel has gone away.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("Transfer channel closed")]
pub struct ChannelClosed;

pub type Result<T> = std::result::Result<T, StreamError>;
