//! Session-wide constants agreed between the producer and the output device.
//!
//! The generator and the device must run at the same rate; no resampling is
//! performed anywhere in the pipeline.

/// Output sample rate in Hz, shared by every block and the device stream.
pub const SAMPLE_RATE: u32 = 32_000;

/// Output channel count. The whole pipeline is mono.
pub const CHANNELS: u16 = 1;

/// Divisor mapping 16-bit fixed-point samples into [-1, 1].
pub const FIXED_POINT_SCALE: f32 = 32_768.0;

/// Default crossfade length in samples (~31 ms at 32 kHz).
pub const DEFAULT_CROSSFADE_SAMPLES: usize = 1000;

/// Default number of blocks the transfer channel may hold.
///
/// Each block can be tens of seconds long, so this bounds peak memory.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 10;

/// How often a producer blocked on a full channel wakes up to check for
/// shutdown.
pub const PUT_POLL_INTERVAL_MS: u64 = 50;
