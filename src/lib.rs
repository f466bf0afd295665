pub mod audio;
pub mod channel;
pub mod config;
pub mod constants;
pub mod error;
pub mod generation;
pub mod pipeline;
pub mod playback;
pub mod shutdown;

pub use config::StreamConfig;
pub use error::{Result, StreamError};
pub use pipeline::Pipeline;
pub use shutdown::ShutdownToken;
