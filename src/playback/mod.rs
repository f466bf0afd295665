pub mod driver;
pub mod offline;
pub mod output;
pub mod stats;

pub use driver::{CallbackStatus, FillOutcome, PlaybackDriver};
pub use offline::{OfflineRenderer, RenderSummary};
pub use output::{AudioPlayback, StreamEvent};
pub use stats::{PlaybackSnapshot, PlaybackStats};
