pub mod assembler;
pub mod block;
pub mod buffer;
pub mod crossfade;
pub mod normalize;

pub use assembler::{Splice, StreamAssembler};
pub use block::{AudioBlock, BlockSamples};
pub use buffer::RollingBuffer;
pub use crossfade::CrossfadeWindow;
pub use normalize::normalize;
