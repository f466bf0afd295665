use super::buffer::RollingBuffer;
use super::crossfade::CrossfadeWindow;

/// How an incoming block was joined to the buffered audio
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Splice {
    /// The buffer tail and block head were crossfaded
    Blended,
    /// Fewer than one window of audio was buffered; the block was appended as is
    ColdStart,
    /// The block was shorter than the window; appended as is with a hard seam
    ShortBlock,
}

/// Stitches normalized blocks onto the rolling buffer
///
/// When at least one crossfade window of audio is buffered, the newest
/// `W` buffered samples are blended with the first `W` samples of the
/// incoming block and the rest of the block is appended. Otherwise the
/// block is appended unmodified.
///
/// All work is proportional to the block length and nothing blocks, so
/// this runs inside the playback callback.
pub struct StreamAssembler {
    buffer: RollingBuffer,
    window: CrossfadeWindow,
}

impl StreamAssembler {
    pub fn new(window: CrossfadeWindow) -> Self {
        Self {
            buffer: RollingBuffer::new(),
            window,
        }
    }

    /// Merge a normalized block into the buffer
    pub fn append(&mut self, block: &[f32]) -> Splice {
        let w = self.window.len();

        if self.buffer.len() < w {
            self.buffer.extend_from_slice(block);
            return Splice::ColdStart;
        }
        if block.len() < w {
            self.buffer.extend_from_slice(block);
            return Splice::ShortBlock;
        }

        let (head, rest) = block.split_at(w);
        if let Some(tail) = self.buffer.tail_mut(w) {
            self.window.blend(tail, head);
        }
        self.buffer.extend_from_slice(rest);
        Splice::Blended
    }

    pub fn window_len(&self) -> usize {
        self.window.len()
    }

    pub fn buffer(&self) -> &RollingBuffer {
        &self.buffer
    }

    pub fn buffer_mut(&mut self) -> &mut RollingBuffer {
        &mut self.buffer
    }
}
