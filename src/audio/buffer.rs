use std::collections::VecDeque;

/// FIFO store of canonical mono samples awaiting playback
///
/// Samples enter at the back and leave from the front. The newest samples
/// can be rewritten in place, which is how seams are blended.
pub struct RollingBuffer {
    samples: VecDeque<f32>,
}

impl RollingBuffer {
    pub fn new() -> Self {
        Self {
            samples: VecDeque::new(),
        }
    }

    /// Append samples at the back
    pub fn extend_from_slice(&mut self, data: &[f32]) {
        self.samples.extend(data.iter().copied());
    }

    /// Mutable access to the newest `count` samples, oldest to newest
    ///
    /// Returns `None` if fewer than `count` samples are buffered.
    pub fn tail_mut(&mut self, count: usize) -> Option<impl Iterator<Item = &mut f32>> {
        let len = self.samples.len();
        if count > len {
            return None;
        }
        Some(self.samples.range_mut(len - count..))
    }

    /// Move the oldest `out.len()` samples into `out`
    ///
    /// Returns `false` and leaves both sides untouched if not enough samples
    /// are buffered.
    pub fn pop_into(&mut self, out: &mut [f32]) -> bool {
        let n = out.len();
        if n > self.samples.len() {
            return false;
        }
        for (dst, src) in out.iter_mut().zip(self.samples.drain(..n)) {
            *dst = src;
        }
        true
    }

    /// Copy of the newest `count` samples (fewer if not available)
    pub fn latest(&self, count: usize) -> Vec<f32> {
        let len = self.samples.len();
        let start = len - count.min(len);
        self.samples.range(start..).copied().collect()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

impl Default for RollingBuffer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fifo_order() {
        let mut buffer = RollingBuffer::new();
        buffer.extend_from_slice(&[1.0, 2.0, 3.0]);
        buffer.extend_from_slice(&[4.0, 5.0]);

        let mut out = [0.0; 2];
        assert!(buffer.pop_into(&mut out));
        assert_eq!(out, [1.0, 2.0]);
        assert_eq!(buffer.latest(10), vec![3.0, 4.0, 5.0]);
    }

    #[test]
    fn test_pop_exact_length_drains_buffer() {
        let mut buffer = RollingBuffer::new();
        buffer.extend_from_slice(&[0.1, 0.2, 0.3]);

        let mut out = [0.0; 3];
        assert!(buffer.pop_into(&mut out));
        assert_eq!(out, [0.1, 0.2, 0.3]);
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_pop_more_than_available_is_refused() {
        let mut buffer = RollingBuffer::new();
        buffer.extend_from_slice(&[1.0, 2.0]);

        let mut out = [9.0; 3];
        assert!(!buffer.pop_into(&mut out));
        assert_eq!(out, [9.0; 3]);
        assert_eq!(buffer.len(), 2);
    }

    #[test]
    fn test_tail_mut_rewrites_newest() {
        let mut buffer = RollingBuffer::new();
        buffer.extend_from_slice(&[1.0, 2.0, 3.0, 4.0]);

        for s in buffer.tail_mut(2).unwrap() {
            *s = 0.0;
        }
        assert_eq!(buffer.latest(4), vec![1.0, 2.0, 0.0, 0.0]);
        assert!(buffer.tail_mut(5).is_none());
    }
}
