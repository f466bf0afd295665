use seamless_stream::audio::AudioBlock;
use seamless_stream::channel::BlockSender;

/// Mono block holding `value` for `secs` seconds
pub fn constant_block(value: f32, secs: f32, sample_rate: u32) -> AudioBlock {
    let len = (secs * sample_rate as f32) as usize;
    AudioBlock::mono_f32(vec![value; len])
}

/// Blocks that become available at fixed points on a simulated clock
///
/// Stands in for a producer whose generation time is known in advance.
pub struct ScheduledProducer {
    pending: Vec<(f64, AudioBlock)>,
}

impl ScheduledProducer {
    /// `arrivals` must be sorted by time
    pub fn new(arrivals: Vec<(f64, AudioBlock)>) -> Self {
        let mut pending = arrivals;
        pending.reverse();
        Self { pending }
    }

    /// Push every block due at or before `now`; returns how many were pushed
    pub fn release_due(&mut self, now: f64, sender: &BlockSender) -> usize {
        let mut released = 0;
        while self.pending.last().is_some_and(|(at, _)| *at <= now) {
            if let Some((_, block)) = self.pending.pop() {
                sender.put(block).expect("playback side closed");
                released += 1;
            }
        }
        released
    }

    #[allow(dead_code)]
    pub fn is_done(&self) -> bool {
        self.pending.is_empty()
    }
}
