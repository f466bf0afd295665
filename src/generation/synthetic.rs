use std::f64::consts::TAU;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::bail;
use rand::RngExt;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Normal};

use crate::audio::{AudioBlock, BlockSamples};
use crate::config::SyntheticConfig;
use crate::constants::PUT_POLL_INTERVAL_MS;
use crate::shutdown::ShutdownToken;

use super::BlockGenerator;

/// Triads in F minor, cycled one per block
const PROGRESSION: [[f64; 3]; 4] = [
    [174.61, 207.65, 261.63], // Fm
    [138.59, 174.61, 207.65], // Db
    [207.65, 261.63, 311.13], // Ab
    [155.56, 196.00, 233.08], // Eb
];

const DEFAULT_AMPLITUDE: f32 = 0.3;
const MIN_AMPLITUDE: f32 = 0.05;
const MAX_AMPLITUDE: f32 = 0.6;

/// RMS of three equal-amplitude sines relative to their summed peak
const TRIAD_RMS_RATIO: f32 = 0.408;

/// Stand-in for a generative model
///
/// Renders one sustained triad per block with phase carried across blocks
/// and the level matched to the conditioning tail. Generation can be made
/// slower than real time and made to fail at random.
pub struct SyntheticGenerator {
    config: SyntheticConfig,
    sample_rate: u32,
    rng: ChaCha8Rng,
    latency: Option<Normal<f32>>,
    chord: usize,
    phases: [f64; 3],
    shutdown: ShutdownToken,
}

impl SyntheticGenerator {
    pub fn new(config: &SyntheticConfig, sample_rate: u32) -> anyhow::Result<Self> {
        let latency = if config.latency_factor > 0.0 {
            Some(Normal::new(
                config.latency_factor,
                config.latency_factor * config.latency_jitter,
            )?)
        } else {
            None
        };

        Ok(Self {
            config: config.clone(),
            sample_rate,
            rng: create_rng(config.seed),
            latency,
            chord: 0,
            phases: [0.0; 3],
            shutdown: ShutdownToken::new(),
        })
    }

    /// Cut simulated latency short once `shutdown` fires
    pub fn with_shutdown(mut self, shutdown: ShutdownToken) -> Self {
        self.shutdown = shutdown;
        self
    }

    fn block_len(&self) -> usize {
        (self.config.block_secs * self.sample_rate as f32) as usize
    }

    /// Sleep as long as a model would take for one block
    ///
    /// Fails if shutdown is requested while waiting.
    fn simulate_latency(&mut self) -> anyhow::Result<()> {
        let Some(latency) = self.latency.as_ref() else {
            return Ok(());
        };
        let factor = latency.sample(&mut self.rng).max(0.0);
        let deadline = Instant::now() + Duration::from_secs_f32(self.config.block_secs * factor);
        let slice = Duration::from_millis(PUT_POLL_INTERVAL_MS);

        loop {
            if self.shutdown.is_cancelled() {
                bail!("generation cancelled");
            }
            let now = Instant::now();
            if now >= deadline {
                return Ok(());
            }
            thread::sleep(slice.min(deadline - now));
        }
    }

    fn render(&mut self, amplitude: f32) -> AudioBlock {
        let len = self.block_len();
        let freqs = PROGRESSION[self.chord % PROGRESSION.len()];
        let gain = amplitude / freqs.len() as f32;
        let sr = self.sample_rate as f64;

        let mut samples = vec![0.0f32; len];
        for (phase, freq) in self.phases.iter_mut().zip(freqs) {
            let step = TAU * freq / sr;
            for s in samples.iter_mut() {
                *s += gain * phase.sin() as f32;
                *phase = (*phase + step) % TAU;
            }
        }
        self.chord += 1;

        if self.config.fixed_point {
            let fixed = samples
                .iter()
                .map(|&s| (s * 32767.0).clamp(-32768.0, 32767.0) as i16)
                .collect();
            AudioBlock::with_shape(vec![1, 1, len], BlockSamples::I16(fixed))
        } else {
            AudioBlock::mono_f32(samples)
        }
    }
}

impl BlockGenerator for SyntheticGenerator {
    fn generate_seed(&mut self, description: &str) -> anyhow::Result<AudioBlock> {
        self.chord = description.bytes().map(usize::from).sum::<usize>() % PROGRESSION.len();
        self.simulate_latency()?;
        Ok(self.render(DEFAULT_AMPLITUDE))
    }

    fn generate_continuation(
        &mut self,
        tail: &[f32],
        _description: &str,
    ) -> anyhow::Result<AudioBlock> {
        self.simulate_latency()?;
        if self.rng.random::<f32>() < self.config.failure_rate {
            bail!("simulated generation failure");
        }

        let amplitude = if tail.is_empty() {
            DEFAULT_AMPLITUDE
        } else {
            let rms = (tail.iter().map(|&x| x * x).sum::<f32>() / tail.len() as f32).sqrt();
            (rms / TRIAD_RMS_RATIO).clamp(MIN_AMPLITUDE, MAX_AMPLITUDE)
        };
        Ok(self.render(amplitude))
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }
}

fn create_rng(seed: Option<u64>) -> ChaCha8Rng {
    match seed {
        Some(s) => ChaCha8Rng::seed_from_u64(s),
        None => rand::make_rng(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::normalize;

    fn fast_config() -> SyntheticConfig {
        SyntheticConfig {
            block_secs: 0.25,
            latency_factor: 0.0,
            latency_jitter: 0.0,
            failure_rate: 0.0,
            fixed_point: false,
            seed: Some(7),
        }
    }

    #[test]
    fn test_block_length_and_range() {
        let mut generator = SyntheticGenerator::new(&fast_config(), 32_000).unwrap();
        let block = generator.generate_seed("test").unwrap();
        let samples = normalize(&block).unwrap();

        assert_eq!(samples.len(), 8000);
        assert!(samples.iter().all(|s| s.abs() <= 1.0));
        assert!(samples.iter().any(|&s| s != 0.0));
    }

    #[test]
    fn test_fixed_point_uses_model_layout() {
        let mut config = fast_config();
        config.fixed_point = true;
        let mut generator = SyntheticGenerator::new(&config, 32_000).unwrap();
        let block = generator.generate_seed("test").unwrap();

        assert_eq!(block.shape(), &[1, 1, 8000]);
        assert!(matches!(block.samples(), BlockSamples::I16(_)));
        assert_eq!(normalize(&block).unwrap().len(), 8000);
    }

    #[test]
    fn test_continuation_matches_tail_level() {
        let mut generator = SyntheticGenerator::new(&fast_config(), 32_000).unwrap();
        let seed = normalize(&generator.generate_seed("test").unwrap()).unwrap();
        let quiet: Vec<f32> = seed.iter().map(|s| s * 0.25).collect();

        let next = normalize(&generator.generate_continuation(&quiet, "test").unwrap()).unwrap();
        let peak_seed = seed.iter().fold(0.0f32, |a, &b| a.max(b.abs()));
        let peak_next = next.iter().fold(0.0f32, |a, &b| a.max(b.abs()));
        assert!(peak_next < peak_seed);
    }

    #[test]
    fn test_failure_rate_one_always_fails() {
        let mut config = fast_config();
        config.failure_rate = 1.0;
        let mut generator = SyntheticGenerator::new(&config, 32_000).unwrap();
        assert!(generator.generate_seed("test").is_ok());
        assert!(generator.generate_continuation(&[0.1; 16], "test").is_err());
    }

    #[test]
    fn test_shutdown_interrupts_simulated_latency() {
        let mut config = fast_config();
        config.block_secs = 20.0;
        config.latency_factor = 1.0;
        let shutdown = ShutdownToken::new();
        let mut generator = SyntheticGenerator::new(&config, 32_000)
            .unwrap()
            .with_shutdown(shutdown.clone());

        let canceller = {
            let shutdown = shutdown.clone();
            thread::spawn(move || {
                thread::sleep(Duration::from_millis(30));
                shutdown.cancel();
            })
        };

        let started = Instant::now();
        assert!(generator.generate_seed("test").is_err());
        assert!(started.elapsed() < Duration::from_secs(2));
        canceller.join().unwrap();
    }
}
