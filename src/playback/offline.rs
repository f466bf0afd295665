use std::thread;
use std::time::{Duration, Instant};

use serde::Serialize;

use crate::error::PlaybackError;

use super::driver::{CallbackStatus, FillOutcome, PlaybackDriver};

/// Tally of periods rendered by `OfflineRenderer::run_for`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RenderSummary {
    pub periods: u64,
    pub emitted: u64,
    pub underruns: u64,
    pub stopped: u64,
}

impl RenderSummary {
    fn record(&mut self, outcome: FillOutcome) {
        self.periods += 1;
        match outcome {
            FillOutcome::Emitted => self.emitted += 1,
            FillOutcome::Underrun => self.underruns += 1,
            FillOutcome::Stopped => self.stopped += 1,
        }
    }
}

/// Drives a `PlaybackDriver` from a simulated device clock
///
/// Each period requests a fixed number of frames, exactly as an audio
/// driver would. Used for headless runs and for exercising the pipeline
/// without hardware.
pub struct OfflineRenderer {
    driver: PlaybackDriver,
    period: Vec<f32>,
    sample_rate: u32,
    periods: u64,
}

impl OfflineRenderer {
    pub fn new(driver: PlaybackDriver, frames_per_period: usize, sample_rate: u32) -> Self {
        Self {
            driver,
            period: vec![0.0; frames_per_period],
            sample_rate,
            periods: 0,
        }
    }

    /// Render one period and return its outcome and samples
    pub fn render_period(&mut self) -> Result<(FillOutcome, &[f32]), PlaybackError> {
        self.periods += 1;
        let outcome = self.driver.fill(&mut self.period, CallbackStatus::default())?;
        Ok((outcome, &self.period))
    }

    /// Render periods covering `secs` of output, handing each to `sink`
    ///
    /// Stops early once shutdown has been requested.
    ///
    /// With `paced` set, each period is released no earlier than the
    /// device clock would release it, so a producer running on another
    /// thread sees realistic timing.
    pub fn run_for<F>(
        &mut self,
        secs: f32,
        paced: bool,
        mut sink: F,
    ) -> Result<RenderSummary, PlaybackError>
    where
        F: FnMut(FillOutcome, &[f32]),
    {
        let frames = self.period.len().max(1);
        let total = (secs * self.sample_rate as f32 / frames as f32).ceil() as u64;
        let period_len = Duration::from_secs_f64(frames as f64 / self.sample_rate as f64);
        let start = Instant::now();
        let mut summary = RenderSummary::default();

        for n in 0..total {
            if self.driver.shutdown_requested() {
                break;
            }
            if paced {
                let due = start + period_len.mul_f64(n as f64);
                let now = Instant::now();
                if due > now {
                    thread::sleep(due - now);
                }
            }
            let (outcome, samples) = self.render_period()?;
            summary.record(outcome);
            sink(outcome, samples);
            if outcome == FillOutcome::Stopped {
                break;
            }
        }

        Ok(summary)
    }

    /// Simulated time covered by the periods rendered so far
    pub fn elapsed_secs(&self) -> f64 {
        self.periods as f64 * self.period.len() as f64 / self.sample_rate as f64
    }

    pub fn driver(&self) -> &PlaybackDriver {
        &self.driver
    }
}
