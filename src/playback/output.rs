use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use audio_thread_priority::RtPriorityHandle;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use crossbeam_channel::Sender;

use crate::config::AudioConfig;
use crate::error::{PlaybackError, Result, StreamError};

use super::driver::{CallbackStatus, PlaybackDriver};
use super::stats::PlaybackStats;

/// Notifications from the audio thread to the controlling thread
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    /// The callback hit a fatal condition; it now only emits silence
    Fatal(PlaybackError),
    /// The backend reported a stream error
    Device(String),
}

/// Real-time priority for whichever thread first calls `promote_once`
///
/// cpal owns the callback thread, so promotion happens from inside the
/// first callback, sized to the period the driver actually requests.
#[derive(Default)]
pub(crate) struct ThreadPromotion {
    attempted: bool,
    _rt_handle: Option<RtPriorityHandle>,
}

impl ThreadPromotion {
    pub(crate) fn promote_once(&mut self, frames: usize, sample_rate: u32) {
        if self.attempted {
            return;
        }
        self.attempted = true;

        match audio_thread_priority::promote_current_thread_to_real_time(
            frames as u32,
            sample_rate,
        ) {
            Ok(handle) => {
                log::debug!("Audio callback promoted to real-time priority");
                self._rt_handle = Some(handle);
            }
            Err(e) => log::warn!("Could not set real-time priority: {}", e),
        }
    }
}

/// Mono output stream on the default device, fed by a `PlaybackDriver`
pub struct AudioPlayback {
    stream: cpal::Stream,
    stats: Arc<PlaybackStats>,
}

impl AudioPlayback {
    /// Open the default output device and start streaming
    ///
    /// The driver moves into the device callback. Backend stream errors
    /// are surfaced to the driver as an output underflow on the next
    /// period, since cpal does not flag late periods per callback.
    pub fn new(
        config: &AudioConfig,
        mut driver: PlaybackDriver,
        events: Sender<StreamEvent>,
    ) -> Result<Self> {
        let host = cpal::default_host();

        let device = host
            .default_output_device()
            .ok_or_else(|| StreamError::AudioDevice("No output device found".into()))?;

        match device.description() {
            Ok(desc) => log::info!("Output device: {:?}", desc),
            Err(_) => log::info!("Output device: Unknown"),
        }

        let stream_config = cpal::StreamConfig {
            channels: config.channels,
            sample_rate: config.sample_rate,
            buffer_size: match config.buffer_size {
                Some(frames) => cpal::BufferSize::Fixed(frames as u32),
                None => cpal::BufferSize::Default,
            },
        };

        let stats = driver.stats();
        let fault = Arc::new(AtomicBool::new(false));
        let fault_flag = Arc::clone(&fault);
        let device_events = events.clone();
        let mut aborted = false;
        let mut promotion = ThreadPromotion::default();
        let sample_rate = config.sample_rate;

        let stream = device
            .build_output_stream(
                &stream_config,
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    promotion.promote_once(data.len(), sample_rate);
                    if aborted {
                        data.fill(0.0);
                        return;
                    }
                    let status = CallbackStatus {
                        output_underflow: fault_flag.swap(false, Ordering::AcqRel),
                    };
                    if let Err(e) = driver.fill(data, status) {
                        aborted = true;
                        if events.try_send(StreamEvent::Fatal(e)).is_err() {
                            log::warn!("Playback event receiver dropped");
                        }
                    }
                },
                move |err| {
                    log::error!("Audio stream error: {}", err);
                    fault.store(true, Ordering::Release);
                    let _ = device_events.try_send(StreamEvent::Device(err.to_string()));
                },
                None,
            )
            .map_err(|e| StreamError::AudioStream(format!("{}", e)))?;

        stream
            .play()
            .map_err(|e| StreamError::AudioStream(format!("{}", e)))?;

        Ok(Self { stream, stats })
    }

    /// Counters updated by the device callback
    pub fn stats(&self) -> Arc<PlaybackStats> {
        Arc::clone(&self.stats)
    }
}

impl Drop for AudioPlayback {
    fn drop(&mut self) {
        let _ = self.stream.pause();
    }
}
