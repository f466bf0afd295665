use std::thread;
use std::time::{Duration, Instant};

use seamless_stream::config::{CrossfadeLength, StreamConfig};
use seamless_stream::generation::SyntheticGenerator;
use seamless_stream::playback::{FillOutcome, OfflineRenderer};
use seamless_stream::{Pipeline, ShutdownToken};

const FRAMES: usize = 1024;
const TARGET_PERIODS: usize = 200;

fn fast_config(failure_rate: f32) -> StreamConfig {
    let mut config = StreamConfig::default();
    config.crossfade.window = CrossfadeLength::Samples(1000);
    config.channel.capacity = 2;
    config.generation.conditioning_secs = 0.25;
    config.generation.yield_ms = 1;
    config.synthetic.block_secs = 0.5;
    config.synthetic.latency_factor = 0.0;
    config.synthetic.failure_rate = failure_rate;
    config.synthetic.seed = Some(11);
    config
}

struct Run {
    emitted: usize,
    max_step: f32,
}

/// Pull periods as fast as the worker allows and track the largest
/// sample-to-sample step inside each stretch of emitted audio
fn render_until(renderer: &mut OfflineRenderer, periods: usize) -> Run {
    let deadline = Instant::now() + Duration::from_secs(20);
    let mut run = Run {
        emitted: 0,
        max_step: 0.0,
    };
    let mut last: Option<f32> = None;

    while run.emitted < periods {
        assert!(Instant::now() < deadline, "producer stalled");
        let (outcome, samples) = renderer.render_period().unwrap();
        match outcome {
            FillOutcome::Emitted => {
                run.emitted += 1;
                for &s in samples {
                    if let Some(prev) = last {
                        run.max_step = run.max_step.max((s - prev).abs());
                    }
                    last = Some(s);
                }
            }
            FillOutcome::Underrun => {
                last = None;
                thread::sleep(Duration::from_millis(1));
            }
            FillOutcome::Stopped => panic!("unexpected stop"),
        }
    }
    run
}

#[test]
fn test_threaded_pipeline_streams_without_clicks() {
    let config = fast_config(0.0);
    let generator =
        SyntheticGenerator::new(&config.synthetic, config.audio.sample_rate).unwrap();
    let Pipeline {
        driver,
        worker,
        shutdown,
    } = Pipeline::start(&config, Box::new(generator)).unwrap();

    let mut renderer = OfflineRenderer::new(driver, FRAMES, config.audio.sample_rate);
    let run = render_until(&mut renderer, TARGET_PERIODS);

    // A triad at 0.3 moves well under 0.05 per sample; a hard seam would not
    assert!(run.max_step < 0.05, "discontinuity of {}", run.max_step);

    let stats = renderer.driver().stats().snapshot();
    assert!(stats.blocks_ingested >= 12);
    assert_eq!(stats.cold_starts, 1);
    assert_eq!(stats.seams_blended + 1, stats.blocks_ingested);

    shutdown.cancel();
    let report = worker.join();
    assert_eq!(report.failures, 0);
    assert!(report.blocks >= stats.blocks_ingested);
    assert!(report.blocks <= stats.blocks_ingested + 2);
}

#[test]
fn test_generation_failures_do_not_break_the_stream() {
    let config = fast_config(0.5);
    let generator =
        SyntheticGenerator::new(&config.synthetic, config.audio.sample_rate).unwrap();
    let Pipeline {
        driver,
        worker,
        shutdown,
    } = Pipeline::start(&config, Box::new(generator)).unwrap();

    let mut renderer = OfflineRenderer::new(driver, FRAMES, config.audio.sample_rate);
    let run = render_until(&mut renderer, TARGET_PERIODS);
    assert!(run.max_step < 0.05, "discontinuity of {}", run.max_step);

    shutdown.cancel();
    let report = worker.join();
    assert!(report.failures > 0);
    assert!(report.blocks >= renderer.driver().stats().snapshot().blocks_ingested);
}

#[test]
fn test_dropping_playback_stops_generation() {
    let config = fast_config(0.0);
    let generator =
        SyntheticGenerator::new(&config.synthetic, config.audio.sample_rate).unwrap();
    let Pipeline { driver, worker, .. } = Pipeline::start(&config, Box::new(generator)).unwrap();

    drop(driver);
    let deadline = Instant::now() + Duration::from_secs(5);
    while !worker.is_finished() {
        assert!(Instant::now() < deadline, "worker still running");
        thread::sleep(Duration::from_millis(5));
    }
    assert!(worker.join().blocks <= 2);
}

#[test]
fn test_sample_rate_mismatch_is_rejected() {
    let config = fast_config(0.0);
    let generator = SyntheticGenerator::new(&config.synthetic, 16_000).unwrap();
    assert!(Pipeline::start(&config, Box::new(generator)).is_err());
}

#[test]
fn test_shutdown_interrupts_slow_generation() {
    let mut config = fast_config(0.0);
    config.synthetic.block_secs = 20.0;
    config.synthetic.latency_factor = 1.0;
    config.synthetic.latency_jitter = 0.0;

    let shutdown = ShutdownToken::new();
    let generator = SyntheticGenerator::new(&config.synthetic, config.audio.sample_rate)
        .unwrap()
        .with_shutdown(shutdown.clone());
    let Pipeline { driver, worker, .. } =
        Pipeline::start_with_shutdown(&config, Box::new(generator), shutdown.clone()).unwrap();

    thread::sleep(Duration::from_millis(50));
    let started = Instant::now();
    shutdown.cancel();
    let report = worker.join();

    assert!(started.elapsed() < Duration::from_secs(2));
    assert_eq!(report.blocks, 0);
    assert_eq!(report.failures, 0);
    assert!(driver.shutdown_requested());
}
