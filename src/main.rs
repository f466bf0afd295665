use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::Context;
use clap::Parser;
use crossbeam_channel::{RecvTimeoutError, bounded};
use serde::Serialize;

use seamless_stream::config::{CrossfadeLength, StreamConfig, UnderflowPolicy};
use seamless_stream::generation::{GenerationReport, SyntheticGenerator};
use seamless_stream::playback::{
    AudioPlayback, OfflineRenderer, PlaybackSnapshot, RenderSummary, StreamEvent,
};
use seamless_stream::{Pipeline, ShutdownToken};

const DEFAULT_OFFLINE_PERIOD: usize = 1024;
const STATUS_INTERVAL: Duration = Duration::from_secs(5);

#[derive(Parser, Debug)]
#[command(name = "seamless-stream")]
#[command(about = "Play continuously generated audio blocks as one gapless stream", long_about = None)]
struct Args {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Crossfade length (e.g., "1000", "31.25ms")
    #[arg(short = 'x', long)]
    crossfade: Option<CrossfadeLength>,

    /// Transfer channel capacity in blocks
    #[arg(long)]
    capacity: Option<usize>,

    /// Length of each generated block in seconds
    #[arg(long)]
    block_secs: Option<f32>,

    /// Seconds of trailing audio used to condition continuations
    #[arg(long)]
    conditioning_secs: Option<f32>,

    /// Generation wall time per second of audio
    #[arg(long)]
    latency_factor: Option<f32>,

    /// Probability that a continuation request fails
    #[arg(long)]
    failure_rate: Option<f32>,

    /// RNG seed for the synthetic producer
    #[arg(long)]
    seed: Option<u64>,

    /// Prompt passed to the producer
    #[arg(short, long)]
    description: Option<String>,

    /// Produce 16-bit blocks in model layout
    #[arg(long)]
    fixed_point: bool,

    /// Reaction to driver-reported underflow: abort, continue
    #[arg(short, long, value_enum)]
    underflow: Option<UnderflowPolicy>,

    /// Device period in frames
    #[arg(short, long)]
    buffer_size: Option<usize>,

    /// Stop after this many seconds (default: run until Ctrl+C)
    #[arg(short = 't', long)]
    duration: Option<f32>,

    /// Render against a simulated clock instead of an audio device
    #[arg(long)]
    offline: bool,

    /// Summary format: text, json
    #[arg(short = 'f', long, value_enum, default_value = "text")]
    format: ReportFormat,

    /// Increase output verbosity
    #[arg(short = 'v', long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum ReportFormat {
    Text,
    Json,
}

#[derive(Debug, Serialize)]
struct SessionReport {
    elapsed_secs: f32,
    playback: PlaybackSnapshot,
    generation: GenerationReport,
    #[serde(skip_serializing_if = "Option::is_none")]
    render: Option<RenderSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let log_level = match args.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    let config = build_config(&args)?;
    let shutdown = ShutdownToken::new();
    let generator = SyntheticGenerator::new(&config.synthetic, config.audio.sample_rate)
        .context("Failed to create synthetic generator")?
        .with_shutdown(shutdown.clone());

    let Pipeline { driver, worker, .. } =
        Pipeline::start_with_shutdown(&config, Box::new(generator), shutdown.clone())?;

    {
        let shutdown = shutdown.clone();
        ctrlc::set_handler(move || shutdown.cancel()).context("Failed to install Ctrl+C handler")?;
    }

    let started = Instant::now();
    let mut render = None;
    let mut error = None;

    let stats = if args.offline {
        let frames = config.audio.buffer_size.unwrap_or(DEFAULT_OFFLINE_PERIOD);
        let mut renderer = OfflineRenderer::new(driver, frames, config.audio.sample_rate);
        let stats = renderer.driver().stats();
        let secs = args.duration.unwrap_or(f32::INFINITY);
        match renderer.run_for(secs, true, |_, _| {}) {
            Ok(summary) => render = Some(summary),
            Err(e) => error = Some(e.to_string()),
        }
        stats.snapshot()
    } else {
        let (event_tx, event_rx) = bounded(16);
        let playback = AudioPlayback::new(&config.audio, driver, event_tx)?;
        let stats = playback.stats();
        let deadline = args.duration.map(|secs| started + Duration::from_secs_f32(secs));
        let mut last_status = Instant::now();

        println!("Streaming at {} Hz - press Ctrl+C to stop.", config.audio.sample_rate);

        while !shutdown.is_cancelled() && deadline.is_none_or(|d| Instant::now() < d) {
            match event_rx.recv_timeout(Duration::from_millis(100)) {
                Ok(StreamEvent::Fatal(e)) => {
                    log::error!("Stream aborted: {}", e);
                    error = Some(e.to_string());
                    break;
                }
                Ok(StreamEvent::Device(msg)) => log::warn!("Device reported: {}", msg),
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => break,
            }

            if last_status.elapsed() >= STATUS_INTERVAL {
                let snap = stats.snapshot();
                log::info!(
                    "Buffered {:.1}s, {} blocks in, {} underrun periods",
                    snap.buffered_samples as f32 / config.audio.sample_rate as f32,
                    snap.blocks_ingested,
                    snap.underrun_periods
                );
                last_status = Instant::now();
            }
        }

        drop(playback);
        stats.snapshot()
    };

    shutdown.cancel();
    let generation = worker.join();

    let report = SessionReport {
        elapsed_secs: started.elapsed().as_secs_f32(),
        playback: stats,
        generation,
        render,
        error,
    };

    match args.format {
        ReportFormat::Text => print_text(&report),
        ReportFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
    }

    if let Some(e) = report.error {
        anyhow::bail!("Playback aborted: {}", e);
    }

    Ok(())
}

fn build_config(args: &Args) -> anyhow::Result<StreamConfig> {
    let mut config = match &args.config {
        Some(path) => StreamConfig::from_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => StreamConfig::default(),
    };

    if let Some(crossfade) = args.crossfade {
        config.crossfade.window = crossfade;
    }
    if let Some(capacity) = args.capacity {
        config.channel.capacity = capacity;
    }
    if let Some(secs) = args.block_secs {
        config.synthetic.block_secs = secs;
    }
    if let Some(secs) = args.conditioning_secs {
        config.generation.conditioning_secs = secs;
    }
    if let Some(factor) = args.latency_factor {
        config.synthetic.latency_factor = factor;
    }
    if let Some(rate) = args.failure_rate {
        config.synthetic.failure_rate = rate;
    }
    if args.seed.is_some() {
        config.synthetic.seed = args.seed;
    }
    if let Some(ref description) = args.description {
        config.generation.description = description.clone();
    }
    if args.fixed_point {
        config.synthetic.fixed_point = true;
    }
    if let Some(policy) = args.underflow {
        config.playback.underflow_policy = policy;
    }
    if args.buffer_size.is_some() {
        config.audio.buffer_size = args.buffer_size;
    }

    config.validate()?;
    Ok(config)
}

fn print_text(report: &SessionReport) {
    let p = &report.playback;
    let g = &report.generation;

    println!();
    println!("Session: {:.1}s", report.elapsed_secs);
    println!(
        "Playback: {} callbacks, {} frames emitted, {} underrun periods in {} episodes",
        p.callbacks, p.frames_emitted, p.underrun_periods, p.underrun_episodes
    );
    println!(
        "Seams: {} blended, {} cold starts, {} short blocks",
        p.seams_blended, p.cold_starts, p.short_blocks
    );
    if p.driver_underflows > 0 {
        println!("Driver underflows: {}", p.driver_underflows);
    }
    println!(
        "Generation: {} blocks ({:.1}s of audio), {} failures",
        g.blocks, g.audio_secs, g.failures
    );
    if let Some(ref rtf) = g.realtime_factor {
        println!(
            "Realtime factor: mean {:.2} (min {:.2}, max {:.2})",
            rtf.mean, rtf.min, rtf.max
        );
    }
    if let Some(ref render) = report.render {
        println!(
            "Offline render: {} periods, {} emitted, {} silent",
            render.periods,
            render.emitted,
            render.underruns + render.stopped
        );
    }
    if let Some(ref e) = report.error {
        println!("Error: {}", e);
    }
}
