//! Render a recorded APU register-write log to a WAV file.
//!
//! The log is JSON as produced by [`RegisterLog::to_json`]: the capture
//! configuration plus timestamped writes.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use nes_apu::config::{NTSC_CPU_CLOCK, PAL_CPU_CLOCK};
use nes_apu::export::{write_wav_with_config, ExportConfig};
use nes_apu::{render_log, Apu, Channel, FilterType, NullBus, RegisterLog, SampleFormat};

#[derive(Parser)]
#[command(name = "nes-apu-render")]
#[command(about = "Render an NES APU register log to WAV")]
struct Args {
    /// Register log (JSON)
    input: PathBuf,

    /// Output WAV file
    #[arg(short, long)]
    output: PathBuf,

    /// Frames to render (default: from the log, else one past the last write)
    #[arg(short, long)]
    frames: Option<u32>,

    /// Override the output sample rate
    #[arg(short, long)]
    sample_rate: Option<u32>,

    /// Use PAL timing instead of the log's clock
    #[arg(long, conflicts_with = "ntsc")]
    pal: bool,

    /// Use NTSC timing instead of the log's clock
    #[arg(long)]
    ntsc: bool,

    /// Output filter: none, lowpass or weighted
    #[arg(long)]
    filter: Option<FilterType>,

    /// Render and write 8-bit unsigned samples (default: the log's width)
    #[arg(long)]
    eight_bit: bool,

    /// Duplicate into two channels
    #[arg(long)]
    stereo: bool,

    /// Fade out over the last N seconds
    #[arg(long, default_value_t = 0.0)]
    fade_out: f32,

    /// Leave a channel out of the mix (0 pulse A .. 4 DMC, 5 extension); repeatable
    #[arg(short, long = "mute")]
    mute: Vec<usize>,

    /// More logging (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    let mut log = RegisterLog::load(&args.input)
        .with_context(|| format!("failed to load register log {}", args.input.display()))?;

    if let Some(rate) = args.sample_rate {
        log.config.sample_rate = rate;
    }
    if args.pal {
        log.config.base_frequency = PAL_CPU_CLOCK;
        log.config.refresh_rate = 50;
    } else if args.ntsc {
        log.config.base_frequency = NTSC_CPU_CLOCK;
        log.config.refresh_rate = 60;
    }
    if let Some(filter) = args.filter {
        log.config.filter = filter;
    }
    if let Some(frames) = args.frames {
        log.frames = frames;
    }
    if args.eight_bit {
        log.config.sample_format = SampleFormat::Unsigned8;
    }

    let mut apu = Apu::new(log.config).context("invalid APU configuration")?;
    for index in &args.mute {
        let Some(channel) = Channel::from_index(*index) else {
            bail!("no channel {index} (expected 0-5)");
        };
        apu.set_channel_enabled(channel, false);
    }

    let count = log.sample_count();
    tracing::info!(
        writes = log.writes.len(),
        samples = count,
        sample_rate = log.config.sample_rate,
        "rendering"
    );
    let samples = render_log(&mut apu, &mut NullBus, &log, count)?;

    let mut export = ExportConfig::for_apu(&log.config).fade_out(args.fade_out);
    if args.stereo {
        export.channels = 2;
    }
    write_wav_with_config(&args.output, &samples, &export)
        .with_context(|| format!("failed to write {}", args.output.display()))?;

    tracing::info!(output = %args.output.display(), "done");
    Ok(())
}
