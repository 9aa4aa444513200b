//! air_guitar — command-line entry point.

use std::path::PathBuf;
use std::process;
use std::time::Duration;

use air_guitar::app::{run, AppConfig, SourceKind};
use clap::{CommandFactory, FromArgMatches, Parser};
use gesture_core::GestureConfig;
use strum_midi::{GeneralMidi, StrumMapper};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Where hand frames come from
    #[arg(long, value_enum, default_value_t = SourceKind::Sim)]
    source: SourceKind,

    /// JSON-lines detector log for `--source replay`
    #[arg(long, required_if_eq("source", "replay"))]
    replay: Option<PathBuf>,

    /// JSON gesture config; explicit flags override its values
    #[arg(long)]
    config: Option<PathBuf>,

    /// Write the session to this MIDI file
    #[arg(long)]
    record: Option<PathBuf>,

    /// General MIDI program (25 = steel-string acoustic)
    #[arg(long, default_value_t = 25, value_parser = clap::value_parser!(u8).range(0..=127))]
    instrument: u8,

    /// MIDI channel
    #[arg(long, default_value_t = 0, value_parser = clap::value_parser!(u8).range(0..=15))]
    channel: u8,

    /// How long each string rings
    #[arg(long, default_value_t = 400)]
    note_ms: u32,

    /// Milliseconds between strings in a strum
    #[arg(long, default_value_t = 12)]
    spread_ms: u32,

    /// Stop after this many frames
    #[arg(long)]
    frames: Option<u64>,

    /// Give up if the detector sends nothing for this long at startup
    #[arg(long, default_value_t = 5_000)]
    detector_timeout_ms: u64,

    /// Process frames as fast as possible instead of in real time
    #[arg(long, default_value_t = false)]
    fast: bool,

    /// Don't open a MIDI port
    #[arg(long, default_value_t = false)]
    no_midi: bool,

    /// Prefer a MIDI port whose name contains this text
    #[arg(long)]
    midi_port: Option<String>,

    #[command(flatten)]
    gesture: GestureConfig,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let matches = Cli::command().get_matches();
    let cli = Cli::from_arg_matches(&matches).unwrap_or_else(|e| e.exit());

    let gesture = match &cli.config {
        Some(path) => {
            info!("📂 Loading gesture config: {}", path.display());
            let mut file_cfg = GestureConfig::load_from_file(path).unwrap_or_else(|e| {
                error!("{}", e);
                process::exit(1);
            });
            file_cfg.merge_from_cli(&cli.gesture, &matches);
            file_cfg
        }
        None => cli.gesture.clone(),
    };

    let instrument = GeneralMidi::from_program(cli.instrument).map_or("General MIDI program", |gm| gm.name());
    info!(
        source = ?cli.source,
        instrument = %instrument,
        plane_angle_deg = gesture.plane_angle_deg,
        "🎸 starting air guitar"
    );

    let cfg = AppConfig {
        gesture,
        source:           cli.source,
        replay:           cli.replay,
        record:           cli.record,
        instrument:       cli.instrument,
        channel:          cli.channel,
        note_ms:          cli.note_ms,
        max_frames:       cli.frames,
        detector_timeout: Duration::from_millis(cli.detector_timeout_ms),
        realtime:         !cli.fast,
        live_midi:        !cli.no_midi,
        midi_port:        cli.midi_port,
        mapper:           StrumMapper::default().spread_ms(cli.spread_ms),
    };

    match run(cfg) {
        Ok(summary) => {
            println!(
                "{} frames, {} strums, {} chord changes, ended on {} at fret {}",
                summary.stats.processed,
                summary.stats.strums,
                summary.chord_changes,
                summary.final_chord,
                summary.final_fret
            );
            if let Some(path) = summary.recorded {
                println!("recording: {}", path.display());
            }
        }
        Err(e) => {
            error!("{}", e);
            process::exit(1);
        }
    }
}
