// EarWatch command line
// Runs the acoustic node, extracts frames from channel dumps, checks config

use anyhow::{anyhow, bail, Context};
use clap::{Parser, Subcommand};
use earwatch_alarm::AlarmOutputs;
use earwatch_core::MonotonicClock;
use earwatch_node::{extract_frames, Node, NodeConfig, NodeParts};
use earwatch_sc::{Microphone, ReplayMicrophone};
use earwatch_wire::open_channel;
use std::path::{Path, PathBuf};
use tracing::{error, info};
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "earwatch")]
#[command(about = "EarWatch acoustic surveillance node", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file (TOML)
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,

    /// Log level or filter directive (error, warn, info, debug, trace)
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Write logs to stderr instead of the channel
    #[arg(long, global = true)]
    log_stderr: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the node
    Run {
        /// Replay this 16 kHz mono 16-bit WAV file as the microphone
        #[arg(long, conflicts_with = "live")]
        wav: Option<PathBuf>,

        /// Restart the WAV file when it runs out
        #[arg(long = "loop", requires = "wav")]
        looping: bool,

        /// Capture from the system's input device
        #[arg(long)]
        live: bool,

        /// Serial device to use instead of stdin/stdout
        #[arg(long)]
        serial_port: Option<String>,

        /// Serial baud rate
        #[arg(long)]
        baud: Option<u32>,
    },

    /// Extract frames from a raw channel dump
    Extract {
        /// Captured channel bytes
        input: PathBuf,

        /// Directory for frame-NNNN.wav files and index.json
        #[arg(long, short, default_value = "frames")]
        out_dir: PathBuf,
    },

    /// Validate the configuration and print the effective values
    CheckConfig,

    /// List the audio input devices usable with --live
    Devices,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mut config = match cli.config {
        Some(ref path) => NodeConfig::from_file(path)
            .with_context(|| format!("Failed to load {}", path.display()))?,
        None => NodeConfig::default(),
    };

    match cli.command {
        Commands::Run {
            wav,
            looping,
            live,
            serial_port,
            baud,
        } => {
            if serial_port.is_some() {
                config.channel.serial_port = serial_port;
            }
            if let Some(baud) = baud {
                config.channel.baud_rate = baud;
            }
            config
                .validate()
                .map_err(|e| anyhow!("Invalid configuration: {}", e))?;

            let (writer, lines) = open_channel(&config.channel)?;
            let log_writer = if cli.log_stderr {
                BoxMakeWriter::new(std::io::stderr)
            } else {
                BoxMakeWriter::new(writer.clone())
            };
            init_tracing(cli.log_level.as_deref(), log_writer)?;

            let microphone = match open_microphone(&config, wav.as_deref(), looping, live) {
                Ok(microphone) => microphone,
                Err(e) => {
                    error!("{:#}", e);
                    return Err(e);
                }
            };

            let parts = NodeParts {
                clock: Box::new(MonotonicClock::new()),
                microphone,
                outputs: AlarmOutputs::traced(),
                lines: Box::new(lines),
                sink: Box::new(writer),
            };
            let mut node = Node::start(&config, parts).map_err(|e| {
                error!("System halted: {}", e);
                e
            })?;
            node.run()
        }

        Commands::Extract { input, out_dir } => {
            init_tracing(cli.log_level.as_deref(), BoxMakeWriter::new(std::io::stderr))?;
            let summary = extract_frames(&input, &out_dir)?;
            if summary.resyncs > 0 {
                info!(
                    "{} corrupt candidates skipped ({} bytes)",
                    summary.resyncs, summary.skipped_bytes
                );
            }
            Ok(())
        }

        Commands::CheckConfig => {
            config
                .validate()
                .map_err(|e| anyhow!("Invalid configuration: {}", e))?;
            print!("{}", config.to_toml_string()?);
            Ok(())
        }

        Commands::Devices => {
            for name in list_input_devices()? {
                println!("{}", name);
            }
            Ok(())
        }
    }
}

fn init_tracing(level: Option<&str>, writer: BoxMakeWriter) -> anyhow::Result<()> {
    let filter = match level {
        Some(directive) => EnvFilter::try_new(directive)
            .with_context(|| format!("Invalid log level {:?}", directive))?,
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_ansi(false)
        .with_writer(writer)
        .init();
    Ok(())
}

fn open_microphone(
    config: &NodeConfig,
    wav: Option<&Path>,
    looping: bool,
    live: bool,
) -> anyhow::Result<Box<dyn Microphone>> {
    if let Some(path) = wav {
        let microphone = ReplayMicrophone::from_wav_file(path)
            .with_context(|| format!("Failed to open {}", path.display()))?
            .with_looping(looping);
        return Ok(Box::new(microphone));
    }

    if live {
        return open_live_microphone(config);
    }

    bail!("No audio source: pass --wav <file> or --live")
}

#[cfg(feature = "cpal-input")]
fn open_live_microphone(config: &NodeConfig) -> anyhow::Result<Box<dyn Microphone>> {
    let microphone = earwatch_sc::CpalMicrophone::new(config.audio.device_name.as_deref())
        .context("Failed to open input device")?;
    Ok(Box::new(microphone))
}

#[cfg(not(feature = "cpal-input"))]
fn open_live_microphone(_config: &NodeConfig) -> anyhow::Result<Box<dyn Microphone>> {
    bail!("Live capture needs the cpal-input feature")
}

#[cfg(feature = "cpal-input")]
fn list_input_devices() -> anyhow::Result<Vec<String>> {
    earwatch_sc::CpalMicrophone::list_devices().context("Failed to enumerate input devices")
}

#[cfg(not(feature = "cpal-input"))]
fn list_input_devices() -> anyhow::Result<Vec<String>> {
    bail!("Device listing needs the cpal-input feature")
}
