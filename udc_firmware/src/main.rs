//! # UDC Simulator Binary
//!
//! Runs both controller cores on the host over a simulated IPC link,
//! replays recorded field-bus frames and prints the final state as JSON.
//!
//! # Usage
//!
//! ```bash
//! # Replay frames against a FAP-4P configuration
//! udc_sim --config config/udc.toml --frames frames.txt
//!
//! # Verbose logging, JSON log lines
//! udc_sim --config config/udc.toml --frames frames.txt -v --json
//! ```

use clap::Parser;
use std::path::PathBuf;
use tracing::{Level, error, info};
use tracing_subscriber::EnvFilter;
use udc_common::config::{ConfigLoader, LogLevel, UdcConfig};
use udc_firmware::sim::{Simulator, parse_frames};

/// UDC simulator - both cores of the power-supply controller on the host
#[derive(Parser, Debug)]
#[command(name = "udc_sim")]
#[command(author = "RTS007")]
#[command(version)]
#[command(about = "Replay field-bus frames through a simulated dual-core UDC")]
#[command(long_about = None)]
struct Args {
    /// Path to the controller configuration (TOML).
    #[arg(short, long, default_value = "config/udc.toml")]
    config: PathBuf,

    /// Frame file: one `data|itlk|alarm` line with 8 hex bytes per frame.
    #[arg(short, long)]
    frames: Option<PathBuf>,

    /// Release the HRADC boards before replaying frames
    #[arg(long)]
    enable_hradc: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Output logs in JSON format
    #[arg(long)]
    json: bool,
}

fn main() {
    let args = Args::parse();

    let config = match load_config(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("udc_sim: {e}");
            std::process::exit(1);
        }
    };

    setup_tracing(&args, config.shared.log_level);

    if let Err(e) = run(&args, config) {
        error!("simulation failed: {}", e);
        std::process::exit(1);
    }
}

fn load_config(args: &Args) -> Result<UdcConfig, Box<dyn std::error::Error>> {
    let config = UdcConfig::load(&args.config)
        .map_err(|e| format!("{}: {e}", args.config.display()))?;
    config.validate()?;
    Ok(config)
}

fn run(args: &Args, config: UdcConfig) -> Result<(), Box<dyn std::error::Error>> {
    info!(
        "UDC simulator v{} starting ({})",
        env!("CARGO_PKG_VERSION"),
        config.shared.service_name
    );

    let frames = match &args.frames {
        Some(path) => {
            let text = std::fs::read_to_string(path)?;
            let frames = parse_frames(&text)?;
            info!("Loaded {} frames from {}", frames.len(), path.display());
            frames
        }
        None => Vec::new(),
    };

    let mut sim = Simulator::new(config)?;
    if args.enable_hradc {
        sim.enable_hradc();
        sim.settle();
    }
    sim.run(&frames);

    let report = sim.report();
    info!(
        applied = report.frames_applied,
        rejected = report.iib_stats.rejected_address,
        "replay complete"
    );
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

/// Subscriber level: `-v` forces DEBUG, otherwise the configured level.
fn tracing_level(verbose: bool, log_level: LogLevel) -> Level {
    if verbose {
        return Level::DEBUG;
    }
    match log_level {
        LogLevel::Trace => Level::TRACE,
        LogLevel::Debug => Level::DEBUG,
        LogLevel::Info => Level::INFO,
        LogLevel::Warn => Level::WARN,
        LogLevel::Error => Level::ERROR,
    }
}

/// Setup tracing subscriber from the configured level and CLI flags.
fn setup_tracing(args: &Args, log_level: LogLevel) {
    let level = tracing_level(args.verbose, log_level);
    let filter = EnvFilter::from_default_env().add_directive(level.into());

    // Logs go to stderr; stdout carries the JSON report.
    if args.json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbose_flag_overrides_configured_level() {
        assert_eq!(tracing_level(true, LogLevel::Error), Level::DEBUG);
        assert_eq!(tracing_level(true, LogLevel::Trace), Level::DEBUG);
    }

    #[test]
    fn configured_level_maps_one_to_one() {
        assert_eq!(tracing_level(false, LogLevel::Trace), Level::TRACE);
        assert_eq!(tracing_level(false, LogLevel::Debug), Level::DEBUG);
        assert_eq!(tracing_level(false, LogLevel::Info), Level::INFO);
        assert_eq!(tracing_level(false, LogLevel::Warn), Level::WARN);
        assert_eq!(tracing_level(false, LogLevel::Error), Level::ERROR);
    }
}
