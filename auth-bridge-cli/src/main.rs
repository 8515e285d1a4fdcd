//! Auth Bridge CLI Application
//!
//! Command-line driver for the auth-bridge library. It plays the role of the
//! platform: it scripts biometric callbacks (from a scenario file or an
//! inline event list), feeds them through a bridge and reports what the
//! native side observed.
//!
//! Notifications are always recorded for the report. With `--receiver` they
//! are also forwarded to a native receiver loaded from a dynamic library.

use anyhow::{Context, Result};
use auth_bridge::{Bridge, Recorder};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;

mod callbacks;
mod config;
mod events;
mod report;
mod runner;

/// Auth Bridge - Replay biometric callback scenarios through the bridge
#[derive(Parser, Debug)]
#[command(name = "auth-bridge-cli")]
#[command(about = "Replay biometric authentication callbacks through the auth bridge", long_about = None)]
#[command(version)]
struct Args {
    /// Path to a scenario file (TOML)
    #[arg(short, long, value_name = "FILE")]
    scenario: Option<PathBuf>,

    /// Inline event list, e.g. "failed,help:10:center finger,succeeded"
    #[arg(short, long, value_name = "SPEC", conflicts_with = "scenario")]
    events: Option<String>,

    /// Cancel the inline session after N events
    #[arg(long, value_name = "N", requires = "events")]
    cancel_after: Option<usize>,

    /// Dynamic library exporting `auth_bridge_receiver`
    #[arg(short, long, value_name = "LIB")]
    receiver: Option<PathBuf>,

    /// Run scenarios concurrently on one bridge
    #[arg(long)]
    parallel: bool,

    /// Print the report as JSON
    #[arg(long)]
    json: bool,

    /// Do not relay progress notifications
    #[arg(long)]
    no_progress: bool,

    /// Verbosity level (can be repeated: -v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long)]
    quiet: bool,
}

fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Initialize logging
    init_logging(args.verbose, args.quiet);

    log::info!("Auth Bridge CLI v{}", env!("CARGO_PKG_VERSION"));
    log::info!("Using bridge library v{}", auth_bridge::VERSION);

    let app_config = if let Some(path) = &args.scenario {
        log::info!("Loading scenarios from: {:?}", path);
        config::load_config(path)?
    } else if let Some(spec) = &args.events {
        let events = events::parse_event_list(spec).context("Invalid --events list")?;
        let app_config = config::AppConfig::inline(events, args.cancel_after);
        app_config.validate()?;
        app_config
    } else {
        // No arguments - show help
        println!("Auth Bridge - No input specified");
        println!("\nQuick Start:");
        println!("  auth-bridge-cli --events \"failed,help:10:center finger,succeeded\"");
        println!("  auth-bridge-cli --events \"succeeded\" --cancel-after 0");
        println!("\nFor scripted runs:");
        println!("  auth-bridge-cli --scenario scenarios.toml [--parallel] [--json]");
        println!("\nUse --help for more options");
        return Ok(());
    };
    log::debug!("{} scenario(s) loaded", app_config.scenarios.len());

    let mut bridge_config = app_config.bridge.clone();
    if args.no_progress {
        bridge_config = bridge_config.with_progress(false);
    }

    let native = args
        .receiver
        .as_deref()
        .map(callbacks::load_native_receiver)
        .transpose()?;

    let recorder = Arc::new(Recorder::new());
    let bridge = Bridge::with_config(
        callbacks::CliReceiver::new(Arc::clone(&recorder), native),
        bridge_config,
    );

    let scenarios = runner::run_all(&bridge, &recorder, &app_config.scenarios, args.parallel)?;
    let report = report::RunReport::new(scenarios, bridge.stats());

    if args.json {
        println!("{}", report.to_json()?);
    } else if !args.quiet {
        print!("{}", report.render_text());
    }

    Ok(())
}

/// Initialize logging based on verbosity level
fn init_logging(verbose: u8, quiet: bool) {
    use env_logger::Builder;
    use log::LevelFilter;
    use std::io::Write;

    let level = if quiet {
        LevelFilter::Error
    } else {
        match verbose {
            0 => LevelFilter::Info,
            1 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    };

    Builder::new()
        .filter_level(level)
        .format(|buf, record| {
            writeln!(
                buf,
                "[{} {}] {}",
                record.level(),
                record.target(),
                record.args()
            )
        })
        .init();
}
