//! PRTG STF Monitor CLI
//!
//! Reads the collector's JSON envelope, aggregates every sensor and pushes
//! the channel reports to PRTG.
//!
//! # Usage
//!
//! ```bash
//! prtg-stf-monitor --data-file data.json --hostname atm01 --base-url http://prtg:5050/
//! prtg-stf-monitor --data-file data.json --hostname atm01 --dry-run
//! ```
//!
//! # Environment Variables
//!
//! - `RUST_LOG`: logging verbosity, `info` by default
//! - `PRTG_DATA_FILE`, `PRTG_HOSTNAME`, `PRTG_BASE_URL`, `PRTG_VENDOR_TABLE`,
//!   `PRTG_TIMEOUT_SECS`, `PRTG_DEBUG`, `PRTG_DRY_RUN`: defaults for the
//!   matching flags

use clap::{ArgGroup, Parser};
use log::error;
use prtg_stf_monitor::{
    Envelope, HttpTransport, Monitor, Result, SensorBatch, Transport, VendorRegistry,
    WriterTransport,
};
use std::fs::File;
use std::io::{self, BufReader};
use std::path::PathBuf;
use std::process;
use std::time::Duration;

/// Push STF/LIVE/TOTAL channels for payment network adapters to PRTG.
#[derive(Parser, Debug)]
#[command(name = "prtg-stf-monitor", version, about, long_about = None)]
#[command(group(ArgGroup::new("target").required(true).args(["base_url", "dry_run"])))]
struct Cli {
    /// JSON envelope written by the log collector.
    #[arg(long, env = "PRTG_DATA_FILE")]
    data_file: PathBuf,

    /// Inventory hostname used in sensor tokens.
    #[arg(long, env = "PRTG_HOSTNAME")]
    hostname: String,

    /// Push endpoint prefix; the sensor token is appended to it.
    #[arg(long, env = "PRTG_BASE_URL")]
    base_url: Option<String>,

    /// CSV table adding or overriding vendor profiles.
    #[arg(long, env = "PRTG_VENDOR_TABLE")]
    vendor_table: Option<PathBuf>,

    /// HTTP request timeout in seconds.
    #[arg(long, env = "PRTG_TIMEOUT_SECS", default_value_t = 10)]
    timeout_secs: u64,

    /// Log every pushed payload at the end of the cycle.
    #[arg(long, env = "PRTG_DEBUG")]
    debug: bool,

    /// Print payloads to stdout as JSON lines instead of POSTing them.
    #[arg(long, env = "PRTG_DRY_RUN")]
    dry_run: bool,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    match run(&cli) {
        Ok(true) => {}
        Ok(false) => process::exit(2),
        Err(e) => {
            error!("{}", e);
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    }
}

/// Returns `Ok(false)` when the cycle completed with failed pushes.
fn run(cli: &Cli) -> Result<bool> {
    let mut registry = VendorRegistry::builtin();
    if let Some(path) = &cli.vendor_table {
        registry.extend_from_csv(BufReader::new(File::open(path)?))?;
    }

    let envelope = Envelope::from_reader(BufReader::new(File::open(&cli.data_file)?))?;
    let sensors = envelope.into_sensors(&cli.hostname)?;

    match &cli.base_url {
        Some(base_url) if !cli.dry_run => {
            let transport = HttpTransport::new(base_url, Duration::from_secs(cli.timeout_secs))?;
            cycle(registry, transport, cli.debug, &sensors)
        }
        _ => {
            let stdout = io::stdout();
            cycle(registry, WriterTransport::new(stdout.lock()), cli.debug, &sensors)
        }
    }
}

fn cycle<T: Transport>(
    registry: VendorRegistry,
    transport: T,
    debug: bool,
    sensors: &[SensorBatch],
) -> Result<bool> {
    let mut monitor = Monitor::new(registry, transport).with_debug(debug);
    let summary = monitor.run_cycle(sensors)?;
    Ok(summary.is_clean())
}
