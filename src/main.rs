use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use log::{error, info};

use s8_monitor::{
    Config, FileSink, Level, Monitor, MonitorConfig, SerialTransport, StopSignal, DEFAULT_ABC_PERIOD_HOURS, S8,
};

/// Senseair S8 CO2 monitor
#[derive(Parser, Debug)]
#[command(name = "s8-monitor", version, long_about = None)]
struct Args {
    /// Enable verbose diagnostics
    #[arg(short, long, default_value_t = false, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Cmd,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Poll sensors and log their readings until interrupted
    Run {
        /// Sensor to poll as NAME=PATH (repeatable, polled in the given order)
        #[arg(short, long = "sensor", value_parser = parse_sensor, default_value = "CO2=/dev/ttyS0")]
        sensors: Vec<(String, String)>,

        /// Seconds between two readings
        #[arg(short, long, default_value_t = 30)]
        interval: u64,

        /// Seconds to back off after a failed reading
        #[arg(long, default_value_t = 5)]
        recovery_delay: u64,

        /// Directory receiving the record files
        #[arg(long, default_value = "~/data")]
        log_dir: PathBuf,

        /// Lowest record level written (debug, info, data, warning, error)
        #[arg(long, default_value = "info")]
        log_level: Level,
    },
    /// Inspect or change automatic baseline calibration
    Abc {
        /// Serial port of the sensor
        #[arg(short, long, default_value = "/dev/ttyS0")]
        port: String,

        #[command(subcommand)]
        action: AbcAction,
    },
}

#[derive(Subcommand, Debug)]
enum AbcAction {
    /// Print the ABC period in hours (0 = disabled)
    Get,
    /// Disable ABC
    Disable,
    /// Enable ABC with the given period
    Enable {
        /// Calibration period in hours
        #[arg(long, default_value_t = DEFAULT_ABC_PERIOD_HOURS)]
        period: u32,
    },
}

fn parse_sensor(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((name, path)) if !name.is_empty() && !path.is_empty() => {
            Ok((name.to_string(), path.to_string()))
        }
        _ => Err(format!("expected NAME=PATH, got '{}'", s)),
    }
}

// Resolves a leading `~` against $HOME.
fn expand_home(path: &Path) -> PathBuf {
    match (path.strip_prefix("~"), std::env::var_os("HOME")) {
        (Ok(rest), Some(home)) => PathBuf::from(home).join(rest),
        _ => path.to_path_buf(),
    }
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    env_logger::Builder::from_default_env()
        .filter_level(if args.verbose {
            log::LevelFilter::Debug
        } else {
            log::LevelFilter::Info
        })
        .init();

    match args.command {
        Cmd::Run {
            sensors,
            interval,
            recovery_delay,
            log_dir,
            log_level,
        } => run(sensors, interval, recovery_delay, &expand_home(&log_dir), log_level),
        Cmd::Abc { port, action } => abc(&port, action),
    }
}

fn run(
    sensors: Vec<(String, String)>,
    interval: u64,
    recovery_delay: u64,
    log_dir: &Path,
    log_level: Level,
) -> anyhow::Result<()> {
    let name = sensors
        .iter()
        .map(|(name, _)| name.as_str())
        .collect::<Vec<_>>()
        .join("-");
    let sink = FileSink::create(log_dir, &name, log_level)
        .with_context(|| format!("Failed to create log file in {}", log_dir.display()))?;
    info!("Logging records to {}", sink.path().display());

    let config = MonitorConfig::new(Duration::from_secs(interval))
        .recovery_delay(Duration::from_secs(recovery_delay));
    let stop = StopSignal::new();
    let mut monitor = Monitor::new(config, sink, stop.clone());

    for (name, path) in sensors {
        let transport = SerialTransport::open(&path)?;
        info!("Sensor {} on {}", name, path);
        monitor = monitor.with_sensor(name, Box::new(S8::new(transport, Config::default())));
    }

    ctrlc::set_handler(move || {
        info!("Shutdown signal received...");
        stop.stop();
    })
    .context("Failed to install signal handler")?;

    if let Err(e) = monitor.run() {
        error!("Monitor stopped on fatal error: {}", e);
        return Err(e.into());
    }
    info!("Monitor stopped");
    Ok(())
}

fn abc(port: &str, action: AbcAction) -> anyhow::Result<()> {
    let transport = SerialTransport::open(port)?;
    let mut sensor = S8::new(transport, Config::default());

    match action {
        AbcAction::Get => {
            let period = sensor.abc_period()?;
            if period == 0 {
                println!("ABC disabled");
            } else {
                println!("ABC period: {} hours", period);
            }
        }
        AbcAction::Disable => {
            if !sensor.disable_abc()? {
                bail!("sensor did not acknowledge ABC disable");
            }
            println!("ABC disabled");
        }
        AbcAction::Enable { period } => {
            if !sensor.enable_abc(period)? {
                bail!("sensor did not acknowledge ABC period {}", period);
            }
            println!("ABC enabled, period {} hours", period);
        }
    }

    sensor.close();
    Ok(())
}
