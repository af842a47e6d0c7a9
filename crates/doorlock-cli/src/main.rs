//! Doorlock - host emulator for the door-lock access controller
//!
//! Runs the controller against an emulated board: keypad and fingerprint
//! sensor are driven from stdin, the display is echoed to stdout and the
//! audit log lives in an EEPROM image file that survives restarts.

mod board;
mod console;
mod eeprom;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use anyhow::{Context, Result, anyhow, bail};
use clap::{Parser, Subcommand, ValueEnum};
use doorlock_controller::{Controller, FaultIndicator, self_check};
use doorlock_core::{ControllerConfig, constants::LOG_FOOTPRINT};
use doorlock_hardware::mock::VirtualLcdHandle;
use doorlock_storage::AuditLog;
use tokio::sync::mpsc;
use tokio::task::JoinError;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::board::{HostClock, HostHandles};
use crate::console::Input;
use crate::eeprom::FileEeprom;

#[derive(Parser)]
#[command(name = "doorlock")]
#[command(about = "Door-lock access controller emulator", long_about = None)]
#[command(version)]
struct Cli {
    /// Controller configuration (TOML); built-in defaults when omitted
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// EEPROM image holding the audit log
    #[arg(short, long, global = true, default_value = "doorlock.eeprom")]
    eeprom: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the controller, reading keypad and sensor input from stdin
    Run {
        /// Make a device fail the boot self-check
        #[arg(long, value_enum)]
        fault: Option<SimulatedFault>,
    },

    /// Print the audit log as JSON, newest first
    Log,

    /// Erase every audit log entry
    ClearLog,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum SimulatedFault {
    Clock,
    Sensor,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "doorlock=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run { fault } => {
            let config = load_config(cli.config.as_deref())?;
            run(config, &cli.eeprom, fault).await
        }
        Commands::Log => print_log(&cli.eeprom),
        Commands::ClearLog => clear_log(&cli.eeprom),
    }
}

fn load_config(path: Option<&Path>) -> Result<ControllerConfig> {
    match path {
        Some(path) => ControllerConfig::load(path)
            .with_context(|| format!("Failed to load config {}", path.display())),
        None => Ok(ControllerConfig::default()),
    }
}

async fn run(config: ControllerConfig, eeprom: &Path, fault: Option<SimulatedFault>) -> Result<()> {
    let clock = match fault {
        Some(SimulatedFault::Clock) => HostClock::stopped(),
        _ => HostClock::new(),
    };
    let (mut peripherals, storage, handles) = board::build(eeprom, clock)
        .with_context(|| format!("Failed to open EEPROM image {}", eeprom.display()))?;
    if fault == Some(SimulatedFault::Sensor) {
        handles.sensor.set_offline(true);
    }

    info!(
        eeprom = %storage.path().display(),
        "Starting doorlock emulator v{}",
        doorlock_core::VERSION
    );
    println!("{}", console::HELP);

    let refresh = config.poll_interval();
    let panel = tokio::spawn(echo_display(handles.lcd.clone(), refresh));

    let stop = Arc::new(AtomicBool::new(false));
    let mut worker = {
        let stop = Arc::clone(&stop);
        tokio::task::spawn_blocking(move || -> Result<()> {
            let fault = match self_check(&mut peripherals) {
                Ok(()) => {
                    let mut controller = Controller::new(config, peripherals, storage)?;
                    while !stop.load(Ordering::Relaxed) {
                        if let Err(error) = controller.tick() {
                            // Devices are detached on shutdown
                            if stop.load(Ordering::Relaxed) {
                                break;
                            }
                            return Err(error.into());
                        }
                    }
                    return Ok(());
                }
                Err(fault) => fault,
            };

            let mut indicator = FaultIndicator::new(peripherals, fault);
            while !stop.load(Ordering::Relaxed) {
                indicator.blink_once();
            }
            Err(anyhow!("Boot halted: {}", indicator.fault()))
        })
    };

    let lines = spawn_stdin_reader();
    let outcome = tokio::select! {
        result = feed_console(lines, &handles) => result,
        _ = tokio::signal::ctrl_c() => {
            info!("Interrupted");
            Ok(())
        }
        joined = &mut worker => {
            panel.abort();
            return finish(joined);
        }
    };

    stop.store(true, Ordering::Relaxed);
    drop(handles);
    let joined = worker.await;
    panel.abort();

    outcome?;
    finish(joined)
}

fn finish(joined: std::result::Result<Result<()>, JoinError>) -> Result<()> {
    joined.context("Controller thread panicked")?
}

/// Read stdin on a plain thread; a blocked read never holds up shutdown.
fn spawn_stdin_reader() -> mpsc::Receiver<String> {
    let (tx, rx) = mpsc::channel(16);
    std::thread::spawn(move || {
        for line in std::io::stdin().lines() {
            let Ok(line) = line else { break };
            if tx.blocking_send(line).is_err() {
                break;
            }
        }
    });
    rx
}

async fn feed_console(mut lines: mpsc::Receiver<String>, handles: &HostHandles) -> Result<()> {
    while let Some(line) = lines.recv().await {
        let input = match console::parse_line(&line) {
            Ok(Some(input)) => input,
            Ok(None) => continue,
            Err(error) => {
                eprintln!("{error:#}");
                continue;
            }
        };

        match input {
            Input::Quit => break,
            Input::Help => println!("{}", console::HELP),
            Input::Show => println!(
                "{}",
                console::frame(&handles.lcd.lines(), handles.lcd.backlight())
            ),
            other => console::apply(handles, &other).await?,
        }
    }
    Ok(())
}

/// Print the display whenever it settles on new content.
async fn echo_display(lcd: VirtualLcdHandle, every: Duration) {
    let mut ticker = tokio::time::interval(every);
    let mut shown = None;
    let mut previous = None;

    loop {
        ticker.tick().await;
        let current = (lcd.lines(), lcd.backlight());

        // Same content on two polls: not caught between clear and write
        if previous.as_ref() == Some(&current) && shown.as_ref() != Some(&current) {
            println!("{}", console::frame(&current.0, current.1));
            shown = Some(current.clone());
        }
        previous = Some(current);
    }
}

fn open_log(path: &Path) -> Result<AuditLog<FileEeprom>> {
    if !path.exists() {
        bail!("No EEPROM image at {}", path.display());
    }
    let storage = FileEeprom::open(path, LOG_FOOTPRINT)
        .with_context(|| format!("Failed to open EEPROM image {}", path.display()))?;
    Ok(AuditLog::load(storage)?)
}

fn print_log(path: &Path) -> Result<()> {
    let log = open_log(path)?;
    let records: Vec<_> = log.list_recent().collect();
    println!("{}", serde_json::to_string_pretty(&records)?);
    Ok(())
}

fn clear_log(path: &Path) -> Result<()> {
    let mut log = open_log(path)?;
    let removed = log.len();
    log.clear_all()?;
    info!(path = %log.storage().path().display(), removed, "Audit log cleared");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use doorlock_core::Timestamp;
    use tempfile::tempdir;

    fn stamp(minute: u32) -> Timestamp {
        Timestamp::from_datetime(
            NaiveDate::from_ymd_opt(2024, 5, 1)
                .unwrap()
                .and_hms_opt(8, minute, 0)
                .unwrap(),
        )
    }

    #[test]
    fn test_cli_parses_subcommands() {
        let cli = Cli::try_parse_from(["doorlock", "--eeprom", "x.bin", "log"]).unwrap();
        assert_eq!(cli.eeprom, PathBuf::from("x.bin"));
        assert!(matches!(cli.command, Commands::Log));

        let cli = Cli::try_parse_from(["doorlock", "run", "--fault", "sensor"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Run {
                fault: Some(SimulatedFault::Sensor)
            }
        ));
        assert_eq!(cli.eeprom, PathBuf::from("doorlock.eeprom"));
    }

    #[test]
    fn test_missing_config_falls_back_to_defaults() {
        let config = load_config(None).unwrap();
        assert_eq!(config.lockout_threshold, 3);
    }

    #[test]
    fn test_config_file_is_validated() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("doorlock.toml");
        std::fs::write(&path, "lockout_threshold = 0\n").unwrap();

        assert!(load_config(Some(&path)).is_err());
    }

    #[test]
    fn test_log_needs_an_existing_image() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("absent.eeprom");

        assert!(print_log(&path).is_err());
        assert!(!path.exists());
    }

    #[test]
    fn test_clear_log_persists() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("lock.eeprom");
        {
            let storage = FileEeprom::open(&path, LOG_FOOTPRINT).unwrap();
            let mut log = AuditLog::load(storage).unwrap();
            log.append("Father", stamp(1)).unwrap();
            log.append("Son", stamp(2)).unwrap();
        }
        assert_eq!(open_log(&path).unwrap().len(), 2);

        clear_log(&path).unwrap();

        let log = open_log(&path).unwrap();
        assert!(log.is_empty());
        assert_eq!(log.cursor(), 0);
    }

    #[test]
    fn test_log_json_is_newest_first() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("lock.eeprom");
        let storage = FileEeprom::open(&path, LOG_FOOTPRINT).unwrap();
        let mut log = AuditLog::load(storage).unwrap();
        log.append("Mother", stamp(1)).unwrap();
        log.append("Daughter", stamp(2)).unwrap();

        let records: Vec<_> = log.list_recent().collect();
        let json = serde_json::to_value(&records).unwrap();

        assert_eq!(json[0]["label"], "Daughter");
        assert_eq!(json[1]["label"], "Mother");
    }
}
