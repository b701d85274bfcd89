//! Talkersim - marine talker-device simulator
//!
//! Headless command-line front end: lists ports and devices, encodes single
//! messages and runs periodic transmission to a serial port.

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use talkersim_core::cli::{
    device_report, encode_report, print_exit_codes, CliResult, ExitCodes, OutputFormat,
};
use talkersim_core::config::AppConfig;
use talkersim_core::core::device::{MessageKind, ParameterSnapshot, ValidationError};
use talkersim_core::core::encoder::encode_validated;
use talkersim_core::core::logger::{ConsoleFormat, ConsoleSink, MessageLog, TeeSink};
use talkersim_core::core::runner::{run_until_stopped, StopReason};
use talkersim_core::core::scheduler::{
    CyclingSnapshots, FailurePolicy, FixedSnapshot, SnapshotSource, TransmissionScheduler,
};
use talkersim_core::core::transport::{
    list_ports, SerialConfig, SerialParity, SerialStopBits, SerialTransport, Transport, BAUD_RATES,
};
use tokio::sync::watch;
use tracing::{info, Level};
use tracing_subscriber::EnvFilter;

/// Talkersim CLI
#[derive(Parser, Debug)]
#[command(
    name = "talkersim",
    version,
    about = "Marine talker-device simulator (NMEA-0183 and binary sensor frames)",
    long_about = None
)]
struct Cli {
    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text, global = true)]
    format: OutputFormat,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Quiet mode (errors only)
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Config file (defaults to the platform config directory)
    #[arg(long, global = true, env = "TALKERSIM_CONFIG")]
    config: Option<PathBuf>,

    /// Write diagnostics to this file instead of stderr
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List available serial ports
    ListPorts,

    /// List simulated devices and their fields
    Devices,

    /// Encode one message and print it
    Encode {
        /// Device (compass, sonar, sensor)
        #[arg(short, long)]
        device: Option<MessageKind>,

        /// Field assignment, e.g. heading=5.0 (repeatable)
        #[arg(short, long = "set", value_name = "KEY=VALUE")]
        set: Vec<String>,
    },

    /// Transmit periodically until interrupted
    Run {
        /// Device (compass, sonar, sensor)
        #[arg(short, long)]
        device: Option<MessageKind>,

        /// Serial port name (e.g., COM3, /dev/ttyUSB0)
        #[arg(short, long)]
        port: Option<String>,

        /// Baud rate
        #[arg(short, long)]
        baud: Option<u32>,

        /// Data bits (5-8)
        #[arg(long)]
        data_bits: Option<u8>,

        /// Parity
        #[arg(long)]
        parity: Option<SerialParity>,

        /// Stop bits (1, 2)
        #[arg(long)]
        stop_bits: Option<SerialStopBits>,

        /// Tick interval in milliseconds
        #[arg(short, long)]
        interval: Option<u64>,

        /// Field assignment, e.g. depth=12.3 (repeatable)
        #[arg(short, long = "set", value_name = "KEY=VALUE")]
        set: Vec<String>,

        /// Stop after this many messages
        #[arg(short = 'n', long)]
        count: Option<u64>,

        /// Consecutive send failures before stopping (0 = never)
        #[arg(long)]
        max_failures: Option<u32>,

        /// Rotate through all devices, one message each
        #[arg(long)]
        cycle: bool,

        /// Omit timestamps from displayed lines
        #[arg(long)]
        no_timestamps: bool,
    },

    /// Show exit codes
    ExitCodes,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let _log_guard = init_tracing(&cli);

    let result = match dispatch(&cli).await {
        Ok(result) => result,
        Err(e) => CliResult::error(ExitCodes::ERROR, format!("{e:#}")),
    };

    if let CliResult::Error(_, msg) = &result {
        eprintln!("error: {msg}");
    }
    result.to_exit_code()
}

/// Install the tracing subscriber; the guard must live until exit
fn init_tracing(cli: &Cli) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let level = if cli.verbose {
        Level::DEBUG
    } else if cli.quiet {
        Level::WARN
    } else {
        Level::INFO
    };
    let filter = EnvFilter::from_default_env().add_directive(level.into());

    if let Some(path) = &cli.log_file {
        let dir = path.parent().filter(|d| !d.as_os_str().is_empty()).unwrap_or(Path::new("."));
        let file = path.file_name().map_or_else(|| "talkersim.log".into(), ToOwned::to_owned);
        let (writer, guard) = tracing_appender::non_blocking(tracing_appender::rolling::never(dir, file));
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_ansi(false)
            .with_writer(writer)
            .init();
        Some(guard)
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
        None
    }
}

async fn dispatch(cli: &Cli) -> anyhow::Result<CliResult> {
    match &cli.command {
        Commands::ListPorts => list_serial_ports(cli),
        Commands::Devices => list_devices(cli),
        Commands::Encode { device, set } => {
            let config = match load_config(cli) {
                Ok(config) => config,
                Err(result) => return Ok(result),
            };
            encode_once(cli, &config, device.unwrap_or(config.transmission.device), set)
        }
        Commands::Run { .. } => run(cli).await,
        Commands::ExitCodes => {
            print_exit_codes();
            Ok(CliResult::success())
        }
    }
}

fn load_config(cli: &Cli) -> Result<AppConfig, CliResult> {
    let loaded = match &cli.config {
        Some(path) => AppConfig::load_from(path),
        None => AppConfig::load(),
    };
    loaded.map_err(CliResult::from)
}

fn list_serial_ports(cli: &Cli) -> anyhow::Result<CliResult> {
    let ports = match list_ports() {
        Ok(ports) => ports,
        Err(e) => return Ok(e.into()),
    };

    match cli.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&ports)?),
        OutputFormat::Text => {
            if ports.is_empty() {
                if !cli.quiet {
                    println!("No serial ports found.");
                }
            } else {
                for port in &ports {
                    println!("{:<20} {}", port.name, port.kind);
                }
            }
            if !cli.quiet {
                let rates: Vec<String> = BAUD_RATES.iter().map(ToString::to_string).collect();
                println!("Baud rates: {}", rates.join(", "));
            }
        }
    }
    Ok(CliResult::success())
}

fn list_devices(cli: &Cli) -> anyhow::Result<CliResult> {
    let reports: Vec<_> = MessageKind::all().iter().map(|kind| device_report(*kind)).collect();
    match cli.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&reports)?),
        OutputFormat::Text => {
            for report in &reports {
                print!("{}", report.to_text());
            }
        }
    }
    Ok(CliResult::success())
}

/// Configured parameters for `kind` with command-line assignments on top
fn parameters(
    config: &AppConfig,
    kind: MessageKind,
    assignments: &[String],
) -> Result<ParameterSnapshot, ValidationError> {
    let spec = kind.spec();
    let mut snapshot = config.parameters_for(kind);
    for assignment in assignments {
        let (key, value) = spec.parse_assignment(assignment)?;
        snapshot.insert(&key, value);
    }
    Ok(snapshot)
}

fn encode_once(
    cli: &Cli,
    config: &AppConfig,
    kind: MessageKind,
    assignments: &[String],
) -> anyhow::Result<CliResult> {
    let snapshot = match parameters(config, kind, assignments) {
        Ok(snapshot) => snapshot,
        Err(e) => return Ok(CliResult::invalid_args(e.to_string())),
    };
    let message = match encode_validated(kind, &snapshot) {
        Ok(message) => message,
        Err(e) => return Ok(e.into()),
    };

    let report = encode_report(kind, snapshot, &message);
    match cli.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Text => println!("{}", report.to_text()),
    }
    Ok(CliResult::success())
}

async fn run(cli: &Cli) -> anyhow::Result<CliResult> {
    let Commands::Run {
        device,
        port,
        baud,
        data_bits,
        parity,
        stop_bits,
        interval,
        set,
        count,
        max_failures,
        cycle,
        no_timestamps,
    } = &cli.command
    else {
        return Ok(CliResult::error(ExitCodes::INTERNAL_ERROR, "not a run command"));
    };

    let config = match load_config(cli) {
        Ok(config) => config,
        Err(result) => return Ok(result),
    };

    let mut port_config: SerialConfig = config.port.clone();
    if let Some(port) = port {
        port_config.port.clone_from(port);
    }
    if let Some(baud) = baud {
        port_config.baud_rate = *baud;
    }
    if let Some(bits) = data_bits {
        port_config.data_bits = *bits;
    }
    if let Some(parity) = parity {
        port_config.parity = *parity;
    }
    if let Some(stop_bits) = stop_bits {
        port_config.stop_bits = *stop_bits;
    }

    let kind = device.unwrap_or(config.transmission.device);
    let interval_ms = interval.unwrap_or(config.transmission.interval_ms);
    let policy = max_failures.map_or_else(
        || config.failure_policy(),
        |max| FailurePolicy {
            max_consecutive_failures: max,
        },
    );

    let snapshot = match parameters(&config, kind, set) {
        Ok(snapshot) => snapshot,
        Err(e) => return Ok(CliResult::invalid_args(e.to_string())),
    };
    let mut source: Box<dyn SnapshotSource> = if *cycle {
        let mut cycling = CyclingSnapshots::new(kind);
        for other in MessageKind::all() {
            let parameters = if *other == kind {
                snapshot.clone()
            } else {
                config.parameters_for(*other)
            };
            cycling = cycling.with_parameters(*other, parameters);
        }
        Box::new(cycling)
    } else {
        Box::new(FixedSnapshot::new(kind, snapshot))
    };

    let mut scheduler = TransmissionScheduler::with_policy(SerialTransport::new(), policy);
    if let Err(e) = scheduler.start(&port_config, interval_ms) {
        return Ok(e.into());
    }

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    ctrlc::set_handler(move || {
        let _ = shutdown_tx.send(true);
    })?;

    let format = match cli.format {
        OutputFormat::Text => ConsoleFormat::Text,
        OutputFormat::Json => ConsoleFormat::JsonLines,
    };
    let timestamps = config.display.timestamps && !*no_timestamps;
    let log = MessageLog::with_capacity(config.display.log_capacity).shared();
    let mut sink = TeeSink::new(ConsoleSink::stdout(format, timestamps), log.clone());

    let summary = run_until_stopped(&mut scheduler, source.as_mut(), &mut sink, shutdown_rx, *count).await;
    let stats = scheduler.transport().stats();
    let log = log.lock();
    let logged_errors = log.errors();
    info!(
        bytes = stats.bytes_sent,
        errors = stats.errors,
        skipped = summary.skipped,
        logged = log.len(),
        logged_errors = logged_errors.len(),
        "Transmission summary"
    );

    if !cli.quiet && cli.format == OutputFormat::Text {
        eprintln!(
            "Sent {} message(s) in {} tick(s); {} skipped, {} failed",
            summary.sent_count, summary.ticks, summary.skipped, summary.send_failures
        );
        if let Some(last) = logged_errors.last() {
            eprintln!("Last error: {last}");
        }
    }

    Ok(match summary.reason {
        StopReason::TransportFailures => CliResult::error(
            ExitCodes::TRANSMISSION_FAILED,
            format!(
                "stopped after {} consecutive send failures",
                policy.max_consecutive_failures
            ),
        ),
        StopReason::Shutdown | StopReason::MessageLimit | StopReason::NotRunning => {
            CliResult::success()
        }
    })
}
