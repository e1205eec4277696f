//! host_pulse - Host Telemetry Binary
//!
//! Samples CPU, memory, disk, battery and network counters and prints the
//! derived metrics as they are published.

use anyhow::Context;
use clap::{Args, Parser, Subcommand, ValueEnum};
use futures_util::stream::{select_all, StreamExt};
use host_pulse::{
    indicator, scheduler, Cadence, DerivedMetric, EngineConfig, HostCounters, MetricHub,
    MetricKind, PollScheduler, Reading, DEFAULT_BATTERY_PERIOD_SECS, DEFAULT_DISK_PATH,
    DEFAULT_DISK_PERIOD_SECS, DEFAULT_FAST_PERIOD_MS, DEFAULT_INTERFACE,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, Level};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser)]
#[command(name = "host_pulse")]
#[command(about = "Live host telemetry: CPU, memory, disk, battery and network")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(long_about = "Samples operating system counters on fixed cadences and prints derived metrics")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Network interface to monitor
    #[arg(long, default_value = DEFAULT_INTERFACE)]
    interface: String,

    /// Do not fall back to the first active interface when --interface is missing
    #[arg(long)]
    no_auto_interface: bool,

    /// Path whose volume is reported
    #[arg(long, default_value = DEFAULT_DISK_PATH)]
    disk_path: PathBuf,

    /// CPU, memory and network polling period in milliseconds
    #[arg(long, default_value_t = DEFAULT_FAST_PERIOD_MS)]
    fast_ms: u64,

    /// Battery polling period in seconds
    #[arg(long, default_value_t = DEFAULT_BATTERY_PERIOD_SECS)]
    battery_secs: u64,

    /// Disk polling period in seconds
    #[arg(long, default_value_t = DEFAULT_DISK_PERIOD_SECS)]
    disk_secs: u64,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Print metrics as they are published (default)
    Watch(WatchArgs),

    /// Sample every collector once and exit
    Snapshot(SnapshotArgs),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Pretty,
    Json,
}

#[derive(Args)]
struct WatchArgs {
    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Pretty)]
    format: OutputFormat,

    /// Stop after this many seconds
    #[arg(long)]
    duration: Option<u64>,
}

#[derive(Args)]
struct SnapshotArgs {
    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Pretty)]
    format: OutputFormat,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_logging(&cli)?;

    let config = engine_config(&cli);
    config.validate()?;

    match &cli.command {
        Some(Commands::Watch(args)) => watch_command(&config, args).await,
        Some(Commands::Snapshot(args)) => snapshot_command(&config, args).await,
        None => {
            // Default to watch command
            let watch_args = WatchArgs {
                format: OutputFormat::Pretty,
                duration: None,
            };
            watch_command(&config, &watch_args).await
        }
    }
}

fn init_logging(cli: &Cli) -> anyhow::Result<()> {
    tracing::subscriber::set_global_default(build_subscriber(log_filter(log_level(cli))))
        .context("failed to install tracing subscriber")?;

    Ok(())
}

fn log_level(cli: &Cli) -> Level {
    if cli.debug {
        Level::DEBUG
    } else if cli.verbose {
        Level::INFO
    } else {
        Level::WARN
    }
}

/// `RUST_LOG` wins when set; otherwise the level picked on the command line.
fn log_filter(level: Level) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.to_string()))
}

fn build_subscriber(filter: EnvFilter) -> impl tracing::Subscriber + Send + Sync {
    FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .finish()
}

fn engine_config(cli: &Cli) -> EngineConfig {
    EngineConfig::new(&cli.interface)
        .with_auto_detect_interface(!cli.no_auto_interface)
        .with_disk_path(cli.disk_path.clone())
        .with_fast_period(Duration::from_millis(cli.fast_ms))
        .with_battery_period(Duration::from_secs(cli.battery_secs))
        .with_disk_period(Duration::from_secs(cli.disk_secs))
}

async fn watch_command(config: &EngineConfig, args: &WatchArgs) -> anyhow::Result<()> {
    let hub = Arc::new(MetricHub::new());
    let mut updates = select_all(MetricKind::ALL.map(|kind| hub.watch(kind)));

    let scheduler = PollScheduler::start(config, Arc::new(HostCounters::new()), Arc::clone(&hub))?;
    info!("Watching {} (fast period {:?})", config.interface, config.fast_period);

    let deadline = async {
        match args.duration {
            Some(secs) => tokio::time::sleep(Duration::from_secs(secs)).await,
            None => std::future::pending().await,
        }
    };
    tokio::pin!(deadline);
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            _ = &mut ctrl_c => {
                info!("Interrupted, stopping");
                break;
            }
            _ = &mut deadline => break,
            Some(metric) = updates.next() => print_metric(&metric, args.format)?,
        }
    }

    scheduler.stop().await;
    Ok(())
}

async fn snapshot_command(config: &EngineConfig, args: &SnapshotArgs) -> anyhow::Result<()> {
    let source = HostCounters::new();
    let mut collectors = Cadence::ALL
        .into_iter()
        .flat_map(|cadence| cadence.collectors(config))
        .collect::<Vec<_>>();

    // CPU and network need a second sample for their deltas.
    scheduler::sample(&mut collectors, &source, std::time::Instant::now());
    tokio::time::sleep(config.fast_period).await;
    let metrics = scheduler::sample(&mut collectors, &source, std::time::Instant::now());

    match args.format {
        OutputFormat::Json => {
            let json = serde_json::json!({
                "timestamp": chrono::Utc::now().timestamp_millis(),
                "metrics": metrics,
            });
            println!("{}", serde_json::to_string_pretty(&json)?);
        }
        OutputFormat::Pretty => print_pretty_snapshot(&metrics),
    }

    Ok(())
}

fn print_metric(metric: &DerivedMetric, format: OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string(metric)?),
        OutputFormat::Pretty => {
            let fields = metric
                .render()
                .into_iter()
                .map(|field| format!("{}={}", field.name, field.value))
                .collect::<Vec<_>>()
                .join(" ");
            let timestamp = chrono::Local::now().format("%H:%M:%S");

            match metric {
                DerivedMetric::Cpu(Reading::Ready(cpu)) => println!(
                    "[{timestamp}] {:<8} {fields} frame={}ms",
                    metric.kind(),
                    indicator::frame_interval(cpu.busy_pct()).as_millis()
                ),
                _ => println!("[{timestamp}] {:<8} {fields}", metric.kind()),
            }
        }
    }

    Ok(())
}

fn print_pretty_snapshot(metrics: &[DerivedMetric]) {
    println!(
        "Host Snapshot ({})",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    println!("==========================================");
    println!();

    for metric in metrics {
        let title = match metric.kind() {
            MetricKind::Cpu => "⚡ CPU:",
            MetricKind::Memory => "🧠 Memory:",
            MetricKind::Disk => "💾 Disk:",
            MetricKind::Battery => "🔋 Battery:",
            MetricKind::Network => "🌐 Network:",
        };
        println!("{title}");
        for field in metric.render() {
            println!("  {}: {}", field.name, field.value);
        }
        println!();
    }
}
