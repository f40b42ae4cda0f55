//! powerstatsd - Power entity state residency daemon.
//!
//! Polls the device's residency counter files on a fixed interval and logs
//! (or prints as JSON) the aggregated snapshot.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;
#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use clap::Parser;
use tracing::{Level, debug, error, info, warn};
use tracing_subscriber::EnvFilter;

use powerstats_core::collector::RealFs;
use powerstats_core::device;
use powerstats_core::models::Snapshot;
use powerstats_core::residency::PowerStats;

/// Power entity state residency daemon.
#[derive(Parser)]
#[command(name = "powerstatsd", about = "Power entity state residency daemon", version)]
struct Args {
    /// Collection interval in seconds.
    #[arg(short, long, default_value = "10")]
    interval: u64,

    /// Root prepended to every counter path (for captured sysfs trees).
    #[arg(long, default_value = "/")]
    root: PathBuf,

    /// Collect once and exit.
    #[arg(long)]
    once: bool,

    /// Print each snapshot as a JSON line on stdout.
    #[arg(long)]
    json: bool,

    /// Increase logging verbosity (-v for debug, -vv for trace). Default is info level.
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Quiet mode - only show errors.
    #[arg(short, long)]
    quiet: bool,
}

/// Initializes the tracing subscriber with the appropriate log level.
/// `RUST_LOG` takes precedence when set.
fn init_logging(verbose: u8, quiet: bool) {
    let level = if quiet {
        Level::ERROR
    } else {
        match verbose {
            0 => Level::INFO,
            1 => Level::DEBUG,
            _ => Level::TRACE,
        }
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!("powerstatsd={level},powerstats_core={level}"))
    });

    // Logs go to stderr so --json output stays machine-readable
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Describes the contents of a snapshot for logging.
fn describe_snapshot(snapshot: &Snapshot) -> String {
    let empty = snapshot.iter().filter(|r| r.is_empty()).count();
    let mut desc = format!(
        "{} records, {} entities",
        snapshot.len(),
        snapshot.entity_count()
    );
    if empty > 0 {
        desc.push_str(&format!(", {} without counters", empty));
    }
    desc
}

/// Runs one collection cycle and reports the result.
fn collect_once(stats: &mut PowerStats, count: u64, json: bool) {
    let snapshot = stats.collect();

    info!("Snapshot #{}: {}", count, describe_snapshot(&snapshot));

    if let Some(timing) = stats.last_timing() {
        debug!(
            total_us = timing.total.as_micros() as u64,
            providers = timing.providers.len(),
            "collection timing"
        );
        for p in &timing.providers {
            debug!(
                provider = %p.provider,
                elapsed_us = p.elapsed.as_micros() as u64,
                records = p.records,
                "provider timing"
            );
        }
    }

    if json {
        match serde_json::to_string(&snapshot) {
            Ok(line) => println!("{line}"),
            Err(e) => error!("Failed to serialize snapshot: {}", e),
        }
    }
}

fn main() {
    let args = Args::parse();

    init_logging(args.verbose, args.quiet);

    info!("powerstatsd {} starting", env!("CARGO_PKG_VERSION"));
    info!(
        "Config: interval={}s, root={}",
        args.interval,
        args.root.display()
    );

    let mut stats = device::build(RealFs::new(), &args.root);
    let entities = stats.power_entity_info();
    info!(
        "Registered {} providers, {} power entities",
        stats.provider_count(),
        entities.len()
    );
    for entity in &entities {
        debug!(id = entity.id, entity = %entity.name, states = entity.states.len(), "power entity");
    }

    if args.once {
        collect_once(&mut stats, 1, args.json);
        return;
    }

    let interval = Duration::from_secs(args.interval);

    // Setup graceful shutdown
    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();

    if let Err(e) = ctrlc::set_handler(move || {
        info!("Received shutdown signal");
        r.store(false, Ordering::SeqCst);
    }) {
        warn!("Failed to set Ctrl-C handler: {}", e);
    }

    let mut snapshot_count: u64 = 0;
    info!("Starting collection loop");

    while running.load(Ordering::SeqCst) {
        snapshot_count += 1;
        collect_once(&mut stats, snapshot_count, args.json);

        // Sleep with periodic checks for shutdown signal
        let sleep_interval = Duration::from_millis(100);
        let mut remaining = interval;
        while remaining > Duration::ZERO && running.load(Ordering::SeqCst) {
            let sleep_time = remaining.min(sleep_interval);
            std::thread::sleep(sleep_time);
            remaining = remaining.saturating_sub(sleep_time);
        }
    }

    info!("Shutdown complete");
}
