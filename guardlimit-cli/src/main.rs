//! guardlimit command line.
//!
//! Usage:
//!   guardlimit scan            # tune matching guard processes once
//!   guardlimit scan --json     # same, JSON report
//!   guardlimit watch           # monitor continuously, print events

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::{Parser, Subcommand};
use guardlimit::{
    create_platform, Monitor, MonitorConfig, MonitorEvent, OpOutcome, ResourceTuner, ScanResult,
    SysinfoDirectory, TargetSet, TuningScheduler, GUARD_PROCESS_NAMES,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "guardlimit")]
#[command(about = "Deprioritize anti-cheat guard processes")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Parser, Debug)]
struct ScanArgs {
    /// Seconds before the same pid may be re-tuned.
    #[clap(long, default_value_t = 300)]
    cooldown_secs: u64,

    /// Print the scan result as JSON instead of text rows.
    #[clap(long)]
    json: bool,
}

#[derive(Parser, Debug)]
struct WatchArgs {
    /// Seconds between scan cycles.
    #[clap(long, default_value_t = 30)]
    interval_secs: u64,

    /// Seconds before the same pid may be re-tuned.
    #[clap(long, default_value_t = 300)]
    cooldown_secs: u64,

    /// Path to the launcher executable (wegame.exe).
    #[clap(long)]
    launcher_path: Option<PathBuf>,

    /// Observe the launcher only; never start it.
    #[clap(long)]
    no_launch: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Tune matching guard processes once and report per-process outcomes
    Scan(ScanArgs),
    /// Monitor continuously and print the event stream
    Watch(WatchArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Scan(args) => run_scan(args),
        Commands::Watch(args) => run_watch(args).await,
    }
}

fn run_scan(args: ScanArgs) -> Result<()> {
    let directory = Arc::new(SysinfoDirectory::new());
    let tuner = ResourceTuner::new(create_platform());
    let mut scheduler =
        TuningScheduler::new(directory, tuner, Duration::from_secs(args.cooldown_secs));

    let targets = TargetSet::new(GUARD_PROCESS_NAMES);
    let result = scheduler.scan(&targets);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else if result.is_empty() {
        println!("not found");
    } else {
        println!("find");
        let pids: Vec<String> = result.rows.iter().map(|row| row.pid.to_string()).collect();
        println!("{}", pids.join(" "));
        print_rows(&result);
    }

    if result.is_empty() {
        std::process::exit(1);
    }
    Ok(())
}

async fn run_watch(args: WatchArgs) -> Result<()> {
    let config = MonitorConfig {
        launcher_path: args.launcher_path,
        autostart_launcher: !args.no_launch,
        scan_interval: Duration::from_secs(args.interval_secs.max(1)),
        reapply_after: Duration::from_secs(args.cooldown_secs),
        ..MonitorConfig::default()
    };
    let mut handle = Monitor::spawn(config);

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                handle.stop();
            }
            event = handle.next_event() => {
                let Some(event) = event else { break };
                match event {
                    MonitorEvent::Scan(result) => {
                        if result.is_empty() {
                            println!("no guard processes found");
                        } else {
                            print_rows(&result);
                        }
                    }
                    MonitorEvent::LauncherPresence(presence) => {
                        println!("launcher: {presence}");
                    }
                    MonitorEvent::GuardOptimized => {
                        println!("guard processes optimized");
                    }
                    MonitorEvent::Stopped(reason) => {
                        println!("stopped: {reason}");
                        break;
                    }
                }
            }
        }
    }

    handle.join().await;
    Ok(())
}

fn print_rows(result: &ScanResult) {
    for row in &result.rows {
        if !row.did_apply {
            println!("{} pid={} skipped (cooldown)", row.name, row.pid);
            continue;
        }
        if let Some(outcome) = &row.efficiency {
            println!(
                "{} pid={} efficiency={} ({})",
                row.name,
                row.pid,
                status(outcome),
                outcome.detail
            );
        }
        if let Some(outcome) = &row.affinity {
            println!(
                "{} pid={} affinity={} ({})",
                row.name,
                row.pid,
                status(outcome),
                outcome.detail
            );
        }
    }
}

fn status(outcome: &OpOutcome) -> &'static str {
    if outcome.ok {
        "ok"
    } else {
        "failed"
    }
}
