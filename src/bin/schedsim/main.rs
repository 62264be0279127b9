//! schedsim: run scheduling policy simulations from JSON workloads.

use std::path::PathBuf;

use anyhow::{anyhow, bail, Context, Result};
use clap::Parser;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

use sched_sim::{load_workload, Policy, Scheduler, SimFormat, Simulator, Tick, TraceStats};

/// Run scheduling policy simulations from JSON workloads.
#[derive(Parser)]
#[command(name = "schedsim")]
struct Cli {
    /// Path to a JSON workload file.
    workload: Option<PathBuf>,

    /// Scheduling policy: fifo, sjf, srtf, rr, prio or pip.
    ///
    /// Overrides the workload's "policy" field. Defaults to fifo when
    /// neither is given.
    #[arg(short, long)]
    scheduler: Option<Policy>,

    /// Stop the simulation after this many ticks (overrides the workload).
    #[arg(long, env = "SCHEDSIM_MAX_TICKS", value_name = "TICKS")]
    max_ticks: Option<Tick>,

    /// Don't print the timeline and statistics.
    #[arg(short, long)]
    quiet: bool,

    /// Print trace events to stderr.
    #[arg(long)]
    dump_trace: bool,

    /// Log the scheduling context after every schedule decision.
    #[arg(long)]
    dump_status: bool,

    /// List available scheduling policies and exit.
    #[arg(long)]
    list_schedulers: bool,
}

fn main() {
    let cli = Cli::parse();
    init_tracing(if cli.dump_status {
        LevelFilter::INFO
    } else {
        LevelFilter::WARN
    });

    if let Err(e) = run(&cli) {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<()> {
    if cli.list_schedulers {
        list_schedulers();
        return Ok(());
    }

    let workload_path = cli
        .workload
        .as_ref()
        .ok_or_else(|| anyhow!("missing required argument: <WORKLOAD>"))?;

    let json = std::fs::read_to_string(workload_path)
        .with_context(|| format!("failed to read {}", workload_path.display()))?;
    let workload = load_workload(&json).context("failed to parse workload")?;

    let mut scenario = workload.scenario;
    if let Some(max_ticks) = cli.max_ticks {
        if max_ticks == 0 {
            bail!("--max-ticks must be positive");
        }
        scenario.max_ticks = max_ticks;
    }

    let policy = cli.scheduler.or(workload.policy).unwrap_or(Policy::Fifo);
    let trace = Simulator::new(policy)
        .dump_status(cli.dump_status)
        .run(scenario);

    if cli.dump_trace {
        trace.dump();
    }

    if !cli.quiet {
        println!("{} ({} ticks)", trace.policy(), trace.end_tick());
        print!("{}", trace.timeline());
        println!();
        print!("{}", TraceStats::from_trace(&trace));
    }

    if trace.has_error() {
        bail!("simulation error: {:?}", trace.exit_kind());
    }

    Ok(())
}

fn list_schedulers() {
    for policy in Policy::ALL {
        println!("{:<6} {}", policy.key(), policy.name());
    }
}

/// Log at `default` unless `RUST_LOG` says otherwise.
fn init_tracing(default: LevelFilter) {
    let filter = EnvFilter::builder()
        .with_default_directive(default.into())
        .from_env_lossy();
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .event_format(SimFormat)
        .try_init();
}
