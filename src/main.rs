#![warn(clippy::pedantic)]

use rtsim::{
    task::{DeadlineKind, Set, TaskSet, Time},
    policy::{Policy, Preemption},
    sim::{Config, MissPolicy, HORIZON},
    batch::{self, SweepTable},
    gen, input, bound, Error
};

use clap::{Parser, Subcommand};
use rand::{rngs::StdRng, SeedableRng};
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

use std::{
    fs::File,
    io::{self, BufReader, BufWriter, Write},
    path::{Path, PathBuf},
    process::ExitCode,
    thread,
    time::Instant
};

#[derive(Parser)]
#[command(version, about = "Uniprocessor real-time scheduling simulator")]
struct Cli {
    #[command(subcommand)]
    command: Command
}

#[derive(clap::Args)]
struct RunArgs {
    /// Task-set file, one task-set per line
    file: PathBuf,
    #[arg(long, default_value_t = HORIZON)]
    /// Bound on simulated time
    horizon: Time,
    #[arg(long)]
    /// Simulate up to the horizon even past the hyperperiod
    full_horizon: bool,
    #[arg(short = 'j', long)]
    /// Number of worker threads (defaults to available parallelism)
    threads: Option<usize>,
    #[arg(short = 'o', long)]
    /// Output file (defaults to standard output)
    output: Option<PathBuf>
}

#[derive(Subcommand)]
enum Command {
    /// Generate task-sets with UUniFast
    Gen {
        #[arg(short = 'n')]
        /// Number of tasks in each task-set
        num_tasks: usize,
        #[arg(short = 'u')]
        /// Total utilization, strictly between 0 and 1
        util: f64,
        #[arg(short = 'c')]
        /// Generate constrained instead of implicit deadlines
        constrained: bool,
        #[arg(long, default_value_t = 100)]
        /// Number of task-sets
        count: usize,
        #[arg(long)]
        /// Seed for reproducible generation
        seed: Option<u64>,
        #[arg(short = 'o', long)]
        /// Output file (defaults to standard output)
        output: Option<PathBuf>
    },
    /// Simulate every task-set of a file, writing one result per line
    ///
    /// Each result is 0 if no deadline was missed, and otherwise the (1-based) task of the
    /// highest-priority job that missed its deadline first.
    Sim {
        #[command(flatten)]
        args: RunArgs,
        #[arg(short = 'p', long)]
        /// Scheduling policy: FCFS, SJF, RM or EDF
        policy: Policy,
        #[arg(short = 'm', long)]
        /// Preemption mode: p (preemptive) or np (non-preemptive)
        mode: Preemption,
        #[arg(long)]
        /// Stop each simulation at its first deadline miss
        halt: bool,
        #[arg(long)]
        /// Write full reports with execution traces instead of result codes
        report: bool
    },
    /// Count schedulable task-sets of a file under every policy and mode
    Sweep {
        #[command(flatten)]
        args: RunArgs
    }
}

fn create(path: Option<&Path>) -> io::Result<Box<dyn Write>> {
    let out: Box<dyn Write> = match path {
        Some(path) => Box::new(BufWriter::new(File::create(path)?)),
        None       => Box::new(io::stdout().lock())
    };

    Ok(out)
}

fn threads(requested: Option<usize>) -> usize {
    requested.unwrap_or_else(|| thread::available_parallelism().map_or(1, usize::from))
}

fn load(args: &RunArgs) -> Result<Vec<TaskSet>, Error> {
    let file = File::open(&args.file)?;
    let sets = input::read_task_sets(BufReader::new(file))?;

    info!(file = %args.file.display(), count = sets.len(), "task-sets loaded");

    for (i, entry) in sets.iter().enumerate() {
        debug!(set = i + 1, target_util = entry.util, utilization = %entry.tasks.utilization().canonicalize(),
               feasible = bound::feasible(&entry.tasks), liu_layland = ?bound::liu_layland(&entry.tasks));
    }

    Ok(sets.into_iter().map(|entry| entry.tasks).collect())
}

fn base_config(args: &RunArgs) -> Config {
    Config {
        horizon: args.horizon,
        bound_by_hyperperiod: !args.full_horizon,
        ..Config::default()
    }
}

fn run(cli: Cli) -> Result<(), Error> {
    let start = Instant::now();

    match cli.command {
        Command::Gen { num_tasks, util, constrained, count, seed, output } => {
            let kind = if constrained {
                DeadlineKind::Constrained
            } else {
                DeadlineKind::Implicit
            };

            let tasks = gen::Tasks::new(num_tasks, util, kind)?;
            let mut rng = seed.map_or_else(StdRng::from_entropy, StdRng::seed_from_u64);
            let mut out = create(output.as_deref())?;

            for _ in 0 .. count {
                input::write_task_set(&mut out, tasks.util(), &tasks.gen(&mut rng)?)?;
            }

            out.flush()?;
            info!(count, num_tasks, util = tasks.util(), kind = ?tasks.kind(), "task-sets generated");
        },

        Command::Sim { args, policy, mode, halt, report } => {
            let sets = load(&args)?;
            let config = Config {
                policy,
                preemption: mode,
                on_miss: if halt { MissPolicy::Halt } else { MissPolicy::Continue },
                trace: report,
                ..base_config(&args)
            };

            info!(%policy, preemption = %mode, horizon = config.horizon, "simulating");

            let results = batch::simulate_all(&sets, config, threads(args.threads));
            let mut out = create(args.output.as_deref())?;

            for (i, res) in results.iter().enumerate() {
                if report {
                    writeln!(out, "# task-set {}\n{res}\n", i + 1)?;
                } else {
                    writeln!(out, "{}", res.code())?;
                }
            }

            out.flush()?;

            let schedulable = results.iter().filter(|res| res.schedulable()).count();
            info!(schedulable, total = results.len(), "simulation done");
        },

        Command::Sweep { args } => {
            let sets = load(&args)?;
            let tallies = batch::sweep(&sets, base_config(&args), threads(args.threads));

            let mut out = create(args.output.as_deref())?;
            writeln!(out, "{}", SweepTable(&tallies))?;
            out.flush()?;
        }
    }

    info!(elapsed = ?start.elapsed(), "done");
    Ok(())
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(io::stderr)
        .init();

    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}
