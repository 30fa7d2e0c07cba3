//! Evaluation of many task-sets at once.

use crate::{
    policy::{Policy, Preemption},
    report::RunResult,
    sim::{self, Config},
    task::TaskSet
};

use itertools::iproduct;
use tracing::info;

use std::{fmt, thread};

/// Simulates each of `sets` under `config` on up to `threads` worker threads.
///
/// Results are returned in the order of `sets`.
pub fn simulate_all(sets: &[TaskSet], config: Config, threads: usize) -> Vec<RunResult> {
    if sets.is_empty() {
        return Vec::new();
    }

    let chunk = sets.len().div_ceil(threads.clamp(1, sets.len()));
    let mut results = vec![None; sets.len()];

    thread::scope(|s| {
        for (sets, results) in sets.chunks(chunk).zip(results.chunks_mut(chunk)) {
            s.spawn(move || {
                for (ts, res) in sets.iter().zip(results) {
                    *res = Some(sim::simulate(ts, config));
                }
            });
        }
    });

    results.into_iter().flatten().collect()
}

/// Number of schedulable task-sets under one policy and preemption mode.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Tally {
    pub policy: Policy,
    pub preemption: Preemption,
    pub schedulable: usize,
    pub total: usize
}

impl Tally {
    #[allow(clippy::cast_precision_loss)]
    pub fn ratio(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.schedulable as f64 / self.total as f64
        }
    }
}

/// Simulates `sets` under every combination of policy and preemption mode, keeping
/// every other parameter of `base`.
pub fn sweep(sets: &[TaskSet], base: Config, threads: usize) -> Vec<Tally> {
    iproduct!(Policy::ALL, [Preemption::Preemptive, Preemption::NonPreemptive])
        .map(|(policy, preemption)| {
            let config = Config { policy, preemption, ..base };
            let schedulable = simulate_all(sets, config, threads)
                .iter()
                .filter(|res| res.schedulable())
                .count();

            info!(%policy, %preemption, schedulable, total = sets.len(), "sweep step done");

            Tally { policy, preemption, schedulable, total: sets.len() }
        })
        .collect()
}

/// Tab-separated table of a sweep.
pub struct SweepTable<'a>(pub &'a [Tally]);

impl fmt::Display for SweepTable<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "policy\tmode\tschedulable\tratio")?;

        for tally in self.0 {
            writeln!(f)?;
            write!(f, "{}\t{}\t{}/{}\t{}", tally.policy, tally.preemption,
                   tally.schedulable, tally.total, tally.ratio())?;
        }

        Ok(())
    }
}
