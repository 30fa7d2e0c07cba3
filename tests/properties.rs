use rtsim::{
    task::{DeadlineKind, TaskSet, Time},
    gen::Tasks,
    policy::{Policy, Preemption},
    sim::{simulate, Config, Simulation},
    report::RunResult,
    bound
};

use itertools::iproduct;
use rand::{rngs::StdRng, SeedableRng};

use std::collections::HashMap;

const HORIZON: Time = 2_000;

fn random_sets(seed: u64, kind: DeadlineKind, util: f64, count: usize) -> Vec<TaskSet> {
    let mut rng = StdRng::seed_from_u64(seed);
    let gen = Tasks::with_periods(4, util, 5 ..= 60, kind).unwrap();

    (0 .. count).map(|_| gen.gen(&mut rng).unwrap()).collect()
}

fn configs() -> impl Iterator<Item = Config> + Clone {
    iproduct!(Policy::ALL, [Preemption::Preemptive, Preemption::NonPreemptive])
        .map(|(policy, preemption)| Config::new(policy, preemption).with_horizon(HORIZON).traced())
}

fn check(result: &RunResult) {
    for pair in result.trace.windows(2) {
        assert!(pair[0].end <= pair[1].start, "overlapping slices {pair:?}");
    }

    for record in &result.jobs {
        let slices = result.slices_of(record.id).collect::<Vec<_>>();
        let executed = slices.iter().map(|s| s.end - s.start).sum::<Time>();

        assert!(slices.iter().all(|s| s.start >= record.release && s.end <= record.deadline));

        match record.finish {
            Some(finish) => {
                assert!(finish >= record.release + record.cost);
                assert!(finish <= record.deadline);
                assert_eq!(executed, record.cost);
                assert!(!record.missed);

                if result.preemption == Preemption::NonPreemptive {
                    assert_eq!(slices.len(), 1);
                }
            }
            None => {
                assert!(executed < record.cost);
                assert_eq!(record.missed, record.deadline <= result.end, "{record:?}");
            }
        }
    }

    assert_eq!(result.misses.len(), result.jobs.iter().filter(|r| r.missed).count());
}

#[test]
fn schedules_are_consistent() {
    for kind in [DeadlineKind::Implicit, DeadlineKind::Constrained] {
        for (ts, config) in iproduct!(random_sets(1, kind, 0.9, 10), configs()) {
            check(&simulate(&ts, config));
        }
    }
}

#[test]
fn runs_are_reproducible() {
    for (ts, config) in iproduct!(random_sets(2, DeadlineKind::Constrained, 0.8, 5), configs()) {
        assert_eq!(simulate(&ts, config), simulate(&ts, config));
    }
}

#[test]
fn remaining_cost_only_decreases_while_running() {
    for ts in random_sets(3, DeadlineKind::Implicit, 0.95, 5) {
        let mut sim = Simulation::new(&ts, Config::new(Policy::Edf, Preemption::Preemptive).with_horizon(HORIZON));
        let mut last = HashMap::new();
        let mut running = None;

        while sim.step() {
            for (job, remaining) in sim.pending() {
                if let Some(&before) = last.get(&job) {
                    assert!(remaining <= before);

                    if running != Some(job) {
                        assert_eq!(remaining, before);
                    }
                }

                last.insert(job, remaining);
            }

            running = sim.running();
        }
    }
}

#[test]
fn liu_layland_sets_meet_deadlines_under_rm() {
    let mut checked = 0;

    for ts in random_sets(4, DeadlineKind::Implicit, 0.69, 40) {
        if bound::liu_layland(&ts) != Some(true) {
            continue;
        }

        checked += 1;
        assert!(simulate(&ts, Config::new(Policy::Rm, Preemption::Preemptive).with_horizon(HORIZON)).schedulable());
    }

    assert!(checked > 0);
}

#[test]
fn feasible_implicit_sets_meet_deadlines_under_edf() {
    let mut checked = 0;

    for ts in random_sets(5, DeadlineKind::Implicit, 0.85, 20) {
        if !bound::feasible(&ts) {
            continue;
        }

        checked += 1;
        assert!(simulate(&ts, Config::new(Policy::Edf, Preemption::Preemptive).with_horizon(HORIZON)).schedulable());
    }

    assert!(checked > 0);
}
