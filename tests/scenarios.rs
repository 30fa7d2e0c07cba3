use rtsim::{
    task::{DeadlineKind, TaskSet, Time},
    job::JobId,
    policy::{Policy, Preemption},
    sim::{simulate, Config},
    report::{RunResult, Verdict}
};

fn set(triples: &[(Time, Time, Time)]) -> TaskSet {
    TaskSet::from_triples(triples.iter().copied(), DeadlineKind::Implicit).unwrap()
}

fn slices(result: &RunResult) -> Vec<(usize, u64, Time, Time)> {
    result.trace.iter().map(|s| (s.job.task + 1, s.job.index, s.start, s.end)).collect()
}

#[test]
fn rate_monotonic_two_tasks() {
    let ts = set(&[(4, 1, 4), (6, 2, 6)]);
    let result = simulate(&ts, Config::new(Policy::Rm, Preemption::Preemptive).with_horizon(24).traced());

    assert_eq!(result.verdict(), Verdict::Schedulable);
    assert_eq!(result.jobs.len(), 6 + 4);

    // the shorter period always runs as soon as it is released
    for record in result.jobs.iter().filter(|r| r.id.task == 0) {
        assert_eq!(record.start, Some(record.release));
        assert_eq!(record.finish, Some(record.release + 1));
    }

    let first = result.job(JobId { task: 1, index: 0 }).unwrap();
    assert_eq!((first.start, first.finish), (Some(1), Some(3)));
}

#[test]
fn overload_misses_under_every_policy() {
    let ts = set(&[(4, 3, 4), (5, 3, 5)]);

    for policy in Policy::ALL {
        let result = simulate(&ts, Config::new(policy, Preemption::Preemptive).with_horizon(20));

        assert_eq!(result.verdict(), Verdict::NotSchedulable, "{policy}");
        assert!(result.code() > 0);
    }
}

#[test]
fn fcfs_and_sjf_diverge_at_idle_point() {
    let ts = set(&[(9, 1, 9), (8, 2, 8), (6, 3, 6)]);
    let run = |policy| simulate(&ts, Config::new(policy, Preemption::NonPreemptive).with_horizon(18).traced());

    let fcfs = run(Policy::Fcfs);
    let sjf  = run(Policy::Sjf);

    let common = [(1, 0, 0, 1), (2, 0, 1, 3), (3, 0, 3, 6), (3, 1, 6, 9)];

    // the job of task 2 released at 8 waits for the running job under both policies;
    // at 9 FCFS picks it while SJF prefers the shorter job of task 1 released at 9
    assert_eq!(slices(&fcfs)[.. 4], common);
    assert_eq!(slices(&sjf)[.. 4], common);

    assert_eq!(slices(&fcfs)[4 ..], [(2, 1, 9, 11), (1, 1, 11, 12), (3, 2, 12, 15), (2, 2, 16, 18)]);
    assert_eq!(slices(&sjf)[4 ..],  [(1, 1, 9, 10), (2, 1, 10, 12), (3, 2, 12, 15), (2, 2, 16, 18)]);

    assert!(fcfs.schedulable() && sjf.schedulable());
}

#[test]
fn preemptive_and_non_preemptive_differ() {
    let ts = set(&[(4, 1, 4), (6, 4, 6)]);

    let p  = simulate(&ts, Config::new(Policy::Rm, Preemption::Preemptive).with_horizon(12).traced());
    let np = simulate(&ts, Config::new(Policy::Rm, Preemption::NonPreemptive).with_horizon(12).traced());

    assert_eq!(slices(&p)[.. 4], [(1, 0, 0, 1), (2, 0, 1, 4), (1, 1, 4, 5), (2, 0, 5, 6)]);
    assert_eq!(slices(&np)[.. 3], [(1, 0, 0, 1), (2, 0, 1, 5), (1, 1, 5, 6)]);
}

#[test]
fn result_code_names_first_missing_task() {
    // at 5 the job of task 2 has missed while task 1 has not
    let ts = set(&[(4, 3, 4), (5, 3, 5)]);
    let result = simulate(&ts, Config::new(Policy::Rm, Preemption::Preemptive).with_horizon(20));
    assert_eq!(result.code(), 2);

    // equal deadlines: task 1 wins the tie and completes, task 2 misses at 10
    let ts = set(&[(10, 6, 10), (10, 6, 10)]);
    let result = simulate(&ts, Config::new(Policy::Edf, Preemption::Preemptive).with_horizon(20).halting());
    assert_eq!(result.misses.len(), 1);
    assert_eq!(result.code(), 2);
    assert_eq!(result.end, 10);
}
