//! Results of a simulation run.

use crate::{
    job::{Job, JobId},
    policy::{Policy, Preemption},
    task::{TaskId, Time}
};

use std::fmt;

/// Outcome of a single job.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct JobRecord {
    pub id: JobId,
    pub release: Time,
    pub deadline: Time,
    pub cost: Time,
    /// First time the job was dispatched, if ever.
    pub start: Option<Time>,
    /// Completion time, if the job completed.
    pub finish: Option<Time>,
    /// Whether the job was still unfinished at its absolute deadline.
    pub missed: bool
}

impl JobRecord {
    pub(crate) fn released(job: &Job) -> Self {
        Self {
            id: job.id,
            release: job.release,
            deadline: job.deadline,
            cost: job.cost,
            start: None,
            finish: None,
            missed: false
        }
    }

    /// Returns the response time of the job, if it completed.
    pub fn response_time(&self) -> Option<Time> {
        self.finish.map(|finish| finish - self.release)
    }
}

/// A maximal interval `[start, end)` during which `job` ran without interruption.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Slice {
    pub job: JobId,
    pub start: Time,
    pub end: Time
}

/// A deadline miss.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Miss {
    pub job: JobId,
    /// Absolute deadline, which is also the time the miss was detected.
    pub deadline: Time,
    /// Execution time the job still required at its deadline.
    pub remaining: Time
}

/// Overall result of a run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Verdict {
    /// No deadline was missed within the horizon.
    Schedulable,
    /// At least one deadline was missed within the horizon.
    NotSchedulable
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Schedulable    => write!(f, "schedulable"),
            Self::NotSchedulable => write!(f, "not schedulable")
        }
    }
}

/// Everything observed during a simulation run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RunResult {
    pub policy: Policy,
    pub preemption: Preemption,
    /// Horizon the run was bounded by.
    pub horizon: Time,
    /// Time at which the run stopped; earlier than `horizon` only if it halted on a miss.
    pub end: Time,
    /// Every released job, in release order.
    pub jobs: Vec<JobRecord>,
    /// Execution trace, in time order; empty unless tracing was enabled.
    pub trace: Vec<Slice>,
    /// Deadline misses in detection order; misses detected together are in
    /// priority order.
    pub misses: Vec<Miss>
}

impl RunResult {
    pub fn verdict(&self) -> Verdict {
        if self.misses.is_empty() {
            Verdict::Schedulable
        } else {
            Verdict::NotSchedulable
        }
    }

    pub fn schedulable(&self) -> bool {
        self.verdict() == Verdict::Schedulable
    }

    /// Returns the task of the highest-priority job among those that missed their
    /// deadline at the earliest miss instant.
    pub fn first_miss_task(&self) -> Option<TaskId> {
        self.misses.first().map(|miss| miss.job.task)
    }

    /// Returns the per-set result code of batch runs: `0` if schedulable, otherwise
    /// the 1-based identifier of [`first_miss_task`](`Self::first_miss_task`).
    pub fn code(&self) -> usize {
        self.first_miss_task().map_or(0, |task| task + 1)
    }

    /// Returns the record of job `id`.
    pub fn job(&self, id: JobId) -> Option<&JobRecord> {
        self.jobs.iter().find(|record| record.id == id)
    }

    /// Iterates over jobs that neither completed nor missed their deadline before the
    /// run stopped.
    pub fn unfinished(&self) -> impl Iterator<Item = &JobRecord> {
        self.jobs.iter().filter(|record| record.finish.is_none() && !record.missed)
    }

    /// Iterates over the execution trace of job `id`.
    pub fn slices_of(&self, id: JobId) -> impl Iterator<Item = &Slice> {
        self.trace.iter().filter(move |slice| slice.job == id)
    }
}

fn opt(f: &mut fmt::Formatter<'_>, value: Option<Time>) -> fmt::Result {
    match value {
        Some(value) => write!(f, "\t{value}"),
        None        => write!(f, "\t-")
    }
}

impl fmt::Display for RunResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} {} until {}: {}", self.policy, self.preemption, self.end, self.verdict())?;
        write!(f, "job\trelease\tdeadline\tstart\tfinish\tresponse\tmissed")?;

        for record in &self.jobs {
            writeln!(f)?;
            write!(f, "{}\t{}\t{}", record.id, record.release, record.deadline)?;
            opt(f, record.start)?;
            opt(f, record.finish)?;
            opt(f, record.response_time())?;
            write!(f, "\t{}", if record.missed { "yes" } else { "no" })?;
        }

        for slice in &self.trace {
            writeln!(f)?;
            write!(f, "run {} [{}, {})", slice.job, slice.start, slice.end)?;
        }

        for miss in &self.misses {
            writeln!(f)?;
            write!(f, "miss {} at {} ({} remaining)", miss.job, miss.deadline, miss.remaining)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        policy::{Policy, Preemption},
        sim::{simulate, Config},
        task::{DeadlineKind, TaskSet}
    };

    #[test]
    fn response_times() {
        let ts = TaskSet::from_triples([(4, 1, 4), (6, 2, 6)], DeadlineKind::Implicit).unwrap();
        let result = simulate(&ts, Config::new(Policy::Rm, Preemption::Preemptive).with_horizon(12));

        let response = result.jobs.iter()
                                  .map(|record| (record.id.to_string(), record.response_time()))
                                  .collect::<Vec<_>>();

        assert_eq!(response, [
            ("T1#0".to_owned(), Some(1)),
            ("T2#0".to_owned(), Some(3)),
            ("T1#1".to_owned(), Some(1)),
            ("T2#1".to_owned(), Some(2)),
            ("T1#2".to_owned(), Some(1))
        ]);
    }

    #[test]
    fn report_lists_jobs_trace_and_misses() {
        let ts = TaskSet::from_triples([(10, 3, 3), (10, 2, 3)], DeadlineKind::Constrained).unwrap();
        let config = Config::new(Policy::Fcfs, Preemption::NonPreemptive).with_horizon(10).halting().traced();

        assert_eq!(simulate(&ts, config).to_string(), "\
FCFS non-preemptive until 3: not schedulable
job\trelease\tdeadline\tstart\tfinish\tresponse\tmissed
T1#0\t0\t3\t0\t3\t3\tno
T2#0\t0\t3\t-\t-\t-\tyes
run T1#0 [0, 3)
miss T2#0 at 3 (2 remaining)");
    }
}
