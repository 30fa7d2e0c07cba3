//! Jobs and their periodic release.

use crate::task::{Task, TaskId, TaskSet, Time};

use itertools::Itertools;

use std::fmt;

/// Identifier of a job: the `index`-th release of task `task`.
///
/// Identifiers order by task first and release index second, which is the
/// tie-break used by every scheduling policy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct JobId {
    pub task: TaskId,
    pub index: u64
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "T{}#{}", self.task + 1, self.index)
    }
}

/// A single released instance of a periodic task.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Job {
    pub id: JobId,
    /// Release time, `index * period`.
    pub release: Time,
    /// Absolute deadline, `release + deadline`.
    pub deadline: Time,
    /// Execution time required to complete the job.
    pub cost: Time
}

impl Job {
    /// Constructs the `index`-th job of `task`.
    pub fn nth(task: &Task, index: u64) -> Self {
        let release = index * task.period;

        Self {
            id: JobId { task: task.id, index },
            release,
            deadline: release.saturating_add(task.deadline),
            cost: task.cost
        }
    }
}

/// Generator for the jobs of a single task released strictly before a horizon.
///
/// The number of jobs is computed upfront, so the generator never steps
/// through time and can be restarted by cloning it before use.
#[derive(Clone, Debug)]
pub struct Releases {
    task: Task,
    next: u64,
    count: u64
}

impl Releases {
    /// Constructs a generator for all jobs of `task` with release time below `horizon`.
    pub fn new(task: &Task, horizon: Time) -> Self {
        Self {
            task: *task,
            next: 0,
            count: horizon.div_ceil(task.period)
        }
    }
}

impl Iterator for Releases {
    type Item = Job;

    fn next(&mut self) -> Option<Job> {
        (self.next < self.count).then(|| {
            self.next += 1;
            Job::nth(&self.task, self.next - 1)
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let len = usize::try_from(self.count - self.next).unwrap_or(usize::MAX);
        (len, Some(len))
    }
}

impl ExactSizeIterator for Releases {}

/// Returns all jobs of task-set `ts` released strictly before `horizon`,
/// ordered by release time and then by identifier.
pub fn releases(ts: &TaskSet, horizon: Time) -> impl Iterator<Item = Job> + '_ {
    ts.iter()
      .map(|task| Releases::new(task, horizon))
      .kmerge_by(|a, b| (a.release, a.id) < (b.release, b.id))
}
