//! The ready queue.

use crate::{
    job::{Job, JobId},
    policy::{Policy, Priority},
    task::{Task, Time}
};

use std::collections::{BTreeMap, BTreeSet, HashMap};

/// A released job that has not yet finished.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Pending {
    pub job: Job,
    /// Execution time still required.
    pub remaining: Time
}

/// Set of released, unfinished jobs, ordered by priority under a fixed [`Policy`].
///
/// The running job stays in the queue until it completes or misses its
/// deadline; selecting a job does not remove it.
#[derive(Debug)]
pub struct ReadyQueue {
    policy: Policy,
    jobs: BTreeMap<Priority, Pending>,
    keys: HashMap<JobId, Priority>,
    deadlines: BTreeSet<(Time, JobId)>
}

impl ReadyQueue {
    pub fn new(policy: Policy) -> Self {
        Self {
            policy,
            jobs: BTreeMap::new(),
            keys: HashMap::new(),
            deadlines: BTreeSet::new()
        }
    }

    /// Adds the newly released `job` of `task`.
    pub fn admit(&mut self, job: Job, task: &Task) {
        let key = self.policy.key(&job, task);
        let prev = self.keys.insert(job.id, key);
        debug_assert!(prev.is_none(), "job {} admitted twice", job.id);

        self.deadlines.insert((job.deadline, job.id));
        self.jobs.insert(key, Pending { job, remaining: job.cost });
    }

    /// Returns the highest-priority job, or `None` if the processor should idle.
    pub fn select(&self) -> Option<JobId> {
        self.jobs.first_key_value().map(|(key, _)| key.job)
    }

    /// Returns the queued job with identifier `id`.
    pub fn get(&self, id: JobId) -> Option<&Pending> {
        self.keys.get(&id).and_then(|key| self.jobs.get(key))
    }

    /// Accounts `delta` units of execution to job `id` and returns the execution time
    /// it still requires.
    pub fn charge(&mut self, id: JobId, delta: Time) -> Time {
        let Some(pending) = self.keys.get(&id).and_then(|key| self.jobs.get_mut(key)) else {
            return 0;
        };

        debug_assert!(delta <= pending.remaining, "job {id} overran its cost");
        pending.remaining = pending.remaining.saturating_sub(delta);
        pending.remaining
    }

    /// Removes job `id` from the queue, returning it if it was present.
    pub fn remove(&mut self, id: JobId) -> Option<Pending> {
        let key = self.keys.remove(&id)?;
        let pending = self.jobs.remove(&key)?;

        self.deadlines.remove(&(pending.job.deadline, id));
        Some(pending)
    }

    /// Removes every unfinished job whose absolute deadline is no later than `now`,
    /// and returns them in priority order.
    ///
    /// Jobs with no remaining execution time are left for the caller to complete.
    pub fn expire(&mut self, now: Time) -> Vec<Pending> {
        let expired = self.deadlines
                          .iter()
                          .take_while(|(deadline, _)| *deadline <= now)
                          .map(|&(_, id)| id)
                          .filter(|id| self.get(*id).is_some_and(|p| p.remaining > 0))
                          .collect::<Vec<_>>();

        let mut out = expired.into_iter()
                             .filter_map(|id| self.keys.get(&id).copied().zip(self.remove(id)))
                             .collect::<Vec<_>>();

        out.sort_unstable_by_key(|(key, _)| *key);
        out.into_iter().map(|(_, pending)| pending).collect()
    }

    /// Returns the earliest absolute deadline among queued jobs.
    pub fn next_deadline(&self) -> Option<Time> {
        self.deadlines.first().map(|(deadline, _)| *deadline)
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    /// Iterates over queued jobs in priority order.
    pub fn iter(&self) -> impl Iterator<Item = &Pending> {
        self.jobs.values()
    }
}
