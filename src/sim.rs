//! The event-driven simulation loop.
//!
//! Simulated time jumps from one event to the next; events are job releases,
//! the completion of the running job, absolute deadlines of queued jobs and the
//! horizon. All events falling at the same instant `t` are handled in a fixed
//! order: the running job is charged for the time since the previous event,
//! unfinished jobs whose deadline is `t` or earlier are recorded as misses and
//! dropped, jobs released at `t` are admitted, the running job is completed if
//! it has no remaining cost, and finally the dispatcher picks the next job.
//! A run halting on a miss still completes the running job before it stops.

use crate::{
    job::{self, Job, JobId},
    policy::{Policy, Preemption},
    queue::ReadyQueue,
    report::{JobRecord, Miss, RunResult, Slice},
    task::{TaskSet, Time}
};

use tracing::{debug, trace};

use std::{collections::HashMap, iter::Peekable};

/// Default bound on simulated time.
pub const HORIZON: Time = 100_000;

/// What to do when a deadline is missed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum MissPolicy {
    /// Keep simulating and record every miss.
    #[default]
    Continue,
    /// Stop at the first instant at which some job misses its deadline.
    Halt
}

/// Parameters of a simulation run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Config {
    pub policy: Policy,
    pub preemption: Preemption,
    /// Releases happen strictly before the horizon, and the run stops when it is reached.
    pub horizon: Time,
    pub on_miss: MissPolicy,
    /// Additionally bound the run by the hyperperiod of the task-set.
    pub bound_by_hyperperiod: bool,
    /// Record the execution trace.
    pub trace: bool
}

impl Default for Config {
    fn default() -> Self {
        Self {
            policy: Policy::default(),
            preemption: Preemption::default(),
            horizon: HORIZON,
            on_miss: MissPolicy::default(),
            bound_by_hyperperiod: false,
            trace: false
        }
    }
}

impl Config {
    pub fn new(policy: Policy, preemption: Preemption) -> Self {
        Self { policy, preemption, ..Self::default() }
    }

    pub fn with_horizon(self, horizon: Time) -> Self {
        Self { horizon, ..self }
    }

    pub fn halting(self) -> Self {
        Self { on_miss: MissPolicy::Halt, ..self }
    }

    pub fn traced(self) -> Self {
        Self { trace: true, ..self }
    }

    /// Returns the horizon actually used for task-set `ts`.
    pub fn horizon_for(&self, ts: &TaskSet) -> Time {
        if self.bound_by_hyperperiod {
            self.horizon.min(ts.hyperperiod())
        } else {
            self.horizon
        }
    }
}

/// State of the single processor.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Cpu {
    Idle,
    /// Running `job` uninterruptedly since `since`.
    Running { job: JobId, since: Time }
}

/// A single simulation run in progress.
///
/// The simulation owns all of its state, so independent runs never interfere.
pub struct Simulation<'a> {
    ts: &'a TaskSet,
    config: Config,
    horizon: Time,
    now: Time,
    cpu: Cpu,
    queue: ReadyQueue,
    releases: Peekable<Box<dyn Iterator<Item = Job> + 'a>>,
    jobs: Vec<JobRecord>,
    index: HashMap<JobId, usize>,
    trace: Vec<Slice>,
    misses: Vec<Miss>,
    terminated: bool
}

impl<'a> Simulation<'a> {
    /// Prepares a run of task-set `ts` under `config`, with the clock at `0`.
    pub fn new(ts: &'a TaskSet, config: Config) -> Self {
        let horizon = config.horizon_for(ts);
        let releases: Box<dyn Iterator<Item = Job> + 'a> = Box::new(job::releases(ts, horizon));

        Self {
            ts,
            config,
            horizon,
            now: 0,
            cpu: Cpu::Idle,
            queue: ReadyQueue::new(config.policy),
            releases: releases.peekable(),
            jobs: Vec::new(),
            index: HashMap::new(),
            trace: Vec::new(),
            misses: Vec::new(),
            terminated: false
        }
    }

    pub fn now(&self) -> Time {
        self.now
    }

    pub fn horizon(&self) -> Time {
        self.horizon
    }

    /// Returns the job currently holding the processor.
    pub fn running(&self) -> Option<JobId> {
        match self.cpu {
            Cpu::Idle => None,
            Cpu::Running { job, .. } => Some(job)
        }
    }

    /// Returns the execution time still required by released, unfinished job `id`.
    pub fn remaining(&self, id: JobId) -> Option<Time> {
        self.queue.get(id).map(|pending| pending.remaining)
    }

    /// Iterates over released, unfinished jobs and their remaining execution time.
    pub fn pending(&self) -> impl Iterator<Item = (JobId, Time)> + '_ {
        self.queue.iter().map(|pending| (pending.job.id, pending.remaining))
    }

    pub fn terminated(&self) -> bool {
        self.terminated
    }

    /// Handles every event at the next event instant.
    ///
    /// Returns `false` once the run has terminated.
    pub fn step(&mut self) -> bool {
        if self.terminated {
            return false;
        }

        let t = self.next_event();
        self.advance(t);

        if self.expire() && self.config.on_miss == MissPolicy::Halt {
            self.complete();
            self.terminate();
            return false;
        }

        self.admit();
        self.complete();

        if self.now >= self.horizon {
            self.terminate();
            return false;
        }

        self.dispatch();
        true
    }

    /// Runs the simulation to termination.
    pub fn run(mut self) -> RunResult {
        while self.step() {}
        self.finish()
    }

    /// Stops the run where it is and returns what was observed so far.
    pub fn finish(mut self) -> RunResult {
        self.terminate();

        RunResult {
            policy: self.config.policy,
            preemption: self.config.preemption,
            horizon: self.horizon,
            end: self.now,
            jobs: self.jobs,
            trace: self.trace,
            misses: self.misses
        }
    }

    fn next_event(&mut self) -> Time {
        let release = self.releases.peek().map(|job| job.release);
        let completion = self.running()
                             .and_then(|job| self.remaining(job))
                             .map(|remaining| self.now + remaining);

        [release, completion, self.queue.next_deadline()]
            .into_iter()
            .flatten()
            .fold(self.horizon, Time::min)
    }

    fn advance(&mut self, t: Time) {
        debug_assert!(t >= self.now, "time went backwards from {} to {t}", self.now);

        if let Cpu::Running { job, .. } = self.cpu {
            self.queue.charge(job, t - self.now);
        }

        self.now = t;
    }

    fn record(&mut self, id: JobId) -> Option<&mut JobRecord> {
        self.index.get(&id).map(|&i| &mut self.jobs[i])
    }

    // Returns whether any job missed its deadline.
    fn expire(&mut self) -> bool {
        let expired = self.queue.expire(self.now);

        for pending in &expired {
            let id = pending.job.id;

            if self.running() == Some(id) {
                self.stop();
            }

            if let Some(record) = self.record(id) {
                record.missed = true;
            }

            debug!(job = %id, deadline = pending.job.deadline, remaining = pending.remaining,
                   "deadline miss");

            self.misses.push(Miss {
                job: id,
                deadline: pending.job.deadline,
                remaining: pending.remaining
            });
        }

        !expired.is_empty()
    }

    fn admit(&mut self) {
        while let Some(job) = self.releases.next_if(|job| job.release <= self.now) {
            debug_assert_eq!(job.release, self.now, "release of {} skipped", job.id);

            self.queue.admit(job, self.ts.task(job.id.task));
            self.index.insert(job.id, self.jobs.len());
            self.jobs.push(JobRecord::released(&job));
        }
    }

    fn complete(&mut self) {
        let Cpu::Running { job, .. } = self.cpu else {
            return;
        };

        if self.remaining(job) != Some(0) {
            return;
        }

        self.stop();
        self.queue.remove(job);

        let now = self.now;
        if let Some(record) = self.record(job) {
            record.finish = Some(now);
        }
    }

    fn dispatch(&mut self) {
        let Some(best) = self.queue.select() else {
            return;
        };

        match self.cpu {
            Cpu::Idle => self.start(best),
            Cpu::Running { job, .. } if job != best && self.config.preemption == Preemption::Preemptive => {
                trace!(preempted = %job, by = %best, now = self.now, "preemption");
                self.stop();
                self.start(best);
            }
            Cpu::Running { .. } => {}
        }
    }

    fn start(&mut self, job: JobId) {
        let now = self.now;
        self.cpu = Cpu::Running { job, since: now };

        if let Some(record) = self.record(job) {
            record.start.get_or_insert(now);
        }
    }

    // Releases the processor, closing the current trace slice.
    fn stop(&mut self) {
        if let Cpu::Running { job, since } = self.cpu {
            if self.config.trace && since < self.now {
                self.trace.push(Slice { job, start: since, end: self.now });
            }
        }

        self.cpu = Cpu::Idle;
    }

    fn terminate(&mut self) {
        self.stop();
        self.terminated = true;
    }
}

/// Simulates task-set `ts` under `config` until the horizon, or until the first miss
/// if so configured.
///
/// The result depends only on the arguments.
pub fn simulate(ts: &TaskSet, config: Config) -> RunResult {
    let result = Simulation::new(ts, config).run();

    debug!(policy = %result.policy, preemption = %result.preemption, end = result.end,
           misses = result.misses.len(), "simulation finished");

    result
}
