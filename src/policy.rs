//! Scheduling policies and their priority keys.

use crate::{
    job::{Job, JobId},
    task::{Task, Time}
};

use thiserror::Error;

use std::{fmt, str::FromStr};

/// Priority of a job under some [`Policy`]; **lower is higher priority**.
///
/// Keys with equal policy value are ordered by task identifier and then by
/// release index, so that no two jobs ever have the same priority.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Priority {
    /// Policy-specific part of the key.
    pub value: Time,
    /// Identifier of the prioritized job, used as tie-break.
    pub job: JobId
}

/// A job-level fixed priority policy.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Policy {
    /// First come, first served: earlier release first.
    #[default]
    Fcfs,
    /// Shortest job first: smaller task cost first.
    Sjf,
    /// Rate monotonic: shorter task period first.
    Rm,
    /// Earliest deadline first: earlier absolute deadline first.
    Edf
}

impl Policy {
    pub const ALL: [Policy; 4] = [Self::Fcfs, Self::Sjf, Self::Rm, Self::Edf];

    /// Returns the priority of `job`, released by `task`, under this policy.
    pub fn key(self, job: &Job, task: &Task) -> Priority {
        debug_assert_eq!(job.id.task, task.id);

        let value = match self {
            Self::Fcfs => job.release,
            Self::Sjf  => task.cost,
            Self::Rm   => task.period,
            Self::Edf  => job.deadline
        };

        Priority { value, job: job.id }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Fcfs => "FCFS",
            Self::Sjf  => "SJF",
            Self::Rm   => "RM",
            Self::Edf  => "EDF"
        }
    }
}

impl fmt::Display for Policy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Whether a running job may be suspended in favor of a higher-priority one.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Preemption {
    /// Priorities are re-evaluated at every event.
    #[default]
    Preemptive,
    /// A job that has started runs until it completes or misses its deadline.
    NonPreemptive
}

impl fmt::Display for Preemption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Preemptive    => write!(f, "preemptive"),
            Self::NonPreemptive => write!(f, "non-preemptive")
        }
    }
}

/// Rejected configuration tokens.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("unknown scheduling policy `{0}` (expected one of FCFS, SJF, RM, EDF)")]
    Policy(String),
    #[error("unknown preemption mode `{0}` (expected p or np)")]
    Preemption(String)
}

impl FromStr for Policy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL.into_iter()
                 .find(|p| p.name().eq_ignore_ascii_case(s))
                 .ok_or_else(|| ConfigError::Policy(s.to_owned()))
    }
}

impl FromStr for Preemption {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "p"  | "preemptive"     => Ok(Self::Preemptive),
            "np" | "non-preemptive" => Ok(Self::NonPreemptive),
            _ => Err(ConfigError::Preemption(s.to_owned()))
        }
    }
}
