//! The task model.

use dashu::{
    rational::Relaxed,
    integer::Sign
};

use thiserror::Error;

use std::{fmt, slice};

/// Type of time instants and durations.
///
/// Simulated time is discrete; one unit is the smallest amount of work a job
/// can perform and no event ever happens between two consecutive units.
pub type Time = u64;

/// Index of a task within its [`TaskSet`].
///
/// Identifiers are 0-based internally and displayed 1-based.
pub type TaskId = usize;

/// Deadline model of a task-set.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DeadlineKind {
    /// Every task has its deadline equal to its period.
    #[default]
    Implicit,
    /// Every task has its deadline no greater than its period.
    Constrained
}

impl DeadlineKind {
    /// Returns the kind encoded by the deadline flag of a task-set file.
    pub fn from_flag(flag: u8) -> Option<Self> {
        match flag {
            0 => Some(Self::Implicit),
            1 => Some(Self::Constrained),
            _ => None
        }
    }

    /// Returns the deadline flag of a task-set file.
    pub fn flag(self) -> u8 {
        match self {
            Self::Implicit    => 0,
            Self::Constrained => 1
        }
    }
}

/// A single periodic task.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Task {
    /// The task's position in its task-set.
    pub id: TaskId,
    /// The task's period.
    pub period: Time,
    /// The task's cost, also known as WCET (worst-case execution time).
    pub cost: Time,
    /// The task's relative deadline.
    pub deadline: Time
}

impl Task {
    /// Constructs a new `Task` with the given `cost` and `period` and implicit deadline
    /// (equal to `period`).
    ///
    /// The task is not validated until it becomes part of a [`TaskSet`].
    pub fn new(id: TaskId, cost: Time, period: Time) -> Self {
        Self {
            id,
            period,
            cost,
            deadline: period
        }
    }

    /// Returns the task with new relative deadline `deadline`.
    pub fn with_deadline(self, deadline: Time) -> Self {
        Self { deadline, ..self }
    }

    fn validate(&self, kind: DeadlineKind) -> Result<(), ValidationError> {
        let task = self.id + 1;

        for (field, value) in [("period", self.period), ("cost", self.cost), ("deadline", self.deadline)] {
            if value == 0 {
                return Err(ValidationError::NonPositive { task, field });
            }
        }

        if self.cost > self.deadline {
            return Err(ValidationError::CostExceedsDeadline {
                task, cost: self.cost, deadline: self.deadline
            });
        }

        if self.deadline > self.period {
            return Err(ValidationError::DeadlineExceedsPeriod {
                task, deadline: self.deadline, period: self.period
            });
        }

        if kind == DeadlineKind::Implicit && self.deadline != self.period {
            return Err(ValidationError::NotImplicit {
                task, deadline: self.deadline, period: self.period
            });
        }

        Ok(())
    }
}

impl fmt::Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "T{}(T={}, C={}, D={})", self.id + 1, self.period, self.cost, self.deadline)
    }
}

/// Reasons for rejecting a task-set before simulation.
///
/// Task numbers are 1-based, as in task-set files.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("task-set is empty")]
    Empty,
    #[error("task {task}: {field} must be positive")]
    NonPositive { task: usize, field: &'static str },
    #[error("task {task}: cost {cost} exceeds deadline {deadline}")]
    CostExceedsDeadline { task: usize, cost: Time, deadline: Time },
    #[error("task {task}: deadline {deadline} exceeds period {period}")]
    DeadlineExceedsPeriod { task: usize, deadline: Time, period: Time },
    #[error("task {task}: deadline {deadline} differs from period {period} in an implicit-deadline set")]
    NotImplicit { task: usize, deadline: Time, period: Time }
}

/// A validated, immutable set of periodic tasks.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TaskSet {
    tasks: Box<[Task]>,
    kind: DeadlineKind
}

impl TaskSet {
    /// Validates `tasks` under deadline model `kind` and builds a task-set from them.
    ///
    /// Task identifiers are reassigned to match their position in `tasks`.
    pub fn new(tasks: impl IntoIterator<Item = Task>, kind: DeadlineKind) -> Result<Self, ValidationError> {
        let tasks = tasks.into_iter()
                         .enumerate()
                         .map(|(id, task)| Task { id, ..task })
                         .collect::<Box<[_]>>();

        if tasks.is_empty() {
            return Err(ValidationError::Empty);
        }

        for task in tasks.iter() {
            task.validate(kind)?;
        }

        Ok(Self { tasks, kind })
    }

    /// Builds a task-set from `(period, cost, deadline)` triples.
    pub fn from_triples(
        triples: impl IntoIterator<Item = (Time, Time, Time)>,
        kind: DeadlineKind
    ) -> Result<Self, ValidationError> {
        Self::new(
            triples.into_iter()
                   .enumerate()
                   .map(|(id, (period, cost, deadline))| Task::new(id, cost, period).with_deadline(deadline)),
            kind
        )
    }

    /// Returns the task with identifier `id`.
    ///
    /// # Panics
    ///
    /// Panics if `id` is not a task of this set.
    pub fn task(&self, id: TaskId) -> &Task {
        &self.tasks[id]
    }

    pub fn iter(&self) -> slice::Iter<'_, Task> {
        self.tasks.iter()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn kind(&self) -> DeadlineKind {
        self.kind
    }

    /// Returns the least common multiple of all periods, or [`Time::MAX`]
    /// if it does not fit.
    pub fn hyperperiod(&self) -> Time {
        self.tasks.iter().try_fold(1, |acc: Time, task| {
            (acc / gcd(acc, task.period)).checked_mul(task.period)
        }).unwrap_or(Time::MAX)
    }
}

impl<'a> IntoIterator for &'a TaskSet {
    type Item = &'a Task;
    type IntoIter = slice::Iter<'a, Task>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

fn gcd(mut a: Time, mut b: Time) -> Time {
    while b != 0 {
        (a, b) = (b, a % b);
    }

    a
}

/// Trait for tasks and collections of tasks (task-sets).
pub trait Set {
    /// Returns the exact value of the total utilization of the task-set.
    ///
    /// Since its main use is to be summed or compared, it is not immediately
    /// returned as a [`RBig`](`dashu::rational::RBig`); use
    /// [`Relaxed::canonicalize`] to convert to it if needed.
    fn utilization(self) -> Relaxed;

    /// Tests if the task-set has all implicit tasks, i.e. if all their deadlines
    /// are equal to their periods.
    fn implicit(self) -> bool;

    /// Tests if every task fits within its own period, i.e. if its cost is no greater
    /// than its period.
    fn feasible(self) -> bool;
}

/// A `Task` is in and of itself a `Set` of one element and is treated accordingly.
impl Set for &'_ Task {
    fn utilization(self) -> Relaxed {
        Relaxed::from_parts_const(
            Sign::Positive,
            self.cost.into(),
            self.period.into()
        )
    }

    fn implicit(self) -> bool {
        self.period == self.deadline
    }

    fn feasible(self) -> bool {
        self.cost <= self.period
    }
}

/// Any collection of `Set`s (including [`Task`]) is a `Set`, and is treated as if each
/// of its elements were a task.
impl<I, T: Set> Set for I where I: IntoIterator<Item = T> {
    fn utilization(self) -> Relaxed {
        let mut out = Relaxed::default();

        for x in self {
            out += x.utilization();
        }

        out
    }

    fn implicit(self) -> bool {
        self.into_iter()
            .all(T::implicit)
    }

    fn feasible(self) -> bool {
        self.into_iter()
            .all(T::feasible)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_malformed_tasks() {
        assert_eq!(
            TaskSet::from_triples([(4, 1, 4), (6, 0, 6)], DeadlineKind::Implicit),
            Err(ValidationError::NonPositive { task: 2, field: "cost" })
        );
        assert_eq!(
            TaskSet::from_triples([(0, 1, 1)], DeadlineKind::Constrained),
            Err(ValidationError::NonPositive { task: 1, field: "period" })
        );
        assert_eq!(
            TaskSet::from_triples([(10, 5, 4)], DeadlineKind::Constrained),
            Err(ValidationError::CostExceedsDeadline { task: 1, cost: 5, deadline: 4 })
        );
        assert_eq!(
            TaskSet::from_triples([(10, 5, 12)], DeadlineKind::Constrained),
            Err(ValidationError::DeadlineExceedsPeriod { task: 1, deadline: 12, period: 10 })
        );
        assert_eq!(
            TaskSet::from_triples([(10, 5, 8)], DeadlineKind::Implicit),
            Err(ValidationError::NotImplicit { task: 1, deadline: 8, period: 10 })
        );
        assert_eq!(
            TaskSet::from_triples(std::iter::empty(), DeadlineKind::Implicit),
            Err(ValidationError::Empty)
        );
    }

    #[test]
    fn assigns_ids_by_position() {
        let ts = TaskSet::new([Task::new(7, 1, 4), Task::new(3, 2, 6)], DeadlineKind::Implicit).unwrap();

        assert_eq!(ts.iter().map(|t| t.id).collect::<Vec<_>>(), [0, 1]);
        assert_eq!(ts.task(1).cost, 2);
    }

    #[test]
    fn hyperperiod() {
        let ts = TaskSet::from_triples([(4, 1, 4), (6, 2, 6), (10, 1, 10)], DeadlineKind::Implicit).unwrap();
        assert_eq!(ts.hyperperiod(), 60);

        let ts = TaskSet::from_triples([(u64::MAX, 1, u64::MAX), (u64::MAX - 1, 1, u64::MAX - 1)],
                                       DeadlineKind::Implicit).unwrap();
        assert_eq!(ts.hyperperiod(), u64::MAX);
    }

    #[test]
    fn utilization_is_exact() {
        let ts = TaskSet::from_triples([(3, 1, 3), (3, 1, 3), (3, 1, 3)], DeadlineKind::Implicit).unwrap();

        assert_eq!(ts.utilization().canonicalize(), dashu::rational::RBig::ONE);
        assert!(ts.implicit());
        assert!(ts.feasible());
    }
}
