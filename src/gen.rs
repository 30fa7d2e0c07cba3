//! Generators for task-sets.

use crate::task::{DeadlineKind, Task, TaskSet, Time, ValidationError};

use rand::{
    distributions::uniform::SampleRange,
    Rng
};

use thiserror::Error;

/// Default range of generated periods.
pub const PERIODS: std::ops::RangeInclusive<Time> = 100 ..= 1000;

/// Rejected generator parameters.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum GenError {
    #[error("number of tasks must be positive")]
    NoTasks,
    #[error("total utilization {0} must lie strictly between 0 and 1")]
    Utilization(f64),
    #[error(transparent)]
    Invalid(#[from] ValidationError)
}

/// Splits utilization `total` among `num` tasks, uniformly at random over the
/// space of such splits.
///
/// The algorithm used is Bini and Buttazzo's UUniFast, from _Measuring the
/// performance of schedulability tests_ ([10.1007/s11241-005-0507-9](https://doi.org/10.1007/s11241-005-0507-9)).
#[allow(clippy::cast_precision_loss)]
pub fn uunifast<G: Rng + ?Sized>(num: usize, total: f64, rng: &mut G) -> Box<[f64]> {
    let mut out = Vec::with_capacity(num);
    let mut sum = total;

    for i in 1 .. num {
        let next = sum * rng.gen::<f64>().powf(((num - i) as f64).recip());
        out.push(sum - next);
        sum = next;
    }

    if num > 0 {
        out.push(sum);
    }

    out.into_boxed_slice()
}

/// Generator for task-sets.
pub struct Tasks<R> {
    util: f64,
    num: usize,
    period: R,
    kind: DeadlineKind
}

impl Tasks<std::ops::RangeInclusive<Time>> {
    /// Constructs a new `Tasks` with periods drawn from [`PERIODS`].
    pub fn new(num_tasks: usize, util: f64, kind: DeadlineKind) -> Result<Self, GenError> {
        Self::with_periods(num_tasks, util, PERIODS, kind)
    }
}

impl<R> Tasks<R> {
    /// Constructs a new `Tasks` with the given parameters.
    ///
    /// The task-set to be generated will have `num_tasks` tasks with total utilization
    /// close to `util`, each with its period picked uniformly at random from `period`.
    /// Costs are rounded to the closest positive integer, so the actual utilization
    /// is only approximately `util`.
    ///
    /// Under [`DeadlineKind::Constrained`] each deadline is uniform between the
    /// task's cost and its period.
    pub fn with_periods(num_tasks: usize, util: f64, period: R, kind: DeadlineKind) -> Result<Self, GenError> {
        if num_tasks == 0 {
            return Err(GenError::NoTasks);
        }

        if !(util > 0.0 && util < 1.0) {
            return Err(GenError::Utilization(util));
        }

        Ok(Self { util, num: num_tasks, period, kind })
    }

    pub fn util(&self) -> f64 {
        self.util
    }

    pub fn kind(&self) -> DeadlineKind {
        self.kind
    }
}

impl<R> Tasks<R> where R: SampleRange<Time> + Clone {
    /// Runs the generator.
    ///
    /// Returns a task-set as described in [`Tasks::with_periods`].
    #[allow(clippy::cast_precision_loss, clippy::cast_sign_loss,
            clippy::cast_possible_truncation)]
    pub fn gen<G: Rng + ?Sized>(&self, rng: &mut G) -> Result<TaskSet, GenError> {
        let utils = uunifast(self.num, self.util, rng);

        let tasks = utils.iter().enumerate().map(|(id, &u)| {
            let period = rng.gen_range(self.period.clone());
            let cost = ((period as f64 * u).round_ties_even() as Time).clamp(1, period);

            let task = Task::new(id, cost, period);

            match self.kind {
                DeadlineKind::Implicit    => task,
                DeadlineKind::Constrained => task.with_deadline(rng.gen_range(cost ..= period))
            }
        }).collect::<Vec<_>>();

        Ok(TaskSet::new(tasks, self.kind)?)
    }
}
