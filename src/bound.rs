//! Utilization-based schedulability tests.
//!
//! These are used to cross-check simulation results; they never replace a run.

use crate::task::Set;

use dashu::{
    rational::Relaxed,
    integer::Sign
};
use num_order::NumOrd;

/// Tests whether task-set `ts` does not overload the processor, i.e. whether its
/// total utilization is no greater than `1`.
///
/// This is necessary for every policy, and sufficient for preemptive EDF with
/// implicit deadlines.
pub fn feasible(ts: impl Set) -> bool {
    ts.utilization().num_le(&1usize)
}

/// Returns Liu and Layland's utilization bound for `n` tasks under rate-monotonic
/// scheduling, `n(2^(1/n) - 1)`.
#[allow(clippy::cast_precision_loss)]
pub fn liu_layland_bound(n: usize) -> f64 {
    let n = n as f64;
    n * (2f64.powf(n.recip()) - 1.0)
}

/// Tests whether task-set `ts` is guaranteed to be schedulable by preemptive
/// rate-monotonic scheduling according to Liu and Layland's utilization bound.
///
/// Returns the result of the test if `ts` is implicit, otherwise `None`.
pub fn liu_layland(ts: impl Set + Clone + IntoIterator) -> Option<bool> {
    ts.clone().implicit().then(|| {
        let bound = liu_layland_bound(ts.clone().into_iter().count());

        ts.utilization() <= rational_floor(bound)
    })
}

// Largest multiple of 2^-32 no greater than `x`.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn rational_floor(x: f64) -> Relaxed {
    const SCALE: u128 = 1 << 32;

    Relaxed::from_parts_const(
        Sign::Positive,
        (x * SCALE as f64).floor() as u128,
        SCALE
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::{DeadlineKind, TaskSet};

    use assert_approx_eq::assert_approx_eq;

    #[test]
    fn bound_values() {
        assert_approx_eq!(liu_layland_bound(1), 1.0);
        assert_approx_eq!(liu_layland_bound(2), 0.828_427, 1e-6);
        assert_approx_eq!(liu_layland_bound(3), 0.779_763, 1e-6);
        assert!(liu_layland_bound(1000) > std::f64::consts::LN_2);
    }

    #[test]
    fn utilization_tests() {
        let light = TaskSet::from_triples([(4, 1, 4), (6, 2, 6)], DeadlineKind::Implicit).unwrap();
        let full  = TaskSet::from_triples([(2, 1, 2), (4, 2, 4)], DeadlineKind::Implicit).unwrap();
        let over  = TaskSet::from_triples([(4, 3, 4), (5, 3, 5)], DeadlineKind::Implicit).unwrap();
        let cons  = TaskSet::from_triples([(4, 1, 3)], DeadlineKind::Constrained).unwrap();

        assert!(feasible(&light));
        assert!(feasible(&full));
        assert!(!feasible(&over));

        assert_eq!(liu_layland(&light), Some(true));
        assert_eq!(liu_layland(&full), Some(false));
        assert_eq!(liu_layland(&cons), None);
    }
}
