//! Equal-error (water-filling) allocation.
//!
//! Among underweight investments, find allotments that leave every funded
//! investment with the same post-allocation weight error `e`:
//!
//! ```text
//! (cv_i + a_i) / T - t_i = e        for every i in the active set S
//! Σ a_i = cash
//! ```
//!
//! Solving gives `e*T = ((cv_S + cash) - t_S*T) / |S|` and
//! `a_i = e*T + t_i*T - cv_i`. If any `a_i` is negative the active set is
//! re-derived as `{i : a_i > 0}` and the system is solved again. Each failed
//! round strictly shrinks the set, so at most `n + 1` rounds are needed.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::metrics::{PortfolioMetrics, MONEY_SCALE};
use crate::error::AllocationError;
use crate::types::{Money, Rate};
use crate::AllocationResult;

/// Decimal places kept on the common monetary error term `e*T`.
pub const EQUAL_ERROR_SCALE: u32 = MONEY_SCALE;

/// Output of the equal-error allocation, in input order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EqualErrorAllocation {
    pub allocations: Vec<Money>,
    pub errors: Vec<Rate>,
    /// Final active set as input indices, in rank order.
    pub active_set: Vec<usize>,
    pub iterations: u32,
    /// Shared post-allocation error of the active set.
    pub common_error: Option<Rate>,
}

impl EqualErrorAllocation {
    pub fn total(&self) -> Money {
        self.allocations.iter().sum()
    }
}

/// Run the equal-error iteration to convergence.
pub fn allocate_equal_error(metrics: &PortfolioMetrics) -> AllocationResult<EqualErrorAllocation> {
    let mut active: Vec<usize> = metrics
        .in_rank_order()
        .filter(|inv| inv.deficit > Decimal::ZERO)
        .map(|inv| inv.index)
        .collect();

    // Nothing to distribute and nobody to receive it: the zero allocation is exact.
    if active.is_empty() && metrics.cash.is_zero() {
        return Ok(finish(metrics, vec![Decimal::ZERO; metrics.len()], active, 0, None));
    }

    let max_iterations = metrics.len() + 1;
    let mut history = Vec::with_capacity(max_iterations);

    for iteration in 1..=max_iterations {
        history.push(active.len());
        if active.is_empty() {
            return Err(AllocationError::InfeasibleAllocation {
                active_set_history: history,
            });
        }

        let (common, allotments) = solve_active_set(metrics, &active);
        let converged = active.iter().all(|&i| allotments[i] >= Decimal::ZERO);

        debug!(
            iteration,
            active = active.len(),
            common_error_value = %common,
            converged,
            "equal-error iteration"
        );

        if converged {
            let common_error = common / metrics.total_value;
            return Ok(finish(
                metrics,
                allotments,
                active,
                iteration as u32,
                Some(common_error),
            ));
        }

        active.retain(|&i| allotments[i] > Decimal::ZERO);
    }

    Err(AllocationError::ConvergenceFailure {
        function: "equal-error allocation".into(),
        iterations: max_iterations as u32,
    })
}

/// Solve the equal-error system for one active set.
///
/// Returns the common monetary error term `e*T` and the allotments for every
/// investment (zero outside the set). `t_i*T` is taken from the rounded
/// target values and the rounding residual of `e*T` is absorbed by the
/// largest allotment, so the allotments sum exactly to cash.
pub fn solve_active_set(metrics: &PortfolioMetrics, active: &[usize]) -> (Money, Vec<Money>) {
    let cash = metrics.cash;

    let (cv_active, target_active) = active.iter().fold(
        (Decimal::ZERO, Decimal::ZERO),
        |(cv, tv), &i| {
            let inv = &metrics.investments[i];
            (cv + inv.current_value, tv + inv.target_value)
        },
    );

    let count = Decimal::from(active.len() as u64);
    let common = (((cv_active + cash) - target_active) / count).round_dp(EQUAL_ERROR_SCALE);

    let mut allotments = vec![Decimal::ZERO; metrics.len()];
    for &i in active {
        let inv = &metrics.investments[i];
        allotments[i] = common + inv.target_value - inv.current_value;
    }

    let residual = cash - allotments.iter().sum::<Money>();
    if !residual.is_zero() {
        let absorber = active
            .iter()
            .copied()
            .reduce(|best, i| if allotments[i] > allotments[best] { i } else { best });
        if let Some(k) = absorber {
            allotments[k] += residual;
        }
    }

    (common, allotments)
}

fn finish(
    metrics: &PortfolioMetrics,
    allocations: Vec<Money>,
    active_set: Vec<usize>,
    iterations: u32,
    common_error: Option<Rate>,
) -> EqualErrorAllocation {
    let errors = allocations
        .iter()
        .enumerate()
        .map(|(i, a)| metrics.error_after(i, *a))
        .collect();

    EqualErrorAllocation {
        allocations,
        errors,
        active_set,
        iterations,
        common_error,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::allocation::metrics::compute_metrics;
    use rust_decimal_macros::dec;

    fn run(cash: Decimal, cv: &[Decimal], tp: &[Decimal]) -> EqualErrorAllocation {
        let m = compute_metrics(cash, cv, tp).unwrap();
        allocate_equal_error(&m).unwrap()
    }

    #[test]
    fn test_excludes_overweight_holding() {
        let r = run(
            dec!(200),
            &[dec!(500), dec!(300), dec!(200)],
            &[dec!(0.4), dec!(0.4), dec!(0.2)],
        );
        assert_eq!(r.allocations, vec![dec!(0), dec!(170), dec!(30)]);
        assert_eq!(r.active_set, vec![1, 2]);
        assert_eq!(r.iterations, 1);
        assert!((r.errors[1] - r.errors[2]).abs() < dec!(0.000000000000000001));
        assert!((r.errors[1] - dec!(-0.008333333)).abs() < dec!(0.000000001));
        assert!((r.errors[0] - dec!(0.016666667)).abs() < dec!(0.000000001));
    }

    #[test]
    fn test_deficits_exactly_absorb_cash() {
        let r = run(
            dec!(1000),
            &[dec!(500), dec!(300), dec!(200)],
            &[dec!(0.4), dec!(0.4), dec!(0.2)],
        );
        assert_eq!(r.allocations, vec![dec!(300), dec!(500), dec!(200)]);
        assert_eq!(r.common_error, Some(Decimal::ZERO));
    }

    #[test]
    fn test_active_set_shrinks() {
        let r = run(
            dec!(100),
            &[dec!(100), dec!(300), dec!(600)],
            &[dec!(0.25), dec!(0.28), dec!(0.47)],
        );
        assert_eq!(r.allocations, vec![dec!(100), dec!(0), dec!(0)]);
        assert_eq!(r.active_set, vec![0]);
        assert_eq!(r.iterations, 2);
    }

    #[test]
    fn test_zero_cash_converges_to_zero() {
        let r = run(
            dec!(0),
            &[dec!(500), dec!(300), dec!(200)],
            &[dec!(0.2), dec!(0.5), dec!(0.3)],
        );
        assert!(r.allocations.iter().all(|a| a.is_zero()));
        assert_eq!(r.iterations, 2);
    }

    #[test]
    fn test_zero_cash_already_on_target() {
        let r = run(dec!(0), &[dec!(600), dec!(400)], &[dec!(0.6), dec!(0.4)]);
        assert!(r.allocations.iter().all(|a| a.is_zero()));
        assert_eq!(r.iterations, 0);
        assert_eq!(r.common_error, None);
    }

    #[test]
    fn test_no_underweight_holding_is_infeasible() {
        // Targets sum to 0.6, nothing is underweight yet cash is positive
        let m = compute_metrics(dec!(100), &[dec!(600), dec!(400)], &[dec!(0.3), dec!(0.3)])
            .unwrap();
        let err = allocate_equal_error(&m).unwrap_err();
        match err {
            AllocationError::InfeasibleAllocation { active_set_history } => {
                assert_eq!(active_set_history, vec![0]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_repeating_weights_sum_exactly() {
        let cv = [
            dec!(768),
            dec!(263),
            dec!(426),
            dec!(617),
            dec!(368),
            dec!(173),
            dec!(413),
            dec!(855),
        ];
        let seventh = dec!(0.1428571428571428571428571429);
        let tp = [
            seventh,
            seventh,
            seventh,
            seventh,
            seventh,
            seventh,
            dec!(0.0714285714285714285714285713),
            dec!(0.0714285714285714285714285713),
        ];
        let r = run(dec!(1471), &cv, &tp);
        assert_eq!(r.total(), dec!(1471));
        assert!(r.allocations.iter().all(|a| *a >= Decimal::ZERO));

        let first = r.errors[r.active_set[0]];
        for &i in &r.active_set {
            assert!((r.errors[i] - first).abs() < dec!(0.000000001));
        }
    }

    #[test]
    fn test_residual_keeps_exact_sum() {
        // e*T = 4/3 does not terminate in decimal
        let r = run(
            dec!(100),
            &[dec!(100), dec!(100), dec!(100)],
            &[dec!(0.33), dec!(0.33), dec!(0.33)],
        );
        assert_eq!(r.total(), dec!(100));
        assert_eq!(r.allocations[0], dec!(33.333333333334));
        assert_eq!(r.allocations[1], dec!(33.333333333333));
        let max = *r.errors.iter().max().unwrap();
        let min = *r.errors.iter().min().unwrap();
        let spread = max - min;
        assert!(spread < dec!(0.000000001));
    }
}
