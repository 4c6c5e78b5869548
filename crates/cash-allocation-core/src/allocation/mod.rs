//! Cash allocation toward target weights.
//!
//! Pipeline:
//! 1. **Validation** -- shape checks and target-sum rule
//! 2. **Metrics** -- current weight, target value, deficit, error, rank
//! 3. **Rank allocation** -- greedy deficit closing in rank order
//! 4. **Equal-error allocation** -- water-filling to a shared error
//! 5. **Table** -- rank-ordered rows merging every field
//!
//! `allocate_cash` runs the whole pipeline. The stages are public so a
//! caller can run the rank allocation alone when the equal-error method
//! reports an infeasible active set.

pub mod equal_error;
pub mod metrics;
pub mod rank;
pub mod table;
pub mod validation;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, warn};

use crate::error::AllocationError;
use crate::types::*;
use crate::AllocationResult;

use self::equal_error::EqualErrorAllocation;
use self::rank::RankAllocation;
use self::table::AllocationRow;

/// Input for a single cash allocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CashAllocationInput {
    /// Cash to allocate; truncated toward zero to a whole unit before use.
    pub cash: Money,
    /// Current holding values, one per investment.
    pub current_values: Vec<Money>,
    /// Target weights of the post-allocation total, one per investment.
    pub target_pcts: Vec<Rate>,
    /// Optional investment names carried through to the result rows.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub labels: Option<Vec<String>>,
    /// Maximum allowed |Σtarget_pcts - 1|. When absent the sum only has to
    /// round to 1.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_sum_tolerance: Option<Rate>,
    /// Skip the equal-error method; its columns are then absent.
    #[serde(default)]
    pub skip_equal_error: bool,
}

impl CashAllocationInput {
    pub fn new(cash: Money, current_values: Vec<Money>, target_pcts: Vec<Rate>) -> Self {
        Self {
            cash,
            current_values,
            target_pcts,
            labels: None,
            target_sum_tolerance: None,
            skip_equal_error: false,
        }
    }
}

/// Portfolio-level figures accompanying the rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocationSummary {
    /// Cash actually allocated (after truncation).
    pub cash: Money,
    pub total_current_value: Money,
    /// Σcurrent_value + cash
    pub total_value: Money,
    pub total_positive_deficit: Money,
    pub total_allocated_m1: Money,
    pub total_allocated_m2: Option<Money>,
    pub max_abs_error_before: Rate,
    pub max_abs_error_m1: Rate,
    pub max_abs_error_m2: Option<Rate>,
    pub equal_error_iterations: Option<u32>,
    pub equal_error_active_count: Option<usize>,
    /// Shared post-allocation error across the equal-error active set.
    pub common_error: Option<Rate>,
    /// True when some funded investment ends closer to target than an
    /// unfunded underweight one under the rank allocation.
    pub rank_allocation_suboptimal: bool,
}

/// Output of a cash allocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CashAllocationOutput {
    /// One row per investment, ordered by ascending rank.
    pub rows: Vec<AllocationRow>,
    pub summary: AllocationSummary,
}

/// Allocate cash across a portfolio with both allocation methods.
pub fn allocate_cash(
    input: &CashAllocationInput,
) -> AllocationResult<ComputationOutput<CashAllocationOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    // Validate
    let n = validation::validate_shape(&input.current_values, &input.target_pcts)?;
    if let Some(ref labels) = input.labels {
        if labels.len() != n {
            return Err(AllocationError::InvalidInput {
                field: "labels".into(),
                reason: format!("Length {} does not match {} investments", labels.len(), n),
            });
        }
    }
    let target_sum = validation::validate_target_sum(&input.target_pcts, input.target_sum_tolerance)?;

    let cash = validation::truncate_cash(input.cash);
    if cash != input.cash {
        warnings.push(format!("Cash {} truncated to {}", input.cash, cash));
    }
    warnings.extend(validation::precondition_warnings(cash, &input.current_values));
    for w in &warnings {
        warn!("{w}");
    }

    // Metrics and allocations
    let portfolio = metrics::compute_metrics(cash, &input.current_values, &input.target_pcts)?;
    debug!(
        investments = n,
        cash = %cash,
        total_value = %portfolio.total_value,
        target_sum = %target_sum,
        "portfolio metrics computed"
    );

    let by_rank = rank::allocate_by_rank(&portfolio)?;
    let by_equal_error = if input.skip_equal_error {
        None
    } else {
        Some(equal_error::allocate_equal_error(&portfolio)?)
    };

    let rows = table::assemble_rows(
        &portfolio,
        &by_rank,
        by_equal_error.as_ref(),
        input.labels.as_deref(),
    );
    let summary = summarise(&portfolio, &by_rank, by_equal_error.as_ref());

    let output = CashAllocationOutput { rows, summary };

    Ok(with_metadata(
        "Rank-priority greedy and equal-error cash allocation",
        serde_json::json!({
            "cash": input.cash.to_string(),
            "investments": n,
            "target_sum": target_sum.to_string(),
            "target_sum_rule": match input.target_sum_tolerance {
                Some(tol) => format!("|sum - 1| <= {tol}"),
                None => "round(sum) == 1".to_string(),
            },
            "equal_error": !input.skip_equal_error,
        }),
        warnings,
        start,
        output,
    ))
}

fn summarise(
    portfolio: &metrics::PortfolioMetrics,
    by_rank: &RankAllocation,
    by_equal_error: Option<&EqualErrorAllocation>,
) -> AllocationSummary {
    AllocationSummary {
        cash: portfolio.cash,
        total_current_value: portfolio.total_current_value,
        total_value: portfolio.total_value,
        total_positive_deficit: portfolio.total_positive_deficit(),
        total_allocated_m1: by_rank.total(),
        total_allocated_m2: by_equal_error.map(|e| e.total()),
        max_abs_error_before: max_abs(portfolio.investments.iter().map(|i| i.error)),
        max_abs_error_m1: max_abs(by_rank.errors.iter().copied()),
        max_abs_error_m2: by_equal_error.map(|e| max_abs(e.errors.iter().copied())),
        equal_error_iterations: by_equal_error.map(|e| e.iterations),
        equal_error_active_count: by_equal_error.map(|e| e.active_set.len()),
        common_error: by_equal_error.and_then(|e| e.common_error),
        rank_allocation_suboptimal: rank_allocation_suboptimal(portfolio, by_rank),
    }
}

fn max_abs(errors: impl IntoIterator<Item = Rate>) -> Rate {
    errors
        .into_iter()
        .map(|e| e.abs())
        .max()
        .unwrap_or(Decimal::ZERO)
}

/// Compare residual errors of funded and unfunded underweight investments.
///
/// Informational only; both methods are always reported.
pub fn rank_allocation_suboptimal(
    portfolio: &metrics::PortfolioMetrics,
    by_rank: &RankAllocation,
) -> bool {
    let mut funded_min: Option<Rate> = None;
    let mut unfunded_max: Option<Rate> = None;

    for inv in portfolio
        .investments
        .iter()
        .filter(|inv| inv.deficit >= Decimal::ZERO)
    {
        let err = by_rank.errors[inv.index].abs();
        if by_rank.allocations[inv.index] > Decimal::ZERO {
            funded_min = Some(funded_min.map_or(err, |m| m.min(err)));
        } else {
            unfunded_max = Some(unfunded_max.map_or(err, |m| m.max(err)));
        }
    }

    matches!((funded_min, unfunded_max), (Some(f), Some(u)) if f < u)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn sample_input(cash: Decimal) -> CashAllocationInput {
        CashAllocationInput::new(
            cash,
            vec![dec!(500), dec!(300), dec!(200)],
            vec![dec!(0.4), dec!(0.4), dec!(0.2)],
        )
    }

    #[test]
    fn test_pipeline_summary() {
        let out = allocate_cash(&sample_input(dec!(200))).unwrap();
        let s = &out.result.summary;
        assert_eq!(s.cash, dec!(200));
        assert_eq!(s.total_value, dec!(1200));
        assert_eq!(s.total_positive_deficit, dec!(220));
        assert_eq!(s.total_allocated_m1, dec!(200));
        assert_eq!(s.total_allocated_m2, Some(dec!(200)));
        assert_eq!(s.equal_error_iterations, Some(1));
        assert_eq!(s.equal_error_active_count, Some(2));
        assert!(out.warnings.is_empty());
    }

    #[test]
    fn test_cash_truncation_warns() {
        let out = allocate_cash(&sample_input(dec!(200.75))).unwrap();
        assert_eq!(out.result.summary.cash, dec!(200));
        assert_eq!(out.warnings.len(), 1);
        assert!(out.warnings[0].contains("truncated"));
    }

    #[test]
    fn test_label_length_checked() {
        let mut input = sample_input(dec!(200));
        input.labels = Some(vec!["only-one".into()]);
        assert!(matches!(
            allocate_cash(&input),
            Err(AllocationError::InvalidInput { .. })
        ));
    }

    #[test]
    fn test_skip_equal_error() {
        let mut input = sample_input(dec!(200));
        input.skip_equal_error = true;
        let out = allocate_cash(&input).unwrap();
        assert!(out.result.rows.iter().all(|r| r.allocation_m2.is_none()));
        assert_eq!(out.result.summary.total_allocated_m2, None);
        assert_eq!(out.result.summary.common_error, None);
    }

    #[test]
    fn test_rank_only_run_keeps_validation_and_warnings() {
        let mut input = sample_input(dec!(200.5));
        input.skip_equal_error = true;
        input.target_sum_tolerance = Some(dec!(0.001));
        let out = allocate_cash(&input).unwrap();
        assert_eq!(out.result.summary.total_allocated_m1, dec!(200));
        assert_eq!(out.warnings.len(), 1);
        assert_eq!(out.assumptions["target_sum_rule"], "|sum - 1| <= 0.001");

        input.target_pcts = vec![dec!(0.4), dec!(0.4), dec!(0.19)];
        assert!(matches!(
            allocate_cash(&input),
            Err(AllocationError::InvalidInput { .. })
        ));
    }

    #[test]
    fn test_suboptimal_flag() {
        // Every underweight holding receives some cash
        let out = allocate_cash(&sample_input(dec!(200))).unwrap();
        assert!(!out.result.summary.rank_allocation_suboptimal);

        // Cash runs out before the second underweight holding
        let input = CashAllocationInput::new(
            dec!(100),
            vec![dec!(100), dec!(100), dec!(100)],
            vec![dec!(0.5), dec!(0.3), dec!(0.2)],
        );
        let out = allocate_cash(&input).unwrap();
        assert!(out.result.summary.rank_allocation_suboptimal);
    }

    #[test]
    fn test_input_deserialises_with_defaults() {
        let json = r#"{"cash":"1000","current_values":["500","300","200"],"target_pcts":["0.4","0.4","0.2"]}"#;
        let input: CashAllocationInput = serde_json::from_str(json).unwrap();
        assert!(!input.skip_equal_error);
        assert!(input.labels.is_none());
        assert!(input.target_sum_tolerance.is_none());
        assert!(allocate_cash(&input).is_ok());
    }
}
