//! Per-investment metrics: current weight, target value, deficit, error, rank.
//!
//! Target values are measured against the post-allocation total
//! `T = Σcurrent_value + cash`, while the pre-allocation error is measured
//! against the current total only.
//!
//! Target values are rounded to [`MONEY_SCALE`] places and the rounding
//! residual is handed to the largest target value, so that
//! `Σtarget_value == round(Σtarget_pct * T)`. Every later sum of target
//! values, deficits and allotments is then exact decimal arithmetic.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::AllocationError;
use crate::types::{Money, Rate};
use crate::AllocationResult;

/// Decimal places kept on target values and deficits.
pub const MONEY_SCALE: u32 = 12;

/// Derived figures for a single investment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvestmentMetrics {
    /// Position in the caller's input sequences.
    pub index: usize,
    pub target_pct: Rate,
    pub current_value: Money,
    /// current_value / Σcurrent_value
    pub current_pct: Rate,
    /// target_pct * (Σcurrent_value + cash)
    pub target_value: Money,
    /// target_value - current_value (positive = underweight)
    pub deficit: Money,
    /// current_pct - target_pct
    pub error: Rate,
    /// 0 = largest deficit; ties go to the earlier input.
    pub rank: usize,
}

/// Metrics for the whole portfolio, stored in input order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioMetrics {
    pub cash: Money,
    pub total_current_value: Money,
    /// Σcurrent_value + cash
    pub total_value: Money,
    pub investments: Vec<InvestmentMetrics>,
    /// Input indices sorted by ascending rank.
    pub rank_order: Vec<usize>,
}

impl PortfolioMetrics {
    pub fn len(&self) -> usize {
        self.investments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.investments.is_empty()
    }

    /// Investments from most underweight to least.
    pub fn in_rank_order(&self) -> impl Iterator<Item = &InvestmentMetrics> + '_ {
        self.rank_order.iter().map(move |&i| &self.investments[i])
    }

    /// Sum of the positive deficits, i.e. the total unmet demand.
    pub fn total_positive_deficit(&self) -> Money {
        self.investments
            .iter()
            .map(|inv| inv.deficit.max(Decimal::ZERO))
            .sum()
    }

    /// Post-allocation weight error for an investment receiving `allocation`.
    pub fn error_after(&self, index: usize, allocation: Money) -> Rate {
        let inv = &self.investments[index];
        (inv.current_value + allocation) / self.total_value - inv.target_pct
    }
}

/// Compute all per-investment metrics and ranks.
///
/// Inputs are assumed to have passed shape validation.
pub fn compute_metrics(
    cash: Money,
    current_values: &[Money],
    target_pcts: &[Rate],
) -> AllocationResult<PortfolioMetrics> {
    let total_current_value = checked_sum(current_values, "current_values")?;
    if total_current_value.is_zero() {
        return Err(AllocationError::DegeneratePortfolio(
            "Sum of current values is zero; current weights are undefined".into(),
        ));
    }

    let total_value = total_current_value
        .checked_add(cash)
        .ok_or_else(|| overflow("cash", "Current values plus cash"))?;
    if total_value.is_zero() {
        return Err(AllocationError::DivisionByZero {
            context: "post-allocation portfolio total (current values + cash)".into(),
        });
    }

    let target_values = apportion_target_values(target_pcts, total_value)?;
    let deficits = target_values
        .iter()
        .zip(current_values)
        .map(|(tv, cv)| {
            tv.checked_sub(*cv)
                .ok_or_else(|| overflow("current_values", "Deficit"))
        })
        .collect::<AllocationResult<Vec<Money>>>()?;

    let rank_order = rank_order_by_deficit(&deficits);
    let mut ranks = vec![0usize; deficits.len()];
    for (rank, &index) in rank_order.iter().enumerate() {
        ranks[index] = rank;
    }

    let investments = current_values
        .iter()
        .zip(target_pcts)
        .enumerate()
        .map(|(index, (&current_value, &target_pct))| {
            let current_pct = current_value / total_current_value;
            InvestmentMetrics {
                index,
                target_pct,
                current_value,
                current_pct,
                target_value: target_values[index],
                deficit: deficits[index],
                error: current_pct - target_pct,
                rank: ranks[index],
            }
        })
        .collect();

    Ok(PortfolioMetrics {
        cash,
        total_current_value,
        total_value,
        investments,
        rank_order,
    })
}

/// Target values `target_pct * total` at [`MONEY_SCALE`] places.
///
/// The residual between the rounded total and the sum of rounded parts goes
/// to the largest target value, earliest input on ties.
pub fn apportion_target_values(target_pcts: &[Rate], total: Money) -> AllocationResult<Vec<Money>> {
    let mut values = target_pcts
        .iter()
        .map(|tp| {
            tp.checked_mul(total)
                .map(|v| v.round_dp(MONEY_SCALE))
                .ok_or_else(|| overflow("target_pcts", "Target value"))
        })
        .collect::<AllocationResult<Vec<Money>>>()?;

    let target_sum = checked_sum(target_pcts, "target_pcts")?;
    let expected = target_sum
        .checked_mul(total)
        .ok_or_else(|| overflow("target_pcts", "Total target value"))?
        .round_dp(MONEY_SCALE);
    let residual = expected - checked_sum(&values, "target_pcts")?;

    if !residual.is_zero() {
        let largest = (0..values.len()).reduce(|best, i| if values[i] > values[best] { i } else { best });
        if let Some(k) = largest {
            values[k] += residual;
        }
    }
    Ok(values)
}

fn checked_sum(values: &[Decimal], field: &str) -> AllocationResult<Decimal> {
    values.iter().try_fold(Decimal::ZERO, |acc, v| {
        acc.checked_add(*v).ok_or_else(|| overflow(field, "Sum"))
    })
}

fn overflow(field: &str, what: &str) -> AllocationError {
    AllocationError::InvalidInput {
        field: field.into(),
        reason: format!("{what} overflows the decimal range"),
    }
}

/// Indices ordered by descending deficit, ascending input index on ties.
pub fn rank_order_by_deficit(deficits: &[Money]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..deficits.len()).collect();
    order.sort_by(|&a, &b| deficits[b].cmp(&deficits[a]).then(a.cmp(&b)));
    order
}
