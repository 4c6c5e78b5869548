//! Rank-priority greedy allocation.
//!
//! Walks investments from the largest deficit down, closing each deficit in
//! full while cash remains and handing the final partial amount to the first
//! deficit that cannot be closed. Over-target holdings receive nothing.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::metrics::PortfolioMetrics;
use crate::error::AllocationError;
use crate::types::{Money, Rate};
use crate::AllocationResult;

/// Output of the rank-priority allocation, in input order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankAllocation {
    pub allocations: Vec<Money>,
    pub errors: Vec<Rate>,
}

impl RankAllocation {
    pub fn total(&self) -> Money {
        self.allocations.iter().sum()
    }
}

/// Allocate cash by closing deficits in rank order.
///
/// Fails with `AllocationMismatch` when the allocations do not sum exactly
/// to cash, which happens only when cash exceeds the total positive deficit.
pub fn allocate_by_rank(metrics: &PortfolioMetrics) -> AllocationResult<RankAllocation> {
    let mut allocations = vec![Decimal::ZERO; metrics.len()];

    let mut remaining = metrics.cash.max(Decimal::ZERO);
    for inv in metrics.in_rank_order() {
        let amount = if inv.deficit < Decimal::ZERO {
            Decimal::ZERO
        } else {
            inv.deficit.min(remaining)
        };
        debug!(
            index = inv.index,
            rank = inv.rank,
            deficit = %inv.deficit,
            amount = %amount,
            "rank allocation step"
        );
        allocations[inv.index] = amount;
        remaining -= amount;
    }

    let allocated: Money = allocations.iter().sum();
    if allocated != metrics.cash {
        return Err(AllocationError::AllocationMismatch {
            allocated,
            cash: metrics.cash,
        });
    }

    let errors = allocations
        .iter()
        .enumerate()
        .map(|(i, a)| metrics.error_after(i, *a))
        .collect();

    Ok(RankAllocation {
        allocations,
        errors,
    })
}
