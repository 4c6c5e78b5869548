//! Assembly of the final per-investment table, ordered by rank.

use serde::{Deserialize, Serialize};

use super::equal_error::EqualErrorAllocation;
use super::metrics::PortfolioMetrics;
use super::rank::RankAllocation;
use crate::types::{Money, Rate};

/// One row of the result table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocationRow {
    /// Position in the caller's input sequences.
    pub index: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub target_pct: Rate,
    pub current_pct: Rate,
    pub target_value: Money,
    pub current_value: Money,
    pub rank: usize,
    pub deficit: Money,
    pub error: Rate,
    pub allocation_m1: Money,
    pub error_m1: Rate,
    /// Absent when the equal-error method was skipped.
    pub allocation_m2: Option<Money>,
    pub error_m2: Option<Rate>,
}

/// Merge metrics and both allocations into rank-ordered rows.
pub fn assemble_rows(
    metrics: &PortfolioMetrics,
    by_rank: &RankAllocation,
    equal_error: Option<&EqualErrorAllocation>,
    labels: Option<&[String]>,
) -> Vec<AllocationRow> {
    metrics
        .in_rank_order()
        .map(|inv| {
            let i = inv.index;
            AllocationRow {
                index: i,
                label: labels.and_then(|l| l.get(i).cloned()),
                target_pct: inv.target_pct,
                current_pct: inv.current_pct,
                target_value: inv.target_value,
                current_value: inv.current_value,
                rank: inv.rank,
                deficit: inv.deficit,
                error: inv.error,
                allocation_m1: by_rank.allocations[i],
                error_m1: by_rank.errors[i],
                allocation_m2: equal_error.map(|e| e.allocations[i]),
                error_m2: equal_error.map(|e| e.errors[i]),
            }
        })
        .collect()
}
