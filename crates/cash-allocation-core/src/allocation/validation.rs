//! Input well-formedness checks.
//!
//! Only the shape of the inputs and the target-weight sum are enforced.
//! Non-negative holdings and non-negative cash are caller preconditions:
//! breaches are reported as warnings, never as errors.

use rust_decimal::{Decimal, RoundingStrategy};

use crate::error::AllocationError;
use crate::types::{Money, Rate};
use crate::AllocationResult;

/// Check that both sequences are non-empty and of equal length.
pub fn validate_shape(current_values: &[Money], target_pcts: &[Rate]) -> AllocationResult<usize> {
    if target_pcts.is_empty() {
        return Err(AllocationError::InvalidInput {
            field: "target_pcts".into(),
            reason: "At least one investment is required".into(),
        });
    }
    if current_values.len() != target_pcts.len() {
        return Err(AllocationError::InvalidInput {
            field: "current_values".into(),
            reason: format!(
                "Length {} does not match target_pcts length {}",
                current_values.len(),
                target_pcts.len()
            ),
        });
    }
    Ok(target_pcts.len())
}

/// Check that the target weights sum to one and return the sum.
///
/// Without a tolerance the sum must round (half to even) to exactly 1,
/// which accepts any sum strictly between 0.5 and 1.5. With a tolerance
/// the sum must lie within `tolerance` of 1.
pub fn validate_target_sum(target_pcts: &[Rate], tolerance: Option<Rate>) -> AllocationResult<Rate> {
    let sum = target_pcts
        .iter()
        .try_fold(Decimal::ZERO, |acc, tp| acc.checked_add(*tp))
        .ok_or_else(|| AllocationError::InvalidInput {
            field: "target_pcts".into(),
            reason: "Sum overflows the decimal range".into(),
        })?;

    match tolerance {
        Some(tol) => {
            if tol < Decimal::ZERO {
                return Err(AllocationError::InvalidInput {
                    field: "target_sum_tolerance".into(),
                    reason: "Must be non-negative".into(),
                });
            }
            if (sum - Decimal::ONE).abs() > tol {
                return Err(AllocationError::InvalidInput {
                    field: "target_pcts".into(),
                    reason: format!("Sum {sum} is not within {tol} of 1"),
                });
            }
        }
        None => {
            let rounded = sum.round_dp_with_strategy(0, RoundingStrategy::MidpointNearestEven);
            if rounded != Decimal::ONE {
                return Err(AllocationError::InvalidInput {
                    field: "target_pcts".into(),
                    reason: format!("Sum {sum} does not round to 1"),
                });
            }
        }
    }

    Ok(sum)
}

/// Truncate cash toward zero to a whole monetary unit.
pub fn truncate_cash(cash: Money) -> Money {
    cash.trunc()
}

/// Collect warnings for unenforced preconditions.
pub fn precondition_warnings(cash: Money, current_values: &[Money]) -> Vec<String> {
    let mut warnings = Vec::new();

    if cash < Decimal::ZERO {
        warnings.push(format!("Negative cash {cash}: allocations are not meaningful"));
    }
    for (i, cv) in current_values.iter().enumerate() {
        if *cv < Decimal::ZERO {
            warnings.push(format!("Negative current value {cv} at index {i}"));
        }
    }

    warnings
}
