use napi::Result as NapiResult;
use napi_derive::napi;

use cash_allocation_core::allocation::{self, CashAllocationInput};

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

fn run(input_json: &str, skip_equal_error: bool) -> NapiResult<String> {
    let mut input: CashAllocationInput = serde_json::from_str(input_json).map_err(to_napi_error)?;
    input.skip_equal_error |= skip_equal_error;
    let output = allocation::allocate_cash(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Allocation
// ---------------------------------------------------------------------------

/// Run both allocation methods; returns the full result envelope as JSON.
#[napi]
pub fn allocate_cash(input_json: String) -> NapiResult<String> {
    run(&input_json, false)
}

/// Rank-priority allocation alone, for callers falling back when the
/// equal-error method reports an infeasible active set.
#[napi]
pub fn allocate_by_rank(input_json: String) -> NapiResult<String> {
    run(&input_json, true)
}
