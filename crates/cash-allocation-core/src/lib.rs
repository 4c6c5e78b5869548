//! Deterministic cash allocation toward target portfolio weights.
//!
//! Given a cash amount, the current value of each holding and a target
//! weight per holding, the engine computes per-investment deficits and
//! ranks, then produces two allocations of the cash:
//!
//! 1. **Rank-priority greedy** -- close deficits fully, largest first,
//!    until the cash is exhausted.
//! 2. **Equal-error** -- water-fill the cash so every funded investment
//!    ends with the same post-allocation weight error.
//!
//! All arithmetic uses `rust_decimal::Decimal`. No `f64`.

pub mod allocation;
pub mod error;
pub mod types;

pub use error::AllocationError;
pub use types::*;

/// Standard result type for all cash-allocation operations
pub type AllocationResult<T> = Result<T, AllocationError>;
