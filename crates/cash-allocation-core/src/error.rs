use rust_decimal::Decimal;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AllocationError {
    #[error("Invalid input: {field} — {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Degenerate portfolio: {0}")]
    DegeneratePortfolio(String),

    #[error("Division by zero in {context}")]
    DivisionByZero { context: String },

    #[error("Infeasible allocation: equal-error active set collapsed to empty (active set sizes per iteration: {active_set_history:?})")]
    InfeasibleAllocation { active_set_history: Vec<usize> },

    #[error("Allocation mismatch: allocated {allocated} of {cash} cash (cash exceeds total positive deficit)")]
    AllocationMismatch { allocated: Decimal, cash: Decimal },

    #[error("Convergence failure: {function} did not converge after {iterations} iterations")]
    ConvergenceFailure { function: String, iterations: u32 },
}
