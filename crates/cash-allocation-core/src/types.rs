use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

/// Monetary amounts: holdings, cash, deficits, allotments.
pub type Money = Decimal;

/// Portfolio weights and weight errors as decimals (0.05 = 5%). Never as percentages.
pub type Rate = Decimal;

/// Envelope returned by every top-level computation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationOutput<T: Serialize> {
    pub result: T,
    pub methodology: String,
    /// JSON echo of the inputs and rules the result depends on.
    pub assumptions: serde_json::Value,
    /// Precondition breaches and adjustments that did not stop the computation.
    pub warnings: Vec<String>,
    pub metadata: ComputationMetadata,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationMetadata {
    pub version: String,
    pub computation_time_us: u64,
    pub precision: String,
}

/// Wrap a result in the output envelope, timing from `started`.
pub fn with_metadata<T: Serialize>(
    methodology: &str,
    assumptions: serde_json::Value,
    warnings: Vec<String>,
    started: Instant,
    result: T,
) -> ComputationOutput<T> {
    ComputationOutput {
        result,
        methodology: methodology.to_string(),
        assumptions,
        warnings,
        metadata: ComputationMetadata {
            version: env!("CARGO_PKG_VERSION").to_string(),
            computation_time_us: started.elapsed().as_micros() as u64,
            precision: "rust_decimal_128bit".to_string(),
        },
    }
}
