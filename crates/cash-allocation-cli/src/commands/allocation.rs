use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;
use tracing::debug;

use cash_allocation_core::allocation::{self, CashAllocationInput};

use crate::input;

/// Arguments for cash allocation
#[derive(Args)]
pub struct AllocateArgs {
    /// Path to a JSON or YAML file holding the allocation input
    #[arg(long)]
    pub input: Option<String>,

    /// Cash to allocate (truncated to a whole unit)
    #[arg(long, allow_hyphen_values = true)]
    pub cash: Option<Decimal>,

    /// Comma-separated current holding values (e.g. "500,300,200")
    #[arg(long, value_delimiter = ',')]
    pub current_values: Option<Vec<Decimal>>,

    /// Comma-separated target weights summing to 1 (e.g. "0.4,0.4,0.2")
    #[arg(long, value_delimiter = ',')]
    pub target_pcts: Option<Vec<Decimal>>,

    /// Comma-separated investment names, one per holding
    #[arg(long, value_delimiter = ',')]
    pub labels: Option<Vec<String>>,

    /// Maximum allowed distance of the target weight sum from 1
    #[arg(long)]
    pub tolerance: Option<Decimal>,

    /// Only run the rank-priority allocation
    #[arg(long)]
    pub skip_equal_error: bool,
}

fn build_input(args: &AllocateArgs) -> Result<CashAllocationInput, Box<dyn std::error::Error>> {
    if let Some(ref path) = args.input {
        debug!(path = %path, "reading allocation input from file");
        return input::file::read_input(path);
    }

    match (&args.cash, &args.current_values, &args.target_pcts) {
        (Some(cash), Some(current), Some(targets)) => {
            debug!(investments = current.len(), "allocation input from flags");
            Ok(CashAllocationInput::new(*cash, current.clone(), targets.clone()))
        }
        (None, None, None) => match input::stdin::read_stdin()? {
            Some(data) => {
                debug!("allocation input from stdin");
                Ok(serde_json::from_value(data)?)
            }
            None => Err(
                "Provide --cash, --current-values and --target-pcts, or --input file, or pipe JSON via stdin"
                    .into(),
            ),
        },
        _ => Err("--cash, --current-values and --target-pcts must be given together".into()),
    }
}

pub fn run_allocate(args: AllocateArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let mut alloc_input = build_input(&args)?;

    if let Some(ref labels) = args.labels {
        alloc_input.labels = Some(labels.clone());
    }
    if args.tolerance.is_some() {
        alloc_input.target_sum_tolerance = args.tolerance;
    }
    if args.skip_equal_error {
        alloc_input.skip_equal_error = true;
    }

    let result = allocation::allocate_cash(&alloc_input)?;
    debug!(
        warnings = result.warnings.len(),
        elapsed_us = result.metadata.computation_time_us,
        "allocation complete"
    );
    Ok(serde_json::to_value(result)?)
}
