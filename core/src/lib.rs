pub mod config;
pub mod error;
pub mod line_count;
pub mod profitability;
pub mod types;

pub use error::{ConfigError, Error};
pub use line_count::{AccumulatedCounts, LineCountAccumulator, ModuleLimits, VerificationOutcome};
pub use profitability::{PricingSource, ProfitabilityCalculator, ProfitabilityInputs, SharedPricingSource};
pub use types::{
    Bundle, ModuleOverflow, PendingTransaction, RejectionReport, RejectionStage, Transaction,
    TransactionSelectionResult, TransactionType,
};
