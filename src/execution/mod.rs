// Order execution module
pub mod executor;

pub use executor::{ExecutionConfig, ExecutionMode, OrderExecutor, HARD_MAX_LEVERAGE};
