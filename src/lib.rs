// Core modules
pub mod api;
pub mod app;
pub mod config;
pub mod error;
pub mod execution;
pub mod indicators;
pub mod models;
pub mod persistence;
pub mod scheduler;
pub mod strategy;

// Re-export commonly used types
pub use app::{AppContext, CycleOutcome, TradingPipeline};
pub use config::AppConfig;
pub use error::{ExchangeError, TradingError};
pub use models::*;
pub use strategy::{Strategy, StrategyKind};

// Error handling
pub type Result<T> = std::result::Result<T, TradingError>;
