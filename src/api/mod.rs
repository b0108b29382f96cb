pub mod binance;
pub mod exchange;
pub mod rate_limiter;

pub use binance::{BinanceClient, Credentials};
pub use exchange::{ExchangeClient, OrderFill};
pub use rate_limiter::{FixedWindowRateLimiter, RateLimitStatus};
