use crate::error::TradingError;
use crate::Result;
use serde::Serialize;
use std::num::NonZeroU32;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::time::Instant;

/// Smallest pause between retries in `acquire`, so a window that is just
/// about to roll over does not produce a zero-length sleep loop.
const MIN_RETRY_SLEEP: Duration = Duration::from_millis(1);

#[derive(Debug)]
struct WindowState {
    used: u32,
    window_start: Instant,
}

/// Snapshot of limiter usage for health checks
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RateLimitStatus {
    pub used: u32,
    pub capacity: u32,
    pub usage_rate: f64,
    pub remaining: Duration,
}

/// Fixed-window request budget for one upstream API
///
/// At most `capacity` permits are handed out per `window`. The window
/// restarts on the first acquire after it has fully elapsed. Share one
/// instance (behind an `Arc`) between every caller of the same API so the
/// budget is global.
#[derive(Debug)]
pub struct FixedWindowRateLimiter {
    capacity: u32,
    window: Duration,
    state: Mutex<WindowState>,
}

impl FixedWindowRateLimiter {
    pub fn new(capacity: NonZeroU32, window: Duration) -> Self {
        Self {
            capacity: capacity.get(),
            window,
            state: Mutex::new(WindowState {
                used: 0,
                window_start: Instant::now(),
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, WindowState> {
        // State is two plain integers, always consistent even after a panic
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn elapsed(&self, state: &WindowState) -> Duration {
        Instant::now().saturating_duration_since(state.window_start)
    }

    /// Take a permit, or report how long until the window resets
    fn take(&self) -> std::result::Result<(), (u32, Duration)> {
        let mut state = self.lock();
        let now = Instant::now();

        if now.saturating_duration_since(state.window_start) >= self.window {
            state.used = 0;
            state.window_start = now;
        }

        if state.used < self.capacity {
            state.used += 1;
            Ok(())
        } else {
            let elapsed = now.saturating_duration_since(state.window_start);
            Err((state.used, self.window.saturating_sub(elapsed)))
        }
    }

    /// Non-blocking acquire
    pub fn try_acquire(&self) -> Result<()> {
        self.take()
            .map_err(|(used, resets_in)| TradingError::RateLimitExhausted {
                used,
                capacity: self.capacity,
                resets_in,
            })
    }

    /// Wait until a permit is available
    ///
    /// Sleeps for the rest of the current window between attempts.
    pub async fn acquire(&self) {
        loop {
            match self.take() {
                Ok(()) => return,
                Err((used, resets_in)) => {
                    let wait = resets_in.max(MIN_RETRY_SLEEP);
                    tracing::debug!(
                        used,
                        capacity = self.capacity,
                        wait_ms = wait.as_millis() as u64,
                        "Rate limit reached, waiting for window reset"
                    );
                    tokio::time::sleep(wait).await;
                }
            }
        }
    }

    /// Fraction of the budget used in the current window
    ///
    /// A window that has already elapsed counts as empty.
    pub fn usage_rate(&self) -> f64 {
        let state = self.lock();
        if self.elapsed(&state) >= self.window {
            return 0.0;
        }
        state.used as f64 / self.capacity as f64
    }

    /// Time until the current window resets, within [0, window]
    pub fn remaining_time(&self) -> Duration {
        let state = self.lock();
        self.window.saturating_sub(self.elapsed(&state))
    }

    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    pub fn status(&self) -> RateLimitStatus {
        let state = self.lock();
        let elapsed = self.elapsed(&state);
        let used = if elapsed >= self.window { 0 } else { state.used };

        RateLimitStatus {
            used,
            capacity: self.capacity,
            usage_rate: used as f64 / self.capacity as f64,
            remaining: self.window.saturating_sub(elapsed),
        }
    }
}
