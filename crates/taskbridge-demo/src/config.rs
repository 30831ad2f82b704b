//! Demo configuration.

use std::time::Duration;

/// Demo configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Number of ticks before the ticker completes.
    pub steps: u32,

    /// Delay between ticks (milliseconds).
    pub tick_interval_ms: u64,

    /// Cancel after this many progress events.
    pub cancel_after: Option<u32>,

    /// Fail at this tick instead of completing.
    pub fail_at: Option<u32>,
}

impl Config {
    /// Delay between ticks.
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            steps: 5,
            tick_interval_ms: 200,
            cancel_after: None,
            fail_at: None,
        }
    }
}
