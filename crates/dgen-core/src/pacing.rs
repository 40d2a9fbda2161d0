//! Pacing of snapshot emission.
//!
//! Delays are cooperative pauses on the task that owns a session. They exist
//! only so that a client sees the diagram grow; tests disable them.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Pause before each partial snapshot.
pub const PARTIAL_FLUSH_DELAY_MS: u64 = 400;
/// Pause after the opening delimiter is seen.
pub const OPENING_SETTLE_DELAY_MS: u64 = 1000;
/// Pause before the terminal snapshot.
pub const TERMINAL_SETTLE_DELAY_MS: u64 = 800;

/// Named emission delays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PacingPolicy {
    pub enabled: bool,
    pub partial_flush_ms: u64,
    pub opening_settle_ms: u64,
    pub terminal_settle_ms: u64,
}

impl Default for PacingPolicy {
    fn default() -> Self {
        Self {
            enabled: true,
            partial_flush_ms: PARTIAL_FLUSH_DELAY_MS,
            opening_settle_ms: OPENING_SETTLE_DELAY_MS,
            terminal_settle_ms: TERMINAL_SETTLE_DELAY_MS,
        }
    }
}

impl PacingPolicy {
    /// No pauses at all.
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }

    /// Default delays multiplied by `factor` (e.g. `0.01` in demos).
    pub fn scaled(factor: f64) -> Self {
        let scale = |ms: u64| (ms as f64 * factor.max(0.0)).round() as u64;
        Self {
            enabled: true,
            partial_flush_ms: scale(PARTIAL_FLUSH_DELAY_MS),
            opening_settle_ms: scale(OPENING_SETTLE_DELAY_MS),
            terminal_settle_ms: scale(TERMINAL_SETTLE_DELAY_MS),
        }
    }

    pub fn partial_flush(&self) -> Duration {
        self.delay(self.partial_flush_ms)
    }

    pub fn opening_settle(&self) -> Duration {
        self.delay(self.opening_settle_ms)
    }

    pub fn terminal_settle(&self) -> Duration {
        self.delay(self.terminal_settle_ms)
    }

    fn delay(&self, ms: u64) -> Duration {
        if self.enabled {
            Duration::from_millis(ms)
        } else {
            Duration::ZERO
        }
    }
}
