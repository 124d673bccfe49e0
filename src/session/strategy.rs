//! Token refresh buffer strategies
//!
//! A strategy decides how many seconds before expiry a token should be
//! refreshed. Strategies never watch refresh outcomes themselves: whoever
//! performs the refresh must call `record_success` / `record_failure`.

use clap::ValueEnum;

/// Policy deciding how early a token is refreshed
pub trait RefreshStrategy: Send + Sync + std::fmt::Debug {
    /// Seconds before expiry at which a refresh becomes due
    fn buffer_seconds(&self) -> i64;

    /// Advances the strategy after a successful refresh
    fn record_success(&mut self) {}

    /// Advances the strategy after a failed refresh
    fn record_failure(&mut self) {}
}

/// Refreshes ten minutes ahead of expiry
#[derive(Debug, Clone, Copy, Default)]
pub struct Conservative;

impl RefreshStrategy for Conservative {
    fn buffer_seconds(&self) -> i64 {
        600
    }
}

/// Refreshes five minutes ahead of expiry
#[derive(Debug, Clone, Copy, Default)]
pub struct Aggressive;

impl RefreshStrategy for Aggressive {
    fn buffer_seconds(&self) -> i64 {
        300
    }
}

/// Widens the buffer after each consecutive failure
///
/// The buffer is `base * (1 + failures)` clamped to `[min, max]`.
#[derive(Debug, Clone)]
pub struct Adaptive {
    consecutive_failures: u32,
    base: i64,
    min: i64,
    max: i64,
}

impl Default for Adaptive {
    fn default() -> Self {
        Self::new(300, 60, 1800)
    }
}

impl Adaptive {
    /// Creates an adaptive strategy
    ///
    /// # Arguments
    /// * `base` - Buffer with no recorded failures
    /// * `min` - Lower clamp
    /// * `max` - Upper clamp
    pub fn new(base: i64, min: i64, max: i64) -> Self {
        Self {
            consecutive_failures: 0,
            base,
            min,
            max: max.max(min),
        }
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }
}

impl RefreshStrategy for Adaptive {
    fn buffer_seconds(&self) -> i64 {
        let grown = self
            .base
            .saturating_mul(1 + i64::from(self.consecutive_failures));
        grown.clamp(self.min, self.max)
    }

    fn record_success(&mut self) {
        self.consecutive_failures = 0;
    }

    fn record_failure(&mut self) {
        self.consecutive_failures = self.consecutive_failures.saturating_add(1);
    }
}

/// Selectable strategy names for configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum StrategyKind {
    Conservative,
    #[default]
    Aggressive,
    Adaptive,
}

impl StrategyKind {
    /// Builds a fresh strategy instance of this kind
    pub fn build(self) -> Box<dyn RefreshStrategy> {
        match self {
            StrategyKind::Conservative => Box::new(Conservative),
            StrategyKind::Aggressive => Box::new(Aggressive),
            StrategyKind::Adaptive => Box::new(Adaptive::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_buffers() {
        assert_eq!(Conservative.buffer_seconds(), 600);
        assert_eq!(Aggressive.buffer_seconds(), 300);
    }

    #[test]
    fn test_fixed_strategies_ignore_outcomes() {
        let mut s = Conservative;
        s.record_failure();
        s.record_failure();
        assert_eq!(s.buffer_seconds(), 600);
    }

    #[test]
    fn test_adaptive_grows_with_failures() {
        let mut s = Adaptive::new(300, 60, 1800);
        assert_eq!(s.buffer_seconds(), 300);
        s.record_failure();
        assert_eq!(s.buffer_seconds(), 600);
        s.record_failure();
        assert_eq!(s.buffer_seconds(), 900);
    }

    #[test]
    fn test_adaptive_clamps_to_max() {
        let mut s = Adaptive::new(300, 60, 1800);
        for _ in 0..20 {
            s.record_failure();
        }
        assert_eq!(s.buffer_seconds(), 1800);
    }

    #[test]
    fn test_adaptive_clamps_to_min() {
        let s = Adaptive::new(10, 60, 1800);
        assert_eq!(s.buffer_seconds(), 60);
    }

    #[test]
    fn test_adaptive_success_resets_failures() {
        let mut s = Adaptive::default();
        s.record_failure();
        s.record_failure();
        s.record_success();
        assert_eq!(s.consecutive_failures(), 0);
        assert_eq!(s.buffer_seconds(), 300);
    }

    #[test]
    fn test_strategy_kind_default_is_aggressive() {
        assert_eq!(StrategyKind::default().build().buffer_seconds(), 300);
        assert_eq!(StrategyKind::Conservative.build().buffer_seconds(), 600);
    }
}
