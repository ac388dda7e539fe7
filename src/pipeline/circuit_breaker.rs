//! Circuit Breaker pattern implementation.
//!
//! Prevents a broken crawl from replacing a good catalog by aborting the
//! write when the course count drops sharply compared to the previous run.

use crate::error::{AppError, Result};
use crate::models::OutputConfig;

/// Circuit breaker configuration.
#[derive(Debug, Clone)]
pub struct CircuitBreakerConfig {
    /// Maximum allowed drop percentage (0-100). Default: 20%
    pub max_drop_percent: u8,
    /// Minimum previous count for the drop check to apply.
    /// Below this threshold, the check is skipped (for new deployments).
    pub min_baseline: usize,
    /// Allow an empty catalog when the previous one was also empty
    pub allow_cold_start: bool,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            max_drop_percent: 20,
            min_baseline: 10,
            allow_cold_start: true,
        }
    }
}

impl From<&OutputConfig> for CircuitBreakerConfig {
    fn from(output: &OutputConfig) -> Self {
        Self {
            max_drop_percent: output.max_drop_percent,
            min_baseline: output.min_baseline,
            allow_cold_start: true,
        }
    }
}

/// Circuit breaker for preventing bad catalog updates.
#[derive(Debug, Clone, Default)]
pub struct CircuitBreaker {
    config: CircuitBreakerConfig,
}

/// Result of circuit breaker check.
#[derive(Debug, Clone, PartialEq)]
pub enum CircuitBreakerResult {
    /// Safe to proceed with the write
    Safe {
        current_count: usize,
        previous_count: usize,
    },
    /// First run or previous catalog below baseline
    ColdStart { current_count: usize },
    /// Circuit breaker triggered - abort write
    Triggered {
        current_count: usize,
        previous_count: usize,
        drop_percent: f64,
    },
    /// Empty catalog after a non-empty one
    EmptyResult,
}

impl CircuitBreaker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: CircuitBreakerConfig) -> Self {
        Self { config }
    }

    /// Compare the new course count against the previous one.
    pub fn check(&self, current_count: usize, previous_count: usize) -> CircuitBreakerResult {
        if current_count == 0 {
            if previous_count == 0 && self.config.allow_cold_start {
                return CircuitBreakerResult::ColdStart { current_count };
            }
            return CircuitBreakerResult::EmptyResult;
        }

        if previous_count < self.config.min_baseline {
            return CircuitBreakerResult::ColdStart { current_count };
        }

        if current_count < previous_count {
            let drop = previous_count - current_count;
            let drop_percent = (drop as f64 / previous_count as f64) * 100.0;

            if drop_percent > self.config.max_drop_percent as f64 {
                return CircuitBreakerResult::Triggered {
                    current_count,
                    previous_count,
                    drop_percent,
                };
            }
        }

        CircuitBreakerResult::Safe {
            current_count,
            previous_count,
        }
    }

    /// Like [`check`](Self::check), but turns an unsafe result into an error.
    pub fn validate(&self, current_count: usize, previous_count: usize) -> Result<()> {
        match self.check(current_count, previous_count) {
            CircuitBreakerResult::Safe {
                current_count,
                previous_count,
            } => {
                log::info!(
                    "Circuit breaker: OK ({} -> {} courses)",
                    previous_count,
                    current_count
                );
                Ok(())
            }
            CircuitBreakerResult::ColdStart { current_count } => {
                log::info!(
                    "Circuit breaker: COLD START ({} courses, first run or below baseline)",
                    current_count
                );
                Ok(())
            }
            CircuitBreakerResult::Triggered {
                current_count,
                previous_count,
                drop_percent,
            } => {
                log::error!(
                    "Circuit breaker: TRIGGERED! {} -> {} courses ({:.1}% drop > {}% threshold)",
                    previous_count,
                    current_count,
                    drop_percent,
                    self.config.max_drop_percent
                );
                Err(AppError::CircuitBreakerTriggered {
                    current_count,
                    previous_count,
                    drop_percent,
                    threshold_percent: self.config.max_drop_percent,
                })
            }
            CircuitBreakerResult::EmptyResult => {
                log::error!("Circuit breaker: EMPTY CATALOG - aborting write");
                Err(AppError::EmptyCatalog)
            }
        }
    }
}
