use thiserror::Error;

/// Reasons a [`SimConfig`](crate::SimConfig) cannot drive a run.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("task count must be greater than zero")]
    NoTasks,
    #[error("{stage} delay range is inverted: min {min} > max {max}")]
    InvalidRange {
        stage: &'static str,
        min: u64,
        max: u64,
    },
    #[error("queue capacity must be greater than zero")]
    ZeroQueueCapacity,
    #[error("drain interval must be greater than zero")]
    ZeroDrainInterval,
    #[error("at least one fog node is required")]
    NoFogNodes,
    #[error("{name} must lie within [0, 1], got {value}")]
    ProbabilityOutOfRange { name: &'static str, value: f64 },
    #[error("{name} must be a finite, non-negative delay, got {value}")]
    InvalidDelay { name: &'static str, value: f64 },
    #[error("delay ranges are too large: {what} would overflow")]
    DelayOverflow { what: &'static str },
}
