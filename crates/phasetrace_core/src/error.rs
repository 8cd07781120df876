use thiserror::Error;

/// Errors raised while constructing a trajectory, snapshot or color mapping.
///
/// These are all fatal at construction time. Numerical degeneracies during
/// playback (equilibrium points, empty fade scans) never surface here; they
/// are resolved with deterministic fallbacks instead.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("initial position has {got} coordinates but the system dimension is {expected}")]
    DimensionMismatch { expected: usize, got: usize },

    #[error("snapshot time domain [{start}, {end}] must contain t = 0")]
    TimeDomainExcludesZero { start: f64, end: f64 },

    #[error("invalid style: {0}")]
    InvalidStyle(String),

    #[error("invalid color literal {0:?}: expected #rrggbb")]
    InvalidColor(String),
}
