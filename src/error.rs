use thiserror::Error;

/// Application-level error: a message plus the process exit code.
///
/// Exit codes:
/// - `2`: usage, configuration, or local IO problems
/// - `3`: statistical failure (nothing could be fitted, unresolved stationarity)
/// - `4`: upstream data failure (network, malformed payload, missing rows)
#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}

/// Errors raised by the numerical core (tests, fitting, forecasting).
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StatsError {
    /// Not enough observations for the requested operation.
    #[error("insufficient data: need at least {needed}, got {got}")]
    InsufficientData { needed: usize, got: usize },

    /// A parameter is out of its valid range.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// Input series violates the time-series invariants.
    #[error("invalid series: {0}")]
    InvalidSeries(String),

    /// A linear system could not be solved.
    #[error("singular system: {0}")]
    Singular(String),

    /// The optimizer stopped without a usable optimum.
    #[error("optimizer did not converge: {0}")]
    NonConvergence(String),
}

pub type StatsResult<T> = std::result::Result<T, StatsError>;

impl From<StatsError> for AppError {
    fn from(err: StatsError) -> Self {
        AppError::new(3, err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stats_errors_map_to_exit_code_three() {
        let err: AppError = StatsError::InsufficientData { needed: 10, got: 3 }.into();
        assert_eq!(err.exit_code(), 3);
        assert_eq!(err.to_string(), "insufficient data: need at least 10, got 3");
    }
}
