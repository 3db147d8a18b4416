//! Error types for configuration validation and simulation runs

/// Problems with the parameter document or a parameter realization.
///
/// Every variant is detected before a cohort cycle runs.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read parameter document: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse parameter document: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid parameter `{name}`: {reason}")]
    InvalidParameter { name: String, reason: String },

    #[error("invalid distribution for `{name}`: {reason}")]
    InvalidDistribution { name: String, reason: String },

    #[error("probability `{name}` = {value} is outside [0, 1]")]
    ProbabilityOutOfRange { name: String, value: f64 },

    #[error("outgoing probabilities from state {state} sum to {total} (> 1)")]
    RowOverflow { state: String, total: f64 },

    #[error("row for state {state} sums to {total}, expected 1")]
    RowSum { state: String, total: f64 },

    #[error("initial occupancy sums to {total}, expected 1")]
    InitialOccupancy { total: f64 },

    #[error("intervention for {disease} has no effect size (relative_risk_reduction or relative_risk)")]
    MissingEffect { disease: String },

    #[error("portfolio adjustment `{factor}` is missing")]
    MissingAdjustment { factor: &'static str },

    #[error("portfolio adjustment `{factor}` = {value} must be positive and finite")]
    InvalidAdjustment { factor: &'static str, value: f64 },

    #[error("disease {disease} is configured more than once")]
    DuplicateDisease { disease: String },

    #[error("portfolio contains no diseases")]
    EmptyPortfolio,
}

impl ConfigError {
    pub(crate) fn parameter(name: impl Into<String>, reason: impl Into<String>) -> Self {
        ConfigError::InvalidParameter {
            name: name.into(),
            reason: reason.into(),
        }
    }
}

/// Failures while running the deterministic model or the Monte Carlo loop
#[derive(Debug, thiserror::Error)]
pub enum SimulationError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("iteration {iteration}: sampled parameters for {disease} are invalid: {source}")]
    InvalidDraw {
        iteration: usize,
        disease: String,
        #[source]
        source: ConfigError,
    },

    #[error("run interrupted after {completed} iterations")]
    Interrupted { completed: usize },

    #[error("iteration count must be positive")]
    NoIterations,

    #[error("{requested} iterations requested; at most {max} are supported")]
    TooManyIterations { requested: usize, max: usize },
}
