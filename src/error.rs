use thiserror::Error;

/// Failures of the simulation core.
///
/// The application layer carries these inside [`anyhow::Error`], so callers may recover the kind
/// with `downcast_ref::<SimulationError>()`.
#[derive(Debug, Error)]
pub enum SimulationError {
    /// Bad battery, array, grid or request parameters, rejected before any step runs.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Misaligned or unequal-length series.
    #[error("input mismatch: {0}")]
    InputMismatch(String),

    /// The weather provider returned no data for the requested location or range.
    #[error("upstream data unavailable: {0}")]
    UpstreamDataUnavailable(String),
}

impl SimulationError {
    pub fn invalid_configuration(message: impl Into<String>) -> Self {
        Self::InvalidConfiguration(message.into())
    }

    pub fn input_mismatch(message: impl Into<String>) -> Self {
        Self::InputMismatch(message.into())
    }

    pub fn upstream_data_unavailable(message: impl Into<String>) -> Self {
        Self::UpstreamDataUnavailable(message.into())
    }
}
