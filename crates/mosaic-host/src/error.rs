use mosaic_core::CoreError;

/// Alias for `Result<T, HostError>`.
pub type HostResult<T> = Result<T, HostError>;

/// Errors raised while configuring or driving a host.
#[derive(Debug, thiserror::Error)]
pub enum HostError {
    /// A [`HostConfig`](crate::HostConfig) field is out of range.
    #[error("invalid host configuration: {0}")]
    InvalidConfig(String),

    /// A tick was given a negative or non-finite time step.
    #[error("time step must be finite and non-negative, got {0}")]
    InvalidTimeStep(f32),

    /// A core error surfaced while driving components.
    #[error(transparent)]
    Core(#[from] CoreError),
}
