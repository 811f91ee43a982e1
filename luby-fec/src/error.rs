use thiserror::Error;

/// Result alias used across the codec.
pub type Result<T, E = Error> = core::result::Result<T, E>;

/// Errors produced by the codec and its pipeline.
#[derive(Debug, Error)]
pub enum Error {
    /// A caller-supplied value is out of range.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    /// A degree outside `1..=k` reached the distribution. Indicates a logic bug.
    #[error("degree {index} outside distribution domain 1..={k}")]
    Domain {
        /// Requested degree.
        index: usize,
        /// Number of source blocks.
        k: usize,
    },
    /// The ripple emptied before every source block was recovered.
    #[error("decode failure: ripple stalled with {resolved}/{k} source blocks resolved")]
    DecodeFailure {
        /// Blocks recovered before the stall.
        resolved: usize,
        /// Number of source blocks.
        k: usize,
    },
    /// The consumer could not collect its quota.
    #[error("pipeline stall: {0}")]
    PipelineStall(String),
    /// The other side of the pipeline went away, or the run was cancelled.
    #[error("interrupted: {0}")]
    Interrupted(String),
    /// A symbol frame or batch entry could not be accepted.
    #[error("malformed symbol: {0}")]
    Malformed(String),
    /// Invalid configuration value.
    #[error("config: {0}")]
    Config(String),
    /// Filesystem error while reading or writing configuration.
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Shorthand for [`Error::InvalidArgument`].
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }
    /// Shorthand for [`Error::Config`].
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
    /// Shorthand for [`Error::Malformed`].
    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::Malformed(msg.into())
    }

    /// Whether running again with a fresh batch or pipeline can succeed.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::DecodeFailure { .. } | Self::PipelineStall(_) | Self::Interrupted(_)
        )
    }
}
