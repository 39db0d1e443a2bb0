use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum GlitchError {
    #[error("missing value after {0}")]
    MissingValue(String),

    #[error("invalid seed {value:?}: {source}")]
    InvalidSeed {
        value: String,
        source: std::num::ParseIntError,
    },

    #[error("unknown argument: {0}")]
    UnknownArgument(String),

    #[error("failed to install signal handler: {0}")]
    Signal(#[from] ctrlc::Error),

    #[error(transparent)]
    Io(#[from] io::Error),
}

impl GlitchError {
    /// Errors caused by the command line rather than the environment.
    pub fn is_usage(&self) -> bool {
        matches!(
            self,
            Self::MissingValue(_) | Self::InvalidSeed { .. } | Self::UnknownArgument(_)
        )
    }
}
