//! Failures raised while running a console command.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::domain::endpoints::InputError;
use crate::domain::{ApiError, AuthValidationError, NormalizedError};

/// Anything that stops a command from completing.
#[derive(Debug, Error)]
pub enum CliError {
    /// The pipeline reported a failure.
    #[error(transparent)]
    Api(#[from] ApiError),
    /// Login or signup input was rejected before any request.
    #[error(transparent)]
    Auth(#[from] AuthValidationError),
    /// Endpoint input was rejected before any request.
    #[error(transparent)]
    Input(#[from] InputError),
    /// `--data` did not parse, or a result could not be rendered.
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    /// A binary request was made without a destination.
    #[error("--output is required for binary responses")]
    MissingOutput,
    /// A local file could not be read or written.
    #[error("{action} {}: {source}", .path.display())]
    File {
        /// What was being attempted.
        action: &'static str,
        /// File involved.
        path: PathBuf,
        /// Underlying failure.
        source: io::Error,
    },
}

impl CliError {
    pub(crate) fn file(action: &'static str, path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::File {
            action,
            path: path.into(),
            source,
        }
    }

    /// `{code, message}` pair printed on stderr.
    ///
    /// Pipeline failures keep their own code; local failures report `400`.
    pub fn normalized(&self) -> NormalizedError {
        match self {
            Self::Api(error) => error.normalized(),
            Self::Auth(_)
            | Self::Input(_)
            | Self::Json(_)
            | Self::MissingOutput
            | Self::File { .. } => NormalizedError {
                code: 400,
                message: self.to_string(),
            },
        }
    }
}
