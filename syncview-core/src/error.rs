//! Error types for the view engine.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ViewError {
    #[error("Unrecognized gesture kind '{0}'")]
    UnknownGestureKind(String),

    #[error("Unrecognized image version '{0}'")]
    UnknownVersion(String),

    #[error("Unrecognized display mode '{0}'")]
    UnknownDisplayMode(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("No surface registered under '{0}'")]
    UnknownSurface(String),

    #[error("Surface drawing failed: {0}")]
    Surface(String),
}
