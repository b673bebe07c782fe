//! Errors that abort a stress run.

use summit_core::{ConfigurationError, ReferenceSystemError};
use thiserror::Error;

/// Fatal failures of [`StressPipeline::run`](crate::StressPipeline::run).
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PipelineError {
    /// Geometry could not be placed in a usable reference system.
    #[error(transparent)]
    ReferenceSystem(#[from] ReferenceSystemError),
    /// The scoring configuration is unusable.
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
}
