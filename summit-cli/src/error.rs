//! Error types emitted by the summit CLI.
//!
//! Keep this error type reasonably small, as many CLI helpers return
//! `Result<_, CliError>` and the workspace enables `clippy::result_large_err`.

use std::sync::Arc;

use camino::Utf8PathBuf;
use summit_core::ConfigurationError;
use summit_data::SnapshotError;
use summit_data::pageviews::PageviewSourceBuildError;
use summit_scorer::PipelineError;
use thiserror::Error;

/// Errors emitted by the summit CLI.
#[derive(Debug, Error)]
pub enum CliError {
    /// Provided arguments failed Clap validation.
    #[error(transparent)]
    ArgumentParsing(#[from] clap::Error),
    /// Configuration layering failed (files, env, CLI).
    #[error("failed to load configuration: {0}")]
    Configuration(#[from] Arc<ortho_config::OrthoError>),
    /// A required option is missing after configuration merging.
    #[error("missing {field} (set --{field} or {env})")]
    MissingArgument {
        /// Command-line flag name.
        field: &'static str,
        /// Environment variable that can supply the value.
        env: &'static str,
    },
    /// A referenced input path does not exist on disk.
    #[error("{field} path {path:?} does not exist")]
    MissingSourceFile {
        /// Command-line flag name.
        field: &'static str,
        /// Offending path.
        path: Utf8PathBuf,
    },
    /// A referenced path exists but is not a regular file.
    #[error("{field} path {path:?} exists but is not a file")]
    SourcePathNotFile {
        /// Command-line flag name.
        field: &'static str,
        /// Offending path.
        path: Utf8PathBuf,
    },
    /// A referenced path could not be inspected due to an IO error.
    #[error("failed to inspect {field} path {path:?}: {source}")]
    InspectSourcePath {
        /// Command-line flag name.
        field: &'static str,
        /// Offending path.
        path: Utf8PathBuf,
        /// Underlying IO failure.
        #[source]
        source: std::io::Error,
    },
    /// Reading the scoring configuration file failed.
    #[error("failed to read scoring configuration at {path:?}: {source}")]
    ReadScoringConfig {
        /// Configuration path.
        path: Utf8PathBuf,
        /// Underlying IO failure.
        #[source]
        source: std::io::Error,
    },
    /// The scoring configuration is not valid JSON for a stress run.
    #[error("failed to parse scoring configuration at {path:?}: {source}")]
    ParseScoringConfig {
        /// Configuration path.
        path: Utf8PathBuf,
        /// Decoder failure.
        #[source]
        source: serde_json::Error,
    },
    /// The merged scoring configuration was rejected.
    #[error("invalid scoring configuration: {0}")]
    InvalidConfiguration(#[from] ConfigurationError),
    /// Reading or writing a snapshot failed.
    #[error(transparent)]
    Snapshot(#[from] SnapshotError),
    /// The page-view source could not be constructed.
    #[error("failed to build page-view source for {base_url}: {source}")]
    BuildPageviewSource {
        /// Base URL supplied for the page-view API.
        base_url: String,
        /// Construction failure.
        #[source]
        source: PageviewSourceBuildError,
    },
    /// The stress run aborted.
    #[error("stress run failed: {0}")]
    Pipeline(#[from] PipelineError),
    /// The run summary could not be serialised.
    #[error("failed to serialise run summary: {0}")]
    SerialiseSummary(#[source] serde_json::Error),
    /// Writing the run summary failed.
    #[error("failed to write run summary: {0}")]
    WriteSummary(#[source] std::io::Error),
}
