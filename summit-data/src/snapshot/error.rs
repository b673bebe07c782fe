//! Errors raised while reading or writing snapshot documents.

use camino::Utf8PathBuf;
use summit_core::ReferenceSystemError;
use thiserror::Error;

/// Errors produced by snapshot decoding and encoding.
///
/// Every variant is fatal: a snapshot that breaks its container contract
/// cannot be scored. Bad values inside an otherwise valid feature are not
/// reported here; they are logged and the value is dropped.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SnapshotError {
    /// Opening or reading the snapshot file failed.
    #[error("failed to read snapshot at {path}")]
    Read {
        /// Requested snapshot path.
        path: Utf8PathBuf,
        /// Source error from std I/O.
        #[source]
        source: std::io::Error,
    },
    /// Creating the output file or its parent directory failed.
    #[error("failed to write snapshot at {path}")]
    Write {
        /// Target snapshot path.
        path: Utf8PathBuf,
        /// Source error from std I/O.
        #[source]
        source: std::io::Error,
    },
    /// The document is not valid JSON or does not match the container shape.
    #[error("snapshot document is malformed")]
    Decode {
        /// Source error from `serde_json`.
        #[source]
        source: serde_json::Error,
    },
    /// Serialising the document failed.
    #[error("failed to serialise snapshot document")]
    Encode {
        /// Source error from `serde_json`.
        #[source]
        source: serde_json::Error,
    },
    /// The peaks layer is absent.
    #[error("snapshot has no `{layer}` layer")]
    MissingLayer {
        /// Name of the required layer.
        layer: &'static str,
    },
    /// A layer declares a reference system that cannot be used.
    #[error("layer `{layer}` declares an unusable reference system")]
    ReferenceSystem {
        /// Name of the offending layer.
        layer: String,
        /// Parse failure for the declared identifier.
        #[source]
        source: ReferenceSystemError,
    },
    /// A feature's geometry or identifier breaks the layer contract.
    #[error("feature {index} in layer `{layer}` is malformed: {reason}")]
    MalformedFeature {
        /// Name of the layer holding the feature.
        layer: String,
        /// Zero-based position of the feature in the layer.
        index: usize,
        /// What was wrong with it.
        reason: String,
    },
}
