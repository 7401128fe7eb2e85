use crate::prelude::*;
use thiserror::Error;

/// Failures that callers are expected to match on: everything else in this
/// crate travels as a plain `anyhow::Error`.
///
/// Parse-level anomalies (unrecognized extension, malformed filename stem,
/// unknown extra) deliberately do *not* appear here -- an index page
/// legitimately contains entries we don't care about, so those are absorbed
/// as omission-from-results with a logged diagnostic.
#[derive(Error, Debug, Clone)]
pub enum ResolveError {
    #[error("package {package} not found on index")]
    PackageNotFound { package: PackageName },
    #[error("index returned status {status}: {reason}")]
    IndexApi { status: u16, reason: String },
    #[error("checksum mismatch: expected {expected}, got {got}")]
    ChecksumMismatch { expected: String, got: String },
    #[error("no usable artifact for {filename} under the requested cache policy")]
    ArtifactUnavailable { filename: String },
}

impl ResolveError {
    /// True for failures where the caller should move on to the next
    /// candidate link instead of aborting resolution.
    pub fn is_per_artifact(&self) -> bool {
        matches!(
            self,
            ResolveError::ChecksumMismatch { .. } | ResolveError::ArtifactUnavailable { .. }
        )
    }
}
