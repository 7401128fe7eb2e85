use crate::links::Link;
use crate::prelude::*;
use auto_impl::auto_impl;
use std::path::{Path, PathBuf};

/// Cache policy for materializing an artifact.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum CacheMode {
    /// Use a cached copy if there is one, hit the network otherwise.
    Default,
    /// Never touch the network; a cache miss means
    /// [`ResolveError::ArtifactUnavailable`](crate::ResolveError).
    OnlyIfCached,
}

/// The on-disk artifact store and sdist builder. We only ever ask it
/// questions; downloading, unpacking and building wheels from source all
/// happen on the other side of this seam.
///
/// Implementations are expected to verify downloaded bytes with
/// [`Link::check_download`] before committing them to disk.
#[auto_impl(&, Box, Arc)]
pub trait ArtifactStore: Send + Sync {
    /// A previously downloaded (or previously built, for source links) wheel
    /// for this link, if the store has one.
    fn lookup_cached(&self, link: &Link) -> Result<Option<PathBuf>>;

    /// Download the artifact the link points at, returning its local path.
    fn download(&self, link: &Link) -> Result<PathBuf>;

    /// Build a wheel from the source archive the link points at.
    fn build_from_source(&self, link: &Link) -> Result<PathBuf>;
}

/// One `run_requires`-style entry from an artifact's metadata: some raw
/// requirement strings, optionally gated on an environment marker fragment
/// and/or an extra name.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct MetadataEntry {
    pub requires: Vec<String>,
    #[serde(default)]
    pub environment: Option<String>,
    #[serde(default)]
    pub extra: Option<String>,
}

/// Reads dependency metadata out of a materialized wheel. The actual zip
/// plumbing and METADATA parsing live elsewhere; we only consume the result.
#[auto_impl(&, Box, Arc)]
pub trait MetadataReader: Send + Sync {
    fn dependency_entries(&self, artifact: &Path) -> Result<Vec<MetadataEntry>>;

    /// The artifact's own idea of what it is, from its metadata rather than
    /// its filename.
    fn name_and_version(&self, artifact: &Path) -> Result<(PackageName, Version)>;
}
