use super::cache::PageCache;
use super::page::parse_index_page;
use crate::error::ResolveError;
use crate::links::{Link, LinkInfo};
use crate::net::Transport;
use crate::platform::TargetEnv;
use crate::prelude::*;
use crate::reqspec::RequirementSpecification;
use crate::store::{ArtifactStore, CacheMode, MetadataReader};
use std::sync::Arc;

/// One concrete release of a package, picked out of the index's listing.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Candidate {
    pub name: PackageName,
    pub version: Version,
}

impl Display for Candidate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.name.as_given(), self.version)
    }
}

/// A client for one simple index, with a bounded cache of parsed project
/// pages. Queries from any number of threads share the one cache; see
/// [`PageCache`] for the concurrency story.
pub struct IndexServer<T: Transport> {
    base_url: Url,
    transport: T,
    env: TargetEnv,
    store: Box<dyn ArtifactStore>,
    metadata: Box<dyn MetadataReader>,
    cache: PageCache,
}

impl<T: Transport> IndexServer<T> {
    pub fn new(
        mut base_url: Url,
        transport: T,
        env: TargetEnv,
        store: Box<dyn ArtifactStore>,
        metadata: Box<dyn MetadataReader>,
    ) -> IndexServer<T> {
        // The index root is a directory, but `Url::join` only treats it as
        // one if the path ends in '/': joining "pkg/" onto ".../simple"
        // would silently replace the last segment.
        if !base_url.path().ends_with('/') {
            base_url.set_path(&format!("{}/", base_url.path()));
        }
        IndexServer {
            base_url,
            transport,
            env,
            store,
            metadata,
            cache: PageCache::default(),
        }
    }

    pub fn with_cache_capacity(mut self, capacity: usize) -> IndexServer<T> {
        self.cache = PageCache::new(capacity);
        self
    }

    /// Every artifact link the index lists for this package, in page order.
    ///
    /// The first query per package fetches and parses the project page;
    /// after that it's served from the cache. Concurrent first queries for
    /// one package collapse into a single fetch.
    pub fn get_links(&self, package: &PackageName) -> Result<Arc<Vec<Link>>> {
        self.cache
            .get_or_fetch(package, || self.fetch_links(package))
    }

    fn fetch_links(&self, package: &PackageName) -> Result<Vec<Link>> {
        let url = self
            .base_url
            .join(&format!("{}/", package.normalized()))
            .with_context(|| format!("bad project url for {}", package.as_given()))?;
        debug!("fetching {}", url);
        let response = self.transport.fetch(&url)?;
        if response.status == 404 {
            return Err(ResolveError::PackageNotFound {
                package: package.clone(),
            }
            .into());
        }
        if !response.is_success() {
            return Err(ResolveError::IndexApi {
                status: response.status,
                reason: format!("fetching {}", url),
            }
            .into());
        }
        // Relative links resolve against wherever we actually ended up.
        parse_index_page(&response.url, &response.body)
    }

    /// Links for one exact release, sorted so that the best choice is last:
    /// binary-incompatible wheels, then source archives, then compatible
    /// wheels. (The numeric key is a deliberate port of long-standing
    /// behavior; callers that want "best first" can iterate in reverse.)
    pub fn get_candidate_links(&self, candidate: &Candidate) -> Result<Vec<Link>> {
        let links = self.get_links(&candidate.name)?;
        let mut matching: Vec<Link> = links
            .iter()
            .filter(|link| link.info().version() == &candidate.version)
            .cloned()
            .collect();
        matching.sort_by_key(|link| self.compatibility_key(link));
        Ok(matching)
    }

    fn compatibility_key(&self, link: &Link) -> i8 {
        match link.info() {
            LinkInfo::Source(_) => 0,
            LinkInfo::Binary(_) => {
                if link.is_binary_compatible(&self.env.tags) {
                    1
                } else {
                    -1
                }
            }
        }
    }

    /// Discover the dependency specification for a candidate by
    /// materializing the first usable artifact and reading its metadata.
    ///
    /// With `offline` set, only locally cached artifacts are considered.
    /// If no link can be materialized this returns an *empty* specification
    /// after logging a diagnostic -- "no dependency information available",
    /// which is not the same claim as "verified zero dependencies".
    pub fn get_dependencies(
        &self,
        candidate: &Candidate,
        offline: bool,
    ) -> Result<RequirementSpecification> {
        let mode = if offline {
            CacheMode::OnlyIfCached
        } else {
            CacheMode::Default
        };
        for link in self.get_candidate_links(candidate)? {
            match link.materialize(&self.store, mode) {
                Ok(path) => {
                    let entries = self.metadata.dependency_entries(&path)?;
                    return RequirementSpecification::from_metadata_entries(&entries);
                }
                Err(err) => match err.downcast_ref::<ResolveError>() {
                    Some(resolve_err) if resolve_err.is_per_artifact() => {
                        warn!("skipping {}: {}", link.filename(), resolve_err);
                        continue;
                    }
                    _ => return Err(err),
                },
            }
        }
        warn!("found no dependency information for {}", candidate);
        Ok(RequirementSpecification::empty())
    }
}
