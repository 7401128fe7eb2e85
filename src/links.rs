use crate::error::ResolveError;
use crate::platform::Tag;
use crate::prelude::*;
use crate::store::{ArtifactStore, CacheMode};
use std::path::PathBuf;

/// The extensions we know how to interpret, in match priority order.
/// `.tar.gz` has to be matched as a unit, which is why this is a suffix
/// table and not a call to `Path::extension`.
static WANTED_EXTENSIONS: &[(&str, LinkKind)] = &[
    (".whl", LinkKind::Binary),
    (".tar.gz", LinkKind::Source),
    (".tar.bz2", LinkKind::Source),
    (".zip", LinkKind::Source),
];

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum LinkKind {
    Source,
    Binary,
}

/// Filename-derived metadata for a source archive: `pkg-1.0.tar.gz`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceInfo {
    pub distribution: PackageName,
    pub version: Version,
}

/// Filename-derived metadata for a wheel, per PEP 427's file name
/// convention: `pkg-1.0[-build]-interpreter-abi-platform.whl`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinaryInfo {
    pub distribution: PackageName,
    pub version: Version,
    pub build_tag: Option<u32>,
    pub interpreter_tag: String,
    pub abi_tag: String,
    pub platform_tag: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkInfo {
    Source(SourceInfo),
    Binary(BinaryInfo),
}

impl LinkInfo {
    pub fn distribution(&self) -> &PackageName {
        match self {
            LinkInfo::Source(info) => &info.distribution,
            LinkInfo::Binary(info) => &info.distribution,
        }
    }

    pub fn version(&self) -> &Version {
        match self {
            LinkInfo::Source(info) => &info.version,
            LinkInfo::Binary(info) => &info.version,
        }
    }
}

/// One downloadable artifact, as discovered on a simple API page.
///
/// Immutable once constructed: the filename is decomposed exactly once, and
/// a `Link` whose filename doesn't decompose is never constructed at all.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Link {
    url: Url,
    checksum: Option<Checksum>,
    file_stem: String,
    file_extension: &'static str,
    requires_python: Specifiers,
    info: LinkInfo,
}

impl Link {
    /// Classify and parse a link by its URL.
    ///
    /// `Ok(None)` means the filename has an extension we don't want (an
    /// `.asc` signature, a directory link, ...) -- not an error, the caller
    /// just skips it. `Err` means the extension was recognized but the stem
    /// is malformed, which is worth a diagnostic.
    ///
    /// Any `#fragment` on the URL is consumed as the expected checksum.
    pub fn from_url(mut url: Url, requires_python: Specifiers) -> Result<Option<Link>> {
        let checksum = match url.fragment() {
            None | Some("") => None,
            Some(fragment) => match fragment.try_into() {
                Ok(checksum) => Some(checksum),
                Err(err) => {
                    // Old indexes carry md5 fragments; treat anything we
                    // can't verify as if no checksum were declared.
                    warn!("ignoring checksum fragment on {}: {}", url, err);
                    None
                }
            },
        };
        url.set_fragment(None);

        let filename = url
            .path_segments()
            .and_then(|segments| segments.last())
            .unwrap_or_default()
            .to_owned();

        let (stem, extension, kind) = match classify_filename(&filename) {
            Some(parts) => parts,
            None => return Ok(None),
        };

        let info = match kind {
            LinkKind::Source => parse_source_stem(stem)?,
            LinkKind::Binary => parse_binary_stem(stem)?,
        };

        Ok(Some(Link {
            url,
            checksum,
            file_stem: stem.to_owned(),
            file_extension: extension,
            requires_python,
            info,
        }))
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn checksum(&self) -> Option<&Checksum> {
        self.checksum.as_ref()
    }

    pub fn requires_python(&self) -> &Specifiers {
        &self.requires_python
    }

    pub fn info(&self) -> &LinkInfo {
        &self.info
    }

    pub fn filename(&self) -> String {
        format!("{}{}", self.file_stem, self.file_extension)
    }

    /// Check downloaded bytes against the link's declared checksum. A link
    /// without a checksum accepts anything.
    pub fn check_download(&self, data: &[u8]) -> Result<()> {
        match &self.checksum {
            Some(checksum) => checksum.verify(data),
            None => Ok(()),
        }
    }

    /// Whether this wheel can run on the target environment: true iff its
    /// tag triple is an exact member of the supported set. Source archives
    /// are never binary-compatible (they aren't binaries).
    pub fn is_binary_compatible(&self, supported: &HashSet<Tag>) -> bool {
        match &self.info {
            LinkInfo::Binary(info) => supported.contains(&Tag::new(
                &info.interpreter_tag,
                &info.abi_tag,
                &info.platform_tag,
            )),
            LinkInfo::Source(_) => false,
        }
    }

    /// Check the link's `data-requires-python` constraint against a target
    /// Python version. No target means no filtering.
    pub fn is_python_compatible(&self, python_version: Option<&Version>) -> Result<bool> {
        match python_version {
            Some(version) => version.satisfies(&self.requires_python),
            None => Ok(true),
        }
    }

    /// Turn this link into a usable wheel on disk.
    ///
    /// Binary links are looked up in the store's cache and downloaded on a
    /// miss; source links are looked up in the built-wheel cache and built
    /// on a miss. Under [`CacheMode::OnlyIfCached`] a miss fails with
    /// [`ResolveError::ArtifactUnavailable`] instead of touching the
    /// network.
    pub fn materialize(&self, store: &dyn ArtifactStore, mode: CacheMode) -> Result<PathBuf> {
        if let Some(path) = store.lookup_cached(self)? {
            return Ok(path);
        }
        if mode == CacheMode::OnlyIfCached {
            return Err(ResolveError::ArtifactUnavailable {
                filename: self.filename(),
            }
            .into());
        }
        match &self.info {
            LinkInfo::Binary(_) => store.download(self),
            LinkInfo::Source(_) => store.build_from_source(self),
        }
    }
}

fn classify_filename(filename: &str) -> Option<(&str, &'static str, LinkKind)> {
    for (extension, kind) in WANTED_EXTENSIONS {
        if let Some(stem) = filename.strip_suffix(extension) {
            if stem.is_empty() {
                return None;
            }
            return Some((stem, *extension, *kind));
        }
    }
    None
}

fn parse_source_stem(stem: &str) -> Result<LinkInfo> {
    let (name, version) = stem
        .rsplit_once('-')
        .ok_or_else(|| anyhow!("expected name-version in sdist filename {:?}", stem))?;
    Ok(LinkInfo::Source(SourceInfo {
        distribution: name.try_into()?,
        version: version.try_into()?,
    }))
}

fn parse_binary_stem(stem: &str) -> Result<LinkInfo> {
    let pieces: Vec<&str> = stem.split('-').collect();
    let (name, version, build_tag, tags) = match pieces.as_slice() {
        [name, version, interpreter, abi, platform] => {
            (name, version, None, (interpreter, abi, platform))
        }
        [name, version, build, interpreter, abi, platform] => {
            let build: u32 = build
                .parse()
                .with_context(|| format!("bad build tag {:?} in wheel filename", build))?;
            (name, version, Some(build), (interpreter, abi, platform))
        }
        _ => bail!(
            "expected 5 or 6 dash-separated fields in wheel filename, got {}",
            pieces.len()
        ),
    };
    Ok(LinkInfo::Binary(BinaryInfo {
        distribution: (*name).try_into()?,
        version: (*version).try_into()?,
        build_tag,
        interpreter_tag: (*tags.0).to_owned(),
        abi_tag: (*tags.1).to_owned(),
        platform_tag: (*tags.2).to_owned(),
    }))
}
