mod error;
mod index;
mod links;
mod net;
mod platform;
mod prelude;
mod reqspec;
mod store;
mod util;
mod vocab;

pub use crate::error::ResolveError;
pub use crate::index::{parse_index_page, Candidate, IndexServer};
pub use crate::links::{BinaryInfo, Link, LinkInfo, SourceInfo};
pub use crate::net::{FetchResponse, Transport, UreqTransport};
pub use crate::platform::{Tag, TargetEnv};
pub use crate::reqspec::RequirementSpecification;
pub use crate::store::{ArtifactStore, CacheMode, MetadataEntry, MetadataReader};
pub use crate::vocab::*;
