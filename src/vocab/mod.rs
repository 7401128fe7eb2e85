mod checksum;
mod extra;
mod marker;
mod package_name;
mod requirement;
mod specifier;
mod version;

// All this stuff is also re-exported from crate::prelude::*

pub use self::checksum::{Checksum, ChecksumAlgorithm};
pub use self::extra::Extra;
pub use self::marker::Marker;
pub use self::package_name::PackageName;
pub use self::requirement::Requirement;
pub use self::specifier::{CompareOp, Specifier, Specifiers};
pub use self::version::Version;
