use crate::prelude::*;
use std::cmp::Ordering;
use std::hash::{Hash, Hasher};

/// We lean on the 'pep440' crate for the heavy lifting part of representing
/// versions, but wrap it in our own type so we can control equality and
/// hashing: PEP 440 says `1.0` and `1.0.0` are the same version, so equality
/// goes through the semantic ordering, and hashing goes through the
/// normalized string.
#[derive(Clone, Debug, SerializeDisplay, DeserializeFromStr)]
pub struct Version(pub pep440::Version);

impl Version {
    pub fn satisfies(&self, specifiers: &Specifiers) -> Result<bool> {
        specifiers.satisfied_by(self)
    }
}

impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Version {}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.cmp(&other.0)
    }
}

impl Hash for Version {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.normalize().hash(state)
    }
}

impl TryFrom<&str> for Version {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        pep440::Version::parse(value)
            .map(Version)
            .ok_or_else(|| anyhow!("failed to parse PEP 440 version {:?}", value))
    }
}

try_from_str_boilerplate!(Version);

impl Display for Version {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
