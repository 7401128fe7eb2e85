// 'Extra' string format is not well specified. pkg_resources runs names
// through safe_extra (lowercase, runs of junk become '_'), while PEP 508
// says extras are "identifiers". In the metadata we consume they behave
// like package names, so we just reuse that normalization.

use crate::prelude::*;

#[derive(Debug, Clone, SerializeDisplay, DeserializeFromStr, Hash, PartialEq, Eq)]
pub struct Extra(PackageName);

impl Extra {
    pub fn as_given(&self) -> &str {
        self.0.as_given()
    }

    pub fn normalized(&self) -> &str {
        self.0.normalized()
    }
}

impl TryFrom<&str> for Extra {
    type Error = anyhow::Error;

    fn try_from(s: &str) -> Result<Self> {
        let p: PackageName = s.try_into()?;
        Ok(Extra(p))
    }
}

try_from_str_boilerplate!(Extra);

impl Display for Extra {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.as_given())
    }
}
