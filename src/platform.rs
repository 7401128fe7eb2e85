use crate::prelude::*;

/// A PEP 425 compatibility tag triple, like `cp39-cp39-manylinux2014_x86_64`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, SerializeDisplay, DeserializeFromStr)]
pub struct Tag {
    pub interpreter: String,
    pub abi: String,
    pub platform: String,
}

impl Tag {
    pub fn new(interpreter: &str, abi: &str, platform: &str) -> Tag {
        Tag {
            interpreter: interpreter.into(),
            abi: abi.into(),
            platform: platform.into(),
        }
    }
}

impl TryFrom<&str> for Tag {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let mut pieces = value.split('-');
        match (pieces.next(), pieces.next(), pieces.next(), pieces.next()) {
            (Some(interpreter), Some(abi), Some(platform), None) => {
                Ok(Tag::new(interpreter, abi, platform))
            }
            _ => bail!("expected interpreter-abi-platform, got {:?}", value),
        }
    }
}

try_from_str_boilerplate!(Tag);

impl Display for Tag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}-{}", self.interpreter, self.abi, self.platform)
    }
}

/// The environment we're resolving *for*. This is caller-supplied state, not
/// probed from the running machine -- cross-environment resolution is the
/// whole point of keeping it explicit.
#[derive(Debug, Clone, Default)]
pub struct TargetEnv {
    /// Every tag triple the target interpreter can run. Wheels match by
    /// exact membership.
    pub tags: HashSet<Tag>,
    /// The target Python version, checked against links' `requires-python`.
    /// `None` skips that filter entirely.
    pub python_version: Option<Version>,
}

impl TargetEnv {
    pub fn new(tags: impl IntoIterator<Item = Tag>, python_version: Option<Version>) -> TargetEnv {
        TargetEnv {
            tags: tags.into_iter().collect(),
            python_version,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_tag_roundtrip() {
        let tag: Tag = "cp39-cp39-manylinux2014_x86_64".try_into().unwrap();
        assert_eq!(tag.interpreter, "cp39");
        assert_eq!(tag.abi, "cp39");
        assert_eq!(tag.platform, "manylinux2014_x86_64");
        assert_eq!(tag.to_string(), "cp39-cp39-manylinux2014_x86_64");
    }

    #[test]
    fn test_tag_malformed() {
        assert!(Tag::try_from("py3-none").is_err());
        assert!(Tag::try_from("a-b-c-d").is_err());
    }
}
