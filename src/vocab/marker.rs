use crate::prelude::*;

/// An environment marker, like `python_version >= "3.8"`.
///
/// Whether a marker holds for some environment is somebody else's problem:
/// we never evaluate markers, we only carry them through dependency
/// metadata and combine them. So this is just marker *text*, with
/// whitespace collapsed so that two spellings of the same marker compare
/// equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, SerializeDisplay, DeserializeFromStr)]
pub struct Marker(String);

impl Marker {
    pub fn text(&self) -> &str {
        &self.0
    }

    /// The conjunction of two markers, `(a) and (b)`. Used when a metadata
    /// entry's `environment` field has to be merged with a marker the
    /// requirement string already carried.
    pub fn and(lhs: &Marker, rhs: &Marker) -> Marker {
        Marker(format!("({}) and ({})", lhs.0, rhs.0))
    }
}

impl TryFrom<&str> for Marker {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let collapsed = value.split_whitespace().collect::<Vec<_>>().join(" ");
        if collapsed.is_empty() {
            bail!("empty environment marker");
        }
        Ok(Marker(collapsed))
    }
}

try_from_str_boilerplate!(Marker);

impl Display for Marker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_marker_collapses_whitespace() {
        let a: Marker = "python_version  >=   '3'".try_into().unwrap();
        let b: Marker = "python_version >= '3'".try_into().unwrap();
        assert_eq!(a, b);
        assert_eq!(a.text(), "python_version >= '3'");
    }

    #[test]
    fn test_marker_and() {
        let env: Marker = "os_name == 'posix'".try_into().unwrap();
        let own: Marker = "python_version < '3'".try_into().unwrap();
        assert_eq!(
            Marker::and(&env, &own).text(),
            "(os_name == 'posix') and (python_version < '3')"
        );
    }

    #[test]
    fn test_marker_rejects_empty() {
        assert!(Marker::try_from("   ").is_err());
    }
}
