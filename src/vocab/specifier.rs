use crate::prelude::*;

/// A single version constraint, like `>= 1.2`. The right-hand side is kept as
/// a string because `==` and `!=` accept wildcards (`== 1.1.*`), which are
/// not themselves valid versions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Specifier {
    pub op: CompareOp,
    pub value: String,
}

impl Specifier {
    pub fn satisfied_by(&self, version: &Version) -> Result<bool> {
        use CompareOp::*;

        if let Some(prefix) = self.value.strip_suffix(".*") {
            let base: Version = prefix.try_into()?;
            let matches = release_prefix_match(version, &base);
            return match self.op {
                Equal => Ok(matches),
                NotEqual => Ok(!matches),
                _ => bail!("can't use a version wildcard with operator {}", self.op),
            };
        }

        let rhs: Version = (&*self.value).try_into()?;
        Ok(match self.op {
            LessThanEqual => version <= &rhs,
            StrictlyLessThan => version < &rhs,
            NotEqual => version != &rhs,
            Equal => version == &rhs,
            GreaterThanEqual => version >= &rhs,
            StrictlyGreaterThan => version > &rhs,
            // ~= X.Y.suffixes means >= X.Y.suffixes plus == X.*
            Compatible => {
                if rhs.0.release.len() < 2 {
                    bail!("~= operator requires a version with two segments (X.Y)");
                }
                let mut series = rhs.clone();
                series.0.release.pop();
                series.0.pre = None;
                series.0.post = None;
                series.0.dev = None;
                series.0.local = vec![];
                version >= &rhs && release_prefix_match(version, &series)
            }
        })
    }
}

/// True iff `version`'s epoch matches and its release segments start with
/// `base`'s release segments (missing segments count as zero, so `1.1`
/// matches the prefix `1.1.0`).
fn release_prefix_match(version: &Version, base: &Version) -> bool {
    if version.0.epoch != base.0.epoch {
        return false;
    }
    base.0
        .release
        .iter()
        .enumerate()
        .all(|(i, segment)| version.0.release.get(i).copied().unwrap_or(0) == *segment)
}

impl Display for Specifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.op, self.value)
    }
}

/// A comma-separated conjunction of constraints. The empty set accepts any
/// version, which is also what an absent `data-requires-python` means.
#[derive(Debug, Clone, PartialEq, Eq, SerializeDisplay, DeserializeFromStr, Default)]
pub struct Specifiers(pub Vec<Specifier>);

impl Specifiers {
    pub fn any() -> Specifiers {
        Specifiers(vec![])
    }

    pub fn satisfied_by(&self, version: &Version) -> Result<bool> {
        for specifier in &self.0 {
            if !specifier.satisfied_by(version)? {
                return Ok(false);
            }
        }
        Ok(true)
    }
}

impl Display for Specifiers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut first = true;
        for spec in &self.0 {
            if !first {
                write!(f, ", ")?
            }
            first = false;
            write!(f, "{}", spec)?
        }
        Ok(())
    }
}

impl TryFrom<&str> for Specifiers {
    type Error = anyhow::Error;

    fn try_from(input: &str) -> Result<Self, Self::Error> {
        // PEP 345 allowed the whole constraint list to be parenthesized, and
        // old metadata still writes `foo (>=1, <2)`.
        let mut trimmed = input.trim();
        if let Some(inner) = trimmed
            .strip_prefix('(')
            .and_then(|rest| rest.strip_suffix(')'))
        {
            trimmed = inner.trim();
        }
        if trimmed.is_empty() {
            return Ok(Specifiers::any());
        }
        let mut specifiers = Vec::new();
        for clause in trimmed.split(',') {
            let clause = clause.trim();
            if clause.is_empty() {
                bail!("empty constraint in specifier list {:?}", input);
            }
            specifiers.push(parse_clause(clause).with_context(|| {
                format!("failed to parse version specifiers from {:?}", input)
            })?);
        }
        Ok(Specifiers(specifiers))
    }
}

fn parse_clause(clause: &str) -> Result<Specifier> {
    static OPS: &[(&str, CompareOp)] = &[
        // Two-character operators have to be tried first, or `>=` would
        // parse as `>` followed by a version starting with '='.
        ("~=", CompareOp::Compatible),
        ("==", CompareOp::Equal),
        ("!=", CompareOp::NotEqual),
        ("<=", CompareOp::LessThanEqual),
        (">=", CompareOp::GreaterThanEqual),
        ("<", CompareOp::StrictlyLessThan),
        (">", CompareOp::StrictlyGreaterThan),
    ];
    for (text, op) in OPS {
        if let Some(rest) = clause.strip_prefix(text) {
            let value = rest.trim();
            if value.is_empty() {
                bail!("operator {} has no version to compare against", text);
            }
            return Ok(Specifier {
                op: *op,
                value: value.to_owned(),
            });
        }
    }
    bail!("expected a comparison operator in {:?}", clause)
}

try_from_str_boilerplate!(Specifiers);

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum CompareOp {
    LessThanEqual,
    StrictlyLessThan,
    NotEqual,
    Equal,
    GreaterThanEqual,
    StrictlyGreaterThan,
    Compatible,
}

impl Display for CompareOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        use CompareOp::*;
        write!(
            f,
            "{}",
            match self {
                LessThanEqual => "<=",
                StrictlyLessThan => "<",
                NotEqual => "!=",
                Equal => "==",
                GreaterThanEqual => ">=",
                StrictlyGreaterThan => ">",
                Compatible => "~=",
            }
        )
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn check(spec: &str, version: &str) -> bool {
        let specs: Specifiers = spec.try_into().unwrap();
        let version: Version = version.try_into().unwrap();
        specs.satisfied_by(&version).unwrap()
    }

    #[test]
    fn test_specifiers_parse() {
        let specs: Specifiers = ">=1.2, <2".try_into().unwrap();
        assert_eq!(specs.0.len(), 2);
        assert_eq!(specs.0[0].op, CompareOp::GreaterThanEqual);
        assert_eq!(specs.0[0].value, "1.2");
        assert_eq!(specs.to_string(), ">= 1.2, < 2");
    }

    #[test]
    fn test_specifiers_parenthesized() {
        let specs: Specifiers = "(!=1.5.7,>=1.5.6)".try_into().unwrap();
        assert_eq!(specs.0.len(), 2);
        assert!(check("(!=1.5.7,>=1.5.6)", "1.5.6"));
        assert!(!check("(!=1.5.7,>=1.5.6)", "1.5.7"));
    }

    #[test]
    fn test_specifiers_empty_accepts_any() {
        assert!(check("", "0.0.1"));
        assert!(Specifiers::any().satisfied_by(&"42".try_into().unwrap()).unwrap());
    }

    #[test]
    fn test_comparisons() {
        assert!(check(">= 1.2", "1.2"));
        assert!(check(">= 1.2", "1.3"));
        assert!(!check("> 1.2", "1.2"));
        assert!(check("< 2", "1.9"));
        assert!(!check("<= 2", "2.0.1"));
        assert!(check("== 1.0", "1.0.0"));
        assert!(!check("!= 1.0", "1.0"));
    }

    #[test]
    fn test_wildcards() {
        assert!(check("== 1.1.*", "1.1.3"));
        assert!(check("== 1.1.*", "1.1"));
        assert!(!check("== 1.1.*", "1.2.0"));
        assert!(!check("!= 1.1.*", "1.1.9"));
        assert!(check("!= 1.1.*", "1.2"));

        let specs: Specifiers = ">= 1.1.*".try_into().unwrap();
        assert!(specs.satisfied_by(&"1.1".try_into().unwrap()).is_err());
    }

    #[test]
    fn test_compatible_release() {
        assert!(check("~= 2.2", "2.2"));
        assert!(check("~= 2.2", "2.9"));
        assert!(!check("~= 2.2", "3.0"));
        assert!(!check("~= 2.2", "2.1"));
        assert!(check("~= 1.4.5", "1.4.9"));
        assert!(!check("~= 1.4.5", "1.5.0"));

        let specs: Specifiers = "~= 2".try_into().unwrap();
        assert!(specs.satisfied_by(&"2.1".try_into().unwrap()).is_err());
    }

    #[test]
    fn test_malformed() {
        assert!(Specifiers::try_from("1.2").is_err());
        assert!(Specifiers::try_from(">=").is_err());
        assert!(Specifiers::try_from(">= 1.2,,< 2").is_err());
    }
}
