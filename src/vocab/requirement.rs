use crate::prelude::*;
use std::hash::{Hash, Hasher};

/// A single dependency requirement: name, optional extras, version
/// constraints, optional environment marker.
///
/// We don't swallow the whole PEP 508 grammar here -- markers are opaque
/// text (see [`Marker`]), and URL requirements aren't a thing on the indexes
/// we talk to. What's left is `name[extras] (specifiers); marker`, which a
/// couple of splits handle.
///
/// Two requirements are equal iff their canonical string forms match, so
/// they behave in a `HashSet` the way resolution needs them to.
#[derive(Debug, Clone, SerializeDisplay, DeserializeFromStr)]
pub struct Requirement {
    pub name: PackageName,
    pub extras: Vec<Extra>,
    pub specifiers: Specifiers,
    pub marker: Option<Marker>,
}

impl Requirement {
    pub fn parse(input: &str) -> Result<Requirement> {
        parse_requirement(input)
            .with_context(|| format!("failed parsing requirement string {:?}", input))
    }

    /// Parse both modern and "legacy" requirement styles.
    ///
    /// Old wheels and PyPI's JSON API append the extra gate at the end of the
    /// environment marker, e.g.:
    ///
    /// ```text
    /// PySocks (!=1.5.7,>=1.5.6); extra == 'socks'
    /// ```
    ///
    /// Warehouse and bdist_wheel always put that clause last and always use
    /// `==`, so a naive pattern match is enough to strip it back out. If the
    /// pattern doesn't match, the requirement is returned untouched with no
    /// extra -- that's a normal marker-only requirement, not an error.
    pub fn parse_with_extra(input: &str) -> Result<(Requirement, Option<Extra>)> {
        static EXTRA_RE: Lazy<Regex> = Lazy::new(|| {
            Regex::new(
                r#"^(?P<requirement>.+?)(?:extra[[:space:]]*==[[:space:]]*['"](?P<extra>.+?)['"])$"#,
            )
            .unwrap()
        });

        let requirement = Requirement::parse(input)?;
        // Short circuit to favour the common case.
        if requirement.marker.is_none() {
            return Ok((requirement, None));
        }
        let captures = match EXTRA_RE.captures(input) {
            Some(captures) => captures,
            None => return Ok((requirement, None)),
        };
        let extra: Extra = match captures.name("extra") {
            Some(m) if !m.as_str().is_empty() => m.as_str().parse()?,
            _ => return Ok((requirement, None)),
        };
        let mut rest = captures["requirement"].trim_end();
        if let Some(stripped) = rest.strip_suffix("and") {
            rest = stripped.trim_end();
        }
        if let Some(stripped) = rest.strip_suffix(';') {
            rest = stripped.trim_end();
        }
        Ok((Requirement::parse(rest)?, Some(extra)))
    }
}

fn parse_requirement(input: &str) -> Result<Requirement> {
    // Markers are quoted strings that may contain ';', but requirement
    // names/extras/specifiers never are, so split at the first one.
    let (requirement_part, marker_part) = match input.split_once(';') {
        Some((left, right)) => (left.trim(), Some(right.trim())),
        None => (input.trim(), None),
    };
    if requirement_part.is_empty() {
        bail!("no package name");
    }

    let marker = match marker_part {
        Some(text) => Some(text.try_into()?),
        None => None,
    };

    // The name runs up to the first '[', whitespace, or comparison operator.
    let name_end = requirement_part
        .char_indices()
        .find(|(_, c)| {
            *c == '[' || c.is_whitespace() || matches!(c, '<' | '>' | '=' | '!' | '~' | '(')
        })
        .map(|(idx, _)| idx)
        .unwrap_or(requirement_part.len());
    let name: PackageName = requirement_part[..name_end].try_into()?;
    let mut rest = requirement_part[name_end..].trim_start();

    let mut extras = Vec::new();
    if let Some(after_bracket) = rest.strip_prefix('[') {
        let close = after_bracket
            .find(']')
            .ok_or_else(|| anyhow!("unterminated extras list"))?;
        for extra in after_bracket[..close].split(',') {
            let extra = extra.trim();
            if !extra.is_empty() {
                extras.push(extra.try_into()?);
            }
        }
        rest = after_bracket[close + 1..].trim_start();
    }

    let specifiers: Specifiers = rest.try_into()?;

    Ok(Requirement {
        name,
        extras,
        specifiers,
        marker,
    })
}

try_from_str_boilerplate!(Requirement);

impl TryFrom<&str> for Requirement {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Requirement::parse(value)
    }
}

impl Display for Requirement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name.as_given())?;
        if !self.extras.is_empty() {
            write!(f, "[")?;
            let mut first = true;
            for extra in &self.extras {
                if !first {
                    write!(f, ",")?;
                }
                first = false;
                write!(f, "{}", extra.as_given())?;
            }
            write!(f, "]")?;
        }
        if !self.specifiers.0.is_empty() {
            write!(f, " {}", self.specifiers)?;
        }
        if let Some(marker) = &self.marker {
            write!(f, "; {}", marker)?;
        }
        Ok(())
    }
}

impl PartialEq for Requirement {
    fn eq(&self, other: &Self) -> bool {
        self.to_string() == other.to_string()
    }
}

impl Eq for Requirement {}

impl Hash for Requirement {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.to_string().hash(state)
    }
}
