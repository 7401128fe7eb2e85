use crate::prelude::*;
use crate::store::MetadataEntry;

/// The declared dependencies of one distribution, split into the
/// unconditional `base` set and per-extra subsets.
///
/// Built once from an artifact's metadata and immutable afterwards;
/// [`get_dependencies`](Self::get_dependencies) only ever produces new sets.
/// An empty specification can mean either "verified zero dependencies" or
/// "no dependency information was available" -- the caller that produced it
/// knows which (see `IndexServer::get_dependencies`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequirementSpecification {
    base: HashSet<Requirement>,
    extras: HashMap<Extra, HashSet<Requirement>>,
}

impl RequirementSpecification {
    pub fn empty() -> RequirementSpecification {
        Default::default()
    }

    pub fn is_empty(&self) -> bool {
        self.base.is_empty() && self.extras.is_empty()
    }

    pub fn base(&self) -> &HashSet<Requirement> {
        &self.base
    }

    pub fn extra_names(&self) -> impl Iterator<Item = &Extra> {
        self.extras.keys()
    }

    /// Build from structured metadata entries (a wheel's `run_requires`).
    ///
    /// Each entry's `environment` fragment is ANDed onto markers the
    /// requirement strings already carry. When both the entry and a parsed
    /// requirement name an extra, the entry-level one wins -- that matches
    /// the data we've seen in the wild, where the two never actually
    /// disagree.
    pub fn from_metadata_entries(entries: &[MetadataEntry]) -> Result<RequirementSpecification> {
        let mut spec = RequirementSpecification::empty();
        for entry in entries {
            let environment = match &entry.environment {
                Some(text) if !text.trim().is_empty() => Some(Marker::try_from(&**text)?),
                _ => None,
            };
            let entry_extra = match &entry.extra {
                Some(name) => Some(Extra::try_from(&**name)?),
                None => None,
            };
            for raw in &entry.requires {
                let (mut requirement, requirement_extra) = Requirement::parse_with_extra(raw)?;
                if let Some(environment) = &environment {
                    requirement.marker = Some(match &requirement.marker {
                        Some(own) => Marker::and(environment, own),
                        None => environment.clone(),
                    });
                }
                spec.add(requirement, entry_extra.clone().or(requirement_extra));
            }
        }
        Ok(spec)
    }

    /// Build from a flat list of requirement strings (a JSON API's
    /// `requires_dist`). No environment field here; routing is purely by
    /// each string's own recovered extra.
    pub fn from_plain_strings<S: AsRef<str>>(strings: &[S]) -> Result<RequirementSpecification> {
        let mut spec = RequirementSpecification::empty();
        for raw in strings {
            let (requirement, extra) = Requirement::parse_with_extra(raw.as_ref())?;
            spec.add(requirement, extra);
        }
        Ok(spec)
    }

    fn add(&mut self, requirement: Requirement, extra: Option<Extra>) {
        match extra {
            None => {
                self.base.insert(requirement);
            }
            Some(extra) => {
                self.extras.entry(extra).or_default().insert(requirement);
            }
        }
    }

    /// `base` plus the sets for each selected extra. Unknown extras are
    /// skipped with a diagnostic rather than failing the call.
    pub fn get_dependencies(&self, extras: &[Extra]) -> HashSet<Requirement> {
        let mut deps = self.base.clone();
        for extra in extras {
            match self.extras.get(extra) {
                Some(extra_deps) => deps.extend(extra_deps.iter().cloned()),
                None => warn!("dropping unknown extra {:?}", extra.as_given()),
            }
        }
        deps
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn entry(
        requires: &[&str],
        environment: Option<&str>,
        extra: Option<&str>,
    ) -> MetadataEntry {
        MetadataEntry {
            requires: requires.iter().map(|s| s.to_string()).collect(),
            environment: environment.map(String::from),
            extra: extra.map(String::from),
        }
    }

    fn req(s: &str) -> Requirement {
        Requirement::parse(s).unwrap()
    }

    #[test]
    fn test_plain_strings_routing() {
        let spec = RequirementSpecification::from_plain_strings(&[
            "idna (<2.8,>=2.5)",
            "PySocks (!=1.5.7,>=1.5.6); extra == 'socks'",
        ])
        .unwrap();
        assert_eq!(spec.base(), &[req("idna (<2.8,>=2.5)")].into_iter().collect());
        let socks: Extra = "socks".try_into().unwrap();
        assert_eq!(
            spec.get_dependencies(&[socks]),
            [req("idna (<2.8,>=2.5)"), req("PySocks (!=1.5.7,>=1.5.6)")]
                .into_iter()
                .collect()
        );
    }

    #[test]
    fn test_empty_selection_is_exactly_base() {
        let spec =
            RequirementSpecification::from_plain_strings(&["a", "b; extra == 'x'"]).unwrap();
        assert_eq!(spec.get_dependencies(&[]), *spec.base());
    }

    #[test]
    fn test_unknown_extra_is_skipped() {
        let spec = RequirementSpecification::from_plain_strings(&["a"]).unwrap();
        let nope: Extra = "nope".try_into().unwrap();
        assert_eq!(spec.get_dependencies(&[nope]), *spec.base());
    }

    #[test]
    fn test_environment_is_anded_onto_markers() {
        let spec = RequirementSpecification::from_metadata_entries(&[entry(
            &["foo", "bar; python_version < '3'"],
            Some("os_name == 'posix'"),
            None,
        )])
        .unwrap();
        assert_eq!(
            spec.base(),
            &[
                req("foo; os_name == 'posix'"),
                req("bar; (os_name == 'posix') and (python_version < '3')"),
            ]
            .into_iter()
            .collect()
        );
    }

    #[test]
    fn test_entry_extra_wins_over_recovered_extra() {
        let spec = RequirementSpecification::from_metadata_entries(&[entry(
            &["foo; extra == 'legacy'"],
            None,
            Some("declared"),
        )])
        .unwrap();
        let declared: Extra = "declared".try_into().unwrap();
        let legacy: Extra = "legacy".try_into().unwrap();
        assert_eq!(spec.get_dependencies(&[declared]).len(), 1);
        // the legacy name was shadowed, so selecting it adds nothing
        assert_eq!(spec.get_dependencies(&[legacy]), *spec.base());
        assert!(spec.base().is_empty());
    }

    #[test]
    fn test_recovered_extra_routes_when_entry_has_none() {
        let spec = RequirementSpecification::from_metadata_entries(&[entry(
            &["foo >= 1; extra == 'tls'"],
            None,
            None,
        )])
        .unwrap();
        let tls: Extra = "tls".try_into().unwrap();
        assert!(spec.base().is_empty());
        assert_eq!(
            spec.get_dependencies(&[tls]),
            [req("foo >= 1")].into_iter().collect()
        );
    }

    #[test]
    fn test_empty_spec() {
        let spec = RequirementSpecification::empty();
        assert!(spec.is_empty());
        assert!(spec.get_dependencies(&[]).is_empty());
    }
}
