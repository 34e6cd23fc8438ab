use crate::{model::package::ImportPath, rewrite::RewriteMap};

/// Decides which packages of a vendoring run must not be copied.
#[derive(Debug, Clone)]
pub struct IgnoreRules {
    root: ImportPath,
    destination: ImportPath,
    prefixes: Vec<String>,
}

impl IgnoreRules {
    pub fn new(
        root: ImportPath,
        destination: ImportPath,
        prefixes: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        IgnoreRules {
            root,
            destination,
            prefixes: prefixes
                .into_iter()
                .map(Into::into)
                .filter(|prefix| !prefix.is_empty())
                .collect(),
        }
    }

    /// A package is ignored when it already has a destination assigned in
    /// this run, when it belongs to the root package's tree, or when it is
    /// external (see [`IgnoreRules::is_external`]).
    pub fn is_ignored(&self, reference: &ImportPath, assigned: &RewriteMap) -> bool {
        assigned.contains_key(reference)
            || reference.has_prefix(self.root.as_str())
            || self.is_external(reference)
    }

    /// External packages live under the destination or under a configured
    /// ignore prefix. They are neither copied nor traversed.
    pub fn is_external(&self, reference: &ImportPath) -> bool {
        reference.has_prefix(self.destination.as_str())
            || self
                .prefixes
                .iter()
                .any(|prefix| reference.has_prefix(prefix))
    }

    pub fn destination_for(&self, reference: &ImportPath) -> ImportPath {
        self.destination.join(reference)
    }
}
