//! Native backend discovery.

use parking_lot::RwLock;
use serde::Serialize;
use std::collections::HashMap;
use std::path::PathBuf;
use tracing::debug;

/// A logical search capability that may be served by a native executable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    FileSearch,
    ContentSearch,
}

impl Capability {
    pub const ALL: [Capability; 2] = [Capability::FileSearch, Capability::ContentSearch];

    /// Executable names probed in order. `fdfind` is the Debian name of `fd`.
    pub fn candidates(&self) -> &'static [&'static str] {
        match self {
            Capability::FileSearch => &["fd", "fdfind"],
            Capability::ContentSearch => &["rg"],
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Capability::FileSearch => "file_search",
            Capability::ContentSearch => "content_search",
        }
    }
}

/// Memoized map from capability to a resolved executable.
///
/// Absence is normal and never an error. Overrides win over probing and are
/// used to force the fallback path or to point at a specific binary.
#[derive(Debug, Default)]
pub struct CapabilityDetector {
    probed: RwLock<HashMap<Capability, Option<PathBuf>>>,
    overrides: HashMap<Capability, Option<PathBuf>>,
}

impl CapabilityDetector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pin a capability to `path`, or to "unavailable" with `None`.
    pub fn with_override(mut self, capability: Capability, path: Option<PathBuf>) -> Self {
        self.overrides.insert(capability, path);
        self
    }

    /// Detector that reports every capability as unavailable.
    pub fn fallback_only() -> Self {
        Capability::ALL
            .into_iter()
            .fold(Self::new(), |detector, cap| detector.with_override(cap, None))
    }

    /// Resolved executable for `capability`, probing on first use.
    pub fn locate(&self, capability: Capability) -> Option<PathBuf> {
        if let Some(forced) = self.overrides.get(&capability) {
            return forced.clone();
        }

        if let Some(cached) = self.probed.read().get(&capability) {
            return cached.clone();
        }

        let found = probe(capability);
        debug!(
            capability = capability.name(),
            path = ?found,
            "Probed native search backend"
        );
        self.probed.write().insert(capability, found.clone());
        found
    }

    pub fn available(&self, capability: Capability) -> bool {
        self.locate(capability).is_some()
    }

    /// Forget memoized probe results so the next lookup re-probes `PATH`.
    pub fn refresh(&self) {
        self.probed.write().clear();
    }

    /// Snapshot of every capability, for diagnostics.
    pub fn report(&self) -> Vec<(Capability, Option<PathBuf>)> {
        Capability::ALL
            .into_iter()
            .map(|cap| (cap, self.locate(cap)))
            .collect()
    }
}

fn probe(capability: Capability) -> Option<PathBuf> {
    capability
        .candidates()
        .iter()
        .find_map(|name| which::which(name).ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_override_forces_unavailable() {
        let detector =
            CapabilityDetector::new().with_override(Capability::ContentSearch, None);
        assert!(!detector.available(Capability::ContentSearch));
    }

    #[test]
    fn test_override_forces_path() {
        let detector = CapabilityDetector::new()
            .with_override(Capability::FileSearch, Some(PathBuf::from("/opt/fd")));
        assert_eq!(
            detector.locate(Capability::FileSearch),
            Some(PathBuf::from("/opt/fd"))
        );
    }

    #[test]
    fn test_fallback_only_disables_everything() {
        let detector = CapabilityDetector::fallback_only();
        assert!(
            detector
                .report()
                .iter()
                .all(|(_, path)| path.is_none())
        );
    }

    #[test]
    fn test_lookup_is_memoized_until_refresh() {
        let detector = CapabilityDetector::new();
        let first = detector.locate(Capability::ContentSearch);
        assert_eq!(detector.locate(Capability::ContentSearch), first);
        assert_eq!(detector.probed.read().len(), 1);

        detector.refresh();
        assert!(detector.probed.read().is_empty());
    }

    #[test]
    fn test_candidates_include_debian_alias() {
        assert_eq!(Capability::FileSearch.candidates(), &["fd", "fdfind"]);
    }
}
