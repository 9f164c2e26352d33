use std::collections::BTreeMap;

// =============================================================================
// Destination Catalog
// =============================================================================

/// Reserved destination used when a requested one is unknown.
pub const DEFAULT_DESTINATION: &str = "Default";

/// Mapping from a human-readable department name to its routing identifier.
///
/// Built once at process start and shared read-only between turns.
/// Keys are case-sensitive.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DestinationCatalog {
    entries: BTreeMap<String, String>,
}

impl DestinationCatalog {
    /// Create a catalog from name/routing-id pairs.
    pub fn new<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            entries: entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Parse the catalog from a JSON object of strings.
    ///
    /// Missing or malformed input yields an empty catalog.
    pub fn from_json(raw: Option<&str>) -> Self {
        let Some(raw) = raw.map(str::trim).filter(|r| !r.is_empty()) else {
            tracing::warn!("No destination catalog configured, transfers are disabled");
            return Self::default();
        };

        match serde_json::from_str::<BTreeMap<String, String>>(raw) {
            Ok(entries) => {
                tracing::info!(destinations = entries.len(), "Destination catalog loaded");
                Self { entries }
            }
            Err(e) => {
                tracing::warn!(error = %e, "Malformed destination catalog, using an empty one");
                Self::default()
            }
        }
    }

    /// Exact, case-sensitive lookup.
    pub fn resolve(&self, name: &str) -> Option<&str> {
        self.entries.get(name).map(String::as_str)
    }

    /// Resolve `name`, falling back to [`DEFAULT_DESTINATION`] and then to
    /// any entry at all. `None` only when the catalog is empty.
    pub fn resolve_with_fallback(&self, name: &str) -> Option<&str> {
        self.resolve(name)
            .or_else(|| self.resolve(DEFAULT_DESTINATION))
            .or_else(|| self.entries.values().next().map(String::as_str))
    }

    /// All destination names.
    pub fn names(&self) -> Vec<&str> {
        self.entries.keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> DestinationCatalog {
        DestinationCatalog::new([("Sales", "arnA"), ("Support", "arnB")])
    }

    #[test]
    fn test_resolve_is_case_sensitive() {
        let catalog = catalog();
        assert_eq!(catalog.resolve("Sales"), Some("arnA"));
        assert_eq!(catalog.resolve("sales"), None);
    }

    #[test]
    fn test_from_json_degrades_to_empty() {
        assert!(DestinationCatalog::from_json(None).is_empty());
        assert!(DestinationCatalog::from_json(Some("  ")).is_empty());
        assert!(DestinationCatalog::from_json(Some("{not json")).is_empty());
        assert!(DestinationCatalog::from_json(Some(r#"{"Sales": 3}"#)).is_empty());

        let parsed = DestinationCatalog::from_json(Some(r#"{"Sales":"arnA","Support":"arnB"}"#));
        assert_eq!(parsed, catalog());
    }

    #[test]
    fn test_fallback_prefers_default_entry() {
        let catalog = DestinationCatalog::new([("Sales", "arnA"), ("Default", "arnD")]);
        assert_eq!(catalog.resolve_with_fallback("Sales"), Some("arnA"));
        assert_eq!(catalog.resolve_with_fallback("Billing"), Some("arnD"));
    }

    #[test]
    fn test_fallback_without_default_uses_any_entry() {
        let catalog = catalog();
        let routed = catalog.resolve_with_fallback("Billing").unwrap();
        assert!(routed == "arnA" || routed == "arnB");

        assert_eq!(DestinationCatalog::default().resolve_with_fallback("Billing"), None);
    }

    #[test]
    fn test_names_are_complete() {
        let catalog = catalog();
        let mut names = catalog.names();
        names.sort();
        assert_eq!(names, vec!["Sales", "Support"]);
    }
}
