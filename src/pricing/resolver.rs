//! Region lookup.

use std::sync::Arc;

use super::PricingTables;
use super::tables::{CoefficientBundle, DEFAULT_CITY};
use crate::error::ValidationError;

/// Canonical form of a region key: trimmed, lowercase, words joined by `-`.
///
/// `"Tamil Nadu"`, `"tamil_nadu"` and `"tamil-nadu"` all map to `tamil-nadu`.
pub fn normalize_key(raw: &str) -> String {
    raw.trim()
        .to_lowercase()
        .split(|c: char| c.is_whitespace() || c == '_' || c == '-')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}

/// Resolves `(state, city)` pairs to coefficient bundles.
#[derive(Debug, Clone)]
pub struct PricingResolver {
    tables: Arc<PricingTables>,
}

impl PricingResolver {
    pub fn new(tables: Arc<PricingTables>) -> Self {
        Self { tables }
    }

    pub fn tables(&self) -> &PricingTables {
        &self.tables
    }

    /// Look up the bundle for a region.
    ///
    /// An unknown state is an error. An unknown or omitted city falls back to
    /// the state's `default` bundle.
    pub fn resolve(
        &self,
        state: &str,
        city: Option<&str>,
    ) -> Result<&CoefficientBundle, ValidationError> {
        let state_key = normalize_key(state);
        if state_key.is_empty() {
            return Err(ValidationError::Missing { field: "state" });
        }

        let cities = self
            .tables
            .regions
            .get(&state_key)
            .ok_or_else(|| ValidationError::UnknownRegion {
                state: state.to_string(),
            })?;

        let bundle = city
            .map(normalize_key)
            .and_then(|key| cities.get(&key))
            .or_else(|| cities.get(DEFAULT_CITY));

        // Validated tables always carry a default city.
        bundle.ok_or_else(|| ValidationError::UnknownRegion {
            state: state.to_string(),
        })
    }

    /// Resolve with an optional state, using the tables' default state when absent.
    pub fn resolve_or_default(
        &self,
        state: Option<&str>,
        city: Option<&str>,
    ) -> Result<&CoefficientBundle, ValidationError> {
        match state.filter(|s| !s.trim().is_empty()) {
            Some(state) => self.resolve(state, city),
            None => self.resolve(&self.tables.default_state, city),
        }
    }

    /// Known states, sorted.
    pub fn states(&self) -> Vec<&str> {
        self.tables.regions.keys().map(String::as_str).collect()
    }

    /// Known cities of a state, sorted, including `default`.
    pub fn cities(&self, state: &str) -> Option<Vec<&str>> {
        self.tables
            .regions
            .get(&normalize_key(state))
            .map(|cities| cities.keys().map(String::as_str).collect())
    }
}

impl Default for PricingResolver {
    fn default() -> Self {
        Self::new(Arc::new(PricingTables::reference()))
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn test_normalize_key() {
        assert_eq!(normalize_key("Tamil Nadu"), "tamil-nadu");
        assert_eq!(normalize_key(" tamil_nadu "), "tamil-nadu");
        assert_eq!(normalize_key("KERALA"), "kerala");
        assert_eq!(normalize_key(""), "");
    }

    #[test]
    fn test_resolve_known_city() {
        let resolver = PricingResolver::default();
        let bundle = resolver.resolve("tamil-nadu", Some("chennai")).unwrap();
        assert_eq!(bundle.rate_per_area, 1800.0);
        assert_eq!(bundle.cement_price, 400.0);
        assert_eq!(bundle.ready_mix_price, 5500.0);
    }

    #[test]
    fn test_unknown_city_falls_back_to_default() {
        let resolver = PricingResolver::default();
        let fallback = resolver.resolve("kerala", Some("alappuzha")).unwrap();
        let default = resolver.resolve("kerala", Some("default")).unwrap();
        assert_eq!(fallback, default);
        assert_eq!(resolver.resolve("kerala", None).unwrap(), default);
    }

    #[test]
    fn test_unknown_state_rejected() {
        let resolver = PricingResolver::default();
        assert_eq!(
            resolver.resolve("atlantis", Some("chennai")),
            Err(ValidationError::UnknownRegion {
                state: "atlantis".into()
            })
        );
        assert_eq!(
            resolver.resolve("  ", None),
            Err(ValidationError::Missing { field: "state" })
        );
    }

    #[test]
    fn test_resolve_or_default_uses_default_state() {
        let resolver = PricingResolver::default();
        let bundle = resolver.resolve_or_default(None, None).unwrap();
        assert_eq!(bundle, resolver.resolve("tamil-nadu", None).unwrap());
    }

    #[test]
    fn test_listing() {
        let resolver = PricingResolver::default();
        assert_eq!(resolver.states(), vec!["karnataka", "kerala", "tamil-nadu"]);
        let cities = resolver.cities("Karnataka").unwrap();
        assert!(cities.contains(&"bangalore"));
        assert!(resolver.cities("goa").is_none());
    }

    proptest! {
        #[test]
        fn prop_every_region_resolves_to_positive_bundle(
            state_idx in 0usize..3,
            city in "[a-z]{0,12}",
        ) {
            let resolver = PricingResolver::default();
            let state = resolver.states()[state_idx].to_string();
            let bundle = resolver.resolve(&state, Some(&city)).unwrap();
            for value in [
                bundle.cement_price,
                bundle.sand_price,
                bundle.aggregate_price,
                bundle.brick_price,
                bundle.steel_price,
                bundle.ready_mix_price,
            ] {
                prop_assert!(value > 0.0);
            }
        }
    }
}
