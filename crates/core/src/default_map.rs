//! One-shot choice of the level to settle on after the startup scan.

use rand::Rng;
use tracing::{info, warn};

use crate::{catalog::Catalog, config::ModuleConfig};

/// Holds the configured default map (or random mode) until it is used.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DefaultMapSelector {
    default_map: Option<String>,
    random_map: bool,
}

impl DefaultMapSelector {
    /// Selector with an explicit default and random flag.
    pub fn new(default_map: Option<String>, random_map: bool) -> Self {
        Self {
            default_map: default_map.filter(|map| !map.trim().is_empty()),
            random_map,
        }
    }

    /// Selector seeded from the module settings.
    pub fn from_config(config: &ModuleConfig) -> Self {
        Self::new(config.default_map.clone(), config.random_map)
    }

    /// Whether a later call to [`resolve`](Self::resolve) may still return a map.
    pub fn is_pending(&self) -> bool {
        self.random_map || self.default_map.is_some()
    }

    /// Take the map to use for this activation, if any.
    ///
    /// Random mode takes precedence over a fixed default and both are
    /// consumed by the first call, whether or not a map could be picked.
    pub fn resolve(&mut self, catalog: &Catalog, rng: &mut impl Rng) -> Option<String> {
        if !self.is_pending() {
            return None;
        }

        if self.random_map {
            self.random_map = false;
            self.default_map = None;

            let resolved: Vec<&str> = catalog
                .resolved()
                .filter_map(|entry| entry.resolved_name())
                .collect();
            if resolved.is_empty() {
                warn!("RandomMap enabled but no workshop maps have resolved names yet");
                return None;
            }

            let pick = resolved[rng.random_range(0..resolved.len())];
            info!("Random default map selected: {pick}");
            return Some(pick.to_string());
        }

        self.default_map.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MapEntry;
    use rand::{rngs::StdRng, SeedableRng};

    fn catalog() -> Catalog {
        Catalog::new(vec![
            MapEntry::resolved(1, "de_one"),
            MapEntry::new(2),
            MapEntry::resolved(3, "de_three"),
        ])
    }

    #[test]
    fn nothing_configured_returns_none() {
        let mut selector = DefaultMapSelector::default();
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(selector.resolve(&catalog(), &mut rng), None);
    }

    #[test]
    fn fixed_default_is_one_shot() {
        let mut selector = DefaultMapSelector::new(Some("de_dust2".to_string()), false);
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(
            selector.resolve(&catalog(), &mut rng).as_deref(),
            Some("de_dust2")
        );
        assert!(!selector.is_pending());
        assert_eq!(selector.resolve(&catalog(), &mut rng), None);
    }

    #[test]
    fn blank_default_is_ignored() {
        let selector = DefaultMapSelector::new(Some("  ".to_string()), false);
        assert!(!selector.is_pending());
    }

    #[test]
    fn random_pick_is_a_resolved_map() {
        let catalog = catalog();
        for seed in 0..32 {
            let mut selector = DefaultMapSelector::new(Some("de_dust2".to_string()), true);
            let mut rng = StdRng::seed_from_u64(seed);
            let pick = selector
                .resolve(&catalog, &mut rng)
                .expect("resolved maps are available");
            assert!(pick == "de_one" || pick == "de_three", "unexpected pick {pick}");
            assert!(!selector.is_pending());
            assert_eq!(selector.resolve(&catalog, &mut rng), None);
        }
    }

    #[test]
    fn random_without_resolved_maps_is_consumed() {
        let catalog = Catalog::new(vec![MapEntry::new(1)]);
        let mut selector = DefaultMapSelector::new(None, true);
        let mut rng = StdRng::seed_from_u64(7);
        assert_eq!(selector.resolve(&catalog, &mut rng), None);
        assert!(!selector.is_pending());
    }
}
