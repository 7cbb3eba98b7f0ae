//! Pool sizing.

use serde::{Deserialize, Serialize};

/// Fixed capacities for every pool of a [`Model`](crate::Model).
///
/// Pools never grow, so these numbers bound the size of the model. Missing
/// fields deserialize from [`ModelCapacities::default`]; unknown fields are
/// rejected.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ModelCapacities {
    pub conditions: usize,
    pub connections: usize,
    pub slots: usize,
    pub views: usize,
    pub nodes: usize,
    pub classes: usize,
    pub dynamics: usize,
    /// Node pool shared by every relation list.
    pub links: usize,
    pub integer32s: usize,
    pub integer64s: usize,
    pub real64s: usize,
    pub strings: usize,
}

impl ModelCapacities {
    /// Estimate used when no explicit sizing is given.
    pub const DEFAULT_ESTIMATE: usize = 4096;

    /// Size every pool from an estimated number of models.
    ///
    /// Connections and slots get four per model, relation nodes eight.
    #[must_use]
    pub const fn from_estimate(models: usize) -> Self {
        Self {
            conditions: models,
            connections: models * 4,
            slots: models * 4,
            views: models,
            nodes: models,
            classes: models,
            dynamics: models,
            links: models * 8,
            integer32s: models,
            integer64s: models,
            real64s: models,
            strings: models,
        }
    }
}

impl Default for ModelCapacities {
    fn default() -> Self {
        Self::from_estimate(Self::DEFAULT_ESTIMATE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_estimate_ratios() {
        let caps = ModelCapacities::from_estimate(10);
        assert_eq!(caps.nodes, 10);
        assert_eq!(caps.connections, 40);
        assert_eq!(caps.slots, 40);
        assert_eq!(caps.links, 80);
    }

    #[test]
    fn test_unknown_pool_is_rejected() {
        let err = serde_json::from_str::<ModelCapacities>(r#"{ "wlinks": 0 }"#).unwrap_err();
        assert!(err.to_string().contains("wlinks"));
    }

    #[test]
    fn test_default_fits_narrow_handles() {
        let caps = ModelCapacities::default();
        assert_eq!(caps.nodes, 4096);
        assert!(caps.connections <= usize::from(u16::MAX));
    }
}
