use crate::domain::types::{FacetKind, Feature, FeatureDefinition};
use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

/// Scan order for selector reservation. Foundational facets always precede
/// any feature facet appended by an active feature.
pub const BASE_PRECEDENCE: [FacetKind; 3] = [
    FacetKind::DiamondCut,
    FacetKind::Ownership,
    FacetKind::DiamondLoupe,
];

/// Definitions of every known capability bundle. The default catalog seeds
/// the full closed set of [`Feature`] variants; tests and embedders may
/// override individual definitions.
#[derive(Clone, Debug)]
pub struct FeatureCatalog {
    definitions: BTreeMap<Feature, FeatureDefinition>,
}

impl Default for FeatureCatalog {
    fn default() -> Self {
        let mut definitions = BTreeMap::new();
        definitions.insert(
            Feature::Inventory,
            FeatureDefinition {
                feature: Feature::Inventory,
                extra_facets: vec![FacetKind::Inventory],
                ignore_methods: BTreeSet::from(["init".to_string()]),
                ignore_selectors: BTreeSet::new(),
            },
        );
        Self { definitions }
    }
}

impl FeatureCatalog {
    pub fn definition(&self, feature: Feature) -> Option<&FeatureDefinition> {
        self.definitions.get(&feature)
    }

    pub fn set_definition(&mut self, definition: FeatureDefinition) {
        self.definitions.insert(definition.feature, definition);
    }
}

/// Immutable configuration for one deployment target: where compiled
/// artifacts live, the base precedence, and the feature catalog. Constructed
/// once and passed explicitly into the executor and orchestrator.
#[derive(Clone, Debug)]
pub struct DiamondConfig {
    pub artifacts_dir: PathBuf,
    pub base_precedence: Vec<FacetKind>,
    pub features: FeatureCatalog,
}

impl DiamondConfig {
    pub fn new(artifacts_dir: impl Into<PathBuf>) -> Self {
        Self {
            artifacts_dir: artifacts_dir.into(),
            base_precedence: BASE_PRECEDENCE.to_vec(),
            features: FeatureCatalog::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{DiamondConfig, FeatureCatalog, BASE_PRECEDENCE};
    use crate::domain::types::{FacetKind, Feature};

    #[test]
    fn base_precedence_orders_foundational_facets() {
        assert_eq!(
            BASE_PRECEDENCE,
            [
                FacetKind::DiamondCut,
                FacetKind::Ownership,
                FacetKind::DiamondLoupe,
            ]
        );
    }

    #[test]
    fn default_catalog_defines_every_feature() {
        let catalog = FeatureCatalog::default();
        let definition = catalog
            .definition(Feature::Inventory)
            .expect("inventory should be defined");
        assert_eq!(definition.extra_facets, vec![FacetKind::Inventory]);
        assert!(definition.ignore_methods.contains("init"));
        assert!(definition.ignore_selectors.is_empty());
    }

    #[test]
    fn config_seeds_base_precedence_and_catalog() {
        let config = DiamondConfig::new("build/contracts");
        assert_eq!(config.base_precedence, BASE_PRECEDENCE.to_vec());
        assert!(config.features.definition(Feature::Inventory).is_some());
    }
}
