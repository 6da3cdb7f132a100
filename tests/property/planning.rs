// Copyright (c) 2025 - Cowboy AI, Inc.
//! Property tests for dependency planning
//!
//! Whatever order facts arrive in, every scheduled entity must sit in a
//! later stage than each of its dependencies.

use proptest::prelude::*;
use std::collections::HashSet;

use cim_netbox_reconciler::domain::EntityKey;
use cim_netbox_reconciler::normalize::normalize_batch;
use cim_netbox_reconciler::plan::resolve;
use cim_netbox_reconciler::ResolutionCache;

use crate::fixtures::topology_facts;

proptest! {
    #[test]
    fn prop_dependencies_precede_dependents(facts in Just(topology_facts()).prop_shuffle()) {
        let (entities, rejections) = normalize_batch(&facts);
        prop_assert!(rejections.is_empty());

        let plan = resolve(entities, rejections, &ResolutionCache::new());
        prop_assert!(plan.settled.is_empty());
        prop_assert_eq!(plan.scheduled(), facts.len());

        let mut resolved: HashSet<EntityKey> = HashSet::new();
        let mut last_index = None;
        for stage in &plan.stages {
            prop_assert!(last_index.map_or(true, |last| stage.index > last));
            last_index = Some(stage.index);

            for entity in &stage.entities {
                prop_assert_eq!(entity.kind().stage(), stage.index);
                for dependency in entity.dependencies() {
                    prop_assert!(
                        resolved.contains(&dependency),
                        "{} scheduled before {}",
                        entity.key(),
                        dependency
                    );
                }
            }
            resolved.extend(stage.entities.iter().map(|entity| entity.key()));
        }
    }

    #[test]
    fn prop_duplicates_collapse_to_one_entity(copies in 1usize..5) {
        let facts: Vec<_> = std::iter::repeat(topology_facts())
            .take(copies)
            .flatten()
            .collect();
        let (entities, rejections) = normalize_batch(&facts);

        let plan = resolve(entities, rejections, &ResolutionCache::new());

        prop_assert_eq!(plan.scheduled(), topology_facts().len());
        let keys: HashSet<EntityKey> = plan.scheduled_keys().collect();
        prop_assert_eq!(keys.len(), plan.scheduled());
    }
}
