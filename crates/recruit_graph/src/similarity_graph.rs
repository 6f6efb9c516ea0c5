//! Similarity engine graph loaders (C10, spec.md §4.10 `loadSkillGraph` /
//! `loadDomainGraph`).
//!
//! These build the in-memory snapshots the similarity engine scores
//! against, so per-request similarity calls don't each re-query the graph.
//! [`SimilarityGraphs::refresh`] swaps the snapshot atomically (SPEC_FULL.md
//! §9 Open Question #1) — wire it to a webhook or a timer in a real
//! deployment.

use crate::memory::MemoryGraphStore;
use ahash::AHashMap;
use recruit_types::{DomainGraphNode, DomainId, DomainKind, SkillCorrelation, SkillId};
use std::sync::{Arc, RwLock};

pub type SkillCorrelationMap = AHashMap<SkillId, Vec<SkillCorrelation>>;

#[derive(Debug, Default, Clone)]
pub struct SimilaritySnapshot {
    pub skill_correlations: SkillCorrelationMap,
    pub business_domains: AHashMap<DomainId, DomainGraphNode>,
    pub technical_domains: AHashMap<DomainId, DomainGraphNode>,
}

/// `loadSkillGraph`: correlation edges filtered to `strength >= threshold`
/// (spec.md §4.10).
fn load_skill_graph(store: &MemoryGraphStore, threshold: f64) -> SkillCorrelationMap {
    let mut map = SkillCorrelationMap::default();
    for skill in store.all_skills() {
        let correlations: Vec<_> = store
            .skill_correlations(&skill.id)
            .iter()
            .filter(|c| c.strength >= threshold)
            .cloned()
            .collect();
        if !correlations.is_empty() {
            map.insert(skill.id.clone(), correlations);
        }
    }
    map
}

/// `loadDomainGraph`: every domain of `kind`, with its immediate parent and
/// a human-readable `encompassedBy` label (spec.md §4.10).
fn load_domain_graph(
    store: &MemoryGraphStore,
    kind: DomainKind,
) -> AHashMap<DomainId, DomainGraphNode> {
    let mut map = AHashMap::default();
    for domain in store.all_domains(kind) {
        let parent_id = store.domain_parent(kind, &domain.id).cloned();
        let encompassed_by = parent_id.as_ref().and_then(|parent_id| {
            store
                .all_domains(kind)
                .find(|d| &d.id == parent_id)
                .map(|d| d.name.clone())
        });
        map.insert(
            domain.id.clone(),
            DomainGraphNode {
                domain_id: domain.id.clone(),
                parent_id,
                encompassed_by,
            },
        );
    }
    map
}

/// Atomically swappable similarity-graph snapshot shared across requests.
#[derive(Debug)]
pub struct SimilarityGraphs {
    inner: RwLock<Arc<SimilaritySnapshot>>,
}

impl SimilarityGraphs {
    pub fn load(store: &MemoryGraphStore, correlation_threshold: f64) -> Self {
        Self {
            inner: RwLock::new(Arc::new(Self::build(store, correlation_threshold))),
        }
    }

    fn build(store: &MemoryGraphStore, correlation_threshold: f64) -> SimilaritySnapshot {
        SimilaritySnapshot {
            skill_correlations: load_skill_graph(store, correlation_threshold),
            business_domains: load_domain_graph(store, DomainKind::Business),
            technical_domains: load_domain_graph(store, DomainKind::Technical),
        }
    }

    pub fn snapshot(&self) -> Arc<SimilaritySnapshot> {
        self.inner
            .read()
            .expect("similarity graph lock poisoned")
            .clone()
    }

    /// Rebuilds from `store` and swaps the snapshot in. Callers on an old
    /// `Arc` keep reading a consistent, if stale, view.
    pub fn refresh(&self, store: &MemoryGraphStore, correlation_threshold: f64) {
        let fresh = Arc::new(Self::build(store, correlation_threshold));
        *self.inner.write().expect("similarity graph lock poisoned") = fresh;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use recruit_types::{DomainNode, SkillNode};

    #[test]
    fn correlation_below_threshold_is_dropped() {
        let mut store = MemoryGraphStore::new();
        store.add_skill(
            SkillNode {
                id: SkillId::new("rust"),
                name: "Rust".into(),
                is_category: false,
            },
            None,
        );
        store.set_skill_correlations(
            SkillId::new("rust"),
            vec![
                SkillCorrelation {
                    other_skill_id: SkillId::new("go"),
                    strength: 0.9,
                },
                SkillCorrelation {
                    other_skill_id: SkillId::new("cobol"),
                    strength: 0.1,
                },
            ],
        );

        let graphs = SimilarityGraphs::load(&store, 0.7);
        let snapshot = graphs.snapshot();
        let rust_correlations = &snapshot.skill_correlations[&SkillId::new("rust")];
        assert_eq!(rust_correlations.len(), 1);
        assert_eq!(rust_correlations[0].other_skill_id, SkillId::new("go"));
    }

    #[test]
    fn refresh_swaps_snapshot_without_blocking_old_readers() {
        let mut store = MemoryGraphStore::new();
        store.add_domain(
            DomainNode {
                id: DomainId::new("fintech"),
                name: "Fintech".into(),
                kind: DomainKind::Business,
            },
            None,
        );
        let graphs = SimilarityGraphs::load(&store, 0.7);
        let before = graphs.snapshot();
        assert_eq!(before.business_domains.len(), 1);

        store.add_domain(
            DomainNode {
                id: DomainId::new("insurtech"),
                name: "Insurtech".into(),
                kind: DomainKind::Business,
            },
            None,
        );
        graphs.refresh(&store, 0.7);

        assert_eq!(before.business_domains.len(), 1);
        assert_eq!(graphs.snapshot().business_domains.len(), 2);
    }
}
