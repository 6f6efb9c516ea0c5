//! Domain resolver (C2, spec.md §4.2).
//!
//! Structurally identical for business and technical domains: every
//! requirement expands to itself plus every descendant in the hierarchy,
//! via the same `hierarchy_closure` traversal as [`crate::skill`] uses for
//! skill categories.

use crate::DomainGraphSource;
use recruit_types::{DomainKind, DomainRequirement, ResolvedDomainRequirement};

#[derive(Debug, Default)]
pub struct DomainExpansion {
    pub resolved: Vec<ResolvedDomainRequirement>,
    pub unresolved_identifiers: Vec<String>,
}

/// Expands a list of required or preferred domain requirements against one
/// hierarchy (business or technical — spec.md §4.2).
pub async fn expand_domain_requirements(
    requirements: &[DomainRequirement],
    kind: DomainKind,
    source: &dyn DomainGraphSource,
) -> DomainExpansion {
    let mut out = DomainExpansion::default();

    for req in requirements {
        let Some(node) = source.find_domain(&req.domain, kind).await else {
            out.unresolved_identifiers.push(req.domain.clone());
            continue;
        };

        let expanded_domain_ids: Vec<_> = source
            .hierarchy_closure(&node.id, kind)
            .await
            .into_iter()
            .map(|n| n.id)
            .collect();

        out.resolved.push(ResolvedDomainRequirement {
            original_identifier: req.domain.clone(),
            domain_id: Some(node.id.clone()),
            expanded_domain_ids,
            min_years: req.min_years,
            preferred_min_years: req.preferred_min_years,
        });
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryGraphStore;
    use recruit_types::{DomainId, DomainNode};

    fn store_with_hierarchy() -> MemoryGraphStore {
        let mut store = MemoryGraphStore::new();
        store.add_domain(
            DomainNode {
                id: DomainId::new("fintech"),
                name: "Fintech".into(),
                kind: DomainKind::Business,
            },
            None,
        );
        store.add_domain(
            DomainNode {
                id: DomainId::new("payments"),
                name: "Payments".into(),
                kind: DomainKind::Business,
            },
            Some(DomainId::new("fintech")),
        );
        store
    }

    #[tokio::test]
    async fn domain_expands_to_self_and_descendants() {
        let store = store_with_hierarchy();
        let reqs = vec![DomainRequirement {
            domain: "Fintech".into(),
            min_years: Some(2.0),
            preferred_min_years: None,
        }];
        let expansion = expand_domain_requirements(&reqs, DomainKind::Business, &store).await;
        assert!(expansion.unresolved_identifiers.is_empty());
        let resolved = &expansion.resolved[0];
        assert_eq!(resolved.expanded_domain_ids.len(), 2);
        assert!(resolved.expanded_domain_ids.contains(&DomainId::new("payments")));
    }

    #[tokio::test]
    async fn leaf_domain_expands_to_only_itself() {
        let store = store_with_hierarchy();
        let reqs = vec![DomainRequirement {
            domain: "Payments".into(),
            min_years: None,
            preferred_min_years: None,
        }];
        let expansion = expand_domain_requirements(&reqs, DomainKind::Business, &store).await;
        let resolved = &expansion.resolved[0];
        assert_eq!(resolved.expanded_domain_ids, vec![DomainId::new("payments")]);
    }
}
