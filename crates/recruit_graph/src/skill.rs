//! Skill resolver (C1, spec.md §4.1).
//!
//! A user-typed skill identifier can name a leaf skill directly, or a
//! category — in which case the requirement expands to every leaf skill
//! reachable through the category subtree's `BELONGS_TO` edges.

use crate::SkillGraphSource;
use ahash::AHashMap;
use recruit_types::{ProficiencyLevel, ResolvedSkillRequirement, SkillId, SkillRequirement};

#[derive(Debug, Default)]
pub struct SkillExpansion {
    pub resolved: Vec<ResolvedSkillRequirement>,
    pub unresolved_identifiers: Vec<String>,
}

/// Expands a list of required or preferred skill requirements (spec.md
/// §4.1). `default_min_proficiency` fills in a requirement that didn't
/// specify one (spec.md §4.3 "Defaults applied").
pub async fn expand_skill_requirements(
    requirements: &[SkillRequirement],
    default_min_proficiency: ProficiencyLevel,
    source: &dyn SkillGraphSource,
) -> SkillExpansion {
    let mut out = SkillExpansion::default();

    for req in requirements {
        let Some(node) = source.find_skill(&req.skill).await else {
            out.unresolved_identifiers.push(req.skill.clone());
            continue;
        };

        let min_proficiency = req.min_proficiency.unwrap_or(default_min_proficiency);
        let preferred_min_proficiency = req
            .preferred_min_proficiency
            .map(|p| p.stricter(min_proficiency));

        let mut skill_id_to_name = AHashMap::new();
        let expanded_skill_ids = if node.is_leaf() {
            skill_id_to_name.insert(node.id.clone(), node.name.clone());
            vec![node.id.clone()]
        } else {
            let subtree = source.child_of_closure(&node.id).await;
            let mut ids = Vec::new();
            let mut seen = ahash::AHashSet::new();
            for category in &subtree {
                for leaf in source.belongs_to_closure(&category.id).await {
                    if leaf.is_category {
                        continue;
                    }
                    if seen.insert(leaf.id.clone()) {
                        skill_id_to_name.insert(leaf.id.clone(), leaf.name.clone());
                        ids.push(leaf.id);
                    }
                }
            }
            ids
        };

        out.resolved.push(ResolvedSkillRequirement {
            original_identifier: req.skill.clone(),
            original_skill_id: Some(node.id.clone()),
            original_skill_name: Some(node.name.clone()),
            expanded_skill_ids,
            skill_id_to_name,
            min_proficiency,
            preferred_min_proficiency,
        });
    }

    out
}

/// Flattens every resolved requirement's expanded ids into one deduplicated
/// list, preserving first-seen order — used by the query builder to build a
/// single `IN` clause across all required skills (spec.md §4.5).
pub fn flatten_skill_ids(resolved: &[ResolvedSkillRequirement]) -> Vec<SkillId> {
    let mut seen = ahash::AHashSet::new();
    let mut out = Vec::new();
    for req in resolved {
        for id in &req.expanded_skill_ids {
            if seen.insert(id.clone()) {
                out.push(id.clone());
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryGraphStore;
    use recruit_types::SkillNode;

    fn store_with_category() -> MemoryGraphStore {
        let mut store = MemoryGraphStore::new();
        store.add_skill(
            SkillNode {
                id: SkillId::new("cat-backend"),
                name: "Backend".into(),
                is_category: true,
            },
            None,
        );
        store.add_skill(
            SkillNode {
                id: SkillId::new("skill-rust"),
                name: "Rust".into(),
                is_category: false,
            },
            Some(SkillId::new("cat-backend")),
        );
        store.add_skill(
            SkillNode {
                id: SkillId::new("skill-go"),
                name: "Go".into(),
                is_category: false,
            },
            Some(SkillId::new("cat-backend")),
        );
        store
    }

    #[tokio::test]
    async fn category_expands_to_all_leaves() {
        let store = store_with_category();
        let reqs = vec![SkillRequirement {
            skill: "Backend".into(),
            min_proficiency: None,
            preferred_min_proficiency: None,
            min_years: None,
        }];
        let expansion =
            expand_skill_requirements(&reqs, ProficiencyLevel::Learning, &store).await;
        assert!(expansion.unresolved_identifiers.is_empty());
        let resolved = &expansion.resolved[0];
        assert_eq!(resolved.expanded_skill_ids.len(), 2);
    }

    #[tokio::test]
    async fn leaf_skill_expands_to_itself() {
        let store = store_with_category();
        let reqs = vec![SkillRequirement {
            skill: "skill-rust".into(),
            min_proficiency: Some(ProficiencyLevel::Expert),
            preferred_min_proficiency: None,
            min_years: None,
        }];
        let expansion =
            expand_skill_requirements(&reqs, ProficiencyLevel::Learning, &store).await;
        let resolved = &expansion.resolved[0];
        assert_eq!(resolved.expanded_skill_ids, vec![SkillId::new("skill-rust")]);
        assert_eq!(resolved.min_proficiency, ProficiencyLevel::Expert);
    }

    #[tokio::test]
    async fn unknown_identifier_is_reported() {
        let store = store_with_category();
        let reqs = vec![SkillRequirement {
            skill: "does-not-exist".into(),
            min_proficiency: None,
            preferred_min_proficiency: None,
            min_years: None,
        }];
        let expansion =
            expand_skill_requirements(&reqs, ProficiencyLevel::Learning, &store).await;
        assert!(expansion.resolved.is_empty());
        assert_eq!(expansion.unresolved_identifiers, vec!["does-not-exist"]);
    }
}
