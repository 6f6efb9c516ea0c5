//! In-memory reference implementation of [`GraphClient`], [`SkillGraphSource`]
//! and [`DomainGraphSource`] — spec.md §1 treats the graph database as
//! out of scope, so this is what backs the reference deployment and the
//! unit/integration tests across the workspace.

use crate::{
    DomainGraphSource, EngineerGraphSource, GraphClient, GraphError, GraphRecord, ParamMap,
    Result, SkillGraphSource,
};
use ahash::{AHashMap, AHashSet};
use async_trait::async_trait;
use recruit_types::{
    DomainId, DomainKind, DomainNode, Engineer, EngineerDomainEdge, EngineerId,
    EngineerSkillEdge, SkillCorrelation, SkillId, SkillNode,
};

#[derive(Debug, Default)]
pub struct MemoryGraphStore {
    skills: AHashMap<SkillId, SkillNode>,
    /// `CHILD_OF`: sub-category -> parent category.
    skill_child_of: AHashMap<SkillId, SkillId>,
    /// `BELONGS_TO`: leaf skill -> category.
    skill_belongs_to: AHashMap<SkillId, SkillId>,
    skill_correlations: AHashMap<SkillId, Vec<SkillCorrelation>>,

    domains: AHashMap<(DomainKind, DomainId), DomainNode>,
    /// `CHILD_OF`: sub-domain -> parent domain, keyed like `domains`.
    domain_child_of: AHashMap<(DomainKind, DomainId), DomainId>,

    engineers: AHashMap<EngineerId, Engineer>,
    engineer_skills: AHashMap<EngineerId, Vec<EngineerSkillEdge>>,
    engineer_business_domains: AHashMap<EngineerId, Vec<EngineerDomainEdge>>,
    engineer_technical_domains: AHashMap<EngineerId, Vec<EngineerDomainEdge>>,
}

impl MemoryGraphStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a skill node. `parent` is the category it's nested under
    /// (`CHILD_OF` for another category, `BELONGS_TO` for a leaf).
    pub fn add_skill(&mut self, node: SkillNode, parent: Option<SkillId>) {
        if let Some(parent_id) = parent {
            if node.is_category {
                self.skill_child_of.insert(node.id.clone(), parent_id);
            } else {
                self.skill_belongs_to.insert(node.id.clone(), parent_id);
            }
        }
        self.skills.insert(node.id.clone(), node);
    }

    pub fn set_skill_correlations(&mut self, skill_id: SkillId, correlations: Vec<SkillCorrelation>) {
        self.skill_correlations.insert(skill_id, correlations);
    }

    pub fn skill_correlations(&self, skill_id: &SkillId) -> &[SkillCorrelation] {
        self.skill_correlations
            .get(skill_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn all_skills(&self) -> impl Iterator<Item = &SkillNode> {
        self.skills.values()
    }

    pub fn add_domain(&mut self, node: DomainNode, parent: Option<DomainId>) {
        let key = (node.kind, node.id.clone());
        if let Some(parent_id) = parent {
            self.domain_child_of.insert(key.clone(), parent_id);
        }
        self.domains.insert(key, node);
    }

    pub fn all_domains(&self, kind: DomainKind) -> impl Iterator<Item = &DomainNode> {
        self.domains
            .values()
            .filter(move |node| node.kind == kind)
    }

    pub fn domain_parent(&self, kind: DomainKind, id: &DomainId) -> Option<&DomainId> {
        self.domain_child_of.get(&(kind, id.clone()))
    }

    pub fn add_engineer(
        &mut self,
        engineer: Engineer,
        skills: Vec<EngineerSkillEdge>,
        business_domains: Vec<EngineerDomainEdge>,
        technical_domains: Vec<EngineerDomainEdge>,
    ) {
        let id = engineer.id.clone();
        self.engineers.insert(id.clone(), engineer);
        self.engineer_skills.insert(id.clone(), skills);
        self.engineer_business_domains.insert(id.clone(), business_domains);
        self.engineer_technical_domains.insert(id, technical_domains);
    }
}

#[async_trait]
impl SkillGraphSource for MemoryGraphStore {
    async fn find_skill(&self, identifier: &str) -> Option<SkillNode> {
        if let Some(node) = self.skills.get(&SkillId::new(identifier)) {
            return Some(node.clone());
        }
        self.skills
            .values()
            .find(|node| node.name.eq_ignore_ascii_case(identifier))
            .cloned()
    }

    async fn child_of_closure(&self, id: &SkillId) -> Vec<SkillNode> {
        let mut result = AHashSet::new();
        result.insert(id.clone());
        let mut changed = true;
        while changed {
            changed = false;
            for (child, parent) in &self.skill_child_of {
                if result.contains(parent) && !result.contains(child) {
                    result.insert(child.clone());
                    changed = true;
                }
            }
        }
        result
            .into_iter()
            .filter_map(|id| self.skills.get(&id).cloned())
            .collect()
    }

    async fn belongs_to_closure(&self, id: &SkillId) -> Vec<SkillNode> {
        self.skill_belongs_to
            .iter()
            .filter(|(_, category)| *category == id)
            .filter_map(|(leaf, _)| self.skills.get(leaf).cloned())
            .collect()
    }
}

#[async_trait]
impl DomainGraphSource for MemoryGraphStore {
    async fn find_domain(&self, identifier: &str, kind: DomainKind) -> Option<DomainNode> {
        if let Some(node) = self.domains.get(&(kind, DomainId::new(identifier))) {
            return Some(node.clone());
        }
        self.domains
            .values()
            .find(|node| node.kind == kind && node.name.eq_ignore_ascii_case(identifier))
            .cloned()
    }

    async fn hierarchy_closure(&self, id: &DomainId, kind: DomainKind) -> Vec<DomainNode> {
        let mut result = AHashSet::new();
        result.insert(id.clone());
        let mut changed = true;
        while changed {
            changed = false;
            for ((node_kind, child), parent) in &self.domain_child_of {
                if *node_kind == kind && result.contains(parent) && !result.contains(child) {
                    result.insert(child.clone());
                    changed = true;
                }
            }
        }
        result
            .into_iter()
            .filter_map(|id| self.domains.get(&(kind, id)).cloned())
            .collect()
    }
}

#[async_trait]
impl EngineerGraphSource for MemoryGraphStore {
    async fn get_engineer(&self, id: &EngineerId) -> Option<Engineer> {
        self.engineers.get(id).cloned()
    }

    async fn all_engineers(&self) -> Vec<Engineer> {
        self.engineers.values().cloned().collect()
    }

    async fn skills_for(&self, id: &EngineerId) -> Vec<EngineerSkillEdge> {
        self.engineer_skills.get(id).cloned().unwrap_or_default()
    }

    async fn business_domains_for(&self, id: &EngineerId) -> Vec<EngineerDomainEdge> {
        self.engineer_business_domains
            .get(id)
            .cloned()
            .unwrap_or_default()
    }

    async fn technical_domains_for(&self, id: &EngineerId) -> Vec<EngineerDomainEdge> {
        self.engineer_technical_domains
            .get(id)
            .cloned()
            .unwrap_or_default()
    }
}

/// The reference store answers only `"PING"`; everything else goes through
/// the typed [`SkillGraphSource`]/[`DomainGraphSource`] traits above — it
/// exists to satisfy the §6 contract shape, not to be queried ad hoc.
#[async_trait]
impl GraphClient for MemoryGraphStore {
    async fn execute(&self, query: &str, _params: &ParamMap) -> Result<Vec<Box<dyn GraphRecord>>> {
        if query.trim().eq_ignore_ascii_case("PING") {
            Ok(Vec::new())
        } else {
            Err(GraphError::Query(format!(
                "in-memory reference store does not execute ad hoc queries: {query}"
            )))
        }
    }

    async fn ping(&self) -> bool {
        true
    }
}
