//! Graph contract (spec.md §6), skill/domain resolvers (C1/C2), and the
//! similarity engine's graph loaders (C10).
//!
//! The core treats "any labelled-property graph with parameterised queries
//! and a vector index" as sufficient (spec.md §1). [`GraphClient`] is that
//! contract: a query string plus a parameter map, returning an ordered
//! record stream. [`SkillGraphSource`] and [`DomainGraphSource`] are a
//! higher-level repository view used by the resolvers so their traversal
//! logic doesn't need to hand-roll Cypher — a real deployment backs them
//! with queries issued through the same [`GraphClient`]; [`MemoryGraphStore`]
//! backs them directly for tests and for the zero-dependency reference
//! deployment (spec.md §1 "the graph database itself ... is out of scope").

mod domain;
mod memory;
mod similarity_graph;
mod skill;

pub use domain::{expand_domain_requirements, DomainExpansion};
pub use memory::MemoryGraphStore;
pub use similarity_graph::{SimilarityGraphs, SimilaritySnapshot, SkillCorrelationMap};
pub use skill::{expand_skill_requirements, flatten_skill_ids, SkillExpansion};

use ahash::AHashMap;
use async_trait::async_trait;
use recruit_types::{
    DomainId, DomainKind, DomainNode, Engineer, EngineerDomainEdge, EngineerId,
    EngineerSkillEdge, SkillId, SkillNode,
};
use serde::{Deserialize, Serialize};

#[derive(thiserror::Error, Debug)]
pub enum GraphError {
    #[error("graph query failed: {0}")]
    Query(String),
    #[error("malformed query parameter: {0}")]
    MalformedParameter(String),
}

pub type Result<T> = std::result::Result<T, GraphError>;

/// Neo4j-style native integer representation: two 32-bit halves, combined
/// into an `i64`. Design note (spec.md §9): must be normalised at the
/// parser boundary — downstream code only ever sees plain `f64`/`i64`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphInt {
    pub low: i32,
    pub high: i32,
}

impl GraphInt {
    pub fn to_number(self) -> i64 {
        ((self.high as i64) << 32) | (self.low as u32 as i64)
    }

    pub fn from_i64(value: i64) -> Self {
        Self {
            low: (value & 0xFFFF_FFFF) as i32,
            high: (value >> 32) as i32,
        }
    }
}

/// One field's value in a [`GraphRecord`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GraphValue {
    Text(String),
    Number(f64),
    Int(GraphInt),
    Bool(bool),
    List(Vec<GraphValue>),
    Null,
}

impl GraphValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            GraphValue::Number(n) => Some(*n),
            GraphValue::Int(i) => Some(i.to_number() as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            GraphValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            GraphValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[GraphValue]> {
        match self {
            GraphValue::List(items) => Some(items),
            _ => None,
        }
    }
}

/// One returned row. Field access is by name, matching the §6 contract
/// ("each record supports `get(fieldName)`").
pub trait GraphRecord: std::fmt::Debug {
    fn get(&self, field: &str) -> Option<&GraphValue>;
}

#[derive(Debug, Clone, Default)]
pub struct OwnedGraphRecord(pub AHashMap<String, GraphValue>);

impl GraphRecord for OwnedGraphRecord {
    fn get(&self, field: &str) -> Option<&GraphValue> {
        self.0.get(field)
    }
}

/// A bound query parameter — strings, numbers, string lists, and a
/// distinguished 64-bit integer type for offset/limit (spec.md §6).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ParamValue {
    Text(String),
    Number(f64),
    TextList(Vec<String>),
    Int64(i64),
}

pub type ParamMap = AHashMap<String, ParamValue>;

/// The parameterised graph query interface (spec.md §6 "Graph contract").
#[async_trait]
pub trait GraphClient: Send + Sync {
    async fn execute(&self, query: &str, params: &ParamMap) -> Result<Vec<Box<dyn GraphRecord>>>;
    async fn ping(&self) -> bool;
}

/// Repository view over the skill hierarchy used by the resolver (C1).
#[async_trait]
pub trait SkillGraphSource: Send + Sync {
    /// Locates a node by id or case-insensitive name.
    async fn find_skill(&self, identifier: &str) -> Option<SkillNode>;
    /// `CHILD_OF` traversal, depth 0..infinity — includes `self`.
    async fn child_of_closure(&self, id: &SkillId) -> Vec<SkillNode>;
    /// `BELONGS_TO` traversal, depth 1..infinity — excludes `self`.
    async fn belongs_to_closure(&self, id: &SkillId) -> Vec<SkillNode>;
}

/// Repository view over a domain hierarchy used by the resolver (C2).
#[async_trait]
pub trait DomainGraphSource: Send + Sync {
    async fn find_domain(&self, identifier: &str, kind: DomainKind) -> Option<DomainNode>;
    /// Hierarchy closure, depth 0..infinity — includes `self`.
    async fn hierarchy_closure(&self, id: &DomainId, kind: DomainKind) -> Vec<DomainNode>;
}

/// Repository view over engineer nodes and their edges, used by the query
/// builder/executor (C5) and record parser (C6). The `FilterPlan` built by
/// `recruit_service::query_builder` is the "parameterised query" of spec.md
/// §6; this trait is what actually walks the graph to answer it, so the
/// same plan runs unchanged against [`MemoryGraphStore`] in tests and
/// against a real backend in a deployment that implements it.
#[async_trait]
pub trait EngineerGraphSource: Send + Sync {
    async fn get_engineer(&self, id: &EngineerId) -> Option<Engineer>;
    async fn all_engineers(&self) -> Vec<Engineer>;
    async fn skills_for(&self, id: &EngineerId) -> Vec<EngineerSkillEdge>;
    async fn business_domains_for(&self, id: &EngineerId) -> Vec<EngineerDomainEdge>;
    async fn technical_domains_for(&self, id: &EngineerId) -> Vec<EngineerDomainEdge>;
}
