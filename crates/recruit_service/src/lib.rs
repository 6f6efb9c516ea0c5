//! Search orchestration for the constraint-aware engineer recommender.
//!
//! Sequences the constraint expander (C3), inference engine (C4), skill and
//! domain resolvers (C1/C2, via `recruit_graph`), query builder and
//! executor (C5), record parser (C6), utility calculator (C7), constraint
//! advisor (C9), similarity engine (C10) and critique engine (C11) behind
//! one orchestrator (C8) — spec.md §4.8.

pub mod advisor;
pub mod critique;
pub mod error;
pub mod expander;
pub mod orchestrator;
pub mod query_builder;
pub mod record_parser;
pub mod score;
pub mod similarity;

pub use error::{Result, ServiceError};
pub use orchestrator::SearchOrchestrator;
