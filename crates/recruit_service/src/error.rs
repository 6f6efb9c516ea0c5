//! Error taxonomy (spec.md §7): kinds, not wire codes — the HTTP crate maps
//! these onto status codes at the boundary.

#[derive(thiserror::Error, Debug)]
pub enum ServiceError {
    #[error("validation failed: {0:?}")]
    Validation(Vec<recruit_types::ValidationIssue>),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("search failed: {0}")]
    Search(#[from] recruit_graph::GraphError),

    #[error("malformed query parameter: {0}")]
    MalformedParameter(String),
}

pub type Result<T> = std::result::Result<T, ServiceError>;
