//! Hard faults of the workflow layer.
//!
//! Everything expected at runtime (a missing issue, a wrong column, a failed
//! `gh` call) is an [`OperationResult`](crate::model::OperationResult) value.
//! The errors here signal integration mistakes instead: an unknown provider
//! name or a provider that has no implementation yet.

use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum WorkflowError {
    #[error("Unsupported Git provider: {0}")]
    UnsupportedProvider(String),

    #[error("{provider} implementation pending: {operation} is not implemented")]
    NotImplemented {
        provider: &'static str,
        operation: &'static str,
    },
}

pub type Result<T, E = WorkflowError> = std::result::Result<T, E>;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown AI assistant type: {0} (expected one of ai-coder, ai-reviewer, ai-tester, ai-researcher, ai-marketeer)")]
pub struct ParseRoleError(pub String);

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown board status: {0}")]
pub struct ParseStatusError(pub String);
