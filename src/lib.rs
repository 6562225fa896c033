//! Multi-assistant delivery workflow on top of a Git host's issue tracker
//! and project board.
//!
//! Issues move `ToDo → Doing → Review → Testing → Done` while being handed
//! between assistant roles (coder, reviewer, tester, researcher, marketer).
//! [`workflow::Coordinator`] enforces the transitions; hosts plug in through
//! [`providers::Provider`].

pub mod config;
pub mod error;
pub mod model;
pub mod providers;
pub mod telemetry;
pub mod workflow;

#[cfg(test)]
mod testing;

pub use config::WorkflowConfig;
pub use error::{Result, WorkflowError};
pub use model::{AssistantRole, BoardStatus, OperationResult, WorkItem};
pub use providers::{create_provider, Provider};
pub use workflow::Coordinator;
