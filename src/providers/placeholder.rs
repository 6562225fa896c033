//! Providers that keep the [`Provider`] shape for hosts not supported yet.
//!
//! Every operation, including the default ones built on top of the
//! primitives, returns [`WorkflowError::NotImplemented`].

use async_trait::async_trait;

use super::Provider;
use crate::config::WorkflowConfig;
use crate::error::{Result, WorkflowError};
use crate::model::{AssistantRole, BoardStatus, OperationResult, WorkItem};

macro_rules! placeholder_provider {
    ($ty:ident, $name:literal) => {
        pub struct $ty {
            role: AssistantRole,
            config: WorkflowConfig,
        }

        impl $ty {
            pub fn new(role: AssistantRole, config: WorkflowConfig) -> Self {
                Self { role, config }
            }

            fn pending<T>(&self, operation: &'static str) -> Result<T> {
                Err(WorkflowError::NotImplemented {
                    provider: $name,
                    operation,
                })
            }
        }

        #[async_trait]
        impl Provider for $ty {
            fn name(&self) -> &str {
                $name
            }

            fn role(&self) -> AssistantRole {
                self.role
            }

            fn config(&self) -> &WorkflowConfig {
                &self.config
            }

            async fn list_work_items(&self, _status: Option<BoardStatus>) -> Result<Vec<WorkItem>> {
                self.pending("list_work_items")
            }

            async fn get_work_item(&self, _number: u64) -> Result<Option<WorkItem>> {
                self.pending("get_work_item")
            }

            async fn update_status(
                &self,
                _item: &WorkItem,
                _status: BoardStatus,
            ) -> Result<OperationResult> {
                self.pending("update_status")
            }

            async fn add_label(&self, _item: &WorkItem, _label: &str) -> Result<OperationResult> {
                self.pending("add_label")
            }

            async fn remove_label(&self, _item: &WorkItem, _label: &str) -> Result<OperationResult> {
                self.pending("remove_label")
            }

            async fn create_branch(&self, _item: &WorkItem) -> Result<OperationResult> {
                self.pending("create_branch")
            }

            async fn create_commit(
                &self,
                _branch: &str,
                _files: &[String],
                _message: &str,
            ) -> Result<OperationResult> {
                self.pending("create_commit")
            }

            async fn push_branch(&self, _branch: &str) -> Result<OperationResult> {
                self.pending("push_branch")
            }

            async fn create_pull_request(
                &self,
                _title: &str,
                _body: &str,
                _head: &str,
                _base: &str,
            ) -> Result<OperationResult> {
                self.pending("create_pull_request")
            }

            async fn comment_on_pull_request(
                &self,
                _repo: &str,
                _number: u64,
                _text: &str,
            ) -> Result<OperationResult> {
                self.pending("comment_on_pull_request")
            }

            async fn validate_board(&self) -> Result<OperationResult> {
                self.pending("validate_board")
            }

            async fn assign_to_role(
                &self,
                _item: &WorkItem,
                _role: AssistantRole,
            ) -> Result<OperationResult> {
                self.pending("assign_to_role")
            }

            async fn list_assigned_work_items(&self) -> Result<Vec<WorkItem>> {
                self.pending("list_assigned_work_items")
            }

            async fn top_priority_todo_item(&self) -> Result<Option<WorkItem>> {
                self.pending("top_priority_todo_item")
            }
        }
    };
}

placeholder_provider!(GitLabProvider, "GitLab");
placeholder_provider!(BitbucketProvider, "Bitbucket");
