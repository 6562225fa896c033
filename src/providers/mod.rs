pub mod github;
pub mod placeholder;

use async_trait::async_trait;

use crate::config::WorkflowConfig;
use crate::error::{Result, WorkflowError};
use crate::model::{AssistantRole, BoardStatus, OperationResult, WorkItem};

/// Provider names accepted by [`create_provider`], case-insensitively.
pub const SUPPORTED_PROVIDERS: [&str; 3] = ["github", "gitlab", "bitbucket"];

/// Remote operations of a Git hosting provider, bound to one assistant role.
///
/// Transport failures never surface as `Err`: reads degrade to empty/`None`
/// and writes to a failed [`OperationResult`]. `Err` is reserved for
/// [`WorkflowError::NotImplemented`].
#[async_trait]
pub trait Provider: Send + Sync {
    fn name(&self) -> &str;
    fn role(&self) -> AssistantRole;
    fn config(&self) -> &WorkflowConfig;

    /// All issues of the repository, optionally only those in one board column.
    /// Items without a board status only appear when no filter is given.
    async fn list_work_items(&self, status: Option<BoardStatus>) -> Result<Vec<WorkItem>>;
    async fn get_work_item(&self, number: u64) -> Result<Option<WorkItem>>;
    async fn update_status(&self, item: &WorkItem, status: BoardStatus) -> Result<OperationResult>;
    async fn add_label(&self, item: &WorkItem, label: &str) -> Result<OperationResult>;
    async fn remove_label(&self, item: &WorkItem, label: &str) -> Result<OperationResult>;
    /// On success `output` holds the branch name.
    async fn create_branch(&self, item: &WorkItem) -> Result<OperationResult>;
    async fn create_commit(
        &self,
        branch: &str,
        files: &[String],
        message: &str,
    ) -> Result<OperationResult>;
    async fn push_branch(&self, branch: &str) -> Result<OperationResult>;
    async fn create_pull_request(
        &self,
        title: &str,
        body: &str,
        head: &str,
        base: &str,
    ) -> Result<OperationResult>;
    async fn comment_on_pull_request(
        &self,
        repo: &str,
        number: u64,
        text: &str,
    ) -> Result<OperationResult>;
    /// Checks that the configured project board is reachable.
    async fn validate_board(&self) -> Result<OperationResult>;

    /// Replaces every `assigned:ai-*` label with the one for `role`.
    ///
    /// Old labels are removed first; the first failed removal is returned and
    /// the new label is not added.
    async fn assign_to_role(&self, item: &WorkItem, role: AssistantRole) -> Result<OperationResult> {
        let stale: Vec<String> = item.assignment_labels().map(String::from).collect();
        for label in &stale {
            let removed = self.remove_label(item, label).await?;
            if !removed.success {
                return Ok(removed);
            }
        }
        self.add_label(item, &role.label()).await
    }

    /// Issues whose assigned role is this provider's own role.
    async fn list_assigned_work_items(&self) -> Result<Vec<WorkItem>> {
        let own = self.role();
        let items = self.list_work_items(None).await?;
        Ok(items
            .into_iter()
            .filter(|item| item.assigned_role() == Some(own.as_str()))
            .collect())
    }

    /// First ToDo item in provider order.
    async fn top_priority_todo_item(&self) -> Result<Option<WorkItem>> {
        let items = self.list_work_items(Some(BoardStatus::ToDo)).await?;
        Ok(items.into_iter().next())
    }
}


/// Builds the provider registered under `provider` for one role.
pub fn create_provider(
    provider: &str,
    role: AssistantRole,
    config: &WorkflowConfig,
) -> Result<Box<dyn Provider>> {
    match provider.to_ascii_lowercase().as_str() {
        "github" => Ok(Box::new(github::GitHubProvider::new(role, config.clone()))),
        "gitlab" => Ok(Box::new(placeholder::GitLabProvider::new(role, config.clone()))),
        "bitbucket" => Ok(Box::new(placeholder::BitbucketProvider::new(
            role,
            config.clone(),
        ))),
        _ => Err(WorkflowError::UnsupportedProvider(provider.to_string())),
    }
}
