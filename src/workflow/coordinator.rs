//! The pipeline state machine.
//!
//! Work moves `ToDo → Doing → Review → Testing → Done`, and each transition
//! also hands the item to the next assistant role by swapping its
//! `assigned:ai-*` label. Every transition re-reads the item, checks its guard,
//! then runs its steps in order. The first failing step is returned as-is
//! and nothing after it runs; steps that already succeeded are not undone.

use std::collections::{BTreeMap, HashMap};

use tracing::{debug, info, instrument, warn};

use crate::config::WorkflowConfig;
use crate::error::Result;
use crate::model::{branch_name, AssistantRole, BoardStatus, OperationResult, WorkItem};
use crate::providers::{create_provider, Provider};

/// Returns the step's result from the enclosing operation unless it succeeded.
macro_rules! try_step {
    ($step:expr) => {{
        let result = $step;
        if !result.success {
            return Ok(result);
        }
        result
    }};
}

/// Owns one provider per assistant role, all built from the same provider
/// name and configuration.
pub struct Coordinator {
    provider_name: String,
    config: WorkflowConfig,
    providers: HashMap<AssistantRole, Box<dyn Provider>>,
}

impl Coordinator {
    /// Fails with [`WorkflowError::UnsupportedProvider`](crate::error::WorkflowError)
    /// for unknown provider names.
    pub fn new(provider: &str, config: WorkflowConfig) -> Result<Self> {
        Self::with_factory(provider, config, create_provider)
    }

    /// Builds the role map with `factory`, called once per role.
    pub fn with_factory<F>(provider: &str, config: WorkflowConfig, mut factory: F) -> Result<Self>
    where
        F: FnMut(&str, AssistantRole, &WorkflowConfig) -> Result<Box<dyn Provider>>,
    {
        let mut providers = HashMap::with_capacity(AssistantRole::ALL.len());
        for role in AssistantRole::ALL {
            providers.insert(role, factory(provider, role, &config)?);
        }
        Ok(Self {
            provider_name: provider.to_string(),
            config,
            providers,
        })
    }

    pub fn provider_name(&self) -> &str {
        &self.provider_name
    }

    pub fn config(&self) -> &WorkflowConfig {
        &self.config
    }

    pub(crate) fn provider(&self, role: AssistantRole) -> &dyn Provider {
        // populated for every role in `with_factory`
        self.providers[&role].as_ref()
    }

    /// ToDo → Doing, assign the coder and create the work branch.
    /// `output` carries the branch name.
    #[instrument(skip(self), fields(provider = %self.provider_name))]
    pub async fn start_coder(&self, number: u64) -> Result<OperationResult> {
        let coder = self.provider(AssistantRole::Coder);
        let Some(item) = coder.get_work_item(number).await? else {
            return Ok(not_found(number));
        };

        if item.board_status != Some(BoardStatus::ToDo) {
            debug!(status = %describe_status(item.board_status), "Issue not in ToDo");
            return Ok(OperationResult::failed(format!(
                "Issue {number} is not in ToDo status (current status: {})",
                describe_status(item.board_status)
            )));
        }

        try_step!(coder.update_status(&item, BoardStatus::Doing).await?);
        try_step!(coder.assign_to_role(&item, AssistantRole::Coder).await?);
        let created = try_step!(coder.create_branch(&item).await?);

        let branch = created.output.unwrap_or_else(|| branch_name(&item));
        info!(branch = %branch, "Started coder workflow");
        Ok(OperationResult::ok_with_output(
            format!("Started coder workflow for issue {number}"),
            branch,
        ))
    }

    /// Doing → Review, coder hands off to the reviewer.
    #[instrument(skip(self), fields(provider = %self.provider_name))]
    pub async fn complete_coder(&self, number: u64) -> Result<OperationResult> {
        self.hand_off(
            number,
            AssistantRole::Coder,
            BoardStatus::Review,
            AssistantRole::Reviewer,
        )
        .await
    }

    /// Review → Testing, reviewer hands off to the tester.
    #[instrument(skip(self), fields(provider = %self.provider_name))]
    pub async fn complete_reviewer(&self, number: u64) -> Result<OperationResult> {
        self.hand_off(
            number,
            AssistantRole::Reviewer,
            BoardStatus::Testing,
            AssistantRole::Tester,
        )
        .await
    }

    /// Opens the pull request for the item's branch, moves it to Done and
    /// drops the tester assignment. A PR that was opened stays open if a later
    /// step fails.
    #[instrument(skip(self, pr_body), fields(provider = %self.provider_name))]
    pub async fn complete_tester(
        &self,
        number: u64,
        pr_title: &str,
        pr_body: &str,
    ) -> Result<OperationResult> {
        let tester = self.provider(AssistantRole::Tester);
        let Some(item) = tester.get_work_item(number).await? else {
            return Ok(not_found(number));
        };
        if let Some(failed) = require_assignee(&item, AssistantRole::Tester) {
            return Ok(failed);
        }

        let head = branch_name(&item);
        let pr = try_step!(
            tester
                .create_pull_request(pr_title, pr_body, &head, &self.config.default_base_branch)
                .await?
        );
        try_step!(tester.update_status(&item, BoardStatus::Done).await?);
        try_step!(tester.remove_label(&item, &AssistantRole::Tester.label()).await?);

        info!(head = %head, "Completed tester workflow, PR created");
        let message = format!("Completed tester workflow for issue {number}, PR created");
        Ok(match pr.output {
            Some(url) => OperationResult::ok_with_output(message, url),
            None => OperationResult::ok(message),
        })
    }

    /// Puts the researcher on an item regardless of its column.
    #[instrument(skip(self), fields(provider = %self.provider_name))]
    pub async fn assign_researcher(&self, number: u64) -> Result<OperationResult> {
        let researcher = self.provider(AssistantRole::Researcher);
        let Some(item) = researcher.get_work_item(number).await? else {
            return Ok(not_found(number));
        };

        try_step!(researcher.assign_to_role(&item, AssistantRole::Researcher).await?);

        info!("Assigned ai-researcher");
        Ok(OperationResult::ok(format!(
            "Assigned ai-researcher to issue {number}"
        )))
    }

    #[instrument(skip(self), fields(provider = %self.provider_name))]
    pub async fn complete_research(&self, number: u64) -> Result<OperationResult> {
        let researcher = self.provider(AssistantRole::Researcher);
        let Some(item) = researcher.get_work_item(number).await? else {
            return Ok(not_found(number));
        };
        if let Some(failed) = require_assignee(&item, AssistantRole::Researcher) {
            return Ok(failed);
        }

        try_step!(
            researcher
                .remove_label(&item, &AssistantRole::Researcher.label())
                .await?
        );

        info!("Completed research workflow");
        Ok(OperationResult::ok(format!(
            "Completed research workflow for issue {number}"
        )))
    }

    /// Items assigned to `role`.
    ///
    /// With a status filter only that column is inspected; without one the
    /// role's own assigned listing is used, which spans every column.
    #[instrument(skip(self), fields(provider = %self.provider_name))]
    pub async fn issues_for_role(
        &self,
        role: AssistantRole,
        status: Option<BoardStatus>,
    ) -> Result<Vec<WorkItem>> {
        let provider = self.provider(role);
        match status {
            Some(status) => {
                let items = provider.list_work_items(Some(status)).await?;
                Ok(items
                    .into_iter()
                    .filter(|item| item.assigned_role() == Some(role.as_str()))
                    .collect())
            }
            None => provider.list_assigned_work_items().await,
        }
    }

    /// ToDo items no assistant has picked up yet.
    #[instrument(skip(self), fields(provider = %self.provider_name))]
    pub async fn unassigned_todo_items(&self) -> Result<Vec<WorkItem>> {
        let items = self
            .provider(AssistantRole::Coder)
            .list_work_items(Some(BoardStatus::ToDo))
            .await?;
        Ok(items
            .into_iter()
            .filter(|item| !item.is_assigned_to_ai())
            .collect())
    }

    /// Item count per column. Every column is present; items without a board
    /// status are not counted.
    #[instrument(skip(self), fields(provider = %self.provider_name))]
    pub async fn status_counts(&self) -> Result<BTreeMap<BoardStatus, usize>> {
        let items = self
            .provider(AssistantRole::Coder)
            .list_work_items(None)
            .await?;

        let mut counts: BTreeMap<BoardStatus, usize> =
            BoardStatus::ALL.into_iter().map(|s| (s, 0)).collect();
        for status in items.iter().filter_map(|item| item.board_status) {
            *counts.entry(status).or_insert(0) += 1;
        }
        Ok(counts)
    }

    /// Checks that the configured project board is reachable.
    #[instrument(skip(self), fields(provider = %self.provider_name))]
    pub async fn validate_board(&self) -> Result<OperationResult> {
        self.provider(AssistantRole::Coder).validate_board().await
    }

    /// Kicks off the role's next piece of work.
    ///
    /// The coder starts the top ToDo item. Reviewer and tester announce
    /// themselves on the first item of their column without moving it.
    #[instrument(skip(self), fields(provider = %self.provider_name))]
    pub async fn trigger_role(&self, role: AssistantRole) -> Result<OperationResult> {
        match role {
            AssistantRole::Coder => self.trigger_coder().await,
            AssistantRole::Reviewer => {
                self.announce(
                    role,
                    BoardStatus::Review,
                    "reviewing",
                    "🔍 ai-reviewer started reviewing this issue...",
                )
                .await
            }
            AssistantRole::Tester => {
                self.announce(
                    role,
                    BoardStatus::Testing,
                    "testing",
                    "🧪 ai-tester started testing this issue...",
                )
                .await
            }
            AssistantRole::Researcher | AssistantRole::Marketer => Ok(OperationResult::failed(
                format!("No trigger workflow for {role}"),
            )),
        }
    }

    async fn trigger_coder(&self) -> Result<OperationResult> {
        let coder = self.provider(AssistantRole::Coder);
        let Some(top) = coder.top_priority_todo_item().await? else {
            return Ok(OperationResult::failed(
                "No ToDo issues available for ai-coder",
            ));
        };

        let started = try_step!(self.start_coder(top.number).await?);

        info!(issue = top.number, "ai-coder triggered");
        let message = format!(
            "ai-coder started working on issue #{}: {}",
            top.number, top.title
        );
        Ok(match started.output {
            Some(branch) => OperationResult::ok_with_output(message, branch),
            None => OperationResult::ok(message),
        })
    }

    /// Posts a progress comment on the first item in `column`. A failed
    /// comment is logged and does not fail the trigger.
    async fn announce(
        &self,
        role: AssistantRole,
        column: BoardStatus,
        activity: &str,
        comment: &str,
    ) -> Result<OperationResult> {
        let provider = self.provider(role);
        let items = provider.list_work_items(Some(column)).await?;
        let Some(item) = items.into_iter().next() else {
            return Ok(OperationResult::failed(format!(
                "No issues in {} column for {role}",
                column.name()
            )));
        };

        let posted = provider
            .comment_on_pull_request(&self.config.repo_full_name(), item.number, comment)
            .await?;
        if !posted.success {
            warn!(issue = item.number, error = %posted.message, "Could not add {activity} comment");
        }

        info!(issue = item.number, "{role} triggered");
        Ok(OperationResult::ok_with_output(
            format!(
                "{role} started {activity} issue #{}: {}",
                item.number, item.title
            ),
            format!("issue_{}", item.number),
        ))
    }

    /// Shared shape of complete-coder and complete-reviewer.
    async fn hand_off(
        &self,
        number: u64,
        from: AssistantRole,
        to_status: BoardStatus,
        to: AssistantRole,
    ) -> Result<OperationResult> {
        let provider = self.provider(from);
        let Some(item) = provider.get_work_item(number).await? else {
            return Ok(not_found(number));
        };
        if let Some(failed) = require_assignee(&item, from) {
            return Ok(failed);
        }

        try_step!(provider.update_status(&item, to_status).await?);
        try_step!(provider.assign_to_role(&item, to).await?);

        info!(%from, %to, "Handed off issue");
        Ok(OperationResult::ok(format!(
            "Completed {from} workflow for issue {number}, assigned to {to}"
        )))
    }
}

fn not_found(number: u64) -> OperationResult {
    debug!(issue = number, "Issue not found");
    OperationResult::failed(format!("Issue {number} not found"))
}

fn require_assignee(item: &WorkItem, role: AssistantRole) -> Option<OperationResult> {
    let actual = item.assigned_role();
    if actual == Some(role.as_str()) {
        return None;
    }
    debug!(issue = item.number, expected = %role, actual = ?actual, "Wrong assignee");
    Some(OperationResult::failed(format!(
        "Issue {} is not assigned to {role} (assigned: {})",
        item.number,
        actual.unwrap_or("none")
    )))
}

fn describe_status(status: Option<BoardStatus>) -> String {
    status.map_or_else(|| "none".to_string(), |s| s.label().to_string())
}
