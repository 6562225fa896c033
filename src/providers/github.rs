use anyhow::{Context, Result as AnyResult};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::warn;

use super::Provider;
use crate::config::WorkflowConfig;
use crate::error::Result;
use crate::model::{
    branch_name, AssistantRole, BoardStatus, IssueState, OperationResult, WorkItem,
};

const ISSUE_FIELDS: &str =
    "number,title,body,state,labels,assignees,createdAt,updatedAt,url,projectItems";
/// `gh issue list` has no cursor; a full page means the listing may be cut short.
const ISSUE_LIMIT: usize = 200;
const PROJECT_ITEM_LIMIT: &str = "500";
const STATUS_FIELD: &str = "Status";

/// GitHub through the `gh` and `git` CLIs. Requires an authenticated `gh`.
pub struct GitHubProvider {
    role: AssistantRole,
    config: WorkflowConfig,
}

impl GitHubProvider {
    pub fn new(role: AssistantRole, config: WorkflowConfig) -> Self {
        Self { role, config }
    }

    async fn fetch_issues(&self) -> AnyResult<Vec<WorkItem>> {
        let repo = self.config.repo_full_name();
        let limit = ISSUE_LIMIT.to_string();
        let issues: Vec<GhIssue> = gh_json(&[
            "issue",
            "list",
            "--repo",
            &repo,
            "--limit",
            &limit,
            "--json",
            ISSUE_FIELDS,
        ])
        .await?;
        if listing_truncated(issues.len()) {
            warn!(
                repo = %repo,
                limit = ISSUE_LIMIT,
                "Issue listing hit the limit; counts and queues may be incomplete"
            );
        }
        Ok(issues.into_iter().map(GhIssue::into_work_item).collect())
    }

    async fn fetch_issue(&self, number: u64) -> AnyResult<WorkItem> {
        let repo = self.config.repo_full_name();
        let issue: GhIssue = gh_json(&[
            "issue",
            "view",
            &number.to_string(),
            "--repo",
            &repo,
            "--json",
            ISSUE_FIELDS,
        ])
        .await?;
        Ok(issue.into_work_item())
    }

    /// Resolves project, field, option and item ids, then edits the item.
    async fn set_board_status(
        &self,
        project: u64,
        item: &WorkItem,
        status: BoardStatus,
    ) -> AnyResult<()> {
        let owner = self.config.repo_owner.as_str();
        let project_number = project.to_string();

        let view: GhProject = gh_json(&[
            "project",
            "view",
            &project_number,
            "--owner",
            owner,
            "--format",
            "json",
        ])
        .await?;

        let fields: GhFieldList = gh_json(&[
            "project",
            "field-list",
            &project_number,
            "--owner",
            owner,
            "--format",
            "json",
        ])
        .await?;
        let field = fields
            .fields
            .into_iter()
            .find(|f| f.name == STATUS_FIELD)
            .with_context(|| format!("project {project} has no '{STATUS_FIELD}' field"))?;
        let option = field
            .options
            .iter()
            .find(|o| o.name == status.label())
            .with_context(|| {
                format!("'{STATUS_FIELD}' field has no option named '{}'", status.label())
            })?;

        let items: GhItemList = gh_json(&[
            "project",
            "item-list",
            &project_number,
            "--owner",
            owner,
            "--limit",
            PROJECT_ITEM_LIMIT,
            "--format",
            "json",
        ])
        .await?;
        let repo = self.config.repo_full_name();
        let project_item = items
            .find_issue(&repo, item.number)
            .with_context(|| format!("issue {} is not on project {project}", item.number))?;

        gh(&[
            "project",
            "item-edit",
            "--id",
            &project_item.id,
            "--project-id",
            &view.id,
            "--field-id",
            &field.id,
            "--single-select-option-id",
            &option.id,
        ])
        .await?;
        Ok(())
    }
}

#[async_trait]
impl Provider for GitHubProvider {
    fn name(&self) -> &str {
        "GitHub"
    }

    fn role(&self) -> AssistantRole {
        self.role
    }

    fn config(&self) -> &WorkflowConfig {
        &self.config
    }

    async fn list_work_items(&self, status: Option<BoardStatus>) -> Result<Vec<WorkItem>> {
        match self.fetch_issues().await {
            Ok(items) => Ok(items
                .into_iter()
                .filter(|item| status.is_none() || item.board_status == status)
                .collect()),
            Err(e) => {
                warn!(error = %format!("{e:#}"), "Error getting issues");
                Ok(Vec::new())
            }
        }
    }

    async fn get_work_item(&self, number: u64) -> Result<Option<WorkItem>> {
        match self.fetch_issue(number).await {
            Ok(item) => Ok(Some(item)),
            Err(e) => {
                warn!(issue = number, error = %format!("{e:#}"), "Error getting issue");
                Ok(None)
            }
        }
    }

    async fn update_status(&self, item: &WorkItem, status: BoardStatus) -> Result<OperationResult> {
        let Some(project) = self.config.project_number else {
            return Ok(OperationResult::failed("No project number configured"));
        };
        Ok(match self.set_board_status(project, item, status).await {
            Ok(()) => OperationResult::ok(format!(
                "Updated issue {} status to {}",
                item.number, status
            )),
            Err(e) => OperationResult::from_transport("updating issue status", &e),
        })
    }

    async fn add_label(&self, item: &WorkItem, label: &str) -> Result<OperationResult> {
        let repo = self.config.repo_full_name();
        let number = item.number.to_string();
        Ok(
            match gh(&["issue", "edit", &number, "--repo", &repo, "--add-label", label]).await {
                Ok(_) => OperationResult::ok(format!(
                    "Added label '{label}' to issue {}",
                    item.number
                )),
                Err(e) => OperationResult::from_transport("adding label", &e),
            },
        )
    }

    async fn remove_label(&self, item: &WorkItem, label: &str) -> Result<OperationResult> {
        let repo = self.config.repo_full_name();
        let number = item.number.to_string();
        Ok(
            match gh(&["issue", "edit", &number, "--repo", &repo, "--remove-label", label]).await {
                Ok(_) => OperationResult::ok(format!(
                    "Removed label '{label}' from issue {}",
                    item.number
                )),
                Err(e) => OperationResult::from_transport("removing label", &e),
            },
        )
    }

    async fn create_branch(&self, item: &WorkItem) -> Result<OperationResult> {
        let branch = branch_name(item);
        Ok(match git(&["checkout", "-b", &branch]).await {
            Ok(_) => OperationResult::ok_with_output(
                format!("Created branch '{branch}' for issue {}", item.number),
                branch,
            ),
            Err(e) => OperationResult::from_transport("creating branch", &e),
        })
    }

    async fn create_commit(
        &self,
        branch: &str,
        files: &[String],
        message: &str,
    ) -> Result<OperationResult> {
        for file in files {
            if let Err(e) = git(&["add", file]).await {
                return Ok(OperationResult::from_transport("creating commit", &e));
            }
        }
        Ok(match git(&["commit", "-m", message]).await {
            Ok(stdout) => {
                OperationResult::ok_with_output(format!("Created commit on branch '{branch}'"), stdout)
            }
            Err(e) => OperationResult::from_transport("creating commit", &e),
        })
    }

    async fn push_branch(&self, branch: &str) -> Result<OperationResult> {
        Ok(match git(&["push", "origin", branch]).await {
            Ok(stdout) => {
                OperationResult::ok_with_output(format!("Pushed branch '{branch}' to remote"), stdout)
            }
            Err(e) => OperationResult::from_transport("pushing branch", &e),
        })
    }

    async fn create_pull_request(
        &self,
        title: &str,
        body: &str,
        head: &str,
        base: &str,
    ) -> Result<OperationResult> {
        let repo = self.config.repo_full_name();
        let args: &[&str] = &[
            "pr", "create", "--repo", &repo, "--title", title, "--body", body, "--head", head,
            "--base", base,
        ];
        Ok(match gh(args).await {
            // gh prints the new PR's URL
            Ok(stdout) => {
                OperationResult::ok_with_output(format!("Created PR: {title}"), stdout.trim())
            }
            Err(e) => OperationResult::from_transport("creating PR", &e),
        })
    }

    async fn comment_on_pull_request(
        &self,
        repo: &str,
        number: u64,
        text: &str,
    ) -> Result<OperationResult> {
        let number_arg = number.to_string();
        Ok(
            match gh(&["pr", "comment", &number_arg, "--repo", repo, "--body", text]).await {
                Ok(_) => OperationResult::ok(format!("Added comment to PR #{number}")),
                Err(e) => OperationResult::from_transport("commenting on PR", &e),
            },
        )
    }

    async fn validate_board(&self) -> Result<OperationResult> {
        let Some(project) = self.config.project_number else {
            return Ok(OperationResult::failed(
                "No project number configured in WorkflowConfig",
            ));
        };
        let project_number = project.to_string();
        let owner = self.config.repo_owner.as_str();
        let args: &[&str] = &["project", "view", &project_number, "--owner", owner, "--format", "json"];
        Ok(match gh_json::<GhProject>(args).await {
            Ok(view) => OperationResult::ok(format!(
                "Project board validated: {}",
                view.title.as_deref().unwrap_or("Unknown")
            )),
            Err(e) => OperationResult::failed_with_error(
                format!("Project board validation failed: {e:#}"),
                format!("{e:#}"),
            ),
        })
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GhIssue {
    number: u64,
    title: String,
    body: Option<String>,
    state: String,
    #[serde(default)]
    labels: Vec<GhLabel>,
    #[serde(default)]
    assignees: Vec<GhUser>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    url: String,
    #[serde(default)]
    project_items: Vec<GhIssueProjectItem>,
}

#[derive(Deserialize)]
struct GhLabel {
    name: String,
}

#[derive(Deserialize)]
struct GhUser {
    login: String,
}

#[derive(Deserialize)]
struct GhIssueProjectItem {
    status: Option<GhStatusValue>,
}

#[derive(Deserialize)]
struct GhStatusValue {
    name: String,
}

impl GhIssue {
    fn into_work_item(self) -> WorkItem {
        // First project item whose status is one of the board columns
        let board_status = self
            .project_items
            .iter()
            .filter_map(|p| p.status.as_ref())
            .find_map(|s| BoardStatus::from_label(&s.name));

        WorkItem {
            number: self.number,
            title: self.title,
            body: self.body.unwrap_or_default(),
            state: IssueState::from_provider(&self.state),
            labels: self.labels.into_iter().map(|l| l.name).collect(),
            assignees: self.assignees.into_iter().map(|a| a.login).collect(),
            created_at: self.created_at,
            updated_at: self.updated_at,
            url: self.url,
            board_status,
        }
    }
}

#[derive(Deserialize)]
struct GhProject {
    id: String,
    title: Option<String>,
}

#[derive(Deserialize)]
struct GhFieldList {
    fields: Vec<GhField>,
}

#[derive(Deserialize)]
struct GhField {
    id: String,
    name: String,
    #[serde(default)]
    options: Vec<GhFieldOption>,
}

#[derive(Deserialize)]
struct GhFieldOption {
    id: String,
    name: String,
}

#[derive(Deserialize)]
struct GhItemList {
    items: Vec<GhProjectItem>,
}

#[derive(Deserialize)]
struct GhProjectItem {
    id: String,
    content: Option<GhItemContent>,
}

#[derive(Deserialize)]
struct GhItemContent {
    number: Option<u64>,
    repository: Option<String>,
}

impl GhItemList {
    /// Projects can span repositories, so match the repository when gh reports one.
    fn find_issue(self, repo: &str, number: u64) -> Option<GhProjectItem> {
        self.items.into_iter().find(|item| {
            item.content.as_ref().is_some_and(|c| {
                c.number == Some(number)
                    && c.repository.as_deref().map_or(true, |r| r == repo)
            })
        })
    }
}

fn listing_truncated(count: usize) -> bool {
    count >= ISSUE_LIMIT
}

async fn run(program: &str, args: &[&str]) -> AnyResult<String> {
    let output = tokio::process::Command::new(program)
        .args(args)
        .output()
        .await
        .with_context(|| format!("Failed to run {program} CLI"))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        let command: Vec<&str> = args.iter().take(2).copied().collect();
        anyhow::bail!("{program} {} failed: {}", command.join(" "), stderr.trim());
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

async fn gh(args: &[&str]) -> AnyResult<String> {
    run("gh", args).await
}

async fn git(args: &[&str]) -> AnyResult<String> {
    run("git", args).await
}

async fn gh_json<T: DeserializeOwned>(args: &[&str]) -> AnyResult<T> {
    let stdout = gh(args).await?;
    serde_json::from_str(&stdout).context("Failed to parse gh output")
}
