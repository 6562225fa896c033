//! In-memory provider used by the unit tests.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{TimeZone, Utc};

use crate::config::WorkflowConfig;
use crate::error::Result;
use crate::model::{
    branch_name, AssistantRole, BoardStatus, IssueState, OperationResult, WorkItem,
};
use crate::providers::Provider;

pub fn work_item(number: u64, title: &str, labels: &[&str]) -> WorkItem {
    let created = Utc.with_ymd_and_hms(2025, 1, 1, 9, 0, 0).unwrap();
    WorkItem {
        number,
        title: title.to_string(),
        body: String::new(),
        state: IssueState::Open,
        labels: labels.iter().map(|l| l.to_string()).collect(),
        assignees: Vec::new(),
        created_at: created,
        updated_at: created,
        url: format!("https://github.com/acme/widgets/issues/{number}"),
        board_status: None,
    }
}

pub fn at(status: BoardStatus, mut item: WorkItem) -> WorkItem {
    item.board_status = Some(status);
    item
}

pub fn test_config() -> WorkflowConfig {
    WorkflowConfig::new("acme", "widgets").with_project_number(1)
}

/// Mutating calls seen by the board, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    UpdateStatus(u64, BoardStatus),
    AddLabel(u64, String),
    RemoveLabel(u64, String),
    CreateBranch(u64),
    CreateCommit(String),
    PushBranch(String),
    CreatePullRequest { head: String, base: String },
    Comment(u64),
}

#[derive(Default)]
struct BoardState {
    items: Vec<WorkItem>,
    calls: Vec<Call>,
    failing: HashSet<&'static str>,
}

/// Shared board behind every [`FakeProvider`] handed out by it.
#[derive(Clone, Default)]
pub struct FakeBoard {
    state: Arc<Mutex<BoardState>>,
}

impl FakeBoard {
    pub fn new(items: Vec<WorkItem>) -> Self {
        let board = Self::default();
        board.state.lock().unwrap().items = items;
        board
    }

    /// Makes every later call of `operation` fail like a broken transport.
    pub fn fail(&self, operation: &'static str) {
        self.state.lock().unwrap().failing.insert(operation);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn item(&self, number: u64) -> WorkItem {
        self.state
            .lock()
            .unwrap()
            .items
            .iter()
            .find(|i| i.number == number)
            .cloned()
            .unwrap()
    }

    pub fn provider(&self, role: AssistantRole, config: &WorkflowConfig) -> FakeProvider {
        FakeProvider {
            role,
            config: config.clone(),
            board: self.clone(),
        }
    }

    /// Records `call`, then applies `apply` to the stored item unless the
    /// operation was marked as failing.
    fn mutate(
        &self,
        operation: &'static str,
        call: Call,
        number: Option<u64>,
        apply: impl FnOnce(&mut WorkItem),
    ) -> bool {
        let mut state = self.state.lock().unwrap();
        state.calls.push(call);
        if state.failing.contains(operation) {
            return false;
        }
        if let Some(item) = number.and_then(|n| state.items.iter_mut().find(|i| i.number == n)) {
            apply(item);
        }
        true
    }
}

pub struct FakeProvider {
    role: AssistantRole,
    config: WorkflowConfig,
    board: FakeBoard,
}

fn simulated(action: &str) -> OperationResult {
    OperationResult::failed_with_error(format!("Error {action}: simulated failure"), "simulated failure")
}

#[async_trait]
impl Provider for FakeProvider {
    fn name(&self) -> &str {
        "Fake"
    }

    fn role(&self) -> AssistantRole {
        self.role
    }

    fn config(&self) -> &WorkflowConfig {
        &self.config
    }

    async fn list_work_items(&self, status: Option<BoardStatus>) -> Result<Vec<WorkItem>> {
        let state = self.board.state.lock().unwrap();
        if state.failing.contains("list_work_items") {
            return Ok(Vec::new());
        }
        Ok(state
            .items
            .iter()
            .filter(|i| status.is_none() || i.board_status == status)
            .cloned()
            .collect())
    }

    async fn get_work_item(&self, number: u64) -> Result<Option<WorkItem>> {
        let state = self.board.state.lock().unwrap();
        if state.failing.contains("get_work_item") {
            return Ok(None);
        }
        Ok(state.items.iter().find(|i| i.number == number).cloned())
    }

    async fn update_status(&self, item: &WorkItem, status: BoardStatus) -> Result<OperationResult> {
        let call = Call::UpdateStatus(item.number, status);
        Ok(
            if self.board.mutate("update_status", call, Some(item.number), |i| {
                i.board_status = Some(status)
            }) {
                OperationResult::ok(format!("Updated issue {} status to {status}", item.number))
            } else {
                simulated("updating issue status")
            },
        )
    }

    async fn add_label(&self, item: &WorkItem, label: &str) -> Result<OperationResult> {
        let call = Call::AddLabel(item.number, label.to_string());
        Ok(
            if self.board.mutate("add_label", call, Some(item.number), |i| {
                if !i.has_label(label) {
                    i.labels.push(label.to_string());
                }
            }) {
                OperationResult::ok(format!("Added label '{label}' to issue {}", item.number))
            } else {
                simulated("adding label")
            },
        )
    }

    async fn remove_label(&self, item: &WorkItem, label: &str) -> Result<OperationResult> {
        let call = Call::RemoveLabel(item.number, label.to_string());
        Ok(
            if self.board.mutate("remove_label", call, Some(item.number), |i| {
                i.labels.retain(|l| l != label)
            }) {
                OperationResult::ok(format!("Removed label '{label}' from issue {}", item.number))
            } else {
                simulated("removing label")
            },
        )
    }

    async fn create_branch(&self, item: &WorkItem) -> Result<OperationResult> {
        let branch = branch_name(item);
        Ok(
            if self.board.mutate("create_branch", Call::CreateBranch(item.number), None, |_| {}) {
                OperationResult::ok_with_output(format!("Created branch '{branch}'"), branch)
            } else {
                simulated("creating branch")
            },
        )
    }

    async fn create_commit(
        &self,
        branch: &str,
        _files: &[String],
        _message: &str,
    ) -> Result<OperationResult> {
        let call = Call::CreateCommit(branch.to_string());
        Ok(if self.board.mutate("create_commit", call, None, |_| {}) {
            OperationResult::ok(format!("Created commit on branch '{branch}'"))
        } else {
            simulated("creating commit")
        })
    }

    async fn push_branch(&self, branch: &str) -> Result<OperationResult> {
        let call = Call::PushBranch(branch.to_string());
        Ok(if self.board.mutate("push_branch", call, None, |_| {}) {
            OperationResult::ok(format!("Pushed branch '{branch}' to remote"))
        } else {
            simulated("pushing branch")
        })
    }

    async fn create_pull_request(
        &self,
        title: &str,
        _body: &str,
        head: &str,
        base: &str,
    ) -> Result<OperationResult> {
        let call = Call::CreatePullRequest {
            head: head.to_string(),
            base: base.to_string(),
        };
        Ok(if self.board.mutate("create_pull_request", call, None, |_| {}) {
            OperationResult::ok_with_output(
                format!("Created PR: {title}"),
                "https://github.com/acme/widgets/pull/1",
            )
        } else {
            simulated("creating PR")
        })
    }

    async fn comment_on_pull_request(
        &self,
        _repo: &str,
        number: u64,
        _text: &str,
    ) -> Result<OperationResult> {
        Ok(
            if self.board.mutate("comment_on_pull_request", Call::Comment(number), None, |_| {}) {
                OperationResult::ok(format!("Added comment to PR #{number}"))
            } else {
                simulated("commenting on PR")
            },
        )
    }

    async fn validate_board(&self) -> Result<OperationResult> {
        Ok(OperationResult::ok("Project board validated: Fake"))
    }
}
