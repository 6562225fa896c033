use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::role::{ASSIGNED_PREFIX, AI_TAG_PREFIX};
use super::status::{BoardStatus, IssueState};

const SLUG_MAX_LEN: usize = 30;

/// An issue on the hosting provider. Providers return a fresh copy on every
/// read; nothing in the workflow mutates one in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkItem {
    pub number: u64,
    pub title: String,
    #[serde(default)]
    pub body: String,
    pub state: IssueState,
    /// Kept in provider order: `assigned_role` returns the first match.
    #[serde(default)]
    pub labels: Vec<String>,
    #[serde(default)]
    pub assignees: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub board_status: Option<BoardStatus>,
}

impl WorkItem {
    pub fn slug(&self) -> String {
        slugify(&self.title)
    }

    pub fn has_label(&self, label: &str) -> bool {
        self.labels.iter().any(|l| l == label)
    }

    pub fn is_assigned_to_ai(&self) -> bool {
        self.labels.iter().any(|l| ai_role_tag(l).is_some())
    }

    /// Role tag of the first `assigned:ai-*` label, e.g. `ai-coder`.
    pub fn assigned_role(&self) -> Option<&str> {
        self.labels.iter().find_map(|l| ai_role_tag(l))
    }

    /// Every `assigned:ai-*` label, in label order. Other `assigned:` labels
    /// belong to people and are left alone.
    pub fn assignment_labels(&self) -> impl Iterator<Item = &str> {
        self.labels
            .iter()
            .map(String::as_str)
            .filter(|l| ai_role_tag(l).is_some())
    }
}

fn ai_role_tag(label: &str) -> Option<&str> {
    label
        .strip_prefix(ASSIGNED_PREFIX)
        .filter(|tag| tag.starts_with(AI_TAG_PREFIX))
}

/// Branch-safe short name for a title.
///
/// Keeps ASCII alphanumerics, turns whitespace into `-`, lowercases, cuts to
/// 30 characters and drops trailing hyphens. Output only ever contains
/// `[a-z0-9-]`.
pub fn slugify(title: &str) -> String {
    let slug: String = title
        .chars()
        .filter_map(|c| {
            if c.is_ascii_alphanumeric() {
                Some(c.to_ascii_lowercase())
            } else if c.is_whitespace() {
                Some('-')
            } else {
                None
            }
        })
        .take(SLUG_MAX_LEN)
        .collect();
    slug.trim_end_matches('-').to_string()
}
