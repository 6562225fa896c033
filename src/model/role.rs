use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ParseRoleError;

/// Prefix shared by every assignment label, e.g. `assigned:ai-coder`.
pub const ASSIGNED_PREFIX: &str = "assigned:";

/// Every role tag starts with this; `assigned:alice` is a human assignment.
pub const AI_TAG_PREFIX: &str = "ai-";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AssistantRole {
    #[serde(rename = "ai-coder")]
    Coder,
    #[serde(rename = "ai-reviewer")]
    Reviewer,
    #[serde(rename = "ai-tester")]
    Tester,
    #[serde(rename = "ai-researcher")]
    Researcher,
    #[serde(rename = "ai-marketeer")]
    Marketer,
}

impl AssistantRole {
    pub const ALL: [AssistantRole; 5] = [
        AssistantRole::Coder,
        AssistantRole::Reviewer,
        AssistantRole::Tester,
        AssistantRole::Researcher,
        AssistantRole::Marketer,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AssistantRole::Coder => "ai-coder",
            AssistantRole::Reviewer => "ai-reviewer",
            AssistantRole::Tester => "ai-tester",
            AssistantRole::Researcher => "ai-researcher",
            AssistantRole::Marketer => "ai-marketeer",
        }
    }

    /// The label that marks a work item as owned by this role.
    pub fn label(&self) -> String {
        format!("{ASSIGNED_PREFIX}{}", self.as_str())
    }

    pub fn emoji(&self) -> &'static str {
        match self {
            AssistantRole::Coder => "\u{1F4BB}",
            AssistantRole::Reviewer => "\u{1F50D}",
            AssistantRole::Tester => "\u{1F9EA}",
            AssistantRole::Researcher => "\u{1F4DA}",
            AssistantRole::Marketer => "\u{1F4E3}",
        }
    }
}

impl fmt::Display for AssistantRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AssistantRole {
    type Err = ParseRoleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.to_ascii_lowercase();
        let bare = lower.strip_prefix("ai-").unwrap_or(&lower);
        match bare {
            "coder" => Ok(AssistantRole::Coder),
            "reviewer" => Ok(AssistantRole::Reviewer),
            "tester" => Ok(AssistantRole::Tester),
            "researcher" => Ok(AssistantRole::Researcher),
            "marketeer" | "marketer" => Ok(AssistantRole::Marketer),
            _ => Err(ParseRoleError(s.to_string())),
        }
    }
}
