use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ParseStatusError;

/// Kanban column of a work item on the project board.
///
/// The label of each variant is written verbatim to the board's `Status`
/// field and compared against it when reading, so it must not change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum BoardStatus {
    #[serde(rename = "📋 ToDo")]
    ToDo,
    #[serde(rename = "🔄 Doing")]
    Doing,
    #[serde(rename = "👀 Review")]
    Review,
    #[serde(rename = "🧪 Testing")]
    Testing,
    #[serde(rename = "✅ Done")]
    Done,
}

impl BoardStatus {
    /// Pipeline order.
    pub const ALL: [BoardStatus; 5] = [
        BoardStatus::ToDo,
        BoardStatus::Doing,
        BoardStatus::Review,
        BoardStatus::Testing,
        BoardStatus::Done,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            BoardStatus::ToDo => "📋 ToDo",
            BoardStatus::Doing => "🔄 Doing",
            BoardStatus::Review => "👀 Review",
            BoardStatus::Testing => "🧪 Testing",
            BoardStatus::Done => "✅ Done",
        }
    }

    /// Column name without the emoji.
    pub fn name(&self) -> &'static str {
        match self {
            BoardStatus::ToDo => "ToDo",
            BoardStatus::Doing => "Doing",
            BoardStatus::Review => "Review",
            BoardStatus::Testing => "Testing",
            BoardStatus::Done => "Done",
        }
    }

    /// Exact match against the board labels.
    pub fn from_label(label: &str) -> Option<BoardStatus> {
        BoardStatus::ALL.into_iter().find(|s| s.label() == label)
    }
}

impl fmt::Display for BoardStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for BoardStatus {
    type Err = ParseStatusError;

    /// Accepts the board label or the bare column name (`todo`, `Review`, ...).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some(status) = BoardStatus::from_label(s) {
            return Ok(status);
        }
        BoardStatus::ALL
            .into_iter()
            .find(|status| status.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| ParseStatusError(s.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueState {
    Open,
    Closed,
}

impl IssueState {
    /// `gh` reports `OPEN`/`CLOSED`; anything that is not closed counts as open.
    pub fn from_provider(raw: &str) -> IssueState {
        if raw.eq_ignore_ascii_case("closed") {
            IssueState::Closed
        } else {
            IssueState::Open
        }
    }
}
