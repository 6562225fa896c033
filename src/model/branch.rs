use std::fmt;

use super::work_item::WorkItem;

/// Single-letter branch prefix chosen from an item's type label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BranchType {
    Bug,
    Documentation,
    Feature,
    Research,
    Test,
}

impl BranchType {
    /// Tie-break order when an item carries several type labels.
    const PRIORITY: [BranchType; 5] = [
        BranchType::Bug,
        BranchType::Documentation,
        BranchType::Feature,
        BranchType::Research,
        BranchType::Test,
    ];

    pub fn prefix(&self) -> &'static str {
        match self {
            BranchType::Bug => "B",
            BranchType::Documentation => "D",
            BranchType::Feature => "F",
            BranchType::Research => "R",
            BranchType::Test => "T",
        }
    }

    /// The issue label that selects this type.
    pub fn type_label(&self) -> &'static str {
        match self {
            BranchType::Bug => "bug",
            BranchType::Documentation => "documentation",
            BranchType::Feature => "feature",
            BranchType::Research => "research",
            BranchType::Test => "test",
        }
    }

    /// Defaults to `Feature` when no type label is present.
    pub fn from_labels(labels: &[String]) -> BranchType {
        BranchType::PRIORITY
            .into_iter()
            .find(|t| labels.iter().any(|l| l == t.type_label()))
            .unwrap_or(BranchType::Feature)
    }
}

impl fmt::Display for BranchType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.prefix())
    }
}

/// `{prefix}/{number}/{slug}`, e.g. `F/123/add-user-auth`.
pub fn branch_name(item: &WorkItem) -> String {
    let branch_type = BranchType::from_labels(&item.labels);
    format!("{}/{}/{}", branch_type.prefix(), item.number, item.slug())
}
