pub mod branch;
pub mod outcome;
pub mod role;
pub mod status;
pub mod work_item;

pub use branch::{branch_name, BranchType};
pub use outcome::OperationResult;
pub use role::AssistantRole;
pub use status::{BoardStatus, IssueState};
pub use work_item::{slugify, WorkItem};
