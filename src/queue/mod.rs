//! The search frontier: bounded priority queues of [workspace nodes](WorkspaceNode).

pub mod count_balanced;
pub mod priority;

pub use count_balanced::CountBalancedQueue;
pub use priority::{priority, WorkspaceNode, WorkspacePriorityQueue};
