// Typed errors for store operations

use crate::models::{ListId, TaskId};

/// Convenience alias for fallible store and query calls.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Error taxonomy for `TaskStore` mutations and `QueryEngine` reads.
///
/// Every error is raised synchronously by the offending call. Validation
/// runs before any state is touched, so a failed operation leaves the store
/// exactly as it was.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// Referenced task id does not exist.
    #[error("task not found: {0}")]
    TaskNotFound(TaskId),

    /// Referenced list id does not exist.
    #[error("list not found: {0}")]
    ListNotFound(ListId),

    /// List name collides with an existing list (case-sensitive match).
    #[error("duplicate list name: `{0}`")]
    DuplicateListName(String),

    /// Task title or list name is blank after trimming.
    #[error("blank title or list name")]
    EmptyTitle,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        assert_eq!(
            StoreError::TaskNotFound(TaskId(12)).to_string(),
            "task not found: 12"
        );
        assert_eq!(
            StoreError::ListNotFound(ListId(3)).to_string(),
            "list not found: 3"
        );
        assert_eq!(
            StoreError::DuplicateListName("Work".into()).to_string(),
            "duplicate list name: `Work`"
        );
        assert_eq!(StoreError::EmptyTitle.to_string(), "blank title or list name");
    }
}
