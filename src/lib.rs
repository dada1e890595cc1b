// Tasklists - Task and list management with an in-memory store and JSONL snapshots

pub mod error;
pub mod events;
pub mod models;
pub mod query;
pub mod snapshot;
pub mod store;

// Re-export main types for convenience
pub use error::{Result, StoreError};
pub use events::{ChangeEvent, Subscription};
pub use models::{List, ListId, Task, TaskId, now_ms};
pub use query::{CompletionCounts, QueryEngine, TaskFilter};
pub use store::{DEFAULT_LIST_NAME, TaskStore};
