// Data models for tasklists

use serde::{Deserialize, Serialize};
use std::fmt;
use std::num::ParseIntError;
use std::str::FromStr;

/// Unique identifier for a task, assigned by the store at creation.
///
/// Ids come from a per-store monotonically increasing counter and are never
/// reused within a store's lifetime. The newtype keeps task ids and list ids
/// from being mixed up at the API boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(pub(crate) u64);

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for TaskId {
    type Err = ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.parse()?))
    }
}

/// Unique identifier for a list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ListId(pub(crate) u64);

impl fmt::Display for ListId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ListId {
    type Err = ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.parse()?))
    }
}

/// A single actionable item belonging to exactly one list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    /// Non-empty title; the store trims surrounding whitespace on write.
    pub title: String,
    /// Owning list; always references an existing list.
    pub list_id: ListId,
    pub completed: bool,
    /// Unix epoch milliseconds; ordering key for the default sort, ties
    /// broken by ascending id.
    pub created_at: i64,
}

/// A named, ordered grouping of tasks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct List {
    pub id: ListId,
    /// Non-empty and unique among lists (case-sensitive).
    pub name: String,
    /// Display position; unique and contiguous from 0 across all lists.
    pub order: u32,
}

/// Helper function to get current timestamp in milliseconds
pub fn now_ms() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("System time before Unix epoch")
        .as_millis() as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_now_ms() {
        let ts = now_ms();
        assert!(ts > 0);
        // Should be reasonable timestamp (after year 2020)
        assert!(ts > 1_600_000_000_000);
    }

    #[test]
    fn test_id_display_and_parse_roundtrip() {
        let id = TaskId(42);
        assert_eq!(id.to_string(), "42");
        assert_eq!("42".parse::<TaskId>().unwrap(), id);

        let id = ListId(7);
        assert_eq!(id.to_string(), "7");
        assert_eq!("7".parse::<ListId>().unwrap(), id);

        assert!("not-a-number".parse::<TaskId>().is_err());
    }

    #[test]
    fn test_id_serializes_as_bare_number() {
        let json = serde_json::to_string(&TaskId(9)).unwrap();
        assert_eq!(json, "9");

        let id: ListId = serde_json::from_str("3").unwrap();
        assert_eq!(id, ListId(3));
    }

    #[test]
    fn test_task_serialization() {
        let task = Task {
            id: TaskId(1),
            title: "Promote Bento Cards v.2".to_string(),
            list_id: ListId(2),
            completed: false,
            created_at: 1000,
        };

        let json = serde_json::to_string(&task).unwrap();
        let deserialized: Task = serde_json::from_str(&json).unwrap();
        assert_eq!(deserialized, task);
        assert!(json.contains("\"list_id\":2"));
    }

    #[test]
    fn test_list_serialization() {
        let list = List {
            id: ListId(1),
            name: "Upcoming".to_string(),
            order: 2,
        };

        let json = serde_json::to_string(&list).unwrap();
        let deserialized: List = serde_json::from_str(&json).unwrap();
        assert_eq!(deserialized, list);
    }
}
