// Change notifications emitted by the store

use crate::models::{ListId, TaskId};
use serde::{Deserialize, Serialize};
use std::sync::mpsc;

/// Notification sent to subscribers after a successful state-changing
/// mutation.
///
/// The variant names the operation kind; its fields carry the affected ids,
/// so a front-end can refresh only the touched region instead of re-querying
/// everything. A cascading operation is reported as a single event for the
/// whole transaction: deleting a list emits one `ListDeleted` carrying every
/// reassigned task id (and the target may be a list the cascade itself
/// created). Successful no-ops emit nothing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum ChangeEvent {
    ListCreated { list: ListId },
    ListRenamed { list: ListId },
    ListReordered {
        list: ListId,
        /// Every list whose display position shifted, the moved one included.
        renumbered: Vec<ListId>,
    },
    ListDeleted {
        list: ListId,
        /// Where orphaned tasks went; `None` when the list was empty.
        target: Option<ListId>,
        reassigned: Vec<TaskId>,
    },
    DefaultListChanged { list: ListId },
    TaskCreated { task: TaskId, list: ListId },
    TaskDeleted { task: TaskId, list: ListId },
    TaskToggled { task: TaskId, list: ListId, completed: bool },
    TaskRenamed { task: TaskId, list: ListId },
    TaskMoved { task: TaskId, from: ListId, to: ListId },
    TaskDuplicated { source: TaskId, copy: TaskId, list: ListId },
}

impl ChangeEvent {
    /// Stable name of the operation kind, for logging and dispatch tables.
    pub fn kind(&self) -> &'static str {
        match self {
            ChangeEvent::ListCreated { .. } => "list_created",
            ChangeEvent::ListRenamed { .. } => "list_renamed",
            ChangeEvent::ListReordered { .. } => "list_reordered",
            ChangeEvent::ListDeleted { .. } => "list_deleted",
            ChangeEvent::DefaultListChanged { .. } => "default_list_changed",
            ChangeEvent::TaskCreated { .. } => "task_created",
            ChangeEvent::TaskDeleted { .. } => "task_deleted",
            ChangeEvent::TaskToggled { .. } => "task_toggled",
            ChangeEvent::TaskRenamed { .. } => "task_renamed",
            ChangeEvent::TaskMoved { .. } => "task_moved",
            ChangeEvent::TaskDuplicated { .. } => "task_duplicated",
        }
    }
}

/// Receiving end of a store subscription.
///
/// Events accumulate in order until polled; polling never blocks and never
/// observes a half-applied mutation, because the store sends only after a
/// transaction is fully committed. Dropping the subscription detaches it;
/// the store prunes the dead sender on its next notification.
pub struct Subscription {
    rx: mpsc::Receiver<ChangeEvent>,
}

impl Subscription {
    pub(crate) fn new(rx: mpsc::Receiver<ChangeEvent>) -> Self {
        Self { rx }
    }

    /// Next pending event, if any.
    pub fn poll(&self) -> Option<ChangeEvent> {
        self.rx.try_recv().ok()
    }

    /// Drains every event delivered so far, oldest first.
    pub fn drain(&self) -> Vec<ChangeEvent> {
        self.rx.try_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_kind_names() {
        let event = ChangeEvent::TaskCreated {
            task: TaskId(1),
            list: ListId(2),
        };
        assert_eq!(event.kind(), "task_created");

        let event = ChangeEvent::ListDeleted {
            list: ListId(2),
            target: None,
            reassigned: vec![],
        };
        assert_eq!(event.kind(), "list_deleted");
    }

    #[test]
    fn test_event_serialization() {
        let event = ChangeEvent::TaskMoved {
            task: TaskId(4),
            from: ListId(1),
            to: ListId(2),
        };
        let json = serde_json::to_string(&event).unwrap();
        assert_eq!(json, r#"{"op":"task_moved","task":4,"from":1,"to":2}"#);

        let back: ChangeEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(back, event);
    }

    #[test]
    fn test_subscription_poll_and_drain() {
        let (tx, rx) = mpsc::channel();
        let sub = Subscription::new(rx);

        assert!(sub.poll().is_none());

        tx.send(ChangeEvent::ListCreated { list: ListId(1) }).unwrap();
        tx.send(ChangeEvent::TaskCreated {
            task: TaskId(1),
            list: ListId(1),
        })
        .unwrap();

        let events = sub.drain();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].kind(), "list_created");
        assert_eq!(events[1].kind(), "task_created");
        assert!(sub.poll().is_none());
    }
}
