// In-memory store for tasks and lists

use crate::error::{Result, StoreError};
use crate::events::{ChangeEvent, Subscription};
use crate::models::{List, ListId, Task, TaskId, now_ms};
use crate::query::QueryEngine;
use std::collections::BTreeMap;
use std::sync::mpsc;
use tracing::{debug, info};

/// Name given to the lazily created catch-all list that receives orphaned
/// tasks when their list is deleted.
pub const DEFAULT_LIST_NAME: &str = "Inbox";

/// Single source of truth for tasks and lists.
///
/// Every mutation validates fully before touching state, so a returned error
/// leaves the store unchanged. Reads hand out shared references only; all
/// writes go through the methods below. Each successful state change sends
/// one [`ChangeEvent`] to every live subscriber after it is committed.
pub struct TaskStore {
    lists: BTreeMap<ListId, List>,
    tasks: BTreeMap<TaskId, Task>,
    next_list_id: u64,
    next_task_id: u64,
    default_list: Option<ListId>,
    subscribers: Vec<mpsc::Sender<ChangeEvent>>,
}

impl TaskStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            lists: BTreeMap::new(),
            tasks: BTreeMap::new(),
            next_list_id: 1,
            next_task_id: 1,
            default_list: None,
            subscribers: Vec::new(),
        }
    }

    // ========================================================================
    // List operations
    // ========================================================================

    /// Create a list with the given name.
    ///
    /// The name is trimmed and must be non-empty and unique (case-sensitive).
    /// The new list is placed at the end of the display sequence.
    pub fn create_list(&mut self, name: &str) -> Result<ListId> {
        let name = Self::non_blank(name)?;
        self.ensure_name_free(name, None)?;

        let id = ListId(self.next_list_id);
        self.next_list_id += 1;
        let order = self.next_order();
        self.lists.insert(
            id,
            List {
                id,
                name: name.to_owned(),
                order,
            },
        );

        debug!(%id, name, order, "created list");
        self.notify(ChangeEvent::ListCreated { list: id });
        Ok(id)
    }

    /// Delete a list; its tasks move to the default list.
    ///
    /// The default list is the designated one if alive, otherwise a list
    /// named [`DEFAULT_LIST_NAME`], created as part of this transaction when
    /// missing. Tasks are never destroyed by list deletion. Returns the ids
    /// of the reassigned tasks.
    pub fn delete_list(&mut self, id: ListId) -> Result<Vec<TaskId>> {
        if !self.lists.contains_key(&id) {
            return Err(StoreError::ListNotFound(id));
        }

        let orphans: Vec<TaskId> = self
            .tasks
            .values()
            .filter(|t| t.list_id == id)
            .map(|t| t.id)
            .collect();

        // Remove first so the fallback list can reuse the freed name, then
        // close the order gap before any new list is appended.
        self.lists.remove(&id);
        self.normalize_orders();

        let target = if orphans.is_empty() {
            None
        } else {
            let target = self.resolve_cascade_target();
            for task_id in &orphans {
                if let Some(task) = self.tasks.get_mut(task_id) {
                    task.list_id = target;
                }
            }
            Some(target)
        };

        if self.default_list == Some(id) {
            self.default_list = target;
        }

        info!(%id, reassigned = orphans.len(), "deleted list");
        self.notify(ChangeEvent::ListDeleted {
            list: id,
            target,
            reassigned: orphans.clone(),
        });
        Ok(orphans)
    }

    /// Rename a list, keeping names unique.
    ///
    /// Renaming a list to its current exact name is a successful no-op.
    pub fn rename_list(&mut self, id: ListId, new_name: &str) -> Result<()> {
        let name = Self::non_blank(new_name)?;
        let unchanged = match self.lists.get(&id) {
            Some(list) => list.name == name,
            None => return Err(StoreError::ListNotFound(id)),
        };
        if unchanged {
            return Ok(());
        }
        self.ensure_name_free(name, Some(id))?;

        if let Some(list) = self.lists.get_mut(&id) {
            list.name = name.to_owned();
        }

        debug!(%id, name, "renamed list");
        self.notify(ChangeEvent::ListRenamed { list: id });
        Ok(())
    }

    /// Move a list to `position` in the display sequence (0-based).
    ///
    /// Out-of-range positions clamp to the end. The remaining lists are
    /// renumbered so order values stay unique and contiguous.
    pub fn reorder_list(&mut self, id: ListId, position: u32) -> Result<()> {
        if !self.lists.contains_key(&id) {
            return Err(StoreError::ListNotFound(id));
        }

        let mut sequence: Vec<ListId> = {
            let mut others: Vec<&List> = self.lists.values().filter(|l| l.id != id).collect();
            others.sort_by_key(|l| l.order);
            others.iter().map(|l| l.id).collect()
        };
        let slot = (position as usize).min(sequence.len());
        sequence.insert(slot, id);

        let mut renumbered: Vec<ListId> = Vec::new();
        for (pos, list_id) in sequence.iter().enumerate() {
            if let Some(list) = self.lists.get_mut(list_id) {
                if list.order != pos as u32 {
                    list.order = pos as u32;
                    renumbered.push(*list_id);
                }
            }
        }
        if renumbered.is_empty() {
            return Ok(());
        }

        debug!(%id, position, shifted = renumbered.len(), "reordered list");
        self.notify(ChangeEvent::ListReordered {
            list: id,
            renumbered,
        });
        Ok(())
    }

    /// Designate the list that receives orphans on list deletion.
    pub fn set_default_list(&mut self, id: ListId) -> Result<()> {
        if !self.lists.contains_key(&id) {
            return Err(StoreError::ListNotFound(id));
        }
        if self.default_list == Some(id) {
            return Ok(());
        }
        self.default_list = Some(id);

        debug!(%id, "designated default list");
        self.notify(ChangeEvent::DefaultListChanged { list: id });
        Ok(())
    }

    // ========================================================================
    // Task operations
    // ========================================================================

    /// Create a task in the given list.
    ///
    /// The title is trimmed and must be non-empty. New tasks start pending
    /// and sort after every existing task.
    pub fn create_task(&mut self, list_id: ListId, title: &str) -> Result<TaskId> {
        let title = Self::non_blank(title)?;
        if !self.lists.contains_key(&list_id) {
            return Err(StoreError::ListNotFound(list_id));
        }

        let id = TaskId(self.next_task_id);
        self.next_task_id += 1;
        self.tasks.insert(
            id,
            Task {
                id,
                title: title.to_owned(),
                list_id,
                completed: false,
                created_at: now_ms(),
            },
        );

        debug!(%id, %list_id, title, "created task");
        self.notify(ChangeEvent::TaskCreated { task: id, list: list_id });
        Ok(id)
    }

    /// Delete a task.
    ///
    /// A second delete of the same id fails with `TaskNotFound` and leaves
    /// the store unchanged.
    pub fn delete_task(&mut self, id: TaskId) -> Result<()> {
        let task = self.tasks.remove(&id).ok_or(StoreError::TaskNotFound(id))?;

        debug!(%id, "deleted task");
        self.notify(ChangeEvent::TaskDeleted {
            task: id,
            list: task.list_id,
        });
        Ok(())
    }

    /// Flip a task's completion state; returns the new state.
    ///
    /// Completion ratios are always computed live by queries, never stored.
    pub fn toggle_complete(&mut self, id: TaskId) -> Result<bool> {
        let task = self.tasks.get_mut(&id).ok_or(StoreError::TaskNotFound(id))?;
        task.completed = !task.completed;
        let (completed, list_id) = (task.completed, task.list_id);

        debug!(%id, completed, "toggled task");
        self.notify(ChangeEvent::TaskToggled {
            task: id,
            list: list_id,
            completed,
        });
        Ok(completed)
    }

    /// Rename a task; same title validation as [`TaskStore::create_task`].
    pub fn rename_task(&mut self, id: TaskId, new_title: &str) -> Result<()> {
        let title = Self::non_blank(new_title)?;
        let task = self.tasks.get_mut(&id).ok_or(StoreError::TaskNotFound(id))?;
        if task.title == title {
            return Ok(());
        }
        task.title = title.to_owned();
        let list_id = task.list_id;

        debug!(%id, title, "renamed task");
        self.notify(ChangeEvent::TaskRenamed {
            task: id,
            list: list_id,
        });
        Ok(())
    }

    /// Move a task to another list; a move to its current list is a
    /// successful no-op.
    pub fn move_to_list(&mut self, id: TaskId, target: ListId) -> Result<()> {
        if !self.lists.contains_key(&target) {
            return Err(StoreError::ListNotFound(target));
        }
        let task = self.tasks.get_mut(&id).ok_or(StoreError::TaskNotFound(id))?;
        if task.list_id == target {
            return Ok(());
        }
        let from = task.list_id;
        task.list_id = target;

        debug!(%id, %from, to = %target, "moved task");
        self.notify(ChangeEvent::TaskMoved {
            task: id,
            from,
            to: target,
        });
        Ok(())
    }

    /// Duplicate a task into the same list.
    ///
    /// The copy gets a fresh id, starts pending regardless of the source's
    /// state, and sorts after the source.
    pub fn duplicate_task(&mut self, id: TaskId) -> Result<TaskId> {
        let (title, list_id) = match self.tasks.get(&id) {
            Some(task) => (task.title.clone(), task.list_id),
            None => return Err(StoreError::TaskNotFound(id)),
        };

        let copy = TaskId(self.next_task_id);
        self.next_task_id += 1;
        self.tasks.insert(
            copy,
            Task {
                id: copy,
                title,
                list_id,
                completed: false,
                created_at: now_ms(),
            },
        );

        debug!(source = %id, %copy, "duplicated task");
        self.notify(ChangeEvent::TaskDuplicated {
            source: id,
            copy,
            list: list_id,
        });
        Ok(copy)
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// Read-only view of one task.
    pub fn get_task(&self, id: TaskId) -> Option<&Task> {
        self.tasks.get(&id)
    }

    /// Read-only view of one list.
    pub fn get_list(&self, id: ListId) -> Option<&List> {
        self.lists.get(&id)
    }

    /// Look a list up by exact name (case-sensitive).
    pub fn find_list(&self, name: &str) -> Option<&List> {
        self.lists.values().find(|l| l.name == name)
    }

    /// All lists in display order.
    pub fn lists(&self) -> impl Iterator<Item = &List> {
        let mut items: Vec<&List> = self.lists.values().collect();
        items.sort_by_key(|l| l.order);
        items.into_iter()
    }

    /// All tasks in default order: `created_at` ascending, ties broken by
    /// ascending id.
    pub fn tasks(&self) -> impl Iterator<Item = &Task> {
        let mut items: Vec<&Task> = self.tasks.values().collect();
        items.sort_by_key(|t| (t.created_at, t.id));
        items.into_iter()
    }

    /// The currently designated default list, if any.
    pub fn default_list(&self) -> Option<&List> {
        self.default_list.and_then(|id| self.lists.get(&id))
    }

    pub fn list_count(&self) -> usize {
        self.lists.len()
    }

    pub fn task_count(&self) -> usize {
        self.tasks.len()
    }

    /// Borrow-scoped read surface over the current snapshot.
    pub fn query(&self) -> QueryEngine<'_> {
        QueryEngine::new(self)
    }

    // ========================================================================
    // Change notification
    // ========================================================================

    /// Register a subscriber; every subsequent committed state change is
    /// delivered to the returned handle.
    pub fn subscribe(&mut self) -> Subscription {
        let (tx, rx) = mpsc::channel();
        self.subscribers.push(tx);
        Subscription::new(rx)
    }

    fn notify(&mut self, event: ChangeEvent) {
        if self.subscribers.is_empty() {
            return;
        }
        // Dropped subscribers fail the send and are pruned here.
        self.subscribers.retain(|tx| tx.send(event.clone()).is_ok());
    }

    // ========================================================================
    // Snapshot restore support
    // ========================================================================

    /// Adopt a list during snapshot restore, bypassing event fan-out.
    ///
    /// Rejects id or name collisions; the id counter resumes above every
    /// adopted id.
    pub(crate) fn restore_list(&mut self, list: List) -> bool {
        if self.lists.contains_key(&list.id) || self.find_list(&list.name).is_some() {
            return false;
        }
        self.next_list_id = self.next_list_id.max(list.id.0 + 1);
        self.lists.insert(list.id, list);
        true
    }

    /// Adopt a task during snapshot restore; rejects id collisions and
    /// tasks whose list is not present.
    pub(crate) fn restore_task(&mut self, task: Task) -> bool {
        if self.tasks.contains_key(&task.id) || !self.lists.contains_key(&task.list_id) {
            return false;
        }
        self.next_task_id = self.next_task_id.max(task.id.0 + 1);
        self.tasks.insert(task.id, task);
        true
    }

    /// Re-adopt the default designation if the list survived the restore.
    pub(crate) fn restore_default(&mut self, id: ListId) -> bool {
        if self.lists.contains_key(&id) {
            self.default_list = Some(id);
            true
        } else {
            false
        }
    }

    /// Renumber list orders to be unique and contiguous from 0, preserving
    /// the current sequence (ties broken by id).
    pub(crate) fn normalize_orders(&mut self) {
        let mut sequence: Vec<ListId> = {
            let mut all: Vec<&List> = self.lists.values().collect();
            all.sort_by_key(|l| (l.order, l.id));
            all.iter().map(|l| l.id).collect()
        };
        for (pos, list_id) in sequence.drain(..).enumerate() {
            if let Some(list) = self.lists.get_mut(&list_id) {
                list.order = pos as u32;
            }
        }
    }

    // ========================================================================
    // Validation helpers
    // ========================================================================

    /// Trimmed view of `raw`, or `EmptyTitle` if nothing remains.
    fn non_blank(raw: &str) -> Result<&str> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(StoreError::EmptyTitle);
        }
        Ok(trimmed)
    }

    fn ensure_name_free(&self, name: &str, exclude: Option<ListId>) -> Result<()> {
        let taken = self
            .lists
            .values()
            .any(|l| l.name == name && Some(l.id) != exclude);
        if taken {
            return Err(StoreError::DuplicateListName(name.to_owned()));
        }
        Ok(())
    }

    fn next_order(&self) -> u32 {
        self.lists.values().map(|l| l.order).max().map_or(0, |m| m + 1)
    }

    /// Pick or create the list that receives orphans during a cascade.
    ///
    /// Runs after the dying list is removed, so a freed `Inbox` name can be
    /// reused immediately. Whatever it resolves becomes the designation.
    fn resolve_cascade_target(&mut self) -> ListId {
        if let Some(id) = self.default_list {
            if self.lists.contains_key(&id) {
                return id;
            }
        }
        if let Some(list) = self.find_list(DEFAULT_LIST_NAME) {
            let id = list.id;
            self.default_list = Some(id);
            return id;
        }

        let id = ListId(self.next_list_id);
        self.next_list_id += 1;
        let order = self.next_order();
        self.lists.insert(
            id,
            List {
                id,
                name: DEFAULT_LIST_NAME.to_owned(),
                order,
            },
        );
        self.default_list = Some(id);
        info!(%id, "created default list for reassignment");
        id
    }
}

impl Default for TaskStore {
    fn default() -> Self {
        Self::new()
    }
}
