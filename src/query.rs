// Read-only queries over the store

use crate::error::{Result, StoreError};
use crate::models::{List, ListId, Task};
use crate::store::TaskStore;
use std::fmt;

/// Completed/pending tally for a set of tasks.
///
/// Always computed live from task state; nothing here is stored or cached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CompletionCounts {
    pub completed: usize,
    pub pending: usize,
}

impl CompletionCounts {
    pub fn total(&self) -> usize {
        self.completed + self.pending
    }

    fn tally<'a>(tasks: impl Iterator<Item = &'a Task>) -> Self {
        let mut counts = Self::default();
        for task in tasks {
            if task.completed {
                counts.completed += 1;
            } else {
                counts.pending += 1;
            }
        }
        counts
    }
}

impl fmt::Display for CompletionCounts {
    /// Renders as `completed/total`, e.g. `1/5`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.completed, self.total())
    }
}

/// Criteria for narrowing a task iteration.
///
/// Unset fields match everything; set fields must all hold. Title matching
/// is case-insensitive substring.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskFilter {
    list: Option<ListId>,
    completed: Option<bool>,
    title: Option<String>,
}

impl TaskFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_list(mut self, list: ListId) -> Self {
        self.list = Some(list);
        self
    }

    pub fn with_completed(mut self, completed: bool) -> Self {
        self.completed = Some(completed);
        self
    }

    pub fn with_title(mut self, term: &str) -> Self {
        self.title = Some(term.to_lowercase());
        self
    }

    pub fn matches(&self, task: &Task) -> bool {
        if let Some(list) = self.list {
            if task.list_id != list {
                return false;
            }
        }
        if let Some(completed) = self.completed {
            if task.completed != completed {
                return false;
            }
        }
        if let Some(needle) = &self.title {
            if !task.title.to_lowercase().contains(needle) {
                return false;
            }
        }
        true
    }
}

/// Read surface over a borrowed [`TaskStore`].
///
/// Obtained from [`TaskStore::query`]. Holds a shared borrow for its whole
/// lifetime, so results always reflect the state at the time of iteration
/// and the store cannot be mutated while one is alive. Task-yielding
/// queries use the default order: `created_at` ascending, id as tiebreak.
#[derive(Clone, Copy)]
pub struct QueryEngine<'a> {
    store: &'a TaskStore,
}

impl<'a> QueryEngine<'a> {
    pub(crate) fn new(store: &'a TaskStore) -> Self {
        Self { store }
    }

    /// Tasks of one list in default order.
    pub fn list_tasks(self, list: ListId) -> Result<impl Iterator<Item = &'a Task> + use<'a>> {
        if self.store.get_list(list).is_none() {
            return Err(StoreError::ListNotFound(list));
        }
        Ok(self.store.tasks().filter(move |t| t.list_id == list))
    }

    /// Tasks matching all criteria of `filter`, in default order.
    pub fn filtered(self, filter: TaskFilter) -> impl Iterator<Item = &'a Task> + use<'a> {
        self.store.tasks().filter(move |t| filter.matches(t))
    }

    /// Tasks whose title contains `term`, case-insensitively.
    ///
    /// Matching happens per item as the iterator is driven. An empty term
    /// matches every task.
    pub fn search(self, term: &str) -> impl Iterator<Item = &'a Task> + use<'a> {
        let needle = term.to_lowercase();
        self.store
            .tasks()
            .filter(move |t| t.title.to_lowercase().contains(&needle))
    }

    /// Lists whose name contains `term`, case-insensitively, in display
    /// order.
    pub fn search_lists(self, term: &str) -> impl Iterator<Item = &'a List> + use<'a> {
        let needle = term.to_lowercase();
        self.store
            .lists()
            .filter(move |l| l.name.to_lowercase().contains(&needle))
    }

    /// Live `(completed, total)` pair for one list, e.g. for a `1/5` badge.
    ///
    /// `(0, 0)` for an empty list; turning that into a percentage is the
    /// caller's concern.
    pub fn completion_ratio(self, list: ListId) -> Result<(usize, usize)> {
        let counts = self.count_by_completion(list)?;
        Ok((counts.completed, counts.total()))
    }

    /// Live completed/pending partition of one list's tasks.
    pub fn count_by_completion(self, list: ListId) -> Result<CompletionCounts> {
        Ok(CompletionCounts::tally(self.list_tasks(list)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TaskId;

    /// Store with forged timestamps so ordering is deterministic.
    ///
    /// Today holds five tasks created out of id order; task 2 is completed.
    fn fixture() -> TaskStore {
        let mut store = TaskStore::new();
        for (id, name, order) in [(1, "Today", 0), (2, "Work", 1), (3, "Upcoming", 2)] {
            assert!(store.restore_list(List {
                id: ListId(id),
                name: name.to_owned(),
                order,
            }));
        }
        let rows: [(u64, &str, u64, bool, i64); 6] = [
            (1, "Promote Bento Cards v.2", 1, false, 300),
            (2, "Ship onboarding flow", 1, true, 100),
            (3, "Review design tokens", 1, false, 100),
            (4, "Draft Q3 roadmap", 2, false, 200),
            (5, "Plan team offsite", 1, false, 200),
            (6, "Write release notes", 1, false, 500),
        ];
        for (id, title, list, completed, created_at) in rows {
            assert!(store.restore_task(Task {
                id: TaskId(id),
                title: title.to_owned(),
                list_id: ListId(list),
                completed,
                created_at,
            }));
        }
        store
    }

    fn ids<'a>(tasks: impl Iterator<Item = &'a Task>) -> Vec<u64> {
        tasks.map(|t| t.id.0).collect()
    }

    #[test]
    fn test_list_tasks_default_order_with_tiebreak() {
        let store = fixture();
        // Equal timestamps fall back to ascending id: 2 and 3 at 100, then
        // 5 at 200, 1 at 300, 6 at 500.
        let got = ids(store.query().list_tasks(ListId(1)).unwrap());
        assert_eq!(got, [2, 3, 5, 1, 6]);
    }

    #[test]
    fn test_list_tasks_missing_list_errors() {
        let store = fixture();
        // `err()` rather than `unwrap_err()`: the Ok side is an opaque
        // iterator without a Debug impl.
        let err = store.query().list_tasks(ListId(99)).err().unwrap();
        assert_eq!(err, StoreError::ListNotFound(ListId(99)));
    }

    #[test]
    fn test_list_tasks_empty_list_yields_nothing() {
        let store = fixture();
        assert_eq!(store.query().list_tasks(ListId(3)).unwrap().count(), 0);
    }

    #[test]
    fn test_search_is_case_insensitive() {
        let store = fixture();
        assert_eq!(ids(store.query().search("BENTO")), [1]);
        assert_eq!(ids(store.query().search("bento")), [1]);
        // Substring, not whole-word.
        assert_eq!(ids(store.query().search("oad")), [4]);
        assert_eq!(store.query().search("no such task").count(), 0);
    }

    #[test]
    fn test_search_empty_term_matches_all() {
        let store = fixture();
        // Every task, in default order.
        assert_eq!(ids(store.query().search("")), [2, 3, 4, 5, 1, 6]);
        assert_eq!(store.query().search("").count(), store.task_count());
    }

    #[test]
    fn test_search_lists() {
        let store = fixture();
        let names: Vec<&str> = store.query().search_lists("o").map(|l| l.name.as_str()).collect();
        assert_eq!(names, ["Today", "Work", "Upcoming"]);
        let names: Vec<&str> = store.query().search_lists("up").map(|l| l.name.as_str()).collect();
        assert_eq!(names, ["Upcoming"]);
        assert_eq!(store.query().search_lists("zzz").count(), 0);
    }

    #[test]
    fn test_completion_ratio_is_live() {
        let mut store = fixture();
        assert_eq!(store.query().completion_ratio(ListId(1)).unwrap(), (1, 5));

        // Toggling immediately shows up; nothing is cached.
        store.toggle_complete(TaskId(1)).unwrap();
        assert_eq!(store.query().completion_ratio(ListId(1)).unwrap(), (2, 5));

        assert!(store.query().completion_ratio(ListId(99)).is_err());
    }

    #[test]
    fn test_completion_ratio_empty_list() {
        let store = fixture();
        assert_eq!(store.query().completion_ratio(ListId(3)).unwrap(), (0, 0));
    }

    #[test]
    fn test_count_by_completion_partitions_one_list() {
        let mut store = TaskStore::new();
        let work = store.create_list("Work").unwrap();
        store.create_task(work, "A").unwrap();
        let b = store.create_task(work, "B").unwrap();
        store.create_task(work, "C").unwrap();
        store.toggle_complete(b).unwrap();

        let counts = store.query().count_by_completion(work).unwrap();
        assert_eq!(counts, CompletionCounts { completed: 1, pending: 2 });
        assert_eq!(counts.total(), 3);
        assert_eq!(counts.to_string(), "1/3");

        assert_eq!(
            store.query().count_by_completion(ListId(99)).unwrap_err(),
            StoreError::ListNotFound(ListId(99))
        );
    }

    #[test]
    fn test_filter_combinations() {
        let store = fixture();

        let f = TaskFilter::new().with_list(ListId(1)).with_completed(false);
        assert_eq!(ids(store.query().filtered(f)), [3, 5, 1, 6]);

        let f = TaskFilter::new().with_title("ROADMAP");
        assert_eq!(ids(store.query().filtered(f)), [4]);

        let f = TaskFilter::new()
            .with_list(ListId(2))
            .with_completed(true)
            .with_title("roadmap");
        assert_eq!(store.query().filtered(f).count(), 0);

        // An empty filter matches everything.
        assert_eq!(store.query().filtered(TaskFilter::new()).count(), 6);
    }

    #[test]
    fn test_engine_is_copy_across_calls() {
        let store = fixture();
        let q = store.query();
        let (_, total) = q.completion_ratio(ListId(1)).unwrap();
        let found = q.search("bento").count();
        assert_eq!((total, found), (5, 1));
    }
}
