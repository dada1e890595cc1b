// Snapshot persistence in JSONL

use crate::models::{List, ListId, Task};
use crate::store::TaskStore;
use eyre::{Context, Result};
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

const SNAPSHOT_VERSION: u32 = 1;

/// One line of a snapshot file, discriminated by a `kind` field.
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum Line {
    Meta {
        version: u32,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        default_list: Option<ListId>,
    },
    List(List),
    Task(Task),
}

/// Write the whole store to `path`, replacing any previous snapshot.
///
/// The file is written to a `.tmp` sibling, synced, then renamed into
/// place, so readers only ever see a complete snapshot. Lists are written
/// in display order and tasks in default order, mostly so diffs of the
/// file stay readable.
pub fn save(store: &TaskStore, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).context("Failed to create snapshot directory")?;
        }
    }

    let tmp = sibling(path, "tmp");
    let mut file = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(&tmp)
        .context("Failed to open snapshot file for writing")?;

    let meta = Line::Meta {
        version: SNAPSHOT_VERSION,
        default_list: store.default_list().map(|l| l.id),
    };
    writeln!(file, "{}", serde_json::to_string(&meta)?)?;
    for list in store.lists() {
        writeln!(file, "{}", serde_json::to_string(&Line::List(list.clone()))?)?;
    }
    for task in store.tasks() {
        writeln!(file, "{}", serde_json::to_string(&Line::Task(task.clone()))?)?;
    }
    file.sync_all()?; // Ensure data is flushed to disk

    fs::rename(&tmp, path).context("Failed to replace snapshot file")?;

    info!(
        file = ?path,
        lists = store.list_count(),
        tasks = store.task_count(),
        "Saved snapshot"
    );
    Ok(())
}

/// Rebuild a store from a snapshot file.
///
/// A missing file yields an empty store. Damaged lines are skipped with a
/// warning rather than failing the load, as are rows that would break
/// integrity (duplicate ids, tasks whose list is gone). List orders are
/// renumbered after loading so hand-edited files settle back to a
/// contiguous sequence. No change events are emitted.
pub fn load(path: &Path) -> Result<TaskStore> {
    let mut store = TaskStore::new();
    if !path.exists() {
        // File doesn't exist yet, start empty
        return Ok(store);
    }

    let file = File::open(path).context("Failed to open snapshot file")?;
    let reader = BufReader::new(file);

    let mut lists: Vec<List> = Vec::new();
    let mut tasks: Vec<Task> = Vec::new();
    let mut default_list: Option<ListId> = None;

    for (line_num, line) in reader.lines().enumerate() {
        let line = match line {
            Ok(l) => l,
            Err(e) => {
                warn!(
                    file = ?path,
                    line = line_num + 1,
                    error = ?e,
                    "Failed to read line, skipping"
                );
                continue;
            }
        };

        if line.trim().is_empty() {
            continue;
        }

        match serde_json::from_str::<Line>(&line) {
            Ok(Line::Meta { version, default_list: designated }) => {
                if version != SNAPSHOT_VERSION {
                    warn!(
                        file = ?path,
                        line = line_num + 1,
                        version,
                        "Unknown snapshot version, loading anyway"
                    );
                }
                default_list = designated;
            }
            Ok(Line::List(list)) => lists.push(list),
            Ok(Line::Task(task)) => tasks.push(task),
            Err(e) => {
                warn!(
                    file = ?path,
                    line = line_num + 1,
                    error = ?e,
                    "Failed to parse JSON, skipping"
                );
            }
        }
    }

    // Lists first so tasks can resolve their list on adoption, regardless
    // of line order in the file.
    for list in lists {
        let id = list.id;
        if !store.restore_list(list) {
            warn!(file = ?path, %id, "Skipping conflicting list row");
        }
    }
    store.normalize_orders();
    for task in tasks {
        let id = task.id;
        if !store.restore_task(task) {
            warn!(file = ?path, %id, "Skipping orphaned or conflicting task row");
        }
    }
    if let Some(id) = default_list {
        if !store.restore_default(id) {
            warn!(file = ?path, %id, "Designated default list not present, ignoring");
        }
    }

    info!(
        file = ?path,
        lists = store.list_count(),
        tasks = store.task_count(),
        "Loaded snapshot"
    );
    Ok(store)
}

/// Take an exclusive advisory lock guarding `path`.
///
/// The lock lives on a `.lock` sibling so the snapshot itself can be
/// renamed over freely. Hold the returned handle across a load-mutate-save
/// cycle; the lock is released when it drops.
pub fn lock(path: &Path) -> Result<File> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).context("Failed to create snapshot directory")?;
        }
    }

    let file = OpenOptions::new()
        .create(true)
        .write(true)
        .open(sibling(path, "lock"))
        .context("Failed to open lock file")?;

    // Acquire exclusive lock before touching the snapshot
    file.lock_exclusive().context("Failed to acquire file lock")?;

    // Lock is automatically released when file is dropped
    Ok(file)
}

/// `path` with `suffix` appended to its file name, e.g. `tasks.jsonl` to
/// `tasks.jsonl.tmp`.
fn sibling(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_owned()).unwrap_or_default();
    name.push(".");
    name.push(suffix);
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TaskId;
    use tempfile::TempDir;

    #[test]
    fn test_save_load_round_trip() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("tasks.jsonl");

        let mut store = TaskStore::new();
        let today = store.create_list("Today").unwrap();
        let work = store.create_list("Work").unwrap();
        let a = store.create_task(today, "Promote Bento Cards v.2").unwrap();
        let b = store.create_task(work, "Draft Q3 roadmap").unwrap();
        store.toggle_complete(a).unwrap();
        store.set_default_list(work).unwrap();

        save(&store, &path).unwrap();
        let loaded = load(&path).unwrap();

        let original: Vec<Task> = store.tasks().cloned().collect();
        let restored: Vec<Task> = loaded.tasks().cloned().collect();
        assert_eq!(original, restored);
        let original: Vec<List> = store.lists().cloned().collect();
        let restored: Vec<List> = loaded.lists().cloned().collect();
        assert_eq!(original, restored);
        assert_eq!(loaded.default_list().unwrap().id, work);

        // Id counters resume above everything in the file.
        let mut loaded = loaded;
        let c = loaded.create_task(today, "New after load").unwrap();
        assert!(c > b);
    }

    #[test]
    fn test_save_replaces_previous_snapshot() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("tasks.jsonl");

        let mut store = TaskStore::new();
        let today = store.create_list("Today").unwrap();
        store.create_task(today, "First").unwrap();
        save(&store, &path).unwrap();

        store.create_task(today, "Second").unwrap();
        save(&store, &path).unwrap();

        let loaded = load(&path).unwrap();
        assert_eq!(loaded.task_count(), 2);
        assert!(!sibling(&path, "tmp").exists());
    }

    #[test]
    fn test_load_nonexistent_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("nonexistent.jsonl");

        let store = load(&path).unwrap();
        assert_eq!(store.list_count(), 0);
        assert_eq!(store.task_count(), 0);
        assert!(store.default_list().is_none());
    }

    #[test]
    fn test_load_skips_damaged_rows() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("tasks.jsonl");

        // A malformed line, a task pointing at a missing list, and a
        // dangling default designation, between valid rows.
        fs::write(
            &path,
            r#"{"kind":"meta","version":1,"default_list":42}
{"kind":"list","id":1,"name":"Today","order":0}
{malformed json}
{"kind":"task","id":1,"title":"Keep me","list_id":1,"completed":false,"created_at":100}
{"kind":"task","id":2,"title":"Orphan","list_id":9,"completed":false,"created_at":200}
"#,
        )
        .unwrap();

        let store = load(&path).unwrap();
        assert_eq!(store.list_count(), 1);
        assert_eq!(store.task_count(), 1);
        assert_eq!(store.get_task(TaskId(1)).unwrap().title, "Keep me");
        assert!(store.get_task(TaskId(2)).is_none());
        assert!(store.default_list().is_none());
    }

    #[test]
    fn test_load_renumbers_list_orders() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("tasks.jsonl");

        fs::write(
            &path,
            r#"{"kind":"meta","version":1}
{"kind":"list","id":1,"name":"Today","order":5}
{"kind":"list","id":2,"name":"Work","order":9}
"#,
        )
        .unwrap();

        let store = load(&path).unwrap();
        let orders: Vec<(String, u32)> = store
            .lists()
            .map(|l| (l.name.clone(), l.order))
            .collect();
        assert_eq!(orders, [("Today".to_owned(), 0), ("Work".to_owned(), 1)]);
    }

    #[test]
    fn test_snapshot_line_format() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("tasks.jsonl");

        let mut store = TaskStore::new();
        let today = store.create_list("Today").unwrap();
        store.create_task(today, "Promote Bento Cards v.2").unwrap();
        save(&store, &path).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let mut lines = content.lines();
        assert_eq!(lines.next().unwrap(), r#"{"kind":"meta","version":1}"#);
        assert!(content.contains(r#""kind":"list""#));
        assert!(content.contains(r#""name":"Today""#));
        assert!(content.contains(r#""title":"Promote Bento Cards v.2""#));
    }

    #[test]
    fn test_lock_uses_sidecar_and_releases_on_drop() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("tasks.jsonl");

        let guard = lock(&path).unwrap();
        assert!(sibling(&path, "lock").exists());
        drop(guard);

        // Re-acquiring after release works.
        let _guard = lock(&path).unwrap();
    }
}
