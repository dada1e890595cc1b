//! Example 01: Lists and Tasks
//!
//! This example demonstrates the core store operations:
//! - Creating lists and adding tasks
//! - Toggling completion and reading live ratios
//! - Searching, moving, and duplicating tasks
//! - Deleting a list and watching its tasks get reassigned
//!
//! Run with: cargo run --example 01_lists_and_tasks

use eyre::Result;
use tasklists::{TaskStore, snapshot};

fn main() -> Result<()> {
    println!("Tasklists Basic Example");
    println!("=======================\n");

    let mut store = TaskStore::new();

    // CREATE: Set up the sidebar lists
    println!("1. CREATE - Setting up lists and tasks...");
    let today = store.create_list("Today")?;
    let work = store.create_list("Work")?;
    store.create_list("Upcoming")?;

    store.create_task(today, "Promote Bento Cards v.2")?;
    let onboarding = store.create_task(today, "Ship onboarding flow")?;
    store.create_task(today, "Review design tokens")?;
    let roadmap = store.create_task(work, "Draft Q3 roadmap")?;
    store.create_task(work, "Plan team offsite")?;
    println!(
        "   {} lists, {} tasks created\n",
        store.list_count(),
        store.task_count()
    );

    // TOGGLE: Complete a task and read the live ratio
    println!("2. TOGGLE - Completing a task...");
    store.toggle_complete(onboarding)?;
    let (done, total) = store.query().completion_ratio(today)?;
    println!("   Today is now at {}/{}\n", done, total);

    // SEARCH: Case-insensitive substring over titles
    println!("3. SEARCH - Looking for 'bento'...");
    for task in store.query().search("bento") {
        println!("   - {} : {}", task.id, task.title);
    }
    println!();

    // MOVE and DUPLICATE
    println!("4. MOVE/DUPLICATE - Rearranging tasks...");
    store.move_to_list(roadmap, today)?;
    let copy = store.duplicate_task(roadmap)?;
    println!(
        "   Moved task {} to Today and duplicated it as {}\n",
        roadmap, copy
    );

    // DELETE LIST: Tasks are reassigned, never destroyed
    println!("5. DELETE LIST - Removing Work...");
    let moved = store.delete_list(work)?;
    let inbox = store
        .default_list()
        .map(|l| l.name.clone())
        .unwrap_or_default();
    println!("   {} task(s) moved to {}\n", moved.len(), inbox);

    // SNAPSHOT: Round-trip through a JSONL file
    println!("6. SNAPSHOT - Saving and reloading...");
    let temp_dir = tempfile::tempdir()?;
    let path = temp_dir.path().join("tasks.jsonl");
    snapshot::save(&store, &path)?;
    let reloaded = snapshot::load(&path)?;
    println!(
        "   Reloaded {} lists and {} tasks from {}\n",
        reloaded.list_count(),
        reloaded.task_count(),
        path.display()
    );

    println!("Example complete!");
    Ok(())
}
