//! Example 02: Change Events
//!
//! This example demonstrates the change notification surface:
//! - Subscribing to a store
//! - One event per committed state change, none for failures or no-ops
//! - Draining events and writing them out as a JSONL audit trail
//!
//! Run with: cargo run --example 02_change_events

use eyre::Result;
use tasklists::TaskStore;

fn main() -> Result<()> {
    println!("Tasklists Change Events Example");
    println!("===============================\n");

    let mut store = TaskStore::new();
    let changes = store.subscribe();

    // Run a batch of operations
    println!("1. MUTATE - Running a batch of operations...");
    let today = store.create_list("Today")?;
    let promo = store.create_task(today, "Promote Bento Cards v.2")?;
    store.create_task(today, "Ship onboarding flow")?;
    store.toggle_complete(promo)?;

    let temp = store.create_list("Temp")?;
    store.create_task(temp, "Scratch note")?;
    store.delete_list(temp)?;

    // These produce no events: a failure and a no-op rename.
    let duplicate = store.create_list("Today");
    println!("   Duplicate list rejected: {}", duplicate.is_err());
    store.rename_task(promo, "Promote Bento Cards v.2")?;
    println!();

    // DRAIN: One event per committed change
    println!("2. DRAIN - Collecting events...");
    let events = changes.drain();
    println!("   {} events captured:", events.len());
    for event in &events {
        println!("   - {}", event.kind());
    }
    println!();

    // SERIALIZE: Events double as an audit log
    println!("3. SERIALIZE - Events as JSONL audit lines...");
    for event in &events {
        println!("   {}", serde_json::to_string(event)?);
    }
    println!();

    println!("Example complete!");
    Ok(())
}
