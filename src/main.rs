use clap::{Parser, Subcommand};
use colored::Colorize;
use eyre::{Result, eyre};
use std::path::PathBuf;
use tasklists::{ListId, Task, TaskFilter, TaskId, TaskStore, snapshot};
use tracing::debug;

#[derive(Parser)]
#[command(name = "tasklists")]
#[command(about = "Tasklists CLI - Manage tasks and lists backed by a JSONL snapshot")]
#[command(version)]
struct Cli {
    /// Path to the snapshot file (default: platform data directory)
    #[arg(short, long, env = "TASKLISTS_FILE")]
    file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show all lists with their completion ratios
    Lists,

    /// Show tasks, optionally narrowed to one list
    Ls {
        /// List name or id
        list: Option<String>,

        /// Only pending tasks
        #[arg(long, conflicts_with = "done")]
        pending: bool,

        /// Only completed tasks
        #[arg(long)]
        done: bool,

        /// Include creation timestamps
        #[arg(short, long)]
        long: bool,
    },

    /// Add a task to a list
    Add {
        /// List name or id
        list: String,

        /// Task title
        #[arg(required = true)]
        title: Vec<String>,
    },

    /// Toggle a task between completed and pending
    Done {
        id: TaskId,
    },

    /// Delete a task
    Rm {
        id: TaskId,
    },

    /// Rename a task
    Edit {
        id: TaskId,

        /// New title
        #[arg(required = true)]
        title: Vec<String>,
    },

    /// Move a task to another list
    Mv {
        id: TaskId,

        /// Target list name or id
        list: String,
    },

    /// Duplicate a task within its list
    Dup {
        id: TaskId,
    },

    /// Search task titles, case-insensitively
    Search {
        #[arg(required = true)]
        term: Vec<String>,

        /// Search list names instead of task titles
        #[arg(long)]
        lists: bool,
    },

    /// Show completion counts for a list or the whole file
    Stats {
        /// List name or id
        list: Option<String>,
    },

    /// Create a new list
    NewList {
        name: String,
    },

    /// Delete a list; its tasks move to the default list
    RmList {
        /// List name or id
        name: String,
    },

    /// Rename a list
    RenameList {
        /// Current list name or id
        name: String,
        new_name: String,
    },

    /// Move a list to a position in the sidebar order (0-based)
    ReorderList {
        /// List name or id
        name: String,
        position: u32,
    },

    /// Show or set the list that receives orphaned tasks
    DefaultList {
        /// List name or id; omit to show the current default
        name: Option<String>,
    },
}

fn main() -> Result<()> {
    // Setup tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let path = cli.file.unwrap_or_else(default_snapshot_path);

    // One lock spans the whole load-mutate-save cycle.
    let _lock = snapshot::lock(&path)?;
    let mut store = snapshot::load(&path)?;
    let changes = store.subscribe();

    run(&mut store, cli.command)?;

    // Only write the snapshot back if something actually changed.
    let events = changes.drain();
    if !events.is_empty() {
        for event in &events {
            debug!(op = event.kind(), "state changed");
        }
        snapshot::save(&store, &path)?;
    }

    Ok(())
}

fn run(store: &mut TaskStore, command: Commands) -> Result<()> {
    match command {
        Commands::Lists => {
            let default = store.default_list().map(|l| l.id);
            for list in store.lists() {
                let (done, total) = store.query().completion_ratio(list.id)?;
                let marker = if default == Some(list.id) { " *" } else { "" };
                println!(
                    "{} {} {}{}",
                    format!("{:>4}", list.id).dimmed(),
                    list.name.bold(),
                    format!("{}/{}", done, total).dimmed(),
                    marker
                );
            }
        }
        Commands::Ls {
            list,
            pending,
            done,
            long,
        } => {
            let mut filter = TaskFilter::new();
            if let Some(key) = &list {
                filter = filter.with_list(resolve_list(store, key)?);
            }
            if pending {
                filter = filter.with_completed(false);
            }
            if done {
                filter = filter.with_completed(true);
            }
            for task in store.query().filtered(filter) {
                print_task(task, long);
            }
        }
        Commands::Add { list, title } => {
            let list_id = resolve_list(store, &list)?;
            let id = store.create_task(list_id, &title.join(" "))?;
            println!("Added task {} to {}", id, list.trim());
        }
        Commands::Done { id } => {
            if store.toggle_complete(id)? {
                println!("{} task {}", "Completed".green(), id);
            } else {
                println!("Reopened task {}", id);
            }
        }
        Commands::Rm { id } => {
            store.delete_task(id)?;
            println!("Deleted task {}", id);
        }
        Commands::Edit { id, title } => {
            store.rename_task(id, &title.join(" "))?;
            println!("Renamed task {}", id);
        }
        Commands::Mv { id, list } => {
            let target = resolve_list(store, &list)?;
            store.move_to_list(id, target)?;
            println!("Moved task {} to {}", id, list.trim());
        }
        Commands::Dup { id } => {
            let copy = store.duplicate_task(id)?;
            println!("Duplicated task {} as {}", id, copy);
        }
        Commands::Search { term, lists } => {
            let term = term.join(" ");
            if lists {
                for list in store.query().search_lists(&term) {
                    println!("{} {}", format!("{:>4}", list.id).dimmed(), list.name);
                }
            } else {
                for task in store.query().search(&term) {
                    print_task(task, false);
                }
            }
        }
        Commands::Stats { list } => match list {
            Some(key) => {
                let id = resolve_list(store, &key)?;
                let counts = store.query().count_by_completion(id)?;
                println!(
                    "Completed {} ({} pending)",
                    counts, counts.pending
                );
            }
            None => {
                let total = store.task_count();
                let completed = store.tasks().filter(|t| t.completed).count();
                println!(
                    "{} completed, {} pending ({} total)",
                    completed,
                    total - completed,
                    total
                );
            }
        },
        Commands::NewList { name } => {
            let id = store.create_list(&name)?;
            println!("Created list {} ({})", name.trim(), id);
        }
        Commands::RmList { name } => {
            let id = resolve_list(store, &name)?;
            let moved = store.delete_list(id)?;
            if moved.is_empty() {
                println!("Deleted list {}", name.trim());
            } else {
                let target = store
                    .default_list()
                    .map(|l| l.name.clone())
                    .unwrap_or_else(|| "?".to_owned());
                println!(
                    "Deleted list {}, moved {} task(s) to {}",
                    name.trim(),
                    moved.len(),
                    target
                );
            }
        }
        Commands::RenameList { name, new_name } => {
            let id = resolve_list(store, &name)?;
            store.rename_list(id, &new_name)?;
            println!("Renamed list {} to {}", name.trim(), new_name.trim());
        }
        Commands::ReorderList { name, position } => {
            let id = resolve_list(store, &name)?;
            store.reorder_list(id, position)?;
            println!("Moved list {} to position {}", name.trim(), position);
        }
        Commands::DefaultList { name } => match name {
            Some(key) => {
                let id = resolve_list(store, &key)?;
                store.set_default_list(id)?;
                if let Some(list) = store.get_list(id) {
                    println!("Default list is now {}", list.name);
                }
            }
            None => match store.default_list() {
                Some(list) => println!("{}", list.name),
                None => println!("(none)"),
            },
        },
    }

    Ok(())
}

/// Resolve a list argument given either as a name or as a numeric id.
fn resolve_list(store: &TaskStore, key: &str) -> Result<ListId> {
    if let Some(list) = store.find_list(key.trim()) {
        return Ok(list.id);
    }
    if let Ok(id) = key.trim().parse() {
        if store.get_list(id).is_some() {
            return Ok(id);
        }
    }
    Err(eyre!("no such list: {}", key.trim()))
}

fn print_task(task: &Task, long: bool) {
    let id = format!("{:>4}", task.id);
    let mark = if task.completed {
        "[✓]".green().to_string()
    } else {
        "[ ]".to_owned()
    };
    let title = if task.completed {
        task.title.dimmed().to_string()
    } else {
        task.title.clone()
    };
    if long {
        println!(
            "{} {} {}  {}",
            id.dimmed(),
            mark,
            title,
            format_when(task.created_at).dimmed()
        );
    } else {
        println!("{} {} {}", id.dimmed(), mark, title);
    }
}

fn format_when(ms: i64) -> String {
    chrono::DateTime::from_timestamp_millis(ms)
        .map(|dt| dt.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| ms.to_string())
}

fn default_snapshot_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("tasklists")
        .join("tasks.jsonl")
}
