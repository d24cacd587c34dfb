use chrono::Local;
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use eyre::{Result, eyre};
use std::path::PathBuf;
use taskboard::stats::parse_due_date;
use taskboard::{
    Board, BoardStore, BoardSummary, Config, Filter, IdStrategy, Priority, Record, Route, SequentialIds, Status,
    Task, TaskList, TaskListPatch, TaskPatch, UuidV7Ids, View, filter_records, search_lists, search_tasks,
};
use taskboard::snapshot::SnapshotSession;
use tracing::Level;

#[derive(Parser)]
#[command(name = "taskboard")]
#[command(about = "taskboard - Manage task lists and tasks from the terminal")]
#[command(version)]
struct Cli {
    /// Path to a YAML config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Board snapshot to use instead of the configured one
    #[arg(short, long, global = true)]
    board: Option<PathBuf>,

    /// Increase log verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show every task list with its completion counts
    Lists,

    /// Create a task list
    AddList { name: String },

    /// Delete a task list and its tasks
    DeleteList { list: String },

    /// Rename a task list
    Rename { list: String, name: String },

    /// Set or clear a task list's description
    Describe {
        list: String,
        /// New description; omit to clear it
        text: Option<String>,
    },

    /// Add a task to a list
    Add { list: String, title: String },

    /// Toggle a task between done and to do
    Toggle { list: String, task: String },

    /// Delete a task
    Delete { list: String, task: String },

    /// Change fields of a task
    Update {
        list: String,
        task: String,
        #[command(flatten)]
        fields: UpdateArgs,
    },

    /// Render a route: `/` for the overview, `/list/<id>` or a bare list id for a list
    Show {
        #[arg(default_value = "/")]
        route: String,

        /// Free-text search over the list's tasks (list views only)
        #[arg(short, long)]
        search: Option<String>,

        /// Field filter such as `status=done` or `due_date<2024-06-01` (repeatable, list views only)
        #[arg(short, long)]
        filter: Vec<String>,
    },

    /// Find task lists by name
    FindList { term: String },

    /// Dashboard counts for the whole board
    Summary {
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },
}

#[derive(Args, Default)]
struct UpdateArgs {
    #[arg(long)]
    title: Option<String>,

    #[arg(long)]
    assignee: Option<String>,

    /// Due date as YYYY-MM-DD
    #[arg(long)]
    due: Option<String>,

    /// Replace the tags (repeatable)
    #[arg(long = "tag")]
    tags: Vec<String>,

    /// low, medium or high
    #[arg(long)]
    priority: Option<String>,

    #[arg(long)]
    project: Option<String>,

    /// todo, in-progress or done
    #[arg(long)]
    status: Option<String>,

    #[arg(long)]
    completed: Option<bool>,

    /// Clear an optional field: assignee, due, tags, priority, project or status (repeatable)
    #[arg(long, value_name = "FIELD")]
    clear: Vec<String>,
}

impl UpdateArgs {
    fn into_patch(self) -> Result<TaskPatch> {
        let mut patch = TaskPatch {
            title: self.title,
            completed: self.completed,
            assignee: self.assignee.map(Some),
            project: self.project.map(Some),
            ..Default::default()
        };

        if let Some(due) = self.due {
            if parse_due_date(&due).is_none() {
                return Err(eyre!("Invalid due date: {} (expected YYYY-MM-DD)", due));
            }
            patch.due_date = Some(Some(due));
        }
        if !self.tags.is_empty() {
            patch.tags = Some(Some(self.tags));
        }
        if let Some(priority) = self.priority {
            patch.priority = Some(Some(priority.parse::<Priority>()?));
        }
        if let Some(status) = self.status {
            patch.status = Some(Some(status.parse::<Status>()?));
        }

        for field in &self.clear {
            let already_set = match field.as_str() {
                "assignee" => patch.assignee.replace(None).is_some(),
                "due" | "due_date" => patch.due_date.replace(None).is_some(),
                "tags" => patch.tags.replace(None).is_some(),
                "priority" => patch.priority.replace(None).is_some(),
                "project" => patch.project.replace(None).is_some(),
                "status" => patch.status.replace(None).is_some(),
                other => return Err(eyre!("Cannot clear field: {}", other)),
            };
            if already_set {
                return Err(eyre!("Field {} is both set and cleared", field));
            }
        }

        Ok(patch)
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        _ => Level::DEBUG,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    let config = Config::load(cli.config.as_deref())?;
    if !config.color {
        colored::control::set_override(false);
    }

    let board_path = cli.board.clone().unwrap_or_else(|| config.board_path.clone());
    // Held until exit so concurrent runs cannot interleave load and save
    let session = SnapshotSession::open(&board_path)?;
    let board = match session.load()? {
        Some(board) => board,
        None if config.seed_demo_board => Board::seeded(),
        None => Board::default(),
    };

    let mut store = match config.id_strategy {
        IdStrategy::Uuid => BoardStore::with_board(board).with_id_generator(UuidV7Ids),
        IdStrategy::Sequential => {
            let ids = SequentialIds::after_existing(&board);
            BoardStore::with_board(board).with_id_generator(ids)
        }
    };

    let start = store.revision();
    run(cli.command, &mut store)?;

    if store.revision() != start {
        session.save(&store.snapshot())?;
    }

    Ok(())
}

fn run(command: Commands, store: &mut BoardStore) -> Result<()> {
    match command {
        Commands::Lists => {
            if store.is_empty() {
                println!("No task lists yet");
            }
            for list in store.lists() {
                print_list_line(list);
            }
        }
        Commands::AddList { name } => {
            let name = non_empty(&name, "List name")?;
            let id = store.add_task_list(name);
            println!("Created list {} ({})", name.bold(), id.dimmed());
        }
        Commands::DeleteList { list } => {
            if store.delete_task_list(&list) {
                println!("Deleted list {}", list);
            } else {
                not_found("List", &list);
            }
        }
        Commands::Rename { list, name } => {
            let name = non_empty(&name, "List name")?;
            let patch = TaskListPatch {
                name: Some(name.to_string()),
                ..Default::default()
            };
            if !store.update_task_list(&list, patch) {
                not_found("List", &list);
            }
        }
        Commands::Describe { list, text } => {
            let patch = TaskListPatch {
                description: Some(text.filter(|t| !t.trim().is_empty())),
                ..Default::default()
            };
            if !store.update_task_list(&list, patch) {
                not_found("List", &list);
            }
        }
        Commands::Add { list, title } => {
            let title = non_empty(&title, "Task title")?;
            match store.add_task(&list, title) {
                Some(id) => println!("Added {} ({})", title.bold(), id.dimmed()),
                None => not_found("List", &list),
            }
        }
        Commands::Toggle { list, task } => {
            if store.toggle_task(&list, &task) {
                if let Some(task) = store.task(&list, &task) {
                    print_task_line(task);
                }
            } else {
                not_found("Task", &task);
            }
        }
        Commands::Delete { list, task } => {
            if store.delete_task(&list, &task) {
                println!("Deleted task {}", task);
            } else {
                not_found("Task", &task);
            }
        }
        Commands::Update { list, task, fields } => {
            let patch = fields.into_patch()?;
            if patch.is_empty() {
                println!("Nothing to update");
                return Ok(());
            }
            if store.update_task(&list, &task, patch) {
                if let Some(task) = store.task(&list, &task) {
                    print_task_line(task);
                }
            } else {
                not_found("Task", &task);
            }
        }
        Commands::Show { route, search, filter } => {
            let route = show_route(&route);
            if route == Route::Overview && (search.is_some() || !filter.is_empty()) {
                return Err(eyre!("--search and --filter apply only to list views, not {}", route));
            }
            let filters = filter.iter().map(|f| Filter::parse(f)).collect::<Result<Vec<_>>>()?;

            match View::resolve(&route, &store.snapshot(), today()) {
                View::Overview(summary) => print_summary(&summary),
                View::List(list) => print_list_view(&list, search.as_deref(), &filters),
                View::NotFound(_) => println!("{}", "List not found".red()),
            }
        }
        Commands::FindList { term } => {
            let found = search_lists(store.lists(), &term);
            if found.is_empty() {
                println!("No lists found");
            }
            for list in found {
                print_list_line(list);
            }
        }
        Commands::Summary { json } => {
            let summary = BoardSummary::compute(&store.snapshot(), today());
            if json {
                println!("{}", serde_json::to_string_pretty(&summary)?);
            } else {
                print_summary(&summary);
            }
        }
    }

    Ok(())
}

/// Paths (`/`, `/list/<id>`, `list/<id>`) go through `Route::parse`; anything
/// else is taken as a bare list id
fn show_route(arg: &str) -> Route {
    if arg.starts_with('/') || arg.starts_with("list/") {
        Route::parse(arg)
    } else {
        Route::List(arg.to_string())
    }
}

fn today() -> chrono::NaiveDate {
    Local::now().date_naive()
}

fn non_empty<'a>(value: &'a str, what: &str) -> Result<&'a str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(eyre!("{} cannot be empty", what));
    }
    Ok(trimmed)
}

fn not_found(what: &str, id: &str) {
    println!("{}", format!("{} not found: {}", what, id).yellow());
}

fn print_list_line(list: &TaskList) {
    let completed = list.tasks.iter().filter(|t| t.completed).count();
    println!(
        "{}  {}  {}/{} completed",
        list.id.dimmed(),
        list.name.bold(),
        completed,
        list.tasks.len()
    );
}

fn print_list_view(list: &TaskList, search: Option<&str>, filters: &[Filter]) {
    println!("{}", list.name.bold());
    if let Some(description) = &list.description {
        println!("{}", description.dimmed());
    }
    println!();

    let searched = search_tasks(list, search.unwrap_or(""));
    let tasks = filter_records(searched, filters);
    if tasks.is_empty() {
        println!("No matching {}", Task::collection_name());
    }
    for task in tasks {
        print_task_line(task);
    }
}

fn print_task_line(task: &Task) {
    let check = if task.completed { "[x]" } else { "[ ]" };
    let priority = task.priority.unwrap_or(Priority::Low);
    let status = task.status.unwrap_or(Status::ToDo);

    let priority = match priority {
        Priority::High => priority.as_str().red(),
        Priority::Medium => priority.as_str().yellow(),
        Priority::Low => priority.as_str().green(),
    };
    let status = match status {
        Status::Done => status.as_str().green(),
        Status::InProgress => status.as_str().blue(),
        Status::ToDo => status.as_str().normal(),
    };

    let mut line = format!("{} {}  {}  {}  {}", check, task.id.dimmed(), task.title, priority, status);
    if let Some(assignee) = &task.assignee {
        line.push_str(&format!("  @{}", assignee));
    }
    if let Some(due) = &task.due_date {
        line.push_str(&format!("  due {}", due));
    }
    if let Some(project) = &task.project {
        line.push_str(&format!("  [{}]", project));
    }
    if let Some(tags) = task.tags.as_ref().filter(|t| !t.is_empty()) {
        line.push_str(&format!("  #{}", tags.join(" #")));
    }
    println!("{}", line);
}

fn print_summary(summary: &BoardSummary) {
    println!(
        "{} tasks, {} completed, {} open, {} overdue",
        summary.total,
        summary.completed.to_string().green(),
        summary.open(),
        summary.overdue.to_string().red()
    );
    println!();
    for list in &summary.lists {
        println!(
            "{}  {}  Completed: {}/{} ({}%)",
            list.id.dimmed(),
            list.name.bold(),
            list.completed,
            list.total,
            list.completion_percent()
        );
    }
    println!();
    for (status, count) in &summary.by_status {
        println!("{:<12} {}", status.as_str(), count);
    }
    for (priority, count) in &summary.by_priority {
        println!("{:<12} {}", priority.as_str(), count);
    }
}
