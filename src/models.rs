// Data models for the task board

use eyre::{Result, eyre};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Task priority
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Priority {
    Low,
    Medium,
    High,
}

impl Priority {
    pub const ALL: [Priority; 3] = [Priority::Low, Priority::Medium, Priority::High];

    pub fn as_str(self) -> &'static str {
        match self {
            Priority::Low => "Low",
            Priority::Medium => "Medium",
            Priority::High => "High",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = eyre::Report;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "low" => Ok(Priority::Low),
            "medium" => Ok(Priority::Medium),
            "high" => Ok(Priority::High),
            other => Err(eyre!("Invalid priority: {} (expected low, medium or high)", other)),
        }
    }
}

/// Workflow status of a task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Status {
    #[serde(rename = "To Do")]
    ToDo,
    #[serde(rename = "In Progress")]
    InProgress,
    Done,
}

impl Status {
    pub const ALL: [Status; 3] = [Status::ToDo, Status::InProgress, Status::Done];

    pub fn as_str(self) -> &'static str {
        match self {
            Status::ToDo => "To Do",
            Status::InProgress => "In Progress",
            Status::Done => "Done",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Status {
    type Err = eyre::Report;

    fn from_str(s: &str) -> Result<Self> {
        let normalized: String = s
            .trim()
            .to_lowercase()
            .chars()
            .filter(|c| !matches!(c, ' ' | '-' | '_'))
            .collect();

        match normalized.as_str() {
            "todo" => Ok(Status::ToDo),
            "inprogress" => Ok(Status::InProgress),
            "done" => Ok(Status::Done),
            _ => Err(eyre!("Invalid status: {} (expected todo, in-progress or done)", s.trim())),
        }
    }
}

/// A unit of work on a board
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub title: String,
    pub completed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignee: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<Status>,
}

impl Task {
    /// A fresh, incomplete task in the `To Do` column
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            completed: false,
            assignee: None,
            due_date: None,
            tags: None,
            priority: None,
            project: None,
            status: Some(Status::ToDo),
        }
    }
}

/// A named, ordered collection of tasks
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskList {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub tasks: Vec<Task>,
}

impl TaskList {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: None,
            tasks: Vec::new(),
        }
    }

    pub fn task(&self, task_id: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == task_id)
    }

    pub(crate) fn task_mut(&mut self, task_id: &str) -> Option<&mut Task> {
        self.tasks.iter_mut().find(|t| t.id == task_id)
    }
}

/// Top-level state: every list on the board, in creation order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Board {
    pub lists: Vec<TaskList>,
}

impl Board {
    pub fn new(lists: Vec<TaskList>) -> Self {
        Self { lists }
    }

    /// The demo board shown on first launch
    pub fn seeded() -> Self {
        let task = |id: &str, title: &str, completed: bool, assignee: &str, due: &str, tag: &str, priority: Priority, status: Status| Task {
            id: id.to_string(),
            title: title.to_string(),
            completed,
            assignee: Some(assignee.to_string()),
            due_date: Some(due.to_string()),
            tags: Some(vec![tag.to_string()]),
            priority: Some(priority),
            project: Some("Wallet".to_string()),
            status: Some(status),
        };

        Self::new(vec![TaskList {
            id: "1".to_string(),
            name: "General To Do".to_string(),
            description: Some("This is our main task board for general tasks.".to_string()),
            tasks: vec![
                task(
                    "1",
                    "Contabilidad",
                    false,
                    "Diego Gamboa",
                    "2024-05-05",
                    "Design",
                    Priority::High,
                    Status::ToDo,
                ),
                task(
                    "2",
                    "Marketing",
                    false,
                    "Ana López",
                    "2024-05-09",
                    "Marketing",
                    Priority::Medium,
                    Status::InProgress,
                ),
                task(
                    "3",
                    "Desarrollo Frontend",
                    true,
                    "Carlos Ruiz",
                    "2024-05-14",
                    "Development",
                    Priority::High,
                    Status::Done,
                ),
            ],
        }])
    }

    pub fn list(&self, list_id: &str) -> Option<&TaskList> {
        self.lists.iter().find(|l| l.id == list_id)
    }

    pub(crate) fn list_mut(&mut self, list_id: &str) -> Option<&mut TaskList> {
        self.lists.iter_mut().find(|l| l.id == list_id)
    }

    /// Every task on the board, list by list
    pub fn tasks(&self) -> impl Iterator<Item = &Task> {
        self.lists.iter().flat_map(|l| l.tasks.iter())
    }
}

/// Partial update for a task; `None` leaves a field alone.
///
/// Optional task fields take `Some(None)` to clear them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub completed: Option<bool>,
    pub assignee: Option<Option<String>>,
    pub due_date: Option<Option<String>>,
    pub tags: Option<Option<Vec<String>>>,
    pub priority: Option<Option<Priority>>,
    pub project: Option<Option<String>>,
    pub status: Option<Option<Status>>,
}

impl TaskPatch {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Shallow merge into `task`
    pub fn apply(self, task: &mut Task) {
        if let Some(title) = self.title {
            task.title = title;
        }
        if let Some(completed) = self.completed {
            task.completed = completed;
        }
        if let Some(assignee) = self.assignee {
            task.assignee = assignee;
        }
        if let Some(due_date) = self.due_date {
            task.due_date = due_date;
        }
        if let Some(tags) = self.tags {
            task.tags = tags;
        }
        if let Some(priority) = self.priority {
            task.priority = priority;
        }
        if let Some(project) = self.project {
            task.project = project;
        }
        if let Some(status) = self.status {
            task.status = status;
        }
    }
}

/// Partial update for a task list
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskListPatch {
    pub name: Option<String>,
    pub description: Option<Option<String>>,
}

impl TaskListPatch {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub fn apply(self, list: &mut TaskList) {
        if let Some(name) = self.name {
            list.name = name;
        }
        if let Some(description) = self.description {
            list.description = description;
        }
    }
}
