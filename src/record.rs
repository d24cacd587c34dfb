// Record trait exposing board entities to structured filters

use crate::models::{Task, TaskList};
use std::collections::HashMap;

/// Anything on the board that can be filtered by field
pub trait Record {
    /// Collection name for this record type (e.g., "tasks", "lists")
    fn collection_name() -> &'static str
    where
        Self: Sized;

    /// Fields available to `Filter`s.
    /// Absent optional fields are left out rather than indexed as empty.
    fn indexed_fields(&self) -> HashMap<String, IndexValue> {
        HashMap::new()
    }
}

/// Value types that can be indexed for filtering
#[derive(Debug, Clone, PartialEq)]
pub enum IndexValue {
    String(String),
    Int(i64),
    Bool(bool),
}

impl std::fmt::Display for IndexValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IndexValue::String(s) => write!(f, "{}", s),
            IndexValue::Int(i) => write!(f, "{}", i),
            IndexValue::Bool(b) => write!(f, "{}", b),
        }
    }
}

impl Record for Task {
    fn collection_name() -> &'static str {
        "tasks"
    }

    fn indexed_fields(&self) -> HashMap<String, IndexValue> {
        let mut fields = HashMap::new();
        fields.insert("title".to_string(), IndexValue::String(self.title.clone()));
        fields.insert("completed".to_string(), IndexValue::Bool(self.completed));

        if let Some(assignee) = &self.assignee {
            fields.insert("assignee".to_string(), IndexValue::String(assignee.clone()));
        }
        if let Some(due_date) = &self.due_date {
            fields.insert("due_date".to_string(), IndexValue::String(due_date.clone()));
        }
        if let Some(tags) = &self.tags {
            // Comma-joined so `tags~dev` matches any tag
            fields.insert("tags".to_string(), IndexValue::String(tags.join(",")));
        }
        if let Some(priority) = self.priority {
            fields.insert("priority".to_string(), IndexValue::String(priority.to_string()));
        }
        if let Some(project) = &self.project {
            fields.insert("project".to_string(), IndexValue::String(project.clone()));
        }
        if let Some(status) = self.status {
            fields.insert("status".to_string(), IndexValue::String(status.to_string()));
        }
        fields
    }
}

impl Record for TaskList {
    fn collection_name() -> &'static str {
        "lists"
    }

    fn indexed_fields(&self) -> HashMap<String, IndexValue> {
        let mut fields = HashMap::new();
        fields.insert("name".to_string(), IndexValue::String(self.name.clone()));
        fields.insert("task_count".to_string(), IndexValue::Int(self.tasks.len() as i64));
        fields.insert(
            "completed_count".to_string(),
            IndexValue::Int(self.tasks.iter().filter(|t| t.completed).count() as i64),
        );
        if let Some(description) = &self.description {
            fields.insert("description".to_string(), IndexValue::String(description.clone()));
        }
        fields
    }
}
