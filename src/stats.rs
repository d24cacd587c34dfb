// Dashboard summaries computed from a board snapshot

use crate::models::{Board, Priority, Status, Task, TaskList};
use chrono::NaiveDate;
use serde::Serialize;

/// Date format used for due dates
pub const DUE_DATE_FORMAT: &str = "%Y-%m-%d";

/// Task counts for one list
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListSummary {
    pub id: String,
    pub name: String,
    pub total: usize,
    pub completed: usize,
    pub open: usize,
}

impl ListSummary {
    pub fn of(list: &TaskList) -> Self {
        let completed = list.tasks.iter().filter(|t| t.completed).count();
        Self {
            id: list.id.clone(),
            name: list.name.clone(),
            total: list.tasks.len(),
            completed,
            open: list.tasks.len() - completed,
        }
    }

    /// Whole-number completion percentage; 0 for an empty list
    pub fn completion_percent(&self) -> u8 {
        if self.total == 0 {
            return 0;
        }
        (self.completed * 100 / self.total) as u8
    }
}

/// Board-wide counts shown on the overview
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BoardSummary {
    pub lists: Vec<ListSummary>,
    pub total: usize,
    pub completed: usize,
    pub by_status: Vec<(Status, usize)>,
    pub by_priority: Vec<(Priority, usize)>,
    pub overdue: usize,
}

impl BoardSummary {
    /// Summarize `board` as of `today`.
    ///
    /// Tasks without a status count as `To Do` and tasks without a priority
    /// as `Low`, matching how the task table displays them.
    pub fn compute(board: &Board, today: NaiveDate) -> Self {
        let lists: Vec<ListSummary> = board.lists.iter().map(ListSummary::of).collect();
        let total = lists.iter().map(|l| l.total).sum();
        let completed = lists.iter().map(|l| l.completed).sum();

        let by_status = Status::ALL
            .iter()
            .map(|&status| {
                let count = board
                    .tasks()
                    .filter(|t| t.status.unwrap_or(Status::ToDo) == status)
                    .count();
                (status, count)
            })
            .collect();

        let by_priority = Priority::ALL
            .iter()
            .map(|&priority| {
                let count = board
                    .tasks()
                    .filter(|t| t.priority.unwrap_or(Priority::Low) == priority)
                    .count();
                (priority, count)
            })
            .collect();

        let overdue = board.tasks().filter(|t| is_overdue(t, today)).count();

        Self {
            lists,
            total,
            completed,
            by_status,
            by_priority,
            overdue,
        }
    }

    pub fn open(&self) -> usize {
        self.total - self.completed
    }

    pub fn status_count(&self, status: Status) -> usize {
        self.by_status
            .iter()
            .find(|(s, _)| *s == status)
            .map_or(0, |(_, n)| *n)
    }

    pub fn priority_count(&self, priority: Priority) -> usize {
        self.by_priority
            .iter()
            .find(|(p, _)| *p == priority)
            .map_or(0, |(_, n)| *n)
    }
}

/// Parse a due date, ignoring values that are not `YYYY-MM-DD`
pub fn parse_due_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), DUE_DATE_FORMAT).ok()
}

/// Incomplete and due strictly before `today`
pub fn is_overdue(task: &Task, today: NaiveDate) -> bool {
    !task.completed
        && task
            .due_date
            .as_deref()
            .and_then(parse_due_date)
            .is_some_and(|due| due < today)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_seed_board_summary() {
        let summary = BoardSummary::compute(&Board::seeded(), date(2024, 5, 1));

        assert_eq!(summary.total, 3);
        assert_eq!(summary.completed, 1);
        assert_eq!(summary.open(), 2);
        assert_eq!(summary.lists.len(), 1);
        assert_eq!(summary.lists[0].name, "General To Do");
        assert_eq!(summary.lists[0].completion_percent(), 33);

        assert_eq!(summary.status_count(Status::ToDo), 1);
        assert_eq!(summary.status_count(Status::InProgress), 1);
        assert_eq!(summary.status_count(Status::Done), 1);
        assert_eq!(summary.priority_count(Priority::High), 2);
        assert_eq!(summary.priority_count(Priority::Medium), 1);
        assert_eq!(summary.priority_count(Priority::Low), 0);
        assert_eq!(summary.overdue, 0);
    }

    #[test]
    fn test_overdue_counts_only_open_tasks() {
        // Task 3 is past due but completed
        let summary = BoardSummary::compute(&Board::seeded(), date(2024, 6, 1));
        assert_eq!(summary.overdue, 2);

        let summary = BoardSummary::compute(&Board::seeded(), date(2024, 5, 9));
        assert_eq!(summary.overdue, 1);
    }

    #[test]
    fn test_missing_status_and_priority_use_display_fallbacks() {
        let mut list = TaskList::new("l", "Loose");
        let mut task = Task::new("t", "No metadata");
        task.status = None;
        task.due_date = Some("someday".to_string());
        list.tasks.push(task);

        let summary = BoardSummary::compute(&Board::new(vec![list]), date(2030, 1, 1));
        assert_eq!(summary.status_count(Status::ToDo), 1);
        assert_eq!(summary.priority_count(Priority::Low), 1);
        assert_eq!(summary.overdue, 0);
    }

    #[test]
    fn test_empty_list_percent() {
        let summary = ListSummary::of(&TaskList::new("l", "Empty"));
        assert_eq!(summary.total, 0);
        assert_eq!(summary.completion_percent(), 0);
    }

    #[test]
    fn test_parse_due_date() {
        assert_eq!(parse_due_date("2024-05-05"), Some(date(2024, 5, 5)));
        assert_eq!(parse_due_date("05/05/2024"), None);
    }
}
