// Free-text search over tasks and lists

use crate::models::{Task, TaskList};

/// Whether `task` matches a free-text search term.
///
/// Text fields match case-insensitively by substring. The due date is matched
/// against the raw term.
pub fn task_matches(task: &Task, term: &str) -> bool {
    let needle = term.to_lowercase();
    let contains = |haystack: &str| haystack.to_lowercase().contains(&needle);

    contains(&task.title)
        || task.assignee.as_deref().is_some_and(contains)
        || task.due_date.as_deref().is_some_and(|d| d.contains(term))
        || task.tags.iter().flatten().any(|tag| contains(tag))
        || task.priority.is_some_and(|p| contains(p.as_str()))
        || task.status.is_some_and(|s| contains(s.as_str()))
        || task.project.as_deref().is_some_and(contains)
}

/// Tasks of `list` matching `term`, in list order
pub fn search_tasks<'a>(list: &'a TaskList, term: &str) -> Vec<&'a Task> {
    list.tasks.iter().filter(|task| task_matches(task, term)).collect()
}

/// Lists whose name contains `term`, ignoring case
pub fn search_lists<'a>(lists: &'a [TaskList], term: &str) -> Vec<&'a TaskList> {
    let needle = term.to_lowercase();
    lists
        .iter()
        .filter(|list| list.name.to_lowercase().contains(&needle))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Board, Task};

    fn titles(tasks: &[&Task]) -> Vec<String> {
        tasks.iter().map(|t| t.title.clone()).collect()
    }

    #[test]
    fn test_project_search_matches_every_seed_task() {
        let board = Board::seeded();
        let matched = search_tasks(&board.lists[0], "wallet");
        assert_eq!(matched.len(), 3);
    }

    #[test]
    fn test_status_search_finds_completed_task() {
        let board = Board::seeded();
        let matched = search_tasks(&board.lists[0], "done");
        assert_eq!(titles(&matched), vec!["Desarrollo Frontend"]);
        assert!(matched[0].completed);
    }

    #[test]
    fn test_search_fields() {
        let board = Board::seeded();
        let list = &board.lists[0];

        assert_eq!(titles(&search_tasks(list, "ana")), vec!["Marketing"]);
        assert_eq!(titles(&search_tasks(list, "2024-05-14")), vec!["Desarrollo Frontend"]);
        assert_eq!(titles(&search_tasks(list, "DESIGN")), vec!["Contabilidad"]);
        assert_eq!(search_tasks(list, "high").len(), 2);
        assert_eq!(titles(&search_tasks(list, "progress")), vec!["Marketing"]);
        assert!(search_tasks(list, "nothing like this").is_empty());
    }

    #[test]
    fn test_empty_term_matches_all_in_order() {
        let board = Board::seeded();
        let matched = search_tasks(&board.lists[0], "");
        assert_eq!(titles(&matched), vec!["Contabilidad", "Marketing", "Desarrollo Frontend"]);
    }

    #[test]
    fn test_bare_task_matches_only_title_and_status() {
        let task = Task::new("t1", "Refactor");
        assert!(task_matches(&task, "refac"));
        assert!(task_matches(&task, "to do"));
        assert!(!task_matches(&task, "wallet"));
    }

    #[test]
    fn test_search_lists() {
        let mut board = Board::seeded();
        board.lists.push(TaskList::new("2", "Sprint Backlog"));

        let found = search_lists(&board.lists, "BACK");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, "2");
        assert_eq!(search_lists(&board.lists, "").len(), 2);
    }
}
