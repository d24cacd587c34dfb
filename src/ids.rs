// Identifier generation for lists and tasks

use crate::models::Board;
use tracing::warn;
use uuid::Uuid;

/// Source of fresh list and task identifiers
pub trait IdGenerator: Send {
    fn next_id(&mut self) -> String;
}

/// Time-ordered UUIDv7 identifiers
#[derive(Debug, Default, Clone, Copy)]
pub struct UuidV7Ids;

impl IdGenerator for UuidV7Ids {
    fn next_id(&mut self) -> String {
        Uuid::now_v7().to_string()
    }
}

/// Monotonic decimal identifiers: "1", "2", ...
#[derive(Debug, Default, Clone)]
pub struct SequentialIds {
    last: u64,
}

impl SequentialIds {
    /// Start counting after `last`, so the first id is `last + 1`
    pub fn starting_after(last: u64) -> Self {
        Self { last }
    }

    /// Continue after the highest numeric list or task id already on `board`
    pub fn after_existing(board: &Board) -> Self {
        let last = board
            .lists
            .iter()
            .map(|l| l.id.as_str())
            .chain(board.tasks().map(|t| t.id.as_str()))
            .filter_map(|id| id.parse::<u64>().ok())
            .max()
            .unwrap_or(0);
        Self::starting_after(last)
    }
}

impl IdGenerator for SequentialIds {
    fn next_id(&mut self) -> String {
        match self.last.checked_add(1) {
            Some(next) => {
                self.last = next;
                next.to_string()
            }
            None => {
                warn!(last = self.last, "Sequential ids exhausted, falling back to UUIDv7");
                Uuid::now_v7().to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_uuid_ids_are_unique_under_rapid_creation() {
        let mut ids = UuidV7Ids;
        let generated: HashSet<String> = (0..1000).map(|_| ids.next_id()).collect();
        assert_eq!(generated.len(), 1000);
    }

    #[test]
    fn test_sequential_ids() {
        let mut ids = SequentialIds::default();
        assert_eq!(ids.next_id(), "1");
        assert_eq!(ids.next_id(), "2");

        let mut ids = SequentialIds::starting_after(3);
        assert_eq!(ids.next_id(), "4");
    }

    #[test]
    fn test_sequential_ids_skip_existing() {
        let mut board = Board::seeded();
        board.lists[0].tasks[0].id = "17".to_string();
        board.lists[0].tasks[1].id = "not-a-number".to_string();

        let mut ids = SequentialIds::after_existing(&board);
        assert_eq!(ids.next_id(), "18");

        let mut ids = SequentialIds::after_existing(&Board::default());
        assert_eq!(ids.next_id(), "1");
    }

    #[test]
    fn test_sequential_ids_past_u64_max_fall_back_to_uuid() {
        let mut board = Board::seeded();
        board.lists[0].id = u64::MAX.to_string();

        let mut ids = SequentialIds::after_existing(&board);
        let first = ids.next_id();
        let second = ids.next_id();

        assert!(Uuid::parse_str(&first).is_ok());
        assert!(Uuid::parse_str(&second).is_ok());
        assert_ne!(first, second);
    }
}
