// Navigation between the overview and per-list views

use crate::models::{Board, TaskList};
use crate::stats::BoardSummary;
use chrono::NaiveDate;
use std::fmt;

/// A location in the board UI
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// `/`
    Overview,
    /// `/list/<id>`
    List(String),
}

impl Route {
    /// Parse a path. Anything unrecognized falls back to the overview.
    pub fn parse(path: &str) -> Self {
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        match segments.as_slice() {
            ["list", id] => Route::List((*id).to_string()),
            _ => Route::Overview,
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Route::Overview => write!(f, "/"),
            Route::List(id) => write!(f, "/list/{}", id),
        }
    }
}

/// What a route renders to
#[derive(Debug, Clone, PartialEq)]
pub enum View {
    Overview(BoardSummary),
    List(TaskList),
    /// The list id in the route does not exist
    NotFound(String),
}

impl View {
    pub fn resolve(route: &Route, board: &Board, today: NaiveDate) -> Self {
        match route {
            Route::Overview => View::Overview(BoardSummary::compute(board, today)),
            Route::List(id) => match board.list(id) {
                Some(list) => View::List(list.clone()),
                None => View::NotFound(id.clone()),
            },
        }
    }
}
