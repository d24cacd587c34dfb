// Structured filtering over board records

use crate::models::{Priority, Status};
use crate::record::{IndexValue, Record};
use eyre::{Result, eyre};
use std::cmp::Ordering;
use std::collections::HashMap;
use tracing::debug;

/// Filter for querying records
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    /// Field name to filter on
    pub field: String,
    /// Comparison operator
    pub op: FilterOp,
    /// Value to compare against
    pub value: IndexValue,
}

/// Comparison operators for filtering
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOp {
    Eq,       // =
    Ne,       // !=
    Gt,       // >
    Lt,       // <
    Gte,      // >=
    Lte,      // <=
    Contains, // ~
}

impl FilterOp {
    // Two-char operators first so `<=` is not read as `<`
    const TOKENS: [(&'static str, FilterOp); 7] = [
        ("!=", FilterOp::Ne),
        (">=", FilterOp::Gte),
        ("<=", FilterOp::Lte),
        ("=", FilterOp::Eq),
        (">", FilterOp::Gt),
        ("<", FilterOp::Lt),
        ("~", FilterOp::Contains),
    ];

    fn accepts(self, ordering: Ordering) -> bool {
        match self {
            FilterOp::Eq | FilterOp::Contains => ordering == Ordering::Equal,
            FilterOp::Ne => ordering != Ordering::Equal,
            FilterOp::Gt => ordering == Ordering::Greater,
            FilterOp::Lt => ordering == Ordering::Less,
            FilterOp::Gte => ordering != Ordering::Less,
            FilterOp::Lte => ordering != Ordering::Greater,
        }
    }
}

impl std::fmt::Display for FilterOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FilterOp::Eq => write!(f, "="),
            FilterOp::Ne => write!(f, "!="),
            FilterOp::Gt => write!(f, ">"),
            FilterOp::Lt => write!(f, "<"),
            FilterOp::Gte => write!(f, ">="),
            FilterOp::Lte => write!(f, "<="),
            FilterOp::Contains => write!(f, "~"),
        }
    }
}

impl Filter {
    pub fn new(field: impl Into<String>, op: FilterOp, value: IndexValue) -> Self {
        Self {
            field: field.into(),
            op,
            value,
        }
    }

    /// Parse an expression such as `status=done`, `due_date<2024-05-10` or `tags~dev`.
    ///
    /// `true`/`false` become booleans and plain integers become ints; everything
    /// else is compared as text.
    pub fn parse(expr: &str) -> Result<Self> {
        let expr = expr.trim();
        let field_len = expr
            .find(|c: char| !(c.is_alphanumeric() || c == '_'))
            .ok_or_else(|| eyre!("Filter has no operator: {}", expr))?;
        let (field, rest) = expr.split_at(field_len);
        validate_field_name(field)?;

        let (token, op) = FilterOp::TOKENS
            .iter()
            .find(|(token, _)| rest.starts_with(token))
            .ok_or_else(|| eyre!("Unknown operator in filter: {}", expr))?;

        let raw = rest[token.len()..].trim();
        let value = if raw.eq_ignore_ascii_case("true") {
            IndexValue::Bool(true)
        } else if raw.eq_ignore_ascii_case("false") {
            IndexValue::Bool(false)
        } else if let Ok(i) = raw.parse::<i64>() {
            IndexValue::Int(i)
        } else {
            IndexValue::String(raw.to_string())
        };

        Ok(Self::new(field.trim(), *op, value))
    }

    /// Whether a record's indexed fields satisfy this filter.
    ///
    /// Text fields compare against the value's text whatever its parsed type,
    /// and `status`/`priority` accept any spelling their `FromStr` accepts.
    /// Missing fields and other type mismatches never match, not even for `!=`.
    pub fn matches(&self, fields: &HashMap<String, IndexValue>) -> bool {
        let Some(actual) = fields.get(&self.field) else {
            return false;
        };

        match (actual, &self.value) {
            (IndexValue::String(actual), expected) => {
                let expected = match expected {
                    IndexValue::String(s) => s.clone(),
                    other => other.to_string(),
                };
                self.matches_text(actual, &expected)
            }
            (IndexValue::Int(actual), IndexValue::Int(expected)) => self.op.accepts(actual.cmp(expected)),
            (IndexValue::Bool(actual), IndexValue::Bool(expected)) => self.op.accepts(actual.cmp(expected)),
            _ => false,
        }
    }

    fn matches_text(&self, actual: &str, expected: &str) -> bool {
        if self.field == "priority" && self.op != FilterOp::Contains {
            // Ranked Low < Medium < High rather than alphabetically
            if let (Ok(actual), Ok(expected)) = (actual.parse::<Priority>(), expected.parse::<Priority>()) {
                return self.op.accepts(actual.cmp(&expected));
            }
        }

        let actual = actual.to_lowercase();
        let expected = canonical_text(&self.field, expected);
        if self.op == FilterOp::Contains {
            actual.contains(&expected)
        } else {
            self.op.accepts(actual.cmp(&expected))
        }
    }
}

/// Lower-cased comparison text, mapping `todo` to `to do` and the like
fn canonical_text(field: &str, raw: &str) -> String {
    let canonical = match field {
        "status" => raw.parse::<Status>().ok().map(Status::as_str),
        "priority" => raw.parse::<Priority>().ok().map(Priority::as_str),
        _ => None,
    };
    canonical.unwrap_or(raw).to_lowercase()
}

impl std::fmt::Display for Filter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}{}", self.field, self.op, self.value)
    }
}

/// Keep the records matching every filter, preserving order
pub fn filter_records<'a, T: Record>(records: impl IntoIterator<Item = &'a T>, filters: &[Filter]) -> Vec<&'a T>
where
    T: 'a,
{
    let matched: Vec<&'a T> = records
        .into_iter()
        .filter(|record| {
            if filters.is_empty() {
                return true;
            }
            let fields = record.indexed_fields();
            filters.iter().all(|f| f.matches(&fields))
        })
        .collect();

    debug!(
        collection = T::collection_name(),
        filters = filters.len(),
        matched = matched.len(),
        "Filtered records"
    );
    matched
}

fn validate_field_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(eyre!("Field name cannot be empty"));
    }
    if name.len() > 64 {
        return Err(eyre!("Field name too long: {} (max 64 chars)", name));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Board, Task, TaskList};

    #[test]
    fn test_filter_parse() {
        let filter = Filter::parse("status=done").unwrap();
        assert_eq!(filter.field, "status");
        assert_eq!(filter.op, FilterOp::Eq);
        assert_eq!(filter.value, IndexValue::String("done".to_string()));

        let filter = Filter::parse("due_date<=2024-05-09").unwrap();
        assert_eq!(filter.op, FilterOp::Lte);
        assert_eq!(filter.value, IndexValue::String("2024-05-09".to_string()));

        let filter = Filter::parse("completed=true").unwrap();
        assert_eq!(filter.value, IndexValue::Bool(true));

        let filter = Filter::parse("task_count>2").unwrap();
        assert_eq!(filter.op, FilterOp::Gt);
        assert_eq!(filter.value, IndexValue::Int(2));

        let filter = Filter::parse("priority!=low").unwrap();
        assert_eq!(filter.op, FilterOp::Ne);
    }

    #[test]
    fn test_filter_parse_errors() {
        assert!(Filter::parse("status").is_err());
        assert!(Filter::parse("=done").is_err());
        assert!(Filter::parse("status?done").is_err());
    }

    #[test]
    fn test_filter_display() {
        assert_eq!(Filter::parse("tags~dev").unwrap().to_string(), "tags~dev");
        assert_eq!(FilterOp::Gte.to_string(), ">=");
    }

    #[test]
    fn test_string_match_is_case_insensitive() {
        let board = Board::seeded();
        let tasks = &board.lists[0].tasks;

        let done = filter_records(tasks, &[Filter::parse("status=done").unwrap()]);
        assert_eq!(done.len(), 1);
        assert_eq!(done[0].title, "Desarrollo Frontend");

        let dev = filter_records(tasks, &[Filter::parse("tags~DEV").unwrap()]);
        assert_eq!(dev.len(), 1);
    }

    #[test]
    fn test_filters_combine_with_and() {
        let board = Board::seeded();
        let tasks = &board.lists[0].tasks;

        let filters = vec![
            Filter::parse("priority=high").unwrap(),
            Filter::parse("completed=false").unwrap(),
        ];
        let matched = filter_records(tasks, &filters);
        assert_eq!(matched.len(), 1);
        assert_eq!(matched[0].title, "Contabilidad");

        assert_eq!(filter_records(tasks, &[]).len(), 3);
    }

    #[test]
    fn test_date_ordering() {
        let board = Board::seeded();
        let tasks = &board.lists[0].tasks;

        let early = filter_records(tasks, &[Filter::parse("due_date<2024-05-10").unwrap()]);
        let titles: Vec<&str> = early.iter().map(|t| t.title.as_str()).collect();
        assert_eq!(titles, vec!["Contabilidad", "Marketing"]);
    }

    #[test]
    fn test_missing_field_or_type_mismatch_never_matches() {
        let bare = vec![Task::new("t1", "Bare")];

        assert!(filter_records(&bare, &[Filter::parse("assignee!=nobody").unwrap()]).is_empty());
        assert!(filter_records(&bare, &[Filter::parse("completed=1").unwrap()]).is_empty());
    }

    #[test]
    fn test_numeric_looking_values_match_text_fields() {
        let tasks = vec![Task::new("t1", "Q1 report"), Task::new("t2", "2024")];

        let q1 = filter_records(&tasks, &[Filter::parse("title~1").unwrap()]);
        assert_eq!(q1.len(), 1);
        assert_eq!(q1[0].title, "Q1 report");

        let year = filter_records(&tasks, &[Filter::parse("title=2024").unwrap()]);
        assert_eq!(year.len(), 1);
        assert_eq!(year[0].id, "t2");

        let lists = vec![TaskList::new("l1", "2025"), TaskList::new("l2", "true")];
        assert_eq!(filter_records(&lists, &[Filter::parse("name=2025").unwrap()]).len(), 1);
        assert_eq!(filter_records(&lists, &[Filter::parse("name=true").unwrap()]).len(), 1);
    }

    #[test]
    fn test_status_and_priority_accept_cli_spellings() {
        let board = Board::seeded();
        let tasks = &board.lists[0].tasks;

        let todo = filter_records(tasks, &[Filter::parse("status=todo").unwrap()]);
        assert_eq!(todo.len(), 1);
        assert_eq!(todo[0].title, "Contabilidad");

        let in_progress = filter_records(tasks, &[Filter::parse("status=in-progress").unwrap()]);
        assert_eq!(in_progress.len(), 1);
        assert_eq!(in_progress[0].title, "Marketing");

        assert_eq!(filter_records(tasks, &[Filter::parse("status=to do").unwrap()]).len(), 1);
        assert_eq!(filter_records(tasks, &[Filter::parse("status!=in_progress").unwrap()]).len(), 2);
        assert_eq!(filter_records(tasks, &[Filter::parse("status~prog").unwrap()]).len(), 1);
    }

    #[test]
    fn test_priority_ordering_is_ranked() {
        let board = Board::seeded();
        let tasks = &board.lists[0].tasks;

        assert_eq!(filter_records(tasks, &[Filter::parse("priority>=medium").unwrap()]).len(), 3);
        assert_eq!(filter_records(tasks, &[Filter::parse("priority>medium").unwrap()]).len(), 2);
        assert_eq!(filter_records(tasks, &[Filter::parse("priority<high").unwrap()]).len(), 1);
    }

    #[test]
    fn test_list_filters() {
        let board = Board::seeded();
        let big = filter_records(&board.lists, &[Filter::parse("task_count>=3").unwrap()]);
        assert_eq!(big.len(), 1);
        let empty = filter_records(&board.lists, &[Filter::parse("task_count=0").unwrap()]);
        assert!(empty.is_empty());
    }
}
