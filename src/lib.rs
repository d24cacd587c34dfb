// taskboard - In-memory task board store with filtering and dashboard summaries

pub mod config;
pub mod filter;
pub mod ids;
pub mod models;
pub mod record;
pub mod route;
pub mod search;
pub mod snapshot;
pub mod stats;
pub mod store;

// Re-export main types for convenience
pub use config::{Config, IdStrategy};
pub use filter::{Filter, FilterOp, filter_records};
pub use ids::{IdGenerator, SequentialIds, UuidV7Ids};
pub use models::{Board, Priority, Status, Task, TaskList, TaskListPatch, TaskPatch};
pub use record::{IndexValue, Record};
pub use route::{Route, View};
pub use search::{search_lists, search_tasks, task_matches};
pub use stats::{BoardSummary, ListSummary};
pub use store::{BoardEvent, BoardStore, SubscriptionId};
