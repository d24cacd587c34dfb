// In-memory board store with copy-on-write snapshots

use crate::ids::{IdGenerator, UuidV7Ids};
use crate::models::{Board, Status, Task, TaskList, TaskListPatch, TaskPatch};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Handle returned by `BoardStore::subscribe`
pub type SubscriptionId = u64;

type Subscriber = Box<dyn FnMut(&BoardEvent, &Board)>;

/// What a successful mutation changed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BoardEvent {
    ListAdded { list_id: String },
    ListUpdated { list_id: String },
    ListDeleted { list_id: String },
    TaskAdded { list_id: String, task_id: String },
    TaskToggled { list_id: String, task_id: String, completed: bool },
    TaskUpdated { list_id: String, task_id: String },
    TaskDeleted { list_id: String, task_id: String },
}

/// Owner of the board state.
///
/// Every mutation is fail-soft: an unknown list or task id leaves the board,
/// the revision and the subscribers untouched. A mutation that lands swaps in
/// a new `Board`, so snapshots taken earlier keep their contents.
pub struct BoardStore {
    state: Arc<Board>,
    revision: u64,
    ids: Box<dyn IdGenerator>,
    subscribers: Vec<(SubscriptionId, Subscriber)>,
    next_subscription: SubscriptionId,
}

impl BoardStore {
    /// An empty board using UUIDv7 identifiers
    pub fn new() -> Self {
        Self::with_board(Board::default())
    }

    /// Wrap an existing board
    pub fn with_board(board: Board) -> Self {
        Self {
            state: Arc::new(board),
            revision: 0,
            ids: Box::new(UuidV7Ids),
            subscribers: Vec::new(),
            next_subscription: 0,
        }
    }

    /// Replace the identifier source
    pub fn with_id_generator(mut self, ids: impl IdGenerator + 'static) -> Self {
        self.ids = Box::new(ids);
        self
    }

    // ========================================================================
    // Queries
    // ========================================================================

    pub fn lists(&self) -> &[TaskList] {
        &self.state.lists
    }

    pub fn list(&self, list_id: &str) -> Option<&TaskList> {
        self.state.list(list_id)
    }

    pub fn task(&self, list_id: &str, task_id: &str) -> Option<&Task> {
        self.list(list_id).and_then(|l| l.task(task_id))
    }

    /// A consistent view of the board that later mutations will not touch
    pub fn snapshot(&self) -> Arc<Board> {
        Arc::clone(&self.state)
    }

    /// Number of mutations applied so far
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn len(&self) -> usize {
        self.state.lists.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.lists.is_empty()
    }

    // ========================================================================
    // Mutations
    // ========================================================================

    /// Append a new, empty list. The name is taken as given.
    pub fn add_task_list(&mut self, name: &str) -> String {
        let id = self.fresh_id(|board, id| board.list(id).is_some());

        self.board_mut().lists.push(TaskList::new(id.clone(), name));
        info!(list_id = %id, name, "Added task list");

        self.commit(BoardEvent::ListAdded { list_id: id.clone() });
        id
    }

    /// Remove a list and all its tasks
    pub fn delete_task_list(&mut self, list_id: &str) -> bool {
        let Some(index) = self.state.lists.iter().position(|l| l.id == list_id) else {
            debug!(list_id, "delete_task_list: no such list");
            return false;
        };

        self.board_mut().lists.remove(index);
        info!(list_id, "Deleted task list");

        self.commit(BoardEvent::ListDeleted {
            list_id: list_id.to_string(),
        });
        true
    }

    /// Append a new `To Do` task to a list. Returns the task id, or `None`
    /// when the list does not exist.
    pub fn add_task(&mut self, list_id: &str, title: &str) -> Option<String> {
        if self.state.list(list_id).is_none() {
            debug!(list_id, "add_task: no such list");
            return None;
        }

        let id = self.fresh_id(|board, id| board.list(list_id).is_some_and(|l| l.task(id).is_some()));
        let list = self.board_mut().list_mut(list_id)?;
        list.tasks.push(Task::new(id.clone(), title));
        debug!(list_id, task_id = %id, title, "Added task");

        self.commit(BoardEvent::TaskAdded {
            list_id: list_id.to_string(),
            task_id: id.clone(),
        });
        Some(id)
    }

    /// Flip `completed` and move the task to `Done` or back to `To Do`
    pub fn toggle_task(&mut self, list_id: &str, task_id: &str) -> bool {
        if self.task(list_id, task_id).is_none() {
            debug!(list_id, task_id, "toggle_task: no such task");
            return false;
        }

        let Some(task) = self.board_mut().list_mut(list_id).and_then(|l| l.task_mut(task_id)) else {
            return false;
        };
        task.completed = !task.completed;
        task.status = Some(if task.completed { Status::Done } else { Status::ToDo });
        let completed = task.completed;
        debug!(list_id, task_id, completed, "Toggled task");

        self.commit(BoardEvent::TaskToggled {
            list_id: list_id.to_string(),
            task_id: task_id.to_string(),
            completed,
        });
        true
    }

    /// Remove a task, keeping its siblings in order
    pub fn delete_task(&mut self, list_id: &str, task_id: &str) -> bool {
        if self.task(list_id, task_id).is_none() {
            debug!(list_id, task_id, "delete_task: no such task");
            return false;
        }

        if let Some(list) = self.board_mut().list_mut(list_id) {
            list.tasks.retain(|t| t.id != task_id);
        }
        debug!(list_id, task_id, "Deleted task");

        self.commit(BoardEvent::TaskDeleted {
            list_id: list_id.to_string(),
            task_id: task_id.to_string(),
        });
        true
    }

    /// Shallow-merge `patch` into a task.
    ///
    /// `completed` and `status` are applied as given; keeping them consistent
    /// is left to `toggle_task`.
    pub fn update_task(&mut self, list_id: &str, task_id: &str, patch: TaskPatch) -> bool {
        if self.task(list_id, task_id).is_none() {
            debug!(list_id, task_id, "update_task: no such task");
            return false;
        }

        if let Some(task) = self.board_mut().list_mut(list_id).and_then(|l| l.task_mut(task_id)) {
            patch.apply(task);
        }
        debug!(list_id, task_id, "Updated task");

        self.commit(BoardEvent::TaskUpdated {
            list_id: list_id.to_string(),
            task_id: task_id.to_string(),
        });
        true
    }

    /// Shallow-merge `patch` into a list's name or description
    pub fn update_task_list(&mut self, list_id: &str, patch: TaskListPatch) -> bool {
        if self.state.list(list_id).is_none() {
            debug!(list_id, "update_task_list: no such list");
            return false;
        }

        if let Some(list) = self.board_mut().list_mut(list_id) {
            patch.apply(list);
        }
        debug!(list_id, "Updated task list");

        self.commit(BoardEvent::ListUpdated {
            list_id: list_id.to_string(),
        });
        true
    }

    // ========================================================================
    // Subscriptions
    // ========================================================================

    /// Register a callback run after every successful mutation
    pub fn subscribe(&mut self, callback: impl FnMut(&BoardEvent, &Board) + 'static) -> SubscriptionId {
        let id = self.next_subscription;
        self.next_subscription += 1;
        self.subscribers.push((id, Box::new(callback)));
        id
    }

    /// Drop a subscription. Returns false if it was already gone.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(sub_id, _)| *sub_id != id);
        self.subscribers.len() != before
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    // ========================================================================
    // Helper methods
    // ========================================================================

    fn board_mut(&mut self) -> &mut Board {
        Arc::make_mut(&mut self.state)
    }

    fn fresh_id(&mut self, taken: impl Fn(&Board, &str) -> bool) -> String {
        loop {
            let id = self.ids.next_id();
            if !taken(&self.state, &id) {
                return id;
            }
            warn!(id = %id, "Generated id already in use, drawing another");
        }
    }

    fn commit(&mut self, event: BoardEvent) {
        self.revision += 1;
        debug!(revision = self.revision, ?event, "Board changed");

        for (_, subscriber) in self.subscribers.iter_mut() {
            subscriber(&event, &*self.state);
        }
    }
}

impl Default for BoardStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for BoardStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoardStore")
            .field("lists", &self.state.lists.len())
            .field("revision", &self.revision)
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}
