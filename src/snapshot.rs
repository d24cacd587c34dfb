// JSONL board snapshots: one task list per line

use crate::models::{Board, TaskList};
use eyre::{Context, Result};
use fs2::FileExt;
use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Exclusive hold on a snapshot for a whole load-modify-save cycle.
///
/// The lock lives on a stable sidecar file (`<snapshot>.lock`) rather than on
/// the snapshot itself, which `save` replaces by rename. It is released when
/// the session is dropped.
#[derive(Debug)]
pub struct SnapshotSession {
    path: PathBuf,
    _lock: File,
}

impl SnapshotSession {
    /// Open the snapshot at `path`, blocking until no other session holds it
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).context("Failed to create snapshot directory")?;
        }

        let lock_path = sibling_path(path, ".lock");
        let lock = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(&lock_path)
            .context("Failed to open snapshot lock file")?;
        lock.lock_exclusive().context("Failed to acquire snapshot lock")?;
        debug!(file = ?lock_path, "Acquired snapshot lock");

        Ok(Self {
            path: path.to_path_buf(),
            _lock: lock,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// See [`load`]
    pub fn load(&self) -> Result<Option<Board>> {
        read_snapshot(&self.path)
    }

    /// See [`save`]
    pub fn save(&self, board: &Board) -> Result<()> {
        write_snapshot(&self.path, board)
    }
}

/// Write `board` to `path`, replacing any previous snapshot.
///
/// Lines go to a sibling temp file which is then renamed over `path`, all
/// while holding the snapshot's session lock.
pub fn save(path: &Path, board: &Board) -> Result<()> {
    SnapshotSession::open(path)?.save(board)
}

/// Read a snapshot written by `save`.
///
/// Returns `None` when the file does not exist. Unreadable or malformed lines
/// are skipped with a warning. When a list id appears twice the later line
/// wins and keeps the position of the first.
pub fn load(path: &Path) -> Result<Option<Board>> {
    SnapshotSession::open(path)?.load()
}

fn write_snapshot(path: &Path, board: &Board) -> Result<()> {
    let tmp_path = sibling_path(path, ".tmp");
    let file = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(&tmp_path)
        .context("Failed to open snapshot temp file")?;

    let mut writer = BufWriter::new(&file);
    for list in &board.lists {
        let json = serde_json::to_string(list).context("Failed to serialize task list")?;
        writeln!(writer, "{}", json)?;
    }
    writer.flush()?;
    drop(writer);
    file.sync_all()?;

    fs::rename(&tmp_path, path).context("Failed to move snapshot into place")?;

    info!(file = ?path, lists = board.lists.len(), "Saved board snapshot");
    Ok(())
}

fn read_snapshot(path: &Path) -> Result<Option<Board>> {
    if !path.exists() {
        debug!(file = ?path, "No snapshot yet");
        return Ok(None);
    }

    let file = File::open(path).context("Failed to open snapshot")?;
    let reader = BufReader::new(&file);
    let mut lists: Vec<TaskList> = Vec::new();

    for (line_num, line) in reader.lines().enumerate() {
        let line = match line {
            Ok(l) => l,
            Err(e) => {
                warn!(
                    file = ?path,
                    line = line_num + 1,
                    error = ?e,
                    "Failed to read line, skipping"
                );
                continue;
            }
        };

        if line.trim().is_empty() {
            continue;
        }

        let list: TaskList = match serde_json::from_str(&line) {
            Ok(l) => l,
            Err(e) => {
                warn!(
                    file = ?path,
                    line = line_num + 1,
                    error = ?e,
                    "Failed to parse task list, skipping"
                );
                continue;
            }
        };

        match lists.iter_mut().find(|existing| existing.id == list.id) {
            Some(existing) => {
                warn!(file = ?path, list_id = %list.id, "Duplicate list id, keeping later line");
                *existing = list;
            }
            None => lists.push(list),
        }
    }

    info!(file = ?path, count = lists.len(), "Loaded board snapshot");
    Ok(Some(Board::new(lists)))
}

/// `board.jsonl` -> `board.jsonl<suffix>`
fn sibling_path(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(suffix);
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_save_then_load() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("nested").join("board.jsonl");

        let mut board = Board::seeded();
        board.lists.push(TaskList::new("2", "Empty"));
        save(&path, &board).unwrap();

        let loaded = load(&path).unwrap().unwrap();
        assert_eq!(loaded, board);
        assert!(!sibling_path(&path, ".tmp").exists());

        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 2);
        assert!(content.contains("\"status\":\"In Progress\""));
    }

    #[test]
    fn test_save_replaces_previous_snapshot() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("board.jsonl");

        save(&path, &Board::seeded()).unwrap();
        save(&path, &Board::default()).unwrap();

        let loaded = load(&path).unwrap().unwrap();
        assert!(loaded.lists.is_empty());
    }

    #[test]
    fn test_load_missing_file() {
        let temp = TempDir::new().unwrap();
        assert!(load(&temp.path().join("missing.jsonl")).unwrap().is_none());
    }

    #[test]
    fn test_load_skips_malformed_lines() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("board.jsonl");

        fs::write(
            &path,
            r#"{"id":"1","name":"Valid","tasks":[]}
{malformed json}

{"id":"2","name":"Also Valid","tasks":[{"id":"t","title":"Task","completed":false}]}
"#,
        )
        .unwrap();

        let board = load(&path).unwrap().unwrap();
        assert_eq!(board.lists.len(), 2);
        assert_eq!(board.lists[1].tasks[0].title, "Task");
        assert!(board.lists[1].tasks[0].status.is_none());
    }

    #[test]
    fn test_load_duplicate_id_later_wins() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("board.jsonl");

        fs::write(
            &path,
            r#"{"id":"1","name":"Version 1"}
{"id":"2","name":"Other"}
{"id":"1","name":"Version 2"}
"#,
        )
        .unwrap();

        let board = load(&path).unwrap().unwrap();
        let names: Vec<&str> = board.lists.iter().map(|l| l.name.as_str()).collect();
        assert_eq!(names, vec!["Version 2", "Other"]);
    }

    #[test]
    fn test_session_holds_sidecar_lock_until_dropped() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("board.jsonl");

        let session = SnapshotSession::open(&path).unwrap();
        assert_eq!(session.path(), path.as_path());

        let lock_path = sibling_path(&path, ".lock");
        let other = File::open(&lock_path).unwrap();
        assert!(other.try_lock_exclusive().is_err());

        session.save(&Board::seeded()).unwrap();
        assert!(other.try_lock_exclusive().is_err());
        assert!(lock_path.exists());

        drop(session);
        assert!(other.try_lock_exclusive().is_ok());
        FileExt::unlock(&other).unwrap();
    }

    #[test]
    fn test_session_load_modify_save() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("board.jsonl");
        save(&path, &Board::seeded()).unwrap();

        let session = SnapshotSession::open(&path).unwrap();
        let mut board = session.load().unwrap().unwrap();
        board.lists.push(TaskList::new("2", "Added"));
        session.save(&board).unwrap();
        drop(session);

        let reloaded = load(&path).unwrap().unwrap();
        assert_eq!(reloaded.lists.len(), 2);
    }
}
