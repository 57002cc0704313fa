// History store - bounded, newest-first list of finished downloads
//
// Injected into the orchestrator; nothing here is global. A persisted store
// is loaded once at startup and rewritten on every change.

use std::path::{Path, PathBuf};

use parking_lot::Mutex;

use super::errors::HistoryError;
use super::models::HistoryItem;

/// Most-recent entries kept
pub const HISTORY_LIMIT: usize = 10;

/// Interface the orchestrator reports to
pub trait HistoryStore: Send + Sync {
    /// Insert at the front, dropping the oldest beyond HISTORY_LIMIT
    fn append(&self, item: HistoryItem) -> Result<(), HistoryError>;

    fn remove(&self, id: &str) -> Result<bool, HistoryError>;

    fn clear(&self) -> Result<(), HistoryError>;

    /// Newest first
    fn items(&self) -> Vec<HistoryItem>;
}

fn push_front_bounded(items: &mut Vec<HistoryItem>, item: HistoryItem) {
    items.insert(0, item);
    items.truncate(HISTORY_LIMIT);
}

/// Volatile store, for tests and one-shot runs
#[derive(Default)]
pub struct MemoryHistoryStore {
    items: Mutex<Vec<HistoryItem>>,
}

impl MemoryHistoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl HistoryStore for MemoryHistoryStore {
    fn append(&self, item: HistoryItem) -> Result<(), HistoryError> {
        push_front_bounded(&mut self.items.lock(), item);
        Ok(())
    }

    fn remove(&self, id: &str) -> Result<bool, HistoryError> {
        let mut items = self.items.lock();
        let before = items.len();
        items.retain(|i| i.id != id);
        Ok(items.len() != before)
    }

    fn clear(&self) -> Result<(), HistoryError> {
        self.items.lock().clear();
        Ok(())
    }

    fn items(&self) -> Vec<HistoryItem> {
        self.items.lock().clone()
    }
}

/// Store persisted as a JSON array on disk
pub struct JsonHistoryStore {
    path: PathBuf,
    items: Mutex<Vec<HistoryItem>>,
}

impl JsonHistoryStore {
    /// `<data dir>/yt-ultra/download-history.json`
    pub fn default_path() -> Result<PathBuf, HistoryError> {
        dirs::data_dir()
            .map(|d| d.join("yt-ultra").join("download-history.json"))
            .ok_or(HistoryError::NoDataDir)
    }

    /// Load from `path`; a missing or unreadable file is an empty history,
    /// rewritten on the next change
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, HistoryError> {
        let path = path.into();
        let items = match std::fs::read_to_string(&path) {
            Ok(content) if content.trim().is_empty() => Vec::new(),
            Ok(content) => match serde_json::from_str::<Vec<HistoryItem>>(&content) {
                Ok(mut items) => {
                    items.truncate(HISTORY_LIMIT);
                    items
                }
                Err(e) => {
                    log::warn!(
                        "[History] Ignoring corrupt history file {}: {}",
                        path.display(),
                        e
                    );
                    Vec::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(e) => return Err(e.into()),
        };
        log::debug!("[History] Loaded {} item(s) from {}", items.len(), path.display());
        Ok(Self {
            path,
            items: Mutex::new(items),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, items: &[HistoryItem]) -> Result<(), HistoryError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(items)?;
        std::fs::write(&self.path, json)?;
        Ok(())
    }
}

impl HistoryStore for JsonHistoryStore {
    fn append(&self, item: HistoryItem) -> Result<(), HistoryError> {
        let mut items = self.items.lock();
        push_front_bounded(&mut items, item);
        self.persist(&items)
    }

    fn remove(&self, id: &str) -> Result<bool, HistoryError> {
        let mut items = self.items.lock();
        let before = items.len();
        items.retain(|i| i.id != id);
        let removed = items.len() != before;
        if removed {
            self.persist(&items)?;
        }
        Ok(removed)
    }

    fn clear(&self) -> Result<(), HistoryError> {
        let mut items = self.items.lock();
        items.clear();
        self.persist(&items)
    }

    fn items(&self) -> Vec<HistoryItem> {
        self.items.lock().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(n: usize) -> HistoryItem {
        HistoryItem {
            id: format!("s{}", n),
            timestamp: n as i64,
            title: format!("Video {}", n),
            thumbnail: "https://img.youtube.com/vi/dQw4w9WgXcQ/mqdefault.jpg".into(),
            format: "MP4 720p".into(),
        }
    }

    #[test]
    fn test_bounded_newest_first() {
        let store = MemoryHistoryStore::new();
        for n in 0..15 {
            store.append(item(n)).unwrap();
        }
        let items = store.items();
        assert_eq!(items.len(), HISTORY_LIMIT);
        assert_eq!(items[0].id, "s14");
        assert_eq!(items[9].id, "s5");
    }

    #[test]
    fn test_remove_and_clear() {
        let store = MemoryHistoryStore::new();
        store.append(item(1)).unwrap();
        store.append(item(2)).unwrap();
        assert!(store.remove("s1").unwrap());
        assert!(!store.remove("s1").unwrap());
        assert_eq!(store.items().len(), 1);
        store.clear().unwrap();
        assert!(store.items().is_empty());
    }

    #[test]
    fn test_json_store_round_trips_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("history.json");

        let store = JsonHistoryStore::open(&path).unwrap();
        assert!(store.items().is_empty());
        store.append(item(1)).unwrap();
        store.append(item(2)).unwrap();
        store.remove("s1").unwrap();

        let reopened = JsonHistoryStore::open(&path).unwrap();
        assert_eq!(reopened.items(), vec![item(2)]);

        reopened.clear().unwrap();
        assert!(JsonHistoryStore::open(&path).unwrap().items().is_empty());
    }

    #[test]
    fn test_json_store_starts_empty_on_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.json");
        std::fs::write(&path, "{not json").unwrap();

        let store = JsonHistoryStore::open(&path).unwrap();
        assert!(store.items().is_empty());

        store.append(item(3)).unwrap();
        assert_eq!(JsonHistoryStore::open(&path).unwrap().items(), vec![item(3)]);
    }
}
