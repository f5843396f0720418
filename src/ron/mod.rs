//! RON file loading and a directory watcher for hot reload.
//!
//! `load_ron_files` reads every `.ron` file in a directory in file-name
//! order, so "first file wins" callers behave the same on every platform.
//! `RonWatcher` raises a shared flag when a `.ron` file under the watched
//! directory is written; systems poll it with `take_changed`.

use bevy::prelude::{warn, Resource};
use notify::{Config, RecommendedWatcher, RecursiveMode, Watcher};
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// File-watcher handle for RON hot reload.
#[derive(Resource)]
pub struct RonWatcher {
    changed: Arc<Mutex<bool>>,
    _watcher: Option<RecommendedWatcher>, // dropping it stops the OS watch
}

impl RonWatcher {
    /// A watcher with no OS backing. Never reports a change on its own.
    #[must_use]
    pub fn stub() -> Self {
        RonWatcher { changed: Arc::new(Mutex::new(false)), _watcher: None }
    }

    #[must_use]
    pub fn is_live(&self) -> bool {
        self._watcher.is_some()
    }

    /// Flag a change by hand (tests, manual reload requests).
    pub fn mark_changed(&self) {
        *lock_flag(&self.changed) = true;
    }

    /// Return whether anything changed since the last call, and reset the flag.
    pub fn take_changed(&self) -> bool {
        std::mem::take(&mut *lock_flag(&self.changed))
    }
}

/// The flag is a plain bool, a panic while holding it cannot leave it torn.
fn lock_flag(flag: &Mutex<bool>) -> MutexGuard<'_, bool> {
    flag.lock().unwrap_or_else(PoisonError::into_inner)
}

fn is_ron(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "ron")
}

/// Deserialize every `.ron` file in `path` into `T`.
///
/// # Arguments
/// * `path` - directory to scan, not recursed into
///
/// # Returns
/// Successfully parsed items ordered by file name. Unreadable or malformed
/// files are skipped with a warning. A missing directory yields an empty list.
#[must_use]
pub fn load_ron_files<T: DeserializeOwned>(path: &str) -> Vec<T> {
    let Ok(entries) = std::fs::read_dir(path) else {
        return Vec::new();
    };

    let mut files: Vec<PathBuf> = entries
        .flatten()
        .map(|entry| entry.path())
        .filter(|p| p.is_file() && is_ron(p))
        .collect();
    files.sort();

    files
        .iter()
        .filter_map(|file| {
            let content = match std::fs::read_to_string(file) {
                Ok(content) => content,
                Err(e) => {
                    warn!("could not read {}: {e}", file.display());
                    return None;
                }
            };
            match ron::from_str::<T>(&content) {
                Ok(item) => Some(item),
                Err(e) => {
                    warn!("failed to parse {}: {e}", file.display());
                    None
                }
            }
        })
        .collect()
}

/// Watch `path` for writes to `.ron` files.
///
/// # Errors
/// Returns a `notify::Error` if the OS watcher cannot be created or cannot
/// register the directory. Callers usually fall back to `RonWatcher::stub`.
pub fn setup_ron_watcher(path: &str) -> Result<RonWatcher, notify::Error> {
    let changed = Arc::new(Mutex::new(false));
    let flag = Arc::clone(&changed);
    let watched: PathBuf = std::fs::canonicalize(path).unwrap_or_else(|_| PathBuf::from(path));

    let mut watcher: RecommendedWatcher = Watcher::new(
        move |res: Result<notify::Event, notify::Error>| match res {
            Ok(event) => {
                if !matches!(event.kind, notify::EventKind::Modify(_) | notify::EventKind::Create(_)) {
                    return;
                }
                let relevant = event.paths.iter().any(|p| {
                    let p = std::fs::canonicalize(p).unwrap_or_else(|_| p.clone());
                    p.starts_with(&watched) && is_ron(&p)
                });
                if relevant {
                    *lock_flag(&flag) = true;
                }
            }
            Err(e) => warn!("watch error: {e}"),
        },
        Config::default(),
    )?;

    watcher.watch(Path::new(path), RecursiveMode::NonRecursive)?;
    Ok(RonWatcher { changed, _watcher: Some(watcher) })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Item {
        name: String,
    }

    fn scratch_dir(tag: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("dyngrav-ron-{tag}-{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn loads_in_file_name_order_and_skips_bad_files() {
        let dir = scratch_dir("order");
        std::fs::write(dir.join("b.ron"), r#"(name: "second")"#).unwrap();
        std::fs::write(dir.join("a.ron"), r#"(name: "first")"#).unwrap();
        std::fs::write(dir.join("c.ron"), "(name: ").unwrap();
        std::fs::write(dir.join("notes.txt"), r#"(name: "ignored")"#).unwrap();

        let items: Vec<Item> = load_ron_files(dir.to_str().unwrap());
        assert_eq!(items, vec![Item { name: "first".into() }, Item { name: "second".into() }]);
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn missing_directory_is_empty() {
        let items: Vec<Item> = load_ron_files("/definitely/not/here");
        assert!(items.is_empty());
    }

    #[test]
    fn stub_flag_is_taken_once() {
        let watcher = RonWatcher::stub();
        assert!(!watcher.is_live());
        assert!(!watcher.take_changed());
        watcher.mark_changed();
        assert!(watcher.take_changed());
        assert!(!watcher.take_changed());
    }
}
