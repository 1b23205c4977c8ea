//! File watching for `ebb dev --watch`.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::time::{Duration, Instant};

use notify::event::{ModifyKind, RenameMode};
use notify::{EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc as async_mpsc;

const DEBOUNCE: Duration = Duration::from_millis(100);

/// Events emitted by the file watcher.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum WatchEvent {
    /// File was created or modified
    Changed(PathBuf),

    /// File was deleted or moved away
    Removed(PathBuf),
}

impl WatchEvent {
    pub fn path(&self) -> &Path {
        match self {
            Self::Changed(path) | Self::Removed(path) => path,
        }
    }
}

/// File watcher for detecting changes.
pub struct FileWatcher {
    _watcher: RecommendedWatcher,
}

impl FileWatcher {
    /// Create a new file watcher for the given paths.
    ///
    /// Returns the watcher and a channel to receive events. Repeated events
    /// for the same path within 100ms are dropped.
    pub fn new(
        paths: &[PathBuf],
    ) -> Result<(Self, async_mpsc::Receiver<WatchEvent>), std::io::Error> {
        let (sync_tx, sync_rx) = mpsc::channel();
        let (async_tx, async_rx) = async_mpsc::channel(100);

        let mut watcher = notify::recommended_watcher(move |res: Result<notify::Event, _>| {
            if let Ok(event) = res {
                let _ = sync_tx.send(event);
            }
        })
        .map_err(std::io::Error::other)?;

        for path in paths {
            if path.exists() {
                watcher
                    .watch(path, RecursiveMode::Recursive)
                    .map_err(std::io::Error::other)?;
            }
        }

        std::thread::spawn(move || {
            let mut seen: HashMap<WatchEvent, Instant> = HashMap::new();

            while let Ok(event) = sync_rx.recv() {
                let now = Instant::now();
                seen.retain(|_, at| now.duration_since(*at) < DEBOUNCE);

                for watch_event in classify_event(&event.paths, &event.kind) {
                    if seen.contains_key(&watch_event) {
                        continue;
                    }
                    seen.insert(watch_event.clone(), now);
                    if async_tx.blocking_send(watch_event).is_err() {
                        return;
                    }
                }
            }
        });

        Ok((Self { _watcher: watcher }, async_rx))
    }
}

/// Classify a notify event into watch events.
fn classify_event(paths: &[PathBuf], kind: &EventKind) -> Vec<WatchEvent> {
    match kind {
        EventKind::Modify(ModifyKind::Name(RenameMode::Both)) if paths.len() == 2 => vec![
            WatchEvent::Removed(paths[0].clone()),
            WatchEvent::Changed(paths[1].clone()),
        ],
        EventKind::Modify(ModifyKind::Name(RenameMode::From)) | EventKind::Remove(_) => {
            paths.iter().cloned().map(WatchEvent::Removed).collect()
        }
        EventKind::Create(_) | EventKind::Modify(_) => {
            paths.iter().cloned().map(WatchEvent::Changed).collect()
        }
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{CreateKind, RemoveKind};
    use pretty_assertions::assert_eq;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn classifies_renames() {
        let from = PathBuf::from("a.mdx");
        let to = PathBuf::from("b.mdx");

        assert_eq!(
            classify_event(
                &[from.clone(), to.clone()],
                &EventKind::Modify(ModifyKind::Name(RenameMode::Both))
            ),
            vec![WatchEvent::Removed(from.clone()), WatchEvent::Changed(to)]
        );
        assert_eq!(
            classify_event(&[from.clone()], &EventKind::Remove(RemoveKind::File)),
            vec![WatchEvent::Removed(from.clone())]
        );
        assert_eq!(
            classify_event(&[from.clone()], &EventKind::Create(CreateKind::File)),
            vec![WatchEvent::Changed(from)]
        );
        assert!(classify_event(&[], &EventKind::Any).is_empty());
    }

    #[tokio::test]
    async fn watches_file_changes() {
        let temp = tempdir().unwrap();
        let test_file = temp.path().join("test.mdx");

        let (watcher, mut rx) = FileWatcher::new(&[temp.path().to_path_buf()]).unwrap();

        // Give inotify time to set up
        tokio::time::sleep(Duration::from_millis(100)).await;

        fs::write(&test_file, "# Created").unwrap();

        let event = tokio::time::timeout(Duration::from_secs(3), rx.recv()).await;
        drop(watcher);

        assert!(event.is_ok(), "timeout waiting for file watch event");
        let event = event.unwrap().expect("channel should not be closed");
        assert_eq!(event.path().file_name(), test_file.file_name());
    }
}
