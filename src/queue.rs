//! Screenshot queues: the primary problem queue and the extra debug queue.
//!
//! Each queue is an insertion-ordered list of PNG files on disk. Memory is
//! authoritative: an entry leaves its queue even when the file delete fails.
//! Files and entries are otherwise created and destroyed together.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};

/// Maximum screenshots held while composing the problem statement.
pub const PRIMARY_CAPACITY: usize = 2;

const PRIMARY_DIR: &str = "screenshots";
const EXTRA_DIR: &str = "extra_screenshots";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum QueueKind {
    Primary,
    Extra,
}

/// A captured screenshot. Identity is the file path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScreenshotRef {
    pub path: PathBuf,
}

#[derive(Debug, thiserror::Error)]
pub enum QueueError {
    #[error("Screenshot not found in any queue: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Screenshot evicted as soon as it was queued: {}", .0.display())]
    EvictedOnArrival(PathBuf),

    #[error("Failed to access {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub struct ScreenshotQueues {
    primary_dir: PathBuf,
    extra_dir: PathBuf,
    primary: VecDeque<ScreenshotRef>,
    extra: VecDeque<ScreenshotRef>,
    extra_capacity: Option<NonZeroUsize>,
    seq: u64,
}

impl ScreenshotQueues {
    /// Create both queue directories under `root` and sweep files left
    /// behind by a previous session.
    pub fn open(root: &Path, extra_capacity: Option<NonZeroUsize>) -> Result<Self, QueueError> {
        let primary_dir = root.join(PRIMARY_DIR);
        let extra_dir = root.join(EXTRA_DIR);
        for dir in [&primary_dir, &extra_dir] {
            std::fs::create_dir_all(dir).map_err(|source| QueueError::Io {
                path: dir.clone(),
                source,
            })?;
        }

        let queues = Self {
            primary_dir,
            extra_dir,
            primary: VecDeque::new(),
            extra: VecDeque::new(),
            extra_capacity,
            seq: 0,
        };
        queues.sweep();
        Ok(queues)
    }

    pub fn dir(&self, kind: QueueKind) -> &Path {
        match kind {
            QueueKind::Primary => &self.primary_dir,
            QueueKind::Extra => &self.extra_dir,
        }
    }

    pub fn capacity(&self, kind: QueueKind) -> Option<usize> {
        match kind {
            QueueKind::Primary => Some(PRIMARY_CAPACITY),
            QueueKind::Extra => self.extra_capacity.map(NonZeroUsize::get),
        }
    }

    /// Reserve a fresh file path in `kind`'s directory.
    pub fn next_path(&mut self, kind: QueueKind) -> PathBuf {
        self.seq += 1;
        let epoch_ms = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or(0);
        self.dir(kind)
            .join(format!("{}-{:04}.png", epoch_ms, self.seq))
    }

    /// Append an already-written file to `kind`. Entries beyond capacity are
    /// evicted oldest first and their files deleted; the evicted refs are
    /// returned.
    pub fn enqueue(&mut self, kind: QueueKind, path: PathBuf) -> Vec<ScreenshotRef> {
        let capacity = self.capacity(kind);
        let queue = self.queue_mut(kind);
        queue.push_back(ScreenshotRef { path });

        let mut evicted = Vec::new();
        if let Some(cap) = capacity {
            while queue.len() > cap {
                if let Some(oldest) = queue.pop_front() {
                    evicted.push(oldest);
                }
            }
        }

        for old in &evicted {
            log::info!("[QUEUE] Evicted {} from {:?} queue", old.path.display(), kind);
            remove_file_logged(&old.path);
        }
        evicted
    }

    /// Current contents of `kind`, oldest first.
    pub fn list(&self, kind: QueueKind) -> Vec<ScreenshotRef> {
        self.queue(kind).iter().cloned().collect()
    }

    /// Primary followed by extra; the input of a debug pass.
    pub fn combined(&self) -> Vec<ScreenshotRef> {
        self.primary.iter().chain(self.extra.iter()).cloned().collect()
    }

    pub fn len(&self, kind: QueueKind) -> usize {
        self.queue(kind).len()
    }

    pub fn is_empty(&self, kind: QueueKind) -> bool {
        self.queue(kind).is_empty()
    }

    /// Which queue holds `path`, if any.
    pub fn find(&self, path: &Path) -> Option<QueueKind> {
        [QueueKind::Primary, QueueKind::Extra]
            .into_iter()
            .find(|kind| self.queue(*kind).iter().any(|s| s.path == path))
    }

    /// Remove `path` from whichever queue holds it and delete the file.
    ///
    /// Unknown paths fail with `NotFound` and leave both queues untouched.
    /// A failed disk delete still removes the entry, then reports `Io`.
    pub fn delete(&mut self, path: &Path) -> Result<QueueKind, QueueError> {
        let kind = self
            .find(path)
            .ok_or_else(|| QueueError::NotFound(path.to_path_buf()))?;
        self.queue_mut(kind).retain(|s| s.path != path);

        std::fs::remove_file(path).map_err(|source| QueueError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        log::info!("[QUEUE] Deleted {} from {:?} queue", path.display(), kind);
        Ok(kind)
    }

    /// Empty `kind`, deleting every file it held.
    pub fn clear(&mut self, kind: QueueKind) {
        let drained: Vec<ScreenshotRef> = self.queue_mut(kind).drain(..).collect();
        for shot in &drained {
            remove_file_logged(&shot.path);
        }
        if !drained.is_empty() {
            log::info!("[QUEUE] Cleared {} file(s) from {:?} queue", drained.len(), kind);
        }
    }

    /// Empty both queues and sweep stray files from their directories.
    pub fn clear_all(&mut self) {
        self.clear(QueueKind::Primary);
        self.clear(QueueKind::Extra);
        self.sweep();
    }

    /// Delete PNGs in the queue directories that no queue references.
    fn sweep(&self) {
        for dir in [&self.primary_dir, &self.extra_dir] {
            let entries = match std::fs::read_dir(dir) {
                Ok(entries) => entries,
                Err(e) => {
                    log::warn!("[QUEUE] Cannot scan {}: {}", dir.display(), e);
                    continue;
                }
            };
            for entry in entries.flatten() {
                let path = entry.path();
                let is_png = path.extension().map(|ext| ext == "png").unwrap_or(false);
                if is_png && self.find(&path).is_none() {
                    remove_file_logged(&path);
                }
            }
        }
    }

    fn queue(&self, kind: QueueKind) -> &VecDeque<ScreenshotRef> {
        match kind {
            QueueKind::Primary => &self.primary,
            QueueKind::Extra => &self.extra,
        }
    }

    fn queue_mut(&mut self, kind: QueueKind) -> &mut VecDeque<ScreenshotRef> {
        match kind {
            QueueKind::Primary => &mut self.primary,
            QueueKind::Extra => &mut self.extra,
        }
    }
}

fn remove_file_logged(path: &Path) {
    if let Err(e) = std::fs::remove_file(path) {
        if e.kind() != std::io::ErrorKind::NotFound {
            log::warn!("[QUEUE] Failed to delete {}: {}", path.display(), e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn scratch(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("co-test-queue-{}-{}", name, std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        dir
    }

    fn add(queues: &mut ScreenshotQueues, kind: QueueKind) -> PathBuf {
        let path = queues.next_path(kind);
        fs::write(&path, b"png").unwrap();
        queues.enqueue(kind, path.clone());
        path
    }

    #[test]
    fn primary_queue_evicts_oldest_and_deletes_its_file() {
        let root = scratch("evict");
        let mut q = ScreenshotQueues::open(&root, None).unwrap();
        let a = add(&mut q, QueueKind::Primary);
        let b = add(&mut q, QueueKind::Primary);
        let c = add(&mut q, QueueKind::Primary);

        let paths: Vec<PathBuf> = q.list(QueueKind::Primary).into_iter().map(|s| s.path).collect();
        assert_eq!(paths, vec![b, c]);
        assert!(!a.exists());
        let _ = fs::remove_dir_all(&root);
    }

    #[test]
    fn primary_never_exceeds_capacity() {
        let root = scratch("bound");
        let mut q = ScreenshotQueues::open(&root, None).unwrap();
        for _ in 0..7 {
            add(&mut q, QueueKind::Primary);
            assert!(q.len(QueueKind::Primary) <= PRIMARY_CAPACITY);
        }
        let _ = fs::remove_dir_all(&root);
    }

    #[test]
    fn extra_queue_is_unbounded_by_default() {
        let root = scratch("extra-unbounded");
        let mut q = ScreenshotQueues::open(&root, None).unwrap();
        for _ in 0..5 {
            add(&mut q, QueueKind::Extra);
        }
        assert_eq!(q.len(QueueKind::Extra), 5);
        let _ = fs::remove_dir_all(&root);
    }

    #[test]
    fn extra_queue_cap_uses_fifo_eviction() {
        let root = scratch("extra-capped");
        let mut q = ScreenshotQueues::open(&root, NonZeroUsize::new(3)).unwrap();
        let first = add(&mut q, QueueKind::Extra);
        for _ in 0..3 {
            add(&mut q, QueueKind::Extra);
        }
        assert_eq!(q.len(QueueKind::Extra), 3);
        assert!(q.find(&first).is_none());
        assert!(!first.exists());
        let _ = fs::remove_dir_all(&root);
    }

    #[test]
    fn delete_keeps_order_of_remaining_entries() {
        let root = scratch("delete-order");
        let mut q = ScreenshotQueues::open(&root, None).unwrap();
        let x = add(&mut q, QueueKind::Extra);
        let y = add(&mut q, QueueKind::Extra);
        let z = add(&mut q, QueueKind::Extra);

        assert_eq!(q.delete(&y).unwrap(), QueueKind::Extra);
        let paths: Vec<PathBuf> = q.list(QueueKind::Extra).into_iter().map(|s| s.path).collect();
        assert_eq!(paths, vec![x, z]);
        assert!(!y.exists());
        let _ = fs::remove_dir_all(&root);
    }

    #[test]
    fn delete_unknown_path_is_not_found_and_mutates_nothing() {
        let root = scratch("delete-missing");
        let mut q = ScreenshotQueues::open(&root, None).unwrap();
        let a = add(&mut q, QueueKind::Primary);

        let err = q.delete(&root.join("nope.png")).unwrap_err();
        assert!(matches!(err, QueueError::NotFound(_)));
        assert_eq!(q.list(QueueKind::Primary), vec![ScreenshotRef { path: a }]);
        let _ = fs::remove_dir_all(&root);
    }

    #[test]
    fn delete_with_missing_file_still_drops_entry() {
        let root = scratch("delete-io");
        let mut q = ScreenshotQueues::open(&root, None).unwrap();
        let a = add(&mut q, QueueKind::Primary);
        fs::remove_file(&a).unwrap();

        let err = q.delete(&a).unwrap_err();
        assert!(matches!(err, QueueError::Io { .. }));
        assert!(q.is_empty(QueueKind::Primary));
        let _ = fs::remove_dir_all(&root);
    }

    #[test]
    fn clear_all_removes_entries_and_stray_files() {
        let root = scratch("clear-all");
        let mut q = ScreenshotQueues::open(&root, None).unwrap();
        let a = add(&mut q, QueueKind::Primary);
        let x = add(&mut q, QueueKind::Extra);
        let stray = q.dir(QueueKind::Extra).join("leaked.png");
        fs::write(&stray, b"png").unwrap();

        q.clear_all();
        assert!(q.is_empty(QueueKind::Primary));
        assert!(q.is_empty(QueueKind::Extra));
        assert!(!a.exists() && !x.exists() && !stray.exists());
        let _ = fs::remove_dir_all(&root);
    }

    #[test]
    fn open_sweeps_files_from_previous_session() {
        let root = scratch("sweep");
        fs::create_dir_all(root.join(PRIMARY_DIR)).unwrap();
        let leaked = root.join(PRIMARY_DIR).join("old.png");
        fs::write(&leaked, b"png").unwrap();

        let q = ScreenshotQueues::open(&root, None).unwrap();
        assert!(!leaked.exists());
        assert!(q.is_empty(QueueKind::Primary));
        let _ = fs::remove_dir_all(&root);
    }

    #[test]
    fn combined_lists_primary_before_extra() {
        let root = scratch("combined");
        let mut q = ScreenshotQueues::open(&root, None).unwrap();
        let x = add(&mut q, QueueKind::Extra);
        let a = add(&mut q, QueueKind::Primary);
        let paths: Vec<PathBuf> = q.combined().into_iter().map(|s| s.path).collect();
        assert_eq!(paths, vec![a, x]);
        let _ = fs::remove_dir_all(&root);
    }
}
