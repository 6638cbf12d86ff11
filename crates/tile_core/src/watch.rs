//! Level file change detection for hot reload.
//!
//! Editors often save in several writes, so a change is only reported once
//! the file's stamp (mtime and length) has held still for a settle window.
//! Time comes from the caller as [`Clock`](crate::time::Clock) milliseconds.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// Default quiet period before a changed level is reported.
pub const DEFAULT_SETTLE_MS: u64 = 150;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LevelChange {
    /// The file settled with new contents (or appeared).
    Modified,
    /// The file disappeared; the loaded level should stay as it is.
    Removed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Stamp {
    modified: SystemTime,
    len: u64,
}

pub struct LevelWatcher {
    path: PathBuf,
    settle_ms: u64,
    /// Stamp of the last reported (or initial) version.
    current: Option<Stamp>,
    /// A differing stamp and when it was first seen.
    pending: Option<(Stamp, u64)>,
    changes: u32,
}

impl LevelWatcher {
    pub fn new(path: PathBuf, settle_ms: u64) -> Self {
        let current = stamp(&path);
        Self {
            path,
            settle_ms,
            current,
            pending: None,
            changes: 0,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Modification time of the version last reported, if the file exists.
    pub fn last_modified(&self) -> Option<SystemTime> {
        self.current.map(|s| s.modified)
    }

    /// Settled modifications reported so far.
    pub fn changes(&self) -> u32 {
        self.changes
    }

    pub fn poll(&mut self, now_ms: u64) -> Option<LevelChange> {
        let Some(seen) = stamp(&self.path) else {
            self.pending = None;
            return self.current.take().map(|_| LevelChange::Removed);
        };

        if self.current == Some(seen) {
            self.pending = None;
            return None;
        }

        let since = match self.pending {
            Some((pending, since)) if pending == seen => since,
            _ => {
                self.pending = Some((seen, now_ms));
                now_ms
            }
        };
        if now_ms.saturating_sub(since) < self.settle_ms {
            return None;
        }

        self.current = Some(seen);
        self.pending = None;
        self.changes += 1;
        Some(LevelChange::Modified)
    }
}

fn stamp(path: &Path) -> Option<Stamp> {
    let meta = fs::metadata(path).ok()?;
    Some(Stamp {
        modified: meta.modified().ok()?,
        len: meta.len(),
    })
}
