// SPDX-License-Identifier: GPL-2.0-only

//! Shared store for the most recent reconciliation results.

use std::sync::RwLock;

use bstr::BString;

use crate::revfiles::RevisionFiles;

/// The reconciled, point-in-time view of working-tree status relative to a
/// parent commit id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WipSnapshot {
    pub parent_sha: String,
    pub files: RevisionFiles,
}

/// Cache shared between one writing reconciler and any number of readers.
///
/// Each operation takes the lock on its own; the untracked-file store and the
/// snapshot are written under separate acquisitions within one reconciliation
/// cycle. A reader in between observes fresh untracked files paired with the
/// previous snapshot. Callers that need the pair to be consistent must
/// serialize their reads around the update cycle.
#[derive(Debug, Default)]
pub struct WipCache {
    inner: RwLock<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    untracked: Vec<BString>,
    snapshot: Option<WipSnapshot>,
}

impl WipCache {
    pub fn new() -> WipCache {
        WipCache::default()
    }

    /// Replace the untracked-file listing.
    pub fn set_untracked_files(&self, files: Vec<BString>) {
        self.inner.write().expect("cache lock poisoned").untracked = files;
    }

    /// The untracked-file listing from the most recent cycle.
    pub fn untracked_files(&self) -> Vec<BString> {
        self.inner
            .read()
            .expect("cache lock poisoned")
            .untracked
            .clone()
    }

    /// Replace the WIP snapshot, returning whether it changed.
    pub fn update_wip_snapshot(&self, parent_sha: String, files: RevisionFiles) -> bool {
        let snapshot = WipSnapshot { parent_sha, files };
        let mut inner = self.inner.write().expect("cache lock poisoned");
        let changed = inner.snapshot.as_ref() != Some(&snapshot);
        inner.snapshot = Some(snapshot);
        changed
    }

    /// The snapshot published by the most recent successful cycle.
    pub fn wip_snapshot(&self) -> Option<WipSnapshot> {
        self.inner
            .read()
            .expect("cache lock poisoned")
            .snapshot
            .clone()
    }
}
