// SPDX-License-Identifier: GPL-2.0-only

//! The per-file status model of a work-in-progress revision.
//!
//! [`RevisionFiles`] holds an ordered list of paths parsed out of
//! `git diff-index` output together with an accumulating status bitmask and a
//! merge-parent tag per path. It also owns the merge algorithm that folds the
//! staged diff and the untracked listing into the unstaged diff.

use std::collections::HashMap;

use anyhow::Result;
use bstr::{BStr, BString, ByteSlice};

bitflags::bitflags! {
    /// Accumulating per-file status bits.
    ///
    /// A file legitimately carries several flags at once; a conflicted path
    /// whose other side was removed ends up as `CONFLICT | DELETED`, and a
    /// staged-then-modified file as `MODIFIED | PARTIALLY_CACHED`.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct StatusFlags: u16 {
        const MODIFIED = 1 << 0;
        const ADDED = 1 << 1;
        const DELETED = 1 << 2;
        const RENAMED = 1 << 3;
        const COPIED = 1 << 4;
        const UNKNOWN = 1 << 5;
        const IN_INDEX = 1 << 6;
        const CONFLICT = 1 << 7;
        const PARTIALLY_CACHED = 1 << 8;
    }
}

/// Merge-parent tag of entries that came solely from the untracked listing.
pub const UNTRACKED_PARENT: u32 = 1;

/// Merge-parent tag of entries parsed out of diff output.
const DIFF_PARENT: u32 = 0;

/// How a conflicted path got into its current shape, as reported by the
/// combined per-file diff.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictKind {
    BothModified,
    DeletedByThem,
    DeletedByUs,
}

/// Ordered per-file statuses for one revision of the working tree.
///
/// Paths appear in diff output order. Duplicate paths are kept as distinct
/// entries; the shape is fixed after construction and only status bits
/// accumulate during the merge pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevisionFiles {
    files: Vec<BString>,
    status: Vec<StatusFlags>,
    merge_parent: Vec<u32>,
    only_modified: bool,
}

impl RevisionFiles {
    /// Parse `git diff-index` output into a file set.
    ///
    /// Records look like `:<mode> <mode> <sha> <sha> <STATUS>\t<path>`; the
    /// status field is the last whitespace-delimited token before the tab and
    /// paths may contain spaces. `cached` selects staged-diff semantics:
    /// every record additionally carries [`StatusFlags::IN_INDEX`].
    pub fn parse(diff: &[u8], cached: bool) -> RevisionFiles {
        let mut files = Vec::new();
        let mut status = Vec::new();
        let mut merge_parent = Vec::new();
        let mut only_modified = true;

        for line in diff.lines() {
            let mut parts = line.splitn_str(2, b"\t");
            let meta = parts.next().expect("splitn yields at least one piece");
            let Some(path) = parts.next() else {
                continue;
            };
            if !meta.starts_with(b":") {
                continue;
            }
            let Some(status_token) = meta.fields().last() else {
                continue;
            };
            let letter = status_token[0];
            let mut flags = status_flags(letter);
            if cached {
                flags |= StatusFlags::IN_INDEX;
            }
            if !matches!(letter, b'M' | b'T') {
                only_modified = false;
            }
            files.push(BString::from(path));
            status.push(flags);
            merge_parent.push(DIFF_PARENT);
        }

        RevisionFiles {
            files,
            status,
            merge_parent,
            only_modified,
        }
    }

    /// Fold the staged diff and the untracked listing into the unstaged diff.
    ///
    /// Untracked paths are appended with status [`StatusFlags::UNKNOWN`] and
    /// merge-parent [`UNTRACKED_PARENT`]; their status is terminal and they
    /// are never cross-referenced against the staged diff. Every other entry
    /// is looked up by exact path in the staged set to refine its status:
    /// a staged conflict appends `CONFLICT`, a staged modification of a
    /// further-modified file appends `PARTIALLY_CACHED`, and any other staged
    /// record appends `IN_INDEX`.
    ///
    /// `classify` is consulted once per conflicted path to decide whether the
    /// conflict also removed the file; when it fails, the path keeps
    /// `CONFLICT` without the `DELETED` refinement.
    pub fn merged<F>(
        unstaged_diff: &[u8],
        staged_diff: &[u8],
        untracked: &[BString],
        mut classify: F,
    ) -> RevisionFiles
    where
        F: FnMut(&BStr) -> Result<ConflictKind>,
    {
        let mut wip = RevisionFiles::parse(unstaged_diff, false);
        wip.only_modified = false;

        for path in untracked {
            wip.push_untracked(path.clone());
        }

        let cached = RevisionFiles::parse(staged_diff, true);
        let mut cached_status: HashMap<&BStr, StatusFlags> =
            HashMap::with_capacity(cached.len());
        for (path, flags) in cached.files.iter().zip(&cached.status) {
            // First record wins, like a positional lookup in the diff text.
            cached_status.entry(path.as_bstr()).or_insert(*flags);
        }

        for index in 0..wip.len() {
            if wip.merge_parent[index] == UNTRACKED_PARENT {
                continue;
            }
            let Some(&flags) = cached_status.get(wip.files[index].as_bstr()) else {
                continue;
            };
            if flags.contains(StatusFlags::CONFLICT) {
                wip.status[index] |= StatusFlags::CONFLICT;
                match classify(wip.files[index].as_bstr()) {
                    Ok(ConflictKind::DeletedByThem | ConflictKind::DeletedByUs) => {
                        wip.status[index] |= StatusFlags::DELETED;
                    }
                    Ok(ConflictKind::BothModified) => {}
                    // Classification failure leaves CONFLICT unrefined.
                    Err(_) => {}
                }
            } else if flags.contains(StatusFlags::MODIFIED | StatusFlags::IN_INDEX) {
                wip.status[index] |= StatusFlags::PARTIALLY_CACHED;
            } else if flags.contains(StatusFlags::IN_INDEX) {
                wip.status[index] |= StatusFlags::IN_INDEX;
            }
        }

        wip
    }

    /// Append an untracked path; its status is terminal.
    pub fn push_untracked(&mut self, path: BString) {
        self.files.push(path);
        self.status.push(StatusFlags::UNKNOWN);
        self.merge_parent.push(UNTRACKED_PARENT);
        self.only_modified = false;
    }

    /// Return the number of file entries.
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Return `true` if there are no file entries.
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Path of the entry at `index`.
    pub fn file(&self, index: usize) -> &BStr {
        self.files[index].as_bstr()
    }

    /// Status bits of the entry at `index`.
    pub fn status(&self, index: usize) -> StatusFlags {
        self.status[index]
    }

    /// Merge-parent tag of the entry at `index`.
    pub fn merge_parent(&self, index: usize) -> u32 {
        self.merge_parent[index]
    }

    /// Whether every parsed record was a plain modification.
    pub fn only_modified(&self) -> bool {
        self.only_modified
    }

    /// Accumulate status bits onto the entry at `index`.
    pub fn append_status(&mut self, index: usize, flags: StatusFlags) {
        self.status[index] |= flags;
    }

    /// Test whether the entry at `index` carries all of `flags`.
    pub fn status_has(&self, index: usize, flags: StatusFlags) -> bool {
        self.status[index].contains(flags)
    }

    /// Iterate `(path, status, merge_parent)` triples in file order.
    pub fn iter(&self) -> impl Iterator<Item = (&BStr, StatusFlags, u32)> + '_ {
        (0..self.len()).map(move |index| {
            (
                self.file(index),
                self.status[index],
                self.merge_parent[index],
            )
        })
    }
}

fn status_flags(letter: u8) -> StatusFlags {
    match letter {
        b'M' | b'T' => StatusFlags::MODIFIED,
        b'A' => StatusFlags::ADDED,
        b'D' => StatusFlags::DELETED,
        b'R' => StatusFlags::RENAMED,
        b'C' => StatusFlags::COPIED,
        b'U' => StatusFlags::CONFLICT,
        _ => StatusFlags::UNKNOWN,
    }
}
