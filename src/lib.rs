// SPDX-License-Identifier: GPL-2.0-only

//! Work-in-progress status for a git working tree.
//!
//! The crate reconciles three independent plumbing outputs -- the untracked
//! file listing, the unstaged diff, and the staged diff -- into a single
//! ordered per-file status model ([`RevisionFiles`]) that change-list UIs and
//! commit builders can rely on as ground truth.
//!
//! [`WipReconciler`] drives one reconciliation cycle: it issues the plumbing
//! queries through a [`GitRunner`], folds the staged diff and the untracked
//! listing into the unstaged diff, and publishes the merged result into a
//! shared [`WipCache`].

mod cache;
mod plumbing;
mod revfiles;
mod wip;

pub use self::{
    cache::{WipCache, WipSnapshot},
    plumbing::{GitContext, GitError, GitRunner},
    revfiles::{ConflictKind, RevisionFiles, StatusFlags, UNTRACKED_PARENT},
    wip::{WipReconciler, EMPTY_TREE_SHA},
};
