// SPDX-License-Identifier: GPL-2.0-only

//! Reconciliation of working-tree, index, and untracked state.

use std::ffi::OsStr;

use anyhow::{Context, Result};
use bstr::{BStr, BString, ByteSlice};
use tracing::debug;

use crate::{
    cache::WipCache,
    plumbing::GitRunner,
    revfiles::{ConflictKind, RevisionFiles},
};

/// Object id of the empty tree, standing in for the parent of an unborn
/// `HEAD` so that diff queries always have a valid comparison target.
pub const EMPTY_TREE_SHA: &str = "4b825dc642cb6eb9a060e54bf8d69288fbee4904";

/// Drives one working-in-progress reconciliation cycle.
///
/// A cycle issues its plumbing queries sequentially, merges the results into
/// a [`RevisionFiles`] set, and publishes it into the shared [`WipCache`].
/// The reconciler assumes it is the cache's only writer while a cycle is in
/// flight; callers serialize cycles.
pub struct WipReconciler<'a, R> {
    runner: &'a R,
    cache: &'a WipCache,
}

impl<'a, R: GitRunner> WipReconciler<'a, R> {
    pub fn new(runner: &'a R, cache: &'a WipCache) -> WipReconciler<'a, R> {
        WipReconciler { runner, cache }
    }

    /// List untracked files in the working tree, in plumbing output order.
    ///
    /// A failing query yields an empty listing; it never fails the cycle.
    pub fn untracked_files(&self) -> Vec<BString> {
        debug!("listing untracked files");
        let output = match self.run(&["ls-files", "--others", "--exclude-standard"]) {
            Ok(output) => output,
            Err(err) => {
                debug!("untracked listing failed: {err:#}");
                return Vec::new();
            }
        };
        output
            .lines()
            .filter(|line| !line.is_empty())
            .map(BString::from)
            .collect()
    }

    /// Resolve the WIP parent and merge the three status sources.
    ///
    /// Only a failing revision resolution fails the cycle. An unborn `HEAD`
    /// resolves to [`EMPTY_TREE_SHA`], and either diff query may fail
    /// independently, contributing an empty diff instead. The untracked
    /// listing is read back from the cache, where [`Self::update`] stored it
    /// earlier in the same cycle.
    pub fn wip_info(&self) -> Result<(String, RevisionFiles)> {
        let output = self
            .run(&["rev-parse", "--revs-only", "HEAD"])
            .context("resolving wip parent")?;
        let parent = output
            .trim()
            .to_str()
            .context("wip parent id is not utf8")?
            .to_string();
        let parent = if parent.is_empty() {
            debug!("unborn repository, diffing against the empty tree");
            EMPTY_TREE_SHA.to_string()
        } else {
            parent
        };

        let unstaged = self.run_tolerant(&["diff-index", &parent]);
        let staged = self.run_tolerant(&["diff-index", "--cached", &parent]);
        let untracked = self.cache.untracked_files();

        debug!(
            parent = %parent,
            untracked = untracked.len(),
            "merging wip status"
        );
        let files = RevisionFiles::merged(&unstaged, &staged, &untracked, |path| {
            self.file_status(path)
        });

        Ok((parent, files))
    }

    /// Classify how a conflicted path differs between the merge parents.
    ///
    /// The combined raw diff distinguishes "both sides changed it" from "one
    /// side removed it", which the staged diff text alone cannot.
    pub fn file_status(&self, path: &BStr) -> Result<ConflictKind> {
        debug!(path = %path, "classifying conflicted file");
        let path = path
            .to_os_str()
            .context("path is not representable on this platform")?;
        let output = self.runner.run_git(&[
            OsStr::new("diff-files"),
            OsStr::new("-c"),
            OsStr::new("--raw"),
            OsStr::new("--"),
            path,
        ])?;
        Ok(classify_conflict(&output))
    }

    /// Run one full reconciliation cycle.
    ///
    /// The untracked listing is stored in the cache unconditionally; the
    /// snapshot is only replaced when the whole cycle succeeds, so a failed
    /// cycle leaves the previous snapshot in place. Returns whether the
    /// published snapshot differs from the previous one.
    pub fn update(&self) -> Result<bool> {
        self.cache.set_untracked_files(self.untracked_files());

        let (parent, files) = self.wip_info()?;
        Ok(self.cache.update_wip_snapshot(parent, files))
    }

    fn run(&self, args: &[&str]) -> Result<Vec<u8>> {
        let args: Vec<&OsStr> = args.iter().map(OsStr::new).collect();
        self.runner.run_git(&args)
    }

    fn run_tolerant(&self, args: &[&str]) -> Vec<u8> {
        match self.run(args) {
            Ok(output) => output,
            Err(err) => {
                debug!("tolerated plumbing failure: {err:#}");
                Vec::new()
            }
        }
    }
}

/// Classify combined raw diff output for a single conflicted path.
///
/// More than one record means the other side of the merge removed the file; a
/// single record whose status field is two characters wide means both merge
/// parents modified it; anything else means our side removed it.
fn classify_conflict(output: &[u8]) -> ConflictKind {
    let mut lines = output.lines().filter(|line| !line.is_empty());
    let Some(first) = lines.next() else {
        return ConflictKind::DeletedByUs;
    };
    if lines.next().is_some() {
        return ConflictKind::DeletedByThem;
    }
    let status_len = first
        .splitn_str(2, b"\t")
        .next()
        .expect("splitn yields at least one piece")
        .fields()
        .last()
        .map_or(0, <[u8]>::len);
    if status_len == 2 {
        ConflictKind::BothModified
    } else {
        ConflictKind::DeletedByUs
    }
}
