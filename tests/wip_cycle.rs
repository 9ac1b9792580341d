// SPDX-License-Identifier: GPL-2.0-only

//! End-to-end reconciliation cycles against a real scratch repository.

use std::{path::Path, process::Command};

use git_wip::{
    GitContext, StatusFlags, WipCache, WipReconciler, EMPTY_TREE_SHA, UNTRACKED_PARENT,
};

fn git(dir: &Path, args: &[&str]) {
    let status = Command::new("git")
        .current_dir(dir)
        .env("GIT_AUTHOR_NAME", "test")
        .env("GIT_AUTHOR_EMAIL", "test@example.com")
        .env("GIT_COMMITTER_NAME", "test")
        .env("GIT_COMMITTER_EMAIL", "test@example.com")
        .args(args)
        .status()
        .expect("git must be runnable");
    assert!(status.success(), "git {args:?} failed");
}

fn git_available() -> bool {
    Command::new("git").arg("--version").output().is_ok()
}

#[test]
fn reconcile_scratch_repository() {
    if !git_available() {
        eprintln!("skipping: no git executable found");
        return;
    }

    let temp = tempfile::tempdir().expect("create scratch directory");
    let dir = temp.path();
    git(dir, &["init", "-q", "."]);
    std::fs::write(dir.join("tracked.txt"), "one\n").unwrap();
    std::fs::write(dir.join("loose.txt"), "hi\n").unwrap();

    let runner = GitContext::with_work_dir(dir);
    let cache = WipCache::new();
    let reconciler = WipReconciler::new(&runner, &cache);

    // Unborn repository: the parent falls back to the empty tree and both
    // files are reported as untracked.
    assert!(reconciler.update().unwrap());
    let snapshot = cache.wip_snapshot().unwrap();
    assert_eq!(snapshot.parent_sha, EMPTY_TREE_SHA);
    let untracked = cache.untracked_files();
    assert!(untracked.iter().any(|path| path == "loose.txt"));
    assert!(untracked.iter().any(|path| path == "tracked.txt"));
    assert!(snapshot
        .files
        .iter()
        .all(|(_, status, parent)| parent == UNTRACKED_PARENT
            && status == StatusFlags::UNKNOWN));

    // Staging a file moves it out of the untracked listing and into the
    // merged set with an index overlay.
    git(dir, &["add", "tracked.txt"]);
    assert!(reconciler.update().unwrap());
    let snapshot = cache.wip_snapshot().unwrap();
    assert_eq!(snapshot.parent_sha, EMPTY_TREE_SHA);
    let (path, status, parent) = snapshot
        .files
        .iter()
        .find(|(path, _, _)| *path == "tracked.txt")
        .expect("staged file is in the merged set");
    assert_eq!(path, "tracked.txt");
    assert_eq!(parent, 0);
    assert!(status.contains(StatusFlags::ADDED | StatusFlags::IN_INDEX));

    // After the first commit the parent is a real commit id and a worktree
    // edit shows up as a plain modification.
    git(dir, &["commit", "-qm", "base"]);
    std::fs::write(dir.join("tracked.txt"), "one\ntwo\n").unwrap();
    assert!(reconciler.update().unwrap());
    let snapshot = cache.wip_snapshot().unwrap();
    assert_ne!(snapshot.parent_sha, EMPTY_TREE_SHA);
    assert_eq!(snapshot.parent_sha.len(), 40);
    let (_, status, _) = snapshot
        .files
        .iter()
        .find(|(path, _, _)| *path == "tracked.txt")
        .expect("modified file is in the merged set");
    assert_eq!(status, StatusFlags::MODIFIED);

    // A clean second cycle publishes an unchanged snapshot.
    assert!(!reconciler.update().unwrap());
}
