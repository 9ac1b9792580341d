// SPDX-License-Identifier: GPL-2.0-only

//! Context for executing plumbing queries via the `git` executable.
//!
//! It is assumed/required that `git` is in `PATH`.

use std::{
    ffi::OsStr,
    path::{Path, PathBuf},
    process::Command,
};

use anyhow::Result;
use tracing::debug;

use super::{
    command::{PlumbingCommand, PlumbingOutput},
    GitRunner,
};

/// Runs `git` against a particular repository.
///
/// With neither directory set, git discovers the repository from the process
/// working directory as usual.
#[derive(Clone, Debug, Default)]
pub struct GitContext {
    git_dir: Option<PathBuf>,
    work_dir: Option<PathBuf>,
}

impl GitContext {
    pub fn new() -> GitContext {
        GitContext::default()
    }

    /// Run `git` from `work_dir`, discovering the repository there.
    pub fn with_work_dir(work_dir: impl AsRef<Path>) -> GitContext {
        GitContext {
            git_dir: None,
            work_dir: Some(work_dir.as_ref().to_path_buf()),
        }
    }

    /// Run `git` with an explicit `GIT_DIR`, working from `work_dir`.
    pub fn with_dirs(git_dir: impl AsRef<Path>, work_dir: impl AsRef<Path>) -> GitContext {
        GitContext {
            git_dir: Some(git_dir.as_ref().to_path_buf()),
            work_dir: Some(work_dir.as_ref().to_path_buf()),
        }
    }

    fn git(&self) -> Command {
        let mut command = Command::new("git");
        if let Some(git_dir) = &self.git_dir {
            command.env("GIT_DIR", git_dir);
        }
        if let Some(work_dir) = &self.work_dir {
            command.current_dir(work_dir);
        }
        command
    }
}

impl GitRunner for GitContext {
    fn run_git(&self, args: &[&OsStr]) -> Result<Vec<u8>> {
        let command_line = args
            .iter()
            .map(|arg| arg.to_string_lossy())
            .collect::<Vec<_>>()
            .join(" ");
        debug!(command = %command_line, "running git");
        let output = self
            .git()
            .args(args)
            .output_git()?
            .require_success(&command_line)?;
        Ok(output.stdout)
    }
}
