// SPDX-License-Identifier: GPL-2.0-only

//! Execute status queries with the `git` executable.
//!
//! The reconciler only ever needs a handful of plumbing commands; this module
//! provides the seam for issuing them. [`GitRunner`] is the abstract runner
//! the reconciler is generic over, and [`GitContext`] is the production
//! implementation that spawns `git` processes.

mod command;
mod context;

use std::ffi::OsStr;

use anyhow::Result;

pub use self::context::GitContext;

/// Errors surfaced by the plumbing layer.
#[derive(thiserror::Error, Debug)]
pub enum GitError {
    #[error("could not execute `git`: {0}")]
    Exec(#[from] std::io::Error),

    #[error("`git {command}`: {stderr}")]
    Command { command: String, stderr: String },
}

/// A runner for `git` plumbing commands.
///
/// Every query goes through this trait so that tests can substitute canned
/// plumbing output for a live repository. A call fails both when the process
/// cannot be spawned and when it exits non-zero; callers decide per query
/// whether a failure is fatal to the cycle or tolerated.
pub trait GitRunner {
    /// Run `git` with the given arguments, returning its raw stdout bytes.
    fn run_git(&self, args: &[&OsStr]) -> Result<Vec<u8>>;
}
