// SPDX-License-Identifier: GPL-2.0-only

//! Extension traits for running `git` via [`std::process::Command`].

use std::process::{Command, Output, Stdio};

use anyhow::Result;
use bstr::ByteSlice;

use super::GitError;

pub(super) trait PlumbingCommand {
    /// Run the command, wait for completion, and collect its output streams.
    ///
    /// Stdout and stderr are piped and stdin is null.
    fn output_git(&mut self) -> Result<Output>;
}

impl PlumbingCommand for Command {
    fn output_git(&mut self) -> Result<Output> {
        self.stdin(Stdio::null())
            .output()
            .map_err(|source| GitError::from(source).into())
    }
}

pub(super) trait PlumbingOutput {
    /// Ensure the command was successful, returning its output unchanged.
    fn require_success(self, command: &str) -> Result<Output>;
}

impl PlumbingOutput for Output {
    fn require_success(self, command: &str) -> Result<Output> {
        if self.status.success() {
            Ok(self)
        } else {
            Err(command_error(command, &self.stderr))
        }
    }
}

pub(super) fn command_error(command: &str, stderr: &[u8]) -> anyhow::Error {
    GitError::Command {
        command: command.to_string(),
        stderr: stderr.to_str_lossy().trim_end().to_string(),
    }
    .into()
}
