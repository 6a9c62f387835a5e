//! Error types for repokit-git.

use thiserror::Error;

/// All errors that can arise from driving the external `git` binary.
#[derive(Debug, Error)]
pub enum GitError {
    /// The binary could not be spawned at all (missing from PATH, etc.).
    #[error("failed to run '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The command ran and exited non-zero; stderr is captured for reporting.
    #[error("`git {args}` failed{}: {stderr}", exit_suffix(.code))]
    Command {
        args: String,
        code: Option<i32>,
        stderr: String,
    },

    /// Output that should have parsed (a count, a timestamp) did not.
    #[error("could not parse {what} from git output '{output}'")]
    Parse {
        what: &'static str,
        output: String,
    },
}

fn exit_suffix(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!(" (exit {code})"),
        None => String::new(),
    }
}
