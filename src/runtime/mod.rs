//! Child process execution.
//!
//! `resolver` turns a logical tool into a concrete program path and argument
//! list; `process` launches it, streams its merged output into the console
//! and reports completion.

mod process;
mod resolver;

use std::fmt;
use std::path::PathBuf;

pub use process::{ManagedProcess, ProcessEvent, ProcessId, ProcessManager, ProcessState};
pub use resolver::{CommandResolver, Tool};

/// A fully resolved command line, ready to spawn.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Invocation {
    pub program: PathBuf,
    pub args: Vec<String>,
}

impl Invocation {
    pub fn new<I, S>(program: impl Into<PathBuf>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program.display())?;
        for arg in &self.args {
            if arg.is_empty() || arg.contains(char::is_whitespace) {
                write!(f, " {arg:?}")?;
            } else {
                write!(f, " {arg}")?;
            }
        }
        Ok(())
    }
}
