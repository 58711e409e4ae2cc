//! Remote command execution
//!
//! All cross-host queries and side effects (mount lookup, size query,
//! flag file create/remove, receiver cleanup, new-plot notification)
//! go through the [`RemoteExecutor`] trait. The production
//! implementation runs commands over SSH; tests substitute a scripted
//! executor.

mod ssh;

pub use ssh::SshExecutor;

use crate::error::Result;

/// Executes a command on the NAS and returns its captured stdout.
///
/// Calls are synchronous and blocking. A non-zero exit status surfaces
/// as [`PlotMoverError::RemoteCommandError`](crate::error::PlotMoverError)
/// carrying the captured output; the caller decides whether that is
/// fatal. The executor never mutates the lock flags on its own
/// authority.
pub trait RemoteExecutor {
    /// Run `command` on the remote host, returning its stdout.
    fn run(&self, command: &str) -> Result<String>;
}

#[cfg(test)]
pub(crate) mod testing {
    //! Scripted executor shared by unit tests across the crate.

    use super::RemoteExecutor;
    use crate::error::{PlotMoverError, Result};
    use std::cell::RefCell;

    /// Canned reply for a scripted command.
    #[derive(Debug, Clone)]
    pub enum Reply {
        Ok(String),
        Err(String),
    }

    /// Records every command it is asked to run and answers from a
    /// list of substring-matched rules, falling back to a default.
    pub struct ScriptedExecutor {
        rules: Vec<(String, Reply)>,
        fallback: Reply,
        commands: RefCell<Vec<String>>,
    }

    impl ScriptedExecutor {
        /// Executor that answers every command with empty output.
        pub fn ok() -> Self {
            Self {
                rules: Vec::new(),
                fallback: Reply::Ok(String::new()),
                commands: RefCell::new(Vec::new()),
            }
        }

        /// Executor that fails every command with `message`.
        pub fn failing(message: &str) -> Self {
            Self {
                rules: Vec::new(),
                fallback: Reply::Err(message.to_string()),
                commands: RefCell::new(Vec::new()),
            }
        }

        /// Add a rule: commands containing `needle` get `reply`.
        /// Rules are checked in insertion order.
        pub fn on(mut self, needle: &str, reply: Reply) -> Self {
            self.rules.push((needle.to_string(), reply));
            self
        }

        /// Every command run so far, in order.
        pub fn commands(&self) -> Vec<String> {
            self.commands.borrow().clone()
        }
    }

    impl RemoteExecutor for ScriptedExecutor {
        fn run(&self, command: &str) -> Result<String> {
            self.commands.borrow_mut().push(command.to_string());
            let reply = self
                .rules
                .iter()
                .find(|(needle, _)| command.contains(needle))
                .map(|(_, reply)| reply.clone())
                .unwrap_or_else(|| self.fallback.clone());
            match reply {
                Reply::Ok(output) => Ok(output),
                Reply::Err(message) => Err(PlotMoverError::remote(command, message)),
            }
        }
    }
}
