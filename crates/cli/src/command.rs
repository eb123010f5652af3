//! Command trait for guanka CLI
//!
//! Commands that need a loaded configuration implement [`Command`]. They
//! receive a [`RuntimeContext`] holding the configuration, the work tree root
//! and the output settings.

use crate::common::RuntimeContext;
use crate::error::Result;

/// Trait for commands that operate on a configured repository
///
/// # Example
///
/// ```rust,ignore
/// use crate::command::Command;
/// use crate::common::RuntimeContext;
/// use crate::error::Result;
/// use clap::Args;
///
/// #[derive(Debug, Args)]
/// pub struct MyCommand {
///     #[arg(long)]
///     pub all_files: bool,
/// }
///
/// impl Command for MyCommand {
///     type Output = ();
///
///     fn execute(&self, context: &RuntimeContext) -> Result<()> {
///         println!("{} hooks", context.config.hook_count());
///         Ok(())
///     }
/// }
/// ```
pub trait Command {
    /// The type returned by this command
    type Output;

    /// Execute the command with the given runtime context
    ///
    /// # Errors
    ///
    /// Returns a `CommandError` if the command fails. Failing hooks are
    /// reported as [`CommandError::HooksFailed`](crate::error::CommandError::HooksFailed).
    fn execute(&self, context: &RuntimeContext) -> Result<Self::Output>;
}
