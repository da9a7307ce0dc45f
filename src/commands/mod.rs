//! Command implementations for keju.
//!
//! This module provides the dispatcher that routes CLI commands to their
//! implementations.

mod compare;
mod validate;

use crate::cli::Command;
use crate::error::Result;

/// Dispatch a command to its implementation.
pub fn dispatch(command: Command) -> Result<()> {
    match command {
        Command::Validate(args) => validate::cmd_validate(args),
        Command::Compare(args) => compare::cmd_compare(args),
    }
}
