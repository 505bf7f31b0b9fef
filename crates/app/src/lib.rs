//! Taskdeck - command-line front end
//!
//! Wires the reqwest transport, the file credential store and the
//! authenticated client into the session and task services, and exposes
//! them as `taskdeck` subcommands.

pub mod cli;
pub mod context;
pub mod navigator;
pub mod render;

pub use cli::{Cli, Command, TaskCommand, execute, run};
pub use context::{AppError, Taskdeck};
pub use navigator::CliNavigator;
