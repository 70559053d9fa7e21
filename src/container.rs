//! Run external tools in containers
//!
//! Commands are built as explicit argument vectors and never go through a shell.

/// Container runtime command lines
pub mod command;
/// Spawn a command and wait for it to exit
pub mod launch;
