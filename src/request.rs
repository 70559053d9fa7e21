//! Read the task message passed on the command line and validate it

/// Resolve the positional argument into message text
pub mod read;
/// Compile the embedded JSON schema for task messages
pub mod schema;
/// Validate and deserialise the task message
pub mod message;
/// Typed access to the caller-supplied task input
pub mod input;
/// `<opaque-id>|<display-name>` file references
pub mod file_ref;
