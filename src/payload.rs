//! Build the application-specific parameter set from a task input
//!
//! Every supported application is a row in a single table (see [`app::APPS`]); one generic
//! builder turns a task input into the parameters that application declares.

/// Parameter tables for the supported applications
pub mod app;
/// Resolve a task input against an application table
pub mod build;
/// Content hash over the file-valued parameters
pub mod fingerprint;
