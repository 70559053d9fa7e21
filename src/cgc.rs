//! Cancer Genomics Cloud REST API
//!
//! Only the two queries this tool needs: files produced by a task, and a task's details.

/// Response types deserialised from the platform API
pub mod model;
/// Authenticated HTTP client
pub mod client;
