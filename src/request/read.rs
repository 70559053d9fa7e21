use std::fs;
use std::path::Path;

use log::info;

use crate::request::message::MessageError;

/// Resolve the positional argument into the task message text
///
/// The argument is normally the serialised mapping itself. `@path` reads it from a file instead.
pub fn read_task_argument(argument: &str) -> Result<String, MessageError> {
    match argument.strip_prefix('@') {
        Some(path) => {
            let path = Path::new(path);
            info!("Reading task message from {}", path.display());
            fs::read_to_string(path).map_err(|source| MessageError::Read {
                path: path.to_path_buf(),
                source,
            })
        }
        None => Ok(argument.to_string()),
    }
}
