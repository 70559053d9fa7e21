use std::io;
use std::path::PathBuf;

use jsonschema::JSONSchema;
use log::{info, warn};
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use crate::request::input::TaskInput;

#[derive(Debug, Error)]
pub enum MessageError {
    #[error("can't read task message at {path}: {source}")]
    Read { path: PathBuf, source: io::Error },
    #[error("task message is not valid JSON: {0}")]
    JSONDecode(#[source] serde_json::Error),
    #[error("task message fails validation: {}", .0.join("; "))]
    JSONValidation(Vec<String>),
    #[error("can't deserialise task message: {0}")]
    Deserialisation(#[source] serde_json::Error),
}

/// The serialised mapping passed as the only positional argument
#[derive(Debug, Deserialize)]
pub struct TaskMessage {
    pub input: TaskInput,
}

pub struct Message<'a> {
    pub content: String,
    pub compiled_schema: &'a JSONSchema,
}

impl Message<'_> {
    pub fn read(&self) -> Result<TaskMessage, MessageError> {
        let json: Value = self.parse_untyped_json()?;

        match self.validate(&json) {
            Ok(_) => {
                info!("Task message is valid");
                self.parse_json(json)
            }
            Err(err) => {
                warn!("Task message fails validation");
                Err(err)
            }
        }
    }

    fn validate(&self, json: &Value) -> Result<(), MessageError> {
        info!("Validating task message against JSON schema");
        self.compiled_schema.validate(json).map_err(|errors| {
            MessageError::JSONValidation(errors.map(|err| err.to_string()).collect())
        })
    }

    fn parse_json(&self, value: Value) -> Result<TaskMessage, MessageError> {
        serde_json::from_value::<TaskMessage>(value).map_err(MessageError::Deserialisation)
    }

    fn parse_untyped_json(&self) -> Result<Value, MessageError> {
        serde_json::from_str::<Value>(&self.content).map_err(MessageError::JSONDecode)
    }
}
