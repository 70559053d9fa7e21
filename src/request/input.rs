use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::request::file_ref::FileRef;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum InputError {
    #[error("missing required input field '{0}'")]
    MissingField(String),
    #[error("invalid input field '{field}': {reason}")]
    InvalidField { field: String, reason: String },
}

/// The `input` mapping of a task message
///
/// Kept untyped because every application reads a different set of fields. Fields no
/// application asks for are carried along and ignored.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(transparent)]
pub struct TaskInput {
    fields: Map<String, Value>,
}

impl TaskInput {
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    pub fn require_str(&self, field: &str) -> Result<&str, InputError> {
        match self.fields.get(field) {
            Some(Value::String(value)) => Ok(value),
            Some(_) => Err(invalid(field, "expected a string")),
            None => Err(InputError::MissingField(field.to_string())),
        }
    }

    pub fn require_bool(&self, field: &str) -> Result<bool, InputError> {
        match self.fields.get(field) {
            Some(Value::Bool(value)) => Ok(*value),
            Some(_) => Err(invalid(field, "expected a boolean")),
            None => Err(InputError::MissingField(field.to_string())),
        }
    }

    /// Read a file reference field, falling back to an empty reference when it is absent
    pub fn file_ref(&self, field: &str) -> Result<FileRef, InputError> {
        match self.fields.get(field) {
            Some(Value::String(raw)) => Ok(FileRef::parse(raw)),
            Some(Value::Null) | None => Ok(FileRef::default()),
            Some(_) => Err(invalid(field, "expected a '<id>|<name>' string")),
        }
    }

    /// Extract the fields every submission needs, whatever the application
    pub fn submission_fields(&self) -> Result<SubmissionFields, InputError> {
        Ok(SubmissionFields {
            project: self.require_str("cgc_project")?.to_string(),
            study: self.require_str("study")?.to_string(),
            donor_id: self.require_str("donor_id")?.to_string(),
            app: self.require_str("app")?.parse()?,
            instance_type: self.require_str("instance_type")?.to_string(),
            use_spot: self.require_bool("use_spot")?,
        })
    }
}

fn invalid(field: &str, reason: &str) -> InputError {
    InputError::InvalidField { field: field.to_string(), reason: reason.to_string() }
}

/// Common submission parameters shared by all PCAWG caller applications
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionFields {
    pub project: String,
    pub study: String,
    pub donor_id: String,
    pub app: AppId,
    pub instance_type: String,
    pub use_spot: bool,
}

/// A platform application identifier in `name/revision` form
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppId {
    pub name: String,
    pub revision: String,
}

impl FromStr for AppId {
    type Err = InputError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split('/').collect::<Vec<&str>>()[..] {
            [name, revision] if !name.is_empty() && !revision.is_empty() => Ok(AppId {
                name: name.to_string(),
                revision: revision.to_string(),
            }),
            _ => Err(invalid("app", "expected '<name>/<revision>'")),
        }
    }
}

impl fmt::Display for AppId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}/{}", self.name, self.revision)
    }
}
