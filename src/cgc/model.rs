use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;

/// A file stored in a platform project
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PlatformFile {
    pub id: String,
    pub name: String,
}

/// One page of a collection query
#[derive(Debug, Deserialize)]
pub struct Page<T> {
    #[serde(default = "Vec::new")]
    pub items: Vec<T>,
    #[serde(default)]
    pub links: Vec<Link>,
}

#[derive(Debug, Deserialize)]
pub struct Link {
    pub href: String,
    pub rel: String,
}

impl<T> Page<T> {
    pub fn next_href(&self) -> Option<&str> {
        self.links.iter().find(|link| link.rel == "next").map(|link| link.href.as_str())
    }
}

/// A task as returned by `GET /tasks/{id}`
///
/// Outputs stay untyped: applications return files, lists of files, or plain values, and only
/// files are collected.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PlatformTask {
    pub id: String,
    #[serde(default)]
    pub outputs: BTreeMap<String, Value>,
    pub start_time: Option<DateTime<Utc>>,
    pub executed_by: Option<String>,
    pub execution_settings: Option<ExecutionSettings>,
    pub execution_status: Option<ExecutionStatus>,
    pub price: Option<Price>,
    pub use_interruptible_instances: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExecutionSettings {
    pub instance_type: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExecutionStatus {
    /// milliseconds
    pub execution_duration: Option<u64>,
}

/// The platform reports amounts as decimal strings, kept as-is
#[derive(Debug, Clone, Deserialize)]
pub struct Price {
    pub amount: Value,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn follows_next_link() {
        let page: Page<PlatformFile> = serde_json::from_value(json!({
            "items": [{ "id": "f1", "name": "a.bam", "project": "p" }],
            "links": [
                { "href": "https://api/files?offset=0", "rel": "prev", "method": "GET" },
                { "href": "https://api/files?offset=100", "rel": "next", "method": "GET" }
            ]
        }))
        .unwrap();
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.next_href(), Some("https://api/files?offset=100"));
    }

    #[test]
    fn task_tolerates_sparse_details() {
        let task: PlatformTask = serde_json::from_value(json!({
            "id": "task-1",
            "start_time": "2017-02-08T15:46:18Z",
            "execution_settings": null
        }))
        .unwrap();
        assert_eq!(task.id, "task-1");
        assert!(task.start_time.is_some());
        assert!(task.outputs.is_empty());
        assert!(task.execution_settings.is_none());
    }
}
