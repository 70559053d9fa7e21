use anyhow::{anyhow, Context};
use jsonschema::JSONSchema;
use serde_json::Value;

/// included task message schema
static TASK_SCHEMA: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/data/schema/task.json"));

pub fn load_schema() -> anyhow::Result<JSONSchema> {
    let schema: Value = serde_json::from_str(TASK_SCHEMA).context("Task schema is not valid JSON")?;
    let compiled = JSONSchema::compile(&schema).map_err(|err| anyhow!("Invalid task schema: {err}"))?;
    Ok(compiled)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn embedded_schema_compiles() {
        let schema = load_schema().unwrap();
        assert!(schema.is_valid(&json!({ "input": { "app": "pcawg-dkfz-caller/2" } })));
    }

    #[test]
    fn rejects_malformed_app() {
        let schema = load_schema().unwrap();
        assert!(!schema.is_valid(&json!({ "input": { "app": "pcawg-dkfz-caller" } })));
    }
}
