//! Tool schema input types, reproduced locally in the shape of the teacher's
//! `openai_protocol::common::{Tool, Function}` (that crate isn't vendored into this
//! one, so the fields this parser actually reads are redeclared here).

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Function {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// A JSON-Schema-shaped object; only `properties.<key>.type` is consulted by the
    /// XML coercion logic (§4.5).
    pub parameters: Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tool {
    #[serde(rename = "type", default = "default_tool_type")]
    pub tool_type: String,
    pub function: Function,
}

fn default_tool_type() -> String {
    "function".to_string()
}

impl Tool {
    /// The declared JSON type for a parameter, e.g. `"integer"`, if the schema names
    /// it under `parameters.properties.<key>.type`.
    pub fn param_type(&self, key: &str) -> Option<&str> {
        self.function
            .parameters
            .get("properties")?
            .get(key)?
            .get("type")?
            .as_str()
    }
}

#[cfg(test)]
pub fn test_tool(name: &str, properties: Value) -> Tool {
    Tool {
        tool_type: "function".to_string(),
        function: Function {
            name: name.to_string(),
            description: None,
            parameters: serde_json::json!({
                "type": "object",
                "properties": properties,
            }),
        },
    }
}
