//! Manifest types: what a server and its tools look like in the registry.
//!
//! These are plain data. Handlers produce them, the generator serializes
//! them, and the registry cache hands them back to readers untouched.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// How a tool reaches its external system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionType {
    /// Shells out to a command-line program.
    Cli,
    /// Calls an HTTP API.
    Api,
}

impl ExecutionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cli => "cli",
            Self::Api => "api",
        }
    }
}

impl std::fmt::Display for ExecutionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One example invocation of a tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolExample {
    pub input: Value,
    pub output: Value,
}

/// One field of a simplified input contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputField {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Human-readable summary of what a tool accepts.
///
/// Full validation stays with the handler; this is only what survives
/// serialization.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputContract {
    pub fields: Vec<InputField>,
}

impl InputContract {
    /// Summarise a JSON Schema object (as produced by schemars).
    pub fn from_schema(schema: &Map<String, Value>) -> Self {
        let required: Vec<&str> = schema
            .get("required")
            .and_then(Value::as_array)
            .map(|names| names.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default();

        let fields = schema
            .get("properties")
            .and_then(Value::as_object)
            .map(|props| {
                props
                    .iter()
                    .map(|(name, prop)| InputField {
                        name: name.clone(),
                        kind: describe_type(prop),
                        required: required.contains(&name.as_str()),
                        description: prop
                            .get("description")
                            .and_then(Value::as_str)
                            .map(str::to_string),
                    })
                    .collect()
            })
            .unwrap_or_default();

        Self { fields }
    }

    pub fn field(&self, name: &str) -> Option<&InputField> {
        self.fields.iter().find(|f| f.name == name)
    }
}

/// Collapse a property schema to a short type label such as `string`,
/// `integer|null` or `array<string>`.
fn describe_type(prop: &Value) -> String {
    if let Some(values) = prop.get("enum").and_then(Value::as_array) {
        let options: Vec<String> = values
            .iter()
            .map(|v| v.as_str().map(str::to_string).unwrap_or_else(|| v.to_string()))
            .collect();
        return format!("enum({})", options.join("|"));
    }

    let base = match prop.get("type") {
        Some(Value::String(t)) => t.clone(),
        Some(Value::Array(types)) => types
            .iter()
            .filter_map(Value::as_str)
            .collect::<Vec<_>>()
            .join("|"),
        _ => "object".to_string(),
    };

    if base.starts_with("array") {
        if let Some(items) = prop.get("items") {
            return base.replacen("array", &format!("array<{}>", describe_type(items)), 1);
        }
    }

    base
}

/// Metadata for one callable capability.
///
/// Identity is `(server, name)`; the descriptor itself does not know its
/// server, the enclosing [`ServerManifest`] does.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolDescriptor {
    pub name: String,
    pub alias: String,
    pub execution_type: ExecutionType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    pub description: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub examples: Vec<ToolExample>,
    #[serde(default)]
    pub input_contract: InputContract,
}

impl ToolDescriptor {
    /// Start a descriptor; the alias defaults to the name.
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        execution_type: ExecutionType,
    ) -> Self {
        let name = name.into();
        Self {
            alias: name.clone(),
            name,
            execution_type,
            command: None,
            endpoint: None,
            description: description.into(),
            tags: Vec::new(),
            examples: Vec::new(),
            input_contract: InputContract::default(),
        }
    }

    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = alias.into();
        self
    }

    pub fn command(mut self, template: impl Into<String>) -> Self {
        self.command = Some(template.into());
        self
    }

    pub fn endpoint(mut self, template: impl Into<String>) -> Self {
        self.endpoint = Some(template.into());
        self
    }

    pub fn tags(mut self, tags: &[&str]) -> Self {
        self.tags = tags.iter().map(|t| t.to_string()).collect();
        self
    }

    pub fn example(mut self, input: Value, output: Value) -> Self {
        self.examples.push(ToolExample { input, output });
        self
    }

    pub fn input_contract(mut self, contract: InputContract) -> Self {
        self.input_contract = contract;
        self
    }

    /// Case-insensitive match over name, alias, description and tags.
    /// `needle` must already be lowercase.
    pub fn matches(&self, needle: &str) -> bool {
        self.name.to_lowercase().contains(needle)
            || self.alias.to_lowercase().contains(needle)
            || self.description.to_lowercase().contains(needle)
            || self.tags.iter().any(|t| t.to_lowercase().contains(needle))
    }
}

/// Tools grouped under one external system.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerManifest {
    pub name: String,
    pub description: String,
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cli_prefix: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_base_url: Option<String>,
    pub tools: Vec<ToolDescriptor>,
    pub documentation: String,
}

impl ServerManifest {
    pub fn tool(&self, name: &str) -> Option<&ToolDescriptor> {
        self.tools.iter().find(|t| t.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_contract_from_schema() {
        let schema = json!({
            "type": "object",
            "properties": {
                "status": { "type": "string", "description": "Envelope status" },
                "count": { "type": ["integer", "null"] },
                "names": { "type": "array", "items": { "type": "string" } },
                "mode": { "enum": ["fast", "safe"] }
            },
            "required": ["status"]
        });
        let contract = InputContract::from_schema(schema.as_object().unwrap());

        let status = contract.field("status").unwrap();
        assert_eq!(status.kind, "string");
        assert!(status.required);
        assert_eq!(status.description.as_deref(), Some("Envelope status"));

        assert_eq!(contract.field("count").unwrap().kind, "integer|null");
        assert!(!contract.field("count").unwrap().required);
        assert_eq!(contract.field("names").unwrap().kind, "array<string>");
        assert_eq!(contract.field("mode").unwrap().kind, "enum(fast|safe)");
    }

    #[test]
    fn test_contract_from_empty_schema() {
        let schema = json!({ "type": "object" });
        let contract = InputContract::from_schema(schema.as_object().unwrap());
        assert!(contract.fields.is_empty());
    }

    #[test]
    fn test_descriptor_matches_tags_case_insensitively() {
        let tool = ToolDescriptor::new("list_envelopes", "List envelopes", ExecutionType::Api)
            .tags(&["Signing", "documents"]);
        assert!(tool.matches("signing"));
        assert!(tool.matches("envelope"));
        assert!(!tool.matches("migration"));
    }

    #[test]
    fn test_descriptor_serializes_camel_case() {
        let tool = ToolDescriptor::new("add_component", "Add a component", ExecutionType::Cli)
            .command("npx shadcn@latest add {components}");
        let value = serde_json::to_value(&tool).unwrap();
        assert_eq!(value["executionType"], "cli");
        assert_eq!(value["alias"], "add_component");
        assert!(value.get("endpoint").is_none());
        assert!(value.get("inputContract").is_some());
    }
}
