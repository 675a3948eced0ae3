//! Tool schemas: ordered, typed, named parameters and a declared return type.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// JSON value types a tool parameter or return value may take.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ValueType {
    String,
    Integer,
    Number,
    Boolean,
    Object,
    Array,
}

impl ValueType {
    /// Whether `value` is an instance of this type.
    pub fn matches(&self, value: &serde_json::Value) -> bool {
        match self {
            Self::String => value.is_string(),
            Self::Integer => value.is_i64() || value.is_u64(),
            Self::Number => value.is_number(),
            Self::Boolean => value.is_boolean(),
            Self::Object => value.is_object(),
            Self::Array => value.is_array(),
        }
    }
}

/// One declared parameter of a tool.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ParamSpec {
    pub name: String,
    pub value_type: ValueType,
    pub description: String,
    pub required: bool,
}

/// Input schema (ordered parameters) and return type of a tool.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolSchema {
    pub params: Vec<ParamSpec>,
    pub returns: ValueType,
}

impl ToolSchema {
    /// Builder: start an empty schema returning a string.
    pub fn builder() -> SchemaBuilder {
        SchemaBuilder {
            params: Vec::new(),
            returns: ValueType::String,
        }
    }

    pub fn param(&self, name: &str) -> Option<&ParamSpec> {
        self.params.iter().find(|p| p.name == name)
    }

    /// Render as a JSON Schema object for provider tool definitions.
    pub fn to_json_schema(&self) -> serde_json::Value {
        let mut properties = serde_json::Map::new();
        for param in &self.params {
            properties.insert(
                param.name.clone(),
                serde_json::json!({
                    "type": param.value_type.to_string(),
                    "description": param.description,
                }),
            );
        }
        let required: Vec<&str> = self
            .params
            .iter()
            .filter(|p| p.required)
            .map(|p| p.name.as_str())
            .collect();
        serde_json::json!({
            "type": "object",
            "properties": properties,
            "required": required,
        })
    }
}

/// Builder for constructing tool schemas.
pub struct SchemaBuilder {
    params: Vec<ParamSpec>,
    returns: ValueType,
}

impl SchemaBuilder {
    fn push(
        mut self,
        name: impl Into<String>,
        value_type: ValueType,
        description: impl Into<String>,
        required: bool,
    ) -> Self {
        self.params.push(ParamSpec {
            name: name.into(),
            value_type,
            description: description.into(),
            required,
        });
        self
    }

    /// Add a required string parameter.
    pub fn string(self, name: impl Into<String>, description: impl Into<String>) -> Self {
        self.push(name, ValueType::String, description, true)
    }

    /// Add a required integer parameter.
    pub fn integer(self, name: impl Into<String>, description: impl Into<String>) -> Self {
        self.push(name, ValueType::Integer, description, true)
    }

    /// Add a required number parameter.
    pub fn number(self, name: impl Into<String>, description: impl Into<String>) -> Self {
        self.push(name, ValueType::Number, description, true)
    }

    /// Add a parameter the caller may omit.
    pub fn optional(
        self,
        name: impl Into<String>,
        value_type: ValueType,
        description: impl Into<String>,
    ) -> Self {
        self.push(name, value_type, description, false)
    }

    pub fn returns(mut self, returns: ValueType) -> Self {
        self.returns = returns;
        self
    }

    pub fn build(self) -> ToolSchema {
        ToolSchema {
            params: self.params,
            returns: self.returns,
        }
    }
}
