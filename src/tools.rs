//! Function declaration helpers.
//!
//! The endpoint expects each function's parameters as a JSON Schema object. Writing those by
//! hand is noisy for the common case of a few required scalar arguments, so
//! [`FunctionBuilder`] accepts simple type names and normalizes them:
//!
//! ```rust
//! use glm_chat::{ChatOption, function};
//!
//! let weather = function("get_weather", "Get current weather for a location")
//!     .param("location", "string")
//!     .param("days", "int")
//!     .build();
//!
//! let params = weather.parameters.as_ref().unwrap();
//! assert_eq!(params["properties"]["days"]["type"], "integer");
//! assert_eq!(params["required"].as_array().unwrap().len(), 2);
//!
//! let option = ChatOption::from(weather);
//! # let _ = option;
//! ```
//!
//! Schemas that already have `type` and `properties` pass through unchanged, and so does
//! anything given to [`crate::ChatOption::function`] directly.

use crate::types::FunctionDeclaration;
use serde_json::{Map, Value, json};

/// Builder for a [`FunctionDeclaration`].
#[derive(Debug, Clone)]
pub struct FunctionBuilder {
    name: String,
    description: String,
    schema: Value,
}

impl FunctionBuilder {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            schema: json!({}),
        }
    }

    /// Replaces the parameter schema. Full JSON Schemas are kept as-is; objects mapping
    /// parameter names to types or property schemas are normalized on [`build`](Self::build).
    pub fn schema(mut self, schema: Value) -> Self {
        self.schema = schema;
        self
    }

    /// Adds a required parameter using a simple type name (`string`, `int`, `bool`, ...).
    pub fn param(mut self, name: &str, type_str: &str) -> Self {
        if !self.schema.is_object() {
            self.schema = json!({});
        }
        if let Some(obj) = self.schema.as_object_mut() {
            obj.insert(name.to_string(), Value::String(type_str.to_string()));
        }
        self
    }

    pub fn build(self) -> FunctionDeclaration {
        FunctionDeclaration {
            name: self.name,
            description: self.description,
            parameters: Some(normalize_schema(self.schema)),
        }
    }
}

/// Starts a [`FunctionBuilder`].
pub fn function(name: impl Into<String>, description: impl Into<String>) -> FunctionBuilder {
    FunctionBuilder::new(name, description)
}

fn normalize_schema(schema: Value) -> Value {
    let Value::Object(obj) = schema else {
        return json!({
            "type": "object",
            "properties": {},
            "required": []
        });
    };

    if obj.contains_key("type") && obj.contains_key("properties") {
        return Value::Object(obj);
    }

    let mut properties = Map::new();
    let mut required = Vec::new();

    for (param_name, param_type) in obj {
        match param_type {
            Value::String(type_str) => {
                properties.insert(param_name.clone(), type_to_json_schema(&type_str));
                required.push(param_name);
            }
            Value::Object(mut prop) => {
                // "optional"/"required" flags are not JSON Schema; fold them into the array.
                let is_optional = prop
                    .remove("optional")
                    .and_then(|v| v.as_bool())
                    .unwrap_or(false);
                let is_required = prop.remove("required").and_then(|v| v.as_bool());
                let has_default = prop.contains_key("default");

                properties.insert(param_name.clone(), Value::Object(prop));

                match is_required {
                    Some(true) => required.push(param_name),
                    Some(false) => {}
                    None if !is_optional && !has_default => required.push(param_name),
                    None => {}
                }
            }
            _ => {}
        }
    }

    json!({
        "type": "object",
        "properties": properties,
        "required": required
    })
}

fn type_to_json_schema(type_str: &str) -> Value {
    let json_type = match type_str {
        "string" | "str" => "string",
        "integer" | "int" | "i32" | "i64" | "u32" | "u64" => "integer",
        "number" | "float" | "f32" | "f64" => "number",
        "boolean" | "bool" => "boolean",
        "array" | "list" | "vec" => "array",
        "object" | "dict" | "map" => "object",
        // unknown names fall back to string
        _ => "string",
    };

    json!({ "type": json_type })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_to_json_schema() {
        assert_eq!(type_to_json_schema("string"), json!({"type": "string"}));
        assert_eq!(type_to_json_schema("i64"), json!({"type": "integer"}));
        assert_eq!(type_to_json_schema("f32"), json!({"type": "number"}));
        assert_eq!(type_to_json_schema("bool"), json!({"type": "boolean"}));
        assert_eq!(type_to_json_schema("vec"), json!({"type": "array"}));
        assert_eq!(type_to_json_schema("whatever"), json!({"type": "string"}));
    }

    #[test]
    fn test_builder_simple_params() {
        let decl = function("get_weather", "Get weather")
            .param("location", "string")
            .param("units", "string")
            .build();

        assert_eq!(decl.name, "get_weather");
        assert_eq!(decl.description, "Get weather");
        let params = decl.parameters.unwrap();
        assert_eq!(params["type"], "object");
        assert_eq!(params["properties"]["location"]["type"], "string");
        assert_eq!(params["required"], json!(["location", "units"]));
    }

    #[test]
    fn test_full_schema_passes_through() {
        let schema = json!({
            "type": "object",
            "properties": {"location": {"type": "string", "description": "City name"}},
            "required": ["location"]
        });
        let decl = function("get_weather", "Get weather")
            .schema(schema.clone())
            .build();
        assert_eq!(decl.parameters, Some(schema));
    }

    #[test]
    fn test_extended_property_flags() {
        let decl = function("search", "Search the web")
            .schema(json!({
                "query": {"type": "string"},
                "limit": {"type": "integer", "optional": true},
                "lang": {"type": "string", "default": "en"},
                "safe": {"type": "boolean", "default": true, "required": true}
            }))
            .build();

        let params = decl.parameters.unwrap();
        let required = params["required"].as_array().unwrap();
        assert!(required.contains(&json!("query")));
        assert!(required.contains(&json!("safe")));
        assert!(!required.contains(&json!("limit")));
        assert!(!required.contains(&json!("lang")));
        assert!(params["properties"]["limit"].get("optional").is_none());
        assert!(params["properties"]["safe"].get("required").is_none());
    }

    #[test]
    fn test_non_object_schema_becomes_empty_object() {
        let decl = function("noop", "").schema(json!("nope")).build();
        assert_eq!(
            decl.parameters,
            Some(json!({"type": "object", "properties": {}, "required": []}))
        );
    }
}
