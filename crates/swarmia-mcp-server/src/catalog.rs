//! Tool descriptors and the lookup table the dispatcher routes through.

use std::collections::HashMap;

use serde::Serialize;
use serde_json::{json, Map, Value};

use crate::error::ReportResult;
use crate::params::{Arguments, GroupBy, QueryParams, Timeframe, ToolParams, DEFAULT_TIMEZONE};

/// Tool definition for MCP
#[derive(Debug, Clone, Serialize)]
pub struct ToolDescriptor {
    pub name: String,
    pub description: String,
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
}

impl ToolDescriptor {
    /// Property names declared by the input schema.
    pub fn properties(&self) -> Vec<&str> {
        self.input_schema
            .get("properties")
            .and_then(Value::as_object)
            .map(|props| props.keys().map(String::as_str).collect())
            .unwrap_or_default()
    }

    /// Names listed under `required`.
    pub fn required(&self) -> Vec<&str> {
        self.input_schema
            .get("required")
            .and_then(Value::as_array)
            .map(|req| req.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default()
    }
}

/// Turns an argument bag into wire query parameters.
pub type Resolver = fn(&Arguments) -> ReportResult<QueryParams>;

fn resolve_with<P: ToolParams>(args: &Arguments) -> ReportResult<QueryParams> {
    Ok(P::resolve(args)?.to_query())
}

/// The HTTP side of a tool: which endpoint it hits and how arguments map.
#[derive(Clone, Copy)]
pub struct Endpoint {
    pub path: &'static str,
    /// Argument names the resolver reads.
    pub fields: &'static [&'static str],
    pub resolve: Resolver,
}

impl std::fmt::Debug for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Endpoint")
            .field("path", &self.path)
            .field("fields", &self.fields)
            .finish_non_exhaustive()
    }
}

impl Endpoint {
    pub fn new<P: ToolParams>(path: &'static str) -> Self {
        Self {
            path,
            fields: P::FIELDS,
            resolve: resolve_with::<P>,
        }
    }
}

/// A descriptor bound to its endpoint.
#[derive(Debug, Clone)]
pub struct ToolEntry {
    pub descriptor: ToolDescriptor,
    pub endpoint: Endpoint,
}

/// Immutable tool table, built once at startup.
#[derive(Debug, Clone)]
pub struct Catalog {
    entries: Vec<ToolEntry>,
    index: HashMap<String, usize>,
}

impl Catalog {
    /// Build the table. Later entries never shadow an earlier name.
    pub fn new(entries: Vec<ToolEntry>) -> Self {
        let mut index = HashMap::with_capacity(entries.len());
        for (i, entry) in entries.iter().enumerate() {
            if index.contains_key(&entry.descriptor.name) {
                log::warn!("Duplicate tool '{}' ignored", entry.descriptor.name);
                continue;
            }
            index.insert(entry.descriptor.name.clone(), i);
        }
        Self { entries, index }
    }

    /// Descriptors in registration order.
    pub fn list_tools(&self) -> Vec<&ToolDescriptor> {
        self.entries
            .iter()
            .enumerate()
            .filter(|(i, e)| self.index.get(&e.descriptor.name) == Some(i))
            .map(|(_, e)| &e.descriptor)
            .collect()
    }

    pub fn lookup(&self, name: &str) -> Option<&ToolEntry> {
        self.index.get(name).map(|&i| &self.entries[i])
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }
}

// ── Schema building blocks ────────────────────────────────────────

/// `{"type": "object", "properties": ..., "required": [...]}`
pub fn object_schema(properties: Vec<(&str, Value)>, required: &[&str]) -> Value {
    let properties: Map<String, Value> = properties
        .into_iter()
        .map(|(name, schema)| (name.to_string(), schema))
        .collect();
    let mut schema = json!({
        "type": "object",
        "properties": properties,
    });
    if !required.is_empty() {
        schema["required"] = json!(required);
    }
    schema
}

pub fn string_property(description: &str) -> Value {
    json!({
        "type": "string",
        "description": description
    })
}

pub fn integer_property(description: &str) -> Value {
    json!({
        "type": "integer",
        "description": description
    })
}

pub fn date_property(description: &str) -> Value {
    json!({
        "type": "string",
        "format": "date",
        "description": description
    })
}

pub fn timeframe_property() -> Value {
    let allowed: Vec<&str> = Timeframe::ALL.iter().map(|t| t.as_str()).collect();
    json!({
        "type": "string",
        "enum": allowed,
        "description": "Predefined timeframe for the data",
        "default": Timeframe::default().as_str()
    })
}

pub fn timezone_property() -> Value {
    json!({
        "type": "string",
        "description": "Timezone for data aggregation (e.g., America/New_York)",
        "default": DEFAULT_TIMEZONE
    })
}

pub fn group_by_property() -> Value {
    let allowed: Vec<&str> = GroupBy::ALL.iter().map(|g| g.as_str()).collect();
    json!({
        "type": "string",
        "enum": allowed,
        "description": "How FTE rows should be grouped",
        "default": GroupBy::default().as_str()
    })
}
