//! JSON-schema shaped contract for canonical records.
//!
//! Only the keywords the record contract needs are understood: `type`,
//! `required`, `properties` and, per property, `type`, `pattern`, `enum` and
//! `minLength`. Unknown keywords are kept in the document but ignored.

use regex::Regex;
use serde_json::{json, Map, Value};
use std::fmt;

use crate::error::{LognormError, LognormResult};
use crate::parsers::json_parser::json_type_name;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JsonType {
    String,
    Integer,
    Number,
    Boolean,
    Object,
    Array,
    Null,
}

impl JsonType {
    fn from_name(name: &str) -> Option<Self> {
        match name {
            "string" => Some(JsonType::String),
            "integer" => Some(JsonType::Integer),
            "number" => Some(JsonType::Number),
            "boolean" => Some(JsonType::Boolean),
            "object" => Some(JsonType::Object),
            "array" => Some(JsonType::Array),
            "null" => Some(JsonType::Null),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            JsonType::String => "string",
            JsonType::Integer => "integer",
            JsonType::Number => "number",
            JsonType::Boolean => "boolean",
            JsonType::Object => "object",
            JsonType::Array => "array",
            JsonType::Null => "null",
        }
    }

    pub fn matches(&self, value: &Value) -> bool {
        match self {
            JsonType::String => value.is_string(),
            JsonType::Integer => value.is_i64() || value.is_u64(),
            JsonType::Number => value.is_number(),
            JsonType::Boolean => value.is_boolean(),
            JsonType::Object => value.is_object(),
            JsonType::Array => value.is_array(),
            JsonType::Null => value.is_null(),
        }
    }
}

/// One type name or a list of alternatives
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeSpec(Vec<JsonType>);

impl TypeSpec {
    fn parse(value: &Value, at: &str) -> LognormResult<Self> {
        let names: Vec<&Value> = match value {
            Value::Array(items) => items.iter().collect(),
            other => vec![other],
        };
        names
            .into_iter()
            .map(|name| {
                name.as_str()
                    .and_then(JsonType::from_name)
                    .ok_or_else(|| LognormError::Schema(format!("{at}: unknown type {name}")))
            })
            .collect::<LognormResult<Vec<_>>>()
            .map(TypeSpec)
    }

    pub fn matches(&self, value: &Value) -> bool {
        self.0.iter().any(|kind| kind.matches(value))
    }
}

impl fmt::Display for TypeSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.0.iter().map(JsonType::name).collect();
        f.write_str(&names.join(" or "))
    }
}

/// Constraints on one named property
#[derive(Debug, Clone, Default)]
pub struct PropertyRule {
    pub types: Option<TypeSpec>,
    pub pattern: Option<Regex>,
    pub allowed: Option<Vec<Value>>,
    pub min_length: Option<usize>,
}

impl PropertyRule {
    fn parse(name: &str, value: &Value) -> LognormResult<Self> {
        let at = format!("properties.{name}");
        let rule = value
            .as_object()
            .ok_or_else(|| LognormError::Schema(format!("{at} must be an object")))?;

        let mut parsed = PropertyRule::default();
        if let Some(types) = rule.get("type") {
            parsed.types = Some(TypeSpec::parse(types, &at)?);
        }
        if let Some(pattern) = rule.get("pattern") {
            let pattern = pattern
                .as_str()
                .ok_or_else(|| LognormError::Schema(format!("{at}.pattern must be a string")))?;
            let regex = Regex::new(pattern)
                .map_err(|err| LognormError::Schema(format!("{at}.pattern: {err}")))?;
            parsed.pattern = Some(regex);
        }
        if let Some(allowed) = rule.get("enum") {
            let allowed = allowed
                .as_array()
                .ok_or_else(|| LognormError::Schema(format!("{at}.enum must be an array")))?;
            parsed.allowed = Some(allowed.clone());
        }
        if let Some(min) = rule.get("minLength") {
            let min = min
                .as_u64()
                .ok_or_else(|| LognormError::Schema(format!("{at}.minLength must be a non-negative integer")))?;
            parsed.min_length = Some(min as usize);
        }
        Ok(parsed)
    }
}

/// A way a value fails the schema
#[derive(Debug, Clone, PartialEq)]
pub enum Violation {
    WrongRootType { expected: String, found: &'static str },
    MissingField(String),
    WrongType { field: String, expected: String, found: &'static str },
    PatternMismatch { field: String, pattern: String },
    NotAllowed { field: String, value: Value },
    TooShort { field: String, min: usize },
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Violation::WrongRootType { expected, found } => {
                write!(f, "expected {expected}, found {found}")
            }
            Violation::MissingField(field) => write!(f, "{field}"),
            Violation::WrongType { field, expected, found } => {
                write!(f, "{field} should be {expected}, found {found}")
            }
            Violation::PatternMismatch { field, pattern } => {
                write!(f, "{field} does not match {pattern}")
            }
            Violation::NotAllowed { field, value } => write!(f, "{field} = {value}"),
            Violation::TooShort { field, min } => {
                write!(f, "{field} shorter than {min} character(s)")
            }
        }
    }
}

/// Compiled schema plus the document it came from
#[derive(Debug, Clone)]
pub struct Schema {
    document: Map<String, Value>,
    root_type: Option<TypeSpec>,
    required: Vec<String>,
    properties: Vec<(String, PropertyRule)>,
}

impl Schema {
    /// The canonical record contract
    pub fn base_document() -> Map<String, Value> {
        let document = json!({
            "type": "object",
            "required": ["timestamp", "level", "event"],
            "properties": {
                "timestamp": {
                    "type": "string",
                    "pattern": r"^\d{4}-\d{2}-\d{2}T\d{2}:\d{2}:\d{2}"
                },
                "level": {
                    "type": "string",
                    "enum": ["DEBUG", "INFO", "WARNING", "ERROR", "CRITICAL"]
                },
                "event": {
                    "type": "string",
                    "minLength": 1
                }
            }
        });
        match document {
            Value::Object(map) => map,
            _ => Map::new(),
        }
    }

    pub fn base() -> Self {
        Self::from_document(Self::base_document()).expect("base schema is well-formed")
    }

    /// Base contract with `overlay` merged over its top-level keys
    pub fn with_overlay(overlay: Option<&Map<String, Value>>) -> LognormResult<Self> {
        let mut document = Self::base_document();
        if let Some(overlay) = overlay {
            for (key, value) in overlay {
                document.insert(key.clone(), value.clone());
            }
        }
        Self::from_document(document)
    }

    pub fn from_document(document: Map<String, Value>) -> LognormResult<Self> {
        let root_type = document
            .get("type")
            .map(|types| TypeSpec::parse(types, "type"))
            .transpose()?;

        let required = match document.get("required") {
            None => Vec::new(),
            Some(Value::Array(items)) => items
                .iter()
                .map(|item| {
                    item.as_str()
                        .map(str::to_string)
                        .ok_or_else(|| LognormError::Schema(format!("required: {item} is not a field name")))
                })
                .collect::<LognormResult<Vec<_>>>()?,
            Some(_) => return Err(LognormError::Schema("required must be an array".to_string())),
        };

        let properties = match document.get("properties") {
            None => Vec::new(),
            Some(Value::Object(props)) => props
                .iter()
                .map(|(name, rule)| PropertyRule::parse(name, rule).map(|rule| (name.clone(), rule)))
                .collect::<LognormResult<Vec<_>>>()?,
            Some(_) => return Err(LognormError::Schema("properties must be an object".to_string())),
        };

        Ok(Self {
            document,
            root_type,
            required,
            properties,
        })
    }

    pub fn document(&self) -> &Map<String, Value> {
        &self.document
    }

    pub fn required(&self) -> &[String] {
        &self.required
    }

    /// Every violation of `value`, in schema order
    pub fn check(&self, value: &Value) -> Vec<Violation> {
        if let Some(types) = &self.root_type {
            if !types.matches(value) {
                return vec![Violation::WrongRootType {
                    expected: types.to_string(),
                    found: json_type_name(value),
                }];
            }
        }
        let Some(object) = value.as_object() else {
            return Vec::new();
        };

        let mut violations: Vec<Violation> = self
            .required
            .iter()
            .filter(|field| !object.contains_key(field.as_str()))
            .map(|field| Violation::MissingField(field.clone()))
            .collect();

        for (field, rule) in &self.properties {
            if let Some(value) = object.get(field) {
                check_property(field, rule, value, &mut violations);
            }
        }
        violations
    }
}

fn check_property(field: &str, rule: &PropertyRule, value: &Value, out: &mut Vec<Violation>) {
    if let Some(types) = &rule.types {
        if !types.matches(value) {
            out.push(Violation::WrongType {
                field: field.to_string(),
                expected: types.to_string(),
                found: json_type_name(value),
            });
            return;
        }
    }

    if let Some(allowed) = &rule.allowed {
        if !allowed.contains(value) {
            out.push(Violation::NotAllowed {
                field: field.to_string(),
                value: value.clone(),
            });
        }
    }

    // string keywords apply to strings only
    let Some(text) = value.as_str() else {
        return;
    };
    if let Some(pattern) = &rule.pattern {
        if !pattern.is_match(text) {
            out.push(Violation::PatternMismatch {
                field: field.to_string(),
                pattern: pattern.as_str().to_string(),
            });
        }
    }
    if let Some(min) = rule.min_length {
        if text.chars().count() < min {
            out.push(Violation::TooShort {
                field: field.to_string(),
                min,
            });
        }
    }
}
