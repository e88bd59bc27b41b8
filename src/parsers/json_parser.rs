use serde_json::{Map, Value};
use tracing::debug;

use crate::error::RecordError;
use crate::models::{display_value, FormatType, LogLevel, LogRecord};
use crate::parsers::LogParser;
use crate::patterns::{parse_instant, LevelClassifier};

/// Decoder for lines that are already structured JSON records
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonParser {
    classifier: LevelClassifier,
}

impl JsonParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode one line into a record; the line must be a JSON object
    pub fn decode(&self, line: &str) -> Result<LogRecord, RecordError> {
        match serde_json::from_str::<Value>(line.trim())? {
            Value::Object(object) => Ok(self.from_object(object, line)),
            other => Err(RecordError::NotAnObject {
                found: json_type_name(&other),
            }),
        }
    }

    /// Lift the required fields out of `object`; every other key stays as metadata
    pub fn from_object(&self, mut object: Map<String, Value>, raw: &str) -> LogRecord {
        let timestamp = match object.shift_remove("timestamp") {
            Some(Value::String(text)) => {
                let parsed = parse_instant(&text);
                if parsed.is_none() {
                    debug!(timestamp = %text, "unparseable timestamp treated as absent");
                }
                parsed
            }
            _ => None,
        };

        let level = match object.shift_remove("level") {
            Some(Value::String(text)) => {
                LogLevel::from_alias(&text).unwrap_or_else(|| self.classifier.classify(&text))
            }
            _ => LogLevel::Info,
        };

        let event = match object.shift_remove("event") {
            None | Some(Value::Null) => String::new(),
            Some(value) => display_value(&value),
        };

        let mut record = LogRecord::new(level, event, raw, FormatType::Json).with_timestamp(timestamp);
        record.metadata = object;
        record
    }
}

impl LogParser for JsonParser {
    fn parse(&self, line: &str) -> Option<LogRecord> {
        self.decode(line).ok()
    }

    fn can_parse(&self, line: &str) -> bool {
        line.trim_start().starts_with('{')
    }

    fn format_type(&self) -> FormatType {
        FormatType::Json
    }
}

/// JSON type name as reported in errors
pub fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
