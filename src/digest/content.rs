use serde_json::{Map, Value};

/// One group's chat log for one day, in whichever shape the log service
/// produced it.
#[derive(Debug, Clone, PartialEq)]
pub enum LogContent {
    PlainText(String),
    Sequence(Vec<Value>),
    Mapping(Map<String, Value>),
}

impl LogContent {
    /// Interpret a response body. Bodies that look like and parse as a JSON
    /// array or object become structured content; everything else is text.
    pub fn from_body(body: &str) -> Self {
        let trimmed = body.trim();
        if trimmed.starts_with('[') || trimmed.starts_with('{') {
            match serde_json::from_str::<Value>(trimmed) {
                Ok(Value::Array(items)) => return LogContent::Sequence(items),
                Ok(Value::Object(map)) => return LogContent::Mapping(map),
                _ => {}
            }
        }
        LogContent::PlainText(trimmed.to_string())
    }

    pub fn is_empty(&self) -> bool {
        match self {
            LogContent::PlainText(text) => text.trim().is_empty(),
            LogContent::Sequence(items) => items.is_empty(),
            LogContent::Mapping(map) => map.is_empty(),
        }
    }

    pub fn shape(&self) -> &'static str {
        match self {
            LogContent::PlainText(_) => "text",
            LogContent::Sequence(_) => "list",
            LogContent::Mapping(_) => "mapping",
        }
    }

    /// Short description for log lines: size plus shape.
    pub fn describe(&self) -> String {
        match self {
            LogContent::PlainText(text) => format!("text, {} chars", text.chars().count()),
            LogContent::Sequence(items) => format!("list, {} records", items.len()),
            LogContent::Mapping(map) => {
                let keys = map.keys().cloned().collect::<Vec<_>>().join(",");
                format!("mapping, keys [{keys}]")
            }
        }
    }

    /// Text form embedded in the prompt. Structured content is pretty-printed
    /// with non-ASCII characters kept as-is.
    pub fn render(&self) -> String {
        match self {
            LogContent::PlainText(text) => text.clone(),
            LogContent::Sequence(items) => pretty(&Value::Array(items.clone())),
            LogContent::Mapping(map) => pretty(&Value::Object(map.clone())),
        }
    }
}

fn pretty(value: &Value) -> String {
    // Serializing an in-memory Value cannot fail.
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

/// Gate applied right after fetching: absent or empty content is unusable.
pub fn is_usable(content: Option<&LogContent>) -> bool {
    content.is_some_and(|c| !c.is_empty())
}
