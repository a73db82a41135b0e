use serde_json::Value;

/// The shape a skills value arrived in.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum SkillsValue {
    List(Vec<Value>),
    Text(String),
    #[default]
    Other,
}

impl From<&Value> for SkillsValue {
    fn from(value: &Value) -> Self {
        match value {
            Value::Array(items) => SkillsValue::List(items.clone()),
            Value::String(s) => SkillsValue::Text(s.clone()),
            _ => SkillsValue::Other,
        }
    }
}

impl From<Option<&str>> for SkillsValue {
    fn from(value: Option<&str>) -> Self {
        value.map_or(SkillsValue::Other, |s| SkillsValue::Text(s.to_string()))
    }
}

impl<S: Into<String>> From<Vec<S>> for SkillsValue {
    fn from(items: Vec<S>) -> Self {
        SkillsValue::List(items.into_iter().map(|s| Value::String(s.into())).collect())
    }
}

/// Normalize a skills value into trimmed, non-empty tokens in input order.
/// Never fails: unparsable list literals fall back to delimiter splitting.
pub fn coerce_skills(value: &SkillsValue) -> Vec<String> {
    match value {
        SkillsValue::List(items) => from_items(items),
        SkillsValue::Text(text) => from_text(text),
        SkillsValue::Other => Vec::new(),
    }
}

fn from_items(items: &[Value]) -> Vec<String> {
    items
        .iter()
        .filter_map(stringify)
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn stringify(item: &Value) -> Option<String> {
    match item {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

fn from_text(text: &str) -> Vec<String> {
    let trimmed = text.trim();
    if trimmed.starts_with('[') && trimmed.ends_with(']') {
        if let Ok(Value::Array(items)) = serde_json::from_str::<Value>(trimmed) {
            return from_items(&items);
        }
    }
    trimmed
        .split([';', '|', ','])
        .map(|tok| {
            tok.trim()
                .trim_matches(|c: char| matches!(c, '[' | ']' | '"' | '\'') || c.is_whitespace())
        })
        .filter(|tok| !tok.is_empty())
        .map(str::to_string)
        .collect()
}
