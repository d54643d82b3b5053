use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Declarative redaction settings, deserializable from config files.
/// Compiled into a [`RedactionFilter`] before use.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedactionSettings {
    #[serde(default = "default_enabled_true")]
    pub enabled: bool,
    #[serde(default)]
    pub patterns: Vec<String>,
    #[serde(default = "default_field_names")]
    pub field_names: Vec<String>,
    #[serde(default = "default_replacement")]
    pub replacement: String,
}

fn default_enabled_true() -> bool {
    true
}

fn default_field_names() -> Vec<String> {
    ["password", "api_key", "secret", "token", "authorization", "bearer"]
        .into_iter()
        .map(str::to_string)
        .collect()
}

fn default_replacement() -> String {
    "[REDACTED]".to_string()
}

impl Default for RedactionSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            patterns: Vec::new(),
            field_names: default_field_names(),
            replacement: default_replacement(),
        }
    }
}

impl RedactionSettings {
    /// Settings with common PII patterns: email addresses, SSNs, and
    /// bare 16-digit card numbers.
    pub fn with_default_patterns() -> Self {
        Self {
            patterns: vec![
                r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b".to_string(),
                r"\b\d{3}-\d{2}-\d{4}\b".to_string(),
                r"\b\d{16}\b".to_string(),
            ],
            ..Self::default()
        }
    }

    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone)]
pub struct RedactionFilter {
    enabled: bool,
    patterns: Vec<Regex>,
    field_names: Vec<String>,
    replacement: String,
}

impl RedactionFilter {
    pub fn compile(settings: &RedactionSettings) -> Result<Self, regex::Error> {
        let patterns = settings
            .patterns
            .iter()
            .map(|pattern| Regex::new(pattern))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            enabled: settings.enabled,
            patterns,
            field_names: settings
                .field_names
                .iter()
                .map(|name| name.to_lowercase())
                .collect(),
            replacement: settings.replacement.clone(),
        })
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Substitutes every configured pattern in the given text.
    pub fn redact(&self, text: &str) -> String {
        if !self.enabled || text.is_empty() {
            return text.to_string();
        }
        let mut result = text.to_string();
        for pattern in &self.patterns {
            result = pattern
                .replace_all(&result, self.replacement.as_str())
                .into_owned();
        }
        result
    }

    /// Case-insensitive substring match against the sensitive-name list.
    pub fn should_redact_field(&self, field_name: &str) -> bool {
        if !self.enabled {
            return false;
        }
        let field_lower = field_name.to_lowercase();
        self.field_names
            .iter()
            .any(|name| field_lower.contains(name))
    }

    /// Walks a payload in place: object fields with sensitive names are
    /// replaced wholesale, string leaves are pattern-substituted.
    pub fn redact_value(&self, value: &mut Value) {
        if !self.enabled {
            return;
        }
        match value {
            Value::String(text) => {
                *text = self.redact(text);
            }
            Value::Array(items) => {
                for item in items {
                    self.redact_value(item);
                }
            }
            Value::Object(map) => {
                for (key, entry) in map.iter_mut() {
                    if self.should_redact_field(key) {
                        *entry = Value::String(self.replacement.clone());
                    } else {
                        self.redact_value(entry);
                    }
                }
            }
            _ => {}
        }
    }
}

impl Default for RedactionFilter {
    fn default() -> Self {
        Self {
            enabled: true,
            patterns: Vec::new(),
            field_names: default_field_names(),
            replacement: default_replacement(),
        }
    }
}
