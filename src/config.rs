use std::{fs, path::Path};

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    correlator::types::CorrelatorConfig,
    graders::{hybrid::HybridConfig, judge::hygiene::JudgeConfig},
    redaction::RedactionSettings,
    trace::types::{AgentInfo, TaskInfo},
};

/// Top-level pipeline configuration. Explicit and passed at
/// construction; there is no process-global configuration, so tests can
/// run fully isolated instances in parallel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub agent: AgentInfo,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task: Option<TaskInfo>,
    #[serde(default)]
    pub redaction: RedactionSettings,
    #[serde(default)]
    pub judge: JudgeConfig,
    #[serde(default)]
    pub hybrid: HybridConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_logging_filter")]
    pub filter: String,
}

fn default_logging_filter() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: default_logging_filter(),
        }
    }
}

impl Config {
    /// Loads a json5 config file. When the document carries a `$schema`
    /// reference, the raw value is validated against that schema before
    /// deserialization.
    pub fn load(config_path: &Path) -> Result<Self> {
        let config_content = fs::read_to_string(config_path)
            .with_context(|| format!("failed to read {}", config_path.display()))?;
        let config_value: Value = json5::from_str(&config_content)
            .with_context(|| format!("failed to parse {}", config_path.display()))?;

        if let Some(schema_ref) = config_value.get("$schema").and_then(Value::as_str) {
            let config_base = config_path.parent().unwrap_or_else(|| Path::new("."));
            let schema_path = if Path::new(schema_ref).is_absolute() {
                Path::new(schema_ref).to_path_buf()
            } else {
                config_base.join(schema_ref)
            };
            validate_against_schema(&config_value, &schema_path)?;
        }

        let config: Config = serde_json::from_value(strip_schema_key(config_value))
            .context("failed to deserialize pipeline config")?;
        Ok(config)
    }

    pub fn correlator_config(&self) -> CorrelatorConfig {
        CorrelatorConfig {
            agent_info: self.agent.clone(),
            task_info: self.task.clone(),
            run_id: None,
            redaction: self.redaction.clone(),
        }
    }
}

fn strip_schema_key(mut value: Value) -> Value {
    if let Some(map) = value.as_object_mut() {
        map.remove("$schema");
    }
    value
}

fn validate_against_schema(config_value: &Value, schema_path: &Path) -> Result<()> {
    let schema_content = fs::read_to_string(schema_path)
        .with_context(|| format!("failed to read schema {}", schema_path.display()))?;
    let schema_value: Value = serde_json::from_str(&schema_content)
        .with_context(|| format!("failed to parse schema {}", schema_path.display()))?;
    let compiled = jsonschema::JSONSchema::compile(&schema_value)
        .map_err(|err| anyhow!("invalid schema {}: {}", schema_path.display(), err))?;

    if let Err(errors) = compiled.validate(config_value) {
        let rendered: Vec<String> = errors.map(|err| err.to_string()).collect();
        return Err(anyhow!(
            "config does not match schema {}: {}",
            schema_path.display(),
            rendered.join("; ")
        ));
    }
    Ok(())
}
