//! Workflow configuration
//!
//! Loading and validation of the JSON workflow configuration: the
//! primary `steps` schema and the alternative `ai_models` schema, which
//! is normalized into an implicit linear step list. All validation
//! happens here, before any step runs; a single invalid step invalidates
//! the whole configuration.

use crate::input::ProcessingStrategy;
use crate::llm::{GenerationParams, ModelKind};
use crate::output::OutputFormat;
use crate::workflow::WorkflowError;
use serde::Deserialize;
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use tracing::info;

fn default_prompt_template() -> String {
    "{input}".to_string()
}

fn default_file_pattern() -> String {
    "*".to_string()
}

/// One configured unit of work: a prompt template plus a target model
/// and parameters.
#[derive(Debug, Clone, Deserialize)]
pub struct StepConfig {
    /// Step name, unique within a run; also the context key
    pub name: String,

    /// Which model to dispatch to
    pub model: ModelKind,

    /// Prompt template resolved against the run context
    #[serde(default = "default_prompt_template")]
    pub prompt_template: String,

    /// Generation parameters forwarded to the provider
    #[serde(default)]
    pub model_params: GenerationParams,

    /// Optional task description; defaults to `Step {name}` at execution
    pub task: Option<String>,
}

/// Entry in the alternative `ai_models` schema
#[derive(Debug, Clone, Deserialize)]
pub struct AiModelEntry {
    /// Model identity (`chatgpt`, `claude`, `web_search`)
    pub name: ModelKind,

    /// Task description for the step
    pub task: Option<String>,

    /// Generation parameters
    #[serde(default)]
    pub parameters: GenerationParams,
}

/// Input section of a workflow configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum InputConfig {
    Text {
        value: String,
    },
    File {
        path: String,
    },
    Directory {
        path: String,
        #[serde(default = "default_file_pattern")]
        file_pattern: String,
        #[serde(default)]
        recursive: bool,
        #[serde(default)]
        processing_strategy: ProcessingStrategy,
    },
}

/// Output section of a workflow configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OutputConfig {
    /// `console` (default) or `file`
    #[serde(rename = "type", default)]
    pub kind: OutputKind,

    /// Destination path when `kind` is `file`
    pub path: Option<String>,

    /// Display format
    pub format: Option<OutputFormat>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputKind {
    #[default]
    Console,
    File,
}

/// A complete workflow configuration
#[derive(Debug, Clone, Deserialize)]
pub struct WorkflowConfig {
    pub name: Option<String>,
    pub description: Option<String>,

    #[serde(default)]
    pub input: Option<InputConfig>,

    /// Explicit ordered step list
    #[serde(default)]
    pub steps: Vec<StepConfig>,

    /// Alternative schema: implicit linear step list over `{input}`
    #[serde(default)]
    pub ai_models: Vec<AiModelEntry>,

    #[serde(default)]
    pub output: Option<OutputConfig>,
}

impl WorkflowConfig {
    /// The ordered, validated step list this configuration declares.
    ///
    /// The `ai_models` variant is expanded into steps chained through
    /// the `input` alias: each model's output becomes the next model's
    /// literal input, with no named-field templating.
    pub fn normalized_steps(&self) -> Result<Vec<StepConfig>, WorkflowError> {
        let steps = if !self.steps.is_empty() {
            self.steps.clone()
        } else {
            self.ai_models
                .iter()
                .enumerate()
                .map(|(index, entry)| StepConfig {
                    name: format!("{}_{}", entry.name.as_str(), index + 1),
                    model: entry.name,
                    prompt_template: default_prompt_template(),
                    model_params: entry.parameters.clone(),
                    task: entry.task.clone(),
                })
                .collect()
        };

        if steps.is_empty() {
            return Err(WorkflowError::Config(
                "workflow defines no steps".to_string(),
            ));
        }
        validate_steps(&steps)?;
        Ok(steps)
    }
}

fn validate_steps(steps: &[StepConfig]) -> Result<(), WorkflowError> {
    let mut seen = HashSet::new();
    for step in steps {
        if step.name.is_empty() {
            return Err(WorkflowError::Config("step name must not be empty".to_string()));
        }
        if step.name == "input" {
            return Err(WorkflowError::Config(
                "step name 'input' is reserved".to_string(),
            ));
        }
        if step.name.contains('.') {
            return Err(WorkflowError::Config(format!(
                "step name '{}' must not contain a dot",
                step.name
            )));
        }
        if !seen.insert(step.name.as_str()) {
            return Err(WorkflowError::Config(format!(
                "duplicate step name: {}",
                step.name
            )));
        }
        if step.model_params.max_tokens == 0 {
            return Err(WorkflowError::Config(format!(
                "step '{}': max_tokens must be greater than zero",
                step.name
            )));
        }
        let temperature = step.model_params.temperature;
        if !(0.0..=1.0).contains(&temperature) {
            return Err(WorkflowError::Config(format!(
                "step '{}': temperature must be between 0 and 1",
                step.name
            )));
        }
    }
    Ok(())
}

/// Load a workflow configuration from a JSON file.
pub fn load_config(path: &Path) -> Result<WorkflowConfig, WorkflowError> {
    if !path.exists() {
        return Err(WorkflowError::Config(format!(
            "Configuration file not found: {}",
            path.display()
        )));
    }

    let content = fs::read_to_string(path)?;
    let config: WorkflowConfig = serde_json::from_str(&content).map_err(|e| {
        WorkflowError::Config(format!("Invalid JSON in configuration file: {e}"))
    })?;

    // Surface step-list problems at load time, before any input is read
    config.normalized_steps()?;

    info!(path = %path.display(), "loaded workflow configuration");
    Ok(config)
}
