//! Workflow runner
//!
//! Owns a run from path selection through aggregation. The run moves
//! through `SELECT_PATH -> RESOLVE_INPUT -> RUN_STEPS -> AGGREGATE`;
//! input resolution happens in the input module before [`WorkflowRunner::run`]
//! is called, and any error anywhere absorbs the run immediately. No
//! state is revisited.
//!
//! The legacy selectors (including the two-model `claude-first`
//! sequence) are pre-expanded into ordinary step lists at planning time,
//! so a single loop executes both the legacy and the configured path.

use crate::config::{StepConfig, WorkflowConfig};
use crate::input::{InputData, InputPayload};
use crate::llm::{GenerationParams, ModelInvoker, ModelKind, Usage};
use crate::workflow::context::{Context, StepRecord};
use crate::workflow::step::StepExecutor;
use crate::workflow::WorkflowError;
use serde::Serialize;
use tracing::{info, warn};

/// Instruction wrapper the two-model legacy sequence uses to hand the
/// first model's analysis to the second.
pub const REFINE_INSTRUCTION_TEMPLATE: &str = "Here's an analysis from another AI assistant: \
{claude.output}\n\nPlease review and refine this analysis.";

/// Legacy CLI model selector values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum LegacySelector {
    #[default]
    Chatgpt,
    Claude,
    /// Claude first, then ChatGPT refines Claude's analysis
    ClaudeFirst,
    #[value(name = "web_search")]
    WebSearch,
}

impl LegacySelector {
    pub fn as_str(&self) -> &'static str {
        match self {
            LegacySelector::Chatgpt => "chatgpt",
            LegacySelector::Claude => "claude",
            LegacySelector::ClaudeFirst => "claude-first",
            LegacySelector::WebSearch => "web_search",
        }
    }
}

/// A normalized, ready-to-execute ordered step list.
#[derive(Debug, Clone)]
pub struct ExecutionPlan {
    pub steps: Vec<StepConfig>,
    /// Model label for the aggregated result; `None` means the final
    /// step's model (configured path behavior)
    label: Option<String>,
    /// Step whose output is preserved as the intermediate response
    capture_intermediate: Option<String>,
}

impl ExecutionPlan {
    /// Plan for the configured path: the declared step list as-is.
    pub fn configured(steps: Vec<StepConfig>) -> Self {
        Self {
            steps,
            label: None,
            capture_intermediate: None,
        }
    }

    /// Plan for a legacy selector, pre-expanded into the unified step
    /// list shape.
    pub fn legacy(selector: LegacySelector, params: &GenerationParams) -> Self {
        let single = |name: &str, model: ModelKind| {
            vec![legacy_step(name, model, "{input}", params)]
        };
        match selector {
            LegacySelector::Chatgpt => Self {
                steps: single("chatgpt", ModelKind::Chatgpt),
                label: Some(selector.as_str().to_string()),
                capture_intermediate: None,
            },
            LegacySelector::Claude => Self {
                steps: single("claude", ModelKind::Claude),
                label: Some(selector.as_str().to_string()),
                capture_intermediate: None,
            },
            LegacySelector::WebSearch => Self {
                steps: single("web_search", ModelKind::WebSearch),
                label: Some(selector.as_str().to_string()),
                capture_intermediate: None,
            },
            LegacySelector::ClaudeFirst => Self {
                steps: vec![
                    legacy_step("claude", ModelKind::Claude, "{input}", params),
                    legacy_step(
                        "chatgpt",
                        ModelKind::Chatgpt,
                        REFINE_INSTRUCTION_TEMPLATE,
                        params,
                    ),
                ],
                label: Some(selector.as_str().to_string()),
                capture_intermediate: Some("claude".to_string()),
            },
        }
    }
}

fn legacy_step(
    name: &str,
    model: ModelKind,
    template: &str,
    params: &GenerationParams,
) -> StepConfig {
    StepConfig {
        name: name.to_string(),
        model,
        prompt_template: template.to_string(),
        model_params: params.clone(),
        task: None,
    }
}

/// Choose between the configured and the legacy execution path.
///
/// The configured path is used only when a configuration was supplied
/// and legacy mode was not explicitly forced.
pub fn select_path(
    config: Option<&WorkflowConfig>,
    legacy_mode: bool,
    selector: LegacySelector,
    params: &GenerationParams,
) -> Result<ExecutionPlan, WorkflowError> {
    match config {
        Some(config) if !legacy_mode => Ok(ExecutionPlan::configured(config.normalized_steps()?)),
        _ => {
            if config.is_none() && legacy_mode {
                info!("legacy mode requested explicitly");
            } else if config.is_none() {
                info!("no configuration provided, using legacy workflow");
            }
            Ok(ExecutionPlan::legacy(selector, params))
        }
    }
}

/// The aggregated outcome of one successful run.
///
/// `Result<WorkflowResult, WorkflowError>` is the sum type: a result
/// never carries an error and an error never carries a usable result.
#[derive(Debug, Clone, Serialize)]
pub struct WorkflowResult {
    /// The final step's output text
    pub result: String,
    /// Model label: the legacy selector, or the final step's model
    pub model: String,
    /// Where the initial input came from (`text`, `file`, `directory`)
    pub input_source: String,
    /// The concrete model identity the provider reported
    pub model_info: String,
    /// Token usage of the final step
    pub usage: Usage,
    /// Ordered names of the executed steps
    pub steps: Vec<String>,
    /// First model's raw text in the two-model legacy sequence
    #[serde(skip_serializing_if = "Option::is_none")]
    pub intermediate_response: Option<String>,
}

/// Outcome of running the plan once per file in a directory batch.
#[derive(Debug, Clone, Serialize)]
pub struct FileRunResult {
    pub file_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<WorkflowResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl FileRunResult {
    fn succeeded(file_path: String, result: WorkflowResult) -> Self {
        Self {
            file_path,
            result: Some(result),
            error: None,
        }
    }

    fn failed(file_path: String, error: String) -> Self {
        Self {
            file_path,
            result: None,
            error: Some(error),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.result.is_some()
    }
}

/// Aggregated outcome of a per-file directory batch.
#[derive(Debug, Clone, Serialize)]
pub struct DirectoryRunResult {
    pub directory_path: String,
    pub file_count: usize,
    pub successful: usize,
    pub failed: usize,
    pub results: Vec<FileRunResult>,
}

/// What a run produced: one result, or one per input file.
#[derive(Debug, Clone)]
pub enum RunOutput {
    Single(WorkflowResult),
    Directory(DirectoryRunResult),
}

/// Drives a plan to completion against an injected invoker.
pub struct WorkflowRunner<'a> {
    invoker: &'a dyn ModelInvoker,
}

impl<'a> WorkflowRunner<'a> {
    pub fn new(invoker: &'a dyn ModelInvoker) -> Self {
        Self { invoker }
    }

    /// Execute the plan over the resolved input.
    ///
    /// For per-file directory input the plan runs once per file; each
    /// file is its own run, so one file's failure does not abort the
    /// batch, while the first failure within a file aborts that file's
    /// remaining steps.
    pub async fn run(
        &self,
        plan: &ExecutionPlan,
        input: &InputData,
    ) -> Result<RunOutput, WorkflowError> {
        match &input.payload {
            InputPayload::Text(text) => {
                let result = self.run_steps(plan, text, &input.source).await?;
                Ok(RunOutput::Single(result))
            }
            InputPayload::PerFile(files) => {
                let mut results = Vec::with_capacity(files.len());
                let mut successful = 0;
                let mut failed = 0;
                for file in files {
                    let path = file.path.display().to_string();
                    match self.run_steps(plan, &file.content, "directory").await {
                        Ok(result) => {
                            successful += 1;
                            results.push(FileRunResult::succeeded(path, result));
                        }
                        Err(err) => {
                            warn!(file = %path, "file run failed: {err}");
                            failed += 1;
                            results.push(FileRunResult::failed(path, err.to_string()));
                        }
                    }
                }
                Ok(RunOutput::Directory(DirectoryRunResult {
                    directory_path: input
                        .directory_path
                        .as_ref()
                        .map(|p| p.display().to_string())
                        .unwrap_or_default(),
                    file_count: results.len(),
                    successful,
                    failed,
                    results,
                }))
            }
        }
    }

    /// Execute the ordered step list over one input text and aggregate
    /// the final record.
    ///
    /// The context starts holding only `input`; each successful step
    /// writes its record and rebinds the `input` alias. The first
    /// failure aborts the remaining steps and nothing from the failed
    /// step reaches the context.
    pub async fn run_steps(
        &self,
        plan: &ExecutionPlan,
        input_text: &str,
        input_source: &str,
    ) -> Result<WorkflowResult, WorkflowError> {
        if plan.steps.is_empty() {
            return Err(WorkflowError::Config("No steps were executed".to_string()));
        }

        let mut context = Context::new(input_text.to_string());
        let executor = StepExecutor::new(self.invoker);
        let mut executed = Vec::with_capacity(plan.steps.len());
        let mut intermediate = None;
        let mut last: Option<StepRecord> = None;

        for step in &plan.steps {
            let record = executor.execute(step, &context).await?;

            if plan.capture_intermediate.as_deref() == Some(step.name.as_str()) {
                intermediate = Some(record.output.clone());
            }
            context.rebind_input(record.output.clone());
            executed.push(step.name.clone());
            last = Some(record.clone());
            context.insert_step(record)?;
        }

        let Some(final_record) = last else {
            return Err(WorkflowError::Config("No steps were executed".to_string()));
        };

        info!(steps = executed.len(), "workflow completed successfully");

        Ok(WorkflowResult {
            result: final_record.output,
            model: plan
                .label
                .clone()
                .unwrap_or_else(|| final_record.model.as_str().to_string()),
            input_source: input_source.to_string(),
            model_info: final_record.model_info,
            usage: final_record.usage,
            steps: executed,
            intermediate_response: intermediate,
        })
    }
}
