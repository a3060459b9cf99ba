//! Step execution
//!
//! Executes one configured step: resolve the prompt template against the
//! current context, dispatch to the injected model invoker, normalize
//! the outcome into a [`StepRecord`]. Failures are propagated unchanged;
//! retries belong to the invoker, not here.

use crate::config::StepConfig;
use crate::llm::{InvocationOutcome, ModelInvoker};
use crate::template;
use crate::workflow::context::{Context, StepRecord};
use crate::workflow::WorkflowError;
use tracing::{info, warn};

/// Executes single steps against an injected invoker.
pub struct StepExecutor<'a> {
    invoker: &'a dyn ModelInvoker,
}

impl<'a> StepExecutor<'a> {
    pub fn new(invoker: &'a dyn ModelInvoker) -> Self {
        Self { invoker }
    }

    /// Run one step and normalize its outcome.
    ///
    /// An error here halts the whole workflow; steps are not
    /// individually recoverable or skippable.
    pub async fn execute(
        &self,
        step: &StepConfig,
        context: &Context,
    ) -> Result<StepRecord, WorkflowError> {
        let prompt = template::resolve(&step.prompt_template, context);
        let unresolved = template::find_unresolved(&step.prompt_template, context);
        if !unresolved.is_empty() {
            warn!(
                step = %step.name,
                placeholders = ?unresolved,
                "prompt template contains unresolved placeholders"
            );
        }

        info!(step = %step.name, model = %step.model, "executing step");

        let outcome = self
            .invoker
            .invoke(step.model, &prompt, &step.model_params)
            .await;

        match outcome {
            InvocationOutcome::Success { text, model, usage } => Ok(StepRecord {
                output: text,
                model: step.model,
                model_info: model,
                usage,
                step_name: step.name.clone(),
                task: step
                    .task
                    .clone()
                    .unwrap_or_else(|| format!("Step {}", step.name)),
            }),
            InvocationOutcome::Failure { error, .. } => Err(WorkflowError::Step {
                step: step.name.clone(),
                message: error,
            }),
        }
    }
}
