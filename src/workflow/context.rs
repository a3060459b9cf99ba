//! Run context
//!
//! The accumulating name→record mapping threaded through one workflow
//! run. Keys are written once and never mutated; only the `input` alias
//! is rebound, to the latest step's output, so strictly-sequential
//! chaining works without named templating. The context lives for one
//! run and is never persisted.

use crate::llm::{ModelKind, Usage};
use crate::workflow::WorkflowError;
use indexmap::IndexMap;
use serde::Serialize;

/// Reserved context key for the initial (and then latest) input text.
pub const INPUT_KEY: &str = "input";

/// The normalized outcome of one successfully executed step.
///
/// Failures never become records; they abort the run as
/// [`WorkflowError::Step`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StepRecord {
    /// The generated text
    pub output: String,
    /// The model identity the step was configured with
    pub model: ModelKind,
    /// The concrete model the provider reported (e.g. `gpt-3.5-turbo`)
    pub model_info: String,
    /// Token usage for the call
    pub usage: Usage,
    /// Name of the step that produced this record
    pub step_name: String,
    /// Human-readable task description
    pub task: String,
}

impl StepRecord {
    /// Look up a template-addressable field by name.
    ///
    /// Only string-valued fields are addressable; `usage` is a map and
    /// stays out of templating.
    pub fn field(&self, field: &str) -> Option<&str> {
        match field {
            "output" => Some(&self.output),
            "model" => Some(self.model.as_str()),
            "model_info" => Some(&self.model_info),
            "step_name" => Some(&self.step_name),
            "task" => Some(&self.task),
            _ => None,
        }
    }
}

/// The accumulating context for one run.
#[derive(Debug, Clone)]
pub struct Context {
    input: String,
    steps: IndexMap<String, StepRecord>,
}

impl Context {
    /// Create a context holding only the initial input.
    pub fn new(input: String) -> Self {
        Self {
            input,
            steps: IndexMap::new(),
        }
    }

    /// The current value of the `input` alias.
    pub fn input(&self) -> &str {
        &self.input
    }

    /// Rebind the `input` alias to the latest step's output.
    pub fn rebind_input(&mut self, text: String) {
        self.input = text;
    }

    /// Insert a completed step's record under its step name.
    ///
    /// Keys are write-once; a duplicate name is a configuration error
    /// (the loader rejects duplicates, this guards the invariant).
    pub fn insert_step(&mut self, record: StepRecord) -> Result<(), WorkflowError> {
        let name = record.step_name.clone();
        if name == INPUT_KEY || self.steps.contains_key(&name) {
            return Err(WorkflowError::Config(format!(
                "duplicate or reserved step name: {name}"
            )));
        }
        self.steps.insert(name, record);
        Ok(())
    }

    /// Whether a step record exists under `name`.
    pub fn contains_step(&self, name: &str) -> bool {
        self.steps.contains_key(name)
    }

    /// Resolve `{name.field}` against a stored step record.
    pub fn field(&self, name: &str, field: &str) -> Option<&str> {
        self.steps.get(name).and_then(|record| record.field(field))
    }

    /// Step names in insertion order.
    pub fn step_names(&self) -> impl Iterator<Item = &str> {
        self.steps.keys().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(name: &str, output: &str) -> StepRecord {
        StepRecord {
            output: output.to_string(),
            model: ModelKind::Chatgpt,
            model_info: "gpt-3.5-turbo".to_string(),
            usage: Usage::new(),
            step_name: name.to_string(),
            task: format!("Step {name}"),
        }
    }

    #[test]
    fn keys_are_write_once() {
        let mut ctx = Context::new("hello".to_string());
        ctx.insert_step(record("s1", "a")).unwrap();
        assert!(ctx.insert_step(record("s1", "b")).is_err());
        assert_eq!(ctx.field("s1", "output"), Some("a"));
    }

    #[test]
    fn input_is_a_reserved_key() {
        let mut ctx = Context::new("hello".to_string());
        assert!(ctx.insert_step(record("input", "x")).is_err());
    }

    #[test]
    fn rebinding_input_does_not_touch_step_records() {
        let mut ctx = Context::new("original".to_string());
        ctx.insert_step(record("s1", "first")).unwrap();
        ctx.rebind_input("first".to_string());
        assert_eq!(ctx.input(), "first");
        assert_eq!(ctx.field("s1", "output"), Some("first"));
        assert_eq!(ctx.field("s1", "model"), Some("chatgpt"));
    }

    #[test]
    fn usage_is_not_template_addressable() {
        let mut ctx = Context::new(String::new());
        ctx.insert_step(record("s1", "out")).unwrap();
        assert_eq!(ctx.field("s1", "usage"), None);
        assert_eq!(ctx.field("missing", "output"), None);
    }

    #[test]
    fn step_names_preserve_insertion_order() {
        let mut ctx = Context::new(String::new());
        ctx.insert_step(record("b", "1")).unwrap();
        ctx.insert_step(record("a", "2")).unwrap();
        let names: Vec<&str> = ctx.step_names().collect();
        assert_eq!(names, vec!["b", "a"]);
    }
}
