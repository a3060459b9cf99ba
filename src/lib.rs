//! aiflow: chain AI model calls into configurable multi-step workflows.
//!
//! A workflow is an ordered list of steps. Each step resolves a prompt
//! template against the outputs accumulated so far, dispatches it to one
//! of the supported models (ChatGPT, Claude, or a web-search model) and
//! records the reply under its step name for later templates. Runs come
//! in two flavors: the configured path driven by a JSON workflow file,
//! and a legacy single-model path selected on the command line.

pub mod cli;
pub mod config;
pub mod input;
pub mod llm;
pub mod output;
pub mod template;
pub mod workflow;
