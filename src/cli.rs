//! Command line interface
//!
//! Argument surface plus the console presentation of a finished run.
//! Input source flags are mutually exclusive; a run with no input flag
//! and no configuration prompts the user on stdin.

use crate::input::ProcessingStrategy;
use crate::llm::GenerationParams;
use crate::output::OutputFormat;
use crate::workflow::runner::{LegacySelector, WorkflowResult};
use crate::workflow::WorkflowError;
use clap::Parser;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;

const BANNER: &str = "==================================================";
const DIVIDER: &str = "--------------------------------------------------";

#[derive(Parser, Debug)]
#[command(
    name = "aiflow",
    version,
    about = "Chain AI model calls into configurable multi-step workflows"
)]
pub struct Cli {
    /// Inline input text
    #[arg(short, long)]
    pub input: Option<String>,

    /// Read input from a file
    #[arg(long, value_name = "PATH", conflicts_with = "input")]
    pub input_file: Option<PathBuf>,

    /// Process files from a directory
    #[arg(long, value_name = "PATH", conflicts_with_all = ["input", "input_file"])]
    pub input_dir: Option<PathBuf>,

    /// Glob pattern for directory input
    #[arg(long, default_value = "*", value_name = "GLOB")]
    pub file_pattern: String,

    /// Descend into subdirectories when scanning a directory
    #[arg(long)]
    pub recursive: bool,

    /// How directory files become workflow input
    #[arg(long, value_enum, default_value = "concatenate")]
    pub processing_strategy: ProcessingStrategy,

    /// Model for the legacy single-model path
    #[arg(short, long, value_enum, default_value = "chatgpt")]
    pub model: LegacySelector,

    /// Use ChatGPT (combined with --use-claude: Claude first, then ChatGPT)
    #[arg(long)]
    pub use_chatgpt: bool,

    /// Use Claude (combined with --use-chatgpt: Claude first, then ChatGPT)
    #[arg(long)]
    pub use_claude: bool,

    /// Maximum number of tokens in the response
    #[arg(long, default_value_t = 1000)]
    pub max_tokens: u32,

    /// Sampling temperature (0-1)
    #[arg(long, default_value_t = 0.7)]
    pub temperature: f32,

    /// Write the result to a file instead of the console
    #[arg(short = 'o', long, value_name = "PATH")]
    pub output_file: Option<PathBuf>,

    /// Display format for the result
    #[arg(short, long, value_enum)]
    pub format: Option<OutputFormat>,

    /// Workflow configuration file (JSON)
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Force the legacy single-model path even when a configuration is given
    #[arg(long)]
    pub legacy_mode: bool,
}

impl Cli {
    /// The effective legacy model selector.
    ///
    /// The boolean shorthands win over `--model`; both together select
    /// the two-model sequence.
    pub fn selector(&self) -> LegacySelector {
        match (self.use_chatgpt, self.use_claude) {
            (true, true) => LegacySelector::ClaudeFirst,
            (false, true) => LegacySelector::Claude,
            (true, false) => LegacySelector::Chatgpt,
            (false, false) => self.model,
        }
    }

    pub fn generation_params(&self) -> GenerationParams {
        GenerationParams {
            model_variant: None,
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        }
    }
}

/// Prompt the user on stdin when no input source was supplied.
pub fn prompt_for_input() -> Result<String, WorkflowError> {
    print!("Enter your prompt: ");
    io::stdout()
        .flush()
        .map_err(|e| WorkflowError::Input(format!("Failed to prompt for input: {e}")))?;
    let mut line = String::new();
    io::stdin()
        .lock()
        .read_line(&mut line)
        .map_err(|e| WorkflowError::Input(format!("Failed to read input: {e}")))?;
    Ok(line.trim().to_string())
}

/// Render the console report for a single workflow result.
pub fn render_result(result: &WorkflowResult, formatted: &str) -> String {
    let mut out = String::new();
    out.push_str(BANNER);
    out.push_str("\nAI WORKFLOW RESULT\n");
    out.push_str(BANNER);
    out.push('\n');
    out.push_str(&format!("Model: {}\n", result.model));
    out.push_str(&format!("Input source: {}\n", result.input_source));
    if !result.model_info.is_empty() {
        out.push_str(&format!("Model info: {}\n", result.model_info));
    }
    if !result.usage.is_empty() {
        let parts: Vec<String> = result
            .usage
            .iter()
            .map(|(key, value)| format!("{key}={value}"))
            .collect();
        out.push_str(&format!("Token usage: {}\n", parts.join(", ")));
    }
    if result.steps.len() > 1 {
        out.push_str(&format!("Steps: {}\n", result.steps.join(" -> ")));
    }
    if let Some(intermediate) = &result.intermediate_response {
        out.push_str(DIVIDER);
        out.push_str("\nClaude's Initial Response:\n");
        out.push_str(intermediate);
        out.push('\n');
    }
    out.push_str(DIVIDER);
    out.push('\n');
    out.push_str(formatted);
    out.push('\n');
    out.push_str(BANNER);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::Usage;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("aiflow").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn defaults_select_the_chatgpt_legacy_path() {
        let cli = parse(&["--input", "hello"]);
        assert_eq!(cli.selector(), LegacySelector::Chatgpt);
        assert_eq!(cli.generation_params().max_tokens, 1000);
        assert!(!cli.legacy_mode);
    }

    #[test]
    fn both_model_flags_select_the_two_model_sequence() {
        let cli = parse(&["--input", "hi", "--use-chatgpt", "--use-claude"]);
        assert_eq!(cli.selector(), LegacySelector::ClaudeFirst);

        let claude_only = parse(&["--input", "hi", "--use-claude"]);
        assert_eq!(claude_only.selector(), LegacySelector::Claude);
    }

    #[test]
    fn model_flag_accepts_the_search_selector() {
        let cli = parse(&["--input", "hi", "--model", "web_search"]);
        assert_eq!(cli.selector(), LegacySelector::WebSearch);
    }

    #[test]
    fn input_sources_are_mutually_exclusive() {
        let err = Cli::try_parse_from(["aiflow", "--input", "a", "--input-file", "b.txt"]);
        assert!(err.is_err());
        let err = Cli::try_parse_from(["aiflow", "--input", "a", "--input-dir", "docs"]);
        assert!(err.is_err());
    }

    #[test]
    fn rendered_report_carries_metadata_and_banners() {
        let mut usage = Usage::new();
        usage.insert("total_tokens".to_string(), 42);
        let result = WorkflowResult {
            result: "done".to_string(),
            model: "claude-first".to_string(),
            input_source: "text".to_string(),
            model_info: "gpt-3.5-turbo".to_string(),
            usage,
            steps: vec!["claude".to_string(), "chatgpt".to_string()],
            intermediate_response: Some("first pass".to_string()),
        };

        let report = render_result(&result, "done");
        assert!(report.starts_with(BANNER));
        assert!(report.contains("Model: claude-first"));
        assert!(report.contains("Token usage: total_tokens=42"));
        assert!(report.contains("Steps: claude -> chatgpt"));
        assert!(report.contains("Claude's Initial Response:\nfirst pass"));
        assert!(report.trim_end().ends_with(BANNER));
    }

    #[test]
    fn single_step_report_omits_the_steps_line() {
        let result = WorkflowResult {
            result: "done".to_string(),
            model: "chatgpt".to_string(),
            input_source: "text".to_string(),
            model_info: String::new(),
            usage: Usage::new(),
            steps: vec!["chatgpt".to_string()],
            intermediate_response: None,
        };
        let report = render_result(&result, "done");
        assert!(!report.contains("Steps:"));
        assert!(!report.contains("Claude's Initial Response"));
    }
}
