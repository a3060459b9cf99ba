//! Result formatting and delivery
//!
//! Turns aggregated workflow results into one of the supported display
//! formats and writes them to the console or a file. Formatting never
//! fails a run; delivery failures surface as output errors.

use crate::workflow::runner::{DirectoryRunResult, RunOutput, WorkflowResult};
use crate::workflow::WorkflowError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// Display format for a workflow result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Markdown,
    Json,
    Html,
}

/// Render a single workflow result in the requested format.
pub fn format_result(result: &WorkflowResult, format: OutputFormat) -> String {
    match format {
        OutputFormat::Text => result.result.clone(),
        OutputFormat::Markdown => format!(
            "# AI Response\n\n{}\n\n*Generated by {}*",
            result.result, result.model
        ),
        OutputFormat::Json => to_pretty_json(result, &result.result),
        OutputFormat::Html => format!(
            "<!DOCTYPE html>\n<html>\n<head>\n<title>AI Response</title>\n</head>\n<body>\n\
             <h1>AI Response</h1>\n<div>{}</div>\n<footer>Generated by {}</footer>\n\
             </body>\n</html>",
            to_html_text(&result.result),
            result.model
        ),
    }
}

/// Line breaks become `<br>` tags so multi-line responses keep their
/// shape in a browser.
fn to_html_text(text: &str) -> String {
    text.replace('\n', "<br>\n")
}

/// Render a per-file directory batch in the requested format.
pub fn format_directory_results(batch: &DirectoryRunResult, format: OutputFormat) -> String {
    match format {
        OutputFormat::Json => to_pretty_json(batch, &plain_directory_report(batch)),
        OutputFormat::Markdown => {
            let mut out = format!(
                "# Directory Results: {}\n\nProcessed {} files ({} succeeded, {} failed).\n",
                batch.directory_path, batch.file_count, batch.successful, batch.failed
            );
            for entry in &batch.results {
                out.push_str(&format!("\n## {}\n\n", entry.file_path));
                match (&entry.result, &entry.error) {
                    (Some(result), _) => out.push_str(&result.result),
                    (None, Some(error)) => out.push_str(&format!("Failed: {error}")),
                    (None, None) => {}
                }
                out.push('\n');
            }
            out
        }
        OutputFormat::Html => {
            let mut out = format!(
                "<!DOCTYPE html>\n<html>\n<head>\n<title>Directory Results</title>\n</head>\n\
                 <body>\n<h1>Directory Results: {}</h1>\n\
                 <p>Processed {} files ({} succeeded, {} failed).</p>\n",
                batch.directory_path, batch.file_count, batch.successful, batch.failed
            );
            for entry in &batch.results {
                out.push_str(&format!("<h2>{}</h2>\n", entry.file_path));
                match (&entry.result, &entry.error) {
                    (Some(result), _) => {
                        out.push_str(&format!("<div>{}</div>\n", to_html_text(&result.result)));
                    }
                    (None, Some(error)) => {
                        out.push_str(&format!("<div class=\"error\">Failed: {error}</div>\n"));
                    }
                    (None, None) => {}
                }
            }
            out.push_str("</body>\n</html>");
            out
        }
        OutputFormat::Text => plain_directory_report(batch),
    }
}

/// Render either run output shape.
pub fn format_output(output: &RunOutput, format: OutputFormat) -> String {
    match output {
        RunOutput::Single(result) => format_result(result, format),
        RunOutput::Directory(batch) => format_directory_results(batch, format),
    }
}

fn plain_directory_report(batch: &DirectoryRunResult) -> String {
    let mut out = format!(
        "Directory: {}\nProcessed {} files ({} succeeded, {} failed)\n",
        batch.directory_path, batch.file_count, batch.successful, batch.failed
    );
    for entry in &batch.results {
        out.push_str(&format!("\n=== {} ===\n", entry.file_path));
        match (&entry.result, &entry.error) {
            (Some(result), _) => out.push_str(&result.result),
            (None, Some(error)) => out.push_str(&format!("Failed: {error}")),
            (None, None) => {}
        }
        out.push('\n');
    }
    out
}

fn to_pretty_json<T: Serialize>(value: &T, fallback: &str) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| fallback.to_string())
}

/// Where a formatted result goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Destination {
    Console,
    File(PathBuf),
}

impl Destination {
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Destination::File(path.into())
    }

    /// Write the formatted text to this destination.
    pub fn deliver(&self, text: &str) -> Result<(), WorkflowError> {
        match self {
            Destination::Console => {
                println!("{text}");
                Ok(())
            }
            Destination::File(path) => {
                write_file(path, text)?;
                info!(file = %path.display(), "result written");
                Ok(())
            }
        }
    }
}

fn write_file(path: &Path, text: &str) -> Result<(), WorkflowError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent).map_err(|e| {
                WorkflowError::Output(format!(
                    "Failed to create directory {}: {e}",
                    parent.display()
                ))
            })?;
        }
    }
    fs::write(path, text).map_err(|e| {
        WorkflowError::Output(format!("Failed to write file {}: {e}", path.display()))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::Usage;

    fn sample_result() -> WorkflowResult {
        WorkflowResult {
            result: "The answer is 42.".to_string(),
            model: "chatgpt".to_string(),
            input_source: "text".to_string(),
            model_info: "gpt-3.5-turbo".to_string(),
            usage: Usage::new(),
            steps: vec!["chatgpt".to_string()],
            intermediate_response: None,
        }
    }

    #[test]
    fn text_format_is_just_the_result() {
        assert_eq!(
            format_result(&sample_result(), OutputFormat::Text),
            "The answer is 42."
        );
    }

    #[test]
    fn markdown_format_carries_heading_and_attribution() {
        let rendered = format_result(&sample_result(), OutputFormat::Markdown);
        assert!(rendered.starts_with("# AI Response\n\n"));
        assert!(rendered.contains("The answer is 42."));
        assert!(rendered.ends_with("*Generated by chatgpt*"));
    }

    #[test]
    fn json_format_is_the_full_result_structure() {
        let rendered = format_result(&sample_result(), OutputFormat::Json);
        let parsed: serde_json::Value = serde_json::from_str(&rendered).unwrap();
        assert_eq!(parsed["result"], "The answer is 42.");
        assert_eq!(parsed["model_info"], "gpt-3.5-turbo");
        // absent intermediate is omitted, not null
        assert!(parsed.get("intermediate_response").is_none());
    }

    #[test]
    fn html_format_wraps_the_result_in_a_page() {
        let rendered = format_result(&sample_result(), OutputFormat::Html);
        assert!(rendered.starts_with("<!DOCTYPE html>"));
        assert!(rendered.contains("<div>The answer is 42.</div>"));
        assert!(rendered.contains("Generated by chatgpt"));
    }

    #[test]
    fn html_format_converts_line_breaks() {
        let mut result = sample_result();
        result.result = "line one\nline two".to_string();
        let rendered = format_result(&result, OutputFormat::Html);
        assert!(rendered.contains("line one<br>\nline two"));
    }

    #[test]
    fn directory_report_lists_failures_alongside_results() {
        let batch = DirectoryRunResult {
            directory_path: "docs".to_string(),
            file_count: 2,
            successful: 1,
            failed: 1,
            results: vec![
                crate::workflow::runner::FileRunResult {
                    file_path: "docs/a.txt".to_string(),
                    result: Some(sample_result()),
                    error: None,
                },
                crate::workflow::runner::FileRunResult {
                    file_path: "docs/b.txt".to_string(),
                    result: None,
                    error: Some("Step 'chatgpt' failed: API error: rate limit".to_string()),
                },
            ],
        };
        let rendered = format_directory_results(&batch, OutputFormat::Text);
        assert!(rendered.contains("Processed 2 files (1 succeeded, 1 failed)"));
        assert!(rendered.contains("=== docs/a.txt ==="));
        assert!(rendered.contains("The answer is 42."));
        assert!(rendered.contains("Failed: Step 'chatgpt' failed"));

        let page = format_directory_results(&batch, OutputFormat::Html);
        assert!(page.starts_with("<!DOCTYPE html>"));
        assert!(page.contains("<h1>Directory Results: docs</h1>"));
        assert!(page.contains("<h2>docs/a.txt</h2>"));
        assert!(page.contains("<div>The answer is 42.</div>"));
        assert!(page.contains("class=\"error\""));
        assert!(page.ends_with("</body>\n</html>"));
    }

    #[test]
    fn file_destination_creates_missing_parents() {
        let dir = std::env::temp_dir()
            .join(format!("aiflow-output-{}", std::process::id()))
            .join("nested");
        let path = dir.join("result.txt");
        let _ = std::fs::remove_dir_all(&dir);

        Destination::file(&path).deliver("saved").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "saved");
        std::fs::remove_dir_all(dir.parent().unwrap()).unwrap();
    }
}
