//! Input acquisition
//!
//! Resolves the three input sources (inline text, a single file, a
//! directory scan) into one [`InputData`] the runner consumes. All
//! filesystem work happens here, before any model call.

use crate::config::InputConfig;
use crate::workflow::WorkflowError;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// How a directory of files becomes workflow input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ProcessingStrategy {
    /// Merge all matched files into one annotated text blob
    #[default]
    Concatenate,
    /// Run the whole workflow once per matched file
    Individual,
}

/// One file picked up by a directory scan.
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub path: PathBuf,
    pub content: String,
}

/// The shape of resolved input: one text, or one text per file.
#[derive(Debug, Clone)]
pub enum InputPayload {
    Text(String),
    PerFile(Vec<SourceFile>),
}

/// Resolved workflow input, ready to hand to the runner.
#[derive(Debug, Clone)]
pub struct InputData {
    pub payload: InputPayload,
    /// Source label carried into the result (`text`, `file`, `directory`)
    pub source: String,
    /// Set for directory input, for reporting
    pub directory_path: Option<PathBuf>,
}

/// Wrap inline text as workflow input.
pub fn from_text(text: &str) -> Result<InputData, WorkflowError> {
    if text.trim().is_empty() {
        return Err(WorkflowError::Input("Empty input provided".to_string()));
    }
    Ok(InputData {
        payload: InputPayload::Text(text.to_string()),
        source: "text".to_string(),
        directory_path: None,
    })
}

/// Read one file as workflow input.
pub fn from_file(path: &Path) -> Result<InputData, WorkflowError> {
    if !path.exists() {
        return Err(WorkflowError::Input(format!(
            "File not found: {}",
            path.display()
        )));
    }
    if !path.is_file() {
        return Err(WorkflowError::Input(format!(
            "Not a file: {}",
            path.display()
        )));
    }
    let content = fs::read_to_string(path).map_err(|e| {
        WorkflowError::Input(format!("Failed to read file {}: {e}", path.display()))
    })?;
    if content.trim().is_empty() {
        return Err(WorkflowError::Input(format!(
            "File is empty: {}",
            path.display()
        )));
    }
    info!(file = %path.display(), bytes = content.len(), "read input file");
    Ok(InputData {
        payload: InputPayload::Text(content),
        source: "file".to_string(),
        directory_path: None,
    })
}

/// Scan a directory for matching files and turn them into workflow
/// input according to the strategy.
pub fn from_directory(
    dir: &Path,
    file_pattern: &str,
    recursive: bool,
    strategy: ProcessingStrategy,
) -> Result<InputData, WorkflowError> {
    let files = collect_files(dir, file_pattern, recursive)?;
    info!(
        directory = %dir.display(),
        files = files.len(),
        strategy = ?strategy,
        "collected directory input"
    );

    let payload = match strategy {
        ProcessingStrategy::Concatenate => InputPayload::Text(concatenate(&files)),
        ProcessingStrategy::Individual => InputPayload::PerFile(files),
    };
    Ok(InputData {
        payload,
        source: "directory".to_string(),
        directory_path: Some(dir.to_path_buf()),
    })
}

/// Resolve the input section of a workflow configuration.
pub fn from_config(input: &InputConfig) -> Result<InputData, WorkflowError> {
    match input {
        InputConfig::Text { value } => from_text(value),
        InputConfig::File { path } => from_file(Path::new(path)),
        InputConfig::Directory {
            path,
            file_pattern,
            recursive,
            processing_strategy,
        } => from_directory(Path::new(path), file_pattern, *recursive, *processing_strategy),
    }
}

fn collect_files(
    dir: &Path,
    file_pattern: &str,
    recursive: bool,
) -> Result<Vec<SourceFile>, WorkflowError> {
    if !dir.is_dir() {
        return Err(WorkflowError::Input(format!(
            "Directory not found: {}",
            dir.display()
        )));
    }

    let pattern = if recursive {
        format!("{}/**/{file_pattern}", dir.display())
    } else {
        format!("{}/{file_pattern}", dir.display())
    };
    debug!(pattern = %pattern, "scanning directory");

    let entries = glob::glob(&pattern)
        .map_err(|e| WorkflowError::Input(format!("Invalid file pattern '{file_pattern}': {e}")))?;

    let mut paths: Vec<PathBuf> = Vec::new();
    for entry in entries {
        let path = entry
            .map_err(|e| WorkflowError::Input(format!("Failed to scan directory: {e}")))?;
        if path.is_file() {
            paths.push(path);
        }
    }
    paths.sort();

    if paths.is_empty() {
        return Err(WorkflowError::Input(format!(
            "No files matching '{file_pattern}' found in directory: {}",
            dir.display()
        )));
    }

    let mut files = Vec::with_capacity(paths.len());
    for path in paths {
        let content = fs::read_to_string(&path).map_err(|e| {
            WorkflowError::Input(format!("Failed to read file {}: {e}", path.display()))
        })?;
        files.push(SourceFile { path, content });
    }
    Ok(files)
}

fn concatenate(files: &[SourceFile]) -> String {
    let mut combined = String::new();
    for file in files {
        combined.push_str(&format!("--- File: {} ---\n", file.path.display()));
        combined.push_str(&file.content);
        combined.push_str("\n\n");
    }
    combined
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("aiflow-input-{name}-{}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn inline_text_is_wrapped_as_is() {
        let input = from_text("summarize this").unwrap();
        assert_eq!(input.source, "text");
        match input.payload {
            InputPayload::Text(text) => assert_eq!(text, "summarize this"),
            InputPayload::PerFile(_) => panic!("expected text payload"),
        }
    }

    #[test]
    fn blank_text_is_rejected() {
        let err = from_text("   \n").unwrap_err();
        assert!(matches!(err, WorkflowError::Input(_)));
        assert_eq!(err.to_string(), "Input error: Empty input provided");
    }

    #[test]
    fn missing_file_is_an_input_error() {
        let err = from_file(Path::new("/nonexistent/notes.txt")).unwrap_err();
        assert!(err.to_string().contains("File not found"));
    }

    #[test]
    fn file_content_is_read_verbatim() {
        let dir = scratch_dir("file");
        let path = dir.join("notes.txt");
        fs::write(&path, "line one\nline two\n").unwrap();

        let input = from_file(&path).unwrap();
        assert_eq!(input.source, "file");
        match input.payload {
            InputPayload::Text(text) => assert_eq!(text, "line one\nline two\n"),
            InputPayload::PerFile(_) => panic!("expected text payload"),
        }
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn empty_file_is_rejected() {
        let dir = scratch_dir("empty");
        let path = dir.join("empty.txt");
        fs::write(&path, "  \n").unwrap();

        let err = from_file(&path).unwrap_err();
        assert!(err.to_string().contains("File is empty"));
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn concatenate_merges_matched_files_in_path_order() {
        let dir = scratch_dir("concat");
        fs::write(dir.join("a.txt"), "alpha").unwrap();
        fs::write(dir.join("b.txt"), "beta").unwrap();
        fs::write(dir.join("skip.md"), "not matched").unwrap();

        let input =
            from_directory(&dir, "*.txt", false, ProcessingStrategy::Concatenate).unwrap();
        let InputPayload::Text(text) = input.payload else {
            panic!("expected concatenated payload");
        };
        assert!(text.contains("--- File: "));
        assert!(text.contains("alpha"));
        assert!(text.contains("beta"));
        assert!(!text.contains("not matched"));
        assert!(text.find("alpha").unwrap() < text.find("beta").unwrap());
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn individual_strategy_keeps_files_separate() {
        let dir = scratch_dir("individual");
        fs::write(dir.join("one.txt"), "first").unwrap();
        fs::write(dir.join("two.txt"), "second").unwrap();

        let input =
            from_directory(&dir, "*.txt", false, ProcessingStrategy::Individual).unwrap();
        let InputPayload::PerFile(files) = input.payload else {
            panic!("expected per-file payload");
        };
        assert_eq!(files.len(), 2);
        assert_eq!(files[0].content, "first");
        assert_eq!(files[1].content, "second");
        assert_eq!(input.directory_path.as_deref(), Some(dir.as_path()));
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn recursive_scan_descends_into_subdirectories() {
        let dir = scratch_dir("recursive");
        fs::create_dir_all(dir.join("nested")).unwrap();
        fs::write(dir.join("top.txt"), "top").unwrap();
        fs::write(dir.join("nested/deep.txt"), "deep").unwrap();

        let flat = from_directory(&dir, "*.txt", false, ProcessingStrategy::Individual).unwrap();
        let InputPayload::PerFile(files) = flat.payload else {
            panic!("expected per-file payload");
        };
        assert_eq!(files.len(), 1);

        let deep = from_directory(&dir, "*.txt", true, ProcessingStrategy::Individual).unwrap();
        let InputPayload::PerFile(files) = deep.payload else {
            panic!("expected per-file payload");
        };
        assert_eq!(files.len(), 2);
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn no_matches_is_an_input_error() {
        let dir = scratch_dir("nomatch");
        fs::write(dir.join("readme.md"), "hello").unwrap();

        let err =
            from_directory(&dir, "*.txt", false, ProcessingStrategy::Concatenate).unwrap_err();
        assert!(err.to_string().contains("No files matching"));
        fs::remove_dir_all(&dir).unwrap();
    }
}
