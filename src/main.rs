use aiflow::cli::{self, Cli};
use aiflow::config::{self, OutputKind, WorkflowConfig};
use aiflow::input::{self, InputData};
use aiflow::llm::retry::RetryPolicy;
use aiflow::llm::router::ProviderRouter;
use aiflow::output::{self, Destination};
use aiflow::workflow::runner::{select_path, RunOutput, WorkflowRunner};
use aiflow::workflow::WorkflowError;
use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    if let Err(err) = run(cli).await {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = effective_config(&cli)?;

    let plan = select_path(
        config.as_ref(),
        cli.legacy_mode,
        cli.selector(),
        &cli.generation_params(),
    )?;
    let input = resolve_input(&cli, config.as_ref())?;

    let router = ProviderRouter::from_env(RetryPolicy::default());
    let runner = WorkflowRunner::new(&router);
    let run_output = runner.run(&plan, &input).await?;

    let format = cli
        .format
        .or_else(|| {
            config
                .as_ref()
                .and_then(|c| c.output.as_ref())
                .and_then(|o| o.format)
        })
        .unwrap_or_default();
    let formatted = output::format_output(&run_output, format);

    match pick_destination(&cli, config.as_ref()) {
        Destination::Console => match &run_output {
            RunOutput::Single(result) => println!("{}", cli::render_result(result, &formatted)),
            RunOutput::Directory(_) => println!("{formatted}"),
        },
        destination @ Destination::File(_) => {
            // a failed write must not lose the result
            if let Err(err) = destination.deliver(&formatted) {
                eprintln!("Error: {err}");
                println!("{formatted}");
            }
        }
    }
    Ok(())
}

/// The configuration in force for this run.
///
/// `--legacy-mode` ignores `--config` entirely; the file is not even
/// read, so a broken configuration cannot abort a legacy run.
fn effective_config(cli: &Cli) -> Result<Option<WorkflowConfig>, WorkflowError> {
    match &cli.config {
        Some(path) if !cli.legacy_mode => Ok(Some(config::load_config(path)?)),
        _ => Ok(None),
    }
}

/// CLI input flags win over the configuration's input section; the
/// stdin prompt is a fallback for fully unconfigured runs only.
fn resolve_input(cli: &Cli, config: Option<&WorkflowConfig>) -> Result<InputData, WorkflowError> {
    if let Some(text) = &cli.input {
        return input::from_text(text);
    }
    if let Some(path) = &cli.input_file {
        return input::from_file(path);
    }
    if let Some(dir) = &cli.input_dir {
        return input::from_directory(dir, &cli.file_pattern, cli.recursive, cli.processing_strategy);
    }
    if let Some(config) = config {
        // a configured run never falls back to the interactive prompt
        return match &config.input {
            Some(section) => input::from_config(section),
            None => Err(WorkflowError::Input(
                "No input provided: the workflow configuration has no input section".to_string(),
            )),
        };
    }
    let text = cli::prompt_for_input()?;
    input::from_text(&text)
}

fn pick_destination(cli: &Cli, config: Option<&WorkflowConfig>) -> Destination {
    if let Some(path) = &cli.output_file {
        return Destination::file(path);
    }
    if let Some(section) = config.and_then(|c| c.output.as_ref()) {
        if section.kind == OutputKind::File {
            if let Some(path) = &section.path {
                return Destination::file(path);
            }
        }
    }
    Destination::Console
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("aiflow").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn legacy_mode_never_reads_the_configuration_file() {
        let cli = parse(&[
            "--legacy-mode",
            "--config",
            "/nonexistent/broken.json",
            "--input",
            "hi",
        ]);
        // the broken file must not abort the run; it is simply ignored
        assert!(effective_config(&cli).unwrap().is_none());
    }

    #[test]
    fn configured_runs_still_surface_config_errors() {
        let cli = parse(&["--config", "/nonexistent/broken.json", "--input", "hi"]);
        let err = effective_config(&cli).unwrap_err();
        assert!(matches!(err, WorkflowError::Config(msg) if msg.contains("not found")));
    }

    #[test]
    fn config_without_input_section_is_an_input_error_not_a_prompt() {
        let cli = parse(&["--config", "workflow.json"]);
        let config: WorkflowConfig = serde_json::from_str(
            r#"{"steps": [{"name": "s1", "model": "chatgpt"}]}"#,
        )
        .unwrap();

        let err = resolve_input(&cli, Some(&config)).unwrap_err();
        assert!(matches!(err, WorkflowError::Input(msg) if msg.contains("no input section")));
    }

    #[test]
    fn cli_input_wins_over_the_configuration() {
        let cli = parse(&["--config", "workflow.json", "--input", "from cli"]);
        let config: WorkflowConfig = serde_json::from_str(
            r#"{
                "input": {"type": "text", "value": "from config"},
                "steps": [{"name": "s1", "model": "chatgpt"}]
            }"#,
        )
        .unwrap();

        let input = resolve_input(&cli, Some(&config)).unwrap();
        match input.payload {
            aiflow::input::InputPayload::Text(text) => assert_eq!(text, "from cli"),
            aiflow::input::InputPayload::PerFile(_) => panic!("expected text payload"),
        }
    }
}
