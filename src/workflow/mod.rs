//! Workflow engine
//!
//! Drives an ordered list of steps against a shared run context. The
//! legacy single- and two-model modes are normalized into the same step
//! list shape at planning time, so one loop executes everything.

pub mod context;
pub mod runner;
pub mod step;

/// Error taxonomy for a workflow run.
///
/// Every layer returns one of these rather than panicking past its own
/// boundary. The first error encountered stops the run and is surfaced
/// verbatim.
#[derive(Debug, thiserror::Error)]
pub enum WorkflowError {
    /// No usable initial text; surfaced before any model call
    #[error("Input error: {0}")]
    Input(String),

    /// Bad or missing configuration; surfaced before any step runs
    #[error("Configuration error: {0}")]
    Config(String),

    /// A step's model call failed terminally, aborting the remaining steps
    #[error("Step '{step}' failed: {message}")]
    Step { step: String, message: String },

    /// Failure delivering an already-computed result; the result itself
    /// stays valid
    #[error("Output error: {0}")]
    Output(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
