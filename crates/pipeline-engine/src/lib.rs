//! The Stage Executor and Pipeline State Machine: the orchestration loop
//! that threads an issue through `LoadIssue → PM → Dev → QA → Finalize`.

pub mod prompts;
mod stage_executor;
mod state_machine;

pub use stage_executor::{execute_dev, execute_pm, execute_qa, ExecutorConfig};
pub use state_machine::{run_pipeline, RunInputs};
