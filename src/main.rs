//! agent-pipeline CLI binary
//!
//! This is the minimal entrypoint; all logic lives in the library. `main.rs`
//! only maps `cli::run()`'s outcome to a process exit code (spec.md §6).

fn main() {
    let exit_code = agent_pipeline::cli::run();
    std::process::exit(exit_code);
}
