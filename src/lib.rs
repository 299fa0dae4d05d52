//! agent-pipeline — a multi-stage agent pipeline orchestrator.
//!
//! Routes an [`pipeline_types::Issue`] through `PM → Dev → QA`
//! ([`pipeline_engine`]), fed either by a one-shot CLI invocation, a
//! concurrent folder watcher ([`pipeline_watcher`]), or a JSON-RPC tool
//! server ([`pipeline_rpc`]). All logic lives in this crate and the
//! workspace members it depends on; `src/main.rs` only maps `cli::run()`'s
//! exit code onto the process.

pub mod cli;
pub mod wiring;

pub use wiring::Collaborators;
