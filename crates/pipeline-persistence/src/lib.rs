//! The Persistence Layer (spec.md §4.4): an atomic Result-JSON writer plus
//! a relational run index.

mod atomic_write;
mod error;
mod result_writer;
mod run_index;

pub use error::PersistenceError;
pub use result_writer::write_result;
pub use run_index::RunIndexStore;
