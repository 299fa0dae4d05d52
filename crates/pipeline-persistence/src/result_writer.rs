//! `WriteResult(Result, output_directory) → filename` (spec.md §4.4).

use camino::{Utf8Path, Utf8PathBuf};

use pipeline_types::PipelineResult;

use crate::atomic_write::write_file_atomic;
use crate::error::PersistenceError;

/// Serializes a [`PipelineResult`] to two-space-indented JSON and writes it
/// atomically to `result_{YYYY-MM-DD_HH-MM-SS}_{run_id_prefix}.json` under
/// `output_dir`, returning the filename.
pub fn write_result(result: &PipelineResult, output_dir: &Utf8Path) -> Result<String, PersistenceError> {
    let timestamp = result.timestamp_utc.format("%Y-%m-%d_%H-%M-%S");
    let run_id_prefix: String = result.run_id.chars().take(8).collect();
    let filename = format!("result_{timestamp}_{run_id_prefix}.json");

    let mut buf = Vec::new();
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, serde_json::ser::PrettyFormatter::with_indent(b"  "));
    serde::Serialize::serialize(result, &mut serializer).map_err(|e| PersistenceError::Write(e.to_string()))?;
    let json = String::from_utf8(buf).map_err(|e| PersistenceError::Write(e.to_string()))?;

    let path: Utf8PathBuf = output_dir.join(&filename);
    write_file_atomic(&path, &json)?;

    Ok(filename)
}
