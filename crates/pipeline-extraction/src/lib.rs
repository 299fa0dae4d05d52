//! Structured-output extraction from free-form model text.
//!
//! Extracts the first balanced JSON object from a model's raw response,
//! tolerating leading/trailing prose and a surrounding code fence, then
//! validates it against the target stage's schema. Parse or validation
//! failure returns `None`; callers are expected to substitute the
//! documented fallback record rather than treat this as an error: parse
//! failures downgrade to `degraded_output`, not a propagated fault.

mod brace_scan;
mod extract;
mod parser;

pub use extract::extract_json_object;
pub use parser::{parse_dev, parse_pm, parse_qa};
