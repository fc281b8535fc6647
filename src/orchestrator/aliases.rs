//! Origin/destination resolution: thin re-export over the
//! shared airport/city table so the orchestrator reads naturally.

use crate::error::AnalysisError;
use crate::geo::resolve_location;

/// Resolves free-text input to its set of airport codes, failing fast
/// with a structured input error if unresolved.
pub fn resolve(input: &str, field: &str) -> Result<Vec<String>, AnalysisError> {
    resolve_location(input).ok_or_else(|| AnalysisError::input(format!("unresolved {field}: '{input}'")))
}
