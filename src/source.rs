//! Header input boundary
//!
//! A header source turns raw header bytes into a validated nested document.
//! Nothing is projected unless validation succeeds.

use crate::error::{ProjectionError, Result};
use serde_json::Value;

/// Groups the ISMRMRD header schema requires at the top level
pub const REQUIRED_GROUPS: &[&str] = &["experimentalConditions", "encoding"];

/// Produces a validated nested document from raw header bytes
pub trait HeaderSource {
    fn validate_and_parse(&self, raw: &[u8]) -> Result<Value>;
}

/// Reads headers already converted to their JSON dictionary form
#[derive(Debug, Clone)]
pub struct JsonHeaderSource {
    required: Vec<String>,
}

impl JsonHeaderSource {
    pub fn new() -> Self {
        JsonHeaderSource {
            required: REQUIRED_GROUPS.iter().map(|g| g.to_string()).collect(),
        }
    }

    /// Replace the mandatory top-level groups
    pub fn with_required<I, S>(mut self, groups: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.required = groups.into_iter().map(Into::into).collect();
        self
    }

    pub fn required(&self) -> &[String] {
        &self.required
    }
}

impl Default for JsonHeaderSource {
    fn default() -> Self {
        JsonHeaderSource::new()
    }
}

impl HeaderSource for JsonHeaderSource {
    fn validate_and_parse(&self, raw: &[u8]) -> Result<Value> {
        // simd-json parses in place
        let mut buffer = raw.to_vec();
        let document: Value = simd_json::serde::from_slice(&mut buffer)
            .map_err(|e| ProjectionError::SchemaValidation(format!("malformed header: {}", e)))?;

        let Value::Object(groups) = &document else {
            return Err(ProjectionError::SchemaValidation(
                "header root must be an element mapping".to_string(),
            ));
        };

        if let Some(missing) = self.required.iter().find(|group| !groups.contains_key(group.as_str())) {
            return Err(ProjectionError::SchemaValidation(format!(
                "missing required group `{}`",
                missing
            )));
        }

        Ok(document)
    }
}
