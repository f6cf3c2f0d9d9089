//! # mrd-flatten - MRD header projection
//!
//! Projects a validated, arbitrarily nested MRD header document into a flat
//! mapping from `/`-joined paths to scalar values, ready for bulk ingestion
//! by a record store whose field model is flat.
//!
//! ## Modules
//!
//! - **project**: enumerate leaves, filter repeated groups, materialize keys
//! - **source**: turn raw header bytes into a validated document
//!
//! ## Quick Start
//!
//! ```rust
//! use mrd_flatten::{HeaderProjector, ProjectionConfig};
//! use serde_json::json;
//!
//! # fn main() -> Result<(), mrd_flatten::ProjectionError> {
//! let header = json!({
//!     "experimentalConditions": {"H1resonanceFrequency_Hz": 63642459},
//!     "encoding": [{"trajectory": "cartesian"}],
//!     "sequenceParameters": {"TR": [4.5, 5.0]}
//! });
//!
//! let projector = HeaderProjector::new(ProjectionConfig::default());
//! let record = projector.project(&header)?;
//!
//! assert_eq!(record.get("mrd:mrdScanData/encoding/trajectory").unwrap(), "cartesian");
//! assert_eq!(record.get("mrd:mrdScanData/sequenceParameters/TR").unwrap(), 4.5);
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod project;
pub mod source;
pub mod types;

// Re-export commonly used types for convenience
pub use error::{ProjectionError, Stage};
pub use project::{HeaderProjector, RecordSink, RecordWriter};
pub use source::{HeaderSource, JsonHeaderSource};
pub use types::{
    CollisionPolicy, FlatRecord, KeyPath, PathList, ProjectionConfig, RecordHandle, Segment,
    NAMESPACE,
};

/// Main entry point: validate a raw header and project it into a flat record.
///
/// Validation failures are returned untouched and no projection work is done.
pub fn project_header<S: HeaderSource + ?Sized>(
    source: &S,
    raw: &[u8],
    config: ProjectionConfig,
) -> error::Result<FlatRecord> {
    let document = source.validate_and_parse(raw)?;
    HeaderProjector::new(config).project(&document)
}
