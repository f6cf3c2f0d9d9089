//! Header projection - flatten a nested header into a flat record
//!
//! The projection runs in three stages:
//!
//! 1. `enumerate` discovers every leaf of the document as a key-path
//! 2. the filter pipeline prunes and aggregates repeated groups
//! 3. `materialize` turns the surviving paths into namespaced flat keys
//!
//! `HeaderProjector` strings the stages together.

pub mod enumerate;
pub mod rules;
pub mod pipeline;
pub mod materialize;
pub mod projector;
pub mod writer;

pub use enumerate::enumerate;
pub use rules::{Aggregation, FilterPass, PassAction, PathPattern, SegmentMatch};
pub use pipeline::{default_pipeline, FilterPipeline};
pub use materialize::{flat_key, materialize, KeyRewrite};
pub use projector::HeaderProjector;
pub use writer::{RecordSink, RecordWriter};
