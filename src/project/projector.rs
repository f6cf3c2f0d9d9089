use crate::error::Result;
use crate::project::enumerate::enumerate;
use crate::project::materialize::materialize;
use crate::project::pipeline::{default_pipeline, FilterPipeline, COIL_LABEL_LIST};
use crate::types::{FlatRecord, PathList, ProjectionConfig, NAMESPACE};
use serde_json::Value;

/// Projects a validated header document into a flat record
pub struct HeaderProjector {
    config: ProjectionConfig,
    pipeline: &'static FilterPipeline,
}

impl HeaderProjector {
    pub fn new(config: ProjectionConfig) -> Self {
        HeaderProjector {
            config,
            pipeline: default_pipeline(),
        }
    }

    pub fn config(&self) -> &ProjectionConfig {
        &self.config
    }

    /// Enumerate and filter, returning the paths that would be materialized
    /// together with the record as the filter passes left it
    pub fn surviving_paths(&self, document: &Value) -> Result<(PathList, FlatRecord)> {
        let mut record = FlatRecord::new();
        if self.config.datatype_marker {
            record.insert("scans", Value::String(NAMESPACE.to_string()));
        }

        let paths = enumerate(document, self.config.max_rounds)?;
        let enumerated = paths.len();
        let paths = self.pipeline.run(paths, document, &mut record, NAMESPACE)?;
        tracing::debug!(enumerated, surviving = paths.len(), "header paths filtered");

        Ok((paths, record))
    }

    /// Project a header document into a flat record
    pub fn project(&self, document: &Value) -> Result<FlatRecord> {
        let (paths, mut record) = self.surviving_paths(document)?;
        materialize(&paths, document, &mut record, NAMESPACE, self.config.collisions)?;

        // Placeholder kept until the record store fills coil labels itself
        if let Some(placeholder) = &self.config.coil_label_placeholder {
            record.insert(
                format!("{}/{}", NAMESPACE, COIL_LABEL_LIST),
                Value::String(placeholder.clone()),
            );
        }

        Ok(record)
    }
}

impl Default for HeaderProjector {
    fn default() -> Self {
        HeaderProjector::new(ProjectionConfig::default())
    }
}
