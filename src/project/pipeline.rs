//! The ordered header filter pipeline
//!
//! Order matters: the aggregation passes both write summaries and remove the
//! paths they summarised, so later passes and the materializer never see them.

use crate::error::Result;
use crate::project::rules::SegmentMatch::{AnyIndex, Field, NotIndex};
use crate::project::rules::{Aggregation, FilterPass, PassAction, PathPattern};
use crate::types::{FlatRecord, PathList};
use once_cell::sync::Lazy;
use serde_json::Value;

/// Key below the namespace holding the aggregated coil names
pub const COIL_LABEL_LIST: &str = "acquisitionSystemInformation/coilLabelList";

/// Key below the namespace holding the aggregated waveform types
pub const WAVEFORM_INFORMATION_LIST: &str = "waveformInformationList";

/// Ordered list of filter passes
#[derive(Debug, Clone)]
pub struct FilterPipeline {
    passes: Vec<FilterPass>,
}

impl FilterPipeline {
    pub fn new(passes: Vec<FilterPass>) -> Self {
        FilterPipeline { passes }
    }

    pub fn passes(&self) -> &[FilterPass] {
        &self.passes
    }

    /// Run every pass in order
    pub fn run(
        &self,
        mut paths: PathList,
        document: &Value,
        record: &mut FlatRecord,
        namespace: &str,
    ) -> Result<PathList> {
        for pass in &self.passes {
            paths = pass.apply(paths, document, record, namespace)?;
        }
        Ok(paths)
    }
}

static COIL_LABEL: FilterPass = FilterPass {
    name: "coil-label",
    action: PassAction::Aggregate(Aggregation {
        select: PathPattern(&[
            Field("acquisitionSystemInformation"),
            Field("coilLabel"),
            AnyIndex,
            Field("coilName"),
        ]),
        // Also drops coilNumber and anything else under coilLabel
        remove: PathPattern(&[Field("acquisitionSystemInformation"), Field("coilLabel")]),
        target: COIL_LABEL_LIST,
    }),
};

static WAVEFORM: FilterPass = FilterPass {
    name: "waveform-type",
    action: PassAction::Aggregate(Aggregation {
        select: PathPattern(&[Field("waveformInformation"), AnyIndex, Field("waveformType")]),
        remove: PathPattern(&[Field("waveformInformation")]),
        target: WAVEFORM_INFORMATION_LIST,
    }),
};

static ENCODING: FilterPass = FilterPass {
    name: "encoding",
    action: PassAction::Prune(&[
        PathPattern(&[Field("encoding"), NotIndex(0)]),
        PathPattern(&[Field("encoding"), AnyIndex, Field("trajectoryDescription")]),
        PathPattern(&[
            Field("encoding"),
            AnyIndex,
            Field("multiband"),
            Field("spacing"),
            Field("dZ"),
        ]),
        PathPattern(&[
            Field("encoding"),
            AnyIndex,
            Field("parallelImaging"),
            Field("multiband"),
            Field("spacing"),
            Field("dZ"),
        ]),
    ]),
};

static SEQUENCE_PARAMETERS: FilterPass = FilterPass {
    name: "sequence-parameters",
    action: PassAction::Prune(&[
        PathPattern(&[Field("sequenceParameters"), Field("diffusion")]),
        PathPattern(&[Field("sequenceParameters"), Field("TR"), NotIndex(0)]),
        PathPattern(&[Field("sequenceParameters"), Field("TE"), NotIndex(0)]),
        PathPattern(&[Field("sequenceParameters"), Field("flipAngle_deg"), NotIndex(0)]),
        PathPattern(&[Field("sequenceParameters"), Field("echo_spacing"), NotIndex(0)]),
        PathPattern(&[Field("sequenceParameters"), Field("TI"), NotIndex(0)]),
    ]),
};

static MEASUREMENT_INFORMATION: FilterPass = FilterPass {
    name: "measurement-information",
    action: PassAction::Prune(&[
        PathPattern(&[
            Field("measurementInformation"),
            Field("measurementDependency"),
            NotIndex(0),
        ]),
        PathPattern(&[
            Field("measurementInformation"),
            Field("referencedImageSequence"),
            Field("referencedSOPInstanceUID"),
            NotIndex(0),
        ]),
    ]),
};

static DEFAULT_PIPELINE: Lazy<FilterPipeline> = Lazy::new(|| {
    FilterPipeline::new(vec![
        COIL_LABEL.clone(),
        WAVEFORM.clone(),
        ENCODING.clone(),
        SEQUENCE_PARAMETERS.clone(),
        MEASUREMENT_INFORMATION.clone(),
    ])
});

/// The header pipeline: coil labels, waveform types, encoding,
/// sequence parameters, measurement information
pub fn default_pipeline() -> &'static FilterPipeline {
    &DEFAULT_PIPELINE
}
