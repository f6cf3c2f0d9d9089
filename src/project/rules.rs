//! Declarative filter rules
//!
//! A filter pass is a named list of path patterns plus the action taken on
//! the paths they select. Patterns match by prefix, so a pattern naming a
//! group selects everything below it.

use crate::error::{ProjectionError, Result, Stage};
use crate::types::{FlatRecord, KeyPath, PathList, Segment};
use serde_json::Value;

/// Aggregated strings longer than this many chars are truncated
pub const MAX_AGGREGATE_CHARS: usize = 255;

/// Chars kept from an over-long aggregate before the suffix
pub const TRUNCATED_PREFIX_CHARS: usize = 243;

pub const TRUNCATION_SUFFIX: &str = " (truncated)";

/// Matcher for a single path segment
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SegmentMatch {
    /// A field with exactly this name
    Field(&'static str),
    /// Any sequence index
    AnyIndex,
    /// Any segment except the given sequence index
    NotIndex(usize),
}

impl SegmentMatch {
    fn matches(&self, segment: &Segment) -> bool {
        match (self, segment) {
            (SegmentMatch::Field(name), Segment::Field(field)) => field.as_str() == *name,
            (SegmentMatch::Field(_), Segment::Index(_)) => false,
            (SegmentMatch::AnyIndex, segment) => segment.as_index().is_some(),
            (SegmentMatch::NotIndex(idx), segment) => segment.as_index() != Some(*idx),
        }
    }
}

/// Prefix pattern over key-path segments
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PathPattern(pub &'static [SegmentMatch]);

impl PathPattern {
    /// True when the path is at least as long as the pattern and every
    /// leading segment matches
    pub fn matches(&self, path: &KeyPath) -> bool {
        let segments = path.segments();
        segments.len() >= self.0.len()
            && self
                .0
                .iter()
                .zip(segments)
                .all(|(matcher, segment)| matcher.matches(segment))
    }
}

/// Collapse a repeated group into a single summary string
#[derive(Debug, Clone)]
pub struct Aggregation {
    /// Leaves whose values are concatenated, in path order
    pub select: PathPattern,
    /// Paths dropped once the summary is written
    pub remove: PathPattern,
    /// Key (below the namespace) the summary is stored under
    pub target: &'static str,
}

/// What a filter pass does with the paths its patterns select
#[derive(Debug, Clone)]
pub enum PassAction {
    Aggregate(Aggregation),
    /// Drop every path matching any of the patterns
    Prune(&'static [PathPattern]),
}

/// One named step of the filter pipeline
#[derive(Debug, Clone)]
pub struct FilterPass {
    pub name: &'static str,
    pub action: PassAction,
}

impl FilterPass {
    /// Apply the pass, writing any aggregate straight into `record`
    pub fn apply(
        &self,
        paths: PathList,
        document: &Value,
        record: &mut FlatRecord,
        namespace: &str,
    ) -> Result<PathList> {
        let before = paths.len();

        let kept: PathList = match &self.action {
            PassAction::Aggregate(aggregation) => {
                let mut summary = String::new();
                for path in paths.iter().filter(|path| aggregation.select.matches(path)) {
                    let value = path.resolve(document).ok_or_else(|| ProjectionError::Unresolvable {
                        path: path.clone(),
                        stage: Stage::Filter,
                    })?;
                    summary.push_str(&coerce_to_string(value));
                    summary.push(' ');
                }

                record.insert(
                    format!("{}/{}", namespace, aggregation.target),
                    Value::String(truncate_aggregate(summary)),
                );

                paths
                    .into_iter()
                    .filter(|path| !aggregation.remove.matches(path))
                    .collect()
            }
            PassAction::Prune(patterns) => paths
                .into_iter()
                .filter(|path| !patterns.iter().any(|pattern| pattern.matches(path)))
                .collect(),
        };

        tracing::debug!(pass = self.name, removed = before - kept.len(), "filter pass applied");
        Ok(kept)
    }
}

/// Render a leaf the way it reads in the header: strings verbatim,
/// everything else in its JSON text form
pub fn coerce_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Cap an aggregate at `MAX_AGGREGATE_CHARS`, marking the cut
pub fn truncate_aggregate(value: String) -> String {
    if value.chars().count() <= MAX_AGGREGATE_CHARS {
        return value;
    }

    let mut truncated: String = value.chars().take(TRUNCATED_PREFIX_CHARS).collect();
    truncated.push_str(TRUNCATION_SUFFIX);
    truncated
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn path(segments: &[Segment]) -> KeyPath {
        KeyPath(segments.to_vec())
    }

    fn f(name: &str) -> Segment {
        Segment::Field(name.to_string())
    }

    #[test]
    fn test_pattern_prefix_matching() {
        const TR_REPEATS: PathPattern = PathPattern(&[
            SegmentMatch::Field("sequenceParameters"),
            SegmentMatch::Field("TR"),
            SegmentMatch::NotIndex(0),
        ]);

        assert!(TR_REPEATS.matches(&path(&[f("sequenceParameters"), f("TR"), Segment::Index(2)])));
        assert!(!TR_REPEATS.matches(&path(&[f("sequenceParameters"), f("TR"), Segment::Index(0)])));
        // Scalar TR has no index segment to match
        assert!(!TR_REPEATS.matches(&path(&[f("sequenceParameters"), f("TR")])));
        assert!(!TR_REPEATS.matches(&path(&[f("sequenceParameters"), f("TE"), Segment::Index(1)])));
    }

    #[test]
    fn test_any_index_rejects_fields() {
        const WAVEFORM: PathPattern = PathPattern(&[
            SegmentMatch::Field("waveformInformation"),
            SegmentMatch::AnyIndex,
            SegmentMatch::Field("waveformType"),
        ]);

        assert!(WAVEFORM.matches(&path(&[f("waveformInformation"), Segment::Index(3), f("waveformType")])));
        assert!(!WAVEFORM.matches(&path(&[f("waveformInformation"), f("x"), f("waveformType")])));
    }

    #[test]
    fn test_truncation_law() {
        let short = "a".repeat(MAX_AGGREGATE_CHARS);
        assert_eq!(truncate_aggregate(short.clone()), short);

        let long = "b".repeat(MAX_AGGREGATE_CHARS + 1);
        let truncated = truncate_aggregate(long);
        assert_eq!(truncated, format!("{}{}", "b".repeat(243), " (truncated)"));
        assert_eq!(truncated.chars().count(), 255);
    }

    #[test]
    fn test_truncation_counts_chars_not_bytes() {
        // 200 two-byte chars: 400 bytes but under the char limit
        let umlauts = "ü".repeat(200);
        assert_eq!(truncate_aggregate(umlauts.clone()), umlauts);

        let many = "ü".repeat(300);
        let truncated = truncate_aggregate(many);
        assert!(truncated.starts_with(&"ü".repeat(243)));
        assert!(truncated.ends_with(TRUNCATION_SUFFIX));
    }

    #[test]
    fn test_coerce_to_string() {
        assert_eq!(coerce_to_string(&json!("Body")), "Body");
        assert_eq!(coerce_to_string(&json!(1.5)), "1.5");
        assert_eq!(coerce_to_string(&json!(true)), "true");
        assert_eq!(coerce_to_string(&json!(null)), "null");
    }

    #[test]
    fn test_aggregate_pass_writes_and_removes() {
        let doc = json!({"waveformInformation": [
            {"waveformName": "ecg", "waveformType": "ecg"},
            {"waveformName": "resp", "waveformType": "respiratory"}
        ]});
        let pass = FilterPass {
            name: "waveform",
            action: PassAction::Aggregate(Aggregation {
                select: PathPattern(&[
                    SegmentMatch::Field("waveformInformation"),
                    SegmentMatch::AnyIndex,
                    SegmentMatch::Field("waveformType"),
                ]),
                remove: PathPattern(&[SegmentMatch::Field("waveformInformation")]),
                target: "waveformInformationList",
            }),
        };
        let paths = vec![
            path(&[f("waveformInformation"), Segment::Index(0), f("waveformName")]),
            path(&[f("waveformInformation"), Segment::Index(0), f("waveformType")]),
            path(&[f("waveformInformation"), Segment::Index(1), f("waveformName")]),
            path(&[f("waveformInformation"), Segment::Index(1), f("waveformType")]),
        ];

        let mut record = FlatRecord::new();
        let kept = pass.apply(paths, &doc, &mut record, "ns").unwrap();

        assert!(kept.is_empty());
        assert_eq!(record.get("ns/waveformInformationList").unwrap(), "ecg respiratory ");
    }

    #[test]
    fn test_aggregate_of_nothing_is_empty_string() {
        let pass = FilterPass {
            name: "empty",
            action: PassAction::Aggregate(Aggregation {
                select: PathPattern(&[SegmentMatch::Field("missing")]),
                remove: PathPattern(&[SegmentMatch::Field("missing")]),
                target: "summary",
            }),
        };
        let mut record = FlatRecord::new();
        let kept = pass.apply(vec![path(&[f("other")])], &json!({"other": 1}), &mut record, "ns").unwrap();

        assert_eq!(kept.len(), 1);
        assert_eq!(record.get("ns/summary").unwrap(), "");
    }

    #[test]
    fn test_unresolvable_selected_path_is_an_error() {
        let pass = FilterPass {
            name: "broken",
            action: PassAction::Aggregate(Aggregation {
                select: PathPattern(&[SegmentMatch::Field("gone")]),
                remove: PathPattern(&[SegmentMatch::Field("gone")]),
                target: "summary",
            }),
        };
        let mut record = FlatRecord::new();
        let err = pass.apply(vec![path(&[f("gone")])], &json!({}), &mut record, "ns").unwrap_err();

        assert!(matches!(err, ProjectionError::Unresolvable { stage: Stage::Filter, .. }));
    }
}
