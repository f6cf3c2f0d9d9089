//! Leaf path discovery
//!
//! Expands the top-level groups of a header document round by round until
//! every path addresses a scalar.

use crate::error::{ProjectionError, Result, Stage};
use crate::types::{KeyPath, PathList};
use serde_json::Value;

/// Top-level keys that never take part in the projection
fn is_excluded_group(key: &str) -> bool {
    key.starts_with('@') || key.contains("userParameter")
}

/// Enumerate every leaf of `document` as a key-path.
///
/// Each round replaces every path that resolves to a mapping or sequence
/// with its children, in place, so the final order is document pre-order.
/// Fails with `StructuralDepthExceeded` if containers remain after
/// `max_rounds` rounds.
pub fn enumerate(document: &Value, max_rounds: usize) -> Result<PathList> {
    let Value::Object(groups) = document else {
        return Err(ProjectionError::RootNotMapping);
    };

    let mut paths: PathList = groups
        .keys()
        .filter(|key| !is_excluded_group(key))
        .map(|key| KeyPath::root(key.as_str()))
        .collect();

    for round in 1..=max_rounds {
        let (next, expanded) = expand_round(paths, document)?;
        paths = next;
        tracing::trace!(round, paths = paths.len(), expanded, "enumeration round");

        if !expanded {
            return Ok(paths);
        }
    }

    // The last permitted round may have finished the job
    for path in &paths {
        match path.resolve(document) {
            Some(Value::Object(_)) | Some(Value::Array(_)) => {
                return Err(ProjectionError::StructuralDepthExceeded {
                    rounds: max_rounds,
                    path: path.clone(),
                });
            }
            Some(_) => {}
            None => {
                return Err(ProjectionError::Unresolvable {
                    path: path.clone(),
                    stage: Stage::Enumerate,
                });
            }
        }
    }

    Ok(paths)
}

/// Run one expansion round, reporting whether any container was expanded
fn expand_round(paths: PathList, document: &Value) -> Result<(PathList, bool)> {
    let mut next = Vec::with_capacity(paths.len());
    let mut expanded = false;

    for path in paths {
        let Some(node) = path.resolve(document) else {
            return Err(ProjectionError::Unresolvable {
                path,
                stage: Stage::Enumerate,
            });
        };

        match node {
            Value::Object(children) => {
                expanded = true;
                next.extend(children.keys().map(|key| path.child(key)));
            }
            Value::Array(items) => {
                expanded = true;
                for (idx, item) in items.iter().enumerate() {
                    let element = path.element(idx);
                    match item {
                        Value::Object(children) => {
                            next.extend(children.keys().map(|key| element.child(key)));
                        }
                        // Nested sequences are picked up by the next round
                        _ => next.push(element),
                    }
                }
            }
            _ => next.push(path),
        }
    }

    Ok((next, expanded))
}
