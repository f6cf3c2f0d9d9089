//! Turn surviving key-paths into flat record entries

use crate::error::{ProjectionError, Result, Stage};
use crate::types::{CollisionPolicy, FlatRecord, KeyPath};
use serde_json::Value;
use std::collections::HashMap;

/// Textual rewrite applied to a built flat key
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KeyRewrite {
    pub needle: &'static str,
    pub replacement: &'static str,
}

impl KeyRewrite {
    fn apply(&self, key: String) -> String {
        if key.contains(self.needle) {
            key.replace(self.needle, self.replacement)
        } else {
            key
        }
    }
}

/// Rewrites applied to every flat key, in order
pub const KEY_REWRITES: &[KeyRewrite] = &[
    // Field name exceeds the record store's column name limit
    KeyRewrite {
        needle: "parallelImaging/accelerationFactor/kspace_encoding_step",
        replacement: "parallelImaging/accelerationFactor/kspace_enc_step",
    },
];

/// Build the flat key for a path.
///
/// Index segments only steer navigation; they add nothing to the key.
pub fn flat_key(namespace: &str, path: &KeyPath) -> String {
    let mut key = String::from(namespace);
    for field in path.segments().iter().filter_map(|segment| segment.as_field()) {
        key.push('/');
        key.push_str(field);
    }

    KEY_REWRITES.iter().fold(key, |key, rewrite| rewrite.apply(key))
}

/// Resolve every path and store its leaf under its flat key
pub fn materialize(
    paths: &[KeyPath],
    document: &Value,
    record: &mut FlatRecord,
    namespace: &str,
    collisions: CollisionPolicy,
) -> Result<()> {
    let mut written: HashMap<String, &KeyPath> = HashMap::with_capacity(paths.len());

    for path in paths {
        let key = flat_key(namespace, path);
        let value = path.resolve(document).ok_or_else(|| ProjectionError::Unresolvable {
            path: path.clone(),
            stage: Stage::Materialize,
        })?;

        if let Some(first) = written.insert(key.clone(), path) {
            match collisions {
                CollisionPolicy::LastWriteWins => {
                    tracing::warn!(key = %key, dropped = %first, kept = %path, "flat key collision");
                }
                CollisionPolicy::Reject => {
                    return Err(ProjectionError::KeyCollision {
                        key,
                        first: first.clone(),
                        second: path.clone(),
                    });
                }
            }
        }

        record.insert(key, value.clone());
    }

    Ok(())
}
