use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;

use super::Cycle;

const SIGNATURE_DELIMITER: &str = " -> ";

/// Rotation-invariant identity of a cycle, used to report each loop once per session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct CycleSignature(String);

impl CycleSignature {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CycleSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Cut a raw DFS path down to the loop it ends in.
///
/// The first file that appears twice defines the loop; everything before its first
/// occurrence is the approach path and is dropped. `[x, a, b, c, a]` becomes `[a, b, c, a]`.
pub fn minimal_cycle(path: &[PathBuf]) -> Option<Cycle> {
    let mut first_seen: HashMap<&Path, usize> = HashMap::new();
    for (i, file) in path.iter().enumerate() {
        if let Some(&start) = first_seen.get(file.as_path()) {
            return Cycle::new(path[start..=i].to_vec());
        }
        first_seen.insert(file.as_path(), i);
    }
    None
}

/// Canonical signature: the loop rotated to start at its smallest path, joined with ` -> `.
pub fn signature(cycle: &Cycle) -> CycleSignature {
    let members = cycle.members();
    let start = members
        .iter()
        .enumerate()
        .min_by(|(_, a), (_, b)| a.cmp(b))
        .map(|(i, _)| i)
        .unwrap_or(0);

    let rotated = members[start..].iter().chain(&members[..start]);
    let joined = rotated
        .map(|f| f.to_string_lossy())
        .collect::<Vec<_>>()
        .join(SIGNATURE_DELIMITER);
    CycleSignature(joined)
}
