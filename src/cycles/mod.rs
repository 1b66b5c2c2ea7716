pub mod finder;
pub mod normalize;
pub mod strategy;

pub use finder::find_cycles;
pub use normalize::{CycleSignature, minimal_cycle, signature};

use std::path::{Path, PathBuf};

/// A closed loop of files `[f0, f1, ..., fn, f0]` where each file statically imports the next.
///
/// Always closed (first == last) with at least two entries; a self-import is `[a, a]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cycle {
    files: Vec<PathBuf>,
}

impl Cycle {
    /// Wrap an already-closed loop. Returns `None` unless the slice is closed and has
    /// no repeated file other than the closing one.
    pub fn new(files: Vec<PathBuf>) -> Option<Self> {
        if files.len() < 2 || files.first() != files.last() {
            return None;
        }
        let members = &files[..files.len() - 1];
        for (i, f) in members.iter().enumerate() {
            if members[i + 1..].contains(f) {
                return None;
            }
        }
        Some(Self { files })
    }

    /// Number of distinct files in the loop.
    pub fn len(&self) -> usize {
        self.files.len() - 1
    }

    /// The closed sequence, closing file included.
    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    /// The distinct members, without the closing repeat.
    pub fn members(&self) -> &[PathBuf] {
        &self.files[..self.files.len() - 1]
    }

    /// The same loop, rotated to start (and end) at `file`.
    pub fn rotated_to(&self, file: &Path) -> Option<Self> {
        let start = self.members().iter().position(|f| f == file)?;
        let mut members = self.members().to_vec();
        members.rotate_left(start);
        members.push(members[0].clone());
        Some(Self { files: members })
    }

    /// `a.ts -> b.ts -> a.ts`, with paths shown relative to `root`.
    pub fn display(&self, root: &Path) -> String {
        self.files
            .iter()
            .map(|f| relative_display(f, root))
            .collect::<Vec<_>>()
            .join(" -> ")
    }
}

/// Show `path` relative to `root` when it lies inside it.
pub fn relative_display(path: &Path, root: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .to_string_lossy()
        .into_owned()
}
