use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::fs::FileSystem;
use crate::graph::ImportGraph;

/// Result of one bounded depth-first search.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CycleSearch {
    /// Raw DFS paths, each ending in a file that already appears earlier in it.
    /// The approach to the loop is still included; see [`super::minimal_cycle`].
    pub paths: Vec<Vec<PathBuf>>,
    /// Some branch was cut at `max_depth`, so loops longer than that may be missing.
    pub truncated: bool,
}

/// Depth-first search for cycles reachable from `start` over static imports.
///
/// Each file is expanded at most once, so the search is linear in the reachable
/// graph. Targets are visited in source order, which makes the result deterministic.
/// With `find_all` unset the search stops at the first loop it closes.
pub fn find_cycles<F: FileSystem>(
    graph: &mut ImportGraph<F>,
    start: &Path,
    max_depth: usize,
    find_all: bool,
) -> CycleSearch {
    let mut search = Search {
        graph,
        max_depth,
        find_all,
        path: Vec::new(),
        visited: HashSet::new(),
        result: CycleSearch::default(),
        done: false,
    };
    search.visit(start.to_path_buf());
    search.result
}

struct Search<'g, F> {
    graph: &'g mut ImportGraph<F>,
    max_depth: usize,
    find_all: bool,
    path: Vec<PathBuf>,
    visited: HashSet<PathBuf>,
    result: CycleSearch,
    done: bool,
}

impl<F: FileSystem> Search<'_, F> {
    fn visit(&mut self, file: PathBuf) {
        if self.path.len() > self.max_depth {
            self.result.truncated = true;
            return;
        }
        if !self.visited.insert(file.clone()) {
            return;
        }

        let targets = self.graph.static_targets(&file);
        self.path.push(file);

        for target in targets {
            if self.path.contains(&target) {
                let mut found = self.path.clone();
                found.push(target);
                if !self.result.paths.contains(&found) {
                    self.result.paths.push(found);
                }
                if !self.find_all {
                    self.done = true;
                }
            } else {
                self.visit(target);
            }
            if self.done {
                break;
            }
        }

        self.path.pop();
    }
}
