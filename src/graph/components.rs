use std::collections::HashMap;
use std::path::PathBuf;

use petgraph::Directed;
use petgraph::algo::kosaraju_scc;
use petgraph::graph::{Graph, NodeIndex};
use serde::Serialize;

use super::ImportGraph;
use crate::fs::FileSystem;

/// A strongly connected set of files: every member reaches every other through static imports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImportComponent {
    /// Sorted by path, with the first file repeated at the end.
    pub files: Vec<PathBuf>,
}

impl ImportComponent {
    /// Number of distinct files.
    pub fn len(&self) -> usize {
        self.files.len().saturating_sub(1)
    }
}

/// Every circular component reachable from `files`, using Kosaraju's SCC algorithm
/// over static import edges.
///
/// Components with more than one file are reported, plus single files that import
/// themselves. The result is sorted by the first file of each component.
pub fn find_components<F: FileSystem>(graph: &mut ImportGraph<F>, files: &[PathBuf]) -> Vec<ImportComponent> {
    let mut file_graph: Graph<PathBuf, (), Directed> = Graph::new();
    let mut index: HashMap<PathBuf, NodeIndex> = HashMap::new();
    let mut pending: Vec<PathBuf> = files.to_vec();

    let mut node = |g: &mut Graph<PathBuf, (), Directed>, path: &PathBuf| -> (NodeIndex, bool) {
        if let Some(&idx) = index.get(path) {
            return (idx, false);
        }
        let idx = g.add_node(path.clone());
        index.insert(path.clone(), idx);
        (idx, true)
    };

    for f in files {
        node(&mut file_graph, f);
    }

    // Follow edges out of the walked set so targets outside it still connect.
    while let Some(file) = pending.pop() {
        let (from, _) = node(&mut file_graph, &file);
        for target in graph.static_targets(&file) {
            let (to, added) = node(&mut file_graph, &target);
            if added {
                pending.push(target);
            }
            file_graph.update_edge(from, to, ());
        }
    }

    let mut components: Vec<ImportComponent> = kosaraju_scc(&file_graph)
        .into_iter()
        .filter(|scc| scc.len() > 1 || file_graph.contains_edge(scc[0], scc[0]))
        .map(|scc| {
            let mut paths: Vec<PathBuf> = scc.iter().map(|&i| file_graph[i].clone()).collect();
            paths.sort();
            let first = paths[0].clone();
            paths.push(first);
            ImportComponent { files: paths }
        })
        .collect();

    components.sort_by(|a, b| a.files[0].cmp(&b.files[0]));
    components
}
