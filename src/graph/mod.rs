pub mod components;

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use rayon::prelude::*;
use serde::Serialize;
use tracing::debug;

use crate::config::IgnoreMatcher;
use crate::fs::FileSystem;
use crate::parser::imports::{ImportInfo, ImportKind};
use crate::parser::parse_imports;
use crate::resolver::{ImportResolver, normalize_path};

/// A resolved import: `from_file` pulls in `to_file` through `specifier`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImportEdge {
    pub from_file: PathBuf,
    pub to_file: PathBuf,
    pub specifier: String,
    pub kind: ImportKind,
    pub type_only: bool,
    /// 1-based position of the import statement in `from_file`.
    pub line: usize,
    pub column: usize,
}

impl ImportEdge {
    /// Dynamic `import()` edges never form cycles.
    pub fn is_dynamic(&self) -> bool {
        self.kind.is_dynamic()
    }
}

/// Everything one file imports, split into edges that landed on a project file and
/// specifiers that did not (packages, missing files, ignored files).
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FileImports {
    /// Source order.
    pub edges: Vec<ImportEdge>,
    pub unresolved: Vec<ImportInfo>,
}

impl FileImports {
    pub fn static_edges(&self) -> impl Iterator<Item = &ImportEdge> {
        self.edges.iter().filter(|e| !e.is_dynamic())
    }

    /// No static import of this file (resolved or not) loads a value at runtime.
    pub fn is_type_only(&self) -> bool {
        self.static_edges().all(|e| e.type_only)
            && self
                .unresolved
                .iter()
                .filter(|i| !i.kind.is_dynamic())
                .all(|i| i.type_only)
    }
}

/// Lazily built file-level import graph.
///
/// A file is read, parsed, and resolved the first time it is asked about; the result
/// is cached for the lifetime of the graph. Nodes are normalized absolute paths.
pub struct ImportGraph<F> {
    fs: F,
    resolver: ImportResolver,
    ignore: IgnoreMatcher,
    cache: HashMap<PathBuf, Arc<FileImports>>,
}

impl<F: FileSystem> ImportGraph<F> {
    pub fn new(fs: F, resolver: ImportResolver, ignore: IgnoreMatcher) -> Self {
        Self {
            fs,
            resolver,
            ignore,
            cache: HashMap::new(),
        }
    }

    /// The imports of `file`, computing them on first use.
    ///
    /// A file that cannot be read or parsed has no imports.
    pub fn imports(&mut self, file: &Path) -> Arc<FileImports> {
        let key = normalize_path(file);
        if let Some(cached) = self.cache.get(&key) {
            return Arc::clone(cached);
        }
        let infos = read_imports(&self.fs, &key);
        self.insert(key, infos)
    }

    /// Distinct targets of `file`'s static edges, in source order.
    pub fn static_targets(&mut self, file: &Path) -> Vec<PathBuf> {
        let imports = self.imports(file);
        let mut targets: Vec<PathBuf> = Vec::new();
        for edge in imports.static_edges() {
            if !targets.contains(&edge.to_file) {
                targets.push(edge.to_file.clone());
            }
        }
        targets
    }

    /// The first static import in `from` that lands on `to`.
    pub fn first_static_edge(&mut self, from: &Path, to: &Path) -> Option<ImportEdge> {
        self.imports(from)
            .static_edges()
            .find(|e| e.to_file == to)
            .cloned()
    }

    pub fn is_ignored(&self, file: &Path) -> bool {
        self.ignore.is_ignored(file)
    }

    pub fn resolver_mut(&mut self) -> &mut ImportResolver {
        &mut self.resolver
    }

    /// Number of files read so far.
    pub fn file_count(&self) -> usize {
        self.cache.len()
    }

    fn insert(&mut self, file: PathBuf, infos: Vec<ImportInfo>) -> Arc<FileImports> {
        let mut imports = FileImports::default();
        for info in infos {
            match self.resolver.resolve(&self.fs, &info.specifier, &file) {
                Some(target) if !self.ignore.is_ignored(&target) => imports.edges.push(ImportEdge {
                    from_file: file.clone(),
                    to_file: target,
                    specifier: info.specifier,
                    kind: info.kind,
                    type_only: info.type_only,
                    line: info.line,
                    column: info.column,
                }),
                _ => imports.unresolved.push(info),
            }
        }

        let imports = Arc::new(imports);
        self.cache.insert(file, Arc::clone(&imports));
        imports
    }
}

impl<F: FileSystem + Sync> ImportGraph<F> {
    /// Read and parse `files` in parallel, then resolve them on the calling thread.
    ///
    /// Later `imports` calls for these files are cache hits.
    pub fn preload(&mut self, files: &[PathBuf]) {
        let pending: Vec<PathBuf> = files
            .iter()
            .map(|f| normalize_path(f))
            .filter(|f| !self.cache.contains_key(f))
            .collect();

        let fs = &self.fs;
        let parsed: Vec<(PathBuf, Vec<ImportInfo>)> = pending
            .into_par_iter()
            .map(|file| {
                let infos = read_imports(fs, &file);
                (file, infos)
            })
            .collect();

        debug!(files = parsed.len(), "preloaded imports");
        for (file, infos) in parsed {
            if !self.cache.contains_key(&file) {
                self.insert(file, infos);
            }
        }
    }
}

fn read_imports<F: FileSystem>(fs: &F, file: &Path) -> Vec<ImportInfo> {
    let source = match fs.read_to_string(file) {
        Ok(source) => source,
        Err(err) => {
            debug!(file = %file.display(), %err, "unreadable file treated as having no imports");
            return Vec::new();
        }
    };
    match parse_imports(file, &source) {
        Ok(infos) => infos,
        Err(err) => {
            debug!(file = %file.display(), %err, "unparsable file treated as having no imports");
            Vec::new()
        }
    }
}
