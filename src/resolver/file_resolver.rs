use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};

use super::tsconfig::TsconfigPaths;
use crate::fs::FileSystem;

/// Extensions a TypeScript ESM project writes in specifiers while the file on disk is `.ts`.
const RUNTIME_EXTENSIONS: &[&str] = &["js", "jsx", "mjs", "cjs"];

/// A specifier prefix mapped to an absolute base directory (or file, for exact aliases).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alias {
    pub prefix: String,
    pub target: PathBuf,
}

impl Alias {
    pub fn new(prefix: impl Into<String>, target: impl Into<PathBuf>) -> Self {
        Self {
            prefix: prefix.into(),
            target: target.into(),
        }
    }

    /// The part of `specifier` after the alias prefix, if the alias applies.
    ///
    /// A prefix ending in `/` (`@/`) matches anything under it. Any other prefix (`@app`)
    /// matches itself exactly or followed by `/`.
    fn strip<'s>(&self, specifier: &'s str) -> Option<&'s str> {
        if self.prefix.ends_with('/') {
            return specifier.strip_prefix(self.prefix.as_str());
        }
        let rest = specifier.strip_prefix(self.prefix.as_str())?;
        if rest.is_empty() {
            Some(rest)
        } else {
            rest.strip_prefix('/')
        }
    }
}

/// Resolves import specifiers to files, memoizing every existence check.
///
/// Owned by one analysis session; not shared between sessions.
pub struct ImportResolver {
    /// Probed in order when the literal path does not exist, e.g. `.ts`.
    extensions: Vec<String>,
    /// Barrel/index file names probed inside a directory, e.g. `index.ts`.
    index_files: Vec<String>,
    /// Sorted longest prefix first.
    aliases: Vec<Alias>,
    /// Consulted for non-relative specifiers no alias matched.
    tsconfig: Option<TsconfigPaths>,
    exists_cache: HashMap<PathBuf, bool>,
}

impl ImportResolver {
    pub fn new(extensions: Vec<String>, index_files: Vec<String>, mut aliases: Vec<Alias>) -> Self {
        // Longest prefix wins; ties keep their precedence order.
        aliases.sort_by(|a, b| b.prefix.len().cmp(&a.prefix.len()));
        Self {
            extensions,
            index_files,
            aliases,
            tsconfig: None,
            exists_cache: HashMap::new(),
        }
    }

    pub fn set_tsconfig(&mut self, tsconfig: TsconfigPaths) {
        self.tsconfig = Some(tsconfig);
    }

    /// Resolve `specifier` as written in `from_file`.
    ///
    /// Returns `None` for bare package names, absolute paths, and anything that does not
    /// land on an existing file. External packages never enter the import graph.
    pub fn resolve<F: FileSystem>(&mut self, fs: &F, specifier: &str, from_file: &Path) -> Option<PathBuf> {
        if is_relative_specifier(specifier) {
            let dir = from_file.parent()?;
            return self.probe(fs, &normalize_path(&dir.join(specifier)));
        }

        let aliased = self
            .aliases
            .iter()
            .find_map(|alias| alias.strip(specifier).map(|rest| (alias.target.clone(), rest)));
        if let Some((base, rest)) = aliased {
            let candidate = if rest.is_empty() { base } else { base.join(rest) };
            return self.probe(fs, &normalize_path(&candidate));
        }

        if specifier.starts_with('/') {
            return None;
        }
        let target = normalize_path(&self.tsconfig.as_ref()?.resolve(from_file, specifier)?);
        exists(&mut self.exists_cache, fs, &target).then_some(target)
    }

    /// Number of distinct paths checked so far.
    #[cfg(test)]
    pub fn probed_paths(&self) -> usize {
        self.exists_cache.len()
    }

    fn probe<F: FileSystem>(&mut self, fs: &F, base: &Path) -> Option<PathBuf> {
        let cache = &mut self.exists_cache;
        if exists(cache, fs, base) {
            return Some(base.to_path_buf());
        }

        let base_str = base.to_string_lossy();
        let with_extension = self
            .extensions
            .iter()
            .map(|ext| PathBuf::from(format!("{base_str}{ext}")))
            .find(|candidate| exists(cache, fs, candidate));
        if with_extension.is_some() {
            return with_extension;
        }

        // `./foo.js` written in TypeScript source for a `foo.ts` on disk.
        let runtime_ext = base
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| RUNTIME_EXTENSIONS.contains(&e));
        if runtime_ext {
            let swapped = self
                .extensions
                .iter()
                .map(|ext| base.with_extension(ext.trim_start_matches('.')))
                .find(|candidate| candidate != base && exists(cache, fs, candidate));
            if swapped.is_some() {
                return swapped;
            }
        }

        self.index_files
            .iter()
            .map(|index| base.join(index))
            .find(|candidate| exists(cache, fs, candidate))
    }
}

fn exists<F: FileSystem>(cache: &mut HashMap<PathBuf, bool>, fs: &F, path: &Path) -> bool {
    if let Some(&known) = cache.get(path) {
        return known;
    }
    let found = fs.exists(path);
    cache.insert(path.to_path_buf(), found);
    found
}

/// `./x`, `../x`, `.` and `..`.
pub fn is_relative_specifier(specifier: &str) -> bool {
    specifier == "."
        || specifier == ".."
        || specifier.starts_with("./")
        || specifier.starts_with("../")
}

/// Remove `.` and `..` components without touching the filesystem.
///
/// `..` at the root is dropped, matching how the OS treats `/..`.
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                let popped = matches!(out.components().next_back(), Some(Component::Normal(_)));
                if popped {
                    out.pop();
                } else if !out.has_root() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}
