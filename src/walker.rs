use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::config::IgnoreMatcher;
use crate::parser::languages::SOURCE_EXTENSIONS;

/// Walk a project directory and collect every parseable source file, sorted by path.
///
/// Respects `.gitignore` rules (also outside a git repository), always excludes
/// `node_modules`, and drops anything matched by the configured ignore patterns.
pub fn walk_project(root: &Path, ignore: &IgnoreMatcher) -> anyhow::Result<Vec<PathBuf>> {
    if !root.is_dir() {
        anyhow::bail!("{} is not a directory", root.display());
    }

    let walker = ignore::WalkBuilder::new(root)
        .standard_filters(true)
        // Read .gitignore files even when the directory is not inside a git repository.
        .require_git(false)
        .build();

    let mut files = Vec::new();
    for result in walker {
        let entry = match result {
            Ok(e) => e,
            Err(err) => {
                warn!(%err, "skipping unreadable entry");
                continue;
            }
        };

        let path = entry.path();
        if entry.file_type().map(|ft| ft.is_dir()).unwrap_or(false) {
            continue;
        }
        if path_contains_node_modules(path) {
            continue;
        }

        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        if !SOURCE_EXTENSIONS.contains(&ext) {
            continue;
        }
        if ignore.is_ignored(path) {
            debug!(file = %path.display(), "ignored by pattern");
            continue;
        }

        files.push(path.to_path_buf());
    }

    files.sort();
    Ok(files)
}

/// Returns true if any component of `path` is named `node_modules`.
fn path_contains_node_modules(path: &Path) -> bool {
    path.components()
        .any(|c| c.as_os_str().to_str().is_some_and(|s| s == "node_modules"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn tmp() -> TempDir {
        tempfile::tempdir().expect("tempdir")
    }

    fn names(files: &[PathBuf], root: &Path) -> Vec<String> {
        files
            .iter()
            .map(|f| f.strip_prefix(root).unwrap().to_string_lossy().replace('\\', "/"))
            .collect()
    }

    #[test]
    fn test_walk_project_returns_only_source_files_sorted() {
        let dir = tmp();
        fs::create_dir_all(dir.path().join("src")).unwrap();
        fs::write(dir.path().join("src/b.ts"), "").unwrap();
        fs::write(dir.path().join("src/a.tsx"), "").unwrap();
        fs::write(dir.path().join("src/c.mjs"), "").unwrap();
        fs::write(dir.path().join("README.md"), "# Hello").unwrap();
        fs::write(dir.path().join("main.rs"), "fn main() {}").unwrap();

        let ignore = IgnoreMatcher::new(dir.path(), &[]).unwrap();
        let files = walk_project(dir.path(), &ignore).unwrap();
        assert_eq!(names(&files, dir.path()), vec!["src/a.tsx", "src/b.ts", "src/c.mjs"]);
    }

    #[test]
    fn test_walk_project_excludes_node_modules() {
        let dir = tmp();
        let nm = dir.path().join("node_modules").join("pkg");
        fs::create_dir_all(&nm).unwrap();
        fs::write(nm.join("index.js"), "").unwrap();
        fs::write(dir.path().join("app.ts"), "").unwrap();

        let ignore = IgnoreMatcher::new(dir.path(), &[]).unwrap();
        let files = walk_project(dir.path(), &ignore).unwrap();
        assert_eq!(names(&files, dir.path()), vec!["app.ts"]);
    }

    #[test]
    fn test_walk_project_honours_gitignore_and_patterns() {
        let dir = tmp();
        fs::create_dir_all(dir.path().join("dist")).unwrap();
        fs::create_dir_all(dir.path().join("src")).unwrap();
        fs::write(dir.path().join(".gitignore"), "dist/\n").unwrap();
        fs::write(dir.path().join("dist/bundle.js"), "").unwrap();
        fs::write(dir.path().join("src/app.ts"), "").unwrap();
        fs::write(dir.path().join("src/app.test.ts"), "").unwrap();

        let ignore = IgnoreMatcher::new(dir.path(), &["*.test.ts".to_string()]).unwrap();
        let files = walk_project(dir.path(), &ignore).unwrap();
        assert_eq!(names(&files, dir.path()), vec!["src/app.ts"]);
    }

    #[test]
    fn test_walk_project_rejects_missing_root() {
        let dir = tmp();
        let missing = dir.path().join("nope");
        let ignore = IgnoreMatcher::new(&missing, &[]).unwrap();
        assert!(walk_project(&missing, &ignore).is_err());
    }
}
