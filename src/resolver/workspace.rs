use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tracing::debug;

use super::file_resolver::Alias;

/// Discover workspace packages for npm/yarn/pnpm monorepos.
///
/// Returns a map from package name (e.g. `"@myorg/utils"`) to the package's source directory
/// (prefers `<pkg>/src/` when it exists, otherwise `<pkg>/` root). Returns an empty map when
/// no workspace configuration is found.
pub fn discover_workspace_packages(root: &Path) -> BTreeMap<String, PathBuf> {
    let mut result = BTreeMap::new();

    for pattern in read_workspace_globs(root) {
        let full_pattern = format!("{}/{}/package.json", root.display(), pattern);
        let Ok(paths) = glob::glob(&full_pattern) else {
            debug!(pattern = %full_pattern, "invalid workspace glob");
            continue;
        };
        for pkg_json_path in paths.flatten() {
            let Some(pkg_dir) = pkg_json_path.parent() else {
                continue;
            };
            let Ok(content) = std::fs::read_to_string(&pkg_json_path) else {
                continue;
            };
            let Ok(json) = serde_json::from_str::<serde_json::Value>(&content) else {
                debug!(path = %pkg_json_path.display(), "unparsable package.json");
                continue;
            };
            if let Some(name) = json["name"].as_str() {
                let src = pkg_dir.join("src");
                let target = if src.is_dir() { src } else { pkg_dir.to_path_buf() };
                result.insert(name.to_owned(), target);
            }
        }
    }

    result
}

/// Workspace packages as resolver aliases: `@myorg/utils/x` → `<pkg>/src/x`.
pub fn workspace_aliases(root: &Path) -> Vec<Alias> {
    discover_workspace_packages(root)
        .into_iter()
        .map(|(name, dir)| Alias::new(name, dir))
        .collect()
}

/// Read workspace glob patterns from the project root.
///
/// Checks for pnpm-workspace.yaml first; falls back to package.json workspaces field
/// (either a flat list or `{ "packages": [...] }`).
fn read_workspace_globs(root: &Path) -> Vec<String> {
    let pnpm_yaml = root.join("pnpm-workspace.yaml");
    if let Ok(content) = std::fs::read_to_string(&pnpm_yaml) {
        return parse_pnpm_workspace_yaml(&content);
    }

    let pkg_json = root.join("package.json");
    let Ok(content) = std::fs::read_to_string(&pkg_json) else {
        return vec![];
    };
    let Ok(json) = serde_json::from_str::<serde_json::Value>(&content) else {
        return vec![];
    };
    let workspaces = &json["workspaces"];
    let list = workspaces
        .as_array()
        .or_else(|| workspaces["packages"].as_array());
    list.map(|arr| arr.iter().filter_map(|v| v.as_str().map(String::from)).collect())
        .unwrap_or_default()
}

/// Minimal YAML line parser for pnpm-workspace.yaml.
///
/// The pnpm workspace YAML format is simple: a `packages:` key followed by
/// a list of glob strings:
///
/// ```yaml
/// packages:
///   - 'packages/*'
///   - "apps/*"
///   - tools/*
/// ```
pub(crate) fn parse_pnpm_workspace_yaml(content: &str) -> Vec<String> {
    let mut result = Vec::new();
    let mut in_packages = false;

    for line in content.lines() {
        let trimmed = line.trim_end();

        if trimmed.trim_start() == "packages:" && !trimmed.starts_with(' ') {
            in_packages = true;
            continue;
        }
        if !in_packages {
            continue;
        }

        // A new top-level key ends the packages block.
        if !trimmed.is_empty() && !trimmed.starts_with(' ') && !trimmed.starts_with('-') {
            break;
        }

        let Some(rest) = trimmed.trim_start().strip_prefix("- ") else {
            continue;
        };
        let glob = rest.trim();
        let glob = glob
            .strip_prefix('\'')
            .and_then(|g| g.strip_suffix('\''))
            .or_else(|| glob.strip_prefix('"').and_then(|g| g.strip_suffix('"')))
            .unwrap_or(glob);
        if !glob.is_empty() {
            result.push(glob.to_owned());
        }
    }

    result
}
