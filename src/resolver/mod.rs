pub mod file_resolver;
pub mod tsconfig;
pub mod workspace;

pub use file_resolver::{Alias, ImportResolver, normalize_path};
pub use tsconfig::TsconfigPaths;

use std::collections::BTreeMap;
use std::path::Path;

use tracing::debug;

/// Build the alias list for a project, highest precedence first:
///
/// 1. **Explicit aliases** from configuration (`prefix → root-relative dir`).
/// 2. **Workspace packages** from `pnpm-workspace.yaml` / `package.json` (when `discover` is set).
///
/// A prefix already claimed by a higher-precedence source is not added again.
/// `tsconfig.json` paths are not aliases; see [`TsconfigPaths`].
pub fn project_aliases(root: &Path, configured: &BTreeMap<String, String>, discover: bool) -> Vec<Alias> {
    let mut aliases: Vec<Alias> = configured
        .iter()
        .map(|(prefix, dir)| Alias::new(prefix.clone(), normalize_path(&root.join(dir))))
        .collect();

    if discover {
        for alias in workspace::workspace_aliases(root) {
            if aliases.iter().any(|a| a.prefix == alias.prefix) {
                continue;
            }
            debug!(prefix = %alias.prefix, target = %alias.target.display(), "discovered alias");
            aliases.push(alias);
        }
    }

    aliases
}
