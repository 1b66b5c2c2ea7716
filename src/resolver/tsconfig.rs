use std::path::{Path, PathBuf};

use oxc_resolver::{ResolveOptions, Resolver, TsconfigOptions, TsconfigReferences};
use tracing::debug;

/// `compilerOptions.paths` / `baseUrl` mapping from the project's `tsconfig.json`.
///
/// Loading, `extends` chains, project references and JSONC syntax (comments, trailing
/// commas) are handled by `oxc_resolver`. Only specifiers that land on a project file
/// count; anything resolved into `node_modules` is treated as an external package.
pub struct TsconfigPaths {
    resolver: Resolver,
}

impl TsconfigPaths {
    /// `None` when `<root>/tsconfig.json` does not exist.
    pub fn load(root: &Path, extensions: &[String]) -> Option<Self> {
        let config_file = root.join("tsconfig.json");
        if !config_file.is_file() {
            return None;
        }
        debug!(path = %config_file.display(), "using tsconfig paths");

        let resolver = Resolver::new(ResolveOptions {
            extensions: extensions.to_vec(),
            extension_alias: vec![(
                ".js".into(),
                vec![".ts".into(), ".tsx".into(), ".js".into()],
            )],
            tsconfig: Some(TsconfigOptions {
                config_file,
                references: TsconfigReferences::Auto,
            }),
            builtin_modules: true,
            ..ResolveOptions::default()
        });
        Some(Self { resolver })
    }

    /// Resolve a non-relative `specifier` written in `from_file`.
    pub fn resolve(&self, from_file: &Path, specifier: &str) -> Option<PathBuf> {
        let dir = from_file.parent()?;
        match self.resolver.resolve(dir, specifier) {
            Ok(resolution) => {
                let path = resolution.into_path_buf();
                let external = path.components().any(|c| c.as_os_str() == "node_modules");
                (!external).then_some(path)
            }
            Err(err) => {
                debug!(specifier, %err, "not a tsconfig path");
                None
            }
        }
    }
}
