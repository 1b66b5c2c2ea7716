use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};

use glob::Pattern;
use serde::Deserialize;

use crate::cycles::strategy::{ModuleNaming, NamingConvention, StrategyChoice};

/// Name of the configuration file looked up at the project root.
pub const CONFIG_FILE: &str = "cycle-guard.toml";

/// Configuration loaded from `cycle-guard.toml` at the project root.
///
/// Every key is optional; missing keys take the defaults documented on each field.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CycleGuardConfig {
    /// Longest import chain the DFS follows before abandoning a branch. Default 10.
    pub max_depth: usize,
    /// Globs for files that are neither linted nor traversed.
    pub ignore_patterns: Vec<String>,
    /// File names treated as barrels, also probed when a specifier names a directory.
    pub barrel_exports: Vec<String>,
    /// Keep searching after the first cycle. Default `false`.
    pub report_all_cycles: bool,
    pub fix_strategy: StrategyChoice,
    pub module_naming_convention: NamingConvention,
    /// Default `-core`.
    pub core_module_suffix: String,
    /// Default `-extended`.
    pub extended_module_suffix: String,
    /// Probed in order when a specifier has no extension.
    pub extensions: Vec<String>,
    /// Specifier prefix → directory relative to the project root.
    pub aliases: BTreeMap<String, String>,
    /// Also read aliases from tsconfig.json paths and monorepo workspace packages.
    pub workspace_aliases: bool,
}

impl Default for CycleGuardConfig {
    fn default() -> Self {
        Self {
            max_depth: 10,
            ignore_patterns: Vec::new(),
            barrel_exports: ["index.ts", "index.tsx", "index.js", "index.jsx"]
                .map(String::from)
                .to_vec(),
            report_all_cycles: false,
            fix_strategy: StrategyChoice::Auto,
            module_naming_convention: NamingConvention::Semantic,
            core_module_suffix: "-core".to_owned(),
            extended_module_suffix: "-extended".to_owned(),
            extensions: [".ts", ".tsx", ".js", ".jsx"].map(String::from).to_vec(),
            aliases: BTreeMap::new(),
            workspace_aliases: true,
        }
    }
}

/// Problems with a configuration file or its values.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", path.display())]
    Read { path: PathBuf, source: io::Error },

    #[error("failed to parse {}: {source}", path.display())]
    Parse { path: PathBuf, source: toml::de::Error },

    #[error("max_depth must be at least 1")]
    ZeroDepth,

    #[error("invalid extension {0:?}: extensions start with '.' and contain no '/'")]
    Extension(String),

    #[error("invalid barrel file name {0:?}: expected a bare file name such as \"index.ts\"")]
    BarrelName(String),

    #[error("core_module_suffix and extended_module_suffix must be non-empty and different")]
    Suffixes,

    #[error("invalid ignore pattern {pattern:?}: {source}")]
    Pattern {
        pattern: String,
        source: glob::PatternError,
    },
}

impl CycleGuardConfig {
    /// Load configuration from `cycle-guard.toml` in the given root directory.
    ///
    /// Returns the default configuration if the file does not exist. A file that exists
    /// but cannot be read or parsed is an error, as are invalid values.
    pub fn load(root: &Path) -> Result<Self, ConfigError> {
        let config_path = root.join(CONFIG_FILE);

        if !config_path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(&config_path).map_err(|source| ConfigError::Read {
            path: config_path.clone(),
            source,
        })?;
        let config: Self = toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: config_path,
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Check every value once, up front.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_depth == 0 {
            return Err(ConfigError::ZeroDepth);
        }
        if let Some(bad) = self
            .extensions
            .iter()
            .find(|e| !e.starts_with('.') || e.len() < 2 || e.contains('/'))
        {
            return Err(ConfigError::Extension(bad.clone()));
        }
        if let Some(bad) = self
            .barrel_exports
            .iter()
            .find(|b| b.is_empty() || b.contains('/') || b.contains('\\'))
        {
            return Err(ConfigError::BarrelName(bad.clone()));
        }
        if self.core_module_suffix.is_empty()
            || self.extended_module_suffix.is_empty()
            || self.core_module_suffix == self.extended_module_suffix
        {
            return Err(ConfigError::Suffixes);
        }
        compile_patterns(&self.ignore_patterns)?;
        Ok(())
    }

    pub fn module_naming(&self) -> ModuleNaming {
        ModuleNaming {
            convention: self.module_naming_convention,
            core_suffix: self.core_module_suffix.clone(),
            extended_suffix: self.extended_module_suffix.clone(),
        }
    }

    pub fn is_barrel(&self, file: &Path) -> bool {
        file.file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|name| self.barrel_exports.iter().any(|b| b == name))
    }
}

fn compile_patterns(patterns: &[String]) -> Result<Vec<Pattern>, ConfigError> {
    patterns
        .iter()
        .map(|p| {
            Pattern::new(p).map_err(|source| ConfigError::Pattern {
                pattern: p.clone(),
                source,
            })
        })
        .collect()
}

/// Compiled `ignore_patterns`, matched against the absolute path, the root-relative
/// path, and each component of the root-relative path. Directories above the root
/// never match on their own.
#[derive(Debug, Clone)]
pub struct IgnoreMatcher {
    root: PathBuf,
    patterns: Vec<Pattern>,
}

impl IgnoreMatcher {
    pub fn new(root: &Path, patterns: &[String]) -> Result<Self, ConfigError> {
        Ok(Self {
            root: root.to_path_buf(),
            patterns: compile_patterns(patterns)?,
        })
    }

    pub fn is_ignored(&self, path: &Path) -> bool {
        if self.patterns.is_empty() {
            return false;
        }
        let absolute = path.to_string_lossy();
        let relative = path.strip_prefix(&self.root).ok();
        let relative_str = relative.map(|r| r.to_string_lossy());

        self.patterns.iter().any(|pattern| {
            pattern.matches(&absolute)
                || relative_str.as_deref().is_some_and(|r| pattern.matches(r))
                || relative.is_some_and(|r| {
                    r.components()
                        .filter_map(|c| c.as_os_str().to_str())
                        .any(|c| pattern.matches(c))
                })
        })
    }
}
