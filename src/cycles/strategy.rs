use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::relative_display;

/// A mechanical remediation pattern for a circular dependency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FixStrategy {
    /// Split one module into a core part with no back-edge and an extended part.
    ModuleSplit,
    /// Bypass a barrel file and import the concrete module.
    DirectImport,
    /// Hoist shared type declarations into a neutral module.
    ExtractShared,
    /// Invert one runtime dependency through a constructor or parameter.
    DependencyInjection,
}

impl FixStrategy {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ModuleSplit => "module-split",
            Self::DirectImport => "direct-import",
            Self::ExtractShared => "extract-shared",
            Self::DependencyInjection => "dependency-injection",
        }
    }

    /// Render a one-sentence fix for the cycle, phrased from the linted file's point of view.
    pub fn suggested_fix(self, ctx: &FixContext<'_>) -> String {
        let file = relative_display(ctx.file, ctx.root);
        let next = relative_display(ctx.next, ctx.root);
        match self {
            Self::ModuleSplit => {
                let (core, extended) = ctx.naming.split_names(ctx.file);
                let previous = relative_display(ctx.previous, ctx.root);
                format!(
                    "Split {file} into {core} (everything {previous} needs, without importing {next}) \
                     and {extended} (the code that depends on {next}); point {previous} at {core}."
                )
            }
            Self::DirectImport => {
                let barrel = ctx.barrel.unwrap_or(ctx.next);
                let consumer = if barrel == ctx.file { ctx.next } else { ctx.file };
                format!(
                    "In {}, import the concrete module directly instead of going through the barrel {}.",
                    relative_display(consumer, ctx.root),
                    relative_display(barrel, ctx.root),
                )
            }
            Self::ExtractShared => {
                let shared = ctx
                    .file
                    .parent()
                    .map(|dir| dir.join(format!("shared-types{}", extension_of(ctx.file))))
                    .unwrap_or_else(|| PathBuf::from("shared-types.ts"));
                format!(
                    "Move the type declarations shared by {file} and {next} into {} and import them from there in both files.",
                    relative_display(&shared, ctx.root),
                )
            }
            Self::DependencyInjection => format!(
                "Remove the runtime import of {next} from {file}; accept that dependency as a constructor or function parameter instead."
            ),
        }
    }
}

impl fmt::Display for FixStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Strategy setting from configuration or the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum StrategyChoice {
    /// Pick per cycle from its shape.
    #[default]
    Auto,
    ModuleSplit,
    DirectImport,
    ExtractShared,
    DependencyInjection,
}

impl StrategyChoice {
    /// The fixed strategy, or `None` for `auto`.
    pub fn fixed(self) -> Option<FixStrategy> {
        match self {
            Self::Auto => None,
            Self::ModuleSplit => Some(FixStrategy::ModuleSplit),
            Self::DirectImport => Some(FixStrategy::DirectImport),
            Self::ExtractShared => Some(FixStrategy::ExtractShared),
            Self::DependencyInjection => Some(FixStrategy::DependencyInjection),
        }
    }
}

/// How the two halves of a module-split are named.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NamingConvention {
    /// `<stem><core suffix>` / `<stem><extended suffix>`
    #[default]
    Semantic,
    /// `<stem>-1` / `<stem>-2`
    Numbered,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleNaming {
    pub convention: NamingConvention,
    pub core_suffix: String,
    pub extended_suffix: String,
}

impl ModuleNaming {
    /// File names (not paths) for the core and extended halves of `file`.
    pub fn split_names(&self, file: &Path) -> (String, String) {
        let stem = file
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("module");
        let ext = extension_of(file);
        match self.convention {
            NamingConvention::Semantic => (
                format!("{stem}{}{ext}", self.core_suffix),
                format!("{stem}{}{ext}", self.extended_suffix),
            ),
            NamingConvention::Numbered => (format!("{stem}-1{ext}"), format!("{stem}-2{ext}")),
        }
    }
}

fn extension_of(file: &Path) -> String {
    file.extension()
        .and_then(|e| e.to_str())
        .map(|e| format!(".{e}"))
        .unwrap_or_default()
}

/// The facts about a cycle that strategy selection looks at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleShape {
    /// Number of distinct files in the loop.
    pub len: usize,
    /// A participant whose file name is a configured barrel name.
    pub barrel: Option<PathBuf>,
    /// Every import that forms a hop of the cycle is type-only.
    pub all_type_only: bool,
}

/// Everything a suggested fix needs to name files.
pub struct FixContext<'a> {
    /// The linted file; the diagnostic is anchored at its import of `next`.
    pub file: &'a Path,
    pub next: &'a Path,
    /// The cycle member that imports `file`.
    pub previous: &'a Path,
    pub barrel: Option<&'a Path>,
    pub root: &'a Path,
    pub naming: &'a ModuleNaming,
}

/// Choose the fix strategy for a cycle. An explicit choice always wins.
pub fn select_strategy(shape: &CycleShape, choice: StrategyChoice) -> FixStrategy {
    if let Some(fixed) = choice.fixed() {
        return fixed;
    }
    if shape.len == 2 && shape.barrel.is_some() {
        FixStrategy::DirectImport
    } else if shape.all_type_only {
        FixStrategy::ExtractShared
    } else {
        FixStrategy::ModuleSplit
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shape(len: usize, barrel: Option<&str>, all_type_only: bool) -> CycleShape {
        CycleShape {
            len,
            barrel: barrel.map(PathBuf::from),
            all_type_only,
        }
    }

    fn semantic() -> ModuleNaming {
        ModuleNaming {
            convention: NamingConvention::Semantic,
            core_suffix: "-core".into(),
            extended_suffix: "-extended".into(),
        }
    }

    #[test]
    fn test_two_file_barrel_cycle_is_direct_import() {
        let s = shape(2, Some("/p/index.ts"), false);
        assert_eq!(select_strategy(&s, StrategyChoice::Auto), FixStrategy::DirectImport);
    }

    #[test]
    fn test_barrel_rule_precedes_type_only_rule() {
        let s = shape(2, Some("/p/index.ts"), true);
        assert_eq!(select_strategy(&s, StrategyChoice::Auto), FixStrategy::DirectImport);
    }

    #[test]
    fn test_longer_barrel_cycle_is_not_direct_import() {
        let s = shape(3, Some("/p/index.ts"), false);
        assert_eq!(select_strategy(&s, StrategyChoice::Auto), FixStrategy::ModuleSplit);
    }

    #[test]
    fn test_type_only_cycle_is_extract_shared() {
        let s = shape(2, None, true);
        assert_eq!(select_strategy(&s, StrategyChoice::Auto), FixStrategy::ExtractShared);
    }

    #[test]
    fn test_runtime_cycle_is_module_split() {
        let s = shape(3, None, false);
        assert_eq!(select_strategy(&s, StrategyChoice::Auto), FixStrategy::ModuleSplit);
    }

    #[test]
    fn test_explicit_choice_is_returned_unchanged() {
        let s = shape(2, Some("/p/index.ts"), true);
        assert_eq!(
            select_strategy(&s, StrategyChoice::DependencyInjection),
            FixStrategy::DependencyInjection
        );
        assert_eq!(select_strategy(&s, StrategyChoice::ModuleSplit), FixStrategy::ModuleSplit);
    }

    #[test]
    fn test_auto_never_picks_dependency_injection() {
        for len in 1..6 {
            for barrel in [None, Some("/p/index.ts")] {
                for type_only in [false, true] {
                    let picked = select_strategy(&shape(len, barrel, type_only), StrategyChoice::Auto);
                    assert_ne!(picked, FixStrategy::DependencyInjection);
                }
            }
        }
    }

    #[test]
    fn test_split_names() {
        let file = Path::new("/p/src/user.ts");
        assert_eq!(
            semantic().split_names(file),
            ("user-core.ts".to_string(), "user-extended.ts".to_string())
        );
        let numbered = ModuleNaming {
            convention: NamingConvention::Numbered,
            ..semantic()
        };
        assert_eq!(
            numbered.split_names(file),
            ("user-1.ts".to_string(), "user-2.ts".to_string())
        );
    }

    #[test]
    fn test_direct_import_fix_names_consumer_and_barrel() {
        let naming = semantic();
        let ctx = FixContext {
            file: Path::new("/p/src/index.ts"),
            next: Path::new("/p/src/user.ts"),
            previous: Path::new("/p/src/user.ts"),
            barrel: Some(Path::new("/p/src/index.ts")),
            root: Path::new("/p"),
            naming: &naming,
        };
        let fix = FixStrategy::DirectImport.suggested_fix(&ctx);
        assert_eq!(
            fix,
            "In src/user.ts, import the concrete module directly instead of going through the barrel src/index.ts."
        );
    }

    #[test]
    fn test_module_split_fix_uses_naming() {
        let naming = semantic();
        let ctx = FixContext {
            file: Path::new("/p/a.ts"),
            next: Path::new("/p/b.ts"),
            previous: Path::new("/p/c.ts"),
            barrel: None,
            root: Path::new("/p"),
            naming: &naming,
        };
        let fix = FixStrategy::ModuleSplit.suggested_fix(&ctx);
        assert!(fix.starts_with("Split a.ts into a-core.ts"), "{fix}");
        assert!(fix.contains("a-extended.ts"));
        assert!(fix.ends_with("point c.ts at a-core.ts."));
    }

    #[test]
    fn test_extract_shared_fix_names_sibling_module() {
        let naming = semantic();
        let ctx = FixContext {
            file: Path::new("/p/types/a.ts"),
            next: Path::new("/p/types/b.ts"),
            previous: Path::new("/p/types/b.ts"),
            barrel: None,
            root: Path::new("/p"),
            naming: &naming,
        };
        let fix = FixStrategy::ExtractShared.suggested_fix(&ctx);
        assert!(fix.contains("types/shared-types.ts"), "{fix}");
    }

    #[test]
    fn test_strategy_serde_names() {
        let json = serde_json::to_string(&FixStrategy::ExtractShared).unwrap();
        assert_eq!(json, "\"extract-shared\"");
        let choice: StrategyChoice = serde_json::from_str("\"dependency-injection\"").unwrap();
        assert_eq!(choice, StrategyChoice::DependencyInjection);
        assert_eq!(FixStrategy::DirectImport.to_string(), "direct-import");
    }
}
