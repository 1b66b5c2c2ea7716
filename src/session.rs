use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::config::{ConfigError, CycleGuardConfig, IgnoreMatcher};
use crate::cycles::strategy::{CycleShape, FixContext, ModuleNaming, select_strategy};
use crate::cycles::{Cycle, find_cycles, minimal_cycle, signature};
use crate::fs::FileSystem;
use crate::graph::ImportGraph;
use crate::report::{Diagnostic, Location, Reporter};
use crate::resolver::{Alias, ImportResolver, TsconfigPaths, normalize_path};

/// One lint run over a project.
///
/// Owns every cache the analysis uses (existence checks, parsed imports, reported
/// signatures), so independent sessions never share mutable state.
pub struct AnalysisSession<F> {
    graph: ImportGraph<F>,
    reporter: Reporter,
    root: PathBuf,
    config: CycleGuardConfig,
    naming: ModuleNaming,
}

impl<F: FileSystem> AnalysisSession<F> {
    /// Validates `config` and compiles its ignore patterns.
    pub fn new(fs: F, root: &Path, config: &CycleGuardConfig, aliases: Vec<Alias>) -> Result<Self, ConfigError> {
        config.validate()?;
        let ignore = IgnoreMatcher::new(root, &config.ignore_patterns)?;
        let resolver = ImportResolver::new(config.extensions.clone(), config.barrel_exports.clone(), aliases);

        Ok(Self {
            graph: ImportGraph::new(fs, resolver, ignore),
            reporter: Reporter::new(),
            root: root.to_path_buf(),
            naming: config.module_naming(),
            config: config.clone(),
        })
    }

    /// Resolve non-relative specifiers no alias matched through `tsconfig.json` paths.
    pub fn with_tsconfig(mut self, tsconfig: Option<TsconfigPaths>) -> Self {
        if let Some(tsconfig) = tsconfig {
            self.graph.resolver_mut().set_tsconfig(tsconfig);
        }
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn graph(&mut self) -> &mut ImportGraph<F> {
        &mut self.graph
    }

    /// Diagnostics for the cycles `file` takes part in that no earlier call reported.
    pub fn lint_file(&mut self, file: &Path) -> Vec<Diagnostic> {
        let file = normalize_path(file);
        if self.graph.is_ignored(&file) {
            return Vec::new();
        }

        let search = find_cycles(
            &mut self.graph,
            &file,
            self.config.max_depth,
            self.config.report_all_cycles,
        );
        if search.truncated {
            debug!(
                file = %file.display(),
                max_depth = self.config.max_depth,
                "search cut at max depth; longer cycles may be missed"
            );
        }

        let mut diagnostics = Vec::new();
        for path in &search.paths {
            // The loop may not involve `file` at all if the DFS only reached it.
            let Some(cycle) = minimal_cycle(path).and_then(|c| c.rotated_to(&file)) else {
                continue;
            };
            if let Some(diagnostic) = self.diagnose(&file, &cycle) {
                diagnostics.push(diagnostic);
            }
        }
        diagnostics
    }

    /// Lint each file in order, sharing the dedup set.
    pub fn lint_files(&mut self, files: &[PathBuf]) -> Vec<Diagnostic> {
        let diagnostics: Vec<Diagnostic> = files.iter().flat_map(|f| self.lint_file(f)).collect();
        info!(
            files = files.len(),
            parsed = self.graph.file_count(),
            cycles = self.reporter.count(),
            "lint finished"
        );
        diagnostics
    }

    fn diagnose(&mut self, file: &Path, cycle: &Cycle) -> Option<Diagnostic> {
        let signature = signature(cycle);
        if self.reporter.is_reported(&signature) {
            debug!(signature = signature.as_str(), "cycle already reported");
            return None;
        }

        let next = cycle.files()[1].as_path();
        let previous = cycle.members().last()?.as_path();
        let anchor = self.graph.first_static_edge(file, next)?;

        let shape = self.shape(cycle);
        let strategy = select_strategy(&shape, self.config.fix_strategy);
        let suggested_fix = strategy.suggested_fix(&FixContext {
            file,
            next,
            previous,
            barrel: shape.barrel.as_deref(),
            root: &self.root,
            naming: &self.naming,
        });

        let cycle_display = cycle.display(&self.root);
        self.reporter.report(Diagnostic {
            location: Location {
                file: file.to_path_buf(),
                line: anchor.line,
                column: anchor.column,
            },
            strategy,
            message: Diagnostic::message_for(&cycle_display),
            cycle_display,
            suggested_fix,
            specifier: anchor.specifier,
            signature,
        })
    }

    fn shape(&mut self, cycle: &Cycle) -> CycleShape {
        let barrel = cycle
            .members()
            .iter()
            .find(|f| self.config.is_barrel(f))
            .cloned();
        let all_type_only = cycle
            .members()
            .iter()
            .all(|f| self.graph.imports(f).is_type_only());
        CycleShape {
            len: cycle.len(),
            barrel,
            all_type_only,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cycles::strategy::{FixStrategy, StrategyChoice};
    use crate::fs::MemoryFileSystem;

    fn session(fs: MemoryFileSystem) -> AnalysisSession<MemoryFileSystem> {
        session_with(fs, CycleGuardConfig::default())
    }

    fn session_with(fs: MemoryFileSystem, config: CycleGuardConfig) -> AnalysisSession<MemoryFileSystem> {
        AnalysisSession::new(fs, Path::new("/p"), &config, vec![]).unwrap()
    }

    fn three_cycle() -> MemoryFileSystem {
        MemoryFileSystem::new()
            .with("/p/a.ts", "import { b } from './b';\nexport const a = () => b;\n")
            .with("/p/b.ts", "import { c } from './c';\nexport const b = () => c;\n")
            .with("/p/c.ts", "import { a } from './a';\nexport const c = () => a;\n")
    }

    #[test]
    fn test_cycle_is_reported_once_across_entry_points() {
        let mut s = session(three_cycle());
        let from_b = s.lint_file(Path::new("/p/b.ts"));
        assert_eq!(from_b.len(), 1);
        assert_eq!(from_b[0].cycle_display, "b.ts -> c.ts -> a.ts -> b.ts");
        assert_eq!(from_b[0].location.file, PathBuf::from("/p/b.ts"));
        assert_eq!(from_b[0].specifier, "./c");

        assert!(s.lint_file(Path::new("/p/c.ts")).is_empty());
        assert!(s.lint_file(Path::new("/p/a.ts")).is_empty());
    }

    #[test]
    fn test_independent_entry_points_share_signature() {
        let mut from_b = session(three_cycle());
        let mut from_c = session(three_cycle());
        let b = from_b.lint_file(Path::new("/p/b.ts"));
        let c = from_c.lint_file(Path::new("/p/c.ts"));
        assert_eq!(b[0].signature, c[0].signature);
        assert_ne!(b[0].location.file, c[0].location.file);
    }

    #[test]
    fn test_runtime_three_cycle_suggests_module_split() {
        let mut s = session(three_cycle());
        let d = s.lint_file(Path::new("/p/a.ts"));
        assert_eq!(d.len(), 1);
        assert_eq!(d[0].strategy, FixStrategy::ModuleSplit);
        assert!(d[0].suggested_fix.contains("a-core.ts"), "{}", d[0].suggested_fix);
        assert!(d[0].suggested_fix.contains("point c.ts at a-core.ts"), "{}", d[0].suggested_fix);
    }

    #[test]
    fn test_barrel_two_cycle_suggests_direct_import() {
        let fs = MemoryFileSystem::new()
            .with("/p/src/index.ts", "export * from './user';\n")
            .with("/p/src/user.ts", "import { helpers } from './index';\nexport const user = helpers;\n");
        let mut s = session(fs);
        let d = s.lint_file(Path::new("/p/src/index.ts"));
        assert_eq!(d.len(), 1);
        assert_eq!(d[0].strategy, FixStrategy::DirectImport);
        assert_eq!(d[0].cycle_display, "src/index.ts -> src/user.ts -> src/index.ts");
        assert!(d[0].suggested_fix.starts_with("In src/user.ts,"), "{}", d[0].suggested_fix);
    }

    #[test]
    fn test_type_only_cycle_suggests_extract_shared() {
        let fs = MemoryFileSystem::new()
            .with("/p/types/a.ts", "import type { B } from './b';\nexport interface A { b: B }\n")
            .with("/p/types/b.ts", "import type { A } from './a';\nexport interface B { a: A }\n");
        let mut s = session(fs);
        let d = s.lint_file(Path::new("/p/types/a.ts"));
        assert_eq!(d.len(), 1);
        assert_eq!(d[0].strategy, FixStrategy::ExtractShared);
        assert!(d[0].suggested_fix.contains("types/shared-types.ts"), "{}", d[0].suggested_fix);
    }

    #[test]
    fn test_one_runtime_edge_rules_out_extract_shared() {
        let fs = MemoryFileSystem::new()
            .with("/p/a.ts", "import type { B } from './b';\n")
            .with("/p/b.ts", "import type { A } from './a';\nimport { make } from './a';\n");
        let mut s = session(fs);
        let d = s.lint_file(Path::new("/p/a.ts"));
        assert_eq!(d[0].strategy, FixStrategy::ModuleSplit);
    }

    #[test]
    fn test_runtime_import_outside_cycle_rules_out_extract_shared() {
        let fs = MemoryFileSystem::new()
            .with(
                "/p/types/a.ts",
                "import type { B } from './b';\nimport { helper } from './util';\n",
            )
            .with("/p/types/b.ts", "import type { A } from './a';\n")
            .with("/p/types/util.ts", "export const helper = 1;\n");
        let mut s = session(fs);
        let d = s.lint_file(Path::new("/p/types/a.ts"));
        assert_eq!(d.len(), 1);
        assert_eq!(d[0].strategy, FixStrategy::ModuleSplit);
    }

    #[test]
    fn test_runtime_package_import_rules_out_extract_shared() {
        let fs = MemoryFileSystem::new()
            .with("/p/a.ts", "import type { B } from './b';\nimport { z } from 'zod';\n")
            .with("/p/b.ts", "import type { A } from './a';\nimport type { Z } from 'zod';\n");
        let mut s = session(fs);
        let d = s.lint_file(Path::new("/p/a.ts"));
        assert_eq!(d[0].strategy, FixStrategy::ModuleSplit);
    }

    #[test]
    fn test_explicit_strategy_wins() {
        let config = CycleGuardConfig {
            fix_strategy: StrategyChoice::DependencyInjection,
            ..Default::default()
        };
        let mut s = session_with(three_cycle(), config);
        let d = s.lint_file(Path::new("/p/a.ts"));
        assert_eq!(d[0].strategy, FixStrategy::DependencyInjection);
    }

    #[test]
    fn test_diagnostic_is_anchored_at_closing_import() {
        let fs = MemoryFileSystem::new()
            .with("/p/a.ts", "import React from 'react';\n  import { b } from './b';\n")
            .with("/p/b.ts", "import { a } from './a';\n");
        let mut s = session(fs);
        let d = s.lint_file(Path::new("/p/a.ts"));
        assert_eq!(d[0].location.line, 2);
        assert_eq!(d[0].location.column, 3);
        assert_eq!(d[0].message, "Circular dependency detected: a.ts -> b.ts -> a.ts");
    }

    #[test]
    fn test_approach_path_file_gets_no_diagnostic() {
        let fs = MemoryFileSystem::new()
            .with("/p/x.ts", "import './a';\n")
            .with("/p/a.ts", "import './b';\n")
            .with("/p/b.ts", "import './a';\n");
        let mut s = session(fs);
        assert!(s.lint_file(Path::new("/p/x.ts")).is_empty());
        assert_eq!(s.lint_file(Path::new("/p/a.ts")).len(), 1);
    }

    #[test]
    fn test_report_all_cycles() {
        let fs = MemoryFileSystem::new()
            .with("/p/a.ts", "import './b';\nimport './c';\n")
            .with("/p/b.ts", "import './a';\n")
            .with("/p/c.ts", "import './a';\n");

        let mut first_only = session(fs.clone());
        assert_eq!(first_only.lint_file(Path::new("/p/a.ts")).len(), 1);

        let config = CycleGuardConfig {
            report_all_cycles: true,
            ..Default::default()
        };
        let mut all = session_with(fs, config);
        let d = all.lint_file(Path::new("/p/a.ts"));
        assert_eq!(d.len(), 2);
        assert_eq!(d[1].location.line, 2);
    }

    #[test]
    fn test_depth_bound_hides_long_cycle() {
        let fs = (0..5).fold(MemoryFileSystem::new(), |fs, i| {
            fs.with(format!("/p/f{i}.ts"), &format!("import './f{}';", (i + 1) % 5))
        });
        let config = CycleGuardConfig {
            max_depth: 2,
            ..Default::default()
        };
        let mut s = session_with(fs, config);
        assert!(s.lint_file(Path::new("/p/f0.ts")).is_empty());
    }

    #[test]
    fn test_ignored_files_are_not_linted_or_traversed() {
        let config = CycleGuardConfig {
            ignore_patterns: vec!["c.ts".into()],
            ..Default::default()
        };
        let mut s = session_with(three_cycle(), config);
        assert!(s.lint_file(Path::new("/p/c.ts")).is_empty());
        assert!(s.lint_file(Path::new("/p/a.ts")).is_empty(), "the loop runs through an ignored file");
    }

    #[test]
    fn test_ignore_pattern_naming_an_ancestor_of_root() {
        let fs = MemoryFileSystem::new()
            .with("/home/build/p/a.ts", "import './b';\n")
            .with("/home/build/p/b.ts", "import './a';\n");
        let config = CycleGuardConfig {
            ignore_patterns: vec!["build".into()],
            ..Default::default()
        };
        let mut s = AnalysisSession::new(fs, Path::new("/home/build/p"), &config, vec![]).unwrap();
        assert_eq!(s.lint_file(Path::new("/home/build/p/a.ts")).len(), 1);
    }

    #[test]
    fn test_invalid_config_is_rejected_at_construction() {
        let config = CycleGuardConfig {
            max_depth: 0,
            ..Default::default()
        };
        let result = AnalysisSession::new(MemoryFileSystem::new(), Path::new("/p"), &config, vec![]);
        assert!(matches!(result, Err(ConfigError::ZeroDepth)));
    }

    #[test]
    fn test_lint_files_accumulates() {
        let mut s = session(three_cycle());
        let files = vec![
            PathBuf::from("/p/a.ts"),
            PathBuf::from("/p/b.ts"),
            PathBuf::from("/p/c.ts"),
        ];
        let d = s.lint_files(&files);
        assert_eq!(d.len(), 1);
        assert_eq!(d[0].location.file, PathBuf::from("/p/a.ts"));
    }
}
