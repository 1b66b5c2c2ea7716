use std::sync::OnceLock;

use serde::Serialize;
use tree_sitter::{Node, Query, QueryCursor, StreamingIterator, Tree};

use super::languages::Grammar;

// ---------------------------------------------------------------------------
// Data structures
// ---------------------------------------------------------------------------

/// How a module is pulled into a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ImportKind {
    /// `import { X } from './module'` or side-effect `import './module'`
    Static,
    /// `export { X } from './module'` / `export * from './module'`
    ReExport,
    /// CommonJS `require('./module')`
    Require,
    /// `import('./module')`
    Dynamic,
}

impl ImportKind {
    pub fn is_dynamic(self) -> bool {
        matches!(self, Self::Dynamic)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Static => "import",
            Self::ReExport => "re-export",
            Self::Require => "require",
            Self::Dynamic => "dynamic",
        }
    }
}

/// An import extracted from a source file, before resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportInfo {
    pub kind: ImportKind,
    /// The raw module specifier string, e.g. `"react"` or `"./utils"`.
    pub specifier: String,
    /// `import type …`, `export type … from`, or every named specifier is `type`-qualified.
    pub type_only: bool,
    /// 1-based line of the statement start.
    pub line: usize,
    /// 1-based column of the statement start, in UTF-16 code units as editors count them.
    pub column: usize,
}

// ---------------------------------------------------------------------------
// Query strings
// ---------------------------------------------------------------------------

/// ESM static imports, including side-effect imports (`import './polyfill'`).
const IMPORT_QUERY: &str = r#"
    (import_statement
      source: (string (string_fragment) @module_path)) @stmt
"#;

/// Re-exports: `export { X } from './m'`, `export * from './m'`, `export * as ns from './m'`.
const REEXPORT_QUERY: &str = r#"
    (export_statement
      source: (string (string_fragment) @module_path)) @stmt
"#;

/// TypeScript `import x = require('./m')`. Not part of the JavaScript grammar.
const IMPORT_EQUALS_QUERY: &str = r#"
    (import_statement
      (import_require_clause
        source: (string (string_fragment) @module_path))) @stmt
"#;

/// CJS require calls.
/// Note: tree-sitter 0.26 StreamingIterator does not auto-filter `#eq?` predicates,
/// so the callee name is checked in code.
const REQUIRE_QUERY: &str = r#"
    (call_expression
      function: (identifier) @fn
      arguments: (arguments (string (string_fragment) @module_path))) @stmt
"#;

/// Dynamic `import()` calls with a literal specifier.
const DYNAMIC_IMPORT_QUERY: &str = r#"
    (call_expression
      function: (import)
      arguments: (arguments (string (string_fragment) @module_path))) @stmt
"#;

// ---------------------------------------------------------------------------
// Query cache
// ---------------------------------------------------------------------------

/// Compiled queries for one grammar. Node kind ids differ between grammars,
/// so a query compiled for TypeScript must never run against a JavaScript tree.
struct ImportQueries {
    import: Query,
    reexport: Query,
    require: Query,
    dynamic: Query,
    import_equals: Option<Query>,
}

impl ImportQueries {
    fn compile(grammar: Grammar) -> Self {
        let language = grammar.language();
        let build = |source: &str, what: &str| {
            Query::new(&language, source)
                .unwrap_or_else(|e| panic!("invalid {what} query for {grammar:?}: {e}"))
        };
        Self {
            import: build(IMPORT_QUERY, "import"),
            reexport: build(REEXPORT_QUERY, "re-export"),
            require: build(REQUIRE_QUERY, "require"),
            dynamic: build(DYNAMIC_IMPORT_QUERY, "dynamic import"),
            import_equals: matches!(grammar, Grammar::TypeScript | Grammar::Tsx)
                .then(|| build(IMPORT_EQUALS_QUERY, "import-equals")),
        }
    }
}

static TS_QUERIES: OnceLock<ImportQueries> = OnceLock::new();
static TSX_QUERIES: OnceLock<ImportQueries> = OnceLock::new();
static JS_QUERIES: OnceLock<ImportQueries> = OnceLock::new();

fn queries(grammar: Grammar) -> &'static ImportQueries {
    let cell = match grammar {
        Grammar::TypeScript => &TS_QUERIES,
        Grammar::Tsx => &TSX_QUERIES,
        Grammar::JavaScript => &JS_QUERIES,
    };
    cell.get_or_init(|| ImportQueries::compile(grammar))
}

// ---------------------------------------------------------------------------
// Helper utilities
// ---------------------------------------------------------------------------

fn node_text<'a>(node: Node<'a>, source: &'a [u8]) -> &'a str {
    node.utf8_text(source).unwrap_or("")
}

/// Find the first direct child of `node` with the given kind.
fn find_child_of_kind<'a>(node: Node<'a>, kind: &str) -> Option<Node<'a>> {
    let mut cursor = node.walk();
    node.children(&mut cursor).find(|c| c.kind() == kind)
}

/// True if `node` has an anonymous keyword child such as `type`.
fn has_keyword_child(node: Node, keyword: &str) -> bool {
    let mut cursor = node.walk();
    node.children(&mut cursor)
        .any(|c| !c.is_named() && c.kind() == keyword)
}

/// `import type { A } from`, or `import { type A, type B } from`.
///
/// A default or namespace binding always makes the import a runtime one, and so
/// does a side-effect import with no clause at all.
fn is_type_only_import(stmt: Node) -> bool {
    if has_keyword_child(stmt, "type") {
        return true;
    }
    let Some(clause) = find_child_of_kind(stmt, "import_clause") else {
        return false;
    };

    let mut saw_specifier = false;
    let mut cursor = clause.walk();
    for child in clause.children(&mut cursor) {
        match child.kind() {
            "named_imports" => {
                let mut inner = child.walk();
                for spec in child.children(&mut inner) {
                    if spec.kind() != "import_specifier" {
                        continue;
                    }
                    if !has_keyword_child(spec, "type") {
                        return false;
                    }
                    saw_specifier = true;
                }
            }
            _ if child.is_named() => return false,
            _ => {}
        }
    }
    saw_specifier
}

/// `export type { A } from`, or `export { type A } from`.
fn is_type_only_reexport(stmt: Node) -> bool {
    if has_keyword_child(stmt, "type") {
        return true;
    }
    let Some(clause) = find_child_of_kind(stmt, "export_clause") else {
        return false;
    };

    let mut saw_specifier = false;
    let mut cursor = clause.walk();
    for spec in clause.children(&mut cursor) {
        if spec.kind() != "export_specifier" {
            continue;
        }
        if !has_keyword_child(spec, "type") {
            return false;
        }
        saw_specifier = true;
    }
    saw_specifier
}

/// Collect `(statement node, module path)` pairs for one query.
fn collect_matches<'t>(
    query: &Query,
    tree: &'t Tree,
    source: &'t [u8],
    mut accept: impl FnMut(&tree_sitter::QueryMatch<'_, 't>) -> bool,
) -> Vec<(Node<'t>, String)> {
    let stmt_idx = query.capture_index_for_name("stmt");
    let module_path_idx = query.capture_index_for_name("module_path");
    let (Some(stmt_idx), Some(module_path_idx)) = (stmt_idx, module_path_idx) else {
        return Vec::new();
    };

    let mut found = Vec::new();
    let mut cursor = QueryCursor::new();
    let mut matches = cursor.matches(query, tree.root_node(), source);

    while let Some(m) = matches.next() {
        if !accept(m) {
            continue;
        }
        let mut stmt: Option<Node> = None;
        let mut module_path: Option<String> = None;
        for capture in m.captures {
            if capture.index == stmt_idx {
                stmt = Some(capture.node);
            } else if capture.index == module_path_idx {
                module_path = Some(node_text(capture.node, source).to_owned());
            }
        }
        if let (Some(node), Some(path)) = (stmt, module_path) {
            found.push((node, path));
        }
    }
    found
}

fn import_info(node: Node, source: &[u8], specifier: String, kind: ImportKind, type_only: bool) -> ImportInfo {
    let pos = node.start_position();
    // tree-sitter columns are byte offsets into the line.
    let line_start = node.start_byte() - pos.column;
    let column = std::str::from_utf8(&source[line_start..node.start_byte()])
        .map(|prefix| prefix.encode_utf16().count())
        .unwrap_or(pos.column);
    ImportInfo {
        kind,
        specifier,
        type_only,
        line: pos.row + 1,
        column: column + 1,
    }
}

// ---------------------------------------------------------------------------
// Import extraction
// ---------------------------------------------------------------------------

/// Extract every module reference (static, re-export, require, dynamic) from a parsed tree.
///
/// Results are ordered by source position.
pub fn extract_imports(tree: &Tree, source: &[u8], grammar: Grammar) -> Vec<ImportInfo> {
    let q = queries(grammar);
    let mut imports = Vec::new();

    for (node, path) in collect_matches(&q.import, tree, source, |_| true) {
        let type_only = is_type_only_import(node);
        imports.push(import_info(node, source, path, ImportKind::Static, type_only));
    }

    if let Some(query) = &q.import_equals {
        for (node, path) in collect_matches(query, tree, source, |_| true) {
            let type_only = has_keyword_child(node, "type");
            imports.push(import_info(node, source, path, ImportKind::Require, type_only));
        }
    }

    for (node, path) in collect_matches(&q.reexport, tree, source, |_| true) {
        let type_only = is_type_only_reexport(node);
        imports.push(import_info(node, source, path, ImportKind::ReExport, type_only));
    }

    // Only calls to `require(...)`, not arbitrary identifier calls.
    let fn_idx = q.require.capture_index_for_name("fn");
    let is_require = |m: &tree_sitter::QueryMatch<'_, '_>| {
        m.captures
            .iter()
            .any(|c| Some(c.index) == fn_idx && node_text(c.node, source) == "require")
    };
    for (node, path) in collect_matches(&q.require, tree, source, is_require) {
        imports.push(import_info(node, source, path, ImportKind::Require, false));
    }

    for (node, path) in collect_matches(&q.dynamic, tree, source, |_| true) {
        imports.push(import_info(node, source, path, ImportKind::Dynamic, false));
    }

    imports.sort_by_key(|i| (i.line, i.column));
    imports
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
