//! Identifier renaming for JavaScript sources.
//!
//! [`TreeSitterRenamer`] parses with tree-sitter and gives every binding a
//! short generated name. The analysis is deliberately coarse: a name is
//! renamed file-wide only when each of its occurrences sits inside a scope
//! that declares it, so references to globals are never captured.

use crate::config::RenameConfig;
use std::collections::{HashMap, HashSet};
use thiserror::Error;
use tree_sitter::{Node, Parser, Tree};

#[derive(Debug, Error)]
#[error("{message}")]
pub struct RenameFailure {
    pub message: String,
}

impl RenameFailure {
    fn new<S: Into<String>>(message: S) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenameOutcome {
    pub code: String,
    /// Number of distinct bindings that received a new name.
    pub renamed: usize,
}

impl RenameOutcome {
    pub fn unchanged(source: &str) -> Self {
        Self {
            code: source.to_string(),
            renamed: 0,
        }
    }
}

/// Given source text, returns equivalent text with local identifiers renamed.
pub trait IdentifierRenamer {
    fn rename_identifiers(&self, source: &str) -> Result<RenameOutcome, RenameFailure>;
}

const FUNCTION_KINDS: &[&str] = &[
    "function_declaration",
    "generator_function_declaration",
    "function_expression",
    "function",
    "generator_function",
    "arrow_function",
    "method_definition",
];

const BLOCK_SCOPE_KINDS: &[&str] = &[
    "program",
    "statement_block",
    "for_statement",
    "for_in_statement",
    "switch_body",
];

const OCCURRENCE_KINDS: &[&str] = &[
    "identifier",
    "shorthand_property_identifier",
    "shorthand_property_identifier_pattern",
];

const RESERVED_WORDS: &[&str] = &[
    "as", "async", "await", "break", "case", "catch", "class", "const", "continue", "debugger",
    "default", "delete", "do", "else", "enum", "eval", "export", "extends", "false", "finally",
    "for", "from", "function", "get", "if", "implements", "import", "in", "instanceof",
    "interface", "let", "new", "null", "of", "package", "private", "protected", "public",
    "return", "set", "static", "super", "switch", "this", "throw", "true", "try", "typeof",
    "var", "void", "while", "with", "yield", "arguments", "undefined", "NaN", "Infinity",
];

pub struct TreeSitterRenamer {
    mangle_toplevel: bool,
    reserved: HashSet<String>,
}

impl TreeSitterRenamer {
    pub fn new(config: &RenameConfig) -> Self {
        let reserved = RESERVED_WORDS
            .iter()
            .map(|w| w.to_string())
            .chain(config.reserved.iter().cloned())
            .collect();

        Self {
            mangle_toplevel: config.mangle_toplevel,
            reserved,
        }
    }

    fn parse(&self, source: &str) -> Result<Tree, RenameFailure> {
        let mut parser = Parser::new();
        parser
            .set_language(&tree_sitter_javascript::LANGUAGE.into())
            .map_err(|e| RenameFailure::new(format!("failed to load JavaScript grammar: {}", e)))?;

        let tree = parser
            .parse(source, None)
            .ok_or_else(|| RenameFailure::new("parser returned no syntax tree"))?;

        let root = tree.root_node();
        if root.has_error() {
            let location = collect_nodes(root)
                .into_iter()
                .find(|n| n.is_error() || n.is_missing())
                .map(|n| n.start_position())
                .unwrap_or_else(|| root.start_position());

            return Err(RenameFailure::new(format!(
                "syntax error at line {}, column {}",
                location.row + 1,
                location.column + 1
            )));
        }

        Ok(tree)
    }
}

impl Default for TreeSitterRenamer {
    fn default() -> Self {
        Self::new(&RenameConfig::default())
    }
}

impl IdentifierRenamer for TreeSitterRenamer {
    fn rename_identifiers(&self, source: &str) -> Result<RenameOutcome, RenameFailure> {
        let tree = self.parse(source)?;
        let root = tree.root_node();
        let nodes = collect_nodes(root);
        let bytes = source.as_bytes();

        if uses_dynamic_scope(&nodes, bytes) {
            tracing::debug!("eval or with statement found; leaving identifiers unchanged");
            return Ok(RenameOutcome::unchanged(source));
        }

        let mut bindings = Bindings::new(bytes, root.id(), self.mangle_toplevel);
        for node in &nodes {
            bindings.visit(*node);
        }

        let occurrences: Vec<Node<'_>> = nodes
            .iter()
            .copied()
            .filter(|n| OCCURRENCE_KINDS.contains(&n.kind()))
            .collect();

        for occurrence in &occurrences {
            bindings.check_occurrence(*occurrence);
        }

        let mut order: Vec<&str> = Vec::new();
        for occurrence in &occurrences {
            let name = node_text(*occurrence, bytes);
            if bindings.is_renamable(name)
                && !self.reserved.contains(name)
                && !order.contains(&name)
            {
                order.push(name);
            }
        }

        if order.is_empty() {
            return Ok(RenameOutcome::unchanged(source));
        }

        let taken: HashSet<&str> = nodes
            .iter()
            .filter(|n| n.kind().contains("identifier"))
            .map(|n| node_text(*n, bytes))
            .collect();

        let mut generator = NameGenerator::default();
        let mut renames: HashMap<&str, String> = HashMap::new();
        for name in order {
            let fresh = generator.next_free(|candidate| {
                taken.contains(candidate) || self.reserved.contains(candidate)
            });
            renames.insert(name, fresh);
        }

        let mut edits: Vec<(usize, usize, String)> = Vec::new();
        for occurrence in &occurrences {
            let name = node_text(*occurrence, bytes);
            let Some(fresh) = renames.get(name) else {
                continue;
            };

            let replacement = if occurrence.kind() == "identifier" {
                fresh.clone()
            } else {
                // `{ a }` keeps its property key: `{ a: b }`.
                format!("{}: {}", name, fresh)
            };
            edits.push((occurrence.start_byte(), occurrence.end_byte(), replacement));
        }
        edits.sort_by_key(|(start, _, _)| *start);

        let mut code = String::with_capacity(source.len());
        let mut cursor = 0;
        for (start, end, replacement) in edits {
            code.push_str(&source[cursor..start]);
            code.push_str(&replacement);
            cursor = end;
        }
        code.push_str(&source[cursor..]);

        Ok(RenameOutcome {
            code,
            renamed: renames.len(),
        })
    }
}

struct Bindings<'s> {
    source: &'s [u8],
    program: usize,
    mangle_toplevel: bool,
    declared: HashMap<&'s str, Vec<usize>>,
    blocked: HashSet<&'s str>,
}

impl<'s> Bindings<'s> {
    fn new(source: &'s [u8], program: usize, mangle_toplevel: bool) -> Self {
        Self {
            source,
            program,
            mangle_toplevel,
            declared: HashMap::new(),
            blocked: HashSet::new(),
        }
    }

    fn visit(&mut self, node: Node<'_>) {
        let kind = node.kind();

        match kind {
            "variable_declarator" => {
                if let Some(name) = node.child_by_field_name("name") {
                    let scope = if node
                        .parent()
                        .is_some_and(|p| p.kind() == "variable_declaration")
                    {
                        var_scope(node)
                    } else {
                        block_scope(node)
                    };
                    self.bind_pattern(name, scope, node);
                }
            }
            "for_in_statement" => {
                if let (Some(declaration), Some(left)) = (
                    node.child_by_field_name("kind"),
                    node.child_by_field_name("left"),
                ) {
                    let scope = if node_text(declaration, self.source) == "var" {
                        var_scope(node)
                    } else {
                        node
                    };
                    self.bind_pattern(left, scope, node);
                }
            }
            "function_declaration" | "generator_function_declaration" => {
                if let Some(name) = node.child_by_field_name("name") {
                    // A function declared in a block still leaks into a
                    // script's global scope, but only the block is trusted
                    // to cover references inside a function.
                    let hoisted = var_scope(node);
                    let scope = if hoisted.id() == self.program {
                        hoisted
                    } else {
                        block_scope(node)
                    };
                    self.bind_pattern(name, scope, node);
                }
            }
            "class_declaration" => {
                if let Some(name) = node.child_by_field_name("name") {
                    self.bind_pattern(name, block_scope(node), node);
                }
            }
            "function_expression" | "function" | "generator_function" | "class" => {
                // A named function or class expression sees its own name only inside.
                if let Some(name) = node.child_by_field_name("name") {
                    self.bind_pattern(name, node, node);
                }
            }
            "catch_clause" => {
                if let Some(parameter) = node.child_by_field_name("parameter") {
                    self.bind_pattern(parameter, node, node);
                }
            }
            _ => {}
        }

        // Parameters cover the whole function. Body declarations are bound
        // to the body, which parameter defaults cannot see.
        if FUNCTION_KINDS.contains(&kind) {
            if let Some(parameters) = node.child_by_field_name("parameters") {
                for parameter in named_children(parameters) {
                    self.bind_pattern(parameter, node, node);
                }
            }
            if let Some(parameter) = node.child_by_field_name("parameter") {
                self.bind_pattern(parameter, node, node);
            }
        }
    }

    fn bind_pattern(&mut self, pattern: Node<'_>, scope: Node<'_>, declaration: Node<'_>) {
        match pattern.kind() {
            "identifier" | "shorthand_property_identifier_pattern" => {
                let name = node_text(pattern, self.source);
                self.bind(name, scope, declaration);
            }
            "pair_pattern" => {
                if let Some(value) = pattern.child_by_field_name("value") {
                    self.bind_pattern(value, scope, declaration);
                }
            }
            "assignment_pattern" | "object_assignment_pattern" => {
                if let Some(left) = pattern.child_by_field_name("left") {
                    self.bind_pattern(left, scope, declaration);
                }
            }
            "object_pattern" | "array_pattern" | "rest_pattern" => {
                for child in named_children(pattern) {
                    self.bind_pattern(child, scope, declaration);
                }
            }
            _ => {}
        }
    }

    fn bind(&mut self, name: &'s str, scope: Node<'_>, declaration: Node<'_>) {
        if scope.id() == self.program
            && (!self.mangle_toplevel || has_ancestor(declaration, &["export_statement"]))
        {
            self.blocked.insert(name);
            return;
        }

        self.declared.entry(name).or_default().push(scope.id());
    }

    /// Blocks a name when this occurrence escapes every declaring scope or
    /// belongs to a module boundary.
    fn check_occurrence(&mut self, occurrence: Node<'_>) {
        let name = node_text(occurrence, self.source);
        let Some(scopes) = self.declared.get(name) else {
            return;
        };

        let at_boundary = has_ancestor(occurrence, &["import_statement", "export_clause"])
            || occurrence
                .parent()
                .is_some_and(|p| p.kind().starts_with("jsx_"));

        let mut covered = false;
        let mut current = occurrence.parent();
        while let Some(node) = current {
            if scopes.contains(&node.id()) {
                covered = true;
                break;
            }
            current = node.parent();
        }

        if at_boundary || !covered {
            self.blocked.insert(name);
        }
    }

    fn is_renamable(&self, name: &str) -> bool {
        self.declared.contains_key(name) && !self.blocked.contains(name)
    }
}

/// Short identifiers in order: `a`..`$`, then `aa`, `ba`, ...
#[derive(Debug, Default)]
struct NameGenerator {
    index: usize,
}

impl NameGenerator {
    fn next_free<F>(&mut self, is_taken: F) -> String
    where
        F: Fn(&str) -> bool,
    {
        loop {
            let candidate = name_for(self.index);
            self.index += 1;
            if !is_taken(&candidate) {
                return candidate;
            }
        }
    }
}

fn name_for(mut index: usize) -> String {
    const FIRST: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ_$";
    const REST: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789_$";

    let mut name = String::new();
    name.push(FIRST[index % FIRST.len()] as char);
    index /= FIRST.len();

    while index > 0 {
        index -= 1;
        name.push(REST[index % REST.len()] as char);
        index /= REST.len();
    }

    name
}

fn uses_dynamic_scope(nodes: &[Node<'_>], source: &[u8]) -> bool {
    nodes.iter().any(|node| match node.kind() {
        "with_statement" => true,
        "call_expression" => node
            .child_by_field_name("function")
            .is_some_and(|f| f.kind() == "identifier" && node_text(f, source) == "eval"),
        _ => false,
    })
}

/// Where a `var` lives: the body of the nearest function or static block,
/// or the program.
fn var_scope(node: Node<'_>) -> Node<'_> {
    let mut last = node;
    let mut current = node.parent();
    while let Some(parent) = current {
        if parent.kind() == "program" {
            return parent;
        }
        if FUNCTION_KINDS.contains(&parent.kind()) || parent.kind() == "class_static_block" {
            return last;
        }
        last = parent;
        current = parent.parent();
    }
    last
}

/// Where a `let`, `const` or class lives: the nearest enclosing block.
fn block_scope(node: Node<'_>) -> Node<'_> {
    let mut last = node;
    let mut current = node.parent();
    while let Some(parent) = current {
        if BLOCK_SCOPE_KINDS.contains(&parent.kind()) {
            return parent;
        }
        if FUNCTION_KINDS.contains(&parent.kind()) {
            return last;
        }
        last = parent;
        current = parent.parent();
    }
    last
}

fn has_ancestor(node: Node<'_>, kinds: &[&str]) -> bool {
    let mut current = node.parent();
    while let Some(parent) = current {
        if kinds.contains(&parent.kind()) {
            return true;
        }
        current = parent.parent();
    }
    false
}

fn named_children(node: Node<'_>) -> Vec<Node<'_>> {
    let mut cursor = node.walk();
    let mut children = Vec::new();
    if cursor.goto_first_child() {
        loop {
            let child = cursor.node();
            if child.is_named() {
                children.push(child);
            }
            if !cursor.goto_next_sibling() {
                break;
            }
        }
    }
    children
}

/// Every node of the tree in document order.
fn collect_nodes(root: Node<'_>) -> Vec<Node<'_>> {
    let mut nodes = Vec::new();
    let mut cursor = root.walk();

    loop {
        nodes.push(cursor.node());
        if cursor.goto_first_child() {
            continue;
        }

        loop {
            if cursor.goto_next_sibling() {
                break;
            }
            if !cursor.goto_parent() {
                return nodes;
            }
        }
    }
}

fn node_text<'s>(node: Node<'_>, source: &'s [u8]) -> &'s str {
    std::str::from_utf8(&source[node.start_byte()..node.end_byte()]).unwrap_or_default()
}
