//! Parser integration for the languages the extractor understands.
//!
//! Everything tree-sitter specific lives here. Callers get back plain names,
//! byte ranges and include targets, never syntax nodes.

use anyhow::Result;
use std::borrow::Cow;
use std::collections::HashMap;
use std::ops::Range;
use streaming_iterator::StreamingIterator;
use tree_sitter::{Node, Parser, Query, QueryCursor, Tree};

pub mod metal;
pub mod queries;

pub use metal::Metal;
use queries::QueryLoader;

/// Unified interface for parsing the supported languages
pub struct Analyzer {
    parsers: HashMap<Metal, Parser>,
    queries: HashMap<(Metal, QueryType), Query>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryType {
    Functions,
    Includes,
}

/// Parsed file with its AST
pub struct ParsedFile {
    pub tree: Tree,
    pub metal: Metal,
    pub source: Vec<u8>,
}

impl ParsedFile {
    /// Source text of a byte range, invalid UTF-8 replaced
    pub fn text(&self, range: Range<usize>) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.source[range])
    }

    /// Whether tree-sitter had to recover from syntax errors
    pub fn has_errors(&self) -> bool {
        self.tree.root_node().has_error()
    }
}

/// A function definition found in a file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionSpan {
    pub name: String,
    pub range: Range<usize>,
}

/// An `#include` directive
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Include {
    /// Target without quotes or angle brackets
    pub target: String,
    /// `<...>` form
    pub system: bool,
}

/// A top-level piece of a file. A file's units cover it without gaps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnitSpan {
    Function { name: String, range: Range<usize> },
    Other(Range<usize>),
}

/// Result from running a tree-sitter query
#[derive(Debug, Clone)]
pub struct QueryMatch {
    pub capture_name: String,
    pub text: String,
    pub range: Range<usize>,
}

impl Analyzer {
    /// Create an analyzer with every supported metal
    pub fn new() -> Result<Self> {
        Self::with_metals(&Metal::all())
    }

    /// Create an analyzer for a single metal
    pub fn for_metal(metal: Metal) -> Result<Self> {
        Self::with_metals(&[metal])
    }

    fn with_metals(metals: &[Metal]) -> Result<Self> {
        let mut parsers = HashMap::new();
        let mut queries = HashMap::new();

        for &metal in metals {
            let mut parser = Parser::new();
            parser
                .set_language(&metal.tree_sitter_language())
                .map_err(|e| anyhow::anyhow!("Failed to set language for {:?}: {}", metal, e))?;
            parsers.insert(metal, parser);

            for query_type in [QueryType::Functions, QueryType::Includes] {
                queries.insert((metal, query_type), QueryLoader::load_query(metal, query_type)?);
            }
        }

        Ok(Self { parsers, queries })
    }

    /// Parse source bytes into an AST
    pub fn parse(&mut self, source: Vec<u8>, metal: Metal) -> Result<ParsedFile> {
        let parser = self
            .parsers
            .get_mut(&metal)
            .ok_or_else(|| anyhow::anyhow!("No parser available for {:?}", metal))?;

        let tree = parser
            .parse(&source, None)
            .ok_or_else(|| anyhow::anyhow!("Failed to parse source"))?;

        Ok(ParsedFile { tree, metal, source })
    }

    /// Run a query on a parsed file
    pub fn run_query(&self, file: &ParsedFile, query_type: QueryType) -> Result<Vec<QueryMatch>> {
        let query = self.query(file.metal, query_type)?;

        let mut cursor = QueryCursor::new();
        let mut matches = cursor.matches(query, file.tree.root_node(), file.source.as_slice());

        let mut results = Vec::new();
        while let Some(m) = matches.next() {
            for capture in m.captures {
                let node = capture.node;
                results.push(QueryMatch {
                    capture_name: query.capture_names()[capture.index as usize].to_string(),
                    text: file.text(node.byte_range()).into_owned(),
                    range: node.byte_range(),
                });
            }
        }

        Ok(results)
    }

    /// Every function definition in the file, methods included, in document order
    pub fn functions(&self, file: &ParsedFile) -> Result<Vec<FunctionSpan>> {
        let query = self.query(file.metal, QueryType::Functions)?;
        let fn_index = query
            .capture_index_for_name("fn")
            .ok_or_else(|| anyhow::anyhow!("Function query has no @fn capture"))?;
        let declarator_index = query
            .capture_index_for_name("fn.declarator")
            .ok_or_else(|| anyhow::anyhow!("Function query has no @fn.declarator capture"))?;

        let mut cursor = QueryCursor::new();
        let mut matches = cursor.matches(query, file.tree.root_node(), file.source.as_slice());

        let mut functions = Vec::new();
        while let Some(m) = matches.next() {
            let definition = m.captures.iter().find(|c| c.index == fn_index).map(|c| c.node);
            let declarator = m
                .captures
                .iter()
                .find(|c| c.index == declarator_index)
                .map(|c| c.node);
            let (Some(definition), Some(declarator)) = (definition, declarator) else {
                continue;
            };
            if let Some(name) = qualified_name(definition, declarator, file) {
                functions.push(FunctionSpan {
                    name,
                    range: definition.byte_range(),
                });
            }
        }

        Ok(functions)
    }

    /// Every `#include` directive in the file
    pub fn includes(&self, file: &ParsedFile) -> Result<Vec<Include>> {
        let includes = self
            .run_query(file, QueryType::Includes)?
            .into_iter()
            .filter_map(|m| {
                let system = match m.capture_name.as_str() {
                    "include" => false,
                    "system_include" => true,
                    _ => return None,
                };
                let target = m
                    .text
                    .trim()
                    .trim_matches(|c| matches!(c, '"' | '<' | '>'))
                    .to_string();
                (!target.is_empty()).then_some(Include { target, system })
            })
            .collect();
        Ok(includes)
    }

    /// Split the file into top-level functions and the text around them
    pub fn top_level_units(&self, file: &ParsedFile) -> Vec<UnitSpan> {
        let root = file.tree.root_node();
        let mut units = Vec::new();
        let mut position = 0;

        let mut cursor = root.walk();
        for child in root.children(&mut cursor) {
            if !file.metal.is_function_node(&child) {
                continue;
            }
            let Some(name) = definition_name(child, file) else {
                continue;
            };
            if child.start_byte() > position {
                units.push(UnitSpan::Other(position..child.start_byte()));
            }
            units.push(UnitSpan::Function {
                name,
                range: child.byte_range(),
            });
            position = child.end_byte();
        }

        if file.source.len() > position {
            units.push(UnitSpan::Other(position..file.source.len()));
        }
        units
    }

    fn query(&self, metal: Metal, query_type: QueryType) -> Result<&Query> {
        self.queries
            .get(&(metal, query_type))
            .ok_or_else(|| anyhow::anyhow!("No {:?} query for {:?}", query_type, metal))
    }
}

/// Name of a function definition, or of the definition wrapped by a template
fn definition_name(node: Node, file: &ParsedFile) -> Option<String> {
    if node.kind() == "template_declaration" {
        let mut cursor = node.walk();
        let inner = node
            .named_children(&mut cursor)
            .find(|child| child.kind() == "function_definition")?;
        return definition_name(inner, file);
    }
    let declarator = node.child_by_field_name("declarator")?;
    qualified_name(node, declarator, file)
}

/// Declared name prefixed with enclosing namespaces and classes
fn qualified_name(definition: Node, declarator: Node, file: &ParsedFile) -> Option<String> {
    let name = declarator_name(declarator, file)?;

    let mut scopes = Vec::new();
    let mut current = definition.parent();
    while let Some(parent) = current {
        if file.metal.is_scope_kind(parent.kind()) {
            if let Some(scope_name) = parent.child_by_field_name("name") {
                scopes.push(file.text(scope_name.byte_range()).trim().to_string());
            }
        }
        current = parent.parent();
    }

    if scopes.is_empty() {
        return Some(name);
    }
    scopes.reverse();
    scopes.push(name);
    Some(scopes.join("::"))
}

/// Walk down nested declarators (iterative, they can nest deeply) to the name
fn declarator_name(declarator: Node, file: &ParsedFile) -> Option<String> {
    let mut current = declarator;

    loop {
        match current.kind() {
            "identifier" | "field_identifier" | "destructor_name" | "operator_name"
            | "qualified_identifier" | "template_function" | "operator_cast" => {
                let name = file.text(current.byte_range()).trim().to_string();
                return (!name.is_empty()).then_some(name);
            }
            "function_declarator" | "pointer_declarator" | "reference_declarator"
            | "parenthesized_declarator" | "attributed_declarator" => {
                current = current
                    .child_by_field_name("declarator")
                    .or_else(|| current.named_child(0))?;
            }
            _ => return None,
        }
    }
}
