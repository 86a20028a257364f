use crate::{Metal, QueryType};
use anyhow::Result;
use tree_sitter::Query;

/// Compiles the embedded tree-sitter queries
pub struct QueryLoader;

impl QueryLoader {
    /// Load a query for a specific metal and type
    pub fn load_query(metal: Metal, query_type: QueryType) -> Result<Query> {
        let query_text = match query_type {
            QueryType::Functions => FUNCTIONS_QUERY,
            QueryType::Includes => INCLUDES_QUERY,
        };

        let language = metal.tree_sitter_language();
        Query::new(&language, query_text)
            .map_err(|e| anyhow::anyhow!("Failed to create {:?} query for {:?}: {}", query_type, metal, e))
    }
}

// The C and C++ grammars share node names for both queries. The declarator is
// resolved to a name in code since it nests arbitrarily (pointers, references,
// parentheses, qualified and template names).

const FUNCTIONS_QUERY: &str = r#"
(function_definition
  declarator: (_) @fn.declarator) @fn
"#;

const INCLUDES_QUERY: &str = r#"
(preproc_include
  [
    (string_literal) @include
    (system_lib_string) @system_include
  ])
"#;
