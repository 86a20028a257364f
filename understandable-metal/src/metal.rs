use tree_sitter::Language as TSLanguage;

/// Grammars the extractor can parse (metals)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Metal {
    C,
    Cpp,
}

impl Metal {
    /// Get all supported metals
    pub fn all() -> Vec<Metal> {
        vec![Metal::C, Metal::Cpp]
    }

    /// Get the tree-sitter language for this metal
    pub fn tree_sitter_language(&self) -> TSLanguage {
        match self {
            Metal::C => tree_sitter_c::LANGUAGE.into(),
            Metal::Cpp => tree_sitter_cpp::LANGUAGE.into(),
        }
    }

    /// Whether a top-level node of this kind is a function definition
    ///
    /// C++ templates wrap the definition, so the whole template counts.
    pub fn is_function_node(&self, node: &tree_sitter::Node) -> bool {
        match node.kind() {
            "function_definition" => true,
            "template_declaration" if *self == Metal::Cpp => {
                let mut cursor = node.walk();
                let found = node
                    .named_children(&mut cursor)
                    .any(|child| child.kind() == "function_definition");
                found
            }
            _ => false,
        }
    }

    /// Node kinds whose name qualifies the functions defined inside them
    pub fn is_scope_kind(&self, node_kind: &str) -> bool {
        match self {
            Metal::C => false,
            Metal::Cpp => matches!(
                node_kind,
                "namespace_definition" | "class_specifier" | "struct_specifier" | "union_specifier"
            ),
        }
    }
}
