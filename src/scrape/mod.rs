//! Function-level scraping shared by every language.
//!
//! Parsing itself lives behind [`crate::code_type::LanguageModel`]; this module
//! holds the language-neutral pieces: what a scraped function looks like, the
//! decompiled sentinel format, include resolution and the brace split.

pub mod decompiled;
pub mod includes;

/// A function scraped from a file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Function {
    /// Declared name, possibly namespace or template qualified
    pub name: String,
    /// Exact text of the definition
    pub text: String,
}

impl Function {
    pub fn new(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            text: text.into(),
        }
    }

    /// A definition rather than a bare declaration
    pub fn has_body(&self) -> bool {
        self.text.contains('{')
    }
}

/// A top-level piece of a file, in file order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Unit {
    Function(Function),
    /// Text between functions, reproduced unchanged
    Other(String),
}

impl Unit {
    pub fn text(&self) -> &str {
        match self {
            Unit::Function(function) => &function.text,
            Unit::Other(text) => text,
        }
    }
}

/// A function's text cut at its outermost braces
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FunctionParts<'a> {
    /// Up to and including the first `{`
    pub head: &'a str,
    /// Between the first `{` and the last `}`
    pub body: &'a str,
    /// The last `}` onward
    pub tail: &'a str,
}

impl FunctionParts<'_> {
    /// The body with one pair of braces around it
    pub fn braced_body(&self) -> String {
        format!("{{{}}}", self.body)
    }
}

/// Split function text into head, body and tail.
///
/// Never fails. Without a `}` after the first `{` the body runs to the end and
/// the tail is empty. Without any `{` everything is head.
pub fn split_function(text: &str) -> FunctionParts<'_> {
    let Some(open) = text.find('{') else {
        return FunctionParts {
            head: text,
            body: "",
            tail: "",
        };
    };
    let body_start = open + 1;
    let head = &text[..body_start];

    match text.rfind('}') {
        Some(close) if close >= body_start => FunctionParts {
            head,
            body: &text[body_start..close],
            tail: &text[close..],
        },
        _ => FunctionParts {
            head,
            body: &text[body_start..],
            tail: "",
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_complete_function() {
        let parts = split_function("int f() { return 1; }");
        assert_eq!(parts.head, "int f() {");
        assert_eq!(parts.body, " return 1; ");
        assert_eq!(parts.tail, "}");
        assert_eq!(parts.braced_body(), "{ return 1; }");
    }

    #[test]
    fn test_split_truncated_function() {
        let parts = split_function("int f() {");
        assert_eq!(parts.head, "int f() {");
        assert_eq!(parts.body, "");
        assert_eq!(parts.tail, "");

        let parts = split_function("void g(void) {\n  if (x) { y();\n");
        assert_eq!(parts.body, "\n  if (x) { y();\n");
        assert_eq!(parts.tail, "");
    }

    #[test]
    fn test_split_uses_outermost_braces() {
        let parts = split_function("void f() { if (a) { b(); } }\n");
        assert_eq!(parts.head, "void f() {");
        assert_eq!(parts.body, " if (a) { b(); } ");
        assert_eq!(parts.tail, "}\n");
    }

    #[test]
    fn test_split_without_open_brace() {
        let parts = split_function("int f(void);");
        assert_eq!(parts.head, "int f(void);");
        assert_eq!(parts.body, "");
        assert_eq!(parts.tail, "");
    }

    #[test]
    fn test_split_close_brace_before_open() {
        let parts = split_function("} int f() { x");
        assert_eq!(parts.head, "} int f() {");
        assert_eq!(parts.body, " x");
        assert_eq!(parts.tail, "");
    }

    #[test]
    fn test_parts_reassemble() {
        let text = "static int g(int *p)\n{\n  return *p;\n}\n";
        let parts = split_function(text);
        assert_eq!(format!("{}{}{}", parts.head, parts.body, parts.tail), text);
    }

    #[test]
    fn test_has_body() {
        assert!(Function::new("f", "int f() {}").has_body());
        assert!(!Function::new("f", "int f();").has_body());
    }
}
