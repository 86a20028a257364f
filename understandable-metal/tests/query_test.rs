use understandable_metal::{Analyzer, Include, Metal, QueryType};

fn function_names(metal: Metal, source: &str) -> Vec<String> {
    let mut analyzer = Analyzer::for_metal(metal).expect("Failed to create analyzer");
    let parsed = analyzer
        .parse(source.as_bytes().to_vec(), metal)
        .expect("Failed to parse");
    analyzer
        .functions(&parsed)
        .expect("Failed to run query")
        .into_iter()
        .map(|f| f.name)
        .collect()
}

#[test]
fn test_c_function_query() {
    let source = r#"
#include <stdio.h>

static int counter;

int add(int a, int b) {
    return a + b;
}

char *name_of(int id) {
    return 0;
}

int declared_only(void);
"#;
    assert_eq!(function_names(Metal::C, source), vec!["add", "name_of"]);
}

#[test]
fn test_function_span_is_exact_text() {
    let source = "int add(int a,int b){return a+b;}\n";
    let mut analyzer = Analyzer::for_metal(Metal::C).expect("Failed to create analyzer");
    let parsed = analyzer
        .parse(source.as_bytes().to_vec(), Metal::C)
        .expect("Failed to parse");
    let functions = analyzer.functions(&parsed).expect("Failed to run query");
    assert_eq!(functions.len(), 1);
    assert_eq!(parsed.text(functions[0].range.clone()), "int add(int a,int b){return a+b;}");
}

#[test]
fn test_cpp_function_query_qualifies_names() {
    let source = r#"
namespace outer {
class Widget {
public:
    int size() const { return 1; }
    ~Widget() { }
};

int free_function() { return 2; }
}

int outer::Widget::extra(int x) { return x; }

template <typename T>
T identity(T value) { return value; }

int &ref_to(int &x) { return x; }
"#;
    let names = function_names(Metal::Cpp, source);
    assert_eq!(
        names,
        vec![
            "outer::Widget::size",
            "outer::Widget::~Widget",
            "outer::free_function",
            "outer::Widget::extra",
            "identity",
            "ref_to",
        ]
    );
}

#[test]
fn test_include_query() {
    let source = r#"
#include <stdlib.h>
#include "local/header.h"

int main(void) { return 0; }
"#;
    let mut analyzer = Analyzer::for_metal(Metal::C).expect("Failed to create analyzer");
    let parsed = analyzer
        .parse(source.as_bytes().to_vec(), Metal::C)
        .expect("Failed to parse");

    let includes = analyzer.includes(&parsed).expect("Failed to run query");
    assert_eq!(
        includes,
        vec![
            Include {
                target: "stdlib.h".to_string(),
                system: true,
            },
            Include {
                target: "local/header.h".to_string(),
                system: false,
            },
        ]
    );
}

#[test]
fn test_run_query_reports_capture_names() {
    let source = "#include \"a.h\"\n";
    let mut analyzer = Analyzer::for_metal(Metal::Cpp).expect("Failed to create analyzer");
    let parsed = analyzer
        .parse(source.as_bytes().to_vec(), Metal::Cpp)
        .expect("Failed to parse");

    let matches = analyzer
        .run_query(&parsed, QueryType::Includes)
        .expect("Failed to run query");
    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0].capture_name, "include");
    assert_eq!(matches[0].text, "\"a.h\"");
    assert_eq!(matches[0].range, 9..14);
}
