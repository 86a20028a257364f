//! Decompiler output format.
//!
//! Decompiled files are pre-segmented: each function is introduced by a line
//! `// FUNCTION <name>` and runs until the next such line. Text before the
//! first sentinel is a preamble and belongs to no function.

use log::debug;
use regex::Regex;
use std::path::Path;
use std::sync::OnceLock;

use super::Function;
use crate::error::ScrapeError;

/// Sentinel line, including its line break. The name may be missing.
fn sentinel_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?m)^// FUNCTION(?: ([^\r\n]*))?\r?(?:\n|$)").expect("Invalid function sentinel regex")
    })
}

/// Split on named sentinels: the preamble, then alternating name and text.
///
/// A sentinel with a blank name does not split.
pub fn split_segments(text: &str) -> Vec<&str> {
    let mut segments = Vec::new();
    let mut last = 0;

    for captures in sentinel_regex().captures_iter(text) {
        let (Some(sentinel), Some(name)) = (captures.get(0), captures.get(1)) else {
            continue;
        };
        if name.as_str().trim().is_empty() {
            continue;
        }
        segments.push(&text[last..sentinel.start()]);
        segments.push(name.as_str());
        last = sentinel.end();
    }
    segments.push(&text[last..]);

    segments
}

/// Functions of a decompiled file's text. `path` is only used for errors.
pub fn parse_functions(path: &Path, text: &str) -> Result<Vec<Function>, ScrapeError> {
    let segments = split_segments(text);
    let sentinels = sentinel_regex().find_iter(text).count();
    if segments.len() != 2 * sentinels + 1 {
        return Err(ScrapeError::Format {
            path: path.to_path_buf(),
            segments: segments.len(),
        });
    }

    Ok(segments[1..]
        .chunks_exact(2)
        .map(|pair| Function::new(pair[0].trim_end(), pair[1]))
        .collect())
}

/// Read and split a decompiled file. Invalid UTF-8 is replaced.
///
/// Empty files are valid: some decompiler runs emit them on purpose.
pub fn scrape(path: &Path) -> Result<Vec<Function>, ScrapeError> {
    let bytes = std::fs::read(path).map_err(|source| ScrapeError::Unreadable {
        path: path.to_path_buf(),
        source,
    })?;
    if bytes.is_empty() {
        debug!("Skipping empty file {}", path.display());
        return Ok(Vec::new());
    }

    let text = String::from_utf8_lossy(&bytes);
    let functions = parse_functions(path, &text)?;
    if functions.is_empty() {
        debug!("No function sentinels in {}", path.display());
    }
    Ok(functions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use tempfile::TempDir;

    #[test]
    fn test_two_functions() -> Result<()> {
        let text = "// FUNCTION a\nbody_a\n// FUNCTION b\nbody_b\n";
        assert_eq!(split_segments(text).len(), 5);

        let functions = parse_functions(Path::new("x.o.c"), text)?;
        assert_eq!(
            functions,
            vec![Function::new("a", "body_a\n"), Function::new("b", "body_b\n")]
        );
        Ok(())
    }

    #[test]
    fn test_preamble_is_dropped() -> Result<()> {
        let text = "/* generated */\n#include <stdint.h>\n// FUNCTION main\nint main(void) { return 0; }\n";
        let functions = parse_functions(Path::new("x.o.c"), text)?;
        assert_eq!(functions.len(), 1);
        assert_eq!(functions[0].name, "main");
        assert_eq!(functions[0].text, "int main(void) { return 0; }\n");
        Ok(())
    }

    #[test]
    fn test_no_sentinel_is_degenerate() -> Result<()> {
        let text = "int f(void) { return 0; }\n";
        assert_eq!(split_segments(text).len(), 1);
        assert!(parse_functions(Path::new("x.o.c"), text)?.is_empty());
        Ok(())
    }

    #[test]
    fn test_names_with_punctuation() -> Result<()> {
        let text = "// FUNCTION ns::Foo<int>::bar(int)\r\n{ }\r\n// FUNCTION operator+\n{ }";
        let functions = parse_functions(Path::new("x.o.cpp"), text)?;
        assert_eq!(functions[0].name, "ns::Foo<int>::bar(int)");
        assert_eq!(functions[0].text, "{ }\r\n");
        assert_eq!(functions[1].name, "operator+");
        assert_eq!(functions[1].text, "{ }");
        Ok(())
    }

    #[test]
    fn test_sentinel_must_start_line() -> Result<()> {
        let text = "// FUNCTION a\nx = 1; // FUNCTION b\n";
        let functions = parse_functions(Path::new("x.o.c"), text)?;
        assert_eq!(functions, vec![Function::new("a", "x = 1; // FUNCTION b\n")]);
        Ok(())
    }

    #[test]
    fn test_nameless_sentinel_is_a_format_error() {
        for text in [
            "// FUNCTION a\n{ }\n// FUNCTION\n{ }\n",
            "// FUNCTION   \n{ }\n",
        ] {
            let result = parse_functions(Path::new("x.o.c"), text);
            assert!(
                matches!(result, Err(ScrapeError::Format { segments, .. }) if segments % 2 == 1),
                "{:?}",
                text
            );
        }
    }

    #[test]
    fn test_sentinel_prefix_in_longer_word_is_text() -> Result<()> {
        let text = "// FUNCTIONAL notes\n// FUNCTION a\n{ }\n";
        let functions = parse_functions(Path::new("x.o.c"), text)?;
        assert_eq!(functions, vec![Function::new("a", "{ }\n")]);
        Ok(())
    }

    #[test]
    fn test_empty_file_contributes_nothing() -> Result<()> {
        let temp = TempDir::new()?;
        let path = temp.path().join("empty.o.c");
        std::fs::write(&path, "")?;
        assert!(scrape(&path)?.is_empty());
        Ok(())
    }

    #[test]
    fn test_invalid_utf8_is_replaced() -> Result<()> {
        let temp = TempDir::new()?;
        let path = temp.path().join("bad.o.c");
        let mut bytes = b"// FUNCTION f\nint f(void) { return '".to_vec();
        bytes.push(0xfe);
        bytes.extend_from_slice(b"'; }\n");
        std::fs::write(&path, bytes)?;

        let functions = scrape(&path)?;
        assert_eq!(functions.len(), 1);
        assert!(functions[0].text.contains('\u{FFFD}'));
        Ok(())
    }

    #[test]
    fn test_missing_file_is_unreadable() {
        let result = scrape(Path::new("/definitely/not/here.o.c"));
        assert!(matches!(result, Err(ScrapeError::Unreadable { .. })));
    }
}
