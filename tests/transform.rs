//! Transform driver over decompiled trees

use anyhow::Result;
use std::fs;
use tempfile::TempDir;
use understandable::code_type::{CODE_TYPE_C, CODE_TYPE_CPP};
use understandable::interrupt::Interrupt;
use understandable::transform::Transformer;
use understandable::translator::{Passthrough, Translator};
use understandable::Config;

#[test]
fn test_passthrough_preserves_text() -> Result<()> {
    let temp = TempDir::new()?;
    let input = temp.path().join("in");
    fs::create_dir_all(input.join("a/b/c"))?;
    let text = "#include <stdint.h>\n\n// FUNCTION f\nstatic int f(int *p)\n{\n  return *p;\n}\n\n// FUNCTION g\nvoid g(void) {\n}\n";
    fs::write(input.join("a/b/c/deep.o.c"), text)?;

    let output = temp.path().join("out");
    let mut transformer = Transformer::new(&[&CODE_TYPE_C], &Config::default(), Box::new(Passthrough), 0, Interrupt::new())?;
    let stats = transformer.transform_dir(&input, &output, false)?;

    assert_eq!(fs::read_to_string(output.join("a/b/c/deep.c"))?, text);
    assert_eq!(stats.functions_transformed, 2);
    assert_eq!(stats.directories, 3);
    Ok(())
}

#[test]
fn test_bodies_are_sent_in_document_order() -> Result<()> {
    let temp = TempDir::new()?;
    let input = temp.path().join("in");
    fs::create_dir_all(&input)?;
    fs::write(
        input.join("m.o.cpp"),
        "// FUNCTION one\nint one() { return 1; }\n// FUNCTION two\nint two() { return 2; }\n",
    )?;

    let mut counter = 0;
    let numbering = move |body: &str| -> Result<String> {
        counter += 1;
        Ok(format!(" /* {} */{}", counter, body))
    };
    let output = temp.path().join("out");
    let mut transformer = Transformer::new(&[&CODE_TYPE_CPP], &Config::default(), Box::new(numbering), 0, Interrupt::new())?;
    transformer.transform_dir(&input, &output, false)?;

    assert_eq!(
        fs::read_to_string(output.join("m.cpp"))?,
        "// FUNCTION one\nint one() { /* 1 */ return 1; }\n// FUNCTION two\nint two() { /* 2 */ return 2; }\n"
    );
    Ok(())
}

#[test]
fn test_translator_failure_is_fatal() -> Result<()> {
    let temp = TempDir::new()?;
    let input = temp.path().join("in");
    fs::create_dir_all(&input)?;
    fs::write(input.join("x.o.c"), "// FUNCTION f\nint f(void) { return 0; }\n")?;

    struct Failing;
    impl Translator for Failing {
        fn translate(&mut self, _body: &str) -> Result<String> {
            anyhow::bail!("model offline")
        }
    }

    let mut transformer = Transformer::new(&[&CODE_TYPE_C], &Config::default(), Box::new(Failing), 0, Interrupt::new())?;
    let error = transformer
        .transform_dir(&input, &temp.path().join("out"), false)
        .unwrap_err();
    assert!(format!("{:#}", error).contains("model offline"));
    Ok(())
}

#[test]
fn test_text_bytecode_is_transformed() -> Result<()> {
    let temp = TempDir::new()?;
    let input = temp.path().join("in");
    fs::create_dir_all(&input)?;
    fs::write(input.join("dump.o"), "int f(void) { return 0; }\n")?;

    let output = temp.path().join("out");
    let mut transformer = Transformer::new(&[&CODE_TYPE_C], &Config::default(), Box::new(Passthrough), 0, Interrupt::new())?;
    let stats = transformer.transform_dir(&input, &output, false)?;

    assert_eq!(stats.files_transformed, 1);
    assert_eq!(fs::read_to_string(output.join("dump.c"))?, "int f(void) { return 0; }\n");
    Ok(())
}
