use anyhow::{bail, Result};
use std::path::Path;
use understandable::code_type::code_types_for;
use understandable::config::Config;
use understandable::interrupt::Interrupt;
use understandable::transform::Transformer;
use understandable::translator::{CommandTranslator, HttpTranslator, Passthrough, Translator};

/// Where function bodies are sent
pub enum Backend {
    Command(Vec<String>),
    Endpoint(String),
    DryRun,
}

impl Backend {
    fn translator(self) -> Result<Box<dyn Translator>> {
        Ok(match self {
            Backend::Command(command) => {
                let Some((program, args)) = command.split_first() else {
                    bail!("--command needs a program");
                };
                Box::new(CommandTranslator::new(program, args.to_vec())?)
            }
            Backend::Endpoint(url) => Box::new(HttpTranslator::new(&url)?),
            Backend::DryRun => Box::new(Passthrough),
        })
    }
}

pub fn execute(
    input: &Path,
    output: &Path,
    langs: &str,
    count: usize,
    force: bool,
    backend: Backend,
    config: Option<&Path>,
) -> Result<()> {
    let code_types = code_types_for(langs)?;
    let config = Config::load(config)?;

    println!("🔄 Transforming {} into {}...", input.display(), output.display());
    let mut transformer = Transformer::new(&code_types, &config, backend.translator()?, count, Interrupt::install())?;
    let stats = transformer.transform_dir(input, output, force)?;

    println!("✅ Transform complete");
    println!("   Files transformed: {}", stats.files_transformed);
    println!("   Functions:         {}", stats.functions_transformed);
    println!("   Files copied:      {}", stats.files_copied);
    println!("   Directories:       {}", stats.directories);
    println!("   Time:              {:.1}s", stats.elapsed.as_secs_f64());
    Ok(())
}
