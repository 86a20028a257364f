use anyhow::Result;
use log::warn;
use std::path::Path;
use understandable::code_type::code_types_for;
use understandable::config::Config;
use understandable::dataset::ModelData;
use understandable::error::is_interrupted;
use understandable::interrupt::Interrupt;
use understandable::paths;
use understandable::walk::Walker;

/// Extract example pairs from every artifact under `input` into `output`
pub fn execute(input: &Path, output: &Path, langs: &str, count: usize, force: bool, config: Option<&Path>) -> Result<()> {
    let code_types = code_types_for(langs)?;
    let config = Config::load(config)?;
    paths::check_dir(input)?;
    paths::prepare_output_file(output, force)?;

    println!("🔄 Extracting examples from {}...", input.display());
    let mut walker = Walker::new(&code_types, &config, Interrupt::install())?;
    let mut data = ModelData::new(count);

    match walker.add_repo(&mut data, input) {
        Ok(stats) => {
            data.save(output)?;
            println!("✅ Saved {} examples to {}", data.len(), output.display());
            println!("   Artifacts:        {}", stats.artifacts);
            println!("   Source files:     {}", stats.source_files);
            println!("   Decompiled files: {}", stats.decompiled_files);
            println!("   Ignored files:    {}", stats.ignored_files);
            println!("   Failed files:     {}", stats.failed_files);
            println!(
                "   Unmatched:        {} without source, {} without decompiled",
                stats.missing_sources, stats.missing_decompileds
            );
            println!("   Time:             {:.1}s", stats.elapsed.as_secs_f64());
            Ok(())
        }
        Err(e) if is_interrupted(&e) => {
            warn!("Interrupted, saving examples from completed artifacts");
            data.save(output)?;
            println!("⚠️  Interrupted: saved {} examples to {}", data.len(), output.display());
            Err(e)
        }
        Err(e) => Err(e),
    }
}
