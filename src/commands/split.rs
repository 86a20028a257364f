use anyhow::{bail, Result};
use std::path::Path;
use understandable::dataset::ModelData;
use understandable::paths;

/// Move the last `ratio` of `input` into `output`, rewriting `input` with the rest
pub fn execute(input: &Path, output: &Path, ratio: f64, force: bool) -> Result<()> {
    if input == output {
        bail!("Held-out file must differ from the input");
    }
    let mut data = ModelData::load(input)?;
    paths::prepare_output_file(output, force)?;

    let mut held_out = data.split_off_end(ratio)?;
    held_out.save(output)?;
    data.save(input)?;

    println!("✂️  Split {} examples", data.len() + held_out.len());
    println!("   Kept:     {} in {}", data.len(), input.display());
    println!("   Held out: {} in {}", held_out.len(), output.display());
    Ok(())
}
