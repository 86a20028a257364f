use anyhow::Result;
use std::path::Path;
use understandable::code_type::code_types_for;
use understandable::dataset::ModelData;

/// Print a filtered view of a saved dataset
pub fn execute(input: &Path, langs: Option<&str>, count: usize, skip: usize, shuffle: Option<u64>) -> Result<()> {
    let mut data = ModelData::load(input)?;
    let total = data.len();

    if let Some(langs) = langs {
        let langs: Vec<_> = code_types_for(langs)?.iter().map(|ct| ct.lang).collect();
        data.limit_code_types(&langs);
    }
    if let Some(seed) = shuffle {
        data.shuffle(seed);
    }
    data.limit_count(count, skip);

    data.print();

    println!("📊 {} of {} examples shown", data.len(), total);
    for (lang, n) in data.lang_counts() {
        println!("   {}: {}", lang, n);
    }
    Ok(())
}
