use std::fs;
use std::path::Path;

use analyzer::ruby::parse_source;
use anyhow::{Context, Result};

pub fn run(file: &Path) -> Result<()> {
    let source =
        fs::read_to_string(file).with_context(|| format!("cannot read {}", file.display()))?;
    let parsed = parse_source(&source, file)
        .with_context(|| format!("cannot parse {}", file.display()))?;
    println!("{}", parsed.root.to_sexp());
    Ok(())
}
