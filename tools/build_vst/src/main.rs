use anyhow::{bail, Context, Result};
use clap::Parser;
use std::fs::create_dir_all;
use std::path::{Path, PathBuf};
use varnam_core::{artifact_paths, SchemeDefinition, SymbolStore, SymbolTable};

#[derive(Parser)]
#[command(about = "Build symbol table artifacts from a TOML scheme")]
struct Args {
    /// Input scheme file
    #[arg(long)]
    scheme: PathBuf,

    /// Output prefix; writes `<out>.fst` and `<out>.bincode`
    #[arg(long)]
    out: PathBuf,
}

/// Build the table for `scheme` and save it under `out`, returning it.
fn build(scheme: &Path, out: &Path) -> Result<SymbolTable> {
    let def = SchemeDefinition::load_toml(scheme)
        .with_context(|| format!("failed to read scheme {}", scheme.display()))?;
    let table = def.into_table()?;
    if table.is_empty() {
        bail!("scheme {} defines no symbols", scheme.display());
    }

    if let Some(parent) = out.parent().filter(|p| !p.as_os_str().is_empty()) {
        create_dir_all(parent)?;
    }
    table
        .save(out)
        .with_context(|| format!("failed to write artifacts under {}", out.display()))?;

    // Reopen to verify the written artifacts.
    SymbolTable::open(out)?;
    Ok(table)
}

fn main() -> Result<()> {
    let args = Args::parse();
    let table = build(&args.scheme, &args.out)?;
    let (fst_path, bin_path) = artifact_paths(&args.out);
    println!(
        "Built {} ({} symbols, longest pattern {}) -> {} / {}",
        table.scheme().identifier,
        table.len(),
        table.max_pattern_length(),
        fst_path.display(),
        bin_path.display()
    );
    Ok(())
}
