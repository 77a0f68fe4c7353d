use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{value_parser, Arg, Command};
use memmap2::Mmap;
use tracing_subscriber::EnvFilter;

use symbolic_symsrv::{is_pe, locate_pdb, PdbStreams, SymbolCache};
use symbolic_tpi::{dump_types, read_type_stream, DumpSummary, TypeTable};

fn print_error(error: &anyhow::Error) {
    eprintln!("Error: {error}");

    for cause in error.chain().skip(1) {
        eprintln!("   caused by {cause}");
    }
}

fn map_file(path: &Path) -> Result<Mmap> {
    let file = File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    let mmap = unsafe { Mmap::map(&file) }
        .with_context(|| format!("failed to map {}", path.display()))?;
    Ok(mmap)
}

fn read_pdb_types(data: &[u8], path: &Path) -> Result<Vec<u8>> {
    if !PdbStreams::test(data) {
        anyhow::bail!("{} is neither a PDB file nor a PE image", path.display());
    }

    let mut streams = PdbStreams::open(data)
        .with_context(|| format!("failed to open PDB file {}", path.display()))?;
    read_type_stream(&mut streams).context("failed to read the type stream")
}

/// Reads the type stream from a PDB file, or from the PDB file referenced by a PE image.
fn load_type_stream(path: &Path) -> Result<Vec<u8>> {
    let data = map_file(path)?;
    if !is_pe(&data) {
        return read_pdb_types(&data, path);
    }

    let reference = locate_pdb(&data)
        .with_context(|| format!("failed to locate the PDB file of {}", path.display()))?;
    tracing::info!(
        file_name = %reference.file_name,
        key = %reference.cache_key(),
        "image references PDB file"
    );

    let cache = SymbolCache::from_env()?;
    let pdb_path = cache
        .fetch(&reference)
        .with_context(|| format!("failed to fetch {}", reference.file_name))?;

    let pdb_data = map_file(&pdb_path)?;
    read_pdb_types(&pdb_data, &pdb_path)
}

fn execute(path: &Path) -> Result<DumpSummary> {
    let stream = load_type_stream(path)?;
    let table = TypeTable::parse(&stream).context("failed to parse the type stream")?;

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    let summary = dump_types(&table, &mut out).context("failed to write declarations")?;
    out.flush().context("failed to write declarations")?;

    tracing::info!(
        declarations = summary.declarations,
        skipped = summary.skipped,
        failed = summary.failed,
        "finished"
    );

    Ok(summary)
}

fn main() -> ExitCode {
    let matches = Command::new("pdbdump")
        .about("Prints C declarations for the types in a PDB file")
        .arg(
            Arg::new("path")
                .required(true)
                .value_name("PATH")
                .value_parser(value_parser!(PathBuf))
                .help("Path to a PDB file, or to a PE image referencing one")
                .index(1),
        )
        .get_matches();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let Some(path) = matches.get_one::<PathBuf>("path") else {
        return ExitCode::FAILURE;
    };

    match execute(path) {
        Ok(summary) if summary.is_total_failure() => {
            eprintln!("Error: none of the {} types could be processed", summary.failed);
            ExitCode::FAILURE
        }
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            print_error(&e);
            ExitCode::FAILURE
        }
    }
}
