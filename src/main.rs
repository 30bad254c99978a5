//! Command-line entry point for mdzip.
//!
//! Reads a Markdown listing from a file, URL, stdin or `--text`, and writes
//! the resulting ZIP archive to disk or stdout.

use anyhow::Result;
use clap::Parser;
use std::io::{ErrorKind, IsTerminal};
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;

use mdzip::error::MdzipError;
use mdzip::pipeline::{self, Outcome};
use mdzip::{ArchiveBuilder, Cli, ZipReader};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(cli.log_level())
        .with_target(false)
        .with_ansi(std::io::stderr().is_terminal())
        .init();

    run(&cli).await
}

async fn run(cli: &Cli) -> Result<()> {
    let mut document = pipeline::load(cli.input()?, &cli.load_options()).await?;
    if let Some(name) = &cli.name {
        document.name_hint = name.clone();
    }

    let builder = ArchiveBuilder::new(cli.archive_writer(), cli.build_options());
    let outcome = pipeline::process(&document, &builder).await?;

    // List mode: show what the archive holds and write nothing
    if cli.list {
        return list_entries(&outcome);
    }

    if cli.test {
        test_archive(&outcome, cli.is_quiet())?;
    }

    if cli.pipe {
        let mut stdout = tokio::io::stdout();
        stdout.write_all(&outcome.archive.bytes).await?;
        stdout.flush().await?;
        return Ok(());
    }

    let output_path = match cli.output_dir {
        Some(ref dir) => dir.join(outcome.archive.file_name()),
        None => PathBuf::from(outcome.archive.file_name()),
    };
    save_archive(&outcome.archive.bytes, &output_path, cli.overwrite).await?;

    if !cli.is_quiet() {
        print_summary(&outcome, &output_path);
    }

    Ok(())
}

/// Print the entries of the built archive as a table.
fn list_entries(outcome: &Outcome) -> Result<()> {
    let reader = ZipReader::new(&outcome.archive.bytes)?;
    let entries = reader.entries()?;

    println!(
        "{:>10}  {:>10}  {:>5}  {:>10}  {:>5}  Name",
        "Length", "Size", "Cmpr", "Date", "Time"
    );
    println!("{}", "-".repeat(70));

    let mut total_uncompressed = 0u64;
    let mut total_compressed = 0u64;
    for entry in &entries {
        let (year, month, day) = entry.modified.ymd();
        let (hour, minute, _) = entry.modified.hms();
        println!(
            "{:>10}  {:>10}  {}  {:04}-{:02}-{:02}  {:02}:{:02}  {}",
            entry.uncompressed_size,
            entry.compressed_size,
            ratio(entry.compressed_size, entry.uncompressed_size),
            year,
            month,
            day,
            hour,
            minute,
            entry.file_name
        );
        total_uncompressed += entry.uncompressed_size;
        total_compressed += entry.compressed_size;
    }

    println!("{}", "-".repeat(70));
    println!(
        "{:>10}  {:>10}  {}  {:>21}  {} files",
        total_uncompressed,
        total_compressed,
        ratio(total_compressed, total_uncompressed),
        "",
        entries.len()
    );

    Ok(())
}

/// Re-read every entry, checking sizes and CRC-32.
fn test_archive(outcome: &Outcome, quiet: bool) -> Result<()> {
    let reader = ZipReader::new(&outcome.archive.bytes)?;
    for entry in reader.entries()? {
        reader.read(&entry)?;
        if !quiet {
            println!("    testing: {:<40} OK", entry.file_name);
        }
    }
    if !quiet {
        println!("No errors detected in {}", outcome.archive.file_name());
    }
    Ok(())
}

/// Write `bytes` to `path`. Without `overwrite` the file must not exist yet.
async fn save_archive(bytes: &[u8], path: &Path, overwrite: bool) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await?;
        }
    }

    let mut options = tokio::fs::OpenOptions::new();
    options.write(true);
    if overwrite {
        options.create(true).truncate(true);
    } else {
        options.create_new(true);
    }

    let mut file = match options.open(path).await {
        Ok(file) => file,
        Err(e) if e.kind() == ErrorKind::AlreadyExists => {
            return Err(MdzipError::OutputExists {
                path: path.display().to_string(),
            }
            .into());
        }
        Err(e) => return Err(e.into()),
    };
    file.write_all(bytes).await?;
    file.flush().await?;

    tracing::info!(path = %path.display(), bytes = bytes.len(), "archive written");
    Ok(())
}

fn print_summary(outcome: &Outcome, path: &Path) {
    let summary = &outcome.archive.summary;
    println!("Successfully parsed {} file(s):", summary.entry_count);
    for entry in &summary.entries {
        println!("  {}", entry);
    }
    println!(
        "ZIP file '{}' created ({})",
        path.display(),
        format_size(outcome.archive.bytes.len() as u64)
    );
    if summary.readme_included {
        println!("Includes README.md");
    }
}

fn ratio(compressed: u64, uncompressed: u64) -> String {
    if uncompressed > 0 && compressed <= uncompressed {
        format!("{:>4}%", 100 - (compressed * 100 / uncompressed))
    } else {
        "  0%".to_string()
    }
}

fn format_size(size: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;

    if size >= MB {
        format!("{:.2} MB", size as f64 / MB as f64)
    } else if size >= KB {
        format!("{:.2} KB", size as f64 / KB as f64)
    } else {
        format!("{} bytes", size)
    }
}
