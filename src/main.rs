//! Command-line front end reading publication resources from files and
//! HTTP URLs.

use std::ops::Range;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::io::AsyncWriteExt;
use url::Url;

use bookres::cli::Command;
use bookres::io::{HttpConfig, ResourceFactory, default_factory};
use bookres::{
    Cli, Link, Locator, Publication, PublicationContentIterator, Resource, ResourceExt,
    ZipArchive,
};

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let mut config = HttpConfig::default();
    if let Some(timeout) = cli.timeout() {
        config.timeout = timeout;
    }
    let factory = default_factory(&config)?;

    match &cli.command {
        Command::Cat {
            url,
            range,
            buffer,
            cache,
        } => {
            let mut resource = factory.make(url)?;
            if let Some(size) = buffer {
                resource = resource.buffered(*size).into_shared();
            }
            if *cache {
                resource = resource.cached().into_shared();
            }
            cat(resource.as_ref(), range.clone(), &cli).await
        }
        Command::Ls { url, verbose } => {
            let archive = open_archive(&factory, url).await?;
            list_entries(&archive, *verbose);
            Ok(())
        }
        Command::Text {
            url,
            hrefs,
            reverse,
        } => {
            let archive = open_archive(&factory, url).await?;
            print_text(archive, hrefs, *reverse).await
        }
    }
}

async fn open_archive(factory: &impl ResourceFactory, url: &Url) -> Result<ZipArchive> {
    let resource = factory.make(url)?;
    ZipArchive::open(resource)
        .await
        .with_context(|| format!("failed to open ZIP archive {url}"))
}

/// Write the bytes of `resource` in `range` to stdout.
async fn cat(resource: &dyn Resource, range: Option<Range<u64>>, cli: &Cli) -> Result<()> {
    let bytes = resource.read(range).await?;
    let mut stdout = tokio::io::stdout();
    stdout.write_all(&bytes).await?;
    stdout.flush().await?;

    if !cli.is_quiet() {
        eprintln!("\nTotal bytes read: {}", format_size(bytes.len() as u64));
    }
    Ok(())
}

/// List entries of the archive.
///
/// - Simple format: just entry paths, one per line
/// - Verbose format (`-v`): table with size, compression ratio, and timestamps
fn list_entries(archive: &ZipArchive, verbose: bool) {
    if verbose {
        println!(
            "{:>10}  {:>10}  {:>5}  {:>10}  {:>5}  Name",
            "Length", "Size", "Cmpr", "Date", "Time"
        );
        println!("{}", "-".repeat(70));
    }

    let mut total_uncompressed = 0u64;
    let mut total_compressed = 0u64;
    let mut count = 0usize;

    for entry in archive.entries() {
        if !verbose {
            println!("{}", entry.path);
            continue;
        }

        let (year, month, day) = entry.mod_date();
        let (hour, minute, _second) = entry.mod_time();
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
            entry.path
        );

        total_uncompressed += entry.uncompressed_size;
        total_compressed += entry.compressed_size;
        count += 1;
    }

    if verbose {
        println!("{}", "-".repeat(70));
        println!(
            "{:>10}  {:>10}  {}  {:>21}  {} files",
            total_uncompressed,
            total_compressed,
            ratio(total_compressed, total_uncompressed),
            "",
            count
        );
    }
}

/// Print the paragraphs of `hrefs`, read as the reading order of a
/// publication stored in `archive`.
async fn print_text(archive: ZipArchive, hrefs: &[String], reverse: bool) -> Result<()> {
    let reading_order: Vec<Link> = hrefs.iter().map(Link::new).collect();
    let start = if reverse {
        reading_order
            .last()
            .map(|link| Locator::for_link(link, 1.0))
    } else {
        None
    };
    let publication = Arc::new(Publication::new(reading_order, Arc::new(archive)));
    let mut iterator = PublicationContentIterator::with_default_factories(publication, start);

    loop {
        let element = if reverse {
            iterator.previous().await?
        } else {
            iterator.next().await?
        };
        let Some(element) = element else {
            break;
        };
        match element.text() {
            Some(text) => println!("{text}\n"),
            None => println!("[{}]\n", element.locator.href),
        }
    }
    Ok(())
}

/// Percentage saved by compression.
fn ratio(compressed: u64, uncompressed: u64) -> String {
    if uncompressed > 0 {
        format!("{:>4}%", 100i64 - (compressed * 100 / uncompressed) as i64)
    } else {
        "  0%".to_string()
    }
}

/// Format a byte size into a human-readable string.
///
/// Automatically selects the appropriate unit (bytes, KB, MB, GB)
/// based on the size magnitude.
fn format_size(size: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if size >= GB {
        format!("{:.2} GB", size as f64 / GB as f64)
    } else if size >= MB {
        format!("{:.2} MB", size as f64 / MB as f64)
    } else if size >= KB {
        format!("{:.2} KB", size as f64 / KB as f64)
    } else {
        format!("{} bytes", size)
    }
}
