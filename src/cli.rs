use std::path::Path;
use std::time::Duration;

use clap::{Parser, Subcommand};
use url::Url;

#[derive(Parser, Debug)]
#[command(name = "bookres")]
#[command(version)]
#[command(about = "Read publication resources from files and HTTP URLs", long_about = None)]
#[command(after_help = "Examples:\n  \
  bookres cat book.txt --range 0..100           print the first 100 bytes of a file\n  \
  bookres ls https://example.com/book.epub      list entries of a remote ZIP\n  \
  bookres text book.zip ch1.txt ch2.txt         print the paragraphs of two entries")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// HTTP request timeout in seconds
    #[arg(long, value_name = "SECS", global = true)]
    pub timeout: Option<u64>,

    /// Quiet mode (-qq => quieter)
    #[arg(short = 'q', action = clap::ArgAction::Count, global = true)]
    pub quiet: u8,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Write the bytes of a resource to stdout
    Cat {
        /// File path or URL
        #[arg(value_name = "URL", value_parser = parse_location)]
        url: Url,

        /// Byte range to read, such as 10..20 or 10..
        #[arg(long, value_parser = parse_range)]
        range: Option<std::ops::Range<u64>>,

        /// Buffer reads in windows of this many bytes
        #[arg(long, value_name = "BYTES")]
        buffer: Option<usize>,

        /// Read the whole resource once and serve it from memory
        #[arg(long)]
        cache: bool,
    },

    /// List the entries of a ZIP archive
    Ls {
        /// File path or URL of the archive
        #[arg(value_name = "URL", value_parser = parse_location)]
        url: Url,

        /// List verbosely
        #[arg(short = 'v')]
        verbose: bool,
    },

    /// Print the paragraphs of text entries of a ZIP archive, in order
    Text {
        /// File path or URL of the archive
        #[arg(value_name = "URL", value_parser = parse_location)]
        url: Url,

        /// Reading order, as paths inside the archive
        #[arg(value_name = "HREF", required = true)]
        hrefs: Vec<String>,

        /// Iterate from the end of the reading order
        #[arg(short = 'r', long)]
        reverse: bool,
    },
}

impl Cli {
    pub fn is_quiet(&self) -> bool {
        self.quiet > 0
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout.map(Duration::from_secs)
    }
}

/// Accepts absolute URLs, or paths turned into `file:` URLs.
pub fn parse_location(value: &str) -> Result<Url, String> {
    if let Ok(url) = Url::parse(value) {
        // Single letters are Windows drive letters, not schemes.
        if url.scheme().len() > 1 {
            return Ok(url);
        }
    }

    let path = Path::new(value);
    let path = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .map_err(|e| format!("cannot resolve {value}: {e}"))?
            .join(path)
    };
    Url::from_file_path(&path).map_err(|()| format!("invalid path: {value}"))
}

/// Parses `start..end` or `start..`.
pub fn parse_range(value: &str) -> Result<std::ops::Range<u64>, String> {
    let (start, end) = value
        .split_once("..")
        .ok_or_else(|| format!("expected START..END, got {value}"))?;
    let start: u64 = if start.is_empty() {
        0
    } else {
        start.parse().map_err(|e| format!("invalid range start: {e}"))?
    };
    let end: u64 = if end.is_empty() {
        u64::MAX
    } else {
        end.parse().map_err(|e| format!("invalid range end: {e}"))?
    };
    if end < start {
        return Err(format!("range end {end} is before its start {start}"));
    }
    Ok(start..end)
}
