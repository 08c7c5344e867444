use clap::Parser;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

use crate::error::{Result, StreamError};
use crate::pipeline::ArchiveOptions;
use crate::xz::XzTool;

/// Environment variable overriding the default xz thread count.
pub const THREADS_ENV: &str = "XZ_NUM_THREADS";

/// Stream a directory as a tar archive, decompressing .xz files on the fly.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Directory whose contents are archived (the directory itself is not an entry).
    #[arg(required = true)]
    pub directory: PathBuf,

    /// Output archive path. Omit, or pass `-`, to write to standard output.
    pub output: Option<PathBuf>,

    /// Number of threads for each xz decompression. [default: $XZ_NUM_THREADS, else CPU count]
    #[arg(short, long)]
    pub threads: Option<usize>,

    /// The xz executable used for listing and decompression.
    #[arg(long, env = "STREAMTAR_XZ_BIN", default_value = "xz")]
    pub xz_bin: PathBuf,

    /// Enable debug diagnostics on stderr (use RUST_LOG for finer control).
    #[arg(short, long)]
    pub verbose: bool,
}

/// Where the archive bytes go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputTarget {
    Stdout,
    File(PathBuf),
}

impl OutputTarget {
    /// Opens the sink. Files are created (or truncated) immediately.
    pub fn open(&self) -> Result<Box<dyn Write>> {
        match self {
            OutputTarget::Stdout => Ok(Box::new(BufWriter::new(io::stdout().lock()))),
            OutputTarget::File(path) => {
                let file = File::create(path).map_err(|e| StreamError::write(self.describe(), e))?;
                Ok(Box::new(BufWriter::new(file)))
            }
        }
    }

    /// Name used in diagnostics.
    pub fn describe(&self) -> String {
        match self {
            OutputTarget::Stdout => "stdout".to_string(),
            OutputTarget::File(path) => format!("'{}'", path.display()),
        }
    }
}

impl Args {
    pub fn output_target(&self) -> OutputTarget {
        match &self.output {
            Some(p) if p.as_os_str() != "-" => OutputTarget::File(p.clone()),
            _ => OutputTarget::Stdout,
        }
    }

    /// Resolves the run configuration from flags, environment and host.
    pub fn archive_options(&self) -> ArchiveOptions {
        let env = std::env::var(THREADS_ENV).ok();
        let threads = resolve_threads(self.threads, env.as_deref(), num_cpus::get());
        ArchiveOptions { xz: XzTool::new(&self.xz_bin, threads) }
    }
}

/// Picks the decompression thread hint.
///
/// Priority:
/// 1. `--threads`, when positive.
/// 2. `XZ_NUM_THREADS`, when it parses as a positive integer.
/// 3. The number of available CPUs.
pub fn resolve_threads(flag: Option<usize>, env: Option<&str>, cpus: usize) -> usize {
    if let Some(n) = flag.filter(|&n| n > 0) {
        return n;
    }
    env.and_then(|v| v.trim().parse::<usize>().ok())
        .filter(|&n| n > 0)
        .unwrap_or(cpus)
        .max(1)
}

/// Parses command-line arguments using `clap`.
///
/// Invalid arguments print clap's usage message and exit the process.
pub fn run() -> Args {
    Args::parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flag_beats_environment() {
        assert_eq!(resolve_threads(Some(3), Some("8"), 16), 3);
    }

    #[test]
    fn environment_beats_cpu_count() {
        assert_eq!(resolve_threads(None, Some("8"), 16), 8);
        assert_eq!(resolve_threads(None, Some(" 5 "), 16), 5);
    }

    #[test]
    fn invalid_environment_falls_back_to_cpus() {
        assert_eq!(resolve_threads(None, Some("lots"), 16), 16);
        assert_eq!(resolve_threads(None, Some("0"), 16), 16);
        assert_eq!(resolve_threads(None, Some("-2"), 16), 16);
        assert_eq!(resolve_threads(None, None, 16), 16);
        assert_eq!(resolve_threads(Some(0), None, 4), 4);
    }

    #[test]
    fn output_defaults_to_stdout() {
        let args = Args::parse_from(["streamtar", "data"]);
        assert_eq!(args.output_target(), OutputTarget::Stdout);
        let args = Args::parse_from(["streamtar", "data", "-"]);
        assert_eq!(args.output_target(), OutputTarget::Stdout);
        let args = Args::parse_from(["streamtar", "data", "out.tar"]);
        assert_eq!(args.output_target(), OutputTarget::File("out.tar".into()));
    }

    #[test]
    fn threads_flag_is_parsed() {
        let args = Args::parse_from(["streamtar", "-t", "4", "data"]);
        assert_eq!(args.threads, Some(4));
        assert_eq!(args.archive_options().xz.threads(), 4);
    }

    #[test]
    fn missing_directory_is_a_usage_error() {
        assert!(Args::try_parse_from(["streamtar"]).is_err());
    }
}
