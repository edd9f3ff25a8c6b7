mod clear;
mod index;
mod query;

use clap::{Args, Parser, Subcommand};
use codegraph_core::IndexerConfig;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "codegraph",
    version,
    about = "Index source code and resolve references to their definitions",
    long_about = "Codegraph walks a workspace, extracts definitions, references and imports from \
                  Python, C and C++ sources, and answers go-to-definition queries against the stored index."
)]
pub struct Cli {
    /// Also write logs to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Index a workspace directory
    #[command(
        long_about = "Walks the workspace and indexes every supported file. Unchanged files are skipped. \
                      By default, the index is stored in ~/.codegraph/indices/."
    )]
    Index {
        /// Path to the workspace root
        #[arg(value_name = "WORKSPACE")]
        path: PathBuf,

        #[command(flatten)]
        options: IndexOptions,
    },
    /// Find the definitions referenced on a range of lines
    Query {
        /// Path to the workspace root
        #[arg(value_name = "WORKSPACE")]
        path: PathBuf,

        /// File to query, relative to the workspace or absolute
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// First line of the range
        #[arg(value_name = "START_LINE")]
        start_line: i32,

        /// Last line of the range. Defaults to START_LINE
        #[arg(value_name = "END_LINE")]
        end_line: Option<i32>,

        /// Resolve against this content instead of the stored file
        #[arg(long, value_name = "PATH")]
        snippet: Option<PathBuf>,

        #[command(flatten)]
        options: IndexOptions,
    },
    /// Clear stored indexes
    #[command(
        long_about = "Removes stored index files. If a path is provided, only that workspace's index \
                      is removed. Otherwise, all indexes are cleared."
    )]
    Clear {
        /// Path to the workspace root (optional)
        #[arg(value_name = "WORKSPACE")]
        path: Option<PathBuf>,

        #[command(flatten)]
        options: IndexOptions,
    },
}

/// Settings shared by every subcommand.
#[derive(Args, Debug, Clone, Default)]
pub struct IndexOptions {
    /// JSON configuration file
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Directory holding the stored indexes
    #[arg(long, value_name = "DIR")]
    pub index_dir: Option<PathBuf>,

    /// Number of files parsed concurrently
    #[arg(short = 'j', long)]
    pub concurrency: Option<usize>,

    /// File extensions to index, e.g. `py` or `.c`. Repeatable
    #[arg(long = "ext", value_name = "EXT")]
    pub include_exts: Vec<String>,

    /// Directory names or `*` patterns to skip. Repeatable
    #[arg(long = "exclude", value_name = "DIR")]
    pub exclude_dirs: Vec<String>,

    /// Report and accept 1-based line numbers
    #[arg(long)]
    pub one_based: bool,
}

impl IndexOptions {
    /// Environment defaults, then the config file, then flags.
    pub fn to_config(&self) -> Result<IndexerConfig, Box<dyn std::error::Error>> {
        let mut config = match &self.config {
            Some(path) => IndexerConfig::load(path)?,
            None => IndexerConfig::from_env(),
        };
        if let Some(dir) = &self.index_dir {
            config = config.with_index_dir(dir);
        }
        if let Some(n) = self.concurrency {
            config = config.with_concurrency(n);
        }
        if !self.include_exts.is_empty() || !self.exclude_dirs.is_empty() {
            let mut pattern = config.visit_pattern.clone();
            if !self.include_exts.is_empty() {
                pattern.include_exts = self.include_exts.clone();
            }
            pattern.exclude_dirs.extend(self.exclude_dirs.iter().cloned());
            config = config.with_visit_pattern(pattern);
        }
        if self.one_based {
            config = config.with_line_base(1);
        }
        Ok(config)
    }
}

pub fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let _guard = codegraph_runtime::init_logging("cli", cli.verbose);

    let rt = tokio::runtime::Runtime::new()?;

    match cli.command {
        Commands::Index { path, options } => rt.block_on(index::run(path, options.to_config()?)),
        Commands::Query {
            path,
            file,
            start_line,
            end_line,
            snippet,
            options,
        } => {
            let request = query::Request {
                workspace: path,
                file,
                start_line,
                end_line: end_line.unwrap_or(start_line),
                snippet,
            };
            rt.block_on(query::run(request, options.to_config()?))
        }
        Commands::Clear { path, options } => rt.block_on(clear::run(path, options.to_config()?)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_override_config() {
        let cli = Cli::parse_from([
            "codegraph",
            "index",
            "/tmp/ws",
            "--index-dir",
            "/tmp/store",
            "-j",
            "3",
            "--ext",
            "py",
            "--exclude",
            "vendor",
            "--one-based",
        ]);
        let Commands::Index { path, options } = cli.command else {
            panic!("expected index");
        };
        assert_eq!(path, PathBuf::from("/tmp/ws"));

        let config = options.to_config().unwrap();
        assert_eq!(config.index_dir, Some(PathBuf::from("/tmp/store")));
        assert_eq!(config.concurrency, 3);
        assert_eq!(config.line_base, 1);
        assert_eq!(config.visit_pattern.include_exts, vec!["py".to_string()]);
        assert!(config.visit_pattern.exclude_dirs.contains(&"vendor".to_string()));
        assert!(config.visit_pattern.exclude_dirs.contains(&".git".to_string()));
    }

    #[test]
    fn test_query_end_line_is_optional() {
        let cli = Cli::parse_from(["codegraph", "query", ".", "src/a.py", "12"]);
        let Commands::Query {
            start_line, end_line, ..
        } = cli.command
        else {
            panic!("expected query");
        };
        assert_eq!((start_line, end_line), (12, None));
    }
}
