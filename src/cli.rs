use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Configuration file path
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Translate subtitle, document and PDF files
    Translate {
        /// Input files or directories
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// Source language code or name ("auto" to detect)
        #[arg(short, long)]
        source: Option<String>,

        /// Target language code or name
        #[arg(short, long)]
        target: Option<String>,

        /// Output directory for the archive or translated files
        #[arg(short, long, default_value = ".")]
        output_dir: PathBuf,

        /// Translation backend (google, ollama)
        #[arg(long)]
        provider: Option<String>,

        /// Number of files translated at the same time
        #[arg(short, long)]
        jobs: Option<usize>,

        /// Write translated files individually instead of one archive
        #[arg(long)]
        no_archive: bool,
    },

    /// List supported languages and their codes
    Languages,

    /// Write the default configuration file
    InitConfig {
        /// Destination path
        #[arg(default_value = "config.toml")]
        path: PathBuf,
    },
}
