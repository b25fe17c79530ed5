use std::path::PathBuf;

use clap::{Parser, Subcommand};
use clap_complete::Shell;

#[derive(Parser)]
#[command(name = "imgdrop")]
#[command(about = "Upload images from markdown notes to S3-compatible storage", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Vault directory the notes live in
    #[arg(long, global = true, default_value = ".")]
    pub vault: PathBuf,

    /// Show timing/latency information
    #[arg(long, global = true)]
    pub timing: bool,

    /// Enable verbose debug output
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Upload the local image linked at a position of a note
    Upload {
        /// Note containing the image link
        note: PathBuf,

        /// Line of the link (1-based)
        #[arg(long, short = 'l')]
        line: usize,

        /// Column inside the link (1-based). Defaults to the first link on the line
        #[arg(long, short = 'c')]
        ch: Option<usize>,
    },
    /// Drop image files at the end of a note
    Drop {
        /// Note to drop the files into
        note: PathBuf,

        /// Files to drop
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Paste the clipboard's images at the end of a note
    Paste {
        /// Note to paste into
        note: PathBuf,
    },
    /// Show or change the uploader settings
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Print the current settings, secrets masked
    Show,
    /// Set one setting, e.g. `s3Bucket my-images`
    Set { key: String, value: String },
    /// Print the settings file location
    Path,
}
