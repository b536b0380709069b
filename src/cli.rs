use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::store::batch::DEFAULT_BATCH_SIZE;

#[derive(Parser, Debug)]
#[command(
    name = "bible-sql",
    version,
    about = "Import Bible translations and cross references from JSON into SQL"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Import translations from `<source-root>/translations`.
    Import(ImportArgs),
    /// Import cross-reference documents.
    References(ReferencesArgs),
    /// Delete translations by code.
    Delete(DeleteArgs),
    /// Show row counts of the configured database.
    Status,
}

/// Output mode flags shared by every writing command.
#[derive(Args, Debug, Clone, Copy)]
pub struct ModeArgs {
    /// Walk the sources and count rows without writing anything.
    #[arg(short = 'd', long, default_value_t = false)]
    pub dry_run: bool,

    /// Execute against the configured database instead of writing scripts.
    #[arg(short = 'e', long, default_value_t = false)]
    pub execute: bool,
}

#[derive(Args, Debug, Clone)]
pub struct ImportArgs {
    #[arg(short = 'c', long)]
    pub category: Option<String>,

    #[arg(short = 't', long, conflicts_with = "all")]
    pub translation: Option<String>,

    /// Import every translation in the category.
    #[arg(short = 'a', long, default_value_t = false)]
    pub all: bool,

    #[command(flatten)]
    pub mode: ModeArgs,

    #[arg(long, default_value = "sources")]
    pub source_root: PathBuf,

    #[arg(long, default_value = "sql")]
    pub out_dir: PathBuf,

    #[arg(long, default_value_t = DEFAULT_BATCH_SIZE)]
    pub batch_size: usize,
}

#[derive(Args, Debug, Clone)]
pub struct ReferencesArgs {
    /// Reference documents; every file under `<source-root>/cross-references`
    /// when omitted.
    pub files: Vec<PathBuf>,

    #[command(flatten)]
    pub mode: ModeArgs,

    #[arg(long, default_value = "sources")]
    pub source_root: PathBuf,

    #[arg(long, default_value = "sql")]
    pub out_dir: PathBuf,

    #[arg(long, default_value_t = DEFAULT_BATCH_SIZE)]
    pub batch_size: usize,
}

#[derive(Args, Debug, Clone)]
pub struct DeleteArgs {
    #[arg(required = true)]
    pub codes: Vec<String>,

    #[command(flatten)]
    pub mode: ModeArgs,

    #[arg(long, default_value = "sql")]
    pub out_dir: PathBuf,
}
