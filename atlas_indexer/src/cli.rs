use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "atlas_indexer",
    about = "Periodic content indexer for a content-distribution network"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Replay the deployment history on a schedule and keep the index fresh.
    Run,
    /// Apply the database schema.
    Migrate,
    /// Download an indexed scene's content files to disk.
    FetchScene {
        /// Entity id of an indexed scene.
        entity_id: String,
        /// Directory the files are written under.
        #[arg(long, default_value = "data")]
        out: PathBuf,
    },
}
