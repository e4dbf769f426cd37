//! Command-line interface for Spesa.

use clap::{Parser, Subcommand};

/// Spesa - expense mission manager backend
#[derive(Parser)]
#[command(name = "spesa")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the API server (default)
    Serve,

    /// Create a default config file
    Init,
}
