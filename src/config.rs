//! Command line and environment configuration.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use todo_core::Database;

#[derive(Debug, Parser)]
#[command(name = "todo-pipe")]
#[command(about = "Todo list web application built from extract/transform/load pipes")]
#[command(args_conflicts_with_subcommands = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Server settings used when no subcommand is given
    #[command(flatten)]
    pub serve: ServeArgs,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Start the HTTP server
    Serve(ServeArgs),
    /// Create or upgrade the database schema and exit
    Migrate(DatabaseArgs),
}

#[derive(Debug, Clone, Args)]
pub struct ServeArgs {
    /// Address to bind
    #[arg(long, env = "TODO_PIPE_HOST", default_value = "127.0.0.1")]
    pub host: String,

    /// Port for the HTTP server
    #[arg(short, long, env = "TODO_PIPE_PORT", default_value_t = 3000)]
    pub port: u16,

    #[command(flatten)]
    pub database: DatabaseArgs,
}

impl ServeArgs {
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Clone, Args)]
pub struct DatabaseArgs {
    /// SQLite database file (defaults to the platform data directory)
    #[arg(long = "database", env = "TODO_PIPE_DATABASE")]
    pub path: Option<PathBuf>,
}

impl DatabaseArgs {
    /// Opens the configured database and brings its schema up to date.
    pub fn open(&self) -> Result<Database> {
        let db = match &self.path {
            Some(path) => Database::open(path)?,
            None => Database::open_default()?,
        };
        db.migrate()?;
        Ok(db)
    }
}
