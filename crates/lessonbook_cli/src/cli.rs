//! Command-line surface.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Lesson scheduling assistant.
#[derive(Debug, Parser)]
#[command(name = "lessonbook", version, about)]
pub struct Cli {
    /// TOML configuration file (defaults to ./lessonbook.toml when present).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Serve the HTTP API.
    Serve(ServeArgs),
    /// Ask in free text, e.g. "schedule for Adina".
    Ask(AskArgs),
    /// List every lesson on a weekday (0 = Monday).
    Day(DayArgs),
    /// Book a lesson on a day of the current week.
    Add(AddArgs),
    /// Delete a lesson by id.
    Delete(DeleteArgs),
    /// Import every CSV timetable in a directory.
    Import(ImportArgs),
}

#[derive(Debug, Args)]
pub struct ServeArgs {
    /// Listen address; overrides `server.addr`.
    #[arg(long)]
    pub addr: Option<String>,
}

#[derive(Debug, Args)]
pub struct AskArgs {
    #[arg(required = true, num_args = 1..)]
    pub text: Vec<String>,
}

#[derive(Debug, Args)]
pub struct DayArgs {
    pub day_idx: i64,
}

#[derive(Debug, Args)]
pub struct AddArgs {
    #[arg(long)]
    pub teacher: String,
    #[arg(long)]
    pub student: Option<String>,
    #[arg(long)]
    pub subject: Option<String>,
    #[arg(long)]
    pub room: Option<String>,
    /// 0 = Monday.
    #[arg(long)]
    pub day: i64,
    /// `HH:MM`.
    #[arg(long)]
    pub start: String,
    /// Minutes.
    #[arg(long, default_value_t = 60)]
    pub duration: u32,
}

#[derive(Debug, Args)]
pub struct DeleteArgs {
    pub id: String,
}

#[derive(Debug, Args)]
pub struct ImportArgs {
    pub dir: PathBuf,
}
