//! CLI argument parsing for guardfile.
//!
//! Uses clap derive macros for declarative argument definitions.
//! Implementations live in the `commands` module.

use clap::{ArgAction, Args, Parser, Subcommand};
use std::path::PathBuf;

/// guardfile: read, write, append, and rename a file under a lock.
#[derive(Parser, Debug)]
#[command(name = "guardfile")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// YAML file with handle options (permission, write_strategy, cross_device_rename).
    #[arg(long, global = true)]
    pub options: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace).
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the file's content to stdout.
    Cat(PathArgs),

    /// Replace the file's content with stdin, streamed under the write lock.
    Write(PathArgs),

    /// Append text to the file.
    Append(AppendArgs),

    /// Rename the file.
    Mv(MoveArgs),

    /// Check that the file decodes in a structured format.
    Check(CheckArgs),
}

#[derive(Args, Debug)]
pub struct PathArgs {
    pub path: PathBuf,
}

#[derive(Args, Debug)]
pub struct AppendArgs {
    pub path: PathBuf,

    pub text: String,

    /// Terminate the text with a newline.
    #[arg(long)]
    pub line: bool,
}

#[derive(Args, Debug)]
pub struct MoveArgs {
    pub from: PathBuf,
    pub to: PathBuf,
}

#[derive(Args, Debug)]
pub struct CheckArgs {
    pub path: PathBuf,

    /// json, xml, or yaml. Guessed from the extension when omitted.
    #[arg(short, long)]
    pub format: Option<String>,
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
