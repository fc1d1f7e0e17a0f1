//! Command-line argument definitions.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::logging::LogFormat;
use crate::model::Dimension;

#[derive(Parser)]
#[command(
    name = "godot-architect",
    version,
    about = "Generate a complete Godot 3 survival RPG project with a text model",
    long_about = "Asks a generative text model for a Godot 3.5 (GLES2) project in three stages,\n\
                  rewrites the output for the legacy engine, merges it with fixed core files\n\
                  and packs everything into a zip archive."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// More diagnostics on stderr (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Disable ANSI colors in diagnostics.
    #[arg(long = "no-color", global = true)]
    pub no_color: bool,

    /// Diagnostic log format.
    #[arg(long = "log-format", value_enum, default_value = "pretty", global = true)]
    pub log_format: LogFormat,
}

#[derive(Subcommand)]
pub enum Command {
    /// Generate a project and write it as a zip archive.
    Build(BuildArgs),

    /// Run the legacy-compatibility patches over a local file and print the result.
    Patch(PatchArgs),

    /// List previous builds.
    History,
}

#[derive(Args)]
pub struct BuildArgs {
    /// Project name. Only ASCII letters and digits are kept.
    #[arg(value_name = "NAME")]
    pub name: String,

    /// Generate a 2d or 3d game.
    #[arg(long, default_value = "3d")]
    pub dimension: Dimension,

    /// Directory the archive is written to.
    #[arg(long = "out", value_name = "DIR")]
    pub out: Option<PathBuf>,

    /// Also write the project files out as a directory tree.
    #[arg(long = "extract-dir", value_name = "DIR")]
    pub extract_dir: Option<PathBuf>,

    /// Model id.
    #[arg(long, env = "GODOT_ARCHITECT_MODEL")]
    pub model: Option<String>,

    /// Base URL of the generation API.
    #[arg(long = "api-base", env = "GODOT_ARCHITECT_API_BASE", hide = true)]
    pub api_base: Option<String>,

    /// API key for the generation service.
    #[arg(long = "api-key", env = "GEMINI_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Print events and the final report as JSON lines on stdout.
    #[arg(long)]
    pub json: bool,
}

#[derive(Args)]
pub struct PatchArgs {
    /// File to patch.
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Project path that decides which patches apply (defaults to FILE).
    #[arg(long = "as", value_name = "PATH")]
    pub as_path: Option<String>,
}
