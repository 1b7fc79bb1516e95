//! Command-line interface definitions.
//!
//! Defines all CLI arguments and subcommands using clap.

use crate::config::FetchMode;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// sitevars CLI
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None, arg_required_else_help = true)]
pub struct Cli {
    /// Project root directory (config file is resolved against it)
    #[arg(short, long)]
    pub root: Option<PathBuf>,

    /// Directory holding the built site (relative to project root)
    #[arg(short, long)]
    pub site: Option<PathBuf>,

    /// Public origin of the site, e.g. https://example.com
    #[arg(long)]
    pub origin: Option<String>,

    /// Where same-origin config documents are read from
    #[arg(long, value_enum)]
    pub mode: Option<FetchMode>,

    /// Config file name (default: sitevars.toml)
    #[arg(short = 'C', long, default_value = "sitevars.toml")]
    pub config: PathBuf,

    /// subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Resolve variables and rewrite every HTML page of the site in place
    Apply {
        /// Process pages without writing them back
        #[arg(long)]
        dry_run: bool,
    },

    /// Print the resolved variables of one page as JSON
    Vars {
        /// Page path, relative to the site directory (e.g. `blog/index.html`)
        page: PathBuf,
    },

    /// Serve the site, rewriting HTML pages on every request
    Serve {
        /// Interface to bind on
        #[arg(short, long)]
        interface: Option<String>,

        /// The port you should provide
        #[arg(short, long)]
        port: Option<u16>,
    },
}

#[allow(unused)]
impl Cli {
    pub const fn is_apply(&self) -> bool {
        matches!(self.command, Commands::Apply { .. })
    }
    pub const fn is_vars(&self) -> bool {
        matches!(self.command, Commands::Vars { .. })
    }
    pub const fn is_serve(&self) -> bool {
        matches!(self.command, Commands::Serve { .. })
    }
}
