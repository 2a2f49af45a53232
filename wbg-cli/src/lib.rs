//! Shared helpers for the gallery command-line applications, built on [`clap`][clap] and
//! [`simplelog`][simplelog].
//!
//! ## Example
//!
//! ```rust,no_run
//! use wbg_cli::prelude::*;
//!
//! #[derive(Debug, Parser)]
//! #[clap(name = "demo", version, author)]
//! struct Opts {
//!     #[clap(flatten)]
//!     verbose: Verbosity,
//!     #[clap(flatten)]
//!     layout: LayoutOpts,
//! }
//!
//! fn main() -> Result<(), log::SetLoggerError> {
//!     let opts: Opts = Opts::parse();
//!     opts.verbose.init_logging()?;
//!     Ok(())
//! }
//! ```
//!
//! [clap]: https://docs.rs/clap/latest/clap/
//! [simplelog]: https://docs.rs/simplelog/latest/simplelog/

use simplelog::LevelFilter;

pub const DEFAULT_ROOT: &str = "assets/images/gallery";
pub const DEFAULT_FOLDER_LIST: &str = "assets/images/gallery/folder_list.txt";
pub const DEFAULT_CATALOG_DATA: &str = "image-locations.json";
pub const DEFAULT_CATALOG_SCRIPT: &str = "image-locations.js";
pub const DEFAULT_CATALOG_VARIABLE: &str = "imageLocations";

fn select_log_level_filter(verbosity: i8) -> LevelFilter {
    match verbosity {
        0 => LevelFilter::Off,
        1 => LevelFilter::Error,
        2 => LevelFilter::Warn,
        3 => LevelFilter::Info,
        4 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

#[derive(clap::Args, Debug, Clone)]
pub struct Verbosity {
    /// Level of verbosity
    #[clap(long, short = 'v', parse(from_occurrences), global = true)]
    verbose: i8,
}

impl Verbosity {
    pub fn new(verbose: i8) -> Self {
        Self { verbose }
    }

    pub fn level(&self) -> LevelFilter {
        select_log_level_filter(self.verbose)
    }

    /// Initialize a default terminal logger with the indicated log level.
    pub fn init_logging(&self) -> Result<(), log::SetLoggerError> {
        simplelog::TermLogger::init(
            self.level(),
            simplelog::Config::default(),
            simplelog::TerminalMode::Stderr,
            simplelog::ColorChoice::Auto,
        )
    }
}

/// File locations shared by the server and the offline tool.
#[derive(clap::Args, Debug, Clone)]
pub struct LayoutOpts {
    /// Directory holding one folder per upload date
    #[clap(long, default_value = DEFAULT_ROOT)]
    pub root: String,
    /// Folder index file (one date per line)
    #[clap(long, default_value = DEFAULT_FOLDER_LIST)]
    pub folder_list: String,
    /// Structured catalog data file
    #[clap(long, default_value = DEFAULT_CATALOG_DATA)]
    pub catalog_data: String,
    /// Catalog script rendered for the gallery page
    #[clap(long, default_value = DEFAULT_CATALOG_SCRIPT)]
    pub catalog_script: String,
    /// Identifier the catalog script assigns the mapping to
    #[clap(long, default_value = DEFAULT_CATALOG_VARIABLE)]
    pub catalog_variable: String,
    /// Path prefix used for image paths in responses and the catalog (defaults to the root)
    #[clap(long)]
    pub public_prefix: Option<String>,
    /// Append to an existing date's catalog entry instead of replacing it
    #[clap(long)]
    pub append: bool,
}

impl LayoutOpts {
    pub fn public_prefix(&self) -> &str {
        self.public_prefix.as_deref().unwrap_or(&self.root)
    }
}

pub mod prelude {
    pub use super::{LayoutOpts, Verbosity};
    pub use ::clap::Parser;
    pub mod clap {
        pub use clap::{
            builder, AppSettings, Arg, ArgAction, ArgMatches, Args, Command, CommandFactory, Error,
            ErrorKind, FromArgMatches, Parser, Subcommand,
        };
    }
    pub mod log {
        pub use log::{debug, error, info, warn, SetLoggerError};
    }
}
