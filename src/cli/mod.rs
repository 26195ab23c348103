//! CLI module for idgate
//!
//! Provides command-line interface parsing and handling for the idgate-server binary.
//! Uses clap for argument parsing and owo-colors for colored terminal output.

pub mod init;
pub mod output;

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// idgate - bearer token identity server
#[derive(Parser, Debug)]
#[command(
    name = "idgate-server",
    author = "Dirmacs <build@dirmacs.com>",
    version,
    about = "idgate - bearer token authentication and identity lookup server",
    long_about = "Issues opaque session tokens on login and resolves principals for\n\
                  requests carrying 'Authorization: Bearer <token>'.\n\n\
                  Run without arguments to start the server, or use 'init' to scaffold a config.",
    after_help = "EXAMPLES:\n    \
                  idgate-server init                 # Scaffold idgate.toml\n    \
                  idgate-server hash-password        # Hash a password for [users.*]\n    \
                  idgate-server                      # Start the server (needs idgate.toml)\n    \
                  idgate-server --config my.toml     # Use a custom config file"
)]
pub struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "idgate.toml", global = true, env = "IDGATE_CONFIG")]
    pub config: PathBuf,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Log output format for the server
    #[arg(long, value_enum, default_value_t = LogFormat::Text, global = true)]
    pub log_format: LogFormat,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Log line encoding
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Human-readable lines
    Text,
    /// One JSON object per line
    Json,
}

/// Available CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the HTTP server (default when no command is given)
    Serve {
        /// Disable config hot reload
        #[arg(long)]
        no_watch: bool,
    },

    /// Initialize a new idgate.toml
    Init {
        /// Directory to initialize (defaults to current directory)
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Overwrite existing files without prompting
        #[arg(short, long)]
        force: bool,

        /// Host address for the server
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Port for the server
        #[arg(long, default_value = "8080")]
        port: u16,

        /// Token lifetime in seconds
        #[arg(long, default_value = "86400")]
        token_ttl_secs: u64,
    },

    /// Show configuration information
    Config {
        /// Show the full configuration
        #[arg(short = 'f', long)]
        full: bool,

        /// Validate the configuration file
        #[arg(long)]
        validate: bool,
    },

    /// Produce an Argon2id hash for a user's password_hash field
    HashPassword {
        /// Password to hash. Prefer omitting it and piping the password on
        /// stdin; an argument is visible in shell history and `ps`
        password: Option<String>,
    },
}

impl Cli {
    /// Parse CLI arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
