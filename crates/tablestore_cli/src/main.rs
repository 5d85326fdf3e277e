//! tablestore CLI
//!
//! Command-line tools for working with table keys and filters.
//!
//! # Commands
//!
//! - `sanitize` - Turn arbitrary text into a usable key
//! - `validate` - Report the first rule each key violates
//! - `filter` - Print the query filter for a key lookup
//! - `endpoint` - Resolve the table endpoint of a credential

mod commands;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

/// tablestore command-line tools.
#[derive(Parser)]
#[command(name = "tablestore")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    /// Output format (text, json)
    #[arg(global = true, short, long, default_value = "text")]
    format: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Turn arbitrary text into a usable key
    Sanitize {
        /// The raw key text
        key: String,

        /// Substitute for reserved characters
        #[arg(short, long, default_value = "")]
        replacement: String,
    },

    /// Report the first rule each key violates
    Validate {
        /// Keys to check
        #[arg(required = true)]
        keys: Vec<String>,
    },

    /// Print the query filter for a key lookup
    Filter {
        /// Partition key to match
        #[arg(short, long)]
        partition_key: Option<String>,

        /// Row key to match
        #[arg(short, long)]
        row_key: Option<String>,

        /// Substitute for reserved characters
        #[arg(long, default_value = "")]
        replacement: String,
    },

    /// Resolve the table endpoint of a credential
    Endpoint {
        /// Storage connection string
        #[arg(short, long, conflicts_with = "account")]
        connection_string: Option<String>,

        /// Account name for SAS access
        #[arg(short, long)]
        account: Option<String>,
    },

    /// Show version information
    Version,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let format = commands::OutputFormat::parse(&cli.format)?;

    match cli.command {
        Commands::Sanitize { key, replacement } => {
            commands::sanitize::run(&key, &replacement, format)?;
        }
        Commands::Validate { keys } => {
            commands::validate::run(&keys, format)?;
        }
        Commands::Filter {
            partition_key,
            row_key,
            replacement,
        } => {
            commands::filter::run(
                partition_key.as_deref(),
                row_key.as_deref(),
                &replacement,
                format,
            )?;
        }
        Commands::Endpoint {
            connection_string,
            account,
        } => {
            commands::endpoint::run(connection_string, account, format)?;
        }
        Commands::Version => {
            println!("tablestore CLI v{}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}
