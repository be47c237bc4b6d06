#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::needless_pass_by_value)]

mod commands;
mod logging;

use clap::Parser;
use miette::{IntoDiagnostic, Result};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "vitelet")]
#[command(author, version, about = "On-demand module transform dev server", long_about = None)]
struct Cli {
    /// Increase logging verbosity (-v for DEBUG, -vv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Emit JSON formatted logs
    #[arg(long, global = true)]
    json: bool,

    /// Override the working directory (project root)
    #[arg(long, global = true, value_name = "PATH")]
    cwd: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Print version information
    Version,

    /// Start the dev server
    Dev {
        /// Port to listen on [default: 5137]
        #[arg(long, short = 'p')]
        port: Option<u16>,

        /// Host to bind to [default: 127.0.0.1]
        #[arg(long)]
        host: Option<String>,

        /// Entry document, relative to the root [default: index.html]
        #[arg(long, value_name = "FILE")]
        entry: Option<String>,

        /// Manifest field naming a package's module entry [default: module]
        #[arg(long, value_name = "FIELD")]
        entry_field: Option<String>,

        /// Re-read package manifests on every import resolution
        #[arg(long)]
        no_resolve_cache: bool,

        /// Path to config file (overrides vitelet.json discovery)
        #[arg(long, short = 'c', value_name = "FILE")]
        config: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Determine working directory
    let cwd = match cli.cwd {
        Some(cwd) => cwd,
        None => std::env::current_dir().into_diagnostic()?,
    };

    logging::init(cli.verbose, cli.json);

    match cli.command {
        Some(Commands::Version) | None => commands::version::run(),
        Some(Commands::Dev {
            port,
            host,
            entry,
            entry_field,
            no_resolve_cache,
            config,
        }) => {
            let action = commands::dev::DevAction {
                cwd,
                port,
                host,
                entry,
                entry_field,
                no_resolve_cache,
                config,
            };
            let rt = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .into_diagnostic()?;
            rt.block_on(commands::dev::run(action))
        }
    }
}
