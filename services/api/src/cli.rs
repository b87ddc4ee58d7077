use crate::advise::{run_advise, run_import, AdviseArgs, ImportArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use storefront_insights::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "Storefront Insights",
    about = "Serve and query storefront analytics over the reporting warehouse",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Load a CSV extract of a reporting view into a local SQLite warehouse
    Import(ImportArgs),
    /// Print the should-open advisory and opening forecast for one city
    Advise(AdviseArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
    /// Override the configured SQLite warehouse file
    #[arg(long)]
    pub(crate) warehouse: Option<PathBuf>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Import(args) => run_import(args),
        Command::Advise(args) => run_advise(args).await,
    }
}
