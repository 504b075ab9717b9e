use crate::report::{run_compute, run_sector_lookup, ComputeArgs, SectorArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use duerp::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "DUERP risk engine",
    about = "Serve or query the DUERP occupational risk engine",
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
    /// Assess one work unit and print the scored risks and action plan
    Compute(ComputeArgs),
    /// Show the catalog profile used for a NAF code
    Sector(SectorArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Compute(args) => run_compute(args),
        Command::Sector(args) => run_sector_lookup(args),
    }
}
