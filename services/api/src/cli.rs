use crate::offline::{run_above_mean_report, run_quarters_report, ReportArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use workforce_data::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "Workforce Data Service",
    about = "Ingest workforce CSV exports and serve hiring reports over HTTP or stdout",
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
    /// Run a hiring report against local CSV exports without a server
    Report {
        #[command(subcommand)]
        command: ReportCommand,
    },
}

#[derive(Subcommand, Debug)]
enum ReportCommand {
    /// Hires per department, job, and quarter for a year
    Quarters(ReportArgs),
    /// Departments hiring above the yearly per-department mean
    AboveMean(ReportArgs),
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
        Command::Report {
            command: ReportCommand::Quarters(args),
        } => run_quarters_report(args),
        Command::Report {
            command: ReportCommand::AboveMean(args),
        } => run_above_mean_report(args),
    }
}
