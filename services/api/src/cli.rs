use crate::commands::{run_industries, run_mappings_audit, run_quote, AuditArgs, QuoteArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use merlin_quote::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "Merlin Quote",
    about = "Size energy-storage proposals and serve the quote engine over HTTP",
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
    /// Calculate and authenticate one quote from questionnaire answers
    Quote(QuoteArgs),
    /// List the industries in the configured registry
    Industries,
    /// Inspect the field and subtype mapping tables
    Mappings {
        #[command(subcommand)]
        command: MappingsCommand,
    },
}

#[derive(Subcommand, Debug)]
enum MappingsCommand {
    /// Cross-check mapping targets against the registry and, optionally, observed answers
    Audit(AuditArgs),
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
        Command::Quote(args) => run_quote(args).await,
        Command::Industries => run_industries(),
        Command::Mappings {
            command: MappingsCommand::Audit(args),
        } => run_mappings_audit(args),
    }
}
