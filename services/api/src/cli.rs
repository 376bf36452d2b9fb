use crate::commands::{run_applications, ApplicationsCommand};
use crate::demo::{run_demo, DemoArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use grant_review::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "Grant Review",
    about = "Serve the sponsor review API and drive grant application reviews from the command line",
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
    /// Review applications of a grant through a running review API
    Applications {
        #[command(subcommand)]
        command: ApplicationsCommand,
    },
    /// Walk through a seeded review session without a network
    Demo(DemoArgs),
}

#[derive(Args, Debug)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
    /// Pending applications seeded into the demo grant
    #[arg(long, default_value_t = 45)]
    pub(crate) seed_applications: usize,
    /// Pending submissions seeded into the demo listing
    #[arg(long, default_value_t = 12)]
    pub(crate) seed_submissions: usize,
}

impl Default for ServeArgs {
    fn default() -> Self {
        Self {
            host: None,
            port: None,
            seed_applications: 45,
            seed_submissions: 12,
        }
    }
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Applications { command } => run_applications(command).await,
        Command::Demo(args) => run_demo(args).await,
    }
}
