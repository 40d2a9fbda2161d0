use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use dgen_execution::{SessionEventLayer, init_telemetry};

mod bootstrap;
mod commands;

use bootstrap::AppBootstrap;

#[derive(Parser)]
#[command(name = "dgen")]
#[command(about = "DGEN - streaming diagram generation", long_about = None)]
struct Cli {
    /// Keep configuration and data under this directory
    #[arg(long, global = true, value_name = "DIR")]
    base_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write default config.toml and secret.json unless they exist
    Init,
    /// Generate a diagram and print the push-channel frames to stdout
    Generate(GenerateArgs),
    /// Manage projects
    Project {
        #[command(subcommand)]
        action: ProjectAction,
    },
    /// Manage accounts
    Account {
        #[command(subcommand)]
        action: AccountAction,
    },
}

#[derive(Args)]
pub struct GenerateArgs {
    #[arg(long)]
    pub account: String,
    #[arg(long)]
    pub project: String,
    /// Diagram type from the catalog (flowchart, sequence, ...)
    #[arg(long = "type", value_name = "TYPE")]
    pub diagram_type: String,
    #[arg(long)]
    pub prompt: String,
    /// Rendered image to store with the result
    #[arg(long, value_name = "FILE")]
    pub image_file: Option<PathBuf>,
    /// Emit snapshots without artificial delays
    #[arg(long)]
    pub no_pacing: bool,
    /// Replay this file instead of calling the generation service
    #[arg(long, value_name = "FILE")]
    pub script: Option<PathBuf>,
    /// Cancel if the diagram is not closed within this many seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,
    /// Print session and completion events to stderr as JSON lines
    #[arg(long)]
    pub events: bool,
}

#[derive(Subcommand)]
enum ProjectAction {
    Create {
        #[arg(long)]
        account: String,
        name: String,
    },
    List {
        #[arg(long)]
        account: String,
    },
    /// Show history entries, newest first
    History {
        #[arg(long)]
        account: String,
        project: String,
    },
    /// Show stored generation records
    Records {
        #[arg(long)]
        account: String,
        project: String,
    },
    Delete {
        #[arg(long)]
        account: String,
        project: String,
    },
}

#[derive(Subcommand)]
enum AccountAction {
    Create {
        id: String,
        #[arg(long, default_value_t = 10_000)]
        balance: i64,
    },
    Show {
        id: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let app = AppBootstrap::load(cli.base_dir.as_deref())?;

    let (events_layer, events) = match &cli.command {
        Commands::Generate(args) if args.events => {
            let (layer, receiver) = SessionEventLayer::channel();
            (Some(layer), Some(receiver))
        }
        _ => (None, None),
    };
    let _telemetry = init_telemetry(&app.config.logging, &app.paths.logs_dir()?, events_layer)?;

    match cli.command {
        Commands::Init => commands::init::run(&app)?,
        Commands::Generate(args) => commands::generate::run(&app, args, events).await?,
        Commands::Project { action } => match action {
            ProjectAction::Create { account, name } => {
                commands::project::create(&app, &account, &name).await?
            }
            ProjectAction::List { account } => commands::project::list(&app, &account).await?,
            ProjectAction::History { account, project } => {
                commands::project::history(&app, &account, &project).await?
            }
            ProjectAction::Records { account, project } => {
                commands::project::records(&app, &account, &project).await?
            }
            ProjectAction::Delete { account, project } => {
                commands::project::delete(&app, &account, &project).await?
            }
        },
        Commands::Account { action } => match action {
            AccountAction::Create { id, balance } => {
                commands::account::create(&app, &id, balance).await?
            }
            AccountAction::Show { id } => commands::account::show(&app, &id).await?,
        },
    }

    Ok(())
}
