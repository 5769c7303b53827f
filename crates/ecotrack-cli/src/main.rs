use clap::{Parser, Subcommand};

mod commands;
mod common;

#[derive(Parser)]
#[command(name = "ecotrack-cli", version, about = "Ecotrack CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Overall progress status
    Status {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Goal management
    Goal {
        #[command(subcommand)]
        action: commands::goal::GoalAction,
    },
    /// Daily bonus tasks
    Task {
        #[command(subcommand)]
        action: commands::task::TaskAction,
    },
    /// Account management
    Auth {
        #[command(subcommand)]
        action: commands::auth::AuthAction,
    },
    /// Anonymous-progress merge flow
    Merge {
        #[command(subcommand)]
        action: commands::merge::MergeAction,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Status { json } => commands::status::run(json),
        Commands::Goal { action } => commands::goal::run(action),
        Commands::Task { action } => commands::task::run(action),
        Commands::Auth { action } => commands::auth::run(action),
        Commands::Merge { action } => commands::merge::run(action),
        Commands::Config { action } => commands::config::run(action),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
