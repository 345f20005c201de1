use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "caseflow-cli", version, about = "Caseflow CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Split a raw event log into initial and window logs
    Split(commands::split::SplitArgs),
    /// Run the classification engine over split logs
    Run(commands::run::RunArgs),
    /// Score saved window reports against final case statuses
    Evaluate(commands::evaluate::EvaluateArgs),
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Split(args) => commands::split::run(args),
        Commands::Run(args) => commands::run::run(args),
        Commands::Evaluate(args) => commands::evaluate::run(args),
        Commands::Config { action } => commands::config::run(action),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
