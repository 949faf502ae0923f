use clap::{CommandFactory, FromArgMatches, Parser, Subcommand};
use std::process;
use tracing::Level;

mod cmd;
mod reports;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(global = true, long, default_value_t = false)]
    debug: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run a batch of seeded trials
    Run(cmd::run::RunArgs),
    /// List the contents of a saved result store
    Inspect(cmd::inspect::InspectArgs),
    /// Print indicator statistics from a saved result store
    Report(cmd::report::ReportArgs),
    /// Write the result-sets of one algorithm/problem pair as CSV
    Export(cmd::export::ExportArgs),
}

fn main() {
    // 1. Parse Raw Matches (to distinguish user input from defaults)
    let matches = Cli::command().get_matches();

    // 2. Construct CLI struct (populated with defaults)
    let cli = Cli::from_arg_matches(&matches).unwrap_or_else(|e| e.exit());

    // 3. Logging goes to stderr so reports stay clean on stdout
    let level = if cli.debug { Level::DEBUG } else { Level::INFO };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    // 4. Subcommand matches carry the explicitly typed job arguments
    let sub_matches = matches
        .subcommand()
        .map(|(_, m)| m)
        .unwrap_or(&matches);

    // 5. Execute
    let result = match cli.command {
        Commands::Run(args) => cmd::run::run(args, sub_matches),
        Commands::Inspect(args) => cmd::inspect::run(args),
        Commands::Report(args) => cmd::report::run(args),
        Commands::Export(args) => cmd::export::run(args),
    };

    if let Err(e) = result {
        eprintln!("\n❌ {}", e.user_message());
        process::exit(1);
    }
}
