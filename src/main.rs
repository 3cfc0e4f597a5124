use arbitrex::cli::{self, Cli, Commands};
use clap::Parser;

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run => cli::run::execute(&cli.config, cli.json_logs).await,
        Commands::Status => cli::status::execute(&cli.config).await,
        Commands::Check => cli::check::execute(&cli.config).await,
    };

    if let Err(error) = result {
        eprintln!("error: {error}");
        std::process::exit(1);
    }
}
