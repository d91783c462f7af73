use clap::Parser;
use provider_app::cli::Cli;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    provider_app::init_logging(&cli.log_level);

    if let Err(e) = provider_app::run(cli).await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
