use clap::Parser;
use plant_app::{
    app::{run, AppConfig},
    cli::Cli,
    init_tracing,
};

#[tokio::main]
async fn main() {
    let config = AppConfig::from_env().unwrap_or_default();
    init_tracing(config.log_filter());
    let cli = Cli::parse();
    if let Err(err) = run(config, cli.command).await {
        eprintln!("plant_care: {err:#}");
        std::process::exit(1);
    }
}
