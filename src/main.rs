// src/main.rs — ideaforge entry point

use clap::Parser;

use ideaforge::cli::{recovery_hint, Cli, Commands};
use ideaforge::infra::config::Config;
use ideaforge::infra::logger;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();

    // RUST_LOG overrides the -v level
    logger::init_logging(logger::level_for_verbosity(cli.verbosity));

    if let Err(e) = run(cli).await {
        eprintln!("error: {e}");
        if let Some(hint) = recovery_hint(&e) {
            eprintln!("{hint}");
        }
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    // Load config (falls back to defaults if no config.toml)
    let initializing = matches!(cli.command, Some(Commands::Init));
    let mut config = match cli.config {
        Some(ref path) if path.exists() => Config::load_from(path)?,
        // `init` is what creates it
        Some(_) if initializing => Config::default(),
        Some(ref path) => anyhow::bail!("Config file not found: {}", path.display()),
        None => Config::load()?,
    };
    cli.apply_overrides(&mut config);

    match cli.command {
        Some(Commands::Init) => ideaforge::cli::init::run_init(&config, cli.config.as_deref()).await,
        Some(Commands::Status { verbose }) => {
            ideaforge::cli::status::show_status(&config, cli.config.as_deref(), verbose).await
        }
        Some(Commands::Draft { count, ref niche }) => {
            ideaforge::cli::draft::run_draft(&config, count, niche).await
        }
        Some(Commands::Run) | None => ideaforge::cli::run::run_loop(&config).await,
    }
}
