use avatar_sync::app;
use avatar_sync::console;
use avatar_sync::utils::config_loader;
use avatar_sync::utils::constants::DEFAULT_CONFIG_PATH;
use avatar_sync::utils::logging;
use avatar_sync::utils::logging::LogLevel;
use anyhow::Result;
use clap::Parser;
use tracing::info;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[arg(short, long, env = "CONFIG", default_value = DEFAULT_CONFIG_PATH)]
    config: String,
    #[arg(long, env = "LOG_LEVEL", value_enum)]
    log_level: Option<LogLevel>,
    /// Force dry run regardless of config.
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // -------------------------------
    // 1. Load YAML config
    // -------------------------------

    let args = Args::parse();
    println!("\nInitializing, please wait...");

    let mut app_config = config_loader::run(&args.config).await?;
    if args.dry_run {
        app_config.settings.dry_run = true;
    }
    logging::run(&app_config, args.log_level);

    // -------------------------------
    // 2. Wire clients and token caches
    // -------------------------------

    let app = app::build(&app_config)?;

    // -------------------------------
    // 3. Console
    // -------------------------------

    let stdin = std::io::stdin();
    let mut input = stdin.lock();
    let mut output = std::io::stdout();

    console::announce_mode(app.settings.dry_run, &mut input, &mut output)?;
    info!("Service starting...");
    console::run_menu(&app, &mut input, &mut output).await?;

    info!("bye");
    Ok(())
}
