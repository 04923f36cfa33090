use clap::Parser;
use godrive_core::storage::config::Config;
use godrive_core::utils::logging::init_logging;
use std::path::Path;

mod cli;

use cli::dispatcher::Dispatcher;
use cli::main_types::Cli;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    // Load Config
    let config_path = cli
        .config_dir
        .as_deref()
        .map(|dir| Config::config_file_in(Path::new(dir)));

    let config = match Config::load(config_path.clone()) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("Error loading config: {}", err);
            std::process::exit(1);
        }
    };

    if let Some(config_dir) = &cli.config_dir {
        log::debug!("Using config directory: {}", config_dir);
    }

    let dispatcher = Dispatcher::new(config, config_path, cli.verbose, cli.api_url, cli.profile);

    if let Err(e) = dispatcher.dispatch(cli.command).await {
        eprintln!("{} {}", e.severity().emoji(), e.display_friendly());
        if let Some(hint) = e.troubleshooting_hint() {
            eprintln!("Hint: {}", hint);
        }
        log::debug!("{:?}", e);
        std::process::exit(1);
    }

    Ok(())
}
