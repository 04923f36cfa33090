use crate::cli::command_handlers::{AuthHandler, ConfigHandler, InstructorHandler, ProfileHandler};
use crate::cli::main_types::Commands;
use godrive_core::api::client::GoDriveClient;
use godrive_core::core::server_state::ServerState;
use godrive_core::core::session::ClientStore;
use godrive_core::error::AppError;
use godrive_core::storage::config::Config;
use godrive_core::storage::credentials::KeyringSessionStorage;
use godrive_core::utils::logging::VerboseLogger;
use std::path::PathBuf;
use std::sync::Arc;

pub struct Dispatcher {
    config: Config,
    config_path: Option<PathBuf>,
    logger: VerboseLogger,
    api_url: Option<String>,
    profile: Option<String>,
}

impl Dispatcher {
    pub fn new(
        config: Config,
        config_path: Option<PathBuf>,
        verbose: bool,
        api_url: Option<String>,
        profile: Option<String>,
    ) -> Self {
        Self {
            config,
            config_path,
            logger: VerboseLogger::new(verbose),
            api_url,
            profile,
        }
    }

    // CLI flag > config file > "default"
    fn profile_name(&self) -> String {
        self.profile
            .clone()
            .unwrap_or_else(|| self.config.profile_name().to_string())
    }

    fn create_store(&self) -> ClientStore {
        let profile = self.profile_name();
        self.logger
            .log(&format!("Using keyring profile '{}'", profile));
        ClientStore::with_storage(Arc::new(KeyringSessionStorage::new(profile)))
    }

    // Helper method to wire client, store and caches together
    fn create_state(&self) -> Result<ServerState, AppError> {
        let client_config = self.config.client_config(self.api_url.as_deref())?;
        self.logger.log(&format!(
            "API: {} (timeout {}s)",
            client_config.base_url,
            client_config.timeout.as_secs()
        ));

        let client = GoDriveClient::new(client_config, self.create_store())?;
        Ok(ServerState::with_stale_time(client, self.config.stale_time()))
    }

    pub async fn dispatch(&self, command: Commands) -> Result<(), AppError> {
        let verbose = self.logger.is_enabled();
        match command {
            Commands::Auth { command } => {
                let handler = AuthHandler::new();
                handler
                    .handle(command, || self.create_state(), verbose)
                    .await
            }
            Commands::Profile { command } => {
                let handler = ProfileHandler::new();
                let state = self.create_state()?;
                handler.handle(command, &state, verbose).await
            }
            Commands::Instructors { command } => {
                let handler = InstructorHandler::new();
                let state = self.create_state()?;
                handler.handle(command, &state, verbose).await
            }
            Commands::Config { command } => {
                // config commands work before any URL is configured
                let handler = ConfigHandler::new();
                let mut config = self.config.clone();
                handler.handle(command, &mut config, self.config_path.clone(), verbose)
            }
        }
    }
}
