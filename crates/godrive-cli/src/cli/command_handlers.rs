use crate::cli::main_types::{
    AuthCommands, ConfigCommands, InstructorCommands, LocationArgs, ProfileCommands, SearchArgs,
};
use godrive_core::api::auth::{ForgotPassword, Register, ResetPassword};
use godrive_core::api::models::{LicenseCategory, Location, Role};
use godrive_core::api::profile::{UpdateLocation, UpdateStudentProfile};
use godrive_core::api::search::SearchInstructors;
use godrive_core::core::auth::{LoginInput, prompt_password};
use godrive_core::core::server_state::ServerState;
use godrive_core::display::TableDisplay;
use godrive_core::error::{ApiError, AppError, AuthError, CliError};
use godrive_core::storage::config::Config;
use godrive_core::utils::logging::{log_warning, print_verbose};
use std::path::PathBuf;

fn require_session(state: &ServerState) -> Result<(), AppError> {
    if state.store().is_authenticated() {
        Ok(())
    } else {
        Err(AppError::Auth(AuthError::NotAuthenticated))
    }
}

fn parse_category(value: Option<String>) -> Result<Option<LicenseCategory>, AppError> {
    value
        .map(|raw| {
            raw.parse::<LicenseCategory>()
                .map_err(|e| AppError::Cli(CliError::InvalidArguments(e)))
        })
        .transpose()
}

#[derive(Default)]
pub struct AuthHandler;

impl AuthHandler {
    pub fn new() -> Self {
        Self
    }

    /// `create_state` is only called once local input checks have passed.
    pub async fn handle<F>(
        &self,
        command: AuthCommands,
        create_state: F,
        verbose: bool,
    ) -> Result<(), AppError>
    where
        F: Fn() -> Result<ServerState, AppError>,
    {
        match command {
            AuthCommands::Login { email, password } => {
                let input = LoginInput::collect(email.as_deref(), password.as_deref())?;
                input.validate()?;

                let state = create_state()?;
                print_verbose(verbose, &format!("Signing in as {}", input.email));
                let session = state
                    .login(&input.into_request())
                    .await
                    .map_err(|e| match e {
                        ApiError::Validation { status: 401, .. } => {
                            AppError::Auth(AuthError::InvalidCredentials)
                        }
                        other => AppError::Api(other),
                    })?;
                println!("✅ Signed in as {} ({})", session.user.name, session.user.email);
                Ok(())
            }
            AuthCommands::Register {
                name,
                email,
                password,
                phone,
                instructor,
            } => {
                let password = match password {
                    Some(password) => password,
                    None => prompt_password("Password: ")?,
                };
                let role = if instructor {
                    Role::Instructor
                } else {
                    Role::Student
                };

                let state = create_state()?;
                let session = state
                    .register(&Register {
                        name,
                        email,
                        password,
                        role,
                        phone,
                    })
                    .await?;
                println!("✅ Account created. Signed in as {}", session.user.email);
                Ok(())
            }
            AuthCommands::ForgotPassword { email } => {
                let state = create_state()?;
                let response = state.forgot_password(&ForgotPassword { email }).await?;
                if response.message.is_empty() {
                    println!("✅ If the account exists, a reset email is on its way.");
                } else {
                    println!("✅ {}", response.message);
                }
                Ok(())
            }
            AuthCommands::ResetPassword { token, password } => {
                let password = match password {
                    Some(password) => password,
                    None => prompt_password("New password: ")?,
                };

                let state = create_state()?;
                let response = state
                    .reset_password(&ResetPassword { token, password })
                    .await?;
                if response.message.is_empty() {
                    println!("✅ Password updated. Sign in with 'godrive auth login'.");
                } else {
                    println!("✅ {}", response.message);
                }
                Ok(())
            }
            AuthCommands::Me => {
                let state = create_state()?;
                require_session(&state)?;
                let user = state.me().await.into_result()?;
                println!("{}", TableDisplay::new().render_user(&user));
                Ok(())
            }
            AuthCommands::Logout => {
                let state = create_state()?;
                if !state.store().is_authenticated() {
                    println!("Not signed in.");
                    return Ok(());
                }
                if let Err(e) = state.logout().await {
                    log_warning(&format!("Server did not confirm logout: {}", e));
                }
                println!("✅ Signed out.");
                Ok(())
            }
            AuthCommands::Status => {
                let state = create_state()?;
                match state.store().current_user() {
                    Some(user) => {
                        println!("Signed in as {} <{}>", user.name, user.email);
                        print_verbose(verbose, &format!("User id: {}", user.id));
                    }
                    None => println!("Not signed in."),
                }
                Ok(())
            }
        }
    }
}

#[derive(Default)]
pub struct ProfileHandler;

impl ProfileHandler {
    pub fn new() -> Self {
        Self
    }

    pub async fn handle(
        &self,
        command: ProfileCommands,
        state: &ServerState,
        verbose: bool,
    ) -> Result<(), AppError> {
        require_session(state)?;

        match command {
            ProfileCommands::Show => {
                let profile = state.student_profile().await.into_result()?;
                println!("{}", TableDisplay::new().render_student_profile(&profile));
                Ok(())
            }
            ProfileCommands::Update {
                name,
                phone,
                avatar_url,
                category,
                address,
            } => {
                let request = UpdateStudentProfile {
                    name,
                    phone,
                    avatar_url,
                    license_category: parse_category(category)?,
                    address,
                };
                if request.is_empty() {
                    return Err(AppError::Cli(CliError::InvalidArguments(
                        "Nothing to update. Pass at least one of --name, --phone, --avatar-url, --category, --address".to_string(),
                    )));
                }

                state.update_student_profile(&request).await?;
                println!("✅ Profile updated.");

                // the update invalidated the cached profile, so this reads fresh data
                let profile = state.student_profile().await.into_result()?;
                println!("{}", TableDisplay::new().render_student_profile(&profile));
                Ok(())
            }
            ProfileCommands::Location(LocationArgs { lat, lng, address }) => {
                let location = Location::new(lat, lng);
                print_verbose(
                    verbose,
                    &format!("Saving location {}, {}", location.latitude, location.longitude),
                );
                let saved = state
                    .update_location(&UpdateLocation { location, address })
                    .await?;
                println!(
                    "✅ Location saved: {:.5}, {:.5}",
                    saved.latitude, saved.longitude
                );
                Ok(())
            }
        }
    }
}

#[derive(Default)]
pub struct InstructorHandler;

impl InstructorHandler {
    pub fn new() -> Self {
        Self
    }

    pub async fn handle(
        &self,
        command: InstructorCommands,
        state: &ServerState,
        verbose: bool,
    ) -> Result<(), AppError> {
        match command {
            InstructorCommands::Search(args) => self.search(args, state, verbose).await,
            InstructorCommands::Show { id } => {
                let profile = state.instructor_profile(&id).await.into_result()?;
                println!("{}", TableDisplay::new().render_instructor_profile(&profile));
                Ok(())
            }
            InstructorCommands::Reviews { id } => {
                let reviews = state.instructor_reviews(&id).await.into_result()?;
                println!("{}", TableDisplay::new().render_reviews(&reviews));
                Ok(())
            }
        }
    }

    async fn search(
        &self,
        args: SearchArgs,
        state: &ServerState,
        verbose: bool,
    ) -> Result<(), AppError> {
        if let (Some(lat), Some(lng)) = (args.lat, args.lng) {
            state.report_device_location(Location::new(lat, lng));
        }

        let params = SearchInstructors {
            query: args.query,
            category: parse_category(args.category)?,
            near: state.store().location(),
            radius_km: args.radius,
            max_price: args.max_price,
            min_rating: args.min_rating,
            page: Some(args.page),
            limit: Some(args.limit),
        };
        print_verbose(
            verbose,
            &format!("Searching with {}", params.cache_fragment()),
        );

        let results = state.search_instructors(&params).await.into_result()?;
        println!(
            "{}",
            TableDisplay::new().render_instructor_list(&results.instructors)
        );

        let page = results.page.unwrap_or(args.page);
        println!(
            "Page {} · {} of {} instructors",
            page,
            results.instructors.len(),
            results.total
        );
        Ok(())
    }
}

#[derive(Default)]
pub struct ConfigHandler;

impl ConfigHandler {
    pub fn new() -> Self {
        Self
    }

    pub fn handle(
        &self,
        command: ConfigCommands,
        config: &mut Config,
        config_path: Option<PathBuf>,
        verbose: bool,
    ) -> Result<(), AppError> {
        match command {
            ConfigCommands::Show => {
                print_verbose(verbose, "Showing configuration");
                let path = match &config_path {
                    Some(path) => path.clone(),
                    None => Config::config_file_path()?,
                };

                println!("Current Configuration:");
                println!("=====================");
                println!("File: {}", path.display());
                println!(
                    "API URL: {}",
                    config.get_api_url().unwrap_or_else(|| "(not set)".to_string())
                );
                println!("Timeout: {}s", config.timeout().as_secs());
                println!("Cache stale time: {}s", config.stale_time().as_secs());
                println!("Profile: {}", config.profile_name());
                Ok(())
            }
            ConfigCommands::Set { key, value } => {
                print_verbose(verbose, &format!("Setting {} = {}", key, value));
                config.set(&key, &value)?;
                config.save(config_path)?;
                println!("✅ Set {} to: {}", key, value);
                Ok(())
            }
        }
    }
}
