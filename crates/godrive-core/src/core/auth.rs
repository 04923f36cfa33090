//! Interactive collection of login credentials.

use crate::api::auth::Login;
use crate::error::{AppError, CliError};
use crate::utils::validation::validate_email;
use rpassword::read_password;
use std::io::{self, Write};

pub const EMAIL_ENV: &str = "GODRIVE_EMAIL";
pub const PASSWORD_ENV: &str = "GODRIVE_PASSWORD";

/// User login credentials input handler
#[derive(Debug, Clone)]
pub struct LoginInput {
    pub email: String,
    pub password: String,
}

impl LoginInput {
    /// Gather credentials from arguments, then the environment, then the terminal.
    pub fn collect(email: Option<&str>, password: Option<&str>) -> Result<Self, AppError> {
        let email = match email.map(str::to_string).or_else(|| env_value(EMAIL_ENV)) {
            Some(email) => email,
            None => prompt("Email: ")?,
        };

        let password = match password.map(str::to_string).or_else(|| env_value(PASSWORD_ENV)) {
            Some(password) => password,
            None => prompt_password("Password: ")?,
        };

        Ok(Self {
            email: email.trim().to_string(),
            password,
        })
    }

    /// Validate that credentials are usable before hitting the network
    pub fn validate(&self) -> Result<(), AppError> {
        validate_email(&self.email).map_err(|message| AppError::Cli(CliError::InvalidArguments(message)))?;
        if self.password.is_empty() {
            return Err(AppError::Cli(CliError::InvalidArguments(
                "Password cannot be empty".to_string(),
            )));
        }
        Ok(())
    }

    pub fn into_request(self) -> Login {
        Login {
            email: self.email,
            password: self.password,
        }
    }
}

fn env_value(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|value| !value.is_empty())
}

fn flush_stdout() -> Result<(), AppError> {
    io::stdout().flush().map_err(|e| {
        AppError::Cli(CliError::InvalidArguments(format!(
            "Failed to flush stdout: {}",
            e
        )))
    })
}

/// Print `label` and read one trimmed line from stdin.
pub fn prompt(label: &str) -> Result<String, AppError> {
    print!("{}", label);
    flush_stdout()?;

    let mut line = String::new();
    io::stdin().read_line(&mut line).map_err(|e| {
        AppError::Cli(CliError::InvalidArguments(format!(
            "Failed to read input: {}",
            e
        )))
    })?;
    Ok(line.trim().to_string())
}

/// Print `label` and read a line without echoing it.
pub fn prompt_password(label: &str) -> Result<String, AppError> {
    print!("{}", label);
    flush_stdout()?;

    let password = read_password().map_err(|e| {
        AppError::Cli(CliError::InvalidArguments(format!(
            "Failed to read password: {}",
            e
        )))
    })?;
    Ok(password.trim().to_string())
}
