//! Authentication endpoints: `/auth/*`.

use crate::api::client::GoDriveClient;
use crate::api::endpoint::{CREDENTIAL_STATUSES, Endpoint, json_body, require_non_empty};
use crate::api::models::{AuthResponse, MessageResponse, Role, User};
use crate::error::ApiError;
use crate::utils::error_helpers::as_validation_error;
use crate::utils::validation::validate_email;
use reqwest::Method;
use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Clone, Serialize)]
pub struct Login {
    pub email: String,
    pub password: String,
}

impl Endpoint for Login {
    type Response = AuthResponse;
    const NAME: &'static str = "auth.login";
    const METHOD: Method = Method::POST;

    fn path(&self) -> String {
        "/auth/login".to_string()
    }

    fn body(&self) -> serde_json::Result<Option<Value>> {
        json_body(self)
    }

    fn validate(&self) -> Result<(), String> {
        require_non_empty("Email", &self.email)?;
        require_non_empty("Password", &self.password)
    }

    fn map_error(error: ApiError) -> ApiError {
        as_validation_error(error, CREDENTIAL_STATUSES)
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Register {
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: Role,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

impl Endpoint for Register {
    type Response = AuthResponse;
    const NAME: &'static str = "auth.register";
    const METHOD: Method = Method::POST;

    fn path(&self) -> String {
        "/auth/register".to_string()
    }

    fn body(&self) -> serde_json::Result<Option<Value>> {
        json_body(self)
    }

    fn validate(&self) -> Result<(), String> {
        require_non_empty("Name", &self.name)?;
        validate_email(&self.email)?;
        require_non_empty("Password", &self.password)?;
        if self.role == Role::Admin {
            return Err("Admin accounts cannot be self-registered".to_string());
        }
        Ok(())
    }

    fn map_error(error: ApiError) -> ApiError {
        as_validation_error(error, CREDENTIAL_STATUSES)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ForgotPassword {
    pub email: String,
}

impl Endpoint for ForgotPassword {
    type Response = MessageResponse;
    const NAME: &'static str = "auth.forgot_password";
    const METHOD: Method = Method::POST;

    fn path(&self) -> String {
        "/auth/forgot-password".to_string()
    }

    fn body(&self) -> serde_json::Result<Option<Value>> {
        json_body(self)
    }

    fn validate(&self) -> Result<(), String> {
        validate_email(&self.email)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ResetPassword {
    pub token: String,
    pub password: String,
}

impl Endpoint for ResetPassword {
    type Response = MessageResponse;
    const NAME: &'static str = "auth.reset_password";
    const METHOD: Method = Method::POST;

    fn path(&self) -> String {
        "/auth/reset-password".to_string()
    }

    fn body(&self) -> serde_json::Result<Option<Value>> {
        json_body(self)
    }

    fn validate(&self) -> Result<(), String> {
        require_non_empty("Reset token", &self.token)?;
        require_non_empty("Password", &self.password)
    }

    fn map_error(error: ApiError) -> ApiError {
        as_validation_error(error, CREDENTIAL_STATUSES)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Me;

impl Endpoint for Me {
    type Response = User;
    const NAME: &'static str = "auth.me";
    const METHOD: Method = Method::GET;

    fn path(&self) -> String {
        "/auth/me".to_string()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Logout;

impl Endpoint for Logout {
    type Response = ();
    const NAME: &'static str = "auth.logout";
    const METHOD: Method = Method::POST;

    fn path(&self) -> String {
        "/auth/logout".to_string()
    }
}

impl GoDriveClient {
    pub async fn login(&self, request: &Login) -> Result<AuthResponse, ApiError> {
        self.execute(request).await
    }

    pub async fn register(&self, request: &Register) -> Result<AuthResponse, ApiError> {
        self.execute(request).await
    }

    pub async fn forgot_password(&self, request: &ForgotPassword) -> Result<MessageResponse, ApiError> {
        self.execute(request).await
    }

    pub async fn reset_password(&self, request: &ResetPassword) -> Result<MessageResponse, ApiError> {
        self.execute(request).await
    }

    pub async fn me(&self) -> Result<User, ApiError> {
        self.execute(&Me).await
    }

    pub async fn logout(&self) -> Result<(), ApiError> {
        self.execute(&Logout).await
    }
}
