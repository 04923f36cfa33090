//! Student profile endpoints: `/students/me*`.

use crate::api::client::GoDriveClient;
use crate::api::endpoint::{Endpoint, json_body};
use crate::api::models::{LicenseCategory, Location, StudentProfile};
use crate::error::ApiError;
use reqwest::Method;
use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Clone, Copy, Default)]
pub struct GetStudentProfile;

impl Endpoint for GetStudentProfile {
    type Response = StudentProfile;
    const NAME: &'static str = "student.profile";
    const METHOD: Method = Method::GET;

    fn path(&self) -> String {
        "/students/me".to_string()
    }
}

/// Partial update; `None` fields are left untouched by the server.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStudentProfile {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub license_category: Option<LicenseCategory>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

impl UpdateStudentProfile {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.phone.is_none()
            && self.avatar_url.is_none()
            && self.license_category.is_none()
            && self.address.is_none()
    }
}

impl Endpoint for UpdateStudentProfile {
    type Response = StudentProfile;
    const NAME: &'static str = "student.profile.update";
    const METHOD: Method = Method::PUT;

    fn path(&self) -> String {
        "/students/me".to_string()
    }

    fn body(&self) -> serde_json::Result<Option<Value>> {
        json_body(self)
    }

    fn validate(&self) -> Result<(), String> {
        if self.is_empty() {
            return Err("Nothing to update".to_string());
        }
        if self.name.as_deref().is_some_and(|name| name.trim().is_empty()) {
            return Err("Name cannot be empty".to_string());
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct UpdateLocation {
    #[serde(flatten)]
    pub location: Location,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

impl Endpoint for UpdateLocation {
    type Response = Location;
    const NAME: &'static str = "student.location.update";
    const METHOD: Method = Method::PUT;

    fn path(&self) -> String {
        "/students/me/location".to_string()
    }

    fn body(&self) -> serde_json::Result<Option<Value>> {
        json_body(self)
    }

    fn validate(&self) -> Result<(), String> {
        if self.location.is_valid() {
            Ok(())
        } else {
            Err(format!(
                "Coordinates out of range: {}, {}",
                self.location.latitude, self.location.longitude
            ))
        }
    }
}

impl GoDriveClient {
    pub async fn student_profile(&self) -> Result<StudentProfile, ApiError> {
        self.execute(&GetStudentProfile).await
    }

    pub async fn update_student_profile(
        &self,
        request: &UpdateStudentProfile,
    ) -> Result<StudentProfile, ApiError> {
        self.execute(request).await
    }

    pub async fn update_location(&self, request: &UpdateLocation) -> Result<Location, ApiError> {
        self.execute(request).await
    }
}
