//! Instructor detail endpoints: `/instructors/{id}*`.

use crate::api::client::GoDriveClient;
use crate::api::endpoint::{Endpoint, require_non_empty};
use crate::api::models::{InstructorProfile, Review};
use crate::error::ApiError;
use reqwest::Method;

#[derive(Debug, Clone, PartialEq)]
pub struct GetInstructor {
    pub id: String,
}

impl Endpoint for GetInstructor {
    type Response = InstructorProfile;
    const NAME: &'static str = "instructor.profile";
    const METHOD: Method = Method::GET;

    fn path(&self) -> String {
        format!("/instructors/{}", self.id)
    }

    fn validate(&self) -> Result<(), String> {
        validate_instructor_id(&self.id)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ListInstructorReviews {
    pub id: String,
}

impl Endpoint for ListInstructorReviews {
    type Response = Vec<Review>;
    const NAME: &'static str = "instructor.reviews";
    const METHOD: Method = Method::GET;

    fn path(&self) -> String {
        format!("/instructors/{}/reviews", self.id)
    }

    fn validate(&self) -> Result<(), String> {
        validate_instructor_id(&self.id)
    }
}

/// Ids are interpolated into the path, so anything that would change the URL
/// structure is rejected.
fn validate_instructor_id(id: &str) -> Result<(), String> {
    require_non_empty("Instructor id", id)?;
    if id.contains(|c: char| matches!(c, '/' | '?' | '#' | '%') || c.is_whitespace()) {
        return Err(format!("Invalid instructor id '{}'", id));
    }
    Ok(())
}

impl GoDriveClient {
    pub async fn instructor(&self, id: &str) -> Result<InstructorProfile, ApiError> {
        self.execute(&GetInstructor { id: id.to_string() }).await
    }

    pub async fn instructor_reviews(&self, id: &str) -> Result<Vec<Review>, ApiError> {
        self.execute(&ListInstructorReviews { id: id.to_string() })
            .await
    }
}
