//! Typed queries and mutations over the backend.
//!
//! Queries read through a [`QueryCache`] per record type. Mutations call the
//! API directly and then invalidate whatever keys they affect, so the next
//! read of those keys goes back to the network.

use crate::api::auth::{ForgotPassword, Login, Register, ResetPassword};
use crate::api::client::GoDriveClient;
use crate::api::models::{
    AuthResponse, InstructorProfile, Location, MessageResponse, Review, SearchResponse, Session,
    StudentProfile, User,
};
use crate::api::profile::{UpdateLocation, UpdateStudentProfile};
use crate::api::search::SearchInstructors;
use crate::core::cache::{CacheStats, DEFAULT_STALE_TIME, QueryCache};
use crate::core::query::{QueryKey, QueryState, keys};
use crate::core::session::ClientStore;
use crate::error::ApiError;
use std::future::Future;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct ServerState {
    client: GoDriveClient,
    me: QueryCache<User>,
    student_profiles: QueryCache<StudentProfile>,
    instructors: QueryCache<InstructorProfile>,
    reviews: QueryCache<Vec<Review>>,
    searches: QueryCache<SearchResponse>,
}

impl ServerState {
    pub fn new(client: GoDriveClient) -> Self {
        Self::with_stale_time(client, DEFAULT_STALE_TIME)
    }

    pub fn with_stale_time(client: GoDriveClient, stale_time: Duration) -> Self {
        Self {
            client,
            me: QueryCache::new("me", stale_time),
            student_profiles: QueryCache::new("student_profile", stale_time),
            instructors: QueryCache::new("instructor_profile", stale_time),
            reviews: QueryCache::new("instructor_reviews", stale_time),
            searches: QueryCache::new("instructor_search", stale_time),
        }
    }

    pub fn client(&self) -> &GoDriveClient {
        &self.client
    }

    pub fn store(&self) -> &ClientStore {
        self.client.store()
    }

    // Queries

    /// Current user. A read whose result was stored also refreshes the
    /// session's user; superseded results leave the session alone.
    pub async fn me(&self) -> QueryState<User> {
        let client = self.client.clone();
        let state = self
            .me
            .fetch(&keys::me(), move || async move { client.me().await })
            .await;

        if let Some(user) = state.committed_data() {
            // results for another account (e.g. resolved after a re-login) are not applied
            if self
                .store()
                .current_user()
                .is_some_and(|current| current.id == user.id)
            {
                self.store().replace_user(user.clone());
            }
        }
        state
    }

    pub async fn student_profile(&self) -> QueryState<StudentProfile> {
        let client = self.client.clone();
        self.student_profiles
            .fetch(&keys::student_profile(), move || async move {
                client.student_profile().await
            })
            .await
    }

    /// `id` is trimmed once so the cache key and the request path agree.
    pub async fn instructor_profile(&self, id: &str) -> QueryState<InstructorProfile> {
        let id = id.trim();
        let client = self.client.clone();
        let id_owned = id.to_string();
        self.instructors
            .fetch(&keys::instructor_profile(id), move || async move {
                client.instructor(&id_owned).await
            })
            .await
    }

    pub async fn instructor_reviews(&self, id: &str) -> QueryState<Vec<Review>> {
        let id = id.trim();
        let client = self.client.clone();
        let id_owned = id.to_string();
        self.reviews
            .fetch(&keys::instructor_reviews(id), move || async move {
                client.instructor_reviews(&id_owned).await
            })
            .await
    }

    pub async fn search_instructors(&self, params: &SearchInstructors) -> QueryState<SearchResponse> {
        let client = self.client.clone();
        let request = params.clone();
        self.searches
            .fetch(&keys::instructor_search(params), move || async move {
                client.search_instructors(&request).await
            })
            .await
    }

    // Mutations

    /// Run `mutation`; on success invalidate every key under each of `invalidates`.
    pub async fn mutate<T, Fut>(&self, mutation: Fut, invalidates: &[QueryKey]) -> Result<T, ApiError>
    where
        Fut: Future<Output = Result<T, ApiError>>,
    {
        let value = mutation.await?;
        for key in invalidates {
            self.invalidate(key);
        }
        Ok(value)
    }

    pub async fn login(&self, request: &Login) -> Result<Session, ApiError> {
        let response = self.client.login(request).await?;
        Ok(self.start_session(response))
    }

    pub async fn register(&self, request: &Register) -> Result<Session, ApiError> {
        let response = self.client.register(request).await?;
        Ok(self.start_session(response))
    }

    fn start_session(&self, response: AuthResponse) -> Session {
        let session = Session::from(response);
        self.store().set_session(session.clone());
        // nothing cached under the previous identity survives
        self.clear();
        self.me.set_data(&keys::me(), session.user.clone());
        log::debug!("Session started for user {}", session.user.id);
        session
    }

    /// End the session. Local state is cleared even when the server call fails.
    pub async fn logout(&self) -> Result<(), ApiError> {
        let result = if self.store().is_authenticated() {
            self.client.logout().await
        } else {
            Ok(())
        };

        if let Err(e) = &result {
            log::warn!("Server logout failed, clearing local session anyway: {}", e);
        }
        self.store().clear_session();
        self.clear();
        result
    }

    pub async fn forgot_password(&self, request: &ForgotPassword) -> Result<MessageResponse, ApiError> {
        self.client.forgot_password(request).await
    }

    pub async fn reset_password(&self, request: &ResetPassword) -> Result<MessageResponse, ApiError> {
        self.client.reset_password(request).await
    }

    pub async fn update_student_profile(
        &self,
        request: &UpdateStudentProfile,
    ) -> Result<StudentProfile, ApiError> {
        self.mutate(
            self.client.update_student_profile(request),
            &[keys::student_profile(), keys::me()],
        )
        .await
    }

    /// Save the location server-side and make it the device's current one.
    pub async fn update_location(&self, request: &UpdateLocation) -> Result<Location, ApiError> {
        let saved = self.client.update_location(request).await?;
        self.store().set_location(saved);
        self.invalidate(&keys::student_profile());
        self.invalidate(&keys::instructor_searches());
        Ok(saved)
    }

    /// Local-only: record a new device position. Distance-based searches go stale.
    pub fn report_device_location(&self, location: Location) {
        self.store().set_location(location);
        self.invalidate(&keys::instructor_searches());
    }

    // Cache control

    /// Invalidate every cached key under `prefix`, across all record types.
    pub fn invalidate(&self, prefix: &QueryKey) -> usize {
        self.me.invalidate_prefix(prefix)
            + self.student_profiles.invalidate_prefix(prefix)
            + self.instructors.invalidate_prefix(prefix)
            + self.reviews.invalidate_prefix(prefix)
            + self.searches.invalidate_prefix(prefix)
    }

    pub fn clear(&self) {
        self.me.clear();
        self.student_profiles.clear();
        self.instructors.clear();
        self.reviews.clear();
        self.searches.clear();
    }

    /// Drop unobserved entries idle for longer than `gc_time`.
    pub fn cleanup(&self, gc_time: Duration) -> usize {
        self.me.cleanup(gc_time)
            + self.student_profiles.cleanup(gc_time)
            + self.instructors.cleanup(gc_time)
            + self.reviews.cleanup(gc_time)
            + self.searches.cleanup(gc_time)
    }

    /// Per-cache statistics, named.
    pub fn stats(&self) -> Vec<(&'static str, CacheStats)> {
        vec![
            (self.me.name(), self.me.stats()),
            (self.student_profiles.name(), self.student_profiles.stats()),
            (self.instructors.name(), self.instructors.stats()),
            (self.reviews.name(), self.reviews.stats()),
            (self.searches.name(), self.searches.stats()),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::client::ClientConfig;
    use crate::api::models::Role;

    fn server_state() -> ServerState {
        // port 9 (discard) is never expected to answer; these tests stay local
        let client = GoDriveClient::new(ClientConfig::new("http://127.0.0.1:9"), ClientStore::new())
            .expect("client creation failed");
        ServerState::new(client)
    }

    fn search_response() -> SearchResponse {
        SearchResponse {
            instructors: Vec::new(),
            total: 0,
            page: Some(1),
        }
    }

    #[tokio::test]
    async fn test_report_device_location_invalidates_searches() {
        let state = server_state();
        let key = keys::instructor_search(&SearchInstructors::default());
        state.searches.set_data(&key, search_response());
        assert_eq!(state.searches.stats().fresh_entries, 1);

        state.report_device_location(Location::new(-23.55, -46.63));

        assert_eq!(state.store().location(), Some(Location::new(-23.55, -46.63)));
        assert_eq!(state.searches.stats().fresh_entries, 0);
        assert_eq!(state.searches.stats().stale_entries, 1);
    }

    #[tokio::test]
    async fn test_invalidate_fans_out_by_prefix() {
        let state = server_state();
        state
            .searches
            .set_data(&keys::instructor_search(&SearchInstructors::default()), search_response());
        state.reviews.set_data(&keys::instructor_reviews("7"), Vec::new());
        state.me.set_data(
            &keys::me(),
            User {
                id: "u1".to_string(),
                email: "ana@example.com".to_string(),
                name: "Ana".to_string(),
                role: Role::Student,
                avatar_url: None,
            },
        );

        assert_eq!(state.invalidate(&keys::instructors()), 2);
        assert_eq!(state.me.stats().fresh_entries, 1);
    }

    #[tokio::test]
    async fn test_logout_without_session_clears_caches() {
        let state = server_state();
        state.reviews.set_data(&keys::instructor_reviews("7"), Vec::new());

        assert!(state.logout().await.is_ok());
        assert!(state.stats().iter().all(|(_, stats)| stats.total_entries == 0));
    }

    #[tokio::test]
    async fn test_mutation_failure_keeps_cache() {
        let state = server_state();
        state.reviews.set_data(&keys::instructor_reviews("7"), Vec::new());

        let result: Result<(), ApiError> = state
            .mutate(
                async {
                    Err(ApiError::Http {
                        status: 500,
                        endpoint: "/students/me".to_string(),
                        body: String::new(),
                    })
                },
                &[keys::instructors()],
            )
            .await;

        assert!(result.is_err());
        assert_eq!(state.reviews.stats().fresh_entries, 1);
    }
}
