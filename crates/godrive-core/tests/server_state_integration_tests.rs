use futures::future::join_all;
use godrive_core::api::auth::Login;
use godrive_core::api::client::{ClientConfig, GoDriveClient};
use godrive_core::api::models::{Location, Role, Session, User};
use godrive_core::api::profile::{UpdateLocation, UpdateStudentProfile};
use godrive_core::api::search::SearchInstructors;
use godrive_core::core::query::FetchStatus;
use godrive_core::core::server_state::ServerState;
use godrive_core::core::session::ClientStore;
use godrive_core::error::ApiError;
use serde_json::json;
use std::time::Duration;
use tokio_test::{assert_err, assert_ok};
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{header, method, path},
};

// ============================================================================
// Helper Functions
// ============================================================================

fn state_for(server: &MockServer, store: ClientStore) -> ServerState {
    let client =
        GoDriveClient::new(ClientConfig::new(server.uri()), store).expect("client creation failed");
    ServerState::new(client)
}

fn user_json(name: &str) -> serde_json::Value {
    json!({"id": "u-1", "email": "ana@example.com", "name": name, "role": "student"})
}

fn profile_json(name: &str) -> serde_json::Value {
    json!({"id": "s-1", "userId": "u-1", "name": name, "email": "ana@example.com"})
}

fn logged_in_store() -> ClientStore {
    let store = ClientStore::new();
    store.set_session(Session {
        token: "t-123".to_string(),
        user: User {
            id: "u-1".to_string(),
            email: "ana@example.com".to_string(),
            name: "Ana".to_string(),
            role: Role::Student,
            avatar_url: None,
        },
    });
    store
}

async fn mount_login(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"token": "t-123", "user": user_json("Ana Souza")})),
        )
        .expect(1)
        .mount(server)
        .await;
}

// ============================================================================
// Session flow
// ============================================================================

#[tokio::test]
async fn test_login_seeds_session_and_me() {
    let mock_server = MockServer::start().await;
    mount_login(&mock_server).await;

    Mock::given(method("GET"))
        .and(path("/auth/me"))
        .respond_with(ResponseTemplate::new(200).set_body_json(user_json("Ana Souza")))
        .expect(0)
        .mount(&mock_server)
        .await;

    let state = state_for(&mock_server, ClientStore::new());
    let session = assert_ok!(
        state
            .login(&Login {
                email: "ana@example.com".to_string(),
                password: "secret".to_string(),
            })
            .await
    );

    assert_eq!(state.store().token(), Some("t-123".to_string()));

    let me = state.me().await;
    assert!(me.is_success());
    assert_eq!(me.data.map(|u| u.id), Some(session.user.id));
}

#[tokio::test]
async fn test_me_refetch_uses_stored_token() {
    let mock_server = MockServer::start().await;
    mount_login(&mock_server).await;

    Mock::given(method("GET"))
        .and(path("/auth/me"))
        .and(header("authorization", "Bearer t-123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(user_json("Ana Paula Souza")))
        .expect(1)
        .mount(&mock_server)
        .await;

    let state = state_for(&mock_server, ClientStore::new());
    state
        .login(&Login {
            email: "ana@example.com".to_string(),
            password: "secret".to_string(),
        })
        .await
        .expect("login failed");

    state.invalidate(&godrive_core::core::query::keys::me());
    let me = state.me().await;

    assert_eq!(me.data.as_ref().map(|u| u.id.as_str()), Some("u-1"));
    // the refreshed user replaces the one stored at login
    assert_eq!(
        state.store().current_user().map(|u| u.name),
        Some("Ana Paula Souza".to_string())
    );
}

#[tokio::test]
async fn test_failed_login_leaves_state_untouched() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"message": "Invalid credentials"})))
        .mount(&mock_server)
        .await;

    let state = state_for(&mock_server, ClientStore::new());
    let result = state
        .login(&Login {
            email: "ana@example.com".to_string(),
            password: "wrong".to_string(),
        })
        .await;

    assert!(matches!(result, Err(ApiError::Validation { status: 401, .. })));
    assert!(!state.store().is_authenticated());
}

#[tokio::test]
async fn test_logout_clears_session_even_when_server_fails() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/auth/logout"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&mock_server)
        .await;

    let state = state_for(&mock_server, logged_in_store());
    let error = assert_err!(state.logout().await);

    assert!(matches!(error, ApiError::Http { status: 500, .. }));
    assert!(!state.store().is_authenticated());
    assert!(state.store().token().is_none());
}

// ============================================================================
// Caching
// ============================================================================

#[tokio::test]
async fn test_reads_within_stale_window_hit_network_once() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/students/me"))
        .respond_with(ResponseTemplate::new(200).set_body_json(profile_json("Ana")))
        .expect(1)
        .mount(&mock_server)
        .await;

    let state = state_for(&mock_server, logged_in_store());
    let first = state.student_profile().await;
    let second = state.student_profile().await;

    assert!(first.is_success());
    assert_eq!(first.data, second.data);
}

#[tokio::test]
async fn test_concurrent_reads_share_one_request() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/instructors/i-1"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"id": "i-1", "name": "Carlos Lima"}))
                .set_delay(Duration::from_millis(100)),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let state = state_for(&mock_server, ClientStore::new());
    let reads = (0..5).map(|_| state.instructor_profile("i-1"));
    let results = join_all(reads).await;

    for result in &results {
        assert_eq!(result.data.as_ref().map(|p| p.name.as_str()), Some("Carlos Lima"));
    }
}

#[tokio::test]
async fn test_concurrent_failures_share_one_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/instructors/i-9/reviews"))
        .respond_with(
            ResponseTemplate::new(500)
                .set_body_string("boom")
                .set_delay(Duration::from_millis(50)),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let state = state_for(&mock_server, ClientStore::new());
    let results = join_all((0..3).map(|_| state.instructor_reviews("i-9"))).await;

    for result in &results {
        assert_eq!(result.status, FetchStatus::Error);
        assert_eq!(result.error, results[0].error);
    }
}

#[tokio::test]
async fn test_padded_instructor_id_shares_cache_entry() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/instructors/i-1"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"id": "i-1", "name": "Carlos Lima"})),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let state = state_for(&mock_server, ClientStore::new());
    let padded = state.instructor_profile(" i-1 ").await;
    let plain = state.instructor_profile("i-1").await;

    assert!(padded.is_success());
    assert_eq!(padded.data, plain.data);
    let profiles = state
        .stats()
        .into_iter()
        .find(|(name, _)| *name == "instructor_profile")
        .map(|(_, stats)| stats)
        .expect("instructor cache stats");
    assert_eq!(profiles.total_entries, 1);
}

#[tokio::test]
async fn test_me_superseded_by_invalidation_keeps_newer_session_user() {
    let mock_server = MockServer::start().await;

    // the first request resolves late with the pre-update name
    Mock::given(method("GET"))
        .and(path("/auth/me"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(user_json("Ana Old"))
                .set_delay(Duration::from_millis(300)),
        )
        .up_to_n_times(1)
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/auth/me"))
        .respond_with(ResponseTemplate::new(200).set_body_json(user_json("Ana New")))
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/students/me"))
        .respond_with(ResponseTemplate::new(200).set_body_json(profile_json("Ana New")))
        .expect(1)
        .mount(&mock_server)
        .await;

    let state = state_for(&mock_server, logged_in_store());

    let (slow, fresh) = tokio::join!(state.me(), async {
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_ok!(
            state
                .update_student_profile(&UpdateStudentProfile {
                    name: Some("Ana New".to_string()),
                    ..Default::default()
                })
                .await
        );
        state.me().await
    });

    assert_eq!(fresh.data.map(|u| u.name), Some("Ana New".to_string()));
    assert!(!fresh.superseded);

    assert_eq!(slow.data.map(|u| u.name), Some("Ana Old".to_string()));
    assert!(slow.superseded);

    // session and cache agree on the newer user
    assert_eq!(
        state.store().current_user().map(|u| u.name),
        Some("Ana New".to_string())
    );
    // still fresh, so this is served from the cache without a third request
    let cached = state.me().await;
    assert_eq!(cached.data.map(|u| u.name), Some("Ana New".to_string()));
}

#[tokio::test]
async fn test_profile_update_invalidates_profile_read() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/students/me"))
        .respond_with(ResponseTemplate::new(200).set_body_json(profile_json("Ana")))
        .up_to_n_times(1)
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/students/me"))
        .respond_with(ResponseTemplate::new(200).set_body_json(profile_json("Ana Paula")))
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/students/me"))
        .respond_with(ResponseTemplate::new(200).set_body_json(profile_json("Ana Paula")))
        .expect(1)
        .mount(&mock_server)
        .await;

    let state = state_for(&mock_server, logged_in_store());
    let before = state.student_profile().await;
    assert_eq!(before.data.map(|p| p.name), Some("Ana".to_string()));

    state
        .update_student_profile(&UpdateStudentProfile {
            name: Some("Ana Paula".to_string()),
            ..Default::default()
        })
        .await
        .expect("update failed");

    let after = state.student_profile().await;
    assert_eq!(after.data.map(|p| p.name), Some("Ana Paula".to_string()));
}

#[tokio::test]
async fn test_failed_refetch_keeps_previous_profile() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/students/me"))
        .respond_with(ResponseTemplate::new(200).set_body_json(profile_json("Ana")))
        .up_to_n_times(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/students/me"))
        .respond_with(ResponseTemplate::new(502))
        .mount(&mock_server)
        .await;

    let state = state_for(&mock_server, logged_in_store());
    state.student_profile().await;
    state.invalidate(&godrive_core::core::query::keys::student_profile());

    let after = state.student_profile().await;
    assert_eq!(after.status, FetchStatus::Error);
    assert_eq!(after.data.map(|p| p.name), Some("Ana".to_string()));
    assert!(matches!(
        after.error.map(|e| e.source),
        Some(ApiError::Http { status: 502, .. })
    ));
}

#[tokio::test]
async fn test_location_update_refreshes_searches() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/instructors"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"instructors": [], "total": 0})))
        .expect(2)
        .mount(&mock_server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/students/me/location"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"latitude": -22.9, "longitude": -47.06})),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let state = state_for(&mock_server, logged_in_store());
    let params = SearchInstructors::default();
    state.search_instructors(&params).await;
    state.search_instructors(&params).await;

    let saved = assert_ok!(
        state
            .update_location(&UpdateLocation {
                location: Location::new(-22.9, -47.06),
                address: Some("Campinas".to_string()),
            })
            .await
    );
    assert_eq!(saved, Location::new(-22.9, -47.06));
    assert_eq!(state.store().location(), Some(Location::new(-22.9, -47.06)));

    let refreshed = state.search_instructors(&params).await;
    assert!(refreshed.is_success());
}
