//! Query identities and the state a cache entry exposes to readers.

use crate::api::search::SearchInstructors;
use crate::error::CacheFetchError;
use std::fmt;
use std::time::Instant;

/// Stable identity of a server-state query, e.g. `["instructor", "profile", "42"]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QueryKey(Vec<String>);

impl QueryKey {
    pub fn new<I, S>(parts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(parts.into_iter().map(Into::into).collect())
    }

    pub fn parts(&self) -> &[String] {
        &self.0
    }

    /// True when `prefix` names this key or one of its ancestors.
    pub fn starts_with(&self, prefix: &QueryKey) -> bool {
        self.0.starts_with(&prefix.0)
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join("/"))
    }
}

impl<S: Into<String>, const N: usize> From<[S; N]> for QueryKey {
    fn from(parts: [S; N]) -> Self {
        Self::new(parts)
    }
}

/// Canonical keys used by [`ServerState`](crate::core::server_state::ServerState).
pub mod keys {
    use super::*;

    pub fn me() -> QueryKey {
        QueryKey::from(["auth", "me"])
    }

    pub fn student_profile() -> QueryKey {
        QueryKey::from(["student", "profile"])
    }

    pub fn instructors() -> QueryKey {
        QueryKey::from(["instructor"])
    }

    pub fn instructor_profile(id: &str) -> QueryKey {
        QueryKey::from(["instructor", "profile", id])
    }

    pub fn instructor_reviews(id: &str) -> QueryKey {
        QueryKey::from(["instructor", "reviews", id])
    }

    /// Parent of every search key.
    pub fn instructor_searches() -> QueryKey {
        QueryKey::from(["instructor", "search"])
    }

    pub fn instructor_search(params: &SearchInstructors) -> QueryKey {
        QueryKey::new(["instructor".to_string(), "search".to_string(), params.cache_fragment()])
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FetchStatus {
    /// Nothing requested yet
    #[default]
    Idle,
    /// First fetch in flight, no data yet
    Loading,
    Success,
    /// Last fetch failed; `data` still holds the previous value, if any
    Error,
}

/// What a reader sees for one key.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryState<V> {
    pub data: Option<V>,
    pub status: FetchStatus,
    pub error: Option<CacheFetchError>,
    /// When `data` was last written by a successful fetch or direct write
    pub updated_at: Option<Instant>,
    /// A fetch for this key is in flight (initial load or background refresh)
    pub is_fetching: bool,
    /// This result came from a fetch overtaken by an invalidation or newer
    /// write, so it was handed back without being stored. The cache holds
    /// something newer.
    pub superseded: bool,
}

impl<V> Default for QueryState<V> {
    fn default() -> Self {
        Self {
            data: None,
            status: FetchStatus::Idle,
            error: None,
            updated_at: None,
            is_fetching: false,
            superseded: false,
        }
    }
}

impl<V> QueryState<V> {
    pub fn is_loading(&self) -> bool {
        self.status == FetchStatus::Loading
    }

    pub fn is_success(&self) -> bool {
        self.status == FetchStatus::Success
    }

    pub fn is_error(&self) -> bool {
        self.status == FetchStatus::Error
    }

    /// Successful result that is also what the cache now holds.
    pub fn committed_data(&self) -> Option<&V> {
        match (&self.data, &self.error) {
            (Some(data), None) if !self.superseded => Some(data),
            _ => None,
        }
    }

    pub fn data(&self) -> Option<&V> {
        self.data.as_ref()
    }

    /// Turn the state into a `Result`; a stored error wins over stale data.
    ///
    /// Callers that cannot render stale data alongside an error use this to
    /// bail out with `?`.
    pub fn into_result(self) -> Result<V, CacheFetchError> {
        match (self.data, self.error) {
            (Some(data), None) => Ok(data),
            (_, Some(error)) => Err(error),
            (None, None) => Err(CacheFetchError::new(
                "idle",
                crate::error::ApiError::Decode {
                    endpoint: "cache".to_string(),
                    message: "query was never fetched".to_string(),
                },
            )),
        }
    }
}
