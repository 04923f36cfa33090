//! Instructor search: `GET /instructors`.

use crate::api::client::GoDriveClient;
use crate::api::endpoint::Endpoint;
use crate::api::models::{LicenseCategory, Location, SearchResponse};
use crate::error::ApiError;
use reqwest::Method;

pub const DEFAULT_PAGE_SIZE: u32 = 20;
pub const MAX_PAGE_SIZE: u32 = 100;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchInstructors {
    pub query: Option<String>,
    pub category: Option<LicenseCategory>,
    pub near: Option<Location>,
    pub radius_km: Option<f64>,
    pub max_price: Option<f64>,
    pub min_rating: Option<f64>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl SearchInstructors {
    /// Query parameters in a fixed order; also the identity of a search in the cache.
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();

        if let Some(query) = self.query.as_deref().map(str::trim).filter(|q| !q.is_empty()) {
            params.push(("q", query.to_string()));
        }
        if let Some(category) = self.category {
            params.push(("category", category.to_string()));
        }
        if let Some(location) = self.near {
            params.push(("lat", location.latitude.to_string()));
            params.push(("lng", location.longitude.to_string()));
        }
        if let Some(radius) = self.radius_km {
            params.push(("radiusKm", radius.to_string()));
        }
        if let Some(max_price) = self.max_price {
            params.push(("maxPrice", max_price.to_string()));
        }
        if let Some(min_rating) = self.min_rating {
            params.push(("minRating", min_rating.to_string()));
        }
        params.push(("page", self.page.unwrap_or(1).to_string()));
        params.push((
            "limit",
            self.limit
                .unwrap_or(DEFAULT_PAGE_SIZE)
                .min(MAX_PAGE_SIZE)
                .to_string(),
        ));

        params
    }

    pub fn cache_fragment(&self) -> String {
        self.query_pairs()
            .iter()
            .map(|(name, value)| format!("{}={}", name, value))
            .collect::<Vec<_>>()
            .join("&")
    }
}

impl Endpoint for SearchInstructors {
    type Response = SearchResponse;
    const NAME: &'static str = "instructor.search";
    const METHOD: Method = Method::GET;

    fn path(&self) -> String {
        "/instructors".to_string()
    }

    fn query(&self) -> Vec<(&'static str, String)> {
        self.query_pairs()
    }

    fn validate(&self) -> Result<(), String> {
        if self.near.is_some_and(|location| !location.is_valid()) {
            return Err("Search location is out of range".to_string());
        }
        if self.radius_km.is_some_and(|radius| radius <= 0.0) {
            return Err("Search radius must be positive".to_string());
        }
        if self.min_rating.is_some_and(|rating| !(0.0..=5.0).contains(&rating)) {
            return Err("Minimum rating must be between 0 and 5".to_string());
        }
        if self.page == Some(0) {
            return Err("Pages start at 1".to_string());
        }
        Ok(())
    }
}

impl GoDriveClient {
    pub async fn search_instructors(
        &self,
        request: &SearchInstructors,
    ) -> Result<SearchResponse, ApiError> {
        self.execute(request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_query_pairs() {
        let search = SearchInstructors::default();
        assert_eq!(
            search.query_pairs(),
            vec![("page", "1".to_string()), ("limit", "20".to_string())]
        );
    }

    #[test]
    fn test_query_pairs_with_filters() {
        let search = SearchInstructors {
            query: Some("  carlos ".to_string()),
            category: Some(LicenseCategory::B),
            near: Some(Location::new(-23.5, -46.6)),
            limit: Some(500),
            ..Default::default()
        };
        assert_eq!(
            search.cache_fragment(),
            "q=carlos&category=B&lat=-23.5&lng=-46.6&page=1&limit=100"
        );
    }

    #[test]
    fn test_blank_query_is_dropped() {
        let search = SearchInstructors {
            query: Some("   ".to_string()),
            ..Default::default()
        };
        assert_eq!(search.cache_fragment(), "page=1&limit=20");
    }

    #[test]
    fn test_validation() {
        let search = SearchInstructors {
            min_rating: Some(7.0),
            ..Default::default()
        };
        assert!(search.validate().is_err());

        let search = SearchInstructors {
            page: Some(0),
            ..Default::default()
        };
        assert!(search.validate().is_err());

        assert!(SearchInstructors::default().validate().is_ok());
    }
}
