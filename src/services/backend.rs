use crate::core::distance::calculate_bounding_box;
use crate::models::{FilterSpec, Listing, SortKey};
use crate::services::cache::{CacheKey, ListingCache};
use reqwest::Client;
use serde_json::Value;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Padding applied to the remote lat/lon box so it covers the full disc
const REMOTE_BOX_PADDING: f64 = 1.1;

/// Errors that can occur when interacting with the hosted backend
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("API returned error: {0}")]
    ApiError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unauthorized: invalid API key or token")]
    Unauthorized,

    #[error("Invalid response format: {0}")]
    InvalidResponse(String),
}

/// Remote query built from the part of a [`FilterSpec`] the backend can
/// evaluate natively.
///
/// The result is only a narrowing hint; the search pipeline re-applies every
/// constraint client side. A remote predicate must never be stricter than the
/// client rule it mirrors, so attributes with a client-side default for
/// missing values (bathrooms, the amenity flags when `false`) stay local.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListingQuery {
    queries: Vec<String>,
    page_size: usize,
}

impl ListingQuery {
    pub fn from_spec(spec: &FilterSpec, sort: SortKey, page_size: usize) -> Self {
        let mut queries = Vec::new();

        push_range(&mut queries, "price", spec.price.min, spec.price.max);
        push_range(
            &mut queries,
            "bedrooms",
            spec.bedrooms.min.map(f64::from),
            spec.bedrooms.max.map(f64::from),
        );

        if let Some(property_type) = spec.property_type {
            queries.push(format!("equal(\"propertyType\", [\"{}\"])", property_type));
        }
        // a missing flag counts as false locally, so only `true` is remote-safe
        if spec.has_hall == Some(true) {
            queries.push("equal(\"hasHall\", [true])".to_string());
        }
        if spec.has_separate_kitchen == Some(true) {
            queries.push("equal(\"hasSeparateKitchen\", [true])".to_string());
        }

        // Geospatial bounding box pre-filter
        if let Some(distance) = &spec.distance {
            let bbox = calculate_bounding_box(
                distance.reference.lat,
                distance.reference.lng,
                distance.max_distance_km * REMOTE_BOX_PADDING,
            );
            queries.push(format!("greaterThanEqual(\"latitude\", {})", bbox.min_lat));
            queries.push(format!("lessThanEqual(\"latitude\", {})", bbox.max_lat));
            if bbox.min_lon >= -180.0 && bbox.max_lon <= 180.0 {
                queries.push(format!("greaterThanEqual(\"longitude\", {})", bbox.min_lon));
                queries.push(format!("lessThanEqual(\"longitude\", {})", bbox.max_lon));
            } else {
                tracing::debug!("Longitude range wraps the antimeridian; sending latitude bounds only");
            }
        }

        match sort {
            SortKey::PriceAsc => queries.push("orderAsc(\"price\")".to_string()),
            SortKey::PriceDesc => queries.push("orderDesc(\"price\")".to_string()),
            SortKey::BedroomsDesc => queries.push("orderDesc(\"bedrooms\")".to_string()),
            SortKey::DateAsc => queries.push("orderAsc(\"availableFrom\")".to_string()),
            SortKey::DateDesc => queries.push("orderDesc(\"availableFrom\")".to_string()),
            // distance ordering only exists client side
            SortKey::Distance => {}
        }

        Self {
            queries,
            page_size: page_size.max(1),
        }
    }

    /// Filter and order queries, without paging
    pub fn queries(&self) -> &[String] {
        &self.queries
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Queries for the page starting at `offset`
    pub fn page(&self, offset: usize) -> Vec<String> {
        let mut queries = self.queries.clone();
        queries.push(format!("limit({})", self.page_size));
        queries.push(format!("offset({})", offset));
        queries
    }

    /// Query string in the backend's `queries[]=` form for one page
    pub fn to_query_string(&self, offset: usize) -> String {
        self.page(offset)
            .iter()
            .map(|q| format!("queries[]={}", urlencoding::encode(q)))
            .collect::<Vec<_>>()
            .join("&")
    }
}

fn push_range(queries: &mut Vec<String>, field: &str, min: Option<f64>, max: Option<f64>) {
    if let Some(min) = min {
        queries.push(format!("greaterThanEqual(\"{}\", {})", field, min));
    }
    if let Some(max) = max {
        queries.push(format!("lessThanEqual(\"{}\", {})", field, max));
    }
}

/// Anything that can hand back raw listings for a remote query
pub trait ListingSource {
    fn fetch_listings(
        &self,
        query: &ListingQuery,
    ) -> impl Future<Output = Result<Vec<Listing>, BackendError>> + Send;
}

/// Hosted backend API client
///
/// Handles the listing reads the search screen needs:
/// - Querying listings with remotely-expressible filters
/// - Fetching a single listing by id
pub struct ListingsClient {
    base_url: String,
    api_key: String,
    project_id: String,
    database_id: String,
    client: Client,
    collection: String,
    cache: Option<ListingCache>,
}

impl ListingsClient {
    /// Create a new backend client
    pub fn new(
        base_url: String,
        api_key: String,
        project_id: String,
        database_id: String,
        collection: String,
        timeout: Duration,
    ) -> Result<Self, BackendError> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            base_url,
            api_key,
            project_id,
            database_id,
            client,
            collection,
            cache: None,
        })
    }

    /// Serve repeated queries from `cache` until their entries expire
    pub fn with_cache(mut self, cache: ListingCache) -> Self {
        self.cache = Some(cache);
        self
    }

    fn documents_url(&self) -> String {
        format!(
            "{}/databases/{}/collections/{}/documents",
            self.base_url.trim_end_matches('/'),
            self.database_id,
            self.collection
        )
    }

    async fn get_json(&self, url: &str) -> Result<Value, BackendError> {
        let response = self
            .client
            .get(url)
            .header("X-Appwrite-Key", &self.api_key)
            .header("X-Appwrite-Project", &self.project_id)
            .send()
            .await?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            return Err(BackendError::Unauthorized);
        }
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(BackendError::NotFound(url.to_string()));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_else(|_| "Unable to read body".to_string());
            tracing::error!("Backend request failed: {} - {}", status, body);
            return Err(BackendError::ApiError(format!("Request failed: {}", status)));
        }

        Ok(response.json().await?)
    }

    /// Query every page of listings matching `query`.
    ///
    /// Pages are requested until the reported `total` is reached, or until a
    /// short page arrives when the backend reports no total. Documents that
    /// fail to parse are skipped.
    pub async fn query_listings(&self, query: &ListingQuery) -> Result<Vec<Listing>, BackendError> {
        let cache_key = CacheKey::listings(query);
        if let Some(cache) = &self.cache {
            if let Some(hit) = cache.get(&cache_key).await {
                tracing::debug!("Serving {} listings from cache", hit.len());
                return Ok(hit.as_ref().clone());
            }
        }

        let mut listings = Vec::new();
        let mut offset = 0;
        loop {
            let url = format!("{}?{}", self.documents_url(), query.to_query_string(offset));
            tracing::debug!("Querying listings: {}", url);

            let json = self.get_json(&url).await?;

            let total = json.get("total").and_then(|t| t.as_u64());

            let documents = json
                .get("documents")
                .and_then(|d| d.as_array())
                .ok_or_else(|| BackendError::InvalidResponse("Missing documents array".into()))?;

            listings.extend(documents.iter().filter_map(parse_document));
            offset += documents.len();

            let exhausted = match total {
                Some(total) => offset as u64 >= total,
                None => documents.len() < query.page_size(),
            };
            if documents.is_empty() || exhausted {
                break;
            }
        }

        tracing::debug!("Queried {} listings over {} documents", listings.len(), offset);

        if let Some(cache) = &self.cache {
            cache.insert(cache_key, Arc::new(listings.clone())).await;
        }

        Ok(listings)
    }

    /// Get a single listing by id
    pub async fn get_listing(&self, listing_id: &str) -> Result<Listing, BackendError> {
        let url = format!("{}/{}", self.documents_url(), urlencoding::encode(listing_id));

        tracing::debug!("Fetching listing: {}", listing_id);

        let json = match self.get_json(&url).await {
            Err(BackendError::NotFound(_)) => {
                return Err(BackendError::NotFound(format!("Listing {}", listing_id)));
            }
            other => other?,
        };

        let data = json.get("data").unwrap_or(&json);

        serde_json::from_value(data.clone())
            .map_err(|e| BackendError::InvalidResponse(format!("Failed to parse listing: {}", e)))
    }
}

fn parse_document(doc: &Value) -> Option<Listing> {
    let data = doc.get("data").unwrap_or(doc);
    match serde_json::from_value::<Listing>(data.clone()) {
        Ok(listing) => Some(listing),
        Err(e) => {
            let id = data.get("$id").or_else(|| data.get("id")).and_then(|v| v.as_str());
            tracing::warn!("Skipping malformed listing {:?}: {}", id, e);
            None
        }
    }
}

impl ListingSource for ListingsClient {
    fn fetch_listings(
        &self,
        query: &ListingQuery,
    ) -> impl Future<Output = Result<Vec<Listing>, BackendError>> + Send {
        self.query_listings(query)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{GeoPoint, PropertyType};

    #[test]
    fn test_client_creation() {
        let client = ListingsClient::new(
            "https://backend.test/v1/".to_string(),
            "test_key".to_string(),
            "test_project".to_string(),
            "test_db".to_string(),
            "listings".to_string(),
            Duration::from_secs(5),
        )
        .unwrap();

        assert_eq!(
            client.documents_url(),
            "https://backend.test/v1/databases/test_db/collections/listings/documents"
        );
        assert_eq!(client.api_key, "test_key");
    }

    #[test]
    fn test_query_translation() {
        let spec = FilterSpec::new()
            .with_price(Some(1500.0), None)
            .with_bedrooms(None, Some(3))
            .with_property_type(PropertyType::Pg)
            .with_hall(true)
            .with_colleges(["Christ University"]);

        let query = ListingQuery::from_spec(&spec, SortKey::PriceDesc, 50);

        assert_eq!(
            query.queries(),
            &[
                "greaterThanEqual(\"price\", 1500)".to_string(),
                "lessThanEqual(\"bedrooms\", 3)".to_string(),
                "equal(\"propertyType\", [\"pg\"])".to_string(),
                "equal(\"hasHall\", [true])".to_string(),
                "orderDesc(\"price\")".to_string(),
            ]
        );
        assert_eq!(query.page_size(), 50);
    }

    #[test]
    fn test_attributes_with_local_defaults_stay_local() {
        let spec = FilterSpec::new()
            .with_hall(false)
            .with_separate_kitchen(false)
            .with_bathrooms(Some(1), Some(1));

        let query = ListingQuery::from_spec(&spec, SortKey::PriceAsc, 10);

        assert_eq!(query.queries(), &["orderAsc(\"price\")".to_string()]);
    }

    #[test]
    fn test_distance_becomes_padded_box() {
        let spec = FilterSpec::new().within_km(GeoPoint::new(12.9716, 77.5946), 10.0);
        let query = ListingQuery::from_spec(&spec, SortKey::Distance, 100);

        let lat_bounds = query.queries().iter().filter(|q| q.contains("\"latitude\"")).count();
        let lng_bounds = query.queries().iter().filter(|q| q.contains("\"longitude\"")).count();
        assert_eq!(lat_bounds, 2);
        assert_eq!(lng_bounds, 2);
        assert!(!query.queries().iter().any(|q| q.starts_with("order")));
    }

    #[test]
    fn test_box_across_antimeridian_sends_latitude_only() {
        let spec = FilterSpec::new().within_km(GeoPoint::new(-17.8, 179.98), 20.0);
        let query = ListingQuery::from_spec(&spec, SortKey::Distance, 100);

        assert!(!query.queries().iter().any(|q| q.contains("\"longitude\"")));
        assert_eq!(
            query.queries().iter().filter(|q| q.contains("\"latitude\"")).count(),
            2
        );
    }

    #[test]
    fn test_query_string_is_paged_and_encoded() {
        let query = ListingQuery::from_spec(&FilterSpec::new(), SortKey::DateDesc, 10);
        assert_eq!(
            query.to_query_string(20),
            "queries[]=orderDesc%28%22availableFrom%22%29&queries[]=limit%2810%29&queries[]=offset%2820%29"
        );
        assert_eq!(query.page(0).last().unwrap(), "offset(0)");
    }
}
