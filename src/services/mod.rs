// Service exports
pub mod backend;
pub mod cache;
pub mod geolocation;
pub mod search;

pub use backend::{BackendError, ListingQuery, ListingSource, ListingsClient};
pub use cache::{CacheKey, ListingCache};
pub use geolocation::{locate_user, FixedLocation, GeolocationProvider, LocationError};
pub use search::SearchService;
