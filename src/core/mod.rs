// Core algorithm exports
pub mod distance;
pub mod filters;
pub mod search;
pub mod sorting;

pub use distance::{haversine_distance, distance_between, round_km, calculate_bounding_box};
pub use filters::{apply_filters, apply_distance_filter, matches_filters, matches_gender_preference, matches_colleges};
pub use search::{search, SearchEngine, SearchResult};
pub use sorting::apply_sort;
