//! RoomScout - rental listing search for students
//!
//! This library provides the search pipeline behind the RoomScout listing
//! screen: attribute filters, radius filtering with distance annotation,
//! stable sorting, and reconciliation of listing markers on a map view.

pub mod config;
pub mod core;
pub mod map;
pub mod models;
pub mod services;

// Re-export commonly used types
pub use crate::core::{search, SearchEngine, SearchResult, distance::{haversine_distance, calculate_bounding_box}};
pub use map::{MapSurface, MapSyncController};
pub use models::{FilterInput, FilterSpec, GeoPoint, Listing, SearchResponse, SortKey};
pub use services::SearchService;
