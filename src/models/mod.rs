// Model exports
pub mod domain;
pub mod filters;
pub mod requests;
pub mod responses;

pub use domain::{BoundingBox, GenderPreference, GeoPoint, Listing, MediaItem, MediaKind, PropertyType};
pub use filters::{DistanceConstraint, FilterSpec, Range, SortKey};
pub use requests::{FilterInput, RadiusLimits};
pub use responses::SearchResponse;
