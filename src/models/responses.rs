use serde::{Deserialize, Serialize};
use crate::models::domain::{GeoPoint, Listing};
use crate::models::filters::SortKey;

/// Output of one search pass as handed to the list/map views
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResponse {
    pub listings: Vec<Listing>,
    #[serde(rename = "totalCandidates")]
    pub total_candidates: usize,
    pub sort: SortKey,
    /// Reference point of the distance filter, when one was applied
    #[serde(rename = "referencePoint", skip_serializing_if = "Option::is_none")]
    pub reference_point: Option<GeoPoint>,
}
