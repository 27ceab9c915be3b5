use crate::core::{
    filters::{apply_distance_filter, matches_filters},
    sorting::sort_in_place,
};
use crate::models::{FilterSpec, GeoPoint, Listing, SortKey};

/// Result of one search pass
#[derive(Debug, Clone)]
pub struct SearchResult {
    pub listings: Vec<Listing>,
    pub total_candidates: usize,
    /// Reference point the listings were annotated against, if any
    pub reference_point: Option<GeoPoint>,
}

/// Search orchestrator - implements the filter/annotate/sort pipeline
///
/// # Pipeline Stages
/// 1. Clone candidates and clear stale distance annotations
/// 2. Attribute filters (price, rooms, amenities, gender, college, text)
/// 3. Distance filter + annotation, on the already reduced set
/// 4. Stable sort
///
/// The input slice is never modified, so repeated calls with the same
/// arguments return the same listings in the same order.
#[derive(Debug, Clone, Copy, Default)]
pub struct SearchEngine {
    limit: Option<usize>,
}

impl SearchEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cap the number of listings returned after sorting
    pub fn with_limit(limit: usize) -> Self {
        Self { limit: Some(limit) }
    }

    pub fn run(&self, candidates: &[Listing], spec: &FilterSpec, sort: SortKey) -> SearchResult {
        let total_candidates = candidates.len();

        // Stages 1 & 2
        let mut listings: Vec<Listing> = candidates
            .iter()
            .filter(|listing| matches_filters(listing, spec))
            .map(|listing| Listing {
                distance: None,
                ..listing.clone()
            })
            .collect();

        // Stage 3
        if let Some(constraint) = &spec.distance {
            listings = apply_distance_filter(listings, constraint);
        } else if sort == SortKey::Distance {
            tracing::debug!("Distance sort requested without a reference point; keeping input order");
        }

        // Stage 4
        sort_in_place(&mut listings, sort);

        if let Some(limit) = self.limit {
            listings.truncate(limit);
        }

        tracing::debug!(
            "Search kept {} of {} listings (sort: {})",
            listings.len(),
            total_candidates,
            sort
        );

        SearchResult {
            listings,
            total_candidates,
            reference_point: spec.reference_point(),
        }
    }
}

/// Filter, annotate and sort `listings` in one pass
pub fn search(listings: &[Listing], spec: &FilterSpec, sort: SortKey) -> Vec<Listing> {
    SearchEngine::new().run(listings, spec, sort).listings
}
