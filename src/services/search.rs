use crate::core::SearchEngine;
use crate::models::{FilterSpec, SearchResponse, SortKey};
use crate::services::backend::{BackendError, ListingQuery, ListingSource};

/// Loads candidates from a listing source and runs the search pipeline.
///
/// The source is only asked to narrow the candidate set; every constraint is
/// applied again client side, so a source that ignores the query entirely
/// still yields correct results.
pub struct SearchService<S> {
    source: S,
    engine: SearchEngine,
    page_size: usize,
}

impl<S: ListingSource> SearchService<S> {
    pub fn new(source: S, engine: SearchEngine, page_size: usize) -> Self {
        Self {
            source,
            engine,
            page_size,
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub async fn load_and_search(
        &self,
        spec: &FilterSpec,
        sort: SortKey,
    ) -> Result<SearchResponse, BackendError> {
        let query = ListingQuery::from_spec(spec, sort, self.page_size);
        let candidates = self.source.fetch_listings(&query).await?;

        let result = self.engine.run(&candidates, spec, sort);

        tracing::info!(
            "Returning {} listings (from {} candidates)",
            result.listings.len(),
            result.total_candidates
        );

        Ok(SearchResponse {
            listings: result.listings,
            total_candidates: result.total_candidates,
            sort,
            reference_point: result.reference_point,
        })
    }
}
