use std::cmp::Ordering;

use crate::models::{Listing, SortKey};

/// Return a new vector ordered by `key`.
///
/// The sort is stable, so ties keep their input order. For
/// [`SortKey::Distance`] listings without a distance annotation sort last.
pub fn apply_sort(listings: &[Listing], key: SortKey) -> Vec<Listing> {
    let mut sorted = listings.to_vec();
    sort_in_place(&mut sorted, key);
    sorted
}

/// Stable in-place variant of [`apply_sort`] for vectors the caller owns
pub fn sort_in_place(listings: &mut [Listing], key: SortKey) {
    listings.sort_by(|a, b| compare(a, b, key));
}

#[inline]
fn compare(a: &Listing, b: &Listing, key: SortKey) -> Ordering {
    match key {
        SortKey::PriceAsc => a.price.total_cmp(&b.price),
        SortKey::PriceDesc => b.price.total_cmp(&a.price),
        SortKey::BedroomsDesc => b.bedrooms.cmp(&a.bedrooms),
        SortKey::DateAsc => a.available_from.cmp(&b.available_from),
        SortKey::DateDesc => b.available_from.cmp(&a.available_from),
        SortKey::Distance => sortable_distance(a).total_cmp(&sortable_distance(b)),
    }
}

#[inline]
fn sortable_distance(listing: &Listing) -> f64 {
    listing.distance.unwrap_or(f64::INFINITY)
}
