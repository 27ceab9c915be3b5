use crate::core::distance::distance_between;
use crate::models::{DistanceConstraint, FilterSpec, GenderPreference, Listing};

/// Keep the listings that satisfy every non-distance constraint in `spec`.
///
/// Returns clones in input order. The distance constraint is applied
/// separately by [`apply_distance_filter`].
pub fn apply_filters(listings: &[Listing], spec: &FilterSpec) -> Vec<Listing> {
    listings
        .iter()
        .filter(|listing| matches_filters(listing, spec))
        .cloned()
        .collect()
}

/// Check a single listing against the non-distance constraints (logical AND)
#[inline]
pub fn matches_filters(listing: &Listing, spec: &FilterSpec) -> bool {
    if !spec.price.contains(listing.price)
        || !spec.bedrooms.contains(listing.bedrooms)
        || !spec.bathrooms.contains(listing.bathrooms)
    {
        return false;
    }

    // Amenities
    if spec.has_hall.is_some_and(|wanted| listing.hall() != wanted) {
        return false;
    }
    if spec
        .has_separate_kitchen
        .is_some_and(|wanted| listing.separate_kitchen() != wanted)
    {
        return false;
    }

    if spec
        .property_type
        .is_some_and(|wanted| listing.property_type != wanted)
    {
        return false;
    }

    if let Some(requested) = spec.gender_preference {
        if !matches_gender_preference(listing.gender_preference, requested) {
            return false;
        }
    }

    if !matches_colleges(listing, &spec.colleges) {
        return false;
    }

    if let Some(keyword) = &spec.keyword {
        if !matches_keyword(listing, keyword) {
            return false;
        }
    }

    if spec
        .available_by
        .is_some_and(|date| listing.available_from > date)
    {
        return false;
    }

    // Listings without a deposit pass; listings without a size do not
    if let (Some(max), Some(deposit)) = (spec.max_deposit, listing.deposit_amount) {
        if deposit > max {
            return false;
        }
    }
    if let Some(min) = spec.min_square_feet {
        if listing.square_feet.map_or(true, |sqft| sqft < min) {
            return false;
        }
    }

    true
}

/// A searcher asking for "any" sees everything; a specific request also
/// admits listings open to anyone.
#[inline]
pub fn matches_gender_preference(offered: GenderPreference, requested: GenderPreference) -> bool {
    match requested {
        GenderPreference::Any => true,
        specific => offered == specific || offered == GenderPreference::Any,
    }
}

/// Case-insensitive substring match against any of the college names.
/// Blank names are ignored; an empty list places no constraint.
pub fn matches_colleges(listing: &Listing, colleges: &[String]) -> bool {
    let mut names = colleges
        .iter()
        .map(|name| name.trim())
        .filter(|name| !name.is_empty())
        .peekable();

    if names.peek().is_none() {
        return true;
    }

    let Some(nearby) = listing.nearby_college.as_deref() else {
        return false;
    };
    let nearby = nearby.to_lowercase();

    names.any(|name| nearby.contains(&name.to_lowercase()))
}

fn matches_keyword(listing: &Listing, keyword: &str) -> bool {
    let needle = keyword.trim().to_lowercase();
    if needle.is_empty() {
        return true;
    }

    [
        Some(listing.title.as_str()),
        Some(listing.address.as_str()),
        Some(listing.description.as_str()),
        listing.nearby_college.as_deref(),
    ]
    .into_iter()
    .flatten()
    .any(|field| field.to_lowercase().contains(&needle))
}

/// Keep located listings within `constraint.max_distance_km` of the
/// reference point and annotate each survivor with its distance.
///
/// This is the only place a listing's `distance` is written.
pub fn apply_distance_filter(listings: Vec<Listing>, constraint: &DistanceConstraint) -> Vec<Listing> {
    listings
        .into_iter()
        .filter_map(|mut listing| {
            let point = listing.coordinates()?;
            let distance_km = distance_between(constraint.reference, point);

            if distance_km <= constraint.max_distance_km {
                listing.distance = Some(distance_km);
                Some(listing)
            } else {
                None
            }
        })
        .collect()
}
