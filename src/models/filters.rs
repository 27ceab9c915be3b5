use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::models::domain::{GenderPreference, GeoPoint, PropertyType};

/// Inclusive range with optional bounds; an unset bound is not checked
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Range<T> {
    pub min: Option<T>,
    pub max: Option<T>,
}

impl<T: PartialOrd + Copy> Range<T> {
    pub fn new(min: Option<T>, max: Option<T>) -> Self {
        Self { min, max }
    }

    pub fn at_least(min: T) -> Self {
        Self { min: Some(min), max: None }
    }

    pub fn at_most(max: T) -> Self {
        Self { min: None, max: Some(max) }
    }

    #[inline]
    pub fn contains(&self, value: T) -> bool {
        self.min.map_or(true, |min| value >= min) && self.max.map_or(true, |max| value <= max)
    }

    pub fn is_unbounded(&self) -> bool {
        self.min.is_none() && self.max.is_none()
    }
}

/// Reference point plus radius for a distance-filtered pass
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DistanceConstraint {
    pub reference: GeoPoint,
    #[serde(rename = "maxDistanceKm")]
    pub max_distance_km: f64,
}

/// The user-chosen constraints for one search pass.
///
/// Every field is optional; an unset field places no constraint on the
/// result. Built once per pass (usually from a [`FilterInput`]) and only read
/// afterwards.
///
/// [`FilterInput`]: crate::models::requests::FilterInput
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterSpec {
    pub price: Range<f64>,
    pub bedrooms: Range<u32>,
    pub bathrooms: Range<u32>,
    pub has_hall: Option<bool>,
    pub has_separate_kitchen: Option<bool>,
    pub property_type: Option<PropertyType>,
    pub gender_preference: Option<GenderPreference>,
    /// Any-of college names, matched as case-insensitive substrings
    pub colleges: Vec<String>,
    pub distance: Option<DistanceConstraint>,
    /// Free-text search over title, address, description and college
    pub keyword: Option<String>,
    /// Listing must be available on or before this date
    pub available_by: Option<NaiveDate>,
    pub max_deposit: Option<f64>,
    pub min_square_feet: Option<u32>,
}

impl FilterSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_price(mut self, min: Option<f64>, max: Option<f64>) -> Self {
        self.price = Range::new(min, max);
        self
    }

    pub fn with_bedrooms(mut self, min: Option<u32>, max: Option<u32>) -> Self {
        self.bedrooms = Range::new(min, max);
        self
    }

    pub fn with_bathrooms(mut self, min: Option<u32>, max: Option<u32>) -> Self {
        self.bathrooms = Range::new(min, max);
        self
    }

    pub fn with_hall(mut self, has_hall: bool) -> Self {
        self.has_hall = Some(has_hall);
        self
    }

    pub fn with_separate_kitchen(mut self, has_kitchen: bool) -> Self {
        self.has_separate_kitchen = Some(has_kitchen);
        self
    }

    pub fn with_property_type(mut self, property_type: PropertyType) -> Self {
        self.property_type = Some(property_type);
        self
    }

    pub fn with_gender_preference(mut self, preference: GenderPreference) -> Self {
        self.gender_preference = Some(preference);
        self
    }

    pub fn with_colleges<I, S>(mut self, colleges: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.colleges = colleges.into_iter().map(Into::into).collect();
        self
    }

    pub fn within_km(mut self, reference: GeoPoint, max_distance_km: f64) -> Self {
        self.distance = Some(DistanceConstraint { reference, max_distance_km });
        self
    }

    pub fn with_keyword(mut self, keyword: impl Into<String>) -> Self {
        self.keyword = Some(keyword.into());
        self
    }

    pub fn available_by(mut self, date: NaiveDate) -> Self {
        self.available_by = Some(date);
        self
    }

    pub fn with_max_deposit(mut self, max_deposit: f64) -> Self {
        self.max_deposit = Some(max_deposit);
        self
    }

    pub fn with_min_square_feet(mut self, min_square_feet: u32) -> Self {
        self.min_square_feet = Some(min_square_feet);
        self
    }

    /// Reference point of the distance constraint, if any
    pub fn reference_point(&self) -> Option<GeoPoint> {
        self.distance.map(|d| d.reference)
    }
}

/// Result ordering
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    #[default]
    PriceAsc,
    PriceDesc,
    BedroomsDesc,
    DateAsc,
    DateDesc,
    /// Nearest first; only meaningful when the pass had a reference point
    Distance,
}

impl SortKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortKey::PriceAsc => "price_asc",
            SortKey::PriceDesc => "price_desc",
            SortKey::BedroomsDesc => "bedrooms_desc",
            SortKey::DateAsc => "date_asc",
            SortKey::DateDesc => "date_desc",
            SortKey::Distance => "distance",
        }
    }
}

impl FromStr for SortKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "price_asc" => Ok(SortKey::PriceAsc),
            "price_desc" => Ok(SortKey::PriceDesc),
            "bedrooms_desc" => Ok(SortKey::BedroomsDesc),
            "date_asc" => Ok(SortKey::DateAsc),
            "date_desc" => Ok(SortKey::DateDesc),
            "distance" | "distance_asc" => Ok(SortKey::Distance),
            other => Err(format!("unknown sort key: {}", other)),
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
