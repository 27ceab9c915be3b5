use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use validator::Validate;

use crate::models::domain::{GenderPreference, GeoPoint, PropertyType};
use crate::models::filters::{FilterSpec, Range, SortKey};

/// Raw filter state as produced by the search form.
///
/// Every field is lenient: numbers may arrive as JSON numbers or numeric
/// strings, booleans as bools or `"true"`/`"false"`, and blank or unparsable
/// values deserialize as `None`. Values that parse but fail validation are
/// dropped by [`FilterInput::into_spec`] instead of failing the whole search.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct FilterInput {
    #[validate(range(min = 0.0))]
    #[serde(rename = "minPrice", default, deserialize_with = "lenient::number")]
    pub min_price: Option<f64>,
    #[validate(range(min = 0.0))]
    #[serde(rename = "maxPrice", default, deserialize_with = "lenient::number")]
    pub max_price: Option<f64>,
    #[serde(rename = "minBedrooms", default, deserialize_with = "lenient::count")]
    pub min_bedrooms: Option<u32>,
    #[serde(rename = "maxBedrooms", default, deserialize_with = "lenient::count")]
    pub max_bedrooms: Option<u32>,
    #[serde(rename = "minBathrooms", default, deserialize_with = "lenient::count")]
    pub min_bathrooms: Option<u32>,
    #[serde(rename = "maxBathrooms", default, deserialize_with = "lenient::count")]
    pub max_bathrooms: Option<u32>,
    #[serde(rename = "hasHall", default, deserialize_with = "lenient::flag")]
    pub has_hall: Option<bool>,
    #[serde(rename = "hasSeparateKitchen", default, deserialize_with = "lenient::flag")]
    pub has_separate_kitchen: Option<bool>,
    #[serde(rename = "propertyType", default, deserialize_with = "lenient::text")]
    pub property_type: Option<String>,
    #[serde(rename = "genderPreference", default, deserialize_with = "lenient::text")]
    pub gender_preference: Option<String>,
    #[serde(default, deserialize_with = "lenient::text_list")]
    pub colleges: Vec<String>,
    #[validate(range(min = -90.0, max = 90.0))]
    #[serde(default, deserialize_with = "lenient::number")]
    pub latitude: Option<f64>,
    #[validate(range(min = -180.0, max = 180.0))]
    #[serde(default, deserialize_with = "lenient::number")]
    pub longitude: Option<f64>,
    #[validate(range(exclusive_min = 0.0))]
    #[serde(rename = "maxDistanceKm", default, deserialize_with = "lenient::number")]
    pub max_distance_km: Option<f64>,
    /// Use the device location as the reference point
    #[serde(rename = "nearMe", default, deserialize_with = "lenient::flag")]
    pub near_me: Option<bool>,
    #[validate(length(max = 100))]
    #[serde(default, deserialize_with = "lenient::text")]
    pub keyword: Option<String>,
    #[serde(rename = "availableBy", default, deserialize_with = "lenient::text")]
    pub available_by: Option<String>,
    #[validate(range(min = 0.0))]
    #[serde(rename = "maxDeposit", default, deserialize_with = "lenient::number")]
    pub max_deposit: Option<f64>,
    #[serde(rename = "minSquareFeet", default, deserialize_with = "lenient::count")]
    pub min_square_feet: Option<u32>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub sort: Option<String>,
}

/// Radius bounds applied when turning a [`FilterInput`] into a [`FilterSpec`]
#[derive(Debug, Clone, Copy)]
pub struct RadiusLimits {
    /// Radius used when a reference point is given without a radius
    pub default_km: Option<f64>,
    /// Radii above this are treated as invalid input
    pub max_km: f64,
}

impl Default for RadiusLimits {
    fn default() -> Self {
        Self {
            default_km: Some(10.0),
            max_km: 100.0,
        }
    }
}

impl FilterInput {
    pub fn wants_current_location(&self) -> bool {
        self.near_me.unwrap_or(false)
    }

    pub fn has_reference_point(&self) -> bool {
        self.latitude.is_some() && self.longitude.is_some()
    }

    /// Fill in the reference point from a resolved device location
    pub fn set_reference_point(&mut self, point: GeoPoint) {
        self.latitude = Some(point.lat);
        self.longitude = Some(point.lng);
    }

    /// Convert into a validated spec and sort key.
    ///
    /// Invalid fields are treated as absent.
    pub fn into_spec(self, limits: RadiusLimits) -> (FilterSpec, SortKey) {
        let invalid: HashSet<String> = match self.validate() {
            Ok(()) => HashSet::new(),
            Err(errors) => errors
                .field_errors()
                .into_iter()
                .map(|(field, _)| field.to_string())
                .collect(),
        };

        if !invalid.is_empty() {
            tracing::debug!("Dropping invalid filter fields: {:?}", invalid);
        }

        let valid = |field: &str| !invalid.contains(field);
        let keep = |field: &str, value: Option<f64>| value.filter(|_| valid(field));

        let property_type = self
            .property_type
            .as_deref()
            .and_then(|raw| raw.parse::<PropertyType>().ok());
        let gender_preference = self
            .gender_preference
            .as_deref()
            .and_then(|raw| raw.parse::<GenderPreference>().ok());
        let available_by = self
            .available_by
            .as_deref()
            .and_then(|raw| NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok());

        let mut spec = FilterSpec {
            price: Range::new(keep("min_price", self.min_price), keep("max_price", self.max_price)),
            bedrooms: Range::new(self.min_bedrooms, self.max_bedrooms),
            bathrooms: Range::new(self.min_bathrooms, self.max_bathrooms),
            has_hall: self.has_hall,
            has_separate_kitchen: self.has_separate_kitchen,
            property_type,
            gender_preference,
            colleges: self.colleges,
            distance: None,
            keyword: self.keyword.filter(|_| valid("keyword")),
            available_by,
            max_deposit: keep("max_deposit", self.max_deposit),
            min_square_feet: self.min_square_feet,
        };

        let reference = match (keep("latitude", self.latitude), keep("longitude", self.longitude)) {
            (Some(lat), Some(lng)) => Some(GeoPoint::new(lat, lng)),
            _ => None,
        };
        let radius = match self.max_distance_km {
            Some(_) if !valid("max_distance_km") => None,
            Some(km) => Some(km).filter(|km| *km <= limits.max_km),
            None => limits.default_km,
        };
        if let (Some(reference), Some(radius)) = (reference, radius) {
            spec = spec.within_km(reference, radius);
        }

        let sort = self
            .sort
            .as_deref()
            .and_then(|raw| raw.parse::<SortKey>().ok())
            .unwrap_or_default();

        (spec, sort)
    }
}

/// Forgiving deserializers for form-shaped input
mod lenient {
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    pub fn number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Option::<Value>::deserialize(deserializer)?;
        Ok(value.as_ref().and_then(as_number))
    }

    pub fn count<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Option::<Value>::deserialize(deserializer)?;
        Ok(value
            .as_ref()
            .and_then(as_number)
            .filter(|n| *n >= 0.0 && n.fract() == 0.0 && *n <= u32::MAX as f64)
            .map(|n| n as u32))
    }

    pub fn flag<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Option::<Value>::deserialize(deserializer)?;
        Ok(match value {
            Some(Value::Bool(b)) => Some(b),
            Some(Value::String(s)) => match s.trim().to_lowercase().as_str() {
                "true" | "yes" | "1" => Some(true),
                "false" | "no" | "0" => Some(false),
                _ => None,
            },
            _ => None,
        })
    }

    pub fn text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Option::<Value>::deserialize(deserializer)?;
        Ok(match value {
            Some(Value::String(s)) if !s.trim().is_empty() => Some(s.trim().to_string()),
            _ => None,
        })
    }

    /// Array of strings or a single comma separated string
    pub fn text_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Option::<Value>::deserialize(deserializer)?;
        let items: Vec<String> = match value {
            Some(Value::Array(items)) => items
                .into_iter()
                .filter_map(|item| match item {
                    Value::String(s) => Some(s),
                    _ => None,
                })
                .collect(),
            Some(Value::String(s)) => s.split(',').map(str::to_string).collect(),
            _ => Vec::new(),
        };

        Ok(items
            .into_iter()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect())
    }

    fn as_number(value: &Value) -> Option<f64> {
        let n = match value {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        }?;
        n.is_finite().then_some(n)
    }
}
