use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// A WGS84 point in degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    #[inline]
    pub fn is_finite(&self) -> bool {
        self.lat.is_finite() && self.lng.is_finite()
    }
}

/// Kind of rentable unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PropertyType {
    Rental,
    Pg,
}

impl FromStr for PropertyType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "rental" => Ok(PropertyType::Rental),
            "pg" => Ok(PropertyType::Pg),
            other => Err(format!("unknown property type: {}", other)),
        }
    }
}

impl fmt::Display for PropertyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyType::Rental => write!(f, "rental"),
            PropertyType::Pg => write!(f, "pg"),
        }
    }
}

/// Who a listing is offered to
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GenderPreference {
    Boys,
    Girls,
    #[default]
    Any,
}

impl FromStr for GenderPreference {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "boys" => Ok(GenderPreference::Boys),
            "girls" => Ok(GenderPreference::Girls),
            "any" => Ok(GenderPreference::Any),
            other => Err(format!("unknown gender preference: {}", other)),
        }
    }
}

impl fmt::Display for GenderPreference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GenderPreference::Boys => write!(f, "boys"),
            GenderPreference::Girls => write!(f, "girls"),
            GenderPreference::Any => write!(f, "any"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Video,
}

/// Image or video attached to a listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaItem {
    pub url: String,
    #[serde(rename = "type", alias = "kind")]
    pub kind: MediaKind,
}

/// One rentable property record as served by the listing data source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Listing {
    #[serde(alias = "$id")]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub restrictions: String,
    pub price: f64,
    pub bedrooms: u32,
    #[serde(default = "default_bathrooms")]
    pub bathrooms: u32,
    #[serde(rename = "squareFeet", default)]
    pub square_feet: Option<u32>,
    #[serde(rename = "depositAmount", default)]
    pub deposit_amount: Option<f64>,
    #[serde(rename = "availableFrom", deserialize_with = "deserialize_date")]
    pub available_from: NaiveDate,
    #[serde(rename = "propertyType")]
    pub property_type: PropertyType,
    #[serde(rename = "genderPreference", default)]
    pub gender_preference: GenderPreference,
    #[serde(rename = "floorNumber", default)]
    pub floor_number: Option<u32>,
    #[serde(rename = "hasHall", default)]
    pub has_hall: Option<bool>,
    #[serde(rename = "hasSeparateKitchen", default)]
    pub has_separate_kitchen: Option<bool>,
    #[serde(rename = "nearbyCollege", default)]
    pub nearby_college: Option<String>,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub media: Vec<MediaItem>,
    /// Kilometres from the reference point of the current search pass.
    /// Written only by the distance filter; never read from the data source.
    #[serde(
        rename = "distanceKm",
        skip_deserializing,
        skip_serializing_if = "Option::is_none",
        serialize_with = "serialize_rounded_km"
    )]
    pub distance: Option<f64>,
}

fn default_bathrooms() -> u32 { 1 }

impl Listing {
    /// Valid coordinates, or `None` when the listing is unlocated.
    ///
    /// Missing or non-finite components and the (0, 0) placeholder the
    /// listing form writes when no pin was dropped all count as unlocated.
    pub fn coordinates(&self) -> Option<GeoPoint> {
        let (lat, lng) = (self.latitude?, self.longitude?);
        if !lat.is_finite() || !lng.is_finite() || (lat == 0.0 && lng == 0.0) {
            return None;
        }
        Some(GeoPoint::new(lat, lng))
    }

    pub fn is_located(&self) -> bool {
        self.coordinates().is_some()
    }

    /// Helper to get has_hall as a bool, defaulting to false
    pub fn hall(&self) -> bool {
        self.has_hall.unwrap_or(false)
    }

    /// Helper to get has_separate_kitchen as a bool, defaulting to false
    pub fn separate_kitchen(&self) -> bool {
        self.has_separate_kitchen.unwrap_or(false)
    }

    /// First image in the media list, used as the card/marker thumbnail
    pub fn primary_image(&self) -> Option<&str> {
        self.media
            .iter()
            .find(|m| m.kind == MediaKind::Image)
            .map(|m| m.url.as_str())
    }
}

/// Accepts `YYYY-MM-DD` or a full RFC 3339 timestamp (truncated to its date)
fn deserialize_date<'de, D>(deserializer: D) -> Result<NaiveDate, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    let raw = raw.trim();

    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Ok(date);
    }

    chrono::DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.date_naive())
        .map_err(|e| serde::de::Error::custom(format!("invalid availableFrom '{}': {}", raw, e)))
}

fn serialize_rounded_km<S>(distance: &Option<f64>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match distance {
        Some(d) => serializer.serialize_f64(crate::core::distance::round_km(*d)),
        None => serializer.serialize_none(),
    }
}

/// Geospatial bounding box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lon: f64,
    pub max_lon: f64,
}

impl From<geo::Rect<f64>> for BoundingBox {
    fn from(rect: geo::Rect<f64>) -> Self {
        // geo uses x = longitude, y = latitude
        Self {
            min_lat: rect.min().y,
            max_lat: rect.max().y,
            min_lon: rect.min().x,
            max_lon: rect.max().x,
        }
    }
}
