use thiserror::Error;

use crate::models::{BoundingBox, GeoPoint};

/// Errors reported by a map adapter
#[derive(Debug, Error)]
pub enum MapError {
    #[error("Map not initialized")]
    NotReady,

    #[error("Marker operation failed: {0}")]
    Marker(String),

    #[error("Viewport operation failed: {0}")]
    Viewport(String),

    #[error("Style change failed: {0}")]
    Style(String),
}

/// Callback fired when a marker is clicked
pub type ClickHandler = Box<dyn Fn() + Send + Sync>;

/// What a marker stands for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerKind {
    Listing,
    UserLocation,
}

/// Non-positional marker content; may be updated in place
#[derive(Debug, Clone, PartialEq)]
pub struct MarkerContent {
    pub kind: MarkerKind,
    /// Short text on the pin, e.g. the rent
    pub label: String,
    /// Longer text for hover/popup
    pub title: String,
    pub thumbnail: Option<String>,
}

impl MarkerContent {
    pub fn user_location() -> Self {
        Self {
            kind: MarkerKind::UserLocation,
            label: String::new(),
            title: "You are here".to_string(),
            thumbnail: None,
        }
    }
}

/// The primitive set of an interactive map library.
///
/// Implementations wrap a concrete renderer. `remove_marker` must be
/// idempotent: removing an already removed marker returns `Ok(())`.
pub trait MapSurface {
    /// Disposable handle for a marker living on the map
    type Marker;

    fn add_marker(
        &mut self,
        position: GeoPoint,
        content: &MarkerContent,
        on_click: Option<ClickHandler>,
    ) -> Result<Self::Marker, MapError>;

    fn update_marker(&mut self, marker: &Self::Marker, content: &MarkerContent) -> Result<(), MapError>;

    fn remove_marker(&mut self, marker: &Self::Marker) -> Result<(), MapError>;

    fn fit_bounds(&mut self, bounds: BoundingBox, padding_px: u32) -> Result<(), MapError>;

    fn set_style(&mut self, style: &str) -> Result<(), MapError>;
}
