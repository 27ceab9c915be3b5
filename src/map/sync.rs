use std::collections::HashMap;
use std::sync::Arc;

use geo::{BoundingRect, MultiPoint, Point};

use crate::map::surface::{ClickHandler, MapError, MapSurface, MarkerContent, MarkerKind};
use crate::models::{BoundingBox, GeoPoint, Listing};

/// Callback receiving the id of a clicked listing
pub type SelectHandler = Arc<dyn Fn(&str) + Send + Sync>;

/// Presentation options for listing markers
#[derive(Debug, Clone)]
pub struct MarkerOptions {
    pub fit_padding_px: u32,
    pub currency_symbol: String,
    /// Map style applied by [`MapSyncController::apply_style`]
    pub style: String,
}

impl Default for MarkerOptions {
    fn default() -> Self {
        Self {
            fit_padding_px: 48,
            currency_symbol: "₹".to_string(),
            style: "streets".to_string(),
        }
    }
}

/// Counts of what one reconciliation pass did
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub created: usize,
    pub updated: usize,
    pub removed: usize,
    pub unchanged: usize,
    pub failed: usize,
}

struct PlacedMarker<H> {
    handle: H,
    position: GeoPoint,
    content: MarkerContent,
}

enum MarkerAction {
    Create,
    Recreate,
    Update,
    Keep,
}

/// Keeps a map's markers in step with the current listing set.
///
/// Each listing with valid coordinates owns one marker keyed by listing id.
/// Markers are never moved: a coordinate change removes the old marker and
/// creates a new one, so the click handler always captures the current id.
/// Adapter failures are logged and skipped per marker.
pub struct MapSyncController<M: MapSurface> {
    map: M,
    markers: HashMap<String, PlacedMarker<M::Marker>>,
    user_marker: Option<PlacedMarker<M::Marker>>,
    on_select: SelectHandler,
    options: MarkerOptions,
}

impl<M: MapSurface> MapSyncController<M> {
    pub fn new<F>(map: M, on_select: F) -> Self
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        Self {
            map,
            markers: HashMap::new(),
            user_marker: None,
            on_select: Arc::new(on_select),
            options: MarkerOptions::default(),
        }
    }

    pub fn with_options(mut self, options: MarkerOptions) -> Self {
        self.options = options;
        self
    }

    pub fn map(&self) -> &M {
        &self.map
    }

    pub fn map_mut(&mut self) -> &mut M {
        &mut self.map
    }

    /// Number of listing markers (the user marker is not counted)
    pub fn marker_count(&self) -> usize {
        self.markers.len()
    }

    pub fn marker(&self, listing_id: &str) -> Option<&M::Marker> {
        self.markers.get(listing_id).map(|m| &m.handle)
    }

    pub fn user_marker(&self) -> Option<&M::Marker> {
        self.user_marker.as_ref().map(|m| &m.handle)
    }

    /// Reconcile listing markers with `listings`.
    ///
    /// Unchanged markers keep their handle. Unlocated listings get no marker;
    /// when an id appears more than once the first occurrence wins.
    pub fn sync(&mut self, listings: &[Listing]) -> SyncReport {
        let mut report = SyncReport::default();

        let mut wanted: HashMap<&str, usize> = HashMap::with_capacity(listings.len());
        for (index, listing) in listings.iter().enumerate() {
            if listing.is_located() {
                wanted.entry(listing.id.as_str()).or_insert(index);
            }
        }

        let stale: Vec<String> = self
            .markers
            .keys()
            .filter(|id| !wanted.contains_key(id.as_str()))
            .cloned()
            .collect();
        for id in stale {
            if self.remove_listing_marker(&id) {
                report.removed += 1;
            } else {
                report.failed += 1;
            }
        }

        for (index, listing) in listings.iter().enumerate() {
            if wanted.get(listing.id.as_str()) != Some(&index) {
                continue;
            }
            let Some(position) = listing.coordinates() else {
                continue;
            };
            let content = self.listing_content(listing);

            let action = match self.markers.get(&listing.id) {
                None => MarkerAction::Create,
                Some(placed) if placed.position != position => MarkerAction::Recreate,
                Some(placed) if placed.content != content => MarkerAction::Update,
                Some(_) => MarkerAction::Keep,
            };

            match action {
                MarkerAction::Keep => report.unchanged += 1,
                MarkerAction::Update => {
                    if let Some(placed) = self.markers.get_mut(&listing.id) {
                        match self.map.update_marker(&placed.handle, &content) {
                            Ok(()) => {
                                placed.content = content;
                                report.updated += 1;
                            }
                            Err(e) => {
                                tracing::warn!("Failed to update marker for listing {}: {}", listing.id, e);
                                report.failed += 1;
                            }
                        }
                    }
                }
                MarkerAction::Recreate => {
                    if !self.remove_listing_marker(&listing.id) {
                        report.failed += 1;
                        continue;
                    }
                    report.removed += 1;
                    if self.create_listing_marker(listing, position, content) {
                        report.created += 1;
                    } else {
                        report.failed += 1;
                    }
                }
                MarkerAction::Create => {
                    if self.create_listing_marker(listing, position, content) {
                        report.created += 1;
                    } else {
                        report.failed += 1;
                    }
                }
            }
        }

        tracing::debug!(
            "Marker sync: {} created, {} updated, {} removed, {} unchanged, {} failed",
            report.created,
            report.updated,
            report.removed,
            report.unchanged,
            report.failed
        );

        report
    }

    /// Place, move or clear the user-location marker.
    ///
    /// Returns `false` if the map rejected the change.
    pub fn set_user_location(&mut self, location: Option<GeoPoint>) -> bool {
        let location = location.filter(GeoPoint::is_finite);

        if let (Some(point), Some(current)) = (location, &self.user_marker) {
            if current.position == point {
                return true;
            }
        }

        if let Some(current) = self.user_marker.take() {
            if let Err(e) = self.map.remove_marker(&current.handle) {
                tracing::warn!("Failed to remove user location marker: {}", e);
                self.user_marker = Some(current);
                return false;
            }
        }

        let Some(point) = location else {
            return true;
        };

        let content = MarkerContent::user_location();
        match self.map.add_marker(point, &content, None) {
            Ok(handle) => {
                self.user_marker = Some(PlacedMarker {
                    handle,
                    position: point,
                    content,
                });
                true
            }
            Err(e) => {
                tracing::warn!("Failed to place user location marker: {}", e);
                false
            }
        }
    }

    /// Bounding box of every listing marker plus the user marker
    pub fn visible_bounds(&self) -> Option<BoundingBox> {
        let points: Vec<Point<f64>> = self
            .markers
            .values()
            .chain(self.user_marker.iter())
            .map(|m| Point::new(m.position.lng, m.position.lat))
            .collect();

        MultiPoint::from(points).bounding_rect().map(BoundingBox::from)
    }

    /// Ask the map to show every marker. No-op when there are none.
    pub fn fit_to_visible(&mut self) -> bool {
        let Some(bounds) = self.visible_bounds() else {
            return false;
        };

        match self.map.fit_bounds(bounds, self.options.fit_padding_px) {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!("Failed to fit map to markers: {}", e);
                false
            }
        }
    }

    /// Apply the configured style to the map
    pub fn apply_style(&mut self) -> Result<(), MapError> {
        self.map.set_style(&self.options.style)
    }

    /// Switch style; the configured style is kept if the map rejects it
    pub fn set_style(&mut self, style: &str) -> Result<(), MapError> {
        self.map.set_style(style)?;
        self.options.style = style.to_string();
        Ok(())
    }

    pub fn style(&self) -> &str {
        &self.options.style
    }

    /// Remove every marker and release its click handler.
    ///
    /// Must be called before the map view is discarded.
    pub fn teardown(&mut self) -> SyncReport {
        let mut report = SyncReport::default();

        let ids: Vec<String> = self.markers.keys().cloned().collect();
        for id in ids {
            if self.remove_listing_marker(&id) {
                report.removed += 1;
            } else {
                report.failed += 1;
            }
        }
        if self.user_marker.is_some() {
            if self.set_user_location(None) {
                report.removed += 1;
            } else {
                report.failed += 1;
            }
        }

        if report.failed > 0 {
            tracing::warn!("Teardown left {} markers the map refused to remove", report.failed);
        }
        // the view is going away; nothing left to retry against
        self.markers.clear();
        self.user_marker = None;

        report
    }

    fn listing_content(&self, listing: &Listing) -> MarkerContent {
        let title = if listing.title.is_empty() {
            listing.address.clone()
        } else {
            listing.title.clone()
        };

        MarkerContent {
            kind: MarkerKind::Listing,
            label: price_label(&self.options.currency_symbol, listing.price),
            title,
            thumbnail: listing.primary_image().map(str::to_string),
        }
    }

    fn create_listing_marker(&mut self, listing: &Listing, position: GeoPoint, content: MarkerContent) -> bool {
        let on_select = Arc::clone(&self.on_select);
        let id = listing.id.clone();
        let on_click: ClickHandler = Box::new(move || on_select(&id));

        match self.map.add_marker(position, &content, Some(on_click)) {
            Ok(handle) => {
                self.markers.insert(
                    listing.id.clone(),
                    PlacedMarker {
                        handle,
                        position,
                        content,
                    },
                );
                true
            }
            Err(e) => {
                tracing::warn!("Failed to create marker for listing {}: {}", listing.id, e);
                false
            }
        }
    }

    /// Stays tracked on failure so a later pass can retry
    fn remove_listing_marker(&mut self, id: &str) -> bool {
        let Some(placed) = self.markers.get(id) else {
            return true;
        };

        match self.map.remove_marker(&placed.handle) {
            Ok(()) => {
                self.markers.remove(id);
                true
            }
            Err(e) => {
                tracing::warn!("Failed to remove marker for listing {}: {}", id, e);
                false
            }
        }
    }
}

impl<M: MapSurface> Drop for MapSyncController<M> {
    fn drop(&mut self) {
        let live = self.markers.len() + usize::from(self.user_marker.is_some());
        if live > 0 {
            tracing::warn!("Map controller dropped with {} live markers; tearing down", live);
            self.teardown();
        }
    }
}

/// Rent label shown on a pin, e.g. `₹12,500`
fn price_label(symbol: &str, price: f64) -> String {
    let digits = (price.max(0.0).round() as u64).to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);

    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    format!("{}{}", symbol, grouped)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::selection::Selection;
    use crate::models::{GenderPreference, PropertyType};
    use chrono::NaiveDate;
    use std::collections::HashSet;
    use std::sync::Mutex;

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    struct Handle(u64);

    /// In-memory stand-in for a map library
    #[derive(Default)]
    struct FakeMap {
        next_id: u64,
        live: HashMap<u64, (GeoPoint, MarkerContent)>,
        handlers: HashMap<u64, ClickHandler>,
        removed: HashSet<u64>,
        fitted: Vec<BoundingBox>,
        styles: Vec<String>,
        fail_labels: HashSet<String>,
        fail_removals: bool,
    }

    impl FakeMap {
        fn click(&self, handle: &Handle) {
            if let Some(handler) = self.handlers.get(&handle.0) {
                handler();
            }
        }
    }

    impl MapSurface for FakeMap {
        type Marker = Handle;

        fn add_marker(
            &mut self,
            position: GeoPoint,
            content: &MarkerContent,
            on_click: Option<ClickHandler>,
        ) -> Result<Handle, MapError> {
            if self.fail_labels.contains(&content.label) {
                return Err(MapError::NotReady);
            }
            self.next_id += 1;
            self.live.insert(self.next_id, (position, content.clone()));
            if let Some(handler) = on_click {
                self.handlers.insert(self.next_id, handler);
            }
            Ok(Handle(self.next_id))
        }

        fn update_marker(&mut self, marker: &Handle, content: &MarkerContent) -> Result<(), MapError> {
            let entry = self
                .live
                .get_mut(&marker.0)
                .ok_or_else(|| MapError::Marker("unknown marker".into()))?;
            entry.1 = content.clone();
            Ok(())
        }

        fn remove_marker(&mut self, marker: &Handle) -> Result<(), MapError> {
            if self.fail_removals {
                return Err(MapError::Marker("removal refused".into()));
            }
            self.live.remove(&marker.0);
            self.handlers.remove(&marker.0);
            self.removed.insert(marker.0);
            Ok(())
        }

        fn fit_bounds(&mut self, bounds: BoundingBox, _padding_px: u32) -> Result<(), MapError> {
            self.fitted.push(bounds);
            Ok(())
        }

        fn set_style(&mut self, style: &str) -> Result<(), MapError> {
            if style.is_empty() {
                return Err(MapError::Style("empty style name".into()));
            }
            self.styles.push(style.to_string());
            Ok(())
        }
    }

    fn listing(id: &str, price: f64, lat: f64, lng: f64) -> Listing {
        Listing {
            id: id.to_string(),
            title: format!("Flat {}", id),
            address: String::new(),
            description: String::new(),
            restrictions: String::new(),
            price,
            bedrooms: 2,
            bathrooms: 1,
            square_feet: None,
            deposit_amount: None,
            available_from: NaiveDate::from_ymd_opt(2024, 7, 1).unwrap(),
            property_type: PropertyType::Rental,
            gender_preference: GenderPreference::Any,
            floor_number: None,
            has_hall: None,
            has_separate_kitchen: None,
            nearby_college: None,
            latitude: Some(lat),
            longitude: Some(lng),
            media: vec![],
            distance: None,
        }
    }

    fn controller() -> MapSyncController<FakeMap> {
        MapSyncController::new(FakeMap::default(), |_| {})
    }

    #[test]
    fn test_price_label() {
        assert_eq!(price_label("₹", 12000.0), "₹12,000");
        assert_eq!(price_label("$", 999.4), "$999");
        assert_eq!(price_label("", 1234567.0), "1,234,567");
    }

    #[test]
    fn test_unlocated_listings_get_no_marker() {
        let mut ctrl = controller();
        let mut located = listing("a", 1.0, 12.9, 77.6);
        let report = ctrl.sync(&[located.clone(), listing("u", 1.0, 0.0, 0.0)]);

        assert_eq!(report.created, 1);
        assert_eq!(ctrl.marker_count(), 1);

        // a listing that loses its coordinates loses its marker
        located.latitude = None;
        let report = ctrl.sync(&[located]);
        assert_eq!(report.removed, 1);
        assert_eq!(ctrl.marker_count(), 0);
        assert!(ctrl.map().live.is_empty());
    }

    #[test]
    fn test_moved_listing_is_recreated() {
        let mut ctrl = controller();
        ctrl.sync(&[listing("a", 1.0, 12.9, 77.6)]);
        let before = *ctrl.marker("a").unwrap();

        let report = ctrl.sync(&[listing("a", 1.0, 12.95, 77.6)]);
        let after = *ctrl.marker("a").unwrap();

        assert_eq!(report.removed, 1);
        assert_eq!(report.created, 1);
        assert_ne!(before, after);
        assert!(ctrl.map().removed.contains(&before.0));
        assert!(!ctrl.map().handlers.contains_key(&before.0));
    }

    #[test]
    fn test_price_change_updates_in_place() {
        let mut ctrl = controller();
        ctrl.sync(&[listing("a", 10000.0, 12.9, 77.6)]);
        let before = *ctrl.marker("a").unwrap();

        let report = ctrl.sync(&[listing("a", 11000.0, 12.9, 77.6)]);

        assert_eq!(report.updated, 1);
        assert_eq!(*ctrl.marker("a").unwrap(), before);
        assert_eq!(ctrl.map().live[&before.0].1.label, "₹11,000");
    }

    #[test]
    fn test_duplicate_ids_first_wins() {
        let mut ctrl = controller();
        let report = ctrl.sync(&[listing("a", 1.0, 12.9, 77.6), listing("a", 2.0, 13.0, 77.7)]);

        assert_eq!(report.created, 1);
        assert_eq!(ctrl.map().live.len(), 1);
        let (position, _) = ctrl.map().live.values().next().unwrap().clone();
        assert_eq!(position, GeoPoint::new(12.9, 77.6));
    }

    #[test]
    fn test_one_bad_marker_does_not_abort_sync() {
        let mut map = FakeMap::default();
        map.fail_labels.insert("₹2".to_string());
        let mut ctrl = MapSyncController::new(map, |_| {});

        let report = ctrl.sync(&[
            listing("a", 1.0, 12.9, 77.6),
            listing("b", 2.0, 12.91, 77.6),
            listing("c", 3.0, 12.92, 77.6),
        ]);

        assert_eq!(report.created, 2);
        assert_eq!(report.failed, 1);
        assert!(ctrl.marker("a").is_some());
        assert!(ctrl.marker("b").is_none());
        assert!(ctrl.marker("c").is_some());

        // the failed marker is retried on the next pass
        ctrl.map_mut().fail_labels.clear();
        let report = ctrl.sync(&[
            listing("a", 1.0, 12.9, 77.6),
            listing("b", 2.0, 12.91, 77.6),
            listing("c", 3.0, 12.92, 77.6),
        ]);
        assert_eq!(report.created, 1);
        assert_eq!(report.unchanged, 2);
    }

    #[test]
    fn test_failed_removal_stays_tracked() {
        let mut ctrl = controller();
        ctrl.sync(&[listing("a", 1.0, 12.9, 77.6)]);

        ctrl.map_mut().fail_removals = true;
        let report = ctrl.sync(&[]);
        assert_eq!(report.failed, 1);
        assert_eq!(ctrl.marker_count(), 1);

        ctrl.map_mut().fail_removals = false;
        let report = ctrl.sync(&[]);
        assert_eq!(report.removed, 1);
        assert_eq!(ctrl.marker_count(), 0);
    }

    #[test]
    fn test_click_selects_listing() {
        let selection = Arc::new(Mutex::new(Selection::default()));
        let sink = Arc::clone(&selection);
        let mut ctrl = MapSyncController::new(FakeMap::default(), move |id: &str| {
            sink.lock().unwrap().select(id);
        });
        ctrl.sync(&[listing("a", 1.0, 12.9, 77.6), listing("b", 2.0, 12.91, 77.6)]);

        ctrl.map().click(ctrl.marker("a").unwrap());
        assert_eq!(selection.lock().unwrap().selected(), Some("a"));

        ctrl.map().click(ctrl.marker("b").unwrap());
        assert_eq!(selection.lock().unwrap().selected(), Some("b"));
    }

    #[test]
    fn test_user_location_lifecycle() {
        let mut ctrl = controller();

        assert!(ctrl.set_user_location(Some(GeoPoint::new(12.9, 77.6))));
        let first = *ctrl.user_marker().unwrap();
        assert!(!ctrl.map().handlers.contains_key(&first.0), "user marker is not clickable");

        // same point keeps the marker
        assert!(ctrl.set_user_location(Some(GeoPoint::new(12.9, 77.6))));
        assert_eq!(*ctrl.user_marker().unwrap(), first);

        assert!(ctrl.set_user_location(Some(GeoPoint::new(13.0, 77.6))));
        assert_ne!(*ctrl.user_marker().unwrap(), first);
        assert!(ctrl.map().removed.contains(&first.0));

        // listing syncs never touch the user marker
        ctrl.sync(&[]);
        assert!(ctrl.user_marker().is_some());

        assert!(ctrl.set_user_location(None));
        assert!(ctrl.user_marker().is_none());
        assert!(ctrl.map().live.is_empty());

        assert!(ctrl.set_user_location(Some(GeoPoint::new(f64::NAN, 1.0))));
        assert!(ctrl.user_marker().is_none());
    }

    #[test]
    fn test_fit_to_visible() {
        let mut ctrl = controller();
        assert!(!ctrl.fit_to_visible());
        assert!(ctrl.map().fitted.is_empty());

        ctrl.sync(&[listing("a", 1.0, 12.9, 77.6), listing("b", 1.0, 13.1, 77.5)]);
        ctrl.set_user_location(Some(GeoPoint::new(12.8, 77.8)));
        assert!(ctrl.fit_to_visible());

        let bounds = ctrl.map().fitted[0];
        assert_eq!(bounds.min_lat, 12.8);
        assert_eq!(bounds.max_lat, 13.1);
        assert_eq!(bounds.min_lon, 77.5);
        assert_eq!(bounds.max_lon, 77.8);
    }

    #[test]
    fn test_teardown_releases_everything() {
        let mut ctrl = controller();
        ctrl.sync(&[listing("a", 1.0, 12.9, 77.6), listing("b", 1.0, 13.1, 77.5)]);
        ctrl.set_user_location(Some(GeoPoint::new(12.8, 77.8)));

        let report = ctrl.teardown();

        assert_eq!(report.removed, 3);
        assert_eq!(ctrl.marker_count(), 0);
        assert!(ctrl.map().live.is_empty());
        assert!(ctrl.map().handlers.is_empty());
    }

    #[test]
    fn test_style_changes() {
        let options = MarkerOptions {
            style: "satellite".to_string(),
            ..MarkerOptions::default()
        };
        let mut ctrl = controller().with_options(options);

        ctrl.apply_style().unwrap();
        ctrl.set_style("dark").unwrap();
        assert!(ctrl.set_style("").is_err());

        assert_eq!(ctrl.map().styles, vec!["satellite", "dark"]);
        assert_eq!(ctrl.style(), "dark");
    }
}
