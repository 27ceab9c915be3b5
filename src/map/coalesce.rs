use std::sync::{Mutex, MutexGuard, PoisonError, TryLockError};

use crate::map::surface::MapSurface;
use crate::map::sync::{MapSyncController, SyncReport};
use crate::models::Listing;

/// Serializes sync requests against one controller.
///
/// A request made while a pass is running is not run concurrently: it
/// replaces any pending listing set, and the running pass applies the latest
/// pending set before it returns.
pub struct CoalescingSync<M: MapSurface> {
    controller: Mutex<MapSyncController<M>>,
    pending: Mutex<Option<Vec<Listing>>>,
}

impl<M: MapSurface> CoalescingSync<M> {
    pub fn new(controller: MapSyncController<M>) -> Self {
        Self {
            controller: Mutex::new(controller),
            pending: Mutex::new(None),
        }
    }

    /// Request a sync to `listings`.
    ///
    /// Returns the reports of the passes this call ran; empty when the
    /// request was handed over to a pass already in progress.
    pub fn request_sync(&self, listings: Vec<Listing>) -> Vec<SyncReport> {
        if self.pending().replace(listings).is_some() {
            tracing::debug!("Coalesced superseded marker sync request");
        }

        let mut reports = Vec::new();
        loop {
            {
                let mut controller = match self.controller.try_lock() {
                    Ok(guard) => guard,
                    Err(TryLockError::WouldBlock) => return reports,
                    Err(TryLockError::Poisoned(poisoned)) => poisoned.into_inner(),
                };

                while let Some(next) = self.take_pending() {
                    reports.push(controller.sync(&next));
                }
            }

            // a request may have arrived after the last take but before unlock
            if self.pending().is_none() {
                return reports;
            }
        }
    }

    /// Run `f` with exclusive access to the controller
    pub fn with_controller<R>(&self, f: impl FnOnce(&mut MapSyncController<M>) -> R) -> R {
        let mut controller = self
            .controller
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        f(&mut controller)
    }

    fn pending(&self) -> MutexGuard<'_, Option<Vec<Listing>>> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn take_pending(&self) -> Option<Vec<Listing>> {
        self.pending().take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::surface::{ClickHandler, MapError, MarkerContent};
    use crate::models::{BoundingBox, GenderPreference, GeoPoint, PropertyType};
    use chrono::NaiveDate;
    use std::sync::{Arc, Weak};

    type Hook = Box<dyn FnOnce() + Send>;

    /// Map that runs a hook the first time a marker is added
    struct HookMap {
        hook: Arc<Mutex<Option<Hook>>>,
        added: Arc<Mutex<Vec<String>>>,
        next_id: u64,
    }

    impl MapSurface for HookMap {
        type Marker = u64;

        fn add_marker(
            &mut self,
            _position: GeoPoint,
            content: &MarkerContent,
            _on_click: Option<ClickHandler>,
        ) -> Result<u64, MapError> {
            self.added.lock().unwrap().push(content.title.clone());
            let hook = self.hook.lock().unwrap().take();
            if let Some(hook) = hook {
                hook();
            }
            self.next_id += 1;
            Ok(self.next_id)
        }

        fn update_marker(&mut self, _marker: &u64, _content: &MarkerContent) -> Result<(), MapError> {
            Ok(())
        }

        fn remove_marker(&mut self, _marker: &u64) -> Result<(), MapError> {
            Ok(())
        }

        fn fit_bounds(&mut self, _bounds: BoundingBox, _padding_px: u32) -> Result<(), MapError> {
            Ok(())
        }

        fn set_style(&mut self, _style: &str) -> Result<(), MapError> {
            Ok(())
        }
    }

    fn listing(id: &str) -> Listing {
        Listing {
            id: id.to_string(),
            title: id.to_string(),
            address: String::new(),
            description: String::new(),
            restrictions: String::new(),
            price: 5000.0,
            bedrooms: 1,
            bathrooms: 1,
            square_feet: None,
            deposit_amount: None,
            available_from: NaiveDate::from_ymd_opt(2024, 7, 1).unwrap(),
            property_type: PropertyType::Pg,
            gender_preference: GenderPreference::Any,
            floor_number: None,
            has_hall: None,
            has_separate_kitchen: None,
            nearby_college: None,
            latitude: Some(12.9),
            longitude: Some(77.6),
            media: vec![],
            distance: None,
        }
    }

    #[test]
    fn test_request_during_pass_is_coalesced() {
        let hook: Arc<Mutex<Option<Hook>>> = Arc::new(Mutex::new(None));
        let added = Arc::new(Mutex::new(Vec::new()));
        let map = HookMap {
            hook: Arc::clone(&hook),
            added: Arc::clone(&added),
            next_id: 0,
        };
        let sync = Arc::new(CoalescingSync::new(MapSyncController::new(map, |_| {})));

        // While the first pass is adding "a", two more requests arrive;
        // only the latest one should be applied.
        let weak: Weak<CoalescingSync<HookMap>> = Arc::downgrade(&sync);
        *hook.lock().unwrap() = Some(Box::new(move || {
            let sync = weak.upgrade().unwrap();
            assert!(sync.request_sync(vec![listing("b")]).is_empty());
            assert!(sync.request_sync(vec![listing("c")]).is_empty());
        }));

        let reports = sync.request_sync(vec![listing("a")]);

        assert_eq!(reports.len(), 2);
        assert_eq!(*added.lock().unwrap(), vec!["a", "c"]);
        sync.with_controller(|controller| {
            assert!(controller.marker("a").is_none());
            assert!(controller.marker("b").is_none());
            assert!(controller.marker("c").is_some());
        });
    }

    #[test]
    fn test_sequential_requests_each_run() {
        let map = HookMap {
            hook: Arc::new(Mutex::new(None)),
            added: Arc::new(Mutex::new(Vec::new())),
            next_id: 0,
        };
        let sync = CoalescingSync::new(MapSyncController::new(map, |_| {}));

        assert_eq!(sync.request_sync(vec![listing("a")]).len(), 1);
        let reports = sync.request_sync(vec![listing("a"), listing("b")]);
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].unchanged, 1);
        assert_eq!(reports[0].created, 1);
    }
}
