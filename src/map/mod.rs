// Map marker reconciliation
pub mod coalesce;
pub mod selection;
pub mod surface;
pub mod sync;

pub use coalesce::CoalescingSync;
pub use selection::Selection;
pub use surface::{ClickHandler, MapError, MapSurface, MarkerContent, MarkerKind};
pub use sync::{MapSyncController, MarkerOptions, SelectHandler, SyncReport};
