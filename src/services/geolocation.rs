use crate::models::GeoPoint;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;

/// Why the device location could not be obtained
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LocationError {
    #[error("Location permission denied")]
    PermissionDenied,

    #[error("Location unavailable: {0}")]
    Unavailable(String),

    #[error("Location request timed out after {0:?}")]
    Timeout(Duration),
}

/// Platform location API, asked for one fix per "use my location" action
pub trait GeolocationProvider {
    fn current_position(&self) -> impl Future<Output = Result<GeoPoint, LocationError>> + Send;
}

/// Resolve the device location, giving up after `timeout`.
///
/// Every failure is a named outcome; callers disable distance features
/// rather than failing the search.
pub async fn locate_user<P>(provider: &P, timeout: Duration) -> Result<GeoPoint, LocationError>
where
    P: GeolocationProvider,
{
    let point = match tokio::time::timeout(timeout, provider.current_position()).await {
        Ok(result) => result?,
        Err(_) => {
            tracing::info!("Location request timed out after {:?}", timeout);
            return Err(LocationError::Timeout(timeout));
        }
    };

    if !point.is_finite() {
        return Err(LocationError::Unavailable("provider returned a non-finite point".into()));
    }

    tracing::debug!("Resolved user location: ({}, {})", point.lat, point.lng);
    Ok(point)
}

/// Provider backed by a configured point, for headless use
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedLocation {
    point: Option<GeoPoint>,
}

impl FixedLocation {
    pub fn new(point: Option<GeoPoint>) -> Self {
        Self { point }
    }
}

impl GeolocationProvider for FixedLocation {
    fn current_position(&self) -> impl Future<Output = Result<GeoPoint, LocationError>> + Send {
        let point = self.point;
        async move { point.ok_or_else(|| LocationError::Unavailable("no location configured".into())) }
    }
}
