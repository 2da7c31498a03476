//! Centering the map on the current position

use crate::{
    core::{config::GeolocationConfig, geo::LatLng, map::Map},
    MapError, Result,
};
use async_trait::async_trait;

/// Provider of the device's current position
#[async_trait]
pub trait Geolocator: Send + Sync {
    async fn current_position(&self) -> Result<LatLng>;
}

/// Geolocator with a preset answer
#[derive(Debug, Clone)]
pub struct FixedGeolocator {
    position: std::result::Result<LatLng, String>,
}

impl FixedGeolocator {
    pub fn new(position: LatLng) -> Self {
        Self {
            position: Ok(position),
        }
    }

    /// A geolocator that always fails with `reason`
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self {
            position: Err(reason.into()),
        }
    }
}

#[async_trait]
impl Geolocator for FixedGeolocator {
    async fn current_position(&self) -> Result<LatLng> {
        self.position.clone().map_err(MapError::Geolocation)
    }
}

/// Centers `map` on the current position at `config.zoom`, or on the
/// fallback view when the position is unavailable. Returns the center used.
pub async fn locate(
    map: &mut Map,
    geolocator: &dyn Geolocator,
    config: &GeolocationConfig,
) -> Result<LatLng> {
    let (center, zoom) = match geolocator.current_position().await {
        Ok(position) if position.is_finite() && position.is_valid() => (position, config.zoom),
        Ok(position) => {
            log::warn!("geolocation returned an invalid position {:?}", position);
            (config.fallback.center, config.fallback.zoom)
        }
        Err(err) => {
            log::warn!("error getting geolocation: {}", err);
            (config.fallback.center, config.fallback.zoom)
        }
    };

    map.set_view(center, zoom)?;
    map.center()
}
