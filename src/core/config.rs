//! Configuration for map initialization
//!
//! Every section has defaults matching the stock OpenStreetMap setup, so a
//! partial JSON document only needs to name the fields it changes:
//!
//! ```
//! use trackmap::MapConfig;
//!
//! let config = MapConfig::from_json_str(r#"{ "fit": { "padding": 5.0 } }"#).unwrap();
//! assert_eq!(config.fit.padding, 5.0);
//! assert_eq!(config.tiles.max_zoom, 18);
//! ```

use crate::{
    core::{
        constants::{
            DEFAULT_FIT_PADDING, DEFAULT_MAX_ZOOM, FALLBACK_CENTER, LOCATE_ZOOM, MAX_ZOOM_LEVEL,
            OSM_ATTRIBUTION, OSM_SUBDOMAINS, OSM_TILE_URL, TILE_SIZE,
        },
        geo::LatLng,
        map::MapOptions,
    },
    data::recent::LocationQuery,
    layers::vector::{Color, PathStyle},
    MapError, Result,
};
use serde::{Deserialize, Serialize};

/// Top-level configuration consumed by [`crate::MapInitializer`]
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MapConfig {
    pub map: MapOptions,
    pub tiles: TileLayerConfig,
    pub fit: FitBoundsOptions,
    /// View used when the overlay has nothing to fit
    pub default_view: ViewConfig,
    pub overlay_style: PathStyle,
    pub recent: RecentLocationsConfig,
    pub geolocation: GeolocationConfig,
}

impl MapConfig {
    /// Parses a JSON document and validates it
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: MapConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.map.validate()?;
        self.tiles.validate()?;
        self.fit.validate()?;
        if !self.default_view.center.is_finite() {
            return Err(MapError::Config("default_view.center must be finite".into()));
        }
        if self.recent.url.trim().is_empty() {
            return Err(MapError::Config("recent.url must not be empty".into()));
        }
        Ok(())
    }
}

/// Base tile layer settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TileLayerConfig {
    /// URL template, e.g. `https://{s}.tile.openstreetmap.org/{z}/{x}/{y}.png`
    pub url_template: String,
    /// Values substituted for `{s}`
    pub subdomains: Vec<String>,
    /// Attribution text required by the tile provider
    pub attribution: String,
    pub min_zoom: u8,
    pub max_zoom: u8,
    pub tile_size: u32,
    pub opacity: f32,
    pub z_index: i32,
    /// Issue network requests for visible tiles
    pub load_tiles: bool,
    /// Number of decoded tiles kept in memory
    pub cache_capacity: usize,
}

impl Default for TileLayerConfig {
    fn default() -> Self {
        Self {
            url_template: OSM_TILE_URL.to_string(),
            subdomains: OSM_SUBDOMAINS.iter().map(|s| s.to_string()).collect(),
            attribution: OSM_ATTRIBUTION.to_string(),
            min_zoom: 0,
            max_zoom: DEFAULT_MAX_ZOOM as u8,
            tile_size: TILE_SIZE,
            opacity: 1.0,
            z_index: 1,
            load_tiles: true,
            cache_capacity: 512,
        }
    }
}

impl TileLayerConfig {
    pub fn validate(&self) -> Result<()> {
        if self.url_template.is_empty() {
            return Err(MapError::Config("tiles.url_template must not be empty".into()));
        }
        if self.max_zoom > MAX_ZOOM_LEVEL {
            return Err(MapError::Config(format!(
                "tiles.max_zoom ({}) exceeds {}",
                self.max_zoom, MAX_ZOOM_LEVEL
            )));
        }
        if self.min_zoom > self.max_zoom {
            return Err(MapError::Config(format!(
                "tiles.min_zoom ({}) exceeds tiles.max_zoom ({})",
                self.min_zoom, self.max_zoom
            )));
        }
        if self.tile_size == 0 {
            return Err(MapError::Config("tiles.tile_size must be positive".into()));
        }
        if !(0.0..=1.0).contains(&self.opacity) {
            return Err(MapError::Config("tiles.opacity must be within 0..=1".into()));
        }
        Ok(())
    }
}

/// Options for fitting the view to bounds
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FitBoundsOptions {
    /// Pixels kept free on every side of the fitted bounds
    pub padding: f64,
    /// Never zoom in further than this while fitting
    pub max_zoom: Option<f64>,
}

impl Default for FitBoundsOptions {
    fn default() -> Self {
        Self {
            padding: DEFAULT_FIT_PADDING,
            max_zoom: None,
        }
    }
}

impl FitBoundsOptions {
    pub fn validate(&self) -> Result<()> {
        if !self.padding.is_finite() || self.padding < 0.0 {
            return Err(MapError::Config("fit.padding must be a non-negative number".into()));
        }
        Ok(())
    }
}

/// A fixed center and zoom
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewConfig {
    pub center: LatLng,
    pub zoom: f64,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            center: LatLng::new(0.0, 0.0),
            zoom: 2.0,
        }
    }
}

/// Settings for the recent locations overlay
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecentLocationsConfig {
    /// Endpoint returning the location records
    pub url: String,
    /// Circle radius for records without a usable accuracy
    pub default_radius_m: f64,
    pub request_timeout_secs: u64,
    pub style: PathStyle,
    /// POST this filter instead of issuing a GET
    pub query: Option<LocationQuery>,
}

impl Default for RecentLocationsConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:8080/recent".to_string(),
            default_radius_m: 10.0,
            request_timeout_secs: 30,
            style: PathStyle {
                color: Color::rgb(0xe0, 0x3a, 0x3e),
                fill_color: Some(Color::rgb(0xe0, 0x3a, 0x3e)),
                ..PathStyle::default()
            },
            query: None,
        }
    }
}

/// Settings for centering the map on the current position
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeolocationConfig {
    pub zoom: f64,
    /// View used when the position cannot be determined
    pub fallback: ViewConfig,
}

impl Default for GeolocationConfig {
    fn default() -> Self {
        Self {
            zoom: LOCATE_ZOOM,
            fallback: ViewConfig {
                center: LatLng::new(FALLBACK_CENTER.0, FALLBACK_CENTER.1),
                zoom: LOCATE_ZOOM,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_use_openstreetmap() {
        let config = MapConfig::default();

        assert_eq!(config.tiles.url_template, OSM_TILE_URL);
        assert_eq!(config.tiles.subdomains, vec!["a", "b", "c"]);
        assert!(config.tiles.attribution.contains("OpenStreetMap"));
        assert_eq!(config.fit.padding, DEFAULT_FIT_PADDING);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = MapConfig::from_json_str(
            r#"{
                "tiles": { "url_template": "https://tiles.example.com/{z}/{x}/{y}.png", "subdomains": [] },
                "geolocation": { "zoom": 10 }
            }"#,
        )
        .unwrap();

        assert_eq!(config.tiles.url_template, "https://tiles.example.com/{z}/{x}/{y}.png");
        assert!(config.tiles.subdomains.is_empty());
        assert_eq!(config.tiles.max_zoom, 18);
        assert_eq!(config.geolocation.zoom, 10.0);
        assert_eq!(config.geolocation.fallback.center, LatLng::new(36.1627, -86.7816));
    }

    #[test]
    fn test_invalid_zoom_range_is_rejected() {
        let result = MapConfig::from_json_str(r#"{ "tiles": { "min_zoom": 10, "max_zoom": 4 } }"#);
        assert!(matches!(result, Err(MapError::Config(_))));
    }

    #[test]
    fn test_negative_padding_is_rejected() {
        let result = MapConfig::from_json_str(r#"{ "fit": { "padding": -1 } }"#);
        assert!(matches!(result, Err(MapError::Config(_))));
    }

    #[test]
    fn test_malformed_json_is_serialization_error() {
        let result = MapConfig::from_json_str("{ not json");
        assert!(matches!(result, Err(MapError::Serialization(_))));
    }
}
