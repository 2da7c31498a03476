//! # trackmap
//!
//! Map view initialization for location overlays, in the style of Leaflet.
//!
//! A map is bound to a mount point on a [`Page`], receives a base tile layer
//! from a remote URL template, renders a GeoJSON overlay on top of it and fits
//! its viewport to the overlay bounds. Rendering is headless: layers record
//! draw commands into a [`RenderContext`] for a frontend to paint.
//!
//! ```no_run
//! use trackmap::{initialize_map_from_str, Page};
//!
//! let mut page = Page::new();
//! page.add_mount("map-canvas", 800.0, 600.0);
//!
//! let geojson = r#"{"type":"FeatureCollection","features":[
//!     {"type":"Feature","geometry":{"type":"Point","coordinates":[-0.09,51.5]},"properties":{}}
//! ]}"#;
//!
//! let map = initialize_map_from_str(&mut page, "map-canvas", geojson)?;
//! println!("centered on {:?} at zoom {}", map.center()?, map.zoom()?);
//! # Ok::<(), trackmap::MapError>(())
//! ```

pub mod core;
pub mod data;
pub mod events;
pub mod geolocation;
pub mod initializer;
pub mod layers;
pub mod net;
pub mod prelude;
pub mod rendering;
pub mod tiles;
pub mod traits;

pub use crate::core::constants;

// Re-export public API
pub use core::{
    bounds::Bounds,
    config::MapConfig,
    geo::{LatLng, LatLngBounds, Point, TileCoord},
    map::{Map, MapOptions},
    page::{MountPoint, Page},
    viewport::Viewport,
};

pub use layers::{
    base::LayerTrait,
    tile::TileLayer,
    vector::{PathStyle, VectorLayer, VectorShape},
};

pub use data::{
    geojson::{GeoJson, GeoJsonFeature, GeoJsonGeometry, GeoJsonLayer},
    recent::{LocationRecord, LocationSource},
};

pub use events::MapEvent;
pub use geolocation::Geolocator;
pub use initializer::{initialize_map, initialize_map_from_str, MapInitializer};
pub use rendering::context::{DrawCommand, RenderContext};

/// Result type used throughout the library
pub type Result<T> = std::result::Result<T, MapError>;

/// Common error types
#[derive(Debug, thiserror::Error)]
pub enum MapError {
    #[error("Mount point not found: {0}")]
    MountNotFound(String),

    #[error("Mount point already holds a map: {0}")]
    MountInUse(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid GeoJSON: {0}")]
    InvalidGeoJson(String),

    #[error("Invalid coordinates: {0}")]
    InvalidCoordinates(String),

    #[error("Invalid bounds: {0}")]
    InvalidBounds(String),

    #[error("Map view has no center and zoom yet")]
    ViewNotSet,

    #[error("Layer error: {0}")]
    Layer(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Geolocation error: {0}")]
    Geolocation(String),
}

/// Error type alias for convenience
pub type Error = MapError;

/// Installs `env_logger` as the global logger, honoring `RUST_LOG`.
///
/// Calling it more than once is harmless.
#[cfg(feature = "debug")]
pub fn init_logging() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .try_init();
}
