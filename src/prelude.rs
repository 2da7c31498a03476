//! Prelude module for common trackmap types and traits
//!
//! This module re-exports the most commonly used types, traits, and functions
//! for easy importing with `use trackmap::prelude::*;`

pub use crate::core::{
    bounds::Bounds,
    config::{FitBoundsOptions, GeolocationConfig, MapConfig, RecentLocationsConfig, TileLayerConfig, ViewConfig},
    geo::{LatLng, LatLngBounds, Point, TileCoord},
    map::{Map, MapOptions},
    page::{MountPoint, Page},
    viewport::Viewport,
};

pub use crate::layers::{
    base::{LayerProperties, LayerTrait, LayerType},
    manager::LayerManager,
    tile::{TileLayer, TilePlacement},
    vector::{Color, PathStyle, VectorFeature, VectorLayer, VectorShape},
};

pub use crate::data::geojson::{GeoJson, GeoJsonFeature, GeoJsonGeometry, GeoJsonLayer};

pub use crate::data::recent::{
    add_recent_locations, parse_records, recent_locations_layer, HttpLocationSource,
    LocationQuery, LocationRecord, LocationSource,
};

#[cfg(feature = "tokio-runtime")]
pub use crate::data::recent::{spawn_recent_locations, RecentLocationsHandle};

pub use crate::events::{EventManager, MapEvent};

pub use crate::geolocation::{locate, FixedGeolocator, Geolocator};

pub use crate::initializer::{initialize_map, initialize_map_from_str, MapInitializer};

pub use crate::rendering::context::{DrawCommand, PathRenderStyle, RenderContext};

pub use crate::tiles::{
    cache::TileCache,
    loader::{TileLoader, TileResponse},
    source::{TileSource, UrlTemplateSource},
};

pub use crate::{Error as MapError, Result};

pub use std::sync::{Arc, Mutex};

pub use fxhash::{FxHashMap as HashMap, FxHashSet as HashSet};
