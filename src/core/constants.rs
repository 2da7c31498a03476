//! Core constants derived from Leaflet defaults and common web-map conventions.
//! Keeping them in a single place makes it easier to tweak engine-wide magic numbers.

/// Default square tile size in pixels.
pub const TILE_SIZE: u32 = 256;

/// Web Mercator projection radius (EPSG:3857), in metres.
pub const EARTH_RADIUS: f64 = 6_378_137.0;

/// Mean earth radius used for distances and circle extents, in metres.
pub const MEAN_EARTH_RADIUS: f64 = 6_371_000.0;

/// Latitude limit of the square Web Mercator world.
pub const MAX_LATITUDE: f64 = 85.051_128_779_8;

/// Highest zoom level of the default tile server.
pub const DEFAULT_MAX_ZOOM: f64 = 18.0;

/// Deepest zoom level any layer or map may be configured with.
pub const MAX_ZOOM_LEVEL: u8 = 30;

/// Snap zoom levels to these quanta (1 → integer zooms).
pub const DEFAULT_ZOOM_SNAP: f64 = 1.0;

/// Pixels kept free around fitted bounds on every side.
pub const DEFAULT_FIT_PADDING: f64 = 20.0;

/// OpenStreetMap tile template.
pub const OSM_TILE_URL: &str = "https://{s}.tile.openstreetmap.org/{z}/{x}/{y}.png";

/// Attribution required by the OpenStreetMap tile usage policy.
pub const OSM_ATTRIBUTION: &str =
    "&copy; <a href=\"http://osm.org/copyright\">OpenStreetMap</a> contributors";

/// Subdomains the OpenStreetMap template rotates through.
pub const OSM_SUBDOMAINS: [&str; 3] = ["a", "b", "c"];

/// Layer id of the base tile layer added during initialization.
pub const BASE_LAYER_ID: &str = "base-tiles";

/// Layer id of the GeoJSON overlay added during initialization.
pub const OVERLAY_LAYER_ID: &str = "geojson-overlay";

/// Layer id of the recent locations overlay.
pub const RECENT_LAYER_ID: &str = "recent-locations";

/// View used when geolocation fails (Nashville, TN).
pub const FALLBACK_CENTER: (f64, f64) = (36.1627, -86.7816);

/// Zoom used when centering on a located or fallback position.
pub const LOCATE_ZOOM: f64 = 13.0;

/// Z-index of vector overlays, above the base tiles.
pub const OVERLAY_Z_INDEX: i32 = 10;
