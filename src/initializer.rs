//! Page-load map setup: base tiles, GeoJSON overlay and a view fitted to it

use crate::{
    core::{
        config::MapConfig,
        constants::{BASE_LAYER_ID, OVERLAY_LAYER_ID},
        map::Map,
        page::Page,
    },
    data::geojson::{GeoJson, GeoJsonLayer},
    layers::tile::TileLayer,
    Result,
};

/// Builds a map on a mount point from a [`MapConfig`]
#[derive(Debug, Clone, Default)]
pub struct MapInitializer {
    config: MapConfig,
}

impl MapInitializer {
    pub fn new(config: MapConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &MapConfig {
        &self.config
    }

    /// Binds a map to `mount_id`, adds the tile layer and the overlay built
    /// from `geojson`, then fits the view to the overlay.
    ///
    /// An overlay without any position shows the configured default view
    /// instead. On error the mount point is left free.
    pub fn initialize(&self, page: &mut Page, mount_id: &str, geojson: &GeoJson) -> Result<Map> {
        self.config.validate()?;
        // Built before touching the page so a bad template leaves it unchanged
        let tiles = TileLayer::new(BASE_LAYER_ID.to_string(), self.config.tiles.clone())?;
        let overlay = GeoJsonLayer::new(OVERLAY_LAYER_ID.to_string(), geojson, &self.config.overlay_style);

        let mut map = Map::create(page, mount_id, self.config.map.clone())?;
        if let Err(err) = self.populate(&mut map, tiles, overlay) {
            map.remove();
            return Err(err);
        }

        log::info!(
            "map on #{} ready at {:?} zoom {}",
            mount_id,
            map.center()?,
            map.zoom()?
        );
        Ok(map)
    }

    /// Parses `geojson` and initializes the map with it
    pub fn initialize_from_str(&self, page: &mut Page, mount_id: &str, geojson: &str) -> Result<Map> {
        let geojson: GeoJson = geojson.parse()?;
        self.initialize(page, mount_id, &geojson)
    }

    fn populate(&self, map: &mut Map, tiles: TileLayer, overlay: GeoJsonLayer) -> Result<()> {
        map.add_layer(Box::new(tiles))?;

        let bounds = overlay.bounds();
        log::debug!("overlay has {} shapes", overlay.shape_count());
        map.add_layer(Box::new(overlay))?;

        match bounds {
            Some(bounds) => map.fit_bounds(&bounds, &self.config.fit),
            None => {
                log::debug!("empty overlay, using the default view");
                let view = self.config.default_view;
                map.set_view(view.center, view.zoom)
            }
        }
    }
}

/// [`MapInitializer::initialize`] with the default configuration
pub fn initialize_map(page: &mut Page, mount_id: &str, geojson: &GeoJson) -> Result<Map> {
    MapInitializer::default().initialize(page, mount_id, geojson)
}

/// [`initialize_map`] for GeoJSON text
pub fn initialize_map_from_str(page: &mut Page, mount_id: &str, geojson: &str) -> Result<Map> {
    MapInitializer::default().initialize_from_str(page, mount_id, geojson)
}
