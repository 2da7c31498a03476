use crate::{
    core::{
        config::TileLayerConfig,
        geo::{Point, TileCoord},
        viewport::Viewport,
    },
    layers::base::{LayerProperties, LayerTrait, LayerType},
    prelude::HashSet,
    rendering::context::RenderContext,
    tiles::{cache::TileCache, loader::TileLoader, source::UrlTemplateSource},
    Result,
};
use std::sync::Arc;

/// A tile in the current view: the wrapped coordinate plus the unwrapped
/// column it is drawn at
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TilePlacement {
    pub coord: TileCoord,
    pub column: i64,
}

/// Raster base layer fed from a URL template
pub struct TileLayer {
    properties: LayerProperties,
    config: TileLayerConfig,
    loader: TileLoader,
    cache: TileCache,
    pending: HashSet<TileCoord>,
    failed: HashSet<TileCoord>,
    visible: Vec<TilePlacement>,
}

impl TileLayer {
    /// Builds the layer, rejecting templates with unknown placeholders
    pub fn new(id: String, config: TileLayerConfig) -> Result<Self> {
        config.validate()?;
        let source = UrlTemplateSource::new(config.url_template.clone(), config.subdomains.clone())?;

        let mut properties = LayerProperties::new(id, "Tiles".to_string(), LayerType::Tile);
        properties.opacity = config.opacity;
        properties.z_index = config.z_index;

        Ok(Self {
            properties,
            cache: TileCache::new(config.cache_capacity),
            loader: TileLoader::new(Arc::new(source)),
            config,
            pending: HashSet::default(),
            failed: HashSet::default(),
            visible: Vec::new(),
        })
    }

    pub fn config(&self) -> &TileLayerConfig {
        &self.config
    }

    pub fn tile_url(&self, coord: TileCoord) -> String {
        self.loader.url(coord)
    }

    pub fn cache(&self) -> &TileCache {
        &self.cache
    }

    /// The loader whose arrivals [`LayerTrait::update`] collects
    pub fn loader(&self) -> &TileLoader {
        &self.loader
    }

    /// Tiles covering the view as of the last view change
    pub fn visible_tiles(&self) -> &[TilePlacement] {
        &self.visible
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    pub fn failed_count(&self) -> usize {
        self.failed.len()
    }

    /// Zoom level tiles are fetched at for a given view zoom, `None` when
    /// the rounded zoom is outside the layer's range
    pub fn tile_zoom(&self, zoom: f64) -> Option<u8> {
        let zoom = zoom.round();
        let range = self.config.min_zoom as f64..=self.config.max_zoom as f64;
        range.contains(&zoom).then_some(zoom as u8)
    }

    /// Tiles that cover `viewport`, row by row. Empty when the view zoom is
    /// outside the layer's range.
    pub fn tiles_for_viewport(&self, viewport: &Viewport) -> Vec<TilePlacement> {
        let Some(tile_zoom) = self.tile_zoom(viewport.zoom) else {
            return Vec::new();
        };
        let Some(tiles_per_side) = 1i64.checked_shl(tile_zoom as u32) else {
            return Vec::new();
        };
        let tile_size = self.config.tile_size as f64;
        let scale = 2_f64.powf(viewport.zoom - tile_zoom as f64);

        let pixel_center = viewport.project(&viewport.center, Some(tile_zoom as f64)).floor();
        let half_size = viewport.size.divide(scale * 2.0);
        let min = pixel_center.subtract(&half_size);
        let max = pixel_center.add(&half_size);

        let min_col = (min.x / tile_size).floor() as i64;
        let min_row = (min.y / tile_size).floor() as i64;
        let max_col = (max.x / tile_size).ceil() as i64 - 1;
        let max_row = (max.y / tile_size).ceil() as i64 - 1;
        let mut tiles = Vec::new();
        for row in min_row.max(0)..=max_row.min(tiles_per_side - 1) {
            for column in min_col..=max_col {
                let x = column.rem_euclid(tiles_per_side);
                tiles.push(TilePlacement {
                    coord: TileCoord::new(x as u32, row as u32, tile_zoom),
                    column,
                });
            }
        }
        tiles
    }

    fn request_missing(&mut self) {
        let mut requested = 0;
        for placement in &self.visible {
            let coord = placement.coord;
            if self.cache.contains(&coord)
                || self.pending.contains(&coord)
                || self.failed.contains(&coord)
            {
                continue;
            }
            if self.loader.request(coord) {
                self.pending.insert(coord);
                requested += 1;
            }
        }
        if requested > 0 {
            log::debug!("layer '{}' requested {} tiles", self.properties.id, requested);
        }
    }
}

impl LayerTrait for TileLayer {
    crate::impl_layer_trait!(TileLayer, properties);

    fn on_view_changed(&mut self, viewport: &Viewport) -> Result<()> {
        self.visible = self.tiles_for_viewport(viewport);
        if self.config.load_tiles {
            self.request_missing();
        }
        Ok(())
    }

    fn update(&mut self) -> Result<()> {
        for response in self.loader.drain() {
            self.pending.remove(&response.coord);
            match response.result {
                Ok(data) => {
                    self.cache.insert(response.coord, data);
                }
                Err(err) => {
                    log::warn!("tile {:?} failed: {}", response.coord, err);
                    self.failed.insert(response.coord);
                }
            }
        }
        Ok(())
    }

    fn render(&mut self, context: &mut RenderContext, viewport: &Viewport) -> Result<()> {
        let Some(tile_zoom) = self.tile_zoom(viewport.zoom) else {
            return Ok(());
        };
        let scale = 2_f64.powf(viewport.zoom - tile_zoom as f64);
        let tile_size = self.config.tile_size as f64;
        let origin = viewport.pixel_origin();
        let opacity = self.properties.opacity;

        for placement in self.tiles_for_viewport(viewport) {
            if let Some(data) = self.cache.get(&placement.coord) {
                let min = Point::new(
                    placement.column as f64 * tile_size,
                    placement.coord.y as f64 * tile_size,
                )
                .multiply(scale)
                .subtract(&origin);
                let max = min.add(&Point::new(tile_size * scale, tile_size * scale));
                context.render_tile(placement.coord, data, (min, max), opacity)?;
            }
        }
        Ok(())
    }

    fn min_zoom(&self) -> Option<f64> {
        Some(self.config.min_zoom as f64)
    }

    fn max_zoom(&self) -> Option<f64> {
        Some(self.config.max_zoom as f64)
    }

    fn attribution(&self) -> Option<&str> {
        Some(self.config.attribution.as_str()).filter(|text| !text.is_empty())
    }

    fn options(&self) -> serde_json::Value {
        let mut options = self.properties.to_json();
        options["url_template"] = self.config.url_template.clone().into();
        options["min_zoom"] = self.config.min_zoom.into();
        options["max_zoom"] = self.config.max_zoom.into();
        options["cached_tiles"] = self.cache.len().into();
        options
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        core::geo::LatLng, rendering::context::DrawCommand, tiles::loader::TileResponse, MapError,
    };

    fn layer() -> TileLayer {
        TileLayer::new("base".into(), TileLayerConfig::default()).unwrap()
    }

    #[test]
    fn test_defaults_come_from_config() {
        let layer = layer();

        assert_eq!(layer.layer_type(), LayerType::Tile);
        assert_eq!(layer.max_zoom(), Some(18.0));
        assert!(layer.attribution().unwrap().contains("OpenStreetMap"));
        assert_eq!(
            layer.tile_url(TileCoord::new(0, 0, 0)),
            "https://a.tile.openstreetmap.org/0/0/0.png"
        );
    }

    #[test]
    fn test_unknown_placeholder_is_config_error() {
        let config = TileLayerConfig {
            url_template: "https://tiles.example.com/{zoom}/{x}/{y}.png".into(),
            ..TileLayerConfig::default()
        };
        assert!(matches!(
            TileLayer::new("base".into(), config),
            Err(MapError::Config(_))
        ));
    }

    #[test]
    fn test_world_view_at_zoom_zero() {
        let layer = layer();
        let viewport = Viewport::new(LatLng::new(0.0, 0.0), 0.0, Point::new(256.0, 256.0));

        let tiles = layer.tiles_for_viewport(&viewport);
        assert_eq!(
            tiles,
            vec![TilePlacement {
                coord: TileCoord::new(0, 0, 0),
                column: 0
            }]
        );
    }

    #[test]
    fn test_columns_wrap_and_rows_are_skipped() {
        let layer = layer();
        // 1024 px wide at zoom 1 shows the 512 px world about twice across
        let viewport = Viewport::new(LatLng::new(0.0, 0.0), 1.0, Point::new(1024.0, 1024.0));

        let tiles = layer.tiles_for_viewport(&viewport);
        assert!(tiles.iter().all(|t| t.coord.y < 2 && t.coord.x < 2));
        assert!(tiles.iter().any(|t| t.column < 0));
        assert!(tiles.iter().any(|t| t.column > 1));
        assert_eq!(tiles.len(), 8);
    }

    #[test]
    fn test_fractional_zoom_rounds_to_layer_range() {
        let config = TileLayerConfig {
            min_zoom: 2,
            max_zoom: 10,
            ..TileLayerConfig::default()
        };
        let layer = TileLayer::new("base".into(), config).unwrap();

        assert_eq!(layer.tile_zoom(3.4), Some(3));
        assert_eq!(layer.tile_zoom(3.6), Some(4));
        assert_eq!(layer.tile_zoom(10.4), Some(10));
        assert_eq!(layer.tile_zoom(10.6), None);
        assert_eq!(layer.tile_zoom(1.0), None);
    }

    #[test]
    fn test_no_tiles_below_min_zoom() {
        let config = TileLayerConfig {
            min_zoom: 12,
            ..TileLayerConfig::default()
        };
        let mut layer = TileLayer::new("base".into(), config).unwrap();
        let viewport = Viewport::new(LatLng::new(0.0, 0.0), 2.0, Point::new(800.0, 600.0));

        layer.on_view_changed(&viewport).unwrap();
        assert!(layer.visible_tiles().is_empty());
        assert_eq!(layer.pending_count(), 0);

        let mut context = RenderContext::new(800, 600);
        layer.render(&mut context, &viewport).unwrap();
        assert!(context.drawing_queue().is_empty());
    }

    #[test]
    fn test_deepest_zoom_level_has_tiles() {
        let config = TileLayerConfig {
            max_zoom: crate::core::constants::MAX_ZOOM_LEVEL,
            ..TileLayerConfig::default()
        };
        let layer = TileLayer::new("base".into(), config).unwrap();
        let mut viewport = Viewport::new(LatLng::new(51.5, -0.09), 0.0, Point::new(256.0, 256.0));
        viewport.set_zoom_limits(0.0, 30.0);
        viewport.set_zoom(30.0);

        let tiles = layer.tiles_for_viewport(&viewport);
        assert!(!tiles.is_empty());
        assert!(tiles.iter().all(|t| t.coord.z == 30));
    }

    #[test]
    fn test_update_caches_arrivals_and_render_draws_them() {
        let mut layer = layer();
        let viewport = Viewport::new(LatLng::new(0.0, 0.0), 0.0, Point::new(256.0, 256.0));
        layer.on_view_changed(&viewport).unwrap();
        assert_eq!(layer.pending_count(), 0);

        let tx = layer.loader().sender();
        tx.send(TileResponse {
            coord: TileCoord::new(0, 0, 0),
            result: Ok(vec![1, 2, 3]),
        })
        .unwrap();
        tx.send(TileResponse {
            coord: TileCoord::new(1, 0, 1),
            result: Err(MapError::Layer("boom".into())),
        })
        .unwrap();
        layer.update().unwrap();

        assert_eq!(layer.cache().len(), 1);
        assert_eq!(layer.failed_count(), 1);

        let mut context = RenderContext::new(256, 256);
        layer.render(&mut context, &viewport).unwrap();
        match context.drawing_queue() {
            [DrawCommand::Tile { coord, bounds, .. }] => {
                assert_eq!(*coord, TileCoord::new(0, 0, 0));
                assert!(bounds.0.x.abs() < 1e-9 && bounds.0.y.abs() < 1e-9);
                assert!((bounds.1.x - 256.0).abs() < 1e-9);
            }
            other => panic!("unexpected commands: {other:?}"),
        }
    }
}
