use crate::{
    core::{
        config::FitBoundsOptions,
        constants::{DEFAULT_MAX_ZOOM, MAX_ZOOM_LEVEL},
        geo::{LatLng, LatLngBounds, Point},
        page::{MountGuard, Page},
        viewport::Viewport,
    },
    events::{EventManager, MapEvent},
    layers::{base::LayerTrait, manager::LayerManager},
    rendering::context::RenderContext,
    MapError, Result,
};
use serde::{Deserialize, Serialize};

/// Map-wide options; zoom limits left unset are derived from the attached layers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapOptions {
    pub min_zoom: Option<f64>,
    pub max_zoom: Option<f64>,
    pub zoom_snap: f64,
}

impl Default for MapOptions {
    fn default() -> Self {
        Self {
            min_zoom: None,
            max_zoom: None,
            zoom_snap: crate::core::constants::DEFAULT_ZOOM_SNAP,
        }
    }
}

impl MapOptions {
    pub fn validate(&self) -> Result<()> {
        let zoom_range = 0.0..=MAX_ZOOM_LEVEL as f64;
        for (name, zoom) in [("map.min_zoom", self.min_zoom), ("map.max_zoom", self.max_zoom)] {
            if let Some(zoom) = zoom {
                if !zoom_range.contains(&zoom) {
                    return Err(MapError::Config(format!(
                        "{name} ({zoom}) must be within 0..={MAX_ZOOM_LEVEL}"
                    )));
                }
            }
        }
        if let (Some(min), Some(max)) = (self.min_zoom, self.max_zoom) {
            if min > max {
                return Err(MapError::Config(format!(
                    "map.min_zoom ({min}) exceeds map.max_zoom ({max})"
                )));
            }
        }
        if !self.zoom_snap.is_finite() || self.zoom_snap < 0.0 {
            return Err(MapError::Config("map.zoom_snap must be a non-negative number".into()));
        }
        Ok(())
    }
}

/// A map view bound to one mount point of a [`Page`].
///
/// The view starts out unset: it has no center or zoom until the first
/// [`Map::set_view`] or [`Map::fit_bounds`]. The map occupies its mount
/// point for as long as it lives; dropping it or calling [`Map::remove`]
/// frees the mount for another map.
pub struct Map {
    mount: MountGuard,
    viewport: Viewport,
    loaded: bool,
    layer_manager: LayerManager,
    event_manager: EventManager,
    options: MapOptions,
}

impl Map {
    /// Binds a new map to `mount_id`, taking the mount point's size.
    pub fn create(page: &mut Page, mount_id: &str, options: MapOptions) -> Result<Self> {
        options.validate()?;
        let size = page.available_mount(mount_id)?.size();
        let mount = page.attach(mount_id)?;

        let mut viewport = Viewport::with_size(size);
        viewport.zoom_snap = options.zoom_snap;

        let mut map = Self {
            mount,
            viewport,
            loaded: false,
            layer_manager: LayerManager::new(),
            event_manager: EventManager::new(),
            options,
        };
        map.update_zoom_levels();

        log::debug!("map bound to #{} ({}x{})", mount_id, size.x, size.y);
        Ok(map)
    }

    /// Tears the map down and frees its mount point
    pub fn remove(self) {
        log::debug!("map removed from #{}", self.mount_id());
    }

    pub fn mount_id(&self) -> &str {
        self.mount.id()
    }

    pub fn size(&self) -> Point {
        self.viewport.size
    }

    /// Whether a center and zoom have been set
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn center(&self) -> Result<LatLng> {
        self.ensure_loaded()?;
        Ok(self.viewport.center)
    }

    pub fn zoom(&self) -> Result<f64> {
        self.ensure_loaded()?;
        Ok(self.viewport.zoom)
    }

    /// Geographical bounds of the visible area
    pub fn bounds(&self) -> Result<LatLngBounds> {
        self.ensure_loaded()?;
        Ok(self.viewport.bounds())
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn options(&self) -> &MapOptions {
        &self.options
    }

    pub fn min_zoom(&self) -> f64 {
        self.viewport.min_zoom
    }

    pub fn max_zoom(&self) -> f64 {
        self.viewport.max_zoom
    }

    /// Sets center and zoom, clamping the zoom to the map's limits
    pub fn set_view(&mut self, center: LatLng, zoom: f64) -> Result<()> {
        if !center.is_finite() {
            return Err(MapError::InvalidCoordinates(format!(
                "view center {center:?} is not finite"
            )));
        }
        if !zoom.is_finite() {
            return Err(MapError::InvalidCoordinates(format!("zoom {zoom} is not finite")));
        }

        let was_loaded = self.loaded;
        let old_center = self.viewport.center;
        let old_zoom = self.viewport.zoom;

        self.viewport.set_zoom(zoom);
        self.viewport.set_center(center);
        self.loaded = true;

        let center = self.viewport.center;
        let zoom = self.viewport.zoom;
        if !was_loaded {
            log::debug!("#{} loaded at {:?} zoom {}", self.mount_id(), center, zoom);
            self.event_manager.emit(MapEvent::Load { center, zoom });
        } else if center != old_center || zoom != old_zoom {
            self.event_manager.emit(MapEvent::ViewChanged { center, zoom });
        } else {
            return Ok(());
        }

        self.notify_view_changed()
    }

    /// Sets the view so that `bounds` is as large as possible while fully visible
    pub fn fit_bounds(&mut self, bounds: &LatLngBounds, options: &FitBoundsOptions) -> Result<()> {
        if !bounds.is_valid() {
            return Err(MapError::InvalidBounds(format!("{bounds:?}")));
        }
        let (center, zoom) = self.viewport.bounds_center_zoom(bounds, options);
        self.set_view(center, zoom)
    }

    /// Re-reads the mount point size, e.g. after the page layout changed
    pub fn invalidate_size(&mut self, page: &Page) -> Result<()> {
        let mount = page
            .mount(self.mount_id())
            .ok_or_else(|| MapError::MountNotFound(self.mount_id().to_string()))?;
        if mount.size() == self.viewport.size {
            return Ok(());
        }

        self.viewport.set_size(mount.size());
        if self.loaded {
            self.notify_view_changed()?;
        }
        Ok(())
    }

    pub fn add_layer(&mut self, layer: Box<dyn LayerTrait>) -> Result<()> {
        let layer_id = layer.id().to_string();
        self.layer_manager.add_layer(layer)?;
        self.update_zoom_levels();

        if self.loaded {
            let viewport = &self.viewport;
            self.layer_manager
                .with_layer_mut(&layer_id, |layer| layer.on_view_changed(viewport))
                .transpose()?;
        }

        log::debug!("layer '{}' added to #{}", layer_id, self.mount_id());
        self.event_manager.emit(MapEvent::LayerAdd { layer_id });
        Ok(())
    }

    pub fn remove_layer(&mut self, layer_id: &str) -> Result<Option<Box<dyn LayerTrait>>> {
        let removed = self.layer_manager.remove_layer(layer_id);
        if removed.is_some() {
            self.update_zoom_levels();
            self.event_manager.emit(MapEvent::LayerRemove {
                layer_id: layer_id.to_string(),
            });
        }
        Ok(removed)
    }

    pub fn has_layer(&self, layer_id: &str) -> bool {
        self.layer_manager.get_layer(layer_id).is_some()
    }

    pub fn get_layer(&self, layer_id: &str) -> Option<&dyn LayerTrait> {
        self.layer_manager.get_layer(layer_id)
    }

    pub fn with_layer_mut<F, R>(&mut self, layer_id: &str, f: F) -> Option<R>
    where
        F: FnOnce(&mut dyn LayerTrait) -> R,
    {
        self.layer_manager.with_layer_mut(layer_id, f)
    }

    /// Layer ids in render order
    pub fn list_layers(&self) -> Vec<String> {
        self.layer_manager.list_layers()
    }

    /// Attribution strings of all visible layers, without duplicates
    pub fn attributions(&self) -> Vec<String> {
        let mut attributions: Vec<String> = Vec::new();
        self.layer_manager.for_each_layer(|layer| {
            if let Some(text) = layer.attribution() {
                if layer.is_visible() && !attributions.iter().any(|a| a == text) {
                    attributions.push(text.to_string());
                }
            }
        });
        attributions
    }

    /// Register an event listener
    pub fn on<F>(&mut self, event_type: &str, callback: F)
    where
        F: Fn(&MapEvent) + Send + Sync + 'static,
    {
        self.event_manager.on(event_type, callback);
    }

    /// Dispatches queued events to listeners and returns them
    pub fn process_events(&mut self) -> Vec<MapEvent> {
        self.event_manager.process_events()
    }

    /// Lets layers absorb asynchronous results such as downloaded tiles
    pub fn update(&mut self) -> Result<()> {
        self.layer_manager.try_for_each_layer_mut(|layer| layer.update())
    }

    /// Records the draw commands of every visible layer into `context`
    pub fn render(&mut self, context: &mut RenderContext) -> Result<()> {
        self.ensure_loaded()?;
        context.begin_frame();
        self.layer_manager.render(context, &self.viewport)
    }

    fn ensure_loaded(&self) -> Result<()> {
        if self.loaded {
            Ok(())
        } else {
            Err(MapError::ViewNotSet)
        }
    }

    fn notify_view_changed(&mut self) -> Result<()> {
        let viewport = &self.viewport;
        self.layer_manager
            .try_for_each_layer_mut(|layer| layer.on_view_changed(viewport))
    }

    /// Zoom limits come from the options, else from the widest range of the layers
    fn update_zoom_levels(&mut self) {
        let mut layer_min: Option<f64> = None;
        let mut layer_max: Option<f64> = None;
        self.layer_manager.for_each_layer(|layer| {
            if let Some(min) = layer.min_zoom() {
                layer_min = Some(layer_min.map_or(min, |m| m.min(min)));
            }
            if let Some(max) = layer.max_zoom() {
                layer_max = Some(layer_max.map_or(max, |m| m.max(max)));
            }
        });

        let min_zoom = self.options.min_zoom.or(layer_min).unwrap_or(0.0);
        let max_zoom = self.options.max_zoom.or(layer_max).unwrap_or(DEFAULT_MAX_ZOOM);
        self.viewport.set_zoom_limits(min_zoom, max_zoom);
    }
}
