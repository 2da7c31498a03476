use crate::core::{
    bounds::Bounds,
    config::FitBoundsOptions,
    constants::{DEFAULT_MAX_ZOOM, DEFAULT_ZOOM_SNAP, EARTH_RADIUS, TILE_SIZE},
    geo::{LatLng, LatLngBounds, Point},
};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Manages the current view of the map: center, zoom, and screen dimensions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    /// The center of the map view in geographical coordinates
    pub center: LatLng,
    /// The current zoom level
    pub zoom: f64,
    /// The size of the viewport in pixels
    pub size: Point,
    /// The minimum allowed zoom level
    pub min_zoom: f64,
    /// The maximum allowed zoom level
    pub max_zoom: f64,
    /// Zoom levels computed from bounds snap down to multiples of this
    pub zoom_snap: f64,
}

impl Viewport {
    /// Creates a new viewport
    pub fn new(center: LatLng, zoom: f64, size: Point) -> Self {
        Self {
            center,
            zoom: zoom.clamp(0.0, DEFAULT_MAX_ZOOM),
            size,
            min_zoom: 0.0,
            max_zoom: DEFAULT_MAX_ZOOM,
            zoom_snap: DEFAULT_ZOOM_SNAP,
        }
    }

    /// Viewport of the given size with a world view at zoom 0
    pub fn with_size(size: Point) -> Self {
        Self::new(LatLng::default(), 0.0, size)
    }

    /// Sets the center of the viewport, clamping latitude to the projected world
    pub fn set_center(&mut self, center: LatLng) {
        self.center = LatLng::new(LatLng::clamp_lat(center.lat), center.lng);
    }

    /// Sets the zoom level, clamping to valid range
    pub fn set_zoom(&mut self, zoom: f64) {
        self.zoom = zoom.clamp(self.min_zoom, self.max_zoom);
    }

    /// Sets the viewport size
    pub fn set_size(&mut self, size: Point) {
        self.size = size;
    }

    /// Sets the zoom limits
    pub fn set_zoom_limits(&mut self, min_zoom: f64, max_zoom: f64) {
        self.min_zoom = min_zoom;
        self.max_zoom = max_zoom.max(min_zoom);
        self.zoom = self.zoom.clamp(self.min_zoom, self.max_zoom);
    }

    /// Projects a LatLng to world pixel coordinates (EPSG:3857) at the given zoom level
    pub fn project(&self, lat_lng: &LatLng, zoom: Option<f64>) -> Point {
        let z = zoom.unwrap_or(self.zoom);
        let scale = TILE_SIZE as f64 * 2_f64.powf(z);

        let lat = LatLng::clamp_lat(lat_lng.lat).to_radians();
        let x = lat_lng.lng.to_radians() * EARTH_RADIUS;
        let y = (PI / 4.0 + lat / 2.0).tan().ln() * EARTH_RADIUS;

        let world = 2.0 * PI * EARTH_RADIUS;
        Point::new((x / world + 0.5) * scale, (-y / world + 0.5) * scale)
    }

    /// Unprojects world pixel coordinates back to LatLng at the given zoom level
    pub fn unproject(&self, pixel: &Point, zoom: Option<f64>) -> LatLng {
        let z = zoom.unwrap_or(self.zoom);
        let scale = TILE_SIZE as f64 * 2_f64.powf(z);

        let world = 2.0 * PI * EARTH_RADIUS;
        let x = (pixel.x / scale - 0.5) * world;
        let y = (0.5 - pixel.y / scale) * world;

        let lng = (x / EARTH_RADIUS).to_degrees();
        let lat = (2.0 * (y / EARTH_RADIUS).exp().atan() - PI / 2.0).to_degrees();

        LatLng::new(lat, lng)
    }

    /// World pixel of the container's top-left corner
    pub fn pixel_origin(&self) -> Point {
        self.project(&self.center, None)
            .subtract(&self.size.divide(2.0))
    }

    /// World pixel bounds currently covered by the container
    pub fn pixel_bounds(&self) -> Bounds {
        Bounds::from_center_and_size(self.project(&self.center, None), self.size.x, self.size.y)
    }

    /// Converts a geographical coordinate to container pixel coordinates
    pub fn lat_lng_to_container_point(&self, lat_lng: &LatLng) -> Point {
        self.project(lat_lng, None).subtract(&self.pixel_origin())
    }

    /// Gets the current viewport bounds in geographical coordinates
    pub fn bounds(&self) -> LatLngBounds {
        let pixel_bounds = self.pixel_bounds();
        let nw = self.unproject(&pixel_bounds.min, None);
        let se = self.unproject(&pixel_bounds.max, None);

        LatLngBounds::from_coords(se.lat, nw.lng, nw.lat, se.lng)
    }

    /// Highest zoom at which `bounds` fits the container minus `padding` on every side.
    ///
    /// Zero-area bounds resolve to `max_zoom`, a container with no room left
    /// resolves to `min_zoom`.
    pub fn bounds_zoom(&self, bounds: &LatLngBounds, padding: f64) -> f64 {
        let available = self.size.subtract(&Point::new(2.0 * padding, 2.0 * padding));
        if available.x <= 0.0 || available.y <= 0.0 {
            return self.min_zoom;
        }

        let nw = self.project(&bounds.north_west(), None);
        let se = self.project(&bounds.south_east(), None);
        let bounds_size = Bounds::from_corners(nw, se).size();

        let scale = (available.x / bounds_size.x).min(available.y / bounds_size.y);
        let mut zoom = self.zoom + scale.log2();

        if self.zoom_snap > 0.0 {
            let fine = self.zoom_snap / 100.0;
            zoom = (zoom / fine).round() * fine;
            zoom = (zoom / self.zoom_snap).floor() * self.zoom_snap;
        }

        zoom.clamp(self.min_zoom, self.max_zoom)
    }

    /// Center and zoom that show `bounds` as large as possible
    pub fn bounds_center_zoom(
        &self,
        bounds: &LatLngBounds,
        options: &FitBoundsOptions,
    ) -> (LatLng, f64) {
        let mut zoom = self.bounds_zoom(bounds, options.padding);
        if let Some(max_zoom) = options.max_zoom {
            zoom = zoom.min(max_zoom);
        }

        let sw = self.project(&bounds.south_west, Some(zoom));
        let ne = self.project(&bounds.north_east, Some(zoom));
        let center = self.unproject(&sw.add(&ne).divide(2.0), Some(zoom));

        (center, zoom)
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::with_size(Point::new(800.0, 600.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fit_options() -> FitBoundsOptions {
        FitBoundsOptions {
            padding: 0.0,
            max_zoom: None,
        }
    }

    #[test]
    fn test_viewport_creation() {
        let viewport = Viewport::new(
            LatLng::new(40.7128, -74.0060),
            10.0,
            Point::new(800.0, 600.0),
        );

        assert_eq!(viewport.zoom, 10.0);
        assert_eq!(viewport.center.lat, 40.7128);
        assert_eq!(viewport.size.x, 800.0);
    }

    #[test]
    fn test_project_world_corners() {
        let viewport = Viewport::default();

        let origin = viewport.project(&LatLng::new(0.0, 0.0), Some(0.0));
        assert!((origin.x - 128.0).abs() < 1e-9);
        assert!((origin.y - 128.0).abs() < 1e-9);

        let west = viewport.project(&LatLng::new(0.0, -180.0), Some(1.0));
        assert!(west.x.abs() < 1e-9);
    }

    #[test]
    fn test_project_unproject_round_trip() {
        let viewport = Viewport::default();
        let london = LatLng::new(51.5, -0.09);
        let back = viewport.unproject(&viewport.project(&london, Some(12.0)), Some(12.0));

        assert!((back.lat - london.lat).abs() < 1e-9);
        assert!((back.lng - london.lng).abs() < 1e-9);
    }

    #[test]
    fn test_coordinate_conversion() {
        let viewport = Viewport::new(LatLng::new(0.0, 0.0), 1.0, Point::new(512.0, 512.0));

        let pixel = viewport.lat_lng_to_container_point(&LatLng::new(0.0, 0.0));
        assert!((pixel.x - 256.0).abs() < 1e-9);
        assert!((pixel.y - 256.0).abs() < 1e-9);
    }

    #[test]
    fn test_zoom_limits() {
        let mut viewport = Viewport::default();
        viewport.set_zoom_limits(2.0, 15.0);

        viewport.set_zoom(1.0);
        assert_eq!(viewport.zoom, 2.0);

        viewport.set_zoom(20.0);
        assert_eq!(viewport.zoom, 15.0);
    }

    #[test]
    fn test_point_bounds_zoom_is_max_zoom() {
        let viewport = Viewport::default();
        let point = LatLng::new(51.5, -0.09);
        let bounds = LatLngBounds::new(point, point);

        assert_eq!(viewport.bounds_zoom(&bounds, 20.0), DEFAULT_MAX_ZOOM);
    }

    #[test]
    fn test_whole_world_fits_at_low_zoom() {
        let viewport = Viewport::with_size(Point::new(512.0, 512.0));
        let world = LatLngBounds::from_coords(-85.0, -180.0, 85.0, 180.0);

        assert_eq!(viewport.bounds_zoom(&world, 0.0), 1.0);
    }

    #[test]
    fn test_no_room_left_uses_min_zoom() {
        let mut viewport = Viewport::with_size(Point::new(30.0, 30.0));
        viewport.set_zoom_limits(3.0, 18.0);
        let bounds = LatLngBounds::from_coords(10.0, 10.0, 11.0, 11.0);

        assert_eq!(viewport.bounds_zoom(&bounds, 20.0), 3.0);
    }

    #[test]
    fn test_fit_bounds_encloses_bounds() {
        let mut viewport = Viewport::with_size(Point::new(800.0, 600.0));
        let bounds = LatLngBounds::from_coords(51.503, -0.08, 51.51, -0.047);

        let (center, zoom) = viewport.bounds_center_zoom(&bounds, &fit_options());
        viewport.set_zoom(zoom);
        viewport.set_center(center);

        assert!(viewport.bounds().contains_bounds(&bounds));
        assert!(viewport.zoom > 10.0);
        assert_eq!(viewport.zoom, viewport.zoom.floor());
    }

    #[test]
    fn test_fit_bounds_respects_max_zoom_option() {
        let mut viewport = Viewport::default();
        let point = LatLng::new(48.8566, 2.3522);
        let options = FitBoundsOptions {
            padding: 0.0,
            max_zoom: Some(12.0),
        };

        let (center, zoom) = viewport.bounds_center_zoom(&LatLngBounds::new(point, point), &options);

        assert_eq!(zoom, 12.0);
        assert!((center.lat - point.lat).abs() < 1e-9);
        assert!((center.lng - point.lng).abs() < 1e-9);
    }
}
