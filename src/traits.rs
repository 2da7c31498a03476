//! Shared trait abstractions for common patterns
//!
//! Layers implement these so the map and the layer manager can treat them
//! uniformly.

use crate::{
    core::{geo::LatLngBounds, viewport::Viewport},
    layers::base::LayerType,
    rendering::context::RenderContext,
    Result,
};

/// Trait for layer-like objects attached to a map
pub trait LayerOperations: Send + Sync {
    /// Get layer ID
    fn id(&self) -> &str;

    /// Get layer name
    fn name(&self) -> &str;

    /// Get layer type
    fn layer_type(&self) -> LayerType;

    /// Check if layer is visible
    fn is_visible(&self) -> bool;

    /// Set layer visibility
    fn set_visible(&mut self, visible: bool);

    /// Get layer opacity (0.0 to 1.0)
    fn opacity(&self) -> f32;

    /// Set layer opacity
    fn set_opacity(&mut self, opacity: f32);

    /// Get layer z-index for ordering
    fn z_index(&self) -> i32;

    /// Set layer z-index
    fn set_z_index(&mut self, z_index: i32);

    /// Render the layer
    fn render(&mut self, context: &mut RenderContext, viewport: &Viewport) -> Result<()>;

    /// Called whenever the map view moves or zooms
    fn on_view_changed(&mut self, _viewport: &Viewport) -> Result<()> {
        Ok(())
    }

    /// Update layer state, e.g. collect finished downloads
    fn update(&mut self) -> Result<()> {
        Ok(())
    }

    /// Get layer bounds if applicable
    fn bounds(&self) -> Option<LatLngBounds> {
        None
    }

    /// Check if layer intersects with given bounds
    fn intersects_bounds(&self, bounds: &LatLngBounds) -> bool {
        if let Some(layer_bounds) = self.bounds() {
            layer_bounds.intersects(bounds)
        } else {
            true
        }
    }

    /// Lowest zoom level this layer can display
    fn min_zoom(&self) -> Option<f64> {
        None
    }

    /// Highest zoom level this layer can display
    fn max_zoom(&self) -> Option<f64> {
        None
    }

    /// Attribution text shown for this layer
    fn attribution(&self) -> Option<&str> {
        None
    }

    /// Get layer options
    fn options(&self) -> serde_json::Value;

    /// Dynamic casting support
    fn as_any(&self) -> &dyn std::any::Any;
    fn as_any_mut(&mut self) -> &mut dyn std::any::Any;
}
