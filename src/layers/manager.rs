use crate::{
    core::viewport::Viewport, layers::base::LayerTrait, prelude::HashMap,
    rendering::context::RenderContext, MapError, Result,
};

/// Manages layers for the map, handling ordering and rendering
pub struct LayerManager {
    /// All layers indexed by ID
    layers: HashMap<String, Box<dyn LayerTrait>>,
    /// Layer IDs sorted by z-index, insertion order among equal z-indices
    render_order: Vec<String>,
}

impl LayerManager {
    pub fn new() -> Self {
        Self {
            layers: HashMap::default(),
            render_order: Vec::new(),
        }
    }

    /// Adds a layer; ids must be unique
    pub fn add_layer(&mut self, layer: Box<dyn LayerTrait>) -> Result<()> {
        let layer_id = layer.id().to_string();
        if self.layers.contains_key(&layer_id) {
            return Err(MapError::Layer(format!("layer '{layer_id}' already exists")));
        }
        let z_index = layer.z_index();

        self.layers.insert(layer_id.clone(), layer);

        let insert_pos = self
            .render_order
            .iter()
            .position(|id| {
                self.layers
                    .get(id)
                    .map(|l| l.z_index() > z_index)
                    .unwrap_or(false)
            })
            .unwrap_or(self.render_order.len());

        self.render_order.insert(insert_pos, layer_id);
        Ok(())
    }

    pub fn remove_layer(&mut self, layer_id: &str) -> Option<Box<dyn LayerTrait>> {
        self.render_order.retain(|id| id != layer_id);
        self.layers.remove(layer_id)
    }

    pub fn get_layer(&self, layer_id: &str) -> Option<&dyn LayerTrait> {
        self.layers.get(layer_id).map(|l| l.as_ref())
    }

    /// Applies a function to a specific layer mutably
    pub fn with_layer_mut<F, R>(&mut self, layer_id: &str, f: F) -> Option<R>
    where
        F: FnOnce(&mut dyn LayerTrait) -> R,
    {
        self.layers.get_mut(layer_id).map(|layer| f(layer.as_mut()))
    }

    /// Layer IDs in render order
    pub fn list_layers(&self) -> Vec<String> {
        self.render_order.clone()
    }

    /// Applies a function to each layer in render order
    pub fn for_each_layer<F>(&self, mut f: F)
    where
        F: FnMut(&dyn LayerTrait),
    {
        for id in &self.render_order {
            if let Some(layer) = self.layers.get(id) {
                f(layer.as_ref());
            }
        }
    }

    /// Applies a fallible function to each layer in render order, stopping at the first error
    pub fn try_for_each_layer_mut<F>(&mut self, mut f: F) -> Result<()>
    where
        F: FnMut(&mut dyn LayerTrait) -> Result<()>,
    {
        for id in &self.render_order {
            if let Some(layer) = self.layers.get_mut(id) {
                f(layer.as_mut())?;
            }
        }
        Ok(())
    }

    /// Renders visible layers that intersect the viewport, bottom to top
    pub fn render(&mut self, context: &mut RenderContext, viewport: &Viewport) -> Result<()> {
        let viewport_bounds = viewport.bounds();

        for layer_id in &self.render_order {
            if let Some(layer) = self.layers.get_mut(layer_id) {
                if layer.is_visible() && layer.intersects_bounds(&viewport_bounds) {
                    layer.render(context, viewport)?;
                }
            }
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }
}

impl Default for LayerManager {
    fn default() -> Self {
        Self::new()
    }
}
