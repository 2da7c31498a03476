use crate::{
    core::geo::{LatLng, Point, TileCoord},
    layers::vector::Color,
    MapError, Result,
};
use std::sync::Arc;

/// Resolved stroke and fill of a path, with layer opacity already applied
#[derive(Debug, Clone, PartialEq)]
pub struct PathRenderStyle {
    pub stroke_color: Color,
    pub stroke_width: f32,
    pub stroke_opacity: f32,
    /// `None` for unfilled paths
    pub fill_color: Option<Color>,
    pub fill_opacity: f32,
}

/// Commands that can be issued to the render context
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    Tile {
        coord: TileCoord,
        data: Arc<Vec<u8>>,
        bounds: (Point, Point), // min, max container coordinates
        opacity: f32,
    },
    Marker {
        position: Point,
        lat_lng: LatLng,
    },
    Circle {
        center: Point,
        radius: f64,
        style: PathRenderStyle,
    },
    Line {
        points: Vec<Point>,
        style: PathRenderStyle,
    },
    Polygon {
        exterior: Vec<Point>,
        holes: Vec<Vec<Point>>,
        style: PathRenderStyle,
    },
}

/// Headless render target: layers record draw commands for a frontend to paint
#[derive(Debug, Clone)]
pub struct RenderContext {
    pub width: u32,
    pub height: u32,
    drawing_queue: Vec<DrawCommand>,
}

impl RenderContext {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            drawing_queue: Vec::new(),
        }
    }

    /// Begin a frame
    pub fn begin_frame(&mut self) {
        self.drawing_queue.clear();
    }

    pub fn render_marker(&mut self, position: Point, lat_lng: LatLng) {
        self.drawing_queue
            .push(DrawCommand::Marker { position, lat_lng });
    }

    pub fn render_circle(&mut self, center: Point, radius: f64, style: &PathRenderStyle) {
        self.drawing_queue.push(DrawCommand::Circle {
            center,
            radius,
            style: style.clone(),
        });
    }

    /// Render a line with the given points and style
    pub fn render_line(&mut self, points: &[Point], style: &PathRenderStyle) {
        if points.len() < 2 {
            return;
        }
        self.drawing_queue.push(DrawCommand::Line {
            points: points.to_vec(),
            style: style.clone(),
        });
    }

    /// Render a polygon with exterior ring, holes, and style
    pub fn render_polygon(&mut self, exterior: &[Point], holes: &[Vec<Point>], style: &PathRenderStyle) {
        if exterior.len() < 3 {
            return;
        }
        self.drawing_queue.push(DrawCommand::Polygon {
            exterior: exterior.to_vec(),
            holes: holes.to_vec(),
            style: style.clone(),
        });
    }

    /// Queues a tile image; tiles entirely outside the canvas are dropped
    pub fn render_tile(
        &mut self,
        coord: TileCoord,
        data: Arc<Vec<u8>>,
        bounds: (Point, Point),
        opacity: f32,
    ) -> Result<()> {
        if bounds.0.x >= bounds.1.x || bounds.0.y >= bounds.1.y {
            return Err(MapError::Layer(format!("invalid bounds for tile {coord:?}")));
        }
        if !(0.0..=1.0).contains(&opacity) {
            return Err(MapError::Layer(format!("tile opacity {opacity} outside 0..=1")));
        }

        let outside = bounds.1.x <= 0.0
            || bounds.1.y <= 0.0
            || bounds.0.x >= self.width as f64
            || bounds.0.y >= self.height as f64;
        if !outside {
            self.drawing_queue.push(DrawCommand::Tile {
                coord,
                data,
                bounds,
                opacity,
            });
        }
        Ok(())
    }

    pub fn drawing_queue(&self) -> &[DrawCommand] {
        &self.drawing_queue
    }

    /// Hands the recorded commands to the caller, leaving the queue empty
    pub fn take_commands(&mut self) -> Vec<DrawCommand> {
        std::mem::take(&mut self.drawing_queue)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn style() -> PathRenderStyle {
        PathRenderStyle {
            stroke_color: Color::rgb(0x33, 0x88, 0xff),
            stroke_width: 3.0,
            stroke_opacity: 1.0,
            fill_color: None,
            fill_opacity: 0.2,
        }
    }

    #[test]
    fn test_begin_frame_clears_queue() {
        let mut context = RenderContext::new(256, 256);
        context.render_marker(Point::new(10.0, 10.0), LatLng::new(0.0, 0.0));
        assert_eq!(context.drawing_queue().len(), 1);

        context.begin_frame();
        assert!(context.drawing_queue().is_empty());
    }

    #[test]
    fn test_degenerate_paths_are_skipped() {
        let mut context = RenderContext::new(256, 256);
        context.render_line(&[Point::new(0.0, 0.0)], &style());
        context.render_polygon(&[Point::new(0.0, 0.0), Point::new(1.0, 1.0)], &[], &style());

        assert!(context.drawing_queue().is_empty());
    }

    #[test]
    fn test_tiles_outside_canvas_are_dropped() {
        let mut context = RenderContext::new(256, 256);
        let data = Arc::new(vec![1, 2, 3]);
        let coord = TileCoord::new(0, 0, 0);

        context
            .render_tile(coord, data.clone(), (Point::new(300.0, 0.0), Point::new(556.0, 256.0)), 1.0)
            .unwrap();
        assert!(context.drawing_queue().is_empty());

        context
            .render_tile(coord, data, (Point::new(-128.0, 0.0), Point::new(128.0, 256.0)), 1.0)
            .unwrap();
        assert_eq!(context.take_commands().len(), 1);
        assert!(context.drawing_queue().is_empty());
    }

    #[test]
    fn test_invalid_tile_bounds() {
        let mut context = RenderContext::new(256, 256);
        let result = context.render_tile(
            TileCoord::new(0, 0, 0),
            Arc::new(Vec::new()),
            (Point::new(10.0, 10.0), Point::new(0.0, 0.0)),
            1.0,
        );
        assert!(matches!(result, Err(MapError::Layer(_))));
    }
}
