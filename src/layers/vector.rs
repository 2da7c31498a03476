use crate::{
    core::{
        constants::MEAN_EARTH_RADIUS,
        geo::{LatLng, LatLngBounds, Point},
        viewport::Viewport,
    },
    layers::base::{LayerProperties, LayerTrait, LayerType},
    rendering::context::{PathRenderStyle, RenderContext},
    MapError, Result,
};
use geo::BoundingRect;
use geo_types::{Coord, Geometry, LineString, MultiLineString, MultiPolygon};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// RGBA color, serialized as a CSS hex string (`#3388ff`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Parses `#rgb`, `#rrggbb` or `#rrggbbaa`, the leading `#` is optional
    pub fn from_hex(hex: &str) -> Result<Self> {
        let digits = hex.trim().trim_start_matches('#');
        let invalid = || MapError::Config(format!("invalid color '{hex}'"));
        if !digits.is_ascii() {
            return Err(invalid());
        }
        let channel = |s: &str| u8::from_str_radix(s, 16).map_err(|_| invalid());

        match digits.len() {
            3 => {
                let expand = |i: usize| channel(&digits[i..=i].repeat(2));
                Ok(Self::rgb(expand(0)?, expand(1)?, expand(2)?))
            }
            6 | 8 => {
                let a = if digits.len() == 8 { channel(&digits[6..8])? } else { 255 };
                Ok(Self::new(
                    channel(&digits[0..2])?,
                    channel(&digits[2..4])?,
                    channel(&digits[4..6])?,
                    a,
                ))
            }
            _ => Err(invalid()),
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)?;
        if self.a != 255 {
            write!(f, "{:02x}", self.a)?;
        }
        Ok(())
    }
}

impl FromStr for Color {
    type Err = MapError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_hex(s)
    }
}

impl TryFrom<String> for Color {
    type Error = MapError;

    fn try_from(value: String) -> Result<Self> {
        Self::from_hex(&value)
    }
}

impl From<Color> for String {
    fn from(color: Color) -> Self {
        color.to_string()
    }
}

/// Stroke and fill options of a vector path
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathStyle {
    /// Draw the outline
    pub stroke: bool,
    pub color: Color,
    /// Stroke width in pixels
    pub weight: f32,
    pub opacity: f32,
    /// Fill closed shapes (polygons and circles)
    pub fill: bool,
    /// Defaults to `color`
    pub fill_color: Option<Color>,
    pub fill_opacity: f32,
}

impl Default for PathStyle {
    fn default() -> Self {
        Self {
            stroke: true,
            color: Color::rgb(0x33, 0x88, 0xff),
            weight: 3.0,
            opacity: 1.0,
            fill: true,
            fill_color: None,
            fill_opacity: 0.2,
        }
    }
}

impl PathStyle {
    /// Resolves the style for drawing; open paths are never filled
    pub fn to_render_style(&self, opacity_multiplier: f32, closed: bool) -> PathRenderStyle {
        PathRenderStyle {
            stroke_color: self.color,
            stroke_width: if self.stroke { self.weight } else { 0.0 },
            stroke_opacity: if self.stroke {
                self.opacity * opacity_multiplier
            } else {
                0.0
            },
            fill_color: (closed && self.fill).then(|| self.fill_color.unwrap_or(self.color)),
            fill_opacity: self.fill_opacity * opacity_multiplier,
        }
    }
}

/// Geometry drawn by a vector layer
#[derive(Debug, Clone, PartialEq)]
pub enum VectorShape {
    Marker {
        position: LatLng,
    },
    /// Circle with a radius in metres
    Circle {
        center: LatLng,
        radius_m: f64,
    },
    /// One or more line strings
    Polyline {
        lines: Vec<Vec<LatLng>>,
    },
    /// One or more polygons, each an exterior ring followed by its holes
    Polygon {
        polygons: Vec<Vec<Vec<LatLng>>>,
    },
}

impl VectorShape {
    /// Bounding box, `None` for shapes without coordinates
    pub fn bounds(&self) -> Option<LatLngBounds> {
        match self {
            VectorShape::Marker { position } => Some(LatLngBounds::new(*position, *position)),
            VectorShape::Circle { center, radius_m } => {
                let (lat_r, lng_r) = circle_extent(center, *radius_m);
                Some(LatLngBounds::from_coords(
                    center.lat - lat_r,
                    center.lng - lng_r,
                    center.lat + lat_r,
                    center.lng + lng_r,
                ))
            }
            VectorShape::Polyline { .. } | VectorShape::Polygon { .. } => {
                let rect = self.to_geometry()?.bounding_rect()?;
                Some(LatLngBounds::from_coords(
                    rect.min().y,
                    rect.min().x,
                    rect.max().y,
                    rect.max().x,
                ))
            }
        }
    }

    /// The shape as a `geo_types` geometry with x = longitude, y = latitude
    pub fn to_geometry(&self) -> Option<Geometry<f64>> {
        match self {
            VectorShape::Marker { position } => Some(Geometry::Point(coord(position).into())),
            VectorShape::Circle { .. } => None,
            VectorShape::Polyline { lines } => Some(Geometry::MultiLineString(MultiLineString(
                lines.iter().map(|line| line_string(line)).collect(),
            ))),
            VectorShape::Polygon { polygons } => Some(Geometry::MultiPolygon(MultiPolygon(
                polygons
                    .iter()
                    .filter_map(|rings| {
                        let (exterior, holes) = rings.split_first()?;
                        Some(geo_types::Polygon::new(
                            line_string(exterior),
                            holes.iter().map(|hole| line_string(hole)).collect(),
                        ))
                    })
                    .collect(),
            ))),
        }
    }

    pub fn is_closed(&self) -> bool {
        matches!(self, VectorShape::Circle { .. } | VectorShape::Polygon { .. })
    }
}

fn coord(lat_lng: &LatLng) -> Coord<f64> {
    Coord {
        x: lat_lng.lng,
        y: lat_lng.lat,
    }
}

fn line_string(points: &[LatLng]) -> LineString<f64> {
    LineString(points.iter().map(coord).collect())
}

/// Latitude and longitude half-extents of a circle, in degrees
fn circle_extent(center: &LatLng, radius_m: f64) -> (f64, f64) {
    let lat_r = (radius_m / MEAN_EARTH_RADIUS).to_degrees();
    let cos_lat = center.lat.to_radians().cos();
    let lng_r = if cos_lat.abs() < f64::EPSILON {
        180.0
    } else {
        (lat_r / cos_lat).abs().min(180.0)
    };
    (lat_r, lng_r)
}

/// A shape with its style and the properties it came with
#[derive(Debug, Clone, PartialEq)]
pub struct VectorFeature {
    pub shape: VectorShape,
    pub style: PathStyle,
    pub properties: serde_json::Value,
    bounds: Option<LatLngBounds>,
}

impl VectorFeature {
    pub fn new(shape: VectorShape, style: PathStyle) -> Self {
        let bounds = shape.bounds();
        Self {
            shape,
            style,
            properties: serde_json::Value::Null,
            bounds,
        }
    }

    pub fn with_properties(mut self, properties: serde_json::Value) -> Self {
        self.properties = properties;
        self
    }

    pub fn bounds(&self) -> Option<LatLngBounds> {
        self.bounds
    }
}

/// Vector layer for markers, circles, polylines and polygons
pub struct VectorLayer {
    pub(crate) properties: LayerProperties,
    features: Vec<VectorFeature>,
    default_style: PathStyle,
    bounds: Option<LatLngBounds>,
}

impl VectorLayer {
    pub fn new(id: String, name: String) -> Self {
        Self::with_layer_type(id, name, LayerType::Vector)
    }

    pub(crate) fn with_layer_type(id: String, name: String, layer_type: LayerType) -> Self {
        Self {
            properties: LayerProperties::new(id, name, layer_type),
            features: Vec::new(),
            default_style: PathStyle::default(),
            bounds: None,
        }
    }

    /// Style given to shapes added through [`VectorLayer::add_shape`]
    pub fn set_default_style(&mut self, style: PathStyle) {
        self.default_style = style;
    }

    pub fn default_style(&self) -> &PathStyle {
        &self.default_style
    }

    pub fn add_shape(&mut self, shape: VectorShape) {
        let style = self.default_style.clone();
        self.add_feature(VectorFeature::new(shape, style));
    }

    pub fn add_feature(&mut self, feature: VectorFeature) {
        if let Some(feature_bounds) = feature.bounds() {
            self.bounds = Some(match self.bounds {
                Some(bounds) => bounds.union(&feature_bounds),
                None => feature_bounds,
            });
        }
        self.features.push(feature);
    }

    pub fn features(&self) -> &[VectorFeature] {
        &self.features
    }

    pub fn feature_count(&self) -> usize {
        self.features.len()
    }

    pub fn clear(&mut self) {
        self.features.clear();
        self.bounds = None;
    }

    /// Bounds of all features, `None` while the layer has none
    pub fn layer_bounds(&self) -> Option<LatLngBounds> {
        self.bounds
    }

    fn render_feature(&self, context: &mut RenderContext, viewport: &Viewport, feature: &VectorFeature) {
        let opacity = self.properties.opacity;
        let to_screen = |p: &LatLng| viewport.lat_lng_to_container_point(p);

        match &feature.shape {
            VectorShape::Marker { position } => {
                context.render_marker(to_screen(position), *position);
            }
            VectorShape::Circle { center, radius_m } => {
                let (lat_r, _) = circle_extent(center, *radius_m);
                let top = LatLng::new(center.lat + lat_r, center.lng);
                let center_px = to_screen(center);
                let radius_px = (center_px.y - to_screen(&top).y).abs();
                context.render_circle(center_px, radius_px, &feature.style.to_render_style(opacity, true));
            }
            VectorShape::Polyline { lines } => {
                let style = feature.style.to_render_style(opacity, false);
                for line in lines {
                    let points: Vec<Point> = line.iter().map(to_screen).collect();
                    context.render_line(&points, &style);
                }
            }
            VectorShape::Polygon { polygons } => {
                let style = feature.style.to_render_style(opacity, true);
                for rings in polygons {
                    if let Some((exterior, holes)) = rings.split_first() {
                        let exterior: Vec<Point> = exterior.iter().map(to_screen).collect();
                        let holes: Vec<Vec<Point>> = holes
                            .iter()
                            .map(|hole| hole.iter().map(to_screen).collect())
                            .collect();
                        context.render_polygon(&exterior, &holes, &style);
                    }
                }
            }
        }
    }
}

impl LayerTrait for VectorLayer {
    crate::impl_layer_trait!(VectorLayer, properties);

    fn bounds(&self) -> Option<LatLngBounds> {
        self.bounds
    }

    fn render(&mut self, context: &mut RenderContext, viewport: &Viewport) -> Result<()> {
        let view_bounds = viewport.bounds();
        for feature in &self.features {
            let visible = feature
                .bounds()
                .map_or(false, |bounds| bounds.intersects(&view_bounds));
            if visible {
                self.render_feature(context, viewport, feature);
            }
        }
        Ok(())
    }

    fn options(&self) -> serde_json::Value {
        let mut options = self.properties.to_json();
        options["feature_count"] = self.features.len().into();
        options
    }
}
