//! GeoJSON parsing and the overlay layer built from it

use crate::{
    core::{
        constants::OVERLAY_Z_INDEX,
        geo::{LatLng, LatLngBounds},
        viewport::Viewport,
    },
    layers::{
        base::{LayerTrait, LayerType},
        vector::{Color, PathStyle, VectorFeature, VectorLayer, VectorShape},
    },
    rendering::context::RenderContext,
    MapError, Result,
};
use serde::Deserialize;
use serde_json::{Map as JsonMap, Value};
use std::str::FromStr;

/// A parsed geometry with positions as [`LatLng`]
#[derive(Debug, Clone, PartialEq)]
pub enum GeoJsonGeometry {
    Point(LatLng),
    MultiPoint(Vec<LatLng>),
    LineString(Vec<LatLng>),
    MultiLineString(Vec<Vec<LatLng>>),
    /// Exterior ring first, then holes
    Polygon(Vec<Vec<LatLng>>),
    MultiPolygon(Vec<Vec<Vec<LatLng>>>),
    GeometryCollection(Vec<GeoJsonGeometry>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct GeoJsonFeature {
    pub id: Option<Value>,
    /// `None` for features with a null geometry
    pub geometry: Option<GeoJsonGeometry>,
    pub properties: JsonMap<String, Value>,
}

/// A GeoJSON document
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "RawDocument")]
pub enum GeoJson {
    FeatureCollection(Vec<GeoJsonFeature>),
    Feature(GeoJsonFeature),
    Geometry(GeoJsonGeometry),
}

impl GeoJson {
    /// Features of the document; a bare geometry has none
    pub fn features(&self) -> Vec<&GeoJsonFeature> {
        match self {
            GeoJson::FeatureCollection(features) => features.iter().collect(),
            GeoJson::Feature(feature) => vec![feature],
            GeoJson::Geometry(_) => Vec::new(),
        }
    }

    /// Every geometry paired with the properties of its feature
    pub fn geometries(&self) -> Vec<(&GeoJsonGeometry, Option<&JsonMap<String, Value>>)> {
        match self {
            GeoJson::Geometry(geometry) => vec![(geometry, None)],
            _ => self
                .features()
                .into_iter()
                .filter_map(|f| f.geometry.as_ref().map(|g| (g, Some(&f.properties))))
                .collect(),
        }
    }

    /// Minimal box over every position, `None` if there is none
    pub fn bounds(&self) -> Option<LatLngBounds> {
        self.geometries()
            .into_iter()
            .flat_map(|(geometry, _)| geometry.to_shapes())
            .filter_map(|shape| shape.bounds())
            .reduce(|a, b| a.union(&b))
    }
}

impl FromStr for GeoJson {
    type Err = MapError;

    fn from_str(s: &str) -> Result<Self> {
        let raw: RawDocument =
            serde_json::from_str(s).map_err(|e| MapError::InvalidGeoJson(e.to_string()))?;
        GeoJson::try_from(raw)
    }
}

impl TryFrom<Value> for GeoJsonGeometry {
    type Error = MapError;

    fn try_from(value: Value) -> Result<Self> {
        let raw: RawGeometry =
            serde_json::from_value(value).map_err(|e| MapError::InvalidGeoJson(e.to_string()))?;
        GeoJsonGeometry::try_from(raw)
    }
}

impl GeoJsonGeometry {
    /// Vector shapes drawing this geometry; collections are flattened
    pub fn to_shapes(&self) -> Vec<VectorShape> {
        match self {
            GeoJsonGeometry::Point(position) => vec![VectorShape::Marker { position: *position }],
            GeoJsonGeometry::MultiPoint(points) => points
                .iter()
                .map(|p| VectorShape::Marker { position: *p })
                .collect(),
            GeoJsonGeometry::LineString(line) => vec![VectorShape::Polyline {
                lines: vec![line.clone()],
            }],
            GeoJsonGeometry::MultiLineString(lines) => vec![VectorShape::Polyline {
                lines: lines.clone(),
            }],
            GeoJsonGeometry::Polygon(rings) => vec![VectorShape::Polygon {
                polygons: vec![rings.clone()],
            }],
            GeoJsonGeometry::MultiPolygon(polygons) => vec![VectorShape::Polygon {
                polygons: polygons.clone(),
            }],
            GeoJsonGeometry::GeometryCollection(geometries) => {
                geometries.iter().flat_map(GeoJsonGeometry::to_shapes).collect()
            }
        }
    }
}

/// Positions as they appear on the wire: `[lng, lat]` or `[lng, lat, alt]`
type Position = Vec<f64>;

#[derive(Deserialize)]
#[serde(tag = "type")]
enum RawGeometry {
    Point { coordinates: Position },
    MultiPoint { coordinates: Vec<Position> },
    LineString { coordinates: Vec<Position> },
    MultiLineString { coordinates: Vec<Vec<Position>> },
    Polygon { coordinates: Vec<Vec<Position>> },
    MultiPolygon { coordinates: Vec<Vec<Vec<Position>>> },
    GeometryCollection { geometries: Vec<RawGeometry> },
}

#[derive(Deserialize)]
struct RawFeature {
    #[serde(default)]
    id: Option<Value>,
    #[serde(default)]
    geometry: Option<RawGeometry>,
    #[serde(default)]
    properties: Option<JsonMap<String, Value>>,
}

#[derive(Deserialize)]
#[serde(tag = "type")]
enum RawFeatures {
    FeatureCollection { features: Vec<RawFeature> },
    Feature(RawFeature),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawDocument {
    Features(RawFeatures),
    Geometry(RawGeometry),
}

impl TryFrom<RawDocument> for GeoJson {
    type Error = MapError;

    fn try_from(raw: RawDocument) -> Result<Self> {
        Ok(match raw {
            RawDocument::Features(RawFeatures::FeatureCollection { features }) => {
                GeoJson::FeatureCollection(
                    features
                        .into_iter()
                        .map(GeoJsonFeature::try_from)
                        .collect::<Result<_>>()?,
                )
            }
            RawDocument::Features(RawFeatures::Feature(feature)) => {
                GeoJson::Feature(feature.try_into()?)
            }
            RawDocument::Geometry(geometry) => GeoJson::Geometry(geometry.try_into()?),
        })
    }
}

impl TryFrom<RawFeature> for GeoJsonFeature {
    type Error = MapError;

    fn try_from(raw: RawFeature) -> Result<Self> {
        Ok(GeoJsonFeature {
            id: raw.id,
            geometry: raw.geometry.map(GeoJsonGeometry::try_from).transpose()?,
            properties: raw.properties.unwrap_or_default(),
        })
    }
}

impl TryFrom<RawGeometry> for GeoJsonGeometry {
    type Error = MapError;

    fn try_from(raw: RawGeometry) -> Result<Self> {
        Ok(match raw {
            RawGeometry::Point { coordinates } => GeoJsonGeometry::Point(position(coordinates)?),
            RawGeometry::MultiPoint { coordinates } => {
                GeoJsonGeometry::MultiPoint(positions(coordinates)?)
            }
            RawGeometry::LineString { coordinates } => {
                GeoJsonGeometry::LineString(positions(coordinates)?)
            }
            RawGeometry::MultiLineString { coordinates } => GeoJsonGeometry::MultiLineString(
                coordinates.into_iter().map(positions).collect::<Result<_>>()?,
            ),
            RawGeometry::Polygon { coordinates } => GeoJsonGeometry::Polygon(rings(coordinates)?),
            RawGeometry::MultiPolygon { coordinates } => GeoJsonGeometry::MultiPolygon(
                coordinates.into_iter().map(rings).collect::<Result<_>>()?,
            ),
            RawGeometry::GeometryCollection { geometries } => GeoJsonGeometry::GeometryCollection(
                geometries
                    .into_iter()
                    .map(GeoJsonGeometry::try_from)
                    .collect::<Result<_>>()?,
            ),
        })
    }
}

/// Altitude is ignored
fn position(values: Position) -> Result<LatLng> {
    match values[..] {
        [lng, lat, ..] if lng.is_finite() && lat.is_finite() => Ok(LatLng::new(lat, lng)),
        _ => Err(MapError::InvalidCoordinates(format!("bad position {values:?}"))),
    }
}

fn positions(values: Vec<Position>) -> Result<Vec<LatLng>> {
    values.into_iter().map(position).collect()
}

/// Polygon rings, without a closing position that repeats the first
fn rings(values: Vec<Vec<Position>>) -> Result<Vec<Vec<LatLng>>> {
    values
        .into_iter()
        .map(|ring| {
            let mut ring = positions(ring)?;
            if ring.len() > 1 && ring.first() == ring.last() {
                ring.pop();
            }
            Ok(ring)
        })
        .collect()
}

/// Applies simplestyle properties (`stroke`, `stroke-width`, `stroke-opacity`,
/// `fill`, `fill-opacity`) on top of `base`
pub fn feature_style(base: &PathStyle, properties: Option<&JsonMap<String, Value>>) -> PathStyle {
    let mut style = base.clone();
    let Some(properties) = properties else {
        return style;
    };

    let color = |key: &str| {
        let text = properties.get(key)?.as_str()?;
        match Color::from_hex(text) {
            Ok(color) => Some(color),
            Err(err) => {
                log::debug!("ignoring {}: {}", key, err);
                None
            }
        }
    };
    let number = |key: &str| properties.get(key).and_then(Value::as_f64);

    if let Some(stroke) = color("stroke") {
        style.color = stroke;
    }
    if let Some(width) = number("stroke-width") {
        style.weight = width as f32;
    }
    if let Some(opacity) = number("stroke-opacity") {
        style.opacity = opacity.clamp(0.0, 1.0) as f32;
    }
    if let Some(fill) = color("fill") {
        style.fill_color = Some(fill);
    }
    if let Some(opacity) = number("fill-opacity") {
        style.fill_opacity = opacity.clamp(0.0, 1.0) as f32;
    }
    style
}

/// Overlay drawing a GeoJSON document as markers, polylines and polygons
pub struct GeoJsonLayer {
    inner: VectorLayer,
    feature_count: usize,
}

impl GeoJsonLayer {
    pub fn new(id: String, geojson: &GeoJson, style: &PathStyle) -> Self {
        let mut inner = VectorLayer::with_layer_type(id, "GeoJSON".to_string(), LayerType::GeoJson);
        inner.properties.z_index = OVERLAY_Z_INDEX;
        inner.set_default_style(style.clone());

        let geometries = geojson.geometries();
        for (geometry, properties) in &geometries {
            let feature_style = feature_style(style, *properties);
            let properties = properties.map_or(Value::Null, |p| Value::Object(p.clone()));
            for shape in geometry.to_shapes() {
                inner.add_feature(
                    VectorFeature::new(shape, feature_style.clone()).with_properties(properties.clone()),
                );
            }
        }

        log::debug!(
            "GeoJSON overlay with {} shapes from {} geometries",
            inner.feature_count(),
            geometries.len()
        );
        Self {
            inner,
            feature_count: geometries.len(),
        }
    }

    /// Parses `text` and builds the layer with the default path style
    pub fn from_str(id: String, text: &str) -> Result<Self> {
        let geojson: GeoJson = text.parse()?;
        Ok(Self::new(id, &geojson, &PathStyle::default()))
    }

    /// Minimal box over every shape, `None` for an empty overlay
    pub fn bounds(&self) -> Option<LatLngBounds> {
        self.inner.layer_bounds()
    }

    pub fn shape_count(&self) -> usize {
        self.inner.feature_count()
    }

    /// Number of features (or bare geometries) that had a geometry
    pub fn feature_count(&self) -> usize {
        self.feature_count
    }

    pub fn is_empty(&self) -> bool {
        self.inner.feature_count() == 0
    }

    pub fn shapes(&self) -> &[VectorFeature] {
        self.inner.features()
    }
}

impl LayerTrait for GeoJsonLayer {
    crate::impl_layer_trait!(GeoJsonLayer, inner.properties);

    fn bounds(&self) -> Option<LatLngBounds> {
        self.inner.layer_bounds()
    }

    fn render(&mut self, context: &mut RenderContext, viewport: &Viewport) -> Result<()> {
        self.inner.render(context, viewport)
    }

    fn options(&self) -> serde_json::Value {
        let mut options = self.inner.options();
        options["geojson_features"] = self.feature_count.into();
        options
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const POINT: &str = r#"{"type":"FeatureCollection","features":[
        {"type":"Feature","geometry":{"type":"Point","coordinates":[-0.09,51.5]},"properties":{}}
    ]}"#;

    #[test]
    fn test_geojson_parsing() {
        let geojson: GeoJson = POINT.parse().unwrap();
        let features = geojson.features();

        assert_eq!(features.len(), 1);
        assert_eq!(
            features[0].geometry,
            Some(GeoJsonGeometry::Point(LatLng::new(51.5, -0.09)))
        );
    }

    #[test]
    fn test_deserialize_through_serde() {
        let geojson: GeoJson = serde_json::from_str(POINT).unwrap();
        assert_eq!(geojson.features().len(), 1);

        let bad: std::result::Result<GeoJson, _> = serde_json::from_str(r#"{"type":"Nope"}"#);
        assert!(bad.is_err());
    }

    #[test]
    fn test_bounds_calculation() {
        let geojson: GeoJson = r#"{"type":"FeatureCollection","features":[
            {"type":"Feature","geometry":{"type":"Point","coordinates":[-74.0060,40.7128]},"properties":null},
            {"type":"Feature","geometry":{"type":"Point","coordinates":[-73.9857,40.7489,12.0]}}
        ]}"#
        .parse()
        .unwrap();

        let bounds = geojson.bounds().unwrap();
        assert_eq!(bounds.south_west, LatLng::new(40.7128, -74.0060));
        assert_eq!(bounds.north_east, LatLng::new(40.7489, -73.9857));
    }

    #[test]
    fn test_null_geometry_is_skipped() {
        let geojson: GeoJson = r#"{"type":"FeatureCollection","features":[
            {"type":"Feature","geometry":null,"properties":{"name":"nowhere"}}
        ]}"#
        .parse()
        .unwrap();

        assert_eq!(geojson.features().len(), 1);
        assert!(geojson.bounds().is_none());
        let layer = GeoJsonLayer::new("overlay".into(), &geojson, &PathStyle::default());
        assert!(layer.is_empty());
    }

    #[test]
    fn test_polygon_closing_position_is_dropped() {
        let geometry: GeoJsonGeometry = serde_json::json!({
            "type": "Polygon",
            "coordinates": [
                [[0.0, 0.0], [10.0, 0.0], [10.0, 10.0], [0.0, 10.0], [0.0, 0.0]],
                [[2.0, 2.0], [4.0, 2.0], [4.0, 4.0], [2.0, 2.0]]
            ]
        })
        .try_into()
        .unwrap();

        match geometry {
            GeoJsonGeometry::Polygon(rings) => {
                assert_eq!(rings.len(), 2);
                assert_eq!(rings[0].len(), 4);
                assert_eq!(rings[1].len(), 3);
            }
            other => panic!("unexpected geometry {other:?}"),
        }
    }

    #[test]
    fn test_geometry_collection_is_flattened() {
        let geometry: GeoJsonGeometry = serde_json::json!({
            "type": "GeometryCollection",
            "geometries": [
                { "type": "MultiPoint", "coordinates": [[1.0, 1.0], [2.0, 2.0]] },
                { "type": "LineString", "coordinates": [[0.0, 0.0], [5.0, 5.0]] }
            ]
        })
        .try_into()
        .unwrap();

        let shapes = geometry.to_shapes();
        assert_eq!(shapes.len(), 3);
        assert!(matches!(shapes[2], VectorShape::Polyline { .. }));
    }

    #[test]
    fn test_malformed_documents() {
        assert!(matches!(
            "not json".parse::<GeoJson>(),
            Err(MapError::InvalidGeoJson(_))
        ));
        assert!(matches!(
            r#"{"type":"FeatureCollection"}"#.parse::<GeoJson>(),
            Err(MapError::InvalidGeoJson(_))
        ));
        assert!(matches!(
            r#"{"type":"Circle","coordinates":[0,0]}"#.parse::<GeoJson>(),
            Err(MapError::InvalidGeoJson(_))
        ));
        assert!(matches!(
            r#"{"type":"Point","coordinates":[0]}"#.parse::<GeoJson>(),
            Err(MapError::InvalidCoordinates(_))
        ));
        assert!(matches!(
            r#"{"type":"LineString","coordinates":[[0,0],[1]]}"#.parse::<GeoJson>(),
            Err(MapError::InvalidCoordinates(_))
        ));
        assert!(matches!(
            r#"{"type":"LineString","coordinates":[[0,0],["a",1]]}"#.parse::<GeoJson>(),
            Err(MapError::InvalidGeoJson(_))
        ));
        assert!(matches!(
            r#"{"type":"Feature","geometry":{"type":"Polygon","coordinates":[[[0,0],[1,0],[1]]]}}"#
                .parse::<GeoJson>(),
            Err(MapError::InvalidCoordinates(_))
        ));
    }

    #[test]
    fn test_simplestyle_overrides() {
        let geojson: GeoJson = r##"{"type":"Feature",
            "geometry":{"type":"LineString","coordinates":[[0,0],[1,1]]},
            "properties":{"stroke":"#ff0000","stroke-width":5,"fill-opacity":0.5,"fill":"bogus"}}"##
            .parse()
            .unwrap();

        let layer = GeoJsonLayer::new("overlay".into(), &geojson, &PathStyle::default());
        let style = &layer.shapes()[0].style;

        assert_eq!(style.color, Color::rgb(255, 0, 0));
        assert_eq!(style.weight, 5.0);
        assert_eq!(style.fill_opacity, 0.5);
        assert_eq!(style.fill_color, None);
        assert_eq!(style.opacity, 1.0);
    }

    #[test]
    fn test_layer_counts_shapes() {
        let layer = GeoJsonLayer::from_str("overlay".into(), POINT).unwrap();

        assert_eq!(layer.shape_count(), 1);
        assert_eq!(layer.feature_count(), 1);
        assert_eq!(layer.layer_type(), LayerType::GeoJson);
        assert_eq!(layer.z_index(), OVERLAY_Z_INDEX);
        assert_eq!(
            layer.bounds(),
            Some(LatLngBounds::new(LatLng::new(51.5, -0.09), LatLng::new(51.5, -0.09)))
        );
    }
}
