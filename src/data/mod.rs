pub mod geojson;
pub mod recent;
