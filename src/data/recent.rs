//! Recent device locations drawn as accuracy circles

use crate::{
    core::{
        config::RecentLocationsConfig,
        constants::{OVERLAY_Z_INDEX, RECENT_LAYER_ID},
        geo::LatLng,
        map::Map,
    },
    layers::{
        base::LayerTrait,
        vector::{VectorLayer, VectorShape},
    },
    Result,
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

/// One reported position. Accepts both `{lat, lng, accuracy}` and
/// `{latitude, longitude, accuracy, timestamp}`.
///
/// Servers omit zero-valued fields, so a missing coordinate reads as 0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationRecord {
    #[serde(default, alias = "latitude")]
    pub lat: f64,
    #[serde(default, alias = "longitude")]
    pub lng: f64,
    /// Radius of uncertainty in metres
    #[serde(default)]
    pub accuracy: f64,
    /// Unix seconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
}

impl LocationRecord {
    pub fn new(lat: f64, lng: f64, accuracy: f64) -> Self {
        Self {
            lat,
            lng,
            accuracy,
            timestamp: None,
        }
    }

    pub fn position(&self) -> LatLng {
        LatLng::new(self.lat, self.lng)
    }

    pub fn is_valid(&self) -> bool {
        let position = self.position();
        position.is_finite() && position.is_valid()
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RecentPayload {
    Wrapped { data: Vec<Value> },
    Bare(Vec<Value>),
}

/// Parses a bare record array or a `{"data": [...]}` wrapper.
///
/// Records that do not deserialize are skipped with a warning.
pub fn parse_records(text: &str) -> Result<Vec<LocationRecord>> {
    let values = match serde_json::from_str(text)? {
        RecentPayload::Wrapped { data } => data,
        RecentPayload::Bare(values) => values,
    };
    let records = values
        .into_iter()
        .filter_map(|value| match serde_json::from_value(value) {
            Ok(record) => Some(record),
            Err(err) => {
                log::warn!("skipping malformed location record: {}", err);
                None
            }
        })
        .collect();
    Ok(records)
}

/// Filter sent as the JSON body of a POST to an Orion-style locations
/// endpoint. Unset fields are left to the server's defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocationQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    /// Unix seconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp_start: Option<i64>,
    /// Unix seconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp_end: Option<i64>,
}

/// Anything that can produce the recent location records
#[async_trait]
pub trait LocationSource: Send + Sync {
    async fn fetch(&self) -> Result<Vec<LocationRecord>>;
}

/// Fetches records on the shared HTTP client: a GET by default, a POST
/// with a JSON body once a [`LocationQuery`] is set
#[derive(Debug, Clone)]
pub struct HttpLocationSource {
    url: String,
    timeout: Duration,
    query: Option<LocationQuery>,
}

impl HttpLocationSource {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            timeout: Duration::from_secs(30),
            query: None,
        }
    }

    pub fn from_config(config: &RecentLocationsConfig) -> Self {
        let source = Self::new(config.url.clone())
            .with_timeout(Duration::from_secs(config.request_timeout_secs));
        match &config.query {
            Some(query) => source.with_query(query.clone()),
            None => source,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Switches to POSTing `query`
    pub fn with_query(mut self, query: LocationQuery) -> Self {
        self.query = Some(query);
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn query(&self) -> Option<&LocationQuery> {
        self.query.as_ref()
    }
}

#[async_trait]
impl LocationSource for HttpLocationSource {
    async fn fetch(&self) -> Result<Vec<LocationRecord>> {
        let client = crate::net::http_client()?;
        let request = match &self.query {
            Some(query) => client.post(&self.url).json(query),
            None => client.get(&self.url),
        };
        let response = request
            .timeout(self.timeout)
            .send()
            .await?
            .error_for_status()?;
        let text = response.text().await?;
        let records = parse_records(&text)?;
        log::debug!("fetched {} recent locations from {}", records.len(), self.url);
        Ok(records)
    }
}

/// One circle per valid record, sized by its accuracy
pub fn recent_locations_layer(records: &[LocationRecord], config: &RecentLocationsConfig) -> VectorLayer {
    let mut layer = VectorLayer::new(RECENT_LAYER_ID.to_string(), "Recent locations".to_string());
    layer.set_z_index(OVERLAY_Z_INDEX + 1);
    layer.set_default_style(config.style.clone());

    for record in records {
        if !record.is_valid() {
            log::warn!("skipping location with invalid coordinates: {:?}", record);
            continue;
        }
        let radius_m = if record.accuracy > 0.0 {
            record.accuracy
        } else {
            config.default_radius_m
        };
        layer.add_shape(VectorShape::Circle {
            center: record.position(),
            radius_m,
        });
    }
    layer
}

/// Adds the recent locations layer to `map` without touching its view.
/// Returns the number of circles drawn.
pub fn add_recent_locations(
    map: &mut Map,
    records: &[LocationRecord],
    config: &RecentLocationsConfig,
) -> Result<usize> {
    let layer = recent_locations_layer(records, config);
    let count = layer.feature_count();
    if map.has_layer(RECENT_LAYER_ID) {
        map.remove_layer(RECENT_LAYER_ID)?;
    }
    map.add_layer(Box::new(layer))?;
    log::info!("showing {} recent locations", count);
    Ok(count)
}

#[cfg(feature = "tokio-runtime")]
pub use spawn::{spawn_recent_locations, RecentLocationsHandle};

#[cfg(feature = "tokio-runtime")]
mod spawn {
    use super::{LocationRecord, LocationSource};
    use crate::{MapError, Result};
    use futures::future::{abortable, AbortHandle, Aborted};
    use tokio::task::JoinHandle;

    /// A background fetch of recent locations.
    ///
    /// Dropping the handle abandons the fetch.
    pub struct RecentLocationsHandle {
        abort: AbortHandle,
        task: Option<JoinHandle<std::result::Result<Option<Vec<LocationRecord>>, Aborted>>>,
    }

    impl RecentLocationsHandle {
        /// Abandons the fetch; `join` then yields `None`
        pub fn abort(&self) {
            self.abort.abort();
        }

        pub fn is_finished(&self) -> bool {
            self.task.as_ref().map_or(true, |task| task.is_finished())
        }

        /// Waits for the records. `None` if the fetch failed or was aborted.
        pub async fn join(mut self) -> Option<Vec<LocationRecord>> {
            let task = self.task.take()?;
            match task.await {
                Ok(Ok(records)) => records,
                Ok(Err(Aborted)) => {
                    log::debug!("recent locations fetch aborted");
                    None
                }
                Err(err) => {
                    log::error!("recent locations task failed: {}", err);
                    None
                }
            }
        }
    }

    impl Drop for RecentLocationsHandle {
        fn drop(&mut self) {
            self.abort.abort();
        }
    }

    /// Runs `source.fetch()` on the current tokio runtime
    pub fn spawn_recent_locations<S>(source: S) -> Result<RecentLocationsHandle>
    where
        S: LocationSource + 'static,
    {
        let runtime = tokio::runtime::Handle::try_current().map_err(|_| {
            MapError::Config("fetching recent locations needs a running tokio runtime".into())
        })?;

        let (fetch, abort) = abortable(async move {
            match source.fetch().await {
                Ok(records) => Some(records),
                Err(err) => {
                    log::error!("fetching: {}", err);
                    None
                }
            }
        });

        Ok(RecentLocationsHandle {
            abort,
            task: Some(runtime.spawn(fetch)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layers::base::LayerTrait;

    #[test]
    fn test_parses_both_payload_shapes() {
        let bare = parse_records(r#"[{"lat": 51.5, "lng": -0.09, "accuracy": 25}]"#).unwrap();
        let wrapped = parse_records(
            r#"{"data": [{"latitude": 51.5, "longitude": -0.09, "accuracy": 25, "timestamp": 1700000000}]}"#,
        )
        .unwrap();

        assert_eq!(bare[0].position(), wrapped[0].position());
        assert_eq!(bare[0].accuracy, 25.0);
        assert_eq!(bare[0].timestamp, None);
        assert_eq!(wrapped[0].timestamp, Some(1_700_000_000));
    }

    #[test]
    fn test_omitted_coordinates_read_as_zero() {
        let records = parse_records(
            r#"{"data":[{"accuracy":5,"timestamp":1700000000,"latitude":51.48},{"longitude":-0.09}]}"#,
        )
        .unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].position(), LatLng::new(51.48, 0.0));
        assert_eq!(records[1].position(), LatLng::new(0.0, -0.09));
        assert_eq!(records[1].accuracy, 0.0);
    }

    #[test]
    fn test_malformed_records_are_skipped() {
        let records = parse_records(
            r#"[{"lat":"north","lng":1.0},{"lat":10.0,"lng":20.0,"accuracy":3},42]"#,
        )
        .unwrap();

        assert_eq!(records, vec![LocationRecord::new(10.0, 20.0, 3.0)]);
    }

    #[test]
    fn test_query_omits_unset_fields() {
        let query = LocationQuery {
            limit: Some(50),
            timestamp_start: Some(1_700_000_000),
            ..LocationQuery::default()
        };

        assert_eq!(
            serde_json::to_value(&query).unwrap(),
            serde_json::json!({"limit": 50, "timestamp_start": 1_700_000_000})
        );
        let source = HttpLocationSource::new("http://localhost/api/locations").with_query(query.clone());
        assert_eq!(source.query(), Some(&query));
    }

    #[test]
    fn test_rejects_other_payloads() {
        assert!(parse_records(r#"{"locations": []}"#).is_err());
        assert!(parse_records("oops").is_err());
    }

    #[test]
    fn test_layer_has_one_circle_per_valid_record() {
        let records = vec![
            LocationRecord::new(51.5, -0.09, 30.0),
            LocationRecord::new(51.6, -0.1, 0.0),
            LocationRecord::new(123.0, 0.0, 5.0),
        ];
        let config = RecentLocationsConfig::default();

        let layer = recent_locations_layer(&records, &config);

        assert_eq!(layer.id(), RECENT_LAYER_ID);
        assert_eq!(layer.feature_count(), 2);
        let radii: Vec<f64> = layer
            .features()
            .iter()
            .map(|f| match f.shape {
                VectorShape::Circle { radius_m, .. } => radius_m,
                _ => panic!("expected a circle"),
            })
            .collect();
        assert_eq!(radii, vec![30.0, config.default_radius_m]);
        assert_eq!(layer.features()[0].style, config.style);
    }
}
