use crate::{core::geo::TileCoord, tiles::source::TileSource, Result};
use crossbeam_channel::{unbounded, Receiver, Sender};
use std::sync::Arc;

/// Outcome of one tile download
#[derive(Debug)]
pub struct TileResponse {
    pub coord: TileCoord,
    pub result: Result<Vec<u8>>,
}

/// Fetches tiles as tokio tasks and reports them back over a channel.
///
/// Each request is a single attempt. Arrivals are collected with
/// [`TileLoader::drain`] from the owning thread.
pub struct TileLoader {
    source: Arc<dyn TileSource>,
    tx: Sender<TileResponse>,
    rx: Receiver<TileResponse>,
}

impl TileLoader {
    pub fn new(source: Arc<dyn TileSource>) -> Self {
        let (tx, rx) = unbounded();
        Self { source, tx, rx }
    }

    pub fn url(&self, coord: TileCoord) -> String {
        self.source.url(coord)
    }

    /// Starts downloading `coord`. Returns `false` when the request could not
    /// be started because no tokio runtime is running.
    #[cfg(feature = "tokio-runtime")]
    pub fn request(&self, coord: TileCoord) -> bool {
        let handle = match tokio::runtime::Handle::try_current() {
            Ok(handle) => handle,
            Err(_) => {
                log::debug!("no tokio runtime, skipping tile {:?}", coord);
                return false;
            }
        };

        let url = self.source.url(coord);
        let tx = self.tx.clone();
        handle.spawn(async move {
            log::debug!("fetch tile {:?} from {}", coord, url);
            let result = fetch_tile(&url).await;
            // The layer may be gone already; nobody is left to care then.
            let _ = tx.send(TileResponse { coord, result });
        });
        true
    }

    #[cfg(not(feature = "tokio-runtime"))]
    pub fn request(&self, coord: TileCoord) -> bool {
        log::debug!("built without tokio-runtime, skipping tile {:?}", coord);
        false
    }

    /// All responses that arrived since the last call, in arrival order
    pub fn drain(&self) -> Vec<TileResponse> {
        self.rx.try_iter().collect()
    }

    /// Sender side of the arrival channel, for feeding responses directly
    pub fn sender(&self) -> Sender<TileResponse> {
        self.tx.clone()
    }
}

#[cfg(feature = "tokio-runtime")]
async fn fetch_tile(url: &str) -> Result<Vec<u8>> {
    let client = crate::net::http_client()?;
    let response = client.get(url).send().await?.error_for_status()?;
    let bytes = response.bytes().await?;
    Ok(bytes.to_vec())
}
