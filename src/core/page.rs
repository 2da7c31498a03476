//! Mount points a map can be bound to

use crate::{core::geo::Point, prelude::HashMap, MapError, Result};
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

/// A named element of the page that can host one map
#[derive(Debug, Clone)]
pub struct MountPoint {
    id: String,
    size: Point,
    attached: Arc<AtomicBool>,
}

impl MountPoint {
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Size of the element in pixels
    pub fn size(&self) -> Point {
        self.size
    }

    /// Whether a map currently occupies this mount point
    pub fn is_attached(&self) -> bool {
        self.attached.load(Ordering::Acquire)
    }
}

/// Claim on a mount point held by the map occupying it.
///
/// Dropping the guard frees the mount, so a map that goes out of scope
/// releases its mount point.
#[derive(Debug)]
pub struct MountGuard {
    id: String,
    attached: Arc<AtomicBool>,
}

impl MountGuard {
    pub fn id(&self) -> &str {
        &self.id
    }
}

impl Drop for MountGuard {
    fn drop(&mut self) {
        self.attached.store(false, Ordering::Release);
    }
}

/// The set of mount points available to maps
#[derive(Debug, Default)]
pub struct Page {
    mounts: HashMap<String, MountPoint>,
}

impl Page {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or resizes a mount point. Resizing keeps its attachment state.
    pub fn add_mount(&mut self, id: impl Into<String>, width: f64, height: f64) -> &mut MountPoint {
        let id = id.into();
        let mount = self.mounts.entry(id.clone()).or_insert_with(|| MountPoint {
            id,
            size: Point::default(),
            attached: Arc::new(AtomicBool::new(false)),
        });
        mount.size = Point::new(width, height);
        mount
    }

    pub fn mount(&self, id: &str) -> Option<&MountPoint> {
        self.mounts.get(id)
    }

    /// Looks up a mount point that can take a new map
    pub fn available_mount(&self, id: &str) -> Result<&MountPoint> {
        let mount = self
            .mounts
            .get(id)
            .ok_or_else(|| MapError::MountNotFound(id.to_string()))?;
        if mount.is_attached() {
            return Err(MapError::MountInUse(id.to_string()));
        }
        Ok(mount)
    }

    /// Claims the mount point for a map until the returned guard is dropped
    pub(crate) fn attach(&self, id: &str) -> Result<MountGuard> {
        let mount = self
            .mounts
            .get(id)
            .ok_or_else(|| MapError::MountNotFound(id.to_string()))?;
        mount
            .attached
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| MapError::MountInUse(id.to_string()))?;
        Ok(MountGuard {
            id: mount.id.clone(),
            attached: mount.attached.clone(),
        })
    }

    /// Removes a mount point from the page entirely
    pub fn remove_mount(&mut self, id: &str) -> Option<MountPoint> {
        self.mounts.remove(id)
    }

    pub fn len(&self) -> usize {
        self.mounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mounts.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_mount() {
        let page = Page::new();
        assert!(matches!(
            page.available_mount("map-canvas"),
            Err(MapError::MountNotFound(id)) if id == "map-canvas"
        ));
    }

    #[test]
    fn test_dropping_guard_frees_mount() {
        let mut page = Page::new();
        page.add_mount("map-canvas", 640.0, 480.0);

        let guard = page.attach("map-canvas").unwrap();
        assert_eq!(guard.id(), "map-canvas");
        assert!(page.mount("map-canvas").unwrap().is_attached());
        assert!(matches!(page.attach("map-canvas"), Err(MapError::MountInUse(_))));
        assert!(matches!(
            page.available_mount("map-canvas"),
            Err(MapError::MountInUse(_))
        ));

        drop(guard);
        assert_eq!(
            page.available_mount("map-canvas").unwrap().size(),
            Point::new(640.0, 480.0)
        );
    }

    #[test]
    fn test_resize_keeps_attachment() {
        let mut page = Page::new();
        page.add_mount("map-canvas", 640.0, 480.0);
        let _guard = page.attach("map-canvas").unwrap();

        let mount = page.add_mount("map-canvas", 1024.0, 768.0);
        assert!(mount.is_attached());
        assert_eq!(mount.size(), Point::new(1024.0, 768.0));
        assert_eq!(page.len(), 1);
    }
}
