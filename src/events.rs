//! Map events and listener dispatch

use crate::{
    core::geo::LatLng,
    prelude::HashMap,
};
use std::collections::VecDeque;

/// Events kept for [`EventManager::process_events`] before the oldest are dropped
pub const MAX_QUEUED_EVENTS: usize = 256;

/// Map event types that can be emitted by the map
#[derive(Debug, Clone, PartialEq)]
pub enum MapEvent {
    /// The view was set for the first time
    Load { center: LatLng, zoom: f64 },
    /// Map view has changed (center or zoom)
    ViewChanged { center: LatLng, zoom: f64 },
    /// Layer was added to the map
    LayerAdd { layer_id: String },
    /// Layer was removed from the map
    LayerRemove { layer_id: String },
}

impl MapEvent {
    /// Name listeners register under
    pub fn event_type(&self) -> &'static str {
        match self {
            MapEvent::Load { .. } => "load",
            MapEvent::ViewChanged { .. } => "viewchanged",
            MapEvent::LayerAdd { .. } => "layeradd",
            MapEvent::LayerRemove { .. } => "layerremove",
        }
    }
}

/// Event listener callback type
pub type EventCallback = Box<dyn Fn(&MapEvent) + Send + Sync>;

/// Event management system for the map
#[derive(Default)]
pub struct EventManager {
    /// Event listeners by event type
    listeners: HashMap<String, Vec<EventCallback>>,
    /// Event queue for processing
    event_queue: VecDeque<MapEvent>,
}

impl EventManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an event listener
    pub fn on<F>(&mut self, event_type: &str, callback: F)
    where
        F: Fn(&MapEvent) + Send + Sync + 'static,
    {
        self.listeners
            .entry(event_type.to_string())
            .or_default()
            .push(Box::new(callback));
    }

    /// Queues an event; once [`MAX_QUEUED_EVENTS`] are waiting the oldest is dropped
    pub fn emit(&mut self, event: MapEvent) {
        if self.event_queue.len() >= MAX_QUEUED_EVENTS {
            if let Some(dropped) = self.event_queue.pop_front() {
                log::trace!("event queue full, dropping {}", dropped.event_type());
            }
        }
        self.event_queue.push_back(event);
    }

    /// Dispatch all queued events to their listeners and return them
    pub fn process_events(&mut self) -> Vec<MapEvent> {
        let events: Vec<_> = self.event_queue.drain(..).collect();

        for event in &events {
            if let Some(callbacks) = self.listeners.get(event.event_type()) {
                for callback in callbacks {
                    callback(event);
                }
            }
        }

        events
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    };

    #[test]
    fn test_listeners_receive_matching_events() {
        let mut events = EventManager::new();
        let added = Arc::new(AtomicUsize::new(0));
        let counter = added.clone();
        events.on("layeradd", move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        events.emit(MapEvent::LayerAdd {
            layer_id: "tiles".into(),
        });
        events.emit(MapEvent::ViewChanged {
            center: LatLng::new(1.0, 2.0),
            zoom: 3.0,
        });
        let processed = events.process_events();
        assert_eq!(processed.len(), 2);
        assert_eq!(added.load(Ordering::SeqCst), 1);
        assert!(events.process_events().is_empty());
    }

    #[test]
    fn test_unprocessed_queue_is_capped() {
        let mut events = EventManager::new();
        for zoom in 0..(MAX_QUEUED_EVENTS + 10) {
            events.emit(MapEvent::ViewChanged {
                center: LatLng::new(0.0, 0.0),
                zoom: zoom as f64,
            });
        }

        let processed = events.process_events();
        assert_eq!(processed.len(), MAX_QUEUED_EVENTS);
        // The newest events survive
        assert_eq!(
            processed.last(),
            Some(&MapEvent::ViewChanged {
                center: LatLng::new(0.0, 0.0),
                zoom: (MAX_QUEUED_EVENTS + 9) as f64,
            })
        );
        assert_eq!(
            processed.first(),
            Some(&MapEvent::ViewChanged {
                center: LatLng::new(0.0, 0.0),
                zoom: 10.0,
            })
        );
    }
}
