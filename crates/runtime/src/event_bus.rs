use persistence::{MapDataSnapshot, TransformSnapshot, ValuesSnapshot};
use scene::UnitId;
use tracing::trace;

/// Notifications for the dashboard side. Fire-and-forget.
#[derive(Debug, Clone, PartialEq)]
pub enum MapEvent {
    MapData(MapDataSnapshot),
    Values(ValuesSnapshot),
    Transform(TransformSnapshot),
    /// A primary activation moved this unit from `initial` to `selected`.
    UnitClicked(UnitId),
}

impl MapEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            MapEvent::MapData(_) => "map-data",
            MapEvent::Values(_) => "values",
            MapEvent::Transform(_) => "transform",
            MapEvent::UnitClicked(_) => "unit-clicked",
        }
    }
}

pub trait MapObserver {
    fn notify(&self, event: &MapEvent);
}

impl<F> MapObserver for F
where
    F: Fn(&MapEvent),
{
    fn notify(&self, event: &MapEvent) {
        self(event)
    }
}

/// Synchronous fan-out to every subscribed observer, in subscription order.
#[derive(Default)]
pub struct EventBus {
    observers: Vec<Box<dyn MapObserver>>,
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("observers", &self.observers.len())
            .finish()
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self {
            observers: Vec::new(),
        }
    }

    pub fn subscribe(&mut self, observer: impl MapObserver + 'static) {
        self.observers.push(Box::new(observer));
    }

    pub fn observer_count(&self) -> usize {
        self.observers.len()
    }

    pub fn emit(&self, event: MapEvent) {
        trace!(kind = event.kind(), "map event");
        for observer in &self.observers {
            observer.notify(&event);
        }
    }
}
