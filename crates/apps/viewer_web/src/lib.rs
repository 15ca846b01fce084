use std::cell::{OnceCell, RefCell};
use std::rc::Rc;
use std::sync::OnceLock;

use foundation::time::SystemClock;
use gloo::events::EventListener;
use gloo::timers::callback::Interval;
use persistence::{InMemoryStore, KvStore, LocalStorageStore, StoreError};
use runtime::{BuildingTarget, EventBus, MapConfig, MapController};
use scene::{Interaction, UnitId, UnitState};
use wasm_bindgen::prelude::*;

mod dom;
mod hooks;
mod import;
mod pan_zoom;

use dom::{WebDocument, WebElement};
use hooks::JsObserver;
use import::MountError;
use pan_zoom::WebZoom;

static PANIC_HOOK_SET: OnceLock<()> = OnceLock::new();

/// `localStorage` when the page allows it, otherwise a per-view memory
/// store (no cross-view sync, but the map still works).
#[derive(Debug)]
enum ViewStore {
    Local(LocalStorageStore),
    Memory(InMemoryStore),
}

impl ViewStore {
    fn open() -> Self {
        match LocalStorageStore::new() {
            Ok(s) => ViewStore::Local(s),
            Err(err) => {
                web_sys::console::warn_1(&JsValue::from_str(&format!(
                    "localStorage unavailable ({err}); state will not be shared"
                )));
                ViewStore::Memory(InMemoryStore::new())
            }
        }
    }
}

impl KvStore for ViewStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        match self {
            ViewStore::Local(s) => s.get(key),
            ViewStore::Memory(s) => s.get(key),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        match self {
            ViewStore::Local(s) => s.set(key, value),
            ViewStore::Memory(s) => s.set(key, value),
        }
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        match self {
            ViewStore::Local(s) => s.remove(key),
            ViewStore::Memory(s) => s.remove(key),
        }
    }
}

type WebController = MapController<WebDocument, ViewStore, WebZoom, SystemClock>;
type SharedController = Rc<RefCell<WebController>>;

/// Runs `f` unless the controller is already borrowed further up the stack
/// (an event callback re-entering the map synchronously).
fn with_controller<R>(
    controller: &SharedController,
    f: impl FnOnce(&mut WebController) -> R,
) -> Option<R> {
    match controller.try_borrow_mut() {
        Ok(mut c) => Some(f(&mut c)),
        Err(_) => {
            web_sys::console::warn_1(&JsValue::from_str("map busy; nested event dropped"));
            None
        }
    }
}

fn init_panic_hook() {
    PANIC_HOOK_SET.get_or_init(|| {
        console_error_panic_hook::set_once();
    });
}

#[wasm_bindgen(start)]
pub fn start() -> Result<(), JsValue> {
    init_panic_hook();
    Ok(())
}

/// Handle returned to the host page. Dropping it (`free()`) detaches every
/// listener and stops polling.
#[wasm_bindgen]
pub struct MapHandle {
    svg: web_sys::Element,
    units: Vec<web_sys::Element>,
    controller: SharedController,
    _listeners: Vec<EventListener>,
    _poll: Interval,
}

#[wasm_bindgen]
impl MapHandle {
    pub fn svg(&self) -> web_sys::Element {
        self.svg.clone()
    }

    pub fn units(&self) -> js_sys::Array {
        self.units.iter().collect()
    }

    /// Current unit states as strings, in document order.
    pub fn states(&self) -> Result<js_sys::Array, JsValue> {
        let c = self
            .controller
            .try_borrow()
            .map_err(|_| JsValue::from_str("map busy"))?;
        Ok(c
            .states()
            .iter()
            .map(|s| JsValue::from_str(s.as_str()))
            .collect())
    }

    /// Sets one unit's state directly. This is the only way into
    /// `completed`.
    #[wasm_bindgen(js_name = setUnitState)]
    pub fn set_unit_state(&self, index: u32, state: &str) -> Result<(), JsValue> {
        let state: UnitState = serde_json::from_value(serde_json::Value::from(state))
            .map_err(|_| JsValue::from_str(&format!("unknown unit state {state:?}")))?;
        let outcome = with_controller(&self.controller, |c| {
            c.set_unit_state(UnitId(index), state).is_some()
        });
        set_state_outcome(outcome, index).map_err(|e| JsValue::from_str(&e))
    }
}

/// `None` means the controller was busy; `Some(false)` means no such unit.
fn set_state_outcome(outcome: Option<bool>, index: u32) -> Result<(), String> {
    match outcome {
        None => Err("map busy".to_string()),
        Some(false) => Err(format!("no unit at index {index}")),
        Some(true) => Ok(()),
    }
}

fn parse_config(config: &JsValue) -> Result<MapConfig, MountError> {
    if config.is_undefined() || config.is_null() {
        return Ok(MapConfig::default());
    }
    let raw = js_sys::JSON::stringify(config)
        .map_err(|e| MountError::Config(format!("{e:?}")))?
        .as_string()
        .unwrap_or_default();
    MapConfig::from_json(&raw).map_err(|e| MountError::Config(e.to_string()))
}

/// Loads the diagram at `asset_url` into the page and makes it interactive.
///
/// `events` may carry `mapData`, `values`, `transform` and `unitClicked`
/// callbacks; `config` is a partial map config.
#[wasm_bindgen(js_name = setupMap)]
pub async fn setup_map(
    asset_url: String,
    events: JsValue,
    config: JsValue,
) -> Result<MapHandle, JsValue> {
    init_panic_hook();
    match mount(&asset_url, &events, &config).await {
        Ok(handle) => Ok(handle),
        Err(err) => {
            web_sys::console::error_1(&JsValue::from_str(&format!("setupMap failed: {err}")));
            Err(err.into())
        }
    }
}

async fn mount(
    asset_url: &str,
    events: &JsValue,
    config: &JsValue,
) -> Result<MapHandle, MountError> {
    let config = parse_config(config)?;
    let window = web_sys::window().ok_or(MountError::NoWindow)?;
    let diagram = import::import_diagram(&window, asset_url, &config).await?;

    let zoom = WebZoom::new(diagram.svg.clone(), diagram.content.clone(), config.scale_extent);
    let unit_cell: Rc<OnceCell<Vec<web_sys::Element>>> = Rc::default();
    let mut bus = EventBus::new();
    bus.subscribe(JsObserver::new(events, unit_cell.clone()));

    let poll_interval_ms = config.poll_interval_ms;
    let controller = MapController::mount(
        WebDocument::new(diagram.svg.clone()),
        ViewStore::open(),
        zoom.clone(),
        SystemClock,
        bus,
        config,
    );
    let units: Vec<web_sys::Element> = controller.units().iter().map(|u| u.0.clone()).collect();
    let buildings: Vec<BuildingTarget<WebElement>> = controller.buildings().to_vec();
    let _ = unit_cell.set(units.clone());
    let controller: SharedController = Rc::new(RefCell::new(controller));

    let shared = controller.clone();
    let mut listeners = zoom.bind(move |t| {
        with_controller(&shared, |c| c.user_zoomed(t));
    });
    listeners.extend(bind_units(&units, &controller, &zoom));
    listeners.extend(bind_buildings(&buildings, &controller, &zoom));

    let shared = controller.clone();
    let poll = Interval::new(poll_interval_ms, move || {
        with_controller(&shared, |c| c.poll());
    });

    Ok(MapHandle {
        svg: diagram.svg,
        units,
        controller,
        _listeners: listeners,
        _poll: poll,
    })
}

fn dispatch(controller: &SharedController, zoom: &WebZoom, interaction: Interaction) {
    if zoom.take_suppressed_click() {
        return;
    }
    with_controller(controller, |c| c.handle(&interaction));
}

fn bind_units(
    units: &[web_sys::Element],
    controller: &SharedController,
    zoom: &WebZoom,
) -> Vec<EventListener> {
    let mut out = Vec::with_capacity(units.len() * 2);
    for (idx, el) in units.iter().enumerate() {
        let unit = UnitId::from_index(idx);

        let (c, z) = (controller.clone(), zoom.clone());
        out.push(EventListener::new(el, "click", move |event| {
            event.stop_propagation();
            dispatch(&c, &z, Interaction::PrimaryActivate(unit));
        }));

        let (c, z) = (controller.clone(), zoom.clone());
        out.push(EventListener::new(el, "dblclick", move |event| {
            event.stop_propagation();
            dispatch(&c, &z, Interaction::SecondaryActivate(unit));
        }));
    }
    out
}

fn bind_buildings(
    buildings: &[BuildingTarget<WebElement>],
    controller: &SharedController,
    zoom: &WebZoom,
) -> Vec<EventListener> {
    buildings
        .iter()
        .filter_map(|b| Some((b.element.0.clone(), b.id.clone()?)))
        .map(|(el, id)| {
            let (c, z) = (controller.clone(), zoom.clone());
            EventListener::new(&el, "click", move |event| {
                event.stop_propagation();
                dispatch(&c, &z, Interaction::BulkToggle(id.clone()));
            })
        })
        .collect()
}
