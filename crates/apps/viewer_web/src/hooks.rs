//! Forwards map events to the host page's `events` callbacks.

use std::cell::OnceCell;
use std::rc::Rc;

use js_sys::{Function, JSON, Reflect};
use runtime::{MapEvent, MapObserver};
use serde::Serialize;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::Element;

#[derive(Debug, Default)]
pub struct JsObserver {
    map_data: Option<Function>,
    values: Option<Function>,
    transform: Option<Function>,
    unit_clicked: Option<Function>,
    /// Filled once the controller has selected its units.
    units: Rc<OnceCell<Vec<Element>>>,
}

fn callback(events: &JsValue, name: &str) -> Option<Function> {
    if events.is_undefined() || events.is_null() {
        return None;
    }
    Reflect::get(events, &JsValue::from_str(name))
        .ok()?
        .dyn_into::<Function>()
        .ok()
}

fn to_js<T: Serialize>(value: &T) -> Option<JsValue> {
    let raw = serde_json::to_string(value).ok()?;
    JSON::parse(&raw).ok()
}

impl JsObserver {
    pub fn new(events: &JsValue, units: Rc<OnceCell<Vec<Element>>>) -> Self {
        Self {
            map_data: callback(events, "mapData"),
            values: callback(events, "values"),
            transform: callback(events, "transform"),
            unit_clicked: callback(events, "unitClicked"),
            units,
        }
    }

    fn call(f: &Option<Function>, arg: Option<JsValue>) {
        let (Some(f), Some(arg)) = (f, arg) else {
            return;
        };
        if let Err(err) = f.call1(&JsValue::NULL, &arg) {
            web_sys::console::warn_2(&JsValue::from_str("map event handler threw"), &err);
        }
    }
}

impl MapObserver for JsObserver {
    fn notify(&self, event: &MapEvent) {
        match event {
            MapEvent::MapData(snapshot) => Self::call(&self.map_data, to_js(snapshot)),
            MapEvent::Values(values) => Self::call(&self.values, to_js(values)),
            MapEvent::Transform(t) => Self::call(&self.transform, to_js(t)),
            MapEvent::UnitClicked(unit) => {
                let element = self
                    .units
                    .get()
                    .and_then(|units| units.get(unit.index()))
                    .map(|el| JsValue::from(el.clone()));
                Self::call(&self.unit_clicked, element);
            }
        }
    }
}
