//! In-memory stand-ins for the browser surface, store and clock.

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::rc::Rc;

use foundation::bounds::Aabb2;
use foundation::time::Clock;
use persistence::{InMemoryStore, KvStore, StoreError, TransformSnapshot};

use crate::surface::{DiagramDocument, DiagramElement, ZoomSurface};

#[derive(Debug, Default)]
pub(crate) struct FakeNode {
    pub tag: String,
    pub classes: Vec<String>,
    pub attrs: BTreeMap<String, String>,
    pub styles: BTreeMap<String, String>,
    pub bbox: Option<Aabb2>,
    pub children: Vec<FakeElement>,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct FakeElement(pub Rc<RefCell<FakeNode>>);

impl FakeElement {
    pub fn new(tag: &str) -> Self {
        FakeElement(Rc::new(RefCell::new(FakeNode {
            tag: tag.to_string(),
            ..FakeNode::default()
        })))
    }

    pub fn with_class(self, class: &str) -> Self {
        self.add_class(class);
        self
    }

    pub fn with_attr(self, name: &str, value: &str) -> Self {
        self.set_attr(name, value);
        self
    }

    pub fn with_bbox(self, x: f64, y: f64, w: f64, h: f64) -> Self {
        self.0.borrow_mut().bbox = Some(Aabb2::from_rect(x, y, w, h));
        self
    }

    pub fn with_child(self, child: FakeElement) -> Self {
        self.0.borrow_mut().children.push(child);
        self
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.0.borrow().classes.iter().any(|c| c == class)
    }

    pub fn style(&self, property: &str) -> Option<String> {
        self.0.borrow().styles.get(property).cloned()
    }

    fn matches(&self, selector: &str) -> bool {
        selector
            .split(',')
            .map(str::trim)
            .any(|simple| self.matches_simple(simple))
    }

    fn matches_simple(&self, simple: &str) -> bool {
        let mut parts = simple.split('.');
        let tag = parts.next().unwrap_or_default();
        if !tag.is_empty() && tag != self.0.borrow().tag {
            return false;
        }
        parts.all(|class| self.has_class(class))
    }

    fn collect(&self, selector: &str, out: &mut Vec<FakeElement>) {
        for child in &self.0.borrow().children {
            if child.matches(selector) {
                out.push(child.clone());
            }
            child.collect(selector, out);
        }
    }
}

impl DiagramElement for FakeElement {
    fn attr(&self, name: &str) -> Option<String> {
        self.0.borrow().attrs.get(name).cloned()
    }

    fn set_attr(&self, name: &str, value: &str) {
        self.0
            .borrow_mut()
            .attrs
            .insert(name.to_string(), value.to_string());
    }

    fn set_style(&self, property: &str, value: Option<&str>) {
        let mut node = self.0.borrow_mut();
        match value {
            Some(v) => {
                node.styles.insert(property.to_string(), v.to_string());
            }
            None => {
                node.styles.remove(property);
            }
        }
    }

    fn add_class(&self, class: &str) {
        if !self.has_class(class) {
            self.0.borrow_mut().classes.push(class.to_string());
        }
    }

    fn remove_class(&self, class: &str) {
        self.0.borrow_mut().classes.retain(|c| c != class);
    }

    fn bbox(&self) -> Option<Aabb2> {
        self.0.borrow().bbox
    }

    fn select_first(&self, selector: &str) -> Option<Self> {
        let mut out = Vec::new();
        self.collect(selector, &mut out);
        out.into_iter().next()
    }
}

/// Root node; selection walks descendants in document order.
#[derive(Debug, Clone)]
pub(crate) struct FakeDocument {
    pub root: FakeElement,
}

impl FakeDocument {
    pub fn new(children: Vec<FakeElement>) -> Self {
        let root = FakeElement::new("svg");
        for child in children {
            root.0.borrow_mut().children.push(child);
        }
        Self { root }
    }
}

impl DiagramDocument for FakeDocument {
    type Element = FakeElement;

    fn select_all(&self, selector: &str) -> Vec<FakeElement> {
        let mut out = Vec::new();
        self.root.collect(selector, &mut out);
        out
    }
}

/// Records programmatic transforms.
#[derive(Debug, Clone, Default)]
pub(crate) struct FakeZoom {
    pub applied: Rc<RefCell<Vec<TransformSnapshot>>>,
}

impl FakeZoom {
    pub fn last(&self) -> Option<TransformSnapshot> {
        self.applied.borrow().last().copied()
    }
}

impl ZoomSurface for FakeZoom {
    fn apply_transform(&self, transform: TransformSnapshot) {
        self.applied.borrow_mut().push(transform);
    }
}

#[derive(Debug, Clone, Default)]
pub(crate) struct ManualClock {
    pub now: Rc<Cell<u64>>,
}

impl ManualClock {
    pub fn at(ms: u64) -> Self {
        Self {
            now: Rc::new(Cell::new(ms)),
        }
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u64 {
        self.now.get()
    }
}

/// Shared store that counts writes, to tell apart views that write back.
#[derive(Debug, Clone, Default)]
pub(crate) struct CountingStore {
    pub inner: InMemoryStore,
    pub writes: Rc<Cell<usize>>,
}

impl CountingStore {
    pub fn view(inner: &InMemoryStore) -> Self {
        Self {
            inner: inner.clone(),
            writes: Rc::default(),
        }
    }
}

impl KvStore for CountingStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.inner.get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.writes.set(self.writes.get() + 1);
        self.inner.set(key, value)
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.writes.set(self.writes.get() + 1);
        self.inner.remove(key)
    }
}

/// Installs a `RUST_LOG`-driven subscriber once per test binary.
pub(crate) fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
