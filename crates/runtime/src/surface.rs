//! Capabilities the controller needs from the rendering layer.
//!
//! The browser app implements these over `web-sys`; tests use an in-memory
//! fake. Element handles are cheap clones of a shared node, so mutating
//! methods take `&self`.

use foundation::bounds::Aabb2;
use persistence::TransformSnapshot;

pub trait DiagramElement: Clone {
    fn attr(&self, name: &str) -> Option<String>;
    fn set_attr(&self, name: &str, value: &str);
    /// `None` removes the property.
    fn set_style(&self, property: &str, value: Option<&str>);
    fn add_class(&self, class: &str);
    fn remove_class(&self, class: &str);
    /// Geometry bounding box in the element's user space.
    fn bbox(&self) -> Option<Aabb2>;
    /// First descendant matching `selector`.
    fn select_first(&self, selector: &str) -> Option<Self>;
}

pub trait DiagramDocument {
    type Element: DiagramElement;

    /// Every element matching a CSS selector, in document order.
    fn select_all(&self, selector: &str) -> Vec<Self::Element>;
}

/// Programmatic side of the pan/zoom behavior.
pub trait ZoomSurface {
    /// Moves the view to `transform` without reporting it as a user zoom,
    /// so it is never persisted back.
    fn apply_transform(&self, transform: TransformSnapshot);
}
