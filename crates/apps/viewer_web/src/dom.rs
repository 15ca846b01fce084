//! `web-sys` implementation of the diagram surface.

use foundation::bounds::Aabb2;
use runtime::{DiagramDocument, DiagramElement};
use wasm_bindgen::JsCast;
use web_sys::{CssStyleDeclaration, Element, HtmlElement, SvgElement, SvgGraphicsElement};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebElement(pub Element);

impl WebElement {
    fn style(&self) -> Option<CssStyleDeclaration> {
        if let Some(el) = self.0.dyn_ref::<SvgElement>() {
            return Some(el.style());
        }
        self.0.dyn_ref::<HtmlElement>().map(HtmlElement::style)
    }
}

impl DiagramElement for WebElement {
    fn attr(&self, name: &str) -> Option<String> {
        self.0.get_attribute(name)
    }

    fn set_attr(&self, name: &str, value: &str) {
        let _ = self.0.set_attribute(name, value);
    }

    fn set_style(&self, property: &str, value: Option<&str>) {
        let Some(style) = self.style() else {
            return;
        };
        match value {
            Some(v) => {
                let _ = style.set_property(property, v);
            }
            None => {
                let _ = style.remove_property(property);
            }
        }
    }

    fn add_class(&self, class: &str) {
        let _ = self.0.class_list().add_1(class);
    }

    fn remove_class(&self, class: &str) {
        let _ = self.0.class_list().remove_1(class);
    }

    fn bbox(&self) -> Option<Aabb2> {
        // getBBox throws for elements that are not rendered.
        let rect = self.0.dyn_ref::<SvgGraphicsElement>()?.get_b_box().ok()?;
        Some(Aabb2::from_rect(
            f64::from(rect.x()),
            f64::from(rect.y()),
            f64::from(rect.width()),
            f64::from(rect.height()),
        ))
    }

    fn select_first(&self, selector: &str) -> Option<Self> {
        self.0.query_selector(selector).ok().flatten().map(WebElement)
    }
}

/// Selection scope rooted at the imported `<svg>`.
#[derive(Debug, Clone)]
pub struct WebDocument {
    root: Element,
}

impl WebDocument {
    pub fn new(root: Element) -> Self {
        Self { root }
    }
}

impl DiagramDocument for WebDocument {
    type Element = WebElement;

    fn select_all(&self, selector: &str) -> Vec<WebElement> {
        let Ok(list) = self.root.query_selector_all(selector) else {
            return Vec::new();
        };
        (0..list.length())
            .filter_map(|i| list.item(i))
            .filter_map(|node| node.dyn_into::<Element>().ok())
            .map(WebElement)
            .collect()
    }
}
