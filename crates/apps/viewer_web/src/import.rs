//! Fetches the diagram asset and grafts it into the page.

use gloo_net::http::Request;
use runtime::MapConfig;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{DomParser, Element, SupportedType, Window};

const SVG_NS: &str = "http://www.w3.org/2000/svg";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MountError {
    NoWindow,
    Config(String),
    Fetch(String),
    Status(u16),
    Parse(String),
    MissingContainer(String),
    Dom(String),
}

impl std::fmt::Display for MountError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MountError::NoWindow => write!(f, "no window"),
            MountError::Config(msg) => write!(f, "{msg}"),
            MountError::Fetch(msg) => write!(f, "diagram fetch failed: {msg}"),
            MountError::Status(code) => write!(f, "diagram fetch failed: HTTP {code}"),
            MountError::Parse(msg) => write!(f, "diagram parse failed: {msg}"),
            MountError::MissingContainer(sel) => write!(f, "missing container {sel}"),
            MountError::Dom(msg) => write!(f, "dom error: {msg}"),
        }
    }
}

impl std::error::Error for MountError {}

impl From<MountError> for JsValue {
    fn from(err: MountError) -> Self {
        JsValue::from_str(&err.to_string())
    }
}

fn dom_err(err: JsValue) -> MountError {
    MountError::Dom(format!("{err:?}"))
}

/// The grafted diagram: root `<svg>` and the group that carries the
/// pan/zoom transform.
#[derive(Debug, Clone)]
pub struct Diagram {
    pub svg: Element,
    pub content: Element,
}

pub async fn import_diagram(
    window: &Window,
    asset_url: &str,
    config: &MapConfig,
) -> Result<Diagram, MountError> {
    let resp = Request::get(asset_url)
        .send()
        .await
        .map_err(|e| MountError::Fetch(e.to_string()))?;
    if !resp.ok() {
        return Err(MountError::Status(resp.status()));
    }
    let text = resp
        .text()
        .await
        .map_err(|e| MountError::Fetch(e.to_string()))?;

    let document = window.document().ok_or(MountError::NoWindow)?;
    let parsed = DomParser::new()
        .and_then(|p| p.parse_from_string(&text, SupportedType::ImageSvgXml))
        .map_err(|e| MountError::Parse(format!("{e:?}")))?;
    if parsed.query_selector("parsererror").ok().flatten().is_some() {
        return Err(MountError::Parse("asset is not well-formed SVG".to_string()));
    }
    let source = parsed
        .document_element()
        .ok_or_else(|| MountError::Parse("empty document".to_string()))?;

    let svg = document
        .import_node_with_deep(&source, true)
        .map_err(dom_err)?
        .dyn_into::<Element>()
        .map_err(|_| MountError::Parse("root is not an element".to_string()))?;

    let content = document
        .create_element_ns(Some(SVG_NS), "g")
        .map_err(dom_err)?;
    content.set_id(&config.content_group_id);
    while let Some(child) = svg.first_child() {
        content.append_child(&child).map_err(dom_err)?;
    }
    svg.append_child(&content).map_err(dom_err)?;
    svg.set_id(&config.svg_id);

    let container = document
        .query_selector(&config.container_selector)
        .ok()
        .flatten()
        .ok_or_else(|| MountError::MissingContainer(config.container_selector.clone()))?;
    container.append_child(&svg).map_err(dom_err)?;

    Ok(Diagram { svg, content })
}
