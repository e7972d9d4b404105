//! # Region Model
//!
//! The input representation for an export: a live, already laid-out element
//! tree (what the UI shows on screen) and the options that control the output
//! page. Both are plain serde types so a region can be produced by a UI
//! layer, a test, or JSON on disk.
//!
//! Elements carry their *declared* style as inline style text. The cascade
//! is resolved lazily through [`ElementRef`], which implements
//! [`LiveNode`](crate::snapshot::LiveNode) the way a browser answers a
//! computed-style query.

use serde::{Deserialize, Serialize};

use crate::error::{ExportError, Result};
use crate::snapshot::{LiveNode, TEXT_TAG};
use crate::style::{parse_declarations, ComputedStyle, DEFAULT_FONT_SIZE};

/// A layout box in CSS px.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Frame {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Frame {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn translate(&self, dx: f64, dy: f64) -> Frame {
        Frame::new(self.x + dx, self.y + dy, self.width, self.height)
    }

    /// Shrink by the given edge amounts, never below zero size.
    pub fn inset(&self, top: f64, right: f64, bottom: f64, left: f64) -> Frame {
        Frame::new(
            self.x + left,
            self.y + top,
            (self.width - left - right).max(0.0),
            (self.height - top - bottom).max(0.0),
        )
    }

    fn is_valid(&self) -> bool {
        [self.x, self.y, self.width, self.height]
            .iter()
            .all(|v| v.is_finite())
            && self.width >= 0.0
            && self.height >= 0.0
    }
}

/// A node of the live region: an element or a run of text.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Node {
    Text { text: String },
    Element(Element),
}

/// An element with declared style and a layout frame.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Element {
    #[serde(default = "default_tag")]
    pub tag: String,
    /// Inline style text, e.g. `"padding: 8px; border: 1px solid #ccc"`.
    #[serde(default)]
    pub style: String,
    /// Layout frame in page coordinates. `None` means the element is not
    /// laid out (detached) and cannot be captured.
    #[serde(default)]
    pub frame: Option<Frame>,
    #[serde(default)]
    pub children: Vec<Node>,
}

fn default_tag() -> String {
    "div".to_string()
}

impl Element {
    pub fn new(tag: &str, style: &str, frame: Frame) -> Self {
        Self {
            tag: tag.to_string(),
            style: style.to_string(),
            frame: Some(frame),
            children: Vec::new(),
        }
    }

    pub fn with_children(mut self, children: Vec<Node>) -> Self {
        self.children = children;
        self
    }

    /// A cursor on this element as the root of a region.
    pub fn live(&self) -> ElementRef<'_> {
        ElementRef {
            node: NodeRef::Element(self),
            ancestors: Vec::new(),
        }
    }
}

impl Node {
    pub fn text(content: &str) -> Node {
        Node::Text {
            text: content.to_string(),
        }
    }
}

impl From<Element> for Node {
    fn from(e: Element) -> Self {
        Node::Element(e)
    }
}

/// Parse a region (its root element) from JSON.
pub fn parse_region(json: &str) -> Result<Element> {
    serde_json::from_str(json).map_err(|e| ExportError::config("region", e))
}

#[derive(Debug, Clone, Copy)]
enum NodeRef<'a> {
    Element(&'a Element),
    Text(&'a str),
}

/// A live node together with its ancestor chain.
///
/// Computed styles are recomputed from the root down on every query, so a
/// node's answer never depends on what was asked of other nodes before it.
#[derive(Debug, Clone)]
pub struct ElementRef<'a> {
    node: NodeRef<'a>,
    ancestors: Vec<&'a Element>,
}

impl<'a> ElementRef<'a> {
    fn parent_style(&self) -> (Option<ComputedStyle>, f64) {
        let mut style: Option<ComputedStyle> = None;
        let mut root_font_size = DEFAULT_FONT_SIZE;
        for (depth, element) in self.ancestors.iter().enumerate() {
            let computed = ComputedStyle::compute(
                &parse_declarations(&element.style),
                style.as_ref(),
                root_font_size,
            );
            if depth == 0 {
                root_font_size = computed.px("font-size").unwrap_or(DEFAULT_FONT_SIZE);
            }
            style = Some(computed);
        }
        (style, root_font_size)
    }
}

impl<'a> LiveNode for ElementRef<'a> {
    fn tag(&self) -> &str {
        match self.node {
            NodeRef::Element(e) => &e.tag,
            NodeRef::Text(_) => TEXT_TAG,
        }
    }

    fn text(&self) -> Option<&str> {
        match self.node {
            NodeRef::Element(_) => None,
            NodeRef::Text(t) => Some(t),
        }
    }

    fn frame(&self) -> Result<Option<Frame>> {
        match self.node {
            NodeRef::Text(_) => Ok(None),
            NodeRef::Element(e) => match e.frame {
                Some(f) if f.is_valid() => Ok(Some(f)),
                Some(f) => Err(ExportError::snapshot(format!(
                    "<{}> has an invalid frame {:?}",
                    e.tag, f
                ))),
                None => Err(ExportError::snapshot(format!(
                    "<{}> has no layout frame (detached?)",
                    e.tag
                ))),
            },
        }
    }

    fn computed_style(&self) -> Result<Vec<(String, String)>> {
        let (parent, root_font_size) = self.parent_style();
        let declared = match self.node {
            NodeRef::Element(e) => parse_declarations(&e.style),
            NodeRef::Text(_) => Vec::new(),
        };
        Ok(ComputedStyle::compute(&declared, parent.as_ref(), root_font_size).into_pairs())
    }

    fn children(&self) -> Vec<Self> {
        let NodeRef::Element(element) = self.node else {
            return Vec::new();
        };
        let mut ancestors = self.ancestors.clone();
        ancestors.push(element);
        element
            .children
            .iter()
            .map(|child| ElementRef {
                node: match child {
                    Node::Element(e) => NodeRef::Element(e),
                    Node::Text { text } => NodeRef::Text(text),
                },
                ancestors: ancestors.clone(),
            })
            .collect()
    }
}

// ── Options ────────────────────────────────────────────────────

/// Standard page widths in points (1/72 inch). Height always follows the
/// captured region's aspect ratio.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub enum PageSize {
    #[default]
    A4,
    A3,
    A5,
    Letter,
    Legal,
    Custom {
        width: f64,
    },
}

impl PageSize {
    /// Page width in points.
    pub fn width(&self) -> f64 {
        match self {
            PageSize::A4 => 595.28,
            PageSize::A3 => 841.89,
            PageSize::A5 => 419.53,
            PageSize::Letter | PageSize::Legal => 612.0,
            PageSize::Custom { width } => *width,
        }
    }

    /// Parse a page name case-insensitively, or a plain number of points.
    pub fn from_name(name: &str) -> Option<PageSize> {
        match name.to_ascii_lowercase().as_str() {
            "a4" => Some(PageSize::A4),
            "a3" => Some(PageSize::A3),
            "a5" => Some(PageSize::A5),
            "letter" => Some(PageSize::Letter),
            "legal" => Some(PageSize::Legal),
            other => other
                .parse::<f64>()
                .ok()
                .map(|width| PageSize::Custom { width }),
        }
    }
}

/// Options for one export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportOptions {
    #[serde(default)]
    pub page: PageSize,
    /// Compression quality in `0.0..=1.0`.
    #[serde(default = "default_quality")]
    pub quality: f32,
    /// Device pixel ratio used when rasterizing. Values below 1 are raised to 1.
    #[serde(default = "default_scale")]
    pub scale: f64,
}

fn default_quality() -> f32 {
    0.92
}

fn default_scale() -> f64 {
    1.0
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            page: PageSize::A4,
            quality: default_quality(),
            scale: default_scale(),
        }
    }
}

impl ExportOptions {
    pub fn page_width_pt(&self) -> f64 {
        self.page.width()
    }

    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| ExportError::config("export options", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn invoice() -> Element {
        Element::new(
            "section",
            "font-size: 12px; color: #333",
            Frame::new(10.0, 10.0, 300.0, 100.0),
        )
        .with_children(vec![Element::new(
            "h1",
            "font-size: 2em",
            Frame::new(10.0, 10.0, 300.0, 30.0),
        )
        .with_children(vec![Node::text("Invoice")])
        .into()])
    }

    #[test]
    fn test_children_resolve_inherited_styles() {
        let region = invoice();
        let root = region.live();
        let children = root.children();
        let h1 = &children[0];
        let style = h1.computed_style().unwrap();
        let get = |name: &str| {
            style
                .iter()
                .find(|(n, _)| n == name)
                .map(|(_, v)| v.clone())
        };
        assert_eq!(get("font-size").as_deref(), Some("24px"));
        assert_eq!(get("color").as_deref(), Some("rgb(51, 51, 51)"));
    }

    #[test]
    fn test_text_node_inherits_from_element() {
        let region = invoice();
        let root = region.live();
        let h1 = root.children().remove(0);
        let text = h1.children().remove(0);
        assert_eq!(text.tag(), TEXT_TAG);
        assert_eq!(text.text(), Some("Invoice"));
        assert_eq!(text.frame().unwrap(), None);
        let style = text.computed_style().unwrap();
        assert!(style.contains(&("font-size".to_string(), "24px".to_string())));
    }

    #[test]
    fn test_missing_frame_is_unreadable() {
        let mut region = invoice();
        region.frame = None;
        assert!(matches!(region.live().frame(), Err(ExportError::Snapshot(_))));
    }

    #[test]
    fn test_negative_frame_is_unreadable() {
        let region = Element::new("div", "", Frame::new(0.0, 0.0, -5.0, 10.0));
        assert!(region.live().frame().is_err());
    }

    #[test]
    fn test_parse_region_json() {
        let json = r#"{
            "tag": "div",
            "style": "background: #fff",
            "frame": { "x": 0, "y": 0, "width": 400, "height": 200 },
            "children": [
                { "text": "Amount due" },
                { "tag": "span", "frame": { "x": 0, "y": 20, "width": 50, "height": 10 } }
            ]
        }"#;
        let region = parse_region(json).unwrap();
        assert_eq!(region.children.len(), 2);
        assert!(matches!(region.children[0], Node::Text { .. }));
        assert!(matches!(region.children[1], Node::Element(_)));
    }

    #[test]
    fn test_parse_region_error_is_config() {
        let err = parse_region("{ \"tag\": ").unwrap_err();
        assert!(matches!(err, ExportError::Config { what: "region", .. }));
    }

    #[test]
    fn test_export_options_defaults() {
        let options = ExportOptions::from_json("{}").unwrap();
        assert_eq!(options, ExportOptions::default());
        assert_eq!(options.page_width_pt(), 595.28);
    }

    #[test]
    fn test_export_options_custom_page() {
        let options =
            ExportOptions::from_json(r#"{ "page": { "Custom": { "width": 300 } }, "scale": 2 }"#)
                .unwrap();
        assert_eq!(options.page_width_pt(), 300.0);
        assert_eq!(options.scale, 2.0);
    }

    #[test]
    fn test_page_size_from_name() {
        assert_eq!(PageSize::from_name("Letter"), Some(PageSize::Letter));
        assert_eq!(
            PageSize::from_name("250"),
            Some(PageSize::Custom { width: 250.0 })
        );
        assert_eq!(PageSize::from_name("B7"), None);
    }
}
