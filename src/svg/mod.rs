//! # SVG Container
//!
//! Serializes a [`VisualNode`] snapshot into a self-contained SVG document
//! whose viewport equals the snapshot's bounding box. All content lives in a
//! single top-level `<g id="snapshot">` group.
//!
//! Each snapshot node becomes a `<g>` carrying its complete resolved style
//! list as an opaque `data-style` attribute, plus the few presentation
//! primitives needed to paint it: a background `<rect>`, one filled `<rect>`
//! per visible border side, and a `<text>` run for text leaves. Hosts that
//! understand richer content can read `data-style`; the in-process
//! rasterizer only needs the primitives.

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;

use crate::error::{ExportError, Result};
use crate::model::Frame;
use crate::snapshot::VisualNode;
use crate::style::{format_number, Color};

const SVG_NS: &str = "http://www.w3.org/2000/svg";

/// Serialize `root` into SVG bytes sized to its frame.
pub fn build_container(root: &VisualNode) -> Result<Vec<u8>> {
    let mut writer = Writer::new(Vec::new());
    let width = format_number(root.frame.width);
    let height = format_number(root.frame.height);
    let view_box = format!("0 0 {} {}", width, height);

    write(&mut writer, Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;

    let mut svg = BytesStart::new("svg");
    svg.push_attribute(("xmlns", SVG_NS));
    svg.push_attribute(("width", width.as_str()));
    svg.push_attribute(("height", height.as_str()));
    svg.push_attribute(("viewBox", view_box.as_str()));
    write(&mut writer, Event::Start(svg))?;

    let mut group = BytesStart::new("g");
    group.push_attribute(("id", "snapshot"));
    write(&mut writer, Event::Start(group))?;

    write_node(&mut writer, root)?;

    write(&mut writer, Event::End(BytesEnd::new("g")))?;
    write(&mut writer, Event::End(BytesEnd::new("svg")))?;

    Ok(writer.into_inner())
}

fn write(writer: &mut Writer<Vec<u8>>, event: Event<'_>) -> Result<()> {
    writer
        .write_event(event)
        .map_err(|e| ExportError::render(format!("failed to write SVG container: {}", e)))
}

fn write_node(writer: &mut Writer<Vec<u8>>, node: &VisualNode) -> Result<()> {
    if node.style("display") == Some("none") {
        return Ok(());
    }

    let data_style = node
        .styles
        .iter()
        .map(|(k, v)| format!("{}: {}", k, v))
        .collect::<Vec<_>>()
        .join("; ");

    let mut group = BytesStart::new("g");
    group.push_attribute(("data-tag", node.tag.as_str()));
    group.push_attribute(("data-style", data_style.as_str()));
    if let Some(opacity) = node.style("opacity").filter(|o| *o != "1") {
        group.push_attribute(("opacity", opacity));
    }
    write(writer, Event::Start(group))?;

    if node.style("visibility").unwrap_or("visible") == "visible" {
        if node.is_text() {
            write_text(writer, node)?;
        } else {
            write_background(writer, node)?;
            write_borders(writer, node)?;
        }
    }

    for child in &node.children {
        write_node(writer, child)?;
    }

    write(writer, Event::End(BytesEnd::new("g")))
}

fn color_of(node: &VisualNode, property: &str) -> Option<Color> {
    node.style(property)
        .and_then(Color::parse)
        .filter(|c| !c.is_transparent())
}

fn rect(frame: Frame, color: Color, radius: f64) -> BytesStart<'static> {
    let mut rect = BytesStart::new("rect");
    rect.push_attribute(("x", format_number(frame.x).as_str()));
    rect.push_attribute(("y", format_number(frame.y).as_str()));
    rect.push_attribute(("width", format_number(frame.width).as_str()));
    rect.push_attribute(("height", format_number(frame.height).as_str()));
    if radius > 0.0 {
        rect.push_attribute(("rx", format_number(radius).as_str()));
    }
    rect.push_attribute(("fill", color.to_rgb_string().as_str()));
    if color.a < 1.0 {
        rect.push_attribute(("fill-opacity", format_number(color.a).as_str()));
    }
    rect
}

fn write_background(writer: &mut Writer<Vec<u8>>, node: &VisualNode) -> Result<()> {
    let Some(color) = color_of(node, "background-color") else {
        return Ok(());
    };
    if node.frame.width <= 0.0 || node.frame.height <= 0.0 {
        return Ok(());
    }
    // SVG rects only take one radius; the top-left corner stands for all four.
    let radius = node.style_px("border-top-left-radius");
    write(writer, Event::Empty(rect(node.frame, color, radius)))
}

fn write_borders(writer: &mut Writer<Vec<u8>>, node: &VisualNode) -> Result<()> {
    let f = node.frame;
    for side in ["top", "right", "bottom", "left"] {
        let w = node.style_px(&format!("border-{side}-width"));
        if w <= 0.0 {
            continue;
        }
        let strip = match side {
            "top" => Frame::new(f.x, f.y, f.width, w),
            "right" => Frame::new(f.x + f.width - w, f.y, w, f.height),
            "bottom" => Frame::new(f.x, f.y + f.height - w, f.width, w),
            _ => Frame::new(f.x, f.y, w, f.height),
        };
        if let Some(color) = color_of(node, &format!("border-{side}-color")) {
            write(writer, Event::Empty(rect(strip, color, 0.0)))?;
        }
    }
    Ok(())
}

fn write_text(writer: &mut Writer<Vec<u8>>, node: &VisualNode) -> Result<()> {
    let content = node
        .text
        .as_deref()
        .unwrap_or_default()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    if content.is_empty() {
        return Ok(());
    }

    let font_size = node.style_px("font-size");
    let line_height = match node.style("line-height") {
        Some("normal") | None => font_size * 1.2,
        Some(_) => node.style_px("line-height"),
    };
    let frame = node.frame;
    // Baseline sits at the ascent of a line box centered on the half-leading.
    let baseline = frame.y + (line_height - font_size) / 2.0 + font_size * 0.8;
    let (x, anchor) = match node.style("text-align") {
        Some("center") => (frame.x + frame.width / 2.0, "middle"),
        Some("right") | Some("end") => (frame.x + frame.width, "end"),
        _ => (frame.x, "start"),
    };
    let color = node
        .style("color")
        .and_then(Color::parse)
        .unwrap_or(Color::BLACK);

    let mut text = BytesStart::new("text");
    text.push_attribute(("x", format_number(x).as_str()));
    text.push_attribute(("y", format_number(baseline).as_str()));
    text.push_attribute(("font-family", node.style("font-family").unwrap_or("sans-serif")));
    text.push_attribute(("font-size", format_number(font_size).as_str()));
    text.push_attribute(("font-weight", node.style("font-weight").unwrap_or("400")));
    text.push_attribute(("font-style", node.style("font-style").unwrap_or("normal")));
    text.push_attribute(("text-anchor", anchor));
    text.push_attribute(("fill", color.to_rgb_string().as_str()));
    if color.a < 1.0 {
        text.push_attribute(("fill-opacity", format_number(color.a).as_str()));
    }
    if let Some(line) = node.style("text-decoration-line").filter(|l| *l != "none") {
        text.push_attribute(("text-decoration", line));
    }
    text.push_attribute(("xml:space", "preserve"));

    write(writer, Event::Start(text))?;
    write(writer, Event::Text(BytesText::new(&content)))?;
    write(writer, Event::End(BytesEnd::new("text")))
}
