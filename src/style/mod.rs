//! # Style Resolution
//!
//! A CSS-like computed-style engine for the live element tree. Declared styles
//! arrive as inline `style` text (`"padding: 4px 8px; color: #333"`), get
//! expanded from shorthands into longhands, and are then resolved against a
//! fixed property table the way a browser's computed style is: declared value
//! if present, else the parent's computed value for inherited properties, else
//! the initial value.
//!
//! Computed values are normalized so that nothing downstream needs to know
//! about units or color syntax: colors become `rgb(r, g, b)` or
//! `rgba(r, g, b, a)`, lengths become `Npx`, font weights become numbers.

use tracing::warn;

/// Initial `font-size` in CSS px, also the `rem` base for root elements.
pub const DEFAULT_FONT_SIZE: f64 = 16.0;

/// How a property's declared value is validated and normalized.
#[derive(Debug, Clone, Copy)]
enum ValueKind {
    Keyword(&'static [&'static str]),
    Color,
    Length,
    FontSize,
    FontWeight,
    FontFamily,
    LineHeight,
    Opacity,
}

/// One row of the property table.
#[derive(Debug, Clone, Copy)]
pub struct Property {
    pub name: &'static str,
    pub inherited: bool,
    pub initial: &'static str,
    kind: ValueKind,
}

const DISPLAY: &[&str] = &[
    "block", "inline", "inline-block", "flex", "inline-flex", "grid", "table",
    "table-row", "table-cell", "list-item", "none",
];
const VISIBILITY: &[&str] = &["visible", "hidden", "collapse"];
const FONT_STYLE: &[&str] = &["normal", "italic", "oblique"];
const TEXT_ALIGN: &[&str] = &["start", "end", "left", "right", "center", "justify"];
const TEXT_DECORATION: &[&str] = &["none", "underline", "overline", "line-through"];
const BORDER_STYLE: &[&str] = &[
    "none", "hidden", "solid", "dashed", "dotted", "double", "groove", "ridge", "inset",
    "outset",
];

const fn prop(name: &'static str, inherited: bool, initial: &'static str, kind: ValueKind) -> Property {
    Property {
        name,
        inherited,
        initial,
        kind,
    }
}

/// Every property the snapshot records, in the order it records them.
///
/// `color` precedes the border colors so `currentcolor` can be resolved
/// against the element's own computed color, and `font-size` precedes every
/// length so `em` can be resolved.
pub const PROPERTIES: &[Property] = &[
    prop("display", false, "block", ValueKind::Keyword(DISPLAY)),
    prop("visibility", true, "visible", ValueKind::Keyword(VISIBILITY)),
    prop("opacity", false, "1", ValueKind::Opacity),
    prop("font-size", true, "16px", ValueKind::FontSize),
    prop("color", true, "rgb(0, 0, 0)", ValueKind::Color),
    prop("background-color", false, "rgba(0, 0, 0, 0)", ValueKind::Color),
    prop("font-family", true, "sans-serif", ValueKind::FontFamily),
    prop("font-weight", true, "400", ValueKind::FontWeight),
    prop("font-style", true, "normal", ValueKind::Keyword(FONT_STYLE)),
    prop("line-height", true, "normal", ValueKind::LineHeight),
    prop("text-align", true, "start", ValueKind::Keyword(TEXT_ALIGN)),
    prop("text-decoration-line", false, "none", ValueKind::Keyword(TEXT_DECORATION)),
    prop("padding-top", false, "0px", ValueKind::Length),
    prop("padding-right", false, "0px", ValueKind::Length),
    prop("padding-bottom", false, "0px", ValueKind::Length),
    prop("padding-left", false, "0px", ValueKind::Length),
    prop("margin-top", false, "0px", ValueKind::Length),
    prop("margin-right", false, "0px", ValueKind::Length),
    prop("margin-bottom", false, "0px", ValueKind::Length),
    prop("margin-left", false, "0px", ValueKind::Length),
    prop("border-top-style", false, "none", ValueKind::Keyword(BORDER_STYLE)),
    prop("border-right-style", false, "none", ValueKind::Keyword(BORDER_STYLE)),
    prop("border-bottom-style", false, "none", ValueKind::Keyword(BORDER_STYLE)),
    prop("border-left-style", false, "none", ValueKind::Keyword(BORDER_STYLE)),
    prop("border-top-width", false, "3px", ValueKind::Length),
    prop("border-right-width", false, "3px", ValueKind::Length),
    prop("border-bottom-width", false, "3px", ValueKind::Length),
    prop("border-left-width", false, "3px", ValueKind::Length),
    prop("border-top-color", false, "currentcolor", ValueKind::Color),
    prop("border-right-color", false, "currentcolor", ValueKind::Color),
    prop("border-bottom-color", false, "currentcolor", ValueKind::Color),
    prop("border-left-color", false, "currentcolor", ValueKind::Color),
    prop("border-top-left-radius", false, "0px", ValueKind::Length),
    prop("border-top-right-radius", false, "0px", ValueKind::Length),
    prop("border-bottom-right-radius", false, "0px", ValueKind::Length),
    prop("border-bottom-left-radius", false, "0px", ValueKind::Length),
];

const SIDES: [&str; 4] = ["top", "right", "bottom", "left"];
const CORNERS: [&str; 4] = ["top-left", "top-right", "bottom-right", "bottom-left"];

// ── Declarations ───────────────────────────────────────────────

/// Parse inline style text into ordered longhand declarations.
///
/// Later declarations win over earlier ones when resolved, so the order of
/// the returned list matters and mirrors source order.
pub fn parse_declarations(css: &str) -> Vec<(String, String)> {
    let mut out = Vec::new();
    for decl in split_outside_parens(css, ';') {
        let Some((name, value)) = decl.split_once(':') else {
            if !decl.trim().is_empty() {
                warn!(declaration = decl.trim(), "ignoring malformed style declaration");
            }
            continue;
        };
        let name = name.trim().to_ascii_lowercase();
        let value = value.trim().trim_end_matches("!important").trim();
        if name.is_empty() || value.is_empty() {
            continue;
        }
        expand_shorthand(&name, value, &mut out);
    }
    out
}

fn expand_shorthand(name: &str, value: &str, out: &mut Vec<(String, String)>) {
    let tokens = split_tokens(value);
    match name {
        "padding" | "margin" => push_sides(out, |side| format!("{name}-{side}"), &tokens),
        "border-width" => push_sides(out, |side| format!("border-{side}-width"), &tokens),
        "border-style" => push_sides(out, |side| format!("border-{side}-style"), &tokens),
        "border-color" => push_sides(out, |side| format!("border-{side}-color"), &tokens),
        "border-radius" => {
            // Elliptical radii ("a / b") are approximated by their horizontal part.
            let horizontal: Vec<String> = tokens.iter().take_while(|t| *t != "/").cloned().collect();
            if let Some(values) = four_values(&horizontal) {
                for (corner, v) in CORNERS.iter().zip(values) {
                    out.push((format!("border-{corner}-radius"), v));
                }
            }
        }
        "border" => {
            for side in SIDES {
                expand_border_side(side, &tokens, out);
            }
        }
        "border-top" | "border-right" | "border-bottom" | "border-left" => {
            expand_border_side(&name["border-".len()..], &tokens, out);
        }
        "background" => {
            // Only the color layer of the shorthand is meaningful for a snapshot.
            match tokens.iter().find(|t| Color::parse(t).is_some()) {
                Some(color) => out.push(("background-color".to_string(), color.clone())),
                None => warn!(value, "background shorthand has no color layer"),
            }
        }
        "text-decoration" => {
            if let Some(line) = tokens.iter().find(|t| TEXT_DECORATION.contains(&t.as_str())) {
                out.push(("text-decoration-line".to_string(), line.clone()));
            }
        }
        _ => out.push((name.to_string(), value.to_string())),
    }
}

fn push_sides(out: &mut Vec<(String, String)>, name: impl Fn(&str) -> String, tokens: &[String]) {
    match four_values(tokens) {
        Some(values) => {
            for (side, v) in SIDES.iter().zip(values) {
                out.push((name(side), v));
            }
        }
        None => warn!(tokens = ?tokens, "expected 1 to 4 values"),
    }
}

/// CSS 1-to-4 value expansion in top, right, bottom, left order.
fn four_values(tokens: &[String]) -> Option<[String; 4]> {
    let t = tokens;
    match t.len() {
        1 => Some([t[0].clone(), t[0].clone(), t[0].clone(), t[0].clone()]),
        2 => Some([t[0].clone(), t[1].clone(), t[0].clone(), t[1].clone()]),
        3 => Some([t[0].clone(), t[1].clone(), t[2].clone(), t[1].clone()]),
        4 => Some([t[0].clone(), t[1].clone(), t[2].clone(), t[3].clone()]),
        _ => None,
    }
}

/// `border: 1px solid #ccc` in any token order. Omitted parts reset to their
/// initial values, as the shorthand does in CSS.
fn expand_border_side(side: &str, tokens: &[String], out: &mut Vec<(String, String)>) {
    let mut width = "medium".to_string();
    let mut style = "none".to_string();
    let mut color = "currentcolor".to_string();
    for token in tokens {
        if BORDER_STYLE.contains(&token.as_str()) {
            style = token.clone();
        } else if parse_border_keyword(token).is_some() || parse_length(token, 16.0, 16.0).is_some() {
            width = token.clone();
        } else {
            color = token.clone();
        }
    }
    out.push((format!("border-{side}-width"), width));
    out.push((format!("border-{side}-style"), style));
    out.push((format!("border-{side}-color"), color));
}

/// Split on `sep`, ignoring separators nested inside parentheses.
fn split_outside_parens(s: &str, sep: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (i, ch) in s.char_indices() {
        match ch {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            c if c == sep && depth == 0 => {
                parts.push(&s[start..i]);
                start = i + c.len_utf8();
            }
            _ => {}
        }
    }
    parts.push(&s[start..]);
    parts
}

/// Whitespace-separated tokens, keeping `rgb(1, 2, 3)` in one piece.
fn split_tokens(value: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut depth = 0usize;
    for ch in value.chars() {
        match ch {
            '(' => {
                depth += 1;
                current.push(ch);
            }
            ')' => {
                depth = depth.saturating_sub(1);
                current.push(ch);
            }
            c if c.is_whitespace() && depth == 0 => {
                if !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                }
            }
            _ => current.push(ch),
        }
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    tokens
}

// ── Computed style ─────────────────────────────────────────────

/// The fully resolved value of every property in [`PROPERTIES`].
#[derive(Debug, Clone, PartialEq)]
pub struct ComputedStyle {
    values: Vec<(&'static str, String)>,
}

impl ComputedStyle {
    /// Resolve declared longhands against the parent's computed style.
    ///
    /// `root_font_size` is the computed font size of the root element and is
    /// the base for `rem` units.
    pub fn compute(
        declared: &[(String, String)],
        parent: Option<&ComputedStyle>,
        root_font_size: f64,
    ) -> ComputedStyle {
        let parent_font_size = parent
            .and_then(|p| p.px("font-size"))
            .unwrap_or(DEFAULT_FONT_SIZE);
        let mut computed = ComputedStyle {
            values: Vec::with_capacity(PROPERTIES.len()),
        };

        for property in PROPERTIES {
            let font_size = computed.px("font-size").unwrap_or(parent_font_size);
            let ctx = ResolveContext {
                font_size,
                parent_font_size,
                root_font_size,
                parent_weight: parent.and_then(|p| p.number("font-weight")).unwrap_or(400.0),
                current_color: computed.get("color").unwrap_or("rgb(0, 0, 0)"),
            };

            let declared_value = declared
                .iter()
                .rev()
                .find(|(name, _)| name == property.name)
                .map(|(_, v)| v.as_str());

            let value = match declared_value {
                Some("inherit") => inherited_or_initial(property, parent, &ctx),
                Some("initial") => normalize(property, property.initial, &ctx),
                Some(v) => normalize(property, v, &ctx).or_else(|| {
                    warn!(property = property.name, value = v, "unsupported value, using default");
                    default_value(property, parent, &ctx)
                }),
                None => default_value(property, parent, &ctx),
            };
            // The table's own initial values always normalize.
            let value = value.unwrap_or_else(|| property.initial.to_string());
            computed.values.push((property.name, value));
        }

        computed.zero_unstyled_borders();
        computed
    }

    /// Look up a computed value by property name.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.values
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, v)| v.as_str())
    }

    /// A `px` value as a number.
    pub fn px(&self, name: &str) -> Option<f64> {
        self.get(name).and_then(|v| v.strip_suffix("px")).and_then(|v| v.parse().ok())
    }

    fn number(&self, name: &str) -> Option<f64> {
        self.get(name).and_then(|v| v.parse().ok())
    }

    /// The ordered (property, value) list.
    pub fn into_pairs(self) -> Vec<(String, String)> {
        self.values
            .into_iter()
            .map(|(n, v)| (n.to_string(), v))
            .collect()
    }

    /// A border side with style `none` or `hidden` computes to width 0.
    fn zero_unstyled_borders(&mut self) {
        for side in SIDES {
            let style = self.get(&format!("border-{side}-style")).unwrap_or("none");
            if style == "none" || style == "hidden" {
                let width_name = format!("border-{side}-width");
                if let Some(slot) = self.values.iter_mut().find(|(n, _)| *n == width_name) {
                    slot.1 = "0px".to_string();
                }
            }
        }
    }
}

struct ResolveContext<'a> {
    font_size: f64,
    parent_font_size: f64,
    root_font_size: f64,
    parent_weight: f64,
    current_color: &'a str,
}

fn default_value(
    property: &Property,
    parent: Option<&ComputedStyle>,
    ctx: &ResolveContext,
) -> Option<String> {
    if property.inherited {
        inherited_or_initial(property, parent, ctx)
    } else {
        normalize(property, property.initial, ctx)
    }
}

fn inherited_or_initial(
    property: &Property,
    parent: Option<&ComputedStyle>,
    ctx: &ResolveContext,
) -> Option<String> {
    match parent.and_then(|p| p.get(property.name)) {
        Some(v) => Some(v.to_string()),
        None => normalize(property, property.initial, ctx),
    }
}

fn normalize(property: &Property, value: &str, ctx: &ResolveContext) -> Option<String> {
    let value = value.trim();
    let lower = value.to_ascii_lowercase();
    match property.kind {
        ValueKind::Keyword(allowed) => allowed.contains(&lower.as_str()).then_some(lower),
        ValueKind::Color => {
            if lower == "currentcolor" {
                Some(ctx.current_color.to_string())
            } else {
                Color::parse(&lower).map(|c| c.to_css())
            }
        }
        ValueKind::Length => {
            let px = parse_border_keyword(&lower)
                .filter(|_| property.name.starts_with("border-") && property.name.ends_with("-width"))
                .or_else(|| parse_length(&lower, ctx.font_size, ctx.root_font_size))?;
            (px >= 0.0 || property.name.starts_with("margin-")).then(|| format_px(px))
        }
        ValueKind::FontSize => {
            let px = match lower.as_str() {
                "xx-small" => 9.0,
                "x-small" => 10.0,
                "small" => 13.0,
                "medium" => 16.0,
                "large" => 18.0,
                "x-large" => 24.0,
                "xx-large" => 32.0,
                "smaller" => ctx.parent_font_size / 1.2,
                "larger" => ctx.parent_font_size * 1.2,
                _ => match lower.strip_suffix('%') {
                    Some(pct) => pct.trim().parse::<f64>().ok()? * ctx.parent_font_size / 100.0,
                    None => parse_length(&lower, ctx.parent_font_size, ctx.root_font_size)?,
                },
            };
            (px >= 0.0).then(|| format_px(px))
        }
        ValueKind::FontWeight => {
            let weight = match lower.as_str() {
                "normal" => 400.0,
                "bold" => 700.0,
                "bolder" => bolder(ctx.parent_weight),
                "lighter" => lighter(ctx.parent_weight),
                n => n.parse::<f64>().ok().filter(|w| (1.0..=1000.0).contains(w))?,
            };
            Some(format_number(weight))
        }
        ValueKind::FontFamily => {
            let families: Vec<&str> = value
                .split(',')
                .map(str::trim)
                .filter(|f| !f.is_empty())
                .collect();
            (!families.is_empty()).then(|| families.join(", "))
        }
        ValueKind::LineHeight => {
            if lower == "normal" {
                return Some(lower);
            }
            if let Ok(factor) = lower.parse::<f64>() {
                return (factor >= 0.0).then(|| format_px(factor * ctx.font_size));
            }
            let px = match lower.strip_suffix('%') {
                Some(pct) => pct.trim().parse::<f64>().ok()? * ctx.font_size / 100.0,
                None => parse_length(&lower, ctx.font_size, ctx.root_font_size)?,
            };
            (px >= 0.0).then(|| format_px(px))
        }
        ValueKind::Opacity => {
            let v = match lower.strip_suffix('%') {
                Some(pct) => pct.trim().parse::<f64>().ok()? / 100.0,
                None => lower.parse::<f64>().ok()?,
            };
            v.is_finite().then(|| format_number(v.clamp(0.0, 1.0)))
        }
    }
}

fn bolder(parent: f64) -> f64 {
    if parent < 350.0 {
        400.0
    } else if parent < 550.0 {
        700.0
    } else {
        900.0_f64.max(parent)
    }
}

fn lighter(parent: f64) -> f64 {
    if parent < 550.0 {
        100.0_f64.min(parent)
    } else if parent < 750.0 {
        400.0
    } else {
        700.0
    }
}

fn parse_border_keyword(s: &str) -> Option<f64> {
    match s {
        "thin" => Some(1.0),
        "medium" => Some(3.0),
        "thick" => Some(5.0),
        _ => None,
    }
}

/// Parse a CSS length into px. Unitless zero is accepted, other unitless
/// numbers are not.
pub fn parse_length(s: &str, font_size: f64, root_font_size: f64) -> Option<f64> {
    let s = s.trim();
    if s == "0" {
        return Some(0.0);
    }
    let units: [(&str, f64); 7] = [
        ("rem", root_font_size),
        ("em", font_size),
        ("px", 1.0),
        ("pt", 96.0 / 72.0),
        ("pc", 16.0),
        ("mm", 96.0 / 25.4),
        ("in", 96.0),
    ];
    for (unit, factor) in units {
        if let Some(num) = s.strip_suffix(unit) {
            let v: f64 = num.trim().parse().ok()?;
            return v.is_finite().then_some(v * factor);
        }
    }
    None
}

/// Format a number the way computed styles print them: no trailing zeros,
/// at most three decimals.
pub fn format_number(v: f64) -> String {
    format_fixed(v, 3)
}

/// Widest precision [`format_fixed`] falls back to for tiny magnitudes.
const MAX_DECIMALS: usize = 20;

/// Fixed-notation number with `decimals` decimals and no trailing zeros.
///
/// A nonzero value never prints as `0`. Magnitudes too small for
/// `decimals` keep four significant digits instead, and anything below
/// `10^-MAX_DECIMALS` prints as the smallest step of that precision.
pub fn format_fixed(v: f64, decimals: usize) -> String {
    let mut precision = decimals;
    if v != 0.0 && v.is_finite() && v.abs() < 0.5 * 10f64.powi(-(decimals as i32)) {
        let magnitude = (-v.abs().log10()).ceil() as usize;
        precision = (magnitude + 3).min(MAX_DECIMALS);
    }

    let s = format!("{:.*}", precision, v);
    let s = if s.contains('.') {
        s.trim_end_matches('0').trim_end_matches('.')
    } else {
        s.as_str()
    };
    match s {
        "" | "-" | "0" | "-0" if v != 0.0 && v.is_finite() => {
            let smallest = format!("0.{}1", "0".repeat(MAX_DECIMALS - 1));
            if v < 0.0 {
                format!("-{}", smallest)
            } else {
                smallest
            }
        }
        "" | "-" | "-0" => "0".to_string(),
        s => s.to_string(),
    }
}

pub fn format_px(v: f64) -> String {
    format!("{}px", format_number(v))
}

// ── Color ──────────────────────────────────────────────────────

/// An sRGB color with straight alpha.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: f64,
}

impl Color {
    pub const BLACK: Color = Color {
        r: 0,
        g: 0,
        b: 0,
        a: 1.0,
    };
    pub const WHITE: Color = Color {
        r: 255,
        g: 255,
        b: 255,
        a: 1.0,
    };
    pub const TRANSPARENT: Color = Color {
        r: 0,
        g: 0,
        b: 0,
        a: 0.0,
    };

    pub fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    /// Parse `#rgb`, `#rgba`, `#rrggbb`, `#rrggbbaa`, `rgb()`, `rgba()` or a
    /// named color.
    pub fn parse(s: &str) -> Option<Color> {
        let s = s.trim().to_ascii_lowercase();
        if let Some(hex) = s.strip_prefix('#') {
            return Self::hex(hex);
        }
        if let Some(args) = s
            .strip_prefix("rgba(")
            .or_else(|| s.strip_prefix("rgb("))
            .and_then(|rest| rest.strip_suffix(')'))
        {
            return Self::functional(args);
        }
        Self::named(&s)
    }

    fn hex(hex: &str) -> Option<Color> {
        if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return None;
        }
        let nibble = |i: usize| u8::from_str_radix(&hex[i..i + 1].repeat(2), 16).ok();
        let byte = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
        let (r, g, b, a) = match hex.len() {
            3 => (nibble(0)?, nibble(1)?, nibble(2)?, 255),
            4 => (nibble(0)?, nibble(1)?, nibble(2)?, nibble(3)?),
            6 => (byte(0)?, byte(2)?, byte(4)?, 255),
            8 => (byte(0)?, byte(2)?, byte(4)?, byte(6)?),
            _ => return None,
        };
        Some(Color {
            r,
            g,
            b,
            a: round_alpha(a as f64 / 255.0),
        })
    }

    fn functional(args: &str) -> Option<Color> {
        // Both `rgb(1, 2, 3, 0.5)` and `rgb(1 2 3 / 0.5)`.
        let normalized = args.replace(['/', ','], " ");
        let parts: Vec<&str> = normalized.split_whitespace().collect();
        if parts.len() != 3 && parts.len() != 4 {
            return None;
        }
        let channel = |p: &str| -> Option<u8> {
            let v = match p.strip_suffix('%') {
                Some(pct) => pct.parse::<f64>().ok()? * 255.0 / 100.0,
                None => p.parse::<f64>().ok()?,
            };
            Some(v.round().clamp(0.0, 255.0) as u8)
        };
        let a = match parts.get(3) {
            Some(p) => match p.strip_suffix('%') {
                Some(pct) => pct.parse::<f64>().ok()? / 100.0,
                None => p.parse::<f64>().ok()?,
            },
            None => 1.0,
        };
        Some(Color {
            r: channel(parts[0])?,
            g: channel(parts[1])?,
            b: channel(parts[2])?,
            a: round_alpha(a.clamp(0.0, 1.0)),
        })
    }

    fn named(name: &str) -> Option<Color> {
        let (r, g, b) = match name {
            "transparent" => return Some(Color::TRANSPARENT),
            "black" => (0, 0, 0),
            "white" => (255, 255, 255),
            "red" => (255, 0, 0),
            "green" => (0, 128, 0),
            "blue" => (0, 0, 255),
            "gray" | "grey" => (128, 128, 128),
            "silver" => (192, 192, 192),
            "maroon" => (128, 0, 0),
            "navy" => (0, 0, 128),
            "teal" => (0, 128, 128),
            "olive" => (128, 128, 0),
            "purple" => (128, 0, 128),
            "orange" => (255, 165, 0),
            "yellow" => (255, 255, 0),
            "lime" => (0, 255, 0),
            "aqua" | "cyan" => (0, 255, 255),
            "fuchsia" | "magenta" => (255, 0, 255),
            "whitesmoke" => (245, 245, 245),
            "lightgray" | "lightgrey" => (211, 211, 211),
            "darkgray" | "darkgrey" => (169, 169, 169),
            _ => return None,
        };
        Some(Color::rgb(r, g, b))
    }

    pub fn is_transparent(&self) -> bool {
        self.a <= 0.0
    }

    /// `rgb(r, g, b)` without the alpha channel.
    pub fn to_rgb_string(&self) -> String {
        format!("rgb({}, {}, {})", self.r, self.g, self.b)
    }

    /// Serialize like a computed style: `rgb()` when opaque, `rgba()` otherwise.
    pub fn to_css(&self) -> String {
        if self.a >= 1.0 {
            self.to_rgb_string()
        } else {
            format!(
                "rgba({}, {}, {}, {})",
                self.r,
                self.g,
                self.b,
                format_number(self.a)
            )
        }
    }
}

fn round_alpha(a: f64) -> f64 {
    (a * 1000.0).round() / 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn compute(css: &str, parent: Option<&ComputedStyle>) -> ComputedStyle {
        ComputedStyle::compute(&parse_declarations(css), parent, DEFAULT_FONT_SIZE)
    }

    #[test]
    fn test_every_property_is_resolved() {
        let style = compute("", None);
        assert_eq!(style.clone().into_pairs().len(), PROPERTIES.len());
        assert_eq!(style.get("display"), Some("block"));
        assert_eq!(style.get("color"), Some("rgb(0, 0, 0)"));
        assert_eq!(style.get("background-color"), Some("rgba(0, 0, 0, 0)"));
        assert_eq!(style.get("font-size"), Some("16px"));
    }

    #[test]
    fn test_padding_shorthand_expands() {
        let decls = parse_declarations("padding: 4px 8px");
        assert_eq!(
            decls,
            vec![
                ("padding-top".to_string(), "4px".to_string()),
                ("padding-right".to_string(), "8px".to_string()),
                ("padding-bottom".to_string(), "4px".to_string()),
                ("padding-left".to_string(), "8px".to_string()),
            ]
        );
    }

    #[test]
    fn test_later_declaration_wins() {
        let style = compute("padding: 4px; padding-left: 10pt", None);
        assert_eq!(style.get("padding-top"), Some("4px"));
        assert_eq!(style.get("padding-left"), Some("13.333px"));
    }

    #[test]
    fn test_border_shorthand_with_rgb_color() {
        let style = compute("border: 2px solid rgb(10, 20, 30)", None);
        for side in SIDES {
            assert_eq!(style.get(&format!("border-{side}-width")), Some("2px"));
            assert_eq!(style.get(&format!("border-{side}-style")), Some("solid"));
            assert_eq!(
                style.get(&format!("border-{side}-color")),
                Some("rgb(10, 20, 30)")
            );
        }
    }

    #[test]
    fn test_border_without_style_has_zero_width() {
        let style = compute("border-width: 4px", None);
        assert_eq!(style.get("border-top-width"), Some("0px"));
    }

    #[test]
    fn test_border_color_defaults_to_current_color() {
        let style = compute("color: #f00; border-top: 1px solid", None);
        assert_eq!(style.get("border-top-color"), Some("rgb(255, 0, 0)"));
    }

    #[test]
    fn test_inherited_properties_come_from_parent() {
        let parent = compute("color: navy; font-size: 20px; background-color: #eee", None);
        let child = compute("", Some(&parent));
        assert_eq!(child.get("color"), Some("rgb(0, 0, 128)"));
        assert_eq!(child.get("font-size"), Some("20px"));
        // background-color is not inherited
        assert_eq!(child.get("background-color"), Some("rgba(0, 0, 0, 0)"));
    }

    #[test]
    fn test_em_units_use_own_font_size() {
        let parent = compute("font-size: 10px", None);
        let child = compute("font-size: 2em; padding-top: 1em", Some(&parent));
        assert_eq!(child.get("font-size"), Some("20px"));
        assert_eq!(child.get("padding-top"), Some("20px"));
    }

    #[test]
    fn test_font_weight_keywords() {
        let parent = compute("font-weight: bold", None);
        assert_eq!(parent.get("font-weight"), Some("700"));
        let child = compute("font-weight: bolder", Some(&parent));
        assert_eq!(child.get("font-weight"), Some("900"));
    }

    #[test]
    fn test_line_height_factor_resolves_to_px() {
        let style = compute("font-size: 10px; line-height: 1.5", None);
        assert_eq!(style.get("line-height"), Some("15px"));
    }

    #[test]
    fn test_invalid_value_falls_back() {
        let parent = compute("color: #123456", None);
        let child = compute("color: not-a-color; display: bogus", Some(&parent));
        assert_eq!(child.get("color"), Some("rgb(18, 52, 86)"));
        assert_eq!(child.get("display"), Some("block"));
    }

    #[test]
    fn test_explicit_inherit_for_non_inherited_property() {
        let parent = compute("background-color: white", None);
        let child = compute("background-color: inherit", Some(&parent));
        assert_eq!(child.get("background-color"), Some("rgb(255, 255, 255)"));
    }

    #[test]
    fn test_color_parsing() {
        assert_eq!(Color::parse("#fff"), Some(Color::WHITE));
        assert_eq!(Color::parse("#00000000"), Some(Color::TRANSPARENT));
        assert_eq!(
            Color::parse("rgba(10, 20, 30, 0.5)").map(|c| c.to_css()),
            Some("rgba(10, 20, 30, 0.5)".to_string())
        );
        assert_eq!(
            Color::parse("rgb(10 20 30 / 50%)").map(|c| c.to_css()),
            Some("rgba(10, 20, 30, 0.5)".to_string())
        );
        assert_eq!(Color::parse("Grey"), Some(Color::rgb(128, 128, 128)));
        assert!(Color::parse("#12").is_none());
        assert!(Color::parse("rgb(1, 2)").is_none());
    }

    #[test]
    fn test_background_shorthand_takes_color() {
        let style = compute("background: #fafafa none repeat", None);
        assert_eq!(style.get("background-color"), Some("rgb(250, 250, 250)"));
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(16.0), "16");
        assert_eq!(format_number(0.5), "0.5");
        assert_eq!(format_number(13.33333), "13.333");
        assert_eq!(format_number(-0.0), "0");
        assert_eq!(format_number(0.0004), "0.0004");
    }

    #[test]
    fn test_format_fixed_never_collapses_nonzero() {
        assert_eq!(format_fixed(1.0 / 65535.0, 4), "0.00001526");
        assert_eq!(format_fixed(0.00004, 4), "0.00004");
        assert_eq!(format_fixed(-0.00004, 4), "-0.00004");
        assert_eq!(format_fixed(1e-30, 4), "0.00000000000000000001");
        assert_eq!(format_fixed(0.0, 4), "0");
        assert_eq!(format_fixed(0.00006, 4), "0.0001");
        assert_eq!(format_fixed(100.0, 4), "100");
    }
}
