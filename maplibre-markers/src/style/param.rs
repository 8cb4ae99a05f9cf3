//! Style parameter keys and values.

use std::{fmt, str::FromStr};

use csscolorparser::Color;
use lyon::tessellation::{LineCap, LineJoin};
use serde_json::Value;

use crate::style::{context::FunctionId, stops::Stops};

/// RGBA color with components in `0.0..=1.0`.
pub type Rgba = [f32; 4];

/// Every parameter a styling document can set. Nested keys are joined with `:`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StyleParamKey {
    Style,
    Color,
    Width,
    Size,
    Order,
    Visible,
    Interactive,
    Cap,
    Join,
    MiterLimit,
    OutlineColor,
    OutlineWidth,
    Filter,
}

impl StyleParamKey {
    pub const ALL: [StyleParamKey; 13] = [
        StyleParamKey::Style,
        StyleParamKey::Color,
        StyleParamKey::Width,
        StyleParamKey::Size,
        StyleParamKey::Order,
        StyleParamKey::Visible,
        StyleParamKey::Interactive,
        StyleParamKey::Cap,
        StyleParamKey::Join,
        StyleParamKey::MiterLimit,
        StyleParamKey::OutlineColor,
        StyleParamKey::OutlineWidth,
        StyleParamKey::Filter,
    ];

    pub fn name(self) -> &'static str {
        match self {
            StyleParamKey::Style => "style",
            StyleParamKey::Color => "color",
            StyleParamKey::Width => "width",
            StyleParamKey::Size => "size",
            StyleParamKey::Order => "order",
            StyleParamKey::Visible => "visible",
            StyleParamKey::Interactive => "interactive",
            StyleParamKey::Cap => "cap",
            StyleParamKey::Join => "join",
            StyleParamKey::MiterLimit => "miter_limit",
            StyleParamKey::OutlineColor => "outline:color",
            StyleParamKey::OutlineWidth => "outline:width",
            StyleParamKey::Filter => "filter",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|key| key.name() == name)
    }

    /// Whether values of this key can be interpolated between zoom stops.
    pub fn is_interpolatable(self) -> bool {
        matches!(
            self,
            StyleParamKey::Color
                | StyleParamKey::Width
                | StyleParamKey::Size
                | StyleParamKey::MiterLimit
                | StyleParamKey::OutlineColor
                | StyleParamKey::OutlineWidth
        )
    }
}

impl fmt::Display for StyleParamKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum StyleParamValue {
    Bool(bool),
    Number(f32),
    Color(Rgba),
    String(String),
    Cap(LineCap),
    Join(LineJoin),
    /// Index into the scene's style functions, resolved at evaluation time.
    Function(FunctionId),
    /// Zoom stops, resolved at evaluation time.
    Stops(Stops),
}

impl StyleParamValue {
    /// Parses a constant value for `key`. Returns `None` if the value has the wrong shape.
    pub fn parse(key: StyleParamKey, value: &Value) -> Option<StyleParamValue> {
        match key {
            StyleParamKey::Style => value.as_str().map(|s| StyleParamValue::String(s.to_string())),
            StyleParamKey::Color | StyleParamKey::OutlineColor => {
                parse_color(value).map(StyleParamValue::Color)
            }
            StyleParamKey::Width
            | StyleParamKey::Size
            | StyleParamKey::Order
            | StyleParamKey::MiterLimit
            | StyleParamKey::OutlineWidth => parse_number(value).map(StyleParamValue::Number),
            StyleParamKey::Visible | StyleParamKey::Interactive | StyleParamKey::Filter => {
                value.as_bool().map(StyleParamValue::Bool)
            }
            StyleParamKey::Cap => value.as_str().and_then(parse_cap).map(StyleParamValue::Cap),
            StyleParamKey::Join => value
                .as_str()
                .and_then(parse_join)
                .map(StyleParamValue::Join),
        }
    }

    pub fn as_number(&self) -> Option<f32> {
        match self {
            StyleParamValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_color(&self) -> Option<Rgba> {
        match self {
            StyleParamValue::Color(c) => Some(*c),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            StyleParamValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            StyleParamValue::String(s) => Some(s),
            _ => None,
        }
    }
}

/// A single key-value pair of a draw rule.
#[derive(Clone, Debug, PartialEq)]
pub struct StyleParam {
    pub key: StyleParamKey,
    pub value: StyleParamValue,
}

impl StyleParam {
    pub fn new(key: StyleParamKey, value: StyleParamValue) -> Self {
        Self { key, value }
    }
}

/// Accepts plain numbers and pixel strings like `"4px"`.
pub fn parse_number(value: &Value) -> Option<f32> {
    if let Some(n) = value.as_f64() {
        return Some(n as f32);
    }
    let s = value.as_str()?.trim();
    s.strip_suffix("px").unwrap_or(s).trim().parse::<f32>().ok()
}

/// Accepts CSS color strings and `[r, g, b]` / `[r, g, b, a]` arrays in `0.0..=1.0`.
pub fn parse_color(value: &Value) -> Option<Rgba> {
    if let Some(s) = value.as_str() {
        let color = Color::from_str(s).ok()?;
        return Some([
            color.r as f32,
            color.g as f32,
            color.b as f32,
            color.a as f32,
        ]);
    }

    let components = value
        .as_array()?
        .iter()
        .map(|v| v.as_f64().map(|c| c as f32))
        .collect::<Option<Vec<_>>>()?;
    match components.as_slice() {
        [r, g, b] => Some([*r, *g, *b, 1.0]),
        [r, g, b, a] => Some([*r, *g, *b, *a]),
        _ => None,
    }
}

fn parse_cap(s: &str) -> Option<LineCap> {
    match s {
        "butt" => Some(LineCap::Butt),
        "square" => Some(LineCap::Square),
        "round" => Some(LineCap::Round),
        _ => None,
    }
}

fn parse_join(s: &str) -> Option<LineJoin> {
    match s {
        "miter" => Some(LineJoin::Miter),
        "bevel" => Some(LineJoin::Bevel),
        "round" => Some(LineJoin::Round),
        _ => None,
    }
}
