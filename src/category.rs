use ratatui::style::Color;
use serde::{Deserialize, Deserializer};
use std::str::FromStr;

/// Icon color used when a KML style map resolves but carries no usable color
pub const DEFAULT_ICON_COLOR: &str = "lightgreen";

/// Color for KML containers that reference no style map at all
pub const UNSTYLED_COLOR: &str = "red";

/// Styling and grouping unit for points. Identity is the name.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub name: String,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub icon_url: Option<String>,
    #[serde(default, deserialize_with = "lenient_bool")]
    pub display_on_load: Option<bool>,
    #[serde(default, deserialize_with = "lenient_bool")]
    pub browsable: Option<bool>,
    #[serde(default)]
    pub remote_data: Option<serde_json::Value>,
    /// Numeric in older exports, a UUID string in newer ones
    #[serde(default)]
    pub id: Option<serde_json::Value>,
}

/// Flags of the wrong type read as unset instead of failing the layer
fn lenient_bool<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<bool>, D::Error> {
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(value.as_bool())
}

impl Category {
    pub fn new(name: impl Into<String>, color: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            color: Some(color.into()),
            ..Default::default()
        }
    }
}

/// One legend row: category name and its first-seen color
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Legend {
    pub name: String,
    pub color: String,
}

/// Map a CSS-style color (hex or name) onto a terminal color.
/// Unknown names render white.
pub fn terminal_color(css: &str) -> Color {
    let css = css.trim().to_ascii_lowercase();
    if let Some(hex) = css.strip_prefix('#') {
        return parse_hex(hex).unwrap_or(Color::White);
    }
    css_name(&css)
        .or_else(|| Color::from_str(&css).ok())
        .unwrap_or(Color::White)
}

/// `#rgb`, `#rrggbb` and `#rrggbbaa` (alpha dropped)
fn parse_hex(hex: &str) -> Option<Color> {
    if !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    let channel = |s: &str| u8::from_str_radix(s, 16).ok();
    match hex.len() {
        3 => {
            let r = channel(&hex[0..1])?;
            let g = channel(&hex[1..2])?;
            let b = channel(&hex[2..3])?;
            Some(Color::Rgb(r * 17, g * 17, b * 17))
        }
        6 | 8 => Some(Color::Rgb(
            channel(&hex[0..2])?,
            channel(&hex[2..4])?,
            channel(&hex[4..6])?,
        )),
        _ => None,
    }
}

/// CSS names the terminal palette lacks, or where the palette differs from CSS
fn css_name(name: &str) -> Option<Color> {
    let rgb = match name {
        "orange" => (255, 165, 0),
        "purple" => (128, 0, 128),
        "pink" => (255, 192, 203),
        "brown" => (165, 42, 42),
        "navy" => (0, 0, 128),
        "teal" => (0, 128, 128),
        "olive" => (128, 128, 0),
        "maroon" => (128, 0, 0),
        "lime" => (0, 255, 0),
        "darkgreen" => (0, 100, 0),
        "darkblue" => (0, 0, 139),
        "darkred" => (139, 0, 0),
        "lightgreen" => (144, 238, 144),
        _ => return None,
    };
    Some(Color::Rgb(rgb.0, rgb.1, rgb.2))
}
