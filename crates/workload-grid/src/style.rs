use core::fmt;
use std::collections::HashMap;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// An ARGB color, serialized as a `#AARRGGBB` hex string.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Color {
    pub argb: u32,
}

impl Color {
    pub const fn new_argb(argb: u32) -> Self {
        Self { argb }
    }

    /// Opaque color from RGB components.
    pub const fn from_rgb(r: u8, g: u8, b: u8) -> Self {
        Self {
            argb: 0xFF00_0000 | ((r as u32) << 16) | ((g as u32) << 8) | b as u32,
        }
    }

    pub const fn white() -> Self {
        Self { argb: 0xFFFF_FFFF }
    }

    /// `(a, r, g, b)` channel split.
    pub const fn channels(self) -> (u8, u8, u8, u8) {
        (
            (self.argb >> 24) as u8,
            (self.argb >> 16) as u8,
            (self.argb >> 8) as u8,
            self.argb as u8,
        )
    }

    /// Parse `#AARRGGBB`, `AARRGGBB` or `RRGGBB` (opaque).
    pub fn parse_hex(s: &str) -> Option<Self> {
        let hex = s.trim();
        let hex = hex.strip_prefix('#').unwrap_or(hex);
        let value = u32::from_str_radix(hex, 16).ok()?;
        match hex.len() {
            8 => Some(Self::new_argb(value)),
            6 => Some(Self::new_argb(0xFF00_0000 | value)),
            _ => None,
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:08X}", self.argb)
    }
}

impl Serialize for Color {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Color {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        if !s.trim().starts_with('#') {
            return Err(D::Error::custom(
                "color must be a #AARRGGBB hex string (missing '#')",
            ));
        }
        Color::parse_hex(&s).ok_or_else(|| D::Error::custom(format!("invalid hex color {s:?}")))
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct Font {
    #[serde(default, skip_serializing_if = "is_false")]
    pub bold: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub italic: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<Color>,
}

/// Solid background fill.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct Fill {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background: Option<Color>,
}

impl Fill {
    pub fn solid(color: Color) -> Self {
        Self {
            background: Some(color),
        }
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineStyle {
    #[default]
    None,
    Thin,
    Medium,
    Thick,
    Dashed,
    Double,
}

/// Per-edge border lines sharing one color.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Border {
    pub top: LineStyle,
    pub right: LineStyle,
    pub bottom: LineStyle,
    pub left: LineStyle,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<Color>,
}

impl Border {
    pub fn all(line: LineStyle, color: Color) -> Self {
        Self {
            top: line,
            right: line,
            bottom: line,
            left: line,
            color: Some(color),
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HorizontalAlignment {
    Left,
    Center,
    Right,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerticalAlignment {
    Top,
    Center,
    Bottom,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Alignment {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub horizontal: Option<HorizontalAlignment>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vertical: Option<VerticalAlignment>,
    #[serde(skip_serializing_if = "is_false")]
    pub wrap_text: bool,
}

impl Alignment {
    /// Centered both ways, as used on merged header runs.
    pub fn centered() -> Self {
        Self {
            horizontal: Some(HorizontalAlignment::Center),
            vertical: Some(VerticalAlignment::Center),
            wrap_text: false,
        }
    }
}

/// Cell style: font, fill, border and alignment.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct Style {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font: Option<Font>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fill: Option<Fill>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub border: Option<Border>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alignment: Option<Alignment>,
}

/// The empty style, stored at id `0` of every [`StyleTable`].
pub static DEFAULT_STYLE: Style = Style {
    font: None,
    fill: None,
    border: None,
    alignment: None,
};

impl Style {
    /// Background color, if a fill is set.
    pub fn background(&self) -> Option<Color> {
        self.fill.as_ref().and_then(|f| f.background)
    }
}

fn is_false(b: &bool) -> bool {
    !*b
}

/// Deduplicated table of styles, serialized as the plain style list.
///
/// Cells store a `style_id` into this table; id `0` is always the default
/// (empty) style.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(from = "Vec<Style>", into = "Vec<Style>")]
pub struct StyleTable {
    styles: Vec<Style>,
    index: HashMap<Style, u32>,
}

impl Default for StyleTable {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Vec<Style>> for StyleTable {
    fn from(mut styles: Vec<Style>) -> Self {
        if styles.is_empty() {
            styles.push(Style::default());
        }
        let mut index = HashMap::with_capacity(styles.len());
        for (id, style) in styles.iter().enumerate() {
            index.entry(style.clone()).or_insert(id as u32);
        }
        Self { styles, index }
    }
}

impl From<StyleTable> for Vec<Style> {
    fn from(table: StyleTable) -> Self {
        table.styles
    }
}

impl StyleTable {
    pub fn new() -> Self {
        Self::from(Vec::new())
    }

    /// Insert (or reuse) a style, returning its ID.
    pub fn intern(&mut self, style: Style) -> u32 {
        if let Some(&id) = self.index.get(&style) {
            return id;
        }
        let id = self.styles.len() as u32;
        self.index.insert(style.clone(), id);
        self.styles.push(style);
        id
    }

    pub fn get(&self, style_id: u32) -> Option<&Style> {
        self.styles.get(style_id as usize)
    }

    pub fn len(&self) -> usize {
        self.styles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.styles.is_empty()
    }
}

impl PartialEq for StyleTable {
    fn eq(&self, other: &Self) -> bool {
        self.styles == other.styles
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intern_deduplicates() {
        let mut table = StyleTable::new();
        let bold = Style {
            font: Some(Font {
                bold: true,
                ..Font::default()
            }),
            ..Style::default()
        };
        assert_eq!(table.intern(Style::default()), 0);
        assert_eq!(table.intern(bold.clone()), 1);
        assert_eq!(table.intern(bold), 1);
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn style_list_round_trip() {
        let mut table = StyleTable::new();
        table.intern(Style {
            fill: Some(Fill::solid(Color::from_rgb(255, 0, 0))),
            ..Style::default()
        });
        let json = serde_json::to_string(&table).unwrap();
        assert_eq!(json, r##"[{},{"fill":{"background":"#FFFF0000"}}]"##);
        let back: StyleTable = serde_json::from_str(&json).unwrap();
        assert_eq!(back, table);
        let empty: StyleTable = serde_json::from_str("[]").unwrap();
        assert_eq!(empty.len(), 1);
    }

    #[test]
    fn border_and_alignment_serialize_sparsely() {
        let style = Style {
            border: Some(Border::all(LineStyle::Thin, Color::from_rgb(0, 0, 0))),
            alignment: Some(Alignment::centered()),
            ..Style::default()
        };
        let json = serde_json::to_value(&style).unwrap();
        assert_eq!(json["border"]["left"], "thin");
        assert_eq!(json["border"]["color"], "#FF000000");
        assert_eq!(json["alignment"]["horizontal"], "center");
        assert!(json["alignment"].get("wrap_text").is_none());

        let back: Style = serde_json::from_str(r#"{"border":{"bottom":"double"}}"#).unwrap();
        let border = back.border.unwrap();
        assert_eq!(border.bottom, LineStyle::Double);
        assert_eq!(border.top, LineStyle::None);
    }

    #[test]
    fn color_hex_forms() {
        assert_eq!(Color::parse_hex("D0D0D0"), Some(Color::new_argb(0xFFD0_D0D0)));
        assert_eq!(Color::parse_hex("#80FF0000"), Some(Color::new_argb(0x80FF_0000)));
        assert_eq!(Color::parse_hex("#FFF"), None);
        assert_eq!(Color::from_rgb(0, 255, 0).to_string(), "#FF00FF00");

        let json = serde_json::to_string(&Color::white()).unwrap();
        assert_eq!(json, "\"#FFFFFFFF\"");
        assert!(serde_json::from_str::<Color>("\"FFFFFFFF\"").is_err());
    }
}
