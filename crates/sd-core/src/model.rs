//! Core data model for scene content.
//!
//! A document's content is a flat, ordered list of objects placed on a 2D
//! surface. Two object kinds exist: text (styleable) and image. The list
//! order is the stacking order and is preserved across serialize/restore
//! round-trips. [`SceneContent`] is the portable interchange form; the live
//! retained graph belongs to the scene engine.

use crate::image::ImageResource;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

// ─── Color ───────────────────────────────────────────────────────────────

/// Parse a single hex digit.
fn hex_val(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'a'..=b'f' => Some(c - b'a' + 10),
        b'A'..=b'F' => Some(c - b'A' + 10),
        _ => None,
    }
}

/// RGBA color, 8 bits per channel.
///
/// Serialized as its hex string (`"#RRGGBB"`, or `"#RRGGBBAA"` when not
/// fully opaque), which is the form style controls exchange.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const BLACK: Color = Color::rgb(0x00, 0x00, 0x00);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 0xFF }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Parse `#RGB`, `#RRGGBB` or `#RRGGBBAA`. The `#` is optional.
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.strip_prefix('#').unwrap_or(hex);
        let b = hex.as_bytes();
        match b.len() {
            3 => {
                let r = hex_val(b[0])?;
                let g = hex_val(b[1])?;
                let bl = hex_val(b[2])?;
                Some(Self::rgb(r * 17, g * 17, bl * 17))
            }
            6 => Some(Self::rgb(
                hex_val(b[0])? << 4 | hex_val(b[1])?,
                hex_val(b[2])? << 4 | hex_val(b[3])?,
                hex_val(b[4])? << 4 | hex_val(b[5])?,
            )),
            8 => Some(Self::rgba(
                hex_val(b[0])? << 4 | hex_val(b[1])?,
                hex_val(b[2])? << 4 | hex_val(b[3])?,
                hex_val(b[4])? << 4 | hex_val(b[5])?,
                hex_val(b[6])? << 4 | hex_val(b[7])?,
            )),
            _ => None,
        }
    }

    /// Emit as the shortest hex string that keeps full fidelity.
    pub fn to_hex(&self) -> String {
        if self.a == 0xFF {
            format!("#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
        } else {
            format!("#{:02X}{:02X}{:02X}{:02X}", self.r, self.g, self.b, self.a)
        }
    }
}

impl fmt::Debug for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl Serialize for Color {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Color {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Color::from_hex(&s)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid hex color: {s}")))
    }
}

// ─── Text style ──────────────────────────────────────────────────────────

/// The styleable properties of a text object.
///
/// Doubles as the session's global style state: the same four fields are
/// what the style controls edit and what a newly created text object
/// inherits.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TextStyle {
    pub fill: Color,
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            fill: Color::BLACK,
            bold: false,
            italic: false,
            underline: false,
        }
    }
}

/// A single styleable property with its new value.
///
/// Style controls push one property per interaction; there is no batched
/// "apply all" operation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StyleProperty {
    Fill(Color),
    Bold(bool),
    Italic(bool),
    Underline(bool),
}

impl TextStyle {
    /// Overwrite the single field addressed by `property`.
    pub fn apply(&mut self, property: StyleProperty) {
        match property {
            StyleProperty::Fill(c) => self.fill = c,
            StyleProperty::Bold(v) => self.bold = v,
            StyleProperty::Italic(v) => self.italic = v,
            StyleProperty::Underline(v) => self.underline = v,
        }
    }
}

// ─── Objects ─────────────────────────────────────────────────────────────

/// Position of an object's top-left corner on the surface.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f32,
    pub y: f32,
}

impl Position {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// The object kinds a scene can contain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ObjectKind {
    /// Editable text with baked-in style.
    Text {
        content: String,
        font_size: f32,
        style: TextStyle,
    },
    /// A placed raster image at a uniform scale.
    Image { source: ImageResource, scale: f32 },
}

/// One object in the portable content format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneObject {
    pub position: Position,
    pub kind: ObjectKind,
}

impl SceneObject {
    pub fn new(position: Position, kind: ObjectKind) -> Self {
        Self { position, kind }
    }

    /// Whether this object is text-capable (can receive style pushes).
    pub fn is_text(&self) -> bool {
        matches!(self.kind, ObjectKind::Text { .. })
    }

    /// The object's text style, when text-capable.
    pub fn text_style(&self) -> Option<&TextStyle> {
        match &self.kind {
            ObjectKind::Text { style, .. } => Some(style),
            ObjectKind::Image { .. } => None,
        }
    }
}

// ─── Portable content ────────────────────────────────────────────────────

/// The serialized form of a whole scene: its objects in stacking order.
///
/// This is what `save` writes into a document record and what `restore`
/// rebuilds a scene from. Round-trip invariant:
/// `serialize(restore(serialize(s))) == serialize(s)`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SceneContent {
    pub objects: Vec<SceneObject>,
}

impl SceneContent {
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Encode as JSON, the interchange encoding.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Decode from JSON.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
