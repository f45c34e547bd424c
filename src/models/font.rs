// Font: colour, point size and a typeface handle

use tiny_skia::ColorU8;

/// Every item is drawn at this size.
pub const FONT_SIZE: f32 = 12.0;

/// Handle to a typeface registered with a typesetter (the family name it was loaded under).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Typeface {
    pub family: String,
}

impl Typeface {
    pub fn new(family: impl Into<String>) -> Self {
        Self {
            family: family.into(),
        }
    }
}

/// Immutable after construction; shared by reference (`Arc<Font>`) across items.
#[derive(Debug, Clone, PartialEq)]
pub struct Font {
    pub color: ColorU8,
    pub size: f32,
    pub typeface: Typeface,
}

impl Font {
    pub fn new(color: ColorU8, size: f32, typeface: Typeface) -> Self {
        Self {
            color,
            size,
            typeface,
        }
    }

    /// Font from an `[r, g, b, a]` colour as found in the config file.
    pub fn from_rgba(rgba: [u8; 4], size: f32, typeface: Typeface) -> Self {
        let [r, g, b, a] = rgba;
        Self::new(ColorU8::from_rgba(r, g, b, a), size, typeface)
    }
}
