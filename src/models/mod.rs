// Rendering models shared by items, the surface and the display

mod font;
mod region;

pub use font::{FONT_SIZE, Font, Typeface};
pub use region::Region;

/// Window visibility as reported by the window system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Visibility {
    #[default]
    Unobscured,
    PartiallyObscured,
    FullyObscured,
}

impl Visibility {
    /// True when no pixel of the window can be seen; drawing is skipped.
    pub fn is_fully_obscured(self) -> bool {
        self == Visibility::FullyObscured
    }
}
