// Pixel rectangle in surface coordinates

/// Axis-aligned rectangle anchored at its top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Region {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Region {
    pub fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn right(&self) -> i32 {
        self.x.saturating_add(self.width as i32)
    }

    pub fn bottom(&self) -> i32 {
        self.y.saturating_add(self.height as i32)
    }

    /// Intersection with a `width` x `height` area at the origin.
    /// Returns an empty region (at the clamped anchor) when nothing overlaps.
    pub fn clip(&self, width: u32, height: u32) -> Region {
        let left = self.x.clamp(0, width as i32);
        let top = self.y.clamp(0, height as i32);
        let right = self.right().clamp(left, width as i32);
        let bottom = self.bottom().clamp(top, height as i32);
        Region::new(left, top, (right - left) as u32, (bottom - top) as u32)
    }
}
