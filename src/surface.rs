// Off-screen backing surface: one premultiplied RGBA pixmap sized to the window.
// Only the event loop holds it mutably.

use crate::models::Region;
use tiny_skia::Pixmap;

pub struct Surface {
    pixmap: Pixmap,
}

impl Surface {
    /// Fully transparent surface. `None` when either dimension is zero.
    pub fn new(width: u32, height: u32) -> Option<Self> {
        Pixmap::new(width, height).map(|pixmap| Self { pixmap })
    }

    pub fn width(&self) -> u32 {
        self.pixmap.width()
    }

    pub fn height(&self) -> u32 {
        self.pixmap.height()
    }

    pub fn bounds(&self) -> Region {
        Region::new(0, 0, self.width(), self.height())
    }

    pub fn clip(&self, region: Region) -> Region {
        region.clip(self.width(), self.height())
    }

    pub fn pixmap(&self) -> &Pixmap {
        &self.pixmap
    }

    pub fn pixmap_mut(&mut self) -> &mut Pixmap {
        &mut self.pixmap
    }

    /// Premultiplied RGBA at (x, y), or `None` outside the surface.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        let p = self.pixmap.pixel(x, y)?;
        Some([p.red(), p.green(), p.blue(), p.alpha()])
    }

    /// Sets every channel of every pixel in `region` to zero.
    pub fn clear(&mut self, region: Region) {
        let region = self.clip(region);
        if region.is_empty() {
            return;
        }
        let stride = self.width() as usize * 4;
        let start = region.x as usize * 4;
        let end = start + region.width as usize * 4;
        let data = self.pixmap.data_mut();
        for row in region.y as usize..region.bottom() as usize {
            data[row * stride + start..row * stride + end].fill(0);
        }
    }

    /// Copies `region` out as tightly packed BGRA rows, the layout the window
    /// expects for 32 bits-per-pixel images.
    pub fn flush(&self, region: Region) -> Vec<u8> {
        let region = self.clip(region);
        let mut out = Vec::with_capacity(region.width as usize * region.height as usize * 4);
        if region.is_empty() {
            return out;
        }
        let stride = self.width() as usize * 4;
        let start = region.x as usize * 4;
        let end = start + region.width as usize * 4;
        let data = self.pixmap.data();
        for row in region.y as usize..region.bottom() as usize {
            for rgba in data[row * stride + start..row * stride + end].chunks_exact(4) {
                out.extend_from_slice(&[rgba[2], rgba[1], rgba[0], rgba[3]]);
            }
        }
        out
    }
}
