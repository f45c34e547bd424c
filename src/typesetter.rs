//! Text measurement and glyph rasterization.
//!
//! The renderer only needs two primitives from an outline-font engine: the
//! extent of a string at a font size, and drawing that string into the backing
//! surface. [`CosmicTypesetter`] provides both with cosmic-text, using a private
//! font database that holds only the fonts loaded through it.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use cosmic_text::{
    Attrs, Buffer, Color as CosmicColor, Family, FontSystem, Metrics, Shaping, SwashCache,
    SwashContent, fontdb,
};
use tiny_skia::PixmapMut;

use crate::models::{Font, Typeface};
use crate::surface::Surface;

/// Line height as a multiple of the font size.
const LINE_SPACING: f32 = 1.2;

#[derive(Debug, thiserror::Error)]
pub enum TypesetError {
    #[error("cannot load font {path}: {source}")]
    Load {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("{0} contains no usable font face")]
    NoFace(PathBuf),
}

pub trait Typesetter {
    /// Width and height in pixels of `text` set in `font`.
    fn extents(&mut self, font: &Font, text: &str) -> (u32, u32);

    /// Draws `text` with its top-left corner at (x, y).
    fn draw(&mut self, surface: &mut Surface, font: &Font, x: i32, y: i32, text: &str);
}

pub struct CosmicTypesetter {
    font_system: FontSystem,
    swash_cache: SwashCache,
}

impl Default for CosmicTypesetter {
    fn default() -> Self {
        Self::new()
    }
}

impl CosmicTypesetter {
    /// Typesetter with an empty font database; see [`Self::load_typeface`].
    pub fn new() -> Self {
        Self {
            font_system: FontSystem::new_with_locale_and_db(
                "en-US".to_string(),
                fontdb::Database::new(),
            ),
            swash_cache: SwashCache::new(),
        }
    }

    /// Loads an outline font file and returns the handle its first face registered.
    pub fn load_typeface(&mut self, path: &Path) -> Result<Typeface, TypesetError> {
        let db = self.font_system.db_mut();
        let known: HashSet<fontdb::ID> = db.faces().map(|face| face.id).collect();
        db.load_font_file(path).map_err(|source| TypesetError::Load {
            path: path.to_path_buf(),
            source,
        })?;

        db.faces()
            .filter(|face| !known.contains(&face.id))
            .find_map(|face| face.families.first().map(|(name, _)| name.clone()))
            .map(Typeface::new)
            .ok_or_else(|| TypesetError::NoFace(path.to_path_buf()))
    }

    fn layout(&mut self, font: &Font, text: &str) -> Buffer {
        let metrics = Metrics::new(font.size, font.size * LINE_SPACING);
        let mut buffer = Buffer::new(&mut self.font_system, metrics);
        let attrs = Attrs::new().family(Family::Name(&font.typeface.family));
        buffer.set_text(&mut self.font_system, text, &attrs, Shaping::Advanced, None);
        buffer.shape_until_scroll(&mut self.font_system, false);
        buffer
    }
}

impl Typesetter for CosmicTypesetter {
    fn extents(&mut self, font: &Font, text: &str) -> (u32, u32) {
        let buffer = self.layout(font, text);
        let (mut width, mut height) = (0.0f32, 0.0f32);
        for run in buffer.layout_runs() {
            width = width.max(run.line_w);
            height += run.line_height;
        }
        (width.ceil() as u32, height.ceil() as u32)
    }

    fn draw(&mut self, surface: &mut Surface, font: &Font, x: i32, y: i32, text: &str) {
        let buffer = self.layout(font, text);
        let color = CosmicColor::rgba(
            font.color.red(),
            font.color.green(),
            font.color.blue(),
            font.color.alpha(),
        );
        let mut pixmap = surface.pixmap_mut().as_mut();

        for run in buffer.layout_runs() {
            for glyph in run.glyphs.iter() {
                let physical = glyph.physical((x as f32, y as f32 + run.line_y), 1.0);
                let Some(image) = self
                    .swash_cache
                    .get_image(&mut self.font_system, physical.cache_key)
                else {
                    continue;
                };
                if !matches!(image.content, SwashContent::Mask) {
                    continue;
                }
                blend_mask(
                    &mut pixmap,
                    &image.data,
                    image.placement.width,
                    image.placement.height,
                    physical.x + image.placement.left,
                    physical.y - image.placement.top,
                    color,
                );
            }
        }
    }
}

/// Composites an 8-bit coverage mask in `color` over premultiplied pixels.
fn blend_mask(
    pixmap: &mut PixmapMut,
    mask: &[u8],
    mask_width: u32,
    mask_height: u32,
    dest_x: i32,
    dest_y: i32,
    color: CosmicColor,
) {
    let width = pixmap.width() as i32;
    let height = pixmap.height() as i32;
    let data = pixmap.data_mut();

    for my in 0..mask_height as i32 {
        let py = dest_y + my;
        if py < 0 || py >= height {
            continue;
        }
        for mx in 0..mask_width as i32 {
            let px = dest_x + mx;
            if px < 0 || px >= width {
                continue;
            }
            let Some(&coverage) = mask.get((my * mask_width as i32 + mx) as usize) else {
                continue;
            };
            if coverage == 0 {
                continue;
            }

            let i = ((py * width + px) * 4) as usize;
            let src_a = coverage as u32 * color.a() as u32 / 255;
            let inv_a = 255 - src_a;
            data[i] = ((color.r() as u32 * src_a + data[i] as u32 * inv_a) / 255) as u8;
            data[i + 1] = ((color.g() as u32 * src_a + data[i + 1] as u32 * inv_a) / 255) as u8;
            data[i + 2] = ((color.b() as u32 * src_a + data[i + 2] as u32 * inv_a) / 255) as u8;
            data[i + 3] = (src_a + data[i + 3] as u32 * inv_a / 255) as u8;
        }
    }
}
