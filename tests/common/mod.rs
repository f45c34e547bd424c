// Shared test helpers: a display that records blits and a fixed-pitch typesetter

#![allow(dead_code)]

use csm::display::{DisplaySurface, SurfaceError, SurfaceEvent};
use csm::item::Canvas;
use csm::models::{FONT_SIZE, Font, Region, Typeface};
use csm::surface::Surface;
use csm::typesetter::Typesetter;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};

pub const GLYPH_WIDTH: u32 = 6;
pub const GLYPH_HEIGHT: u32 = 12;
pub const SURFACE_SIZE: u32 = 300;

#[derive(Debug, Clone)]
pub struct Blit {
    pub region: Region,
    pub pixels: Vec<u8>,
}

#[derive(Debug, Default)]
pub struct RecordingDisplay {
    pub blits: Vec<Blit>,
    pub fullscreen_toggles: u32,
    /// When set, every blit fails (after being recorded).
    pub fail_blits: bool,
}

impl DisplaySurface for RecordingDisplay {
    fn blit(&mut self, region: Region, pixels: &[u8]) -> Result<(), SurfaceError> {
        self.blits.push(Blit {
            region,
            pixels: pixels.to_vec(),
        });
        if self.fail_blits {
            return Err(SurfaceError::Unsupported("blit rejected".into()));
        }
        Ok(())
    }

    fn toggle_fullscreen(&mut self) -> Result<(), SurfaceError> {
        self.fullscreen_toggles += 1;
        Ok(())
    }
}

/// Every character is a solid GLYPH_WIDTH x GLYPH_HEIGHT block in the font colour.
#[derive(Debug, Default)]
pub struct BlockTypesetter {
    pub measured: Vec<String>,
    pub drawn: Vec<(String, i32, i32)>,
}

impl Typesetter for BlockTypesetter {
    fn extents(&mut self, _font: &Font, text: &str) -> (u32, u32) {
        self.measured.push(text.to_string());
        (text.chars().count() as u32 * GLYPH_WIDTH, GLYPH_HEIGHT)
    }

    fn draw(&mut self, surface: &mut Surface, font: &Font, x: i32, y: i32, text: &str) {
        self.drawn.push((text.to_string(), x, y));
        let width = text.chars().count() as u32 * GLYPH_WIDTH;
        let region = surface.clip(Region::new(x, y, width, GLYPH_HEIGHT));
        let stride = surface.width() as usize * 4;
        let c = font.color;
        let data = surface.pixmap_mut().data_mut();
        for row in region.y..region.bottom() {
            for col in region.x..region.right() {
                let i = row as usize * stride + col as usize * 4;
                data[i..i + 4].copy_from_slice(&[c.red(), c.green(), c.blue(), c.alpha()]);
            }
        }
    }
}

pub fn font() -> Arc<Font> {
    font_with_color([0x00, 0xff, 0x00, 0xff])
}

pub fn font_with_color(rgba: [u8; 4]) -> Arc<Font> {
    Arc::new(Font::from_rgba(rgba, FONT_SIZE, Typeface::new("Block")))
}

pub fn canvas() -> Canvas<RecordingDisplay, BlockTypesetter> {
    canvas_sized(SURFACE_SIZE, SURFACE_SIZE)
}

pub fn canvas_sized(width: u32, height: u32) -> Canvas<RecordingDisplay, BlockTypesetter> {
    Canvas::new(
        Surface::new(width, height).expect("surface"),
        RecordingDisplay::default(),
        BlockTypesetter::default(),
    )
}

/// Sends a ping and waits for the acknowledgement, i.e. until every event sent
/// before it has been handled.
pub async fn ping(events: &mpsc::Sender<SurfaceEvent>) {
    let (ack_tx, ack_rx) = oneshot::channel();
    events
        .send(SurfaceEvent::Ping(ack_tx))
        .await
        .expect("event loop running");
    ack_rx.await.expect("ping acknowledged");
}

/// Yields until the consumer has taken every queued line from `tx`'s channel.
pub async fn drained(tx: &mpsc::Sender<String>) {
    while tx.capacity() < tx.max_capacity() {
        tokio::task::yield_now().await;
    }
}
