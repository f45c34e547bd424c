// Item: one sampler's stream bound to a row of the backing surface, and the
// incremental renderer that redraws only that row's text.

use std::sync::Arc;
use std::task::{Context, Poll};

use tokio::sync::mpsc;
use tracing::trace;

use crate::display::{DisplaySurface, SurfaceError};
use crate::models::{Font, Region};
use crate::surface::Surface;
use crate::typesetter::Typesetter;

/// Left edge of every status line.
pub const LEFT_MARGIN: i32 = 10;

/// Everything the renderer writes to. Owned by the event loop alone.
pub struct Canvas<D, T> {
    pub surface: Surface,
    pub display: D,
    pub typesetter: T,
}

impl<D: DisplaySurface, T: Typesetter> Canvas<D, T> {
    pub fn new(surface: Surface, display: D, typesetter: T) -> Self {
        Self {
            surface,
            display,
            typesetter,
        }
    }

    /// Blits the whole backing surface, e.g. after an expose.
    pub fn repaint(&mut self) -> Result<(), SurfaceError> {
        let bounds = self.surface.bounds();
        let pixels = self.surface.flush(bounds);
        self.display.blit(bounds, &pixels)
    }
}

pub struct Item {
    name: &'static str,
    source: mpsc::Receiver<String>,
    source_closed: bool,
    displayed: String,
    offset: i32,
    font: Arc<Font>,
}

impl Item {
    pub fn new(
        name: &'static str,
        source: mpsc::Receiver<String>,
        offset: i32,
        font: Arc<Font>,
    ) -> Self {
        Self {
            name,
            source,
            source_closed: false,
            displayed: String::new(),
            offset,
            font,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// The text most recently drawn, empty before the first draw.
    pub fn displayed(&self) -> &str {
        &self.displayed
    }

    pub fn offset(&self) -> i32 {
        self.offset
    }

    pub fn font(&self) -> &Font {
        &self.font
    }

    /// True once the sampler has stopped and every queued line was received.
    pub fn is_closed(&self) -> bool {
        self.source_closed
    }

    /// Polls for the next status line. A closed stream is remembered and
    /// reported as pending from then on.
    pub fn poll_next(&mut self, cx: &mut Context<'_>) -> Poll<Option<String>> {
        if self.source_closed {
            return Poll::Pending;
        }
        match self.source.poll_recv(cx) {
            Poll::Ready(None) => {
                self.source_closed = true;
                Poll::Ready(None)
            }
            other => other,
        }
    }

    /// Redraws this item's row with `text`. Returns `Ok(false)` when `text` is
    /// already displayed.
    ///
    /// The erased and blitted rectangle is the extent of the *previous* text at
    /// (`LEFT_MARGIN`, offset). The very first text seeds `displayed`, so its
    /// own extent is used.
    pub fn update<D: DisplaySurface, T: Typesetter>(
        &mut self,
        text: String,
        canvas: &mut Canvas<D, T>,
    ) -> Result<bool, SurfaceError> {
        if text == self.displayed {
            return Ok(false);
        }
        if self.displayed.is_empty() {
            self.displayed.clone_from(&text);
        }

        let (width, height) = canvas.typesetter.extents(&self.font, &self.displayed);
        let region = canvas
            .surface
            .clip(Region::new(LEFT_MARGIN, self.offset, width, height));

        canvas.surface.clear(region);
        canvas
            .typesetter
            .draw(&mut canvas.surface, &self.font, LEFT_MARGIN, self.offset, &text);
        let pixels = canvas.surface.flush(region);
        trace!(item = self.name, %text, ?region, "redraw");
        self.displayed = text;
        canvas.display.blit(region, &pixels)?;
        Ok(true)
    }
}
