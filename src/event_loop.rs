// Scheduler: the single consumer of every item stream and of the display's
// events. It owns the canvas, so all drawing happens here, one event at a time.

use std::future::Future;
use std::task::Poll;

use tokio::sync::mpsc;
use tracing::{debug, info, trace, warn};

use crate::display::{DisplaySurface, SurfaceEvent};
use crate::item::{Canvas, Item};
use crate::models::Visibility;
use crate::typesetter::Typesetter;

/// Key that toggles fullscreen.
pub const FULLSCREEN_KEY: char = 'f';

/// Counters kept while running; logged on termination.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct LoopStats {
    /// Texts that changed an item and were drawn.
    pub rendered: u64,
    /// Texts equal to what the item already shows.
    pub unchanged: u64,
    /// Texts received while the window was fully obscured.
    pub dropped_obscured: u64,
    pub pings: u64,
    pub exposes: u64,
}

/// Final state handed back once the loop stops.
pub struct Terminated<D, T> {
    pub stats: LoopStats,
    pub visibility: Visibility,
    pub canvas: Canvas<D, T>,
    pub items: Vec<Item>,
}

pub struct EventLoop<D, T> {
    items: Vec<Item>,
    canvas: Canvas<D, T>,
    events: mpsc::Receiver<SurfaceEvent>,
    visibility: Visibility,
    next_item: usize,
    stats: LoopStats,
}

impl<D: DisplaySurface, T: Typesetter> EventLoop<D, T> {
    pub fn new(
        items: Vec<Item>,
        canvas: Canvas<D, T>,
        events: mpsc::Receiver<SurfaceEvent>,
    ) -> Self {
        Self {
            items,
            canvas,
            events,
            visibility: Visibility::default(),
            next_item: 0,
            stats: LoopStats::default(),
        }
    }

    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    /// Runs until a close request arrives or the display's event stream ends.
    pub async fn run(mut self) -> Terminated<D, T> {
        loop {
            tokio::select! {
                event = self.events.recv() => match event {
                    Some(SurfaceEvent::CloseRequested) => {
                        debug!("close requested");
                        break;
                    }
                    Some(event) => self.handle_event(event),
                    None => {
                        debug!("display event stream ended");
                        break;
                    }
                },
                (index, text) = next_text(&mut self.items, &mut self.next_item) => {
                    self.handle_text(index, text);
                }
            }
        }

        info!(
            rendered = self.stats.rendered,
            unchanged = self.stats.unchanged,
            dropped_obscured = self.stats.dropped_obscured,
            exposes = self.stats.exposes,
            "event loop terminated"
        );
        Terminated {
            stats: self.stats,
            visibility: self.visibility,
            canvas: self.canvas,
            items: self.items,
        }
    }

    fn handle_event(&mut self, event: SurfaceEvent) {
        match event {
            SurfaceEvent::Ping(ack) => {
                self.stats.pings += 1;
                let _ = ack.send(());
            }
            SurfaceEvent::Expose => {
                self.stats.exposes += 1;
                if let Err(e) = self.canvas.repaint() {
                    warn!(error = %e, "repaint after expose failed");
                }
            }
            SurfaceEvent::VisibilityChanged(visibility) => {
                debug!(?visibility, "visibility changed");
                self.visibility = visibility;
            }
            SurfaceEvent::KeyPress(FULLSCREEN_KEY) => {
                if let Err(e) = self.canvas.display.toggle_fullscreen() {
                    warn!(error = %e, "fullscreen toggle failed");
                }
            }
            SurfaceEvent::KeyPress(key) => trace!(%key, "key ignored"),
            SurfaceEvent::CloseRequested => {}
        }
    }

    fn handle_text(&mut self, index: usize, text: Option<String>) {
        let item = &mut self.items[index];
        let Some(text) = text else {
            debug!(item = item.name(), "item stream ended");
            return;
        };
        // Received either way, so the sampler is never held up by an obscured window.
        if self.visibility.is_fully_obscured() {
            self.stats.dropped_obscured += 1;
            trace!(item = item.name(), "obscured; text dropped");
            return;
        }
        match item.update(text, &mut self.canvas) {
            Ok(true) => self.stats.rendered += 1,
            Ok(false) => self.stats.unchanged += 1,
            Err(e) => warn!(item = item.name(), error = %e, "blit failed"),
        }
    }
}

/// Resolves with the next line from any open item. Items are polled round-robin
/// starting after the one served last, so a busy stream cannot starve the rest.
/// `None` marks a stream that just closed.
fn next_text<'a>(
    items: &'a mut [Item],
    cursor: &'a mut usize,
) -> impl Future<Output = (usize, Option<String>)> + 'a {
    std::future::poll_fn(move |cx| {
        let len = items.len();
        for step in 0..len {
            let index = (*cursor + step) % len;
            if let Poll::Ready(text) = items[index].poll_next(cx) {
                *cursor = (index + 1) % len;
                return Poll::Ready((index, text));
            }
        }
        Poll::Pending
    })
}
