//! X11 display surface
//!
//! Creates a plain top-level window through x11rb, blits BGRA image data with
//! core `PutImage` requests, and runs a blocking event pump on its own thread
//! that forwards window-system events to the event loop.

use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};
use x11rb::atom_manager;
use x11rb::connection::Connection;
use x11rb::protocol::Event;
use x11rb::protocol::xproto::{
    self, AtomEnum, ClientMessageEvent, ConnectionExt as _, CreateGCAux, CreateWindowAux,
    EventMask, Gcontext, ImageFormat, PropMode, Window, WindowClass,
};
use x11rb::rust_connection::RustConnection;
use x11rb::wrapper::ConnectionExt as _;

use super::{DisplaySurface, EVENT_CHANNEL_CAPACITY, SurfaceError, SurfaceEvent};
use crate::config::WindowConfig;
use crate::models::{Region, Visibility};

/// Upper bound on image bytes per request; the core protocol limit is 256 KiB.
const MAX_IMAGE_BYTES: usize = 64 * 1024;

/// ICCCM NormalState.
const WM_STATE_NORMAL: u32 = 1;

/// `_NET_WM_STATE` action: toggle the listed properties.
const NET_WM_STATE_TOGGLE: u32 = 2;

/// Source indication for client messages sent on behalf of the user.
const SOURCE_APPLICATION: u32 = 1;

atom_manager! {
    pub AtomCollection: AtomCollectionCookie {
        WM_PROTOCOLS,
        WM_DELETE_WINDOW,
        WM_STATE,
        UTF8_STRING,
        _NET_WM_NAME,
        _NET_WM_STATE,
        _NET_WM_STATE_FULLSCREEN,
    }
}

pub struct X11Display {
    conn: Arc<RustConnection>,
    root: Window,
    window: Window,
    gc: Gcontext,
    depth: u8,
    atoms: AtomCollection,
}

impl X11Display {
    /// Creates and maps the window, registers for expose, key-press, structure
    /// and visibility events, and opts into `WM_DELETE_WINDOW`.
    ///
    /// Returns the display together with the receiving end of its event stream.
    pub fn open(
        config: &WindowConfig,
    ) -> Result<(Self, mpsc::Receiver<SurfaceEvent>), SurfaceError> {
        let (conn, screen_num) = x11rb::connect(None)?;
        let conn = Arc::new(conn);
        let atoms = AtomCollection::new(conn.as_ref())?.reply()?;

        let setup = conn.setup();
        let screen = &setup.roots[screen_num];
        let (root, depth, visual) = (screen.root, screen.root_depth, screen.root_visual);
        let packs_32bpp = setup
            .pixmap_formats
            .iter()
            .any(|format| format.depth == depth && format.bits_per_pixel == 32);
        if !packs_32bpp {
            return Err(SurfaceError::Unsupported(format!(
                "root depth {} is not stored as 32 bits per pixel",
                depth
            )));
        }
        let keymap = Keymap::fetch(conn.as_ref())?;

        let window = conn.generate_id()?;
        let win_aux = CreateWindowAux::new().background_pixel(0).event_mask(
            EventMask::EXPOSURE
                | EventMask::KEY_PRESS
                | EventMask::STRUCTURE_NOTIFY
                | EventMask::VISIBILITY_CHANGE,
        );
        conn.create_window(
            depth,
            window,
            root,
            0,
            0,
            config.width as u16,
            config.height as u16,
            0,
            WindowClass::INPUT_OUTPUT,
            visual,
            &win_aux,
        )?;

        let gc = conn.generate_id()?;
        conn.create_gc(gc, window, &CreateGCAux::new())?;

        let display = Self {
            conn,
            root,
            window,
            gc,
            depth,
            atoms,
        };
        display.set_window_properties(&config.title)?;
        display.conn.map_window(window)?;
        display.conn.flush()?;

        let (tx, rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        let pump = EventPump {
            conn: display.conn.clone(),
            window,
            atoms,
            keymap,
            tx,
        };
        std::thread::Builder::new()
            .name("x11-events".into())
            .spawn(move || pump.run())
            .map_err(|e| SurfaceError::Unsupported(format!("cannot start event thread: {}", e)))?;

        debug!(window, depth, "X11 window mapped");
        Ok((display, rx))
    }

    fn set_window_properties(&self, title: &str) -> Result<(), SurfaceError> {
        let conn = self.conn.as_ref();
        conn.change_property8(
            PropMode::REPLACE,
            self.window,
            AtomEnum::WM_NAME,
            AtomEnum::STRING,
            title.as_bytes(),
        )?;
        conn.change_property8(
            PropMode::REPLACE,
            self.window,
            self.atoms._NET_WM_NAME,
            self.atoms.UTF8_STRING,
            title.as_bytes(),
        )?;
        conn.change_property32(
            PropMode::REPLACE,
            self.window,
            self.atoms.WM_PROTOCOLS,
            AtomEnum::ATOM,
            &[self.atoms.WM_DELETE_WINDOW],
        )?;
        conn.change_property32(
            PropMode::REPLACE,
            self.window,
            self.atoms.WM_STATE,
            self.atoms.WM_STATE,
            &[WM_STATE_NORMAL, x11rb::NONE],
        )?;
        Ok(())
    }
}

impl DisplaySurface for X11Display {
    fn blit(&mut self, region: Region, pixels: &[u8]) -> Result<(), SurfaceError> {
        if region.is_empty() {
            return Ok(());
        }
        let stride = region.width as usize * 4;
        let band_rows = (MAX_IMAGE_BYTES / stride).max(1);

        for (band, chunk) in pixels.chunks(stride * band_rows).enumerate() {
            let rows = chunk.len() / stride;
            let y = region.y + (band * band_rows) as i32;
            self.conn.put_image(
                ImageFormat::Z_PIXMAP,
                self.window,
                self.gc,
                region.width as u16,
                rows as u16,
                region.x as i16,
                y as i16,
                0,
                self.depth,
                chunk,
            )?;
        }
        self.conn.flush()?;
        Ok(())
    }

    fn toggle_fullscreen(&mut self) -> Result<(), SurfaceError> {
        let event = ClientMessageEvent::new(
            32,
            self.window,
            self.atoms._NET_WM_STATE,
            [
                NET_WM_STATE_TOGGLE,
                self.atoms._NET_WM_STATE_FULLSCREEN,
                x11rb::NONE,
                SOURCE_APPLICATION,
                0,
            ],
        );
        self.conn.send_event(
            false,
            self.root,
            EventMask::SUBSTRUCTURE_REDIRECT | EventMask::SUBSTRUCTURE_NOTIFY,
            event,
        )?;
        self.conn.flush()?;
        Ok(())
    }
}

impl Drop for X11Display {
    fn drop(&mut self) {
        let _ = self.conn.free_gc(self.gc);
        let _ = self.conn.destroy_window(self.window);
        let _ = self.conn.flush();
    }
}

/// Keycode to printable character, using the first keysym of each keycode.
struct Keymap {
    min_keycode: u8,
    keysyms_per_keycode: u8,
    keysyms: Vec<u32>,
}

impl Keymap {
    fn fetch(conn: &RustConnection) -> Result<Self, SurfaceError> {
        let setup = conn.setup();
        let (min, max) = (setup.min_keycode, setup.max_keycode);
        let reply = conn.get_keyboard_mapping(min, max - min + 1)?.reply()?;
        Ok(Self {
            min_keycode: min,
            keysyms_per_keycode: reply.keysyms_per_keycode,
            keysyms: reply.keysyms,
        })
    }

    fn char_for(&self, keycode: u8) -> Option<char> {
        let index =
            keycode.checked_sub(self.min_keycode)? as usize * self.keysyms_per_keycode as usize;
        let keysym = *self.keysyms.get(index)?;
        // Latin-1 keysyms in the printable ASCII range equal their code point.
        (0x20..0x7f).contains(&keysym).then(|| char::from(keysym as u8))
    }
}

/// Reads window-system events on a dedicated thread. Before each event is
/// dispatched the pump pings the event loop and waits for the acknowledgement.
struct EventPump {
    conn: Arc<RustConnection>,
    window: Window,
    atoms: AtomCollection,
    keymap: Keymap,
    tx: mpsc::Sender<SurfaceEvent>,
}

impl EventPump {
    fn run(self) {
        loop {
            let event = match self.conn.wait_for_event() {
                Ok(event) => event,
                Err(e) => {
                    warn!(error = %e, "X11 connection lost");
                    let _ = self.tx.blocking_send(SurfaceEvent::CloseRequested);
                    return;
                }
            };

            let (ack_tx, ack_rx) = oneshot::channel();
            if self.tx.blocking_send(SurfaceEvent::Ping(ack_tx)).is_err()
                || ack_rx.blocking_recv().is_err()
            {
                debug!("event loop gone; stopping event pump");
                return;
            }

            let Some(translated) = self.translate(event) else {
                continue;
            };
            let closing = matches!(translated, SurfaceEvent::CloseRequested);
            if self.tx.blocking_send(translated).is_err() || closing {
                return;
            }
        }
    }

    fn translate(&self, event: Event) -> Option<SurfaceEvent> {
        match event {
            Event::Expose(e) if e.count == 0 => Some(SurfaceEvent::Expose),
            Event::VisibilityNotify(e) => {
                let visibility = match e.state {
                    xproto::Visibility::FULLY_OBSCURED => Visibility::FullyObscured,
                    xproto::Visibility::PARTIALLY_OBSCURED => Visibility::PartiallyObscured,
                    _ => Visibility::Unobscured,
                };
                Some(SurfaceEvent::VisibilityChanged(visibility))
            }
            Event::KeyPress(e) => self.keymap.char_for(e.detail).map(SurfaceEvent::KeyPress),
            Event::ClientMessage(e)
                if e.format == 32
                    && e.type_ == self.atoms.WM_PROTOCOLS
                    && e.data.as_data32()[0] == self.atoms.WM_DELETE_WINDOW =>
            {
                Some(SurfaceEvent::CloseRequested)
            }
            Event::DestroyNotify(e) if e.window == self.window => {
                Some(SurfaceEvent::CloseRequested)
            }
            _ => None,
        }
    }
}
