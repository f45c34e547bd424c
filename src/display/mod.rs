//! Display surface contract
//!
//! The window system is an external collaborator. The event loop talks to it
//! through [`DisplaySurface`] for output and receives its notifications as
//! [`SurfaceEvent`]s on a channel.

pub mod x11;

pub use x11::X11Display;

use crate::models::{Region, Visibility};
use tokio::sync::oneshot;

/// Capacity of the window-system event channel.
pub const EVENT_CHANNEL_CAPACITY: usize = 64;

#[derive(Debug, thiserror::Error)]
pub enum SurfaceError {
    #[error("cannot connect to display: {0}")]
    Connect(#[from] x11rb::errors::ConnectError),
    #[error("display connection: {0}")]
    Connection(#[from] x11rb::errors::ConnectionError),
    #[error("display request failed: {0}")]
    Reply(#[from] x11rb::errors::ReplyError),
    #[error("display request failed: {0}")]
    ReplyOrId(#[from] x11rb::errors::ReplyOrIdError),
    #[error("unsupported display: {0}")]
    Unsupported(String),
}

/// Notifications from the window system, delivered in order.
#[derive(Debug)]
pub enum SurfaceEvent {
    /// Liveness ping; the receiver must send on `ack` before the display
    /// dispatches anything else.
    Ping(oneshot::Sender<()>),
    /// Window contents were lost and must be repainted.
    Expose,
    VisibilityChanged(Visibility),
    KeyPress(char),
    /// The user or the window manager asked the window to close.
    CloseRequested,
}

/// Output side of a window.
pub trait DisplaySurface {
    /// Copies `pixels` (BGRA rows, `region.width * 4` bytes each) to `region`
    /// of the visible window.
    fn blit(&mut self, region: Region, pixels: &[u8]) -> Result<(), SurfaceError>;

    fn toggle_fullscreen(&mut self) -> Result<(), SurfaceError> {
        Ok(())
    }
}
