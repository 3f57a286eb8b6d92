//! Contains the contract for global input hooks on different platforms.
//! [GenericInputHook] is the main artifact of this module that abstracts
//! over the platform backends.
//!
//! Keycode convention: XT set-1 scan codes, with extended keys carrying an
//! `0x0E00` prefix (right Ctrl is `0x0E1D`, arrow up is `0x0E48`). Mouse
//! buttons are numbered 1 = left, 2 = right, 3 = middle. Wheel rotation is
//! reported in notches, signed by direction.

#[cfg(feature = "win")]
pub mod win;

#[cfg(feature = "win")]
extern crate windows;

use anyhow::Result;
use tokio::sync::mpsc;

/// A raw, unclassified input event as delivered by the platform hook.
/// Events may arrive in any interleaving; a key-up without a matching
/// key-down is legal (the process may start mid-keypress).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RawInputEvent {
    KeyDown { keycode: u16 },
    KeyUp { keycode: u16 },
    ButtonDown { button: u8 },
    MouseMove { x: i32, y: i32 },
    Wheel { rotation: i32 },
}

/// Contract platform backends must implement. Starting the hook is a
/// one-shot operation at launch; there is no automatic retry.
#[cfg_attr(test, mockall::automock)]
pub trait InputHook: Send {
    /// Installs the hook and begins delivering events into `events`.
    /// The backend must never block the sending side: events that cannot be
    /// queued are dropped (there is no backpressure on the raw stream).
    fn start(&mut self, events: mpsc::Sender<RawInputEvent>) -> Result<()>;

    /// Tears the hook down. Must be called before process exit.
    fn stop(&mut self) -> Result<()>;
}

/// Serves as a cross-compatible [InputHook] implementation.
pub struct GenericInputHook {
    inner: Box<dyn InputHook>,
}

impl GenericInputHook {
    pub fn new() -> Result<Self> {
        cfg_if::cfg_if! {
            if #[cfg(feature = "win")] {
                Ok(Self {
                    inner: Box::new(win::WindowsInputHook::new()),
                })
            }
            else {
                // This runtime error is needed to allow the project to be compiled for during testing.
                unimplemented!("No input hook backend was specified")
            }
        }
    }
}

impl InputHook for GenericInputHook {
    fn start(&mut self, events: mpsc::Sender<RawInputEvent>) -> Result<()> {
        self.inner.start(events)
    }

    fn stop(&mut self) -> Result<()> {
        self.inner.stop()
    }
}
