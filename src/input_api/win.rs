//! Windows backend built on `WH_KEYBOARD_LL`/`WH_MOUSE_LL` hooks. Low-level
//! hooks must live on a thread that pumps messages, so the backend owns a
//! dedicated pump thread and posts `WM_QUIT` to it on stop.

use std::sync::{mpsc as std_mpsc, OnceLock};

use anyhow::{anyhow, Context, Result};
use tokio::sync::mpsc;
use tracing::{error, info};
use windows::Win32::{
    Foundation::{HINSTANCE, HWND, LPARAM, LRESULT, WPARAM},
    System::Threading::GetCurrentThreadId,
    UI::WindowsAndMessaging::{
        CallNextHookEx, DispatchMessageW, GetMessageW, PostThreadMessageW, SetWindowsHookExW,
        TranslateMessage, UnhookWindowsHookEx, HHOOK, KBDLLHOOKSTRUCT, LLKHF_EXTENDED, MSG,
        MSLLHOOKSTRUCT, WH_KEYBOARD_LL, WH_MOUSE_LL, WM_KEYDOWN, WM_KEYUP, WM_LBUTTONDOWN,
        WM_MBUTTONDOWN, WM_MOUSEMOVE, WM_MOUSEWHEEL, WM_QUIT, WM_RBUTTONDOWN, WM_SYSKEYDOWN,
        WM_SYSKEYUP,
    },
};

use super::{InputHook, RawInputEvent};

/// Extended scan codes are reported with this prefix, matching the keymap
/// convention used by the classifier.
const EXTENDED_PREFIX: u16 = 0x0E00;

const WHEEL_NOTCH: i32 = 120;

// Hook procedures are plain function pointers, so the sender has to be
// reachable through process-global state. The hook is a one-shot resource;
// a second start in the same process is rejected.
static EVENT_SENDER: OnceLock<mpsc::Sender<RawInputEvent>> = OnceLock::new();

fn forward(event: RawInputEvent) {
    if let Some(sender) = EVENT_SENDER.get() {
        // No backpressure on the raw stream: if the channel is full the
        // event is dropped rather than stalling the system input queue.
        let _ = sender.try_send(event);
    }
}

unsafe extern "system" fn keyboard_hook(code: i32, wparam: WPARAM, lparam: LPARAM) -> LRESULT {
    if code >= 0 {
        let info = unsafe { &*(lparam.0 as *const KBDLLHOOKSTRUCT) };
        let mut keycode = info.scanCode as u16;
        if info.flags.0 & LLKHF_EXTENDED.0 != 0 {
            keycode |= EXTENDED_PREFIX;
        }

        match wparam.0 as u32 {
            WM_KEYDOWN | WM_SYSKEYDOWN => forward(RawInputEvent::KeyDown { keycode }),
            WM_KEYUP | WM_SYSKEYUP => forward(RawInputEvent::KeyUp { keycode }),
            _ => {}
        }
    }
    unsafe { CallNextHookEx(HHOOK::default(), code, wparam, lparam) }
}

unsafe extern "system" fn mouse_hook(code: i32, wparam: WPARAM, lparam: LPARAM) -> LRESULT {
    if code >= 0 {
        let info = unsafe { &*(lparam.0 as *const MSLLHOOKSTRUCT) };

        match wparam.0 as u32 {
            WM_MOUSEMOVE => forward(RawInputEvent::MouseMove {
                x: info.pt.x,
                y: info.pt.y,
            }),
            WM_LBUTTONDOWN => forward(RawInputEvent::ButtonDown { button: 1 }),
            WM_RBUTTONDOWN => forward(RawInputEvent::ButtonDown { button: 2 }),
            WM_MBUTTONDOWN => forward(RawInputEvent::ButtonDown { button: 3 }),
            WM_MOUSEWHEEL => {
                let delta = ((info.mouseData >> 16) as u16 as i16) as i32;
                forward(RawInputEvent::Wheel {
                    rotation: delta / WHEEL_NOTCH,
                })
            }
            _ => {}
        }
    }
    unsafe { CallNextHookEx(HHOOK::default(), code, wparam, lparam) }
}

fn run_message_pump(ready: std_mpsc::Sender<Result<u32>>) {
    let hooks = unsafe {
        SetWindowsHookExW(WH_KEYBOARD_LL, Some(keyboard_hook), HINSTANCE::default(), 0).and_then(
            |keyboard| {
                SetWindowsHookExW(WH_MOUSE_LL, Some(mouse_hook), HINSTANCE::default(), 0)
                    .map(|mouse| (keyboard, mouse))
            },
        )
    };

    let (keyboard, mouse) = match hooks {
        Ok(v) => v,
        Err(e) => {
            let _ = ready.send(Err(anyhow!("Failed to install input hooks: {e:?}")));
            return;
        }
    };

    let thread_id = unsafe { GetCurrentThreadId() };
    let _ = ready.send(Ok(thread_id));

    let mut message = MSG::default();
    loop {
        let result = unsafe { GetMessageW(&mut message, HWND::default(), 0, 0) };
        match result.0 {
            // WM_QUIT
            0 => break,
            -1 => {
                error!("Message pump failed, shutting the hook thread down");
                break;
            }
            _ => unsafe {
                let _ = TranslateMessage(&message);
                DispatchMessageW(&message);
            },
        }
    }

    unsafe {
        if let Err(e) = UnhookWindowsHookEx(keyboard) {
            error!("Failed to remove keyboard hook {e:?}");
        }
        if let Err(e) = UnhookWindowsHookEx(mouse) {
            error!("Failed to remove mouse hook {e:?}");
        }
    }
}

pub struct WindowsInputHook {
    pump: Option<(std::thread::JoinHandle<()>, u32)>,
}

impl WindowsInputHook {
    pub fn new() -> Self {
        Self { pump: None }
    }
}

impl Default for WindowsInputHook {
    fn default() -> Self {
        Self::new()
    }
}

impl InputHook for WindowsInputHook {
    fn start(&mut self, events: mpsc::Sender<RawInputEvent>) -> Result<()> {
        if EVENT_SENDER.set(events).is_err() {
            return Err(anyhow!("Input hook was already started in this process"));
        }

        let (ready_sender, ready_receiver) = std_mpsc::channel();
        let handle = std::thread::Builder::new()
            .name("input-hook-pump".into())
            .spawn(move || run_message_pump(ready_sender))
            .context("Failed to spawn the hook pump thread")?;

        let thread_id = ready_receiver
            .recv()
            .context("Hook pump thread exited before reporting readiness")??;

        info!("Installed low level input hooks on thread {thread_id}");
        self.pump = Some((handle, thread_id));
        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        let Some((handle, thread_id)) = self.pump.take() else {
            return Ok(());
        };

        unsafe { PostThreadMessageW(thread_id, WM_QUIT, WPARAM(0), LPARAM(0))? };
        handle
            .join()
            .map_err(|_| anyhow!("Hook pump thread panicked"))?;
        info!("Input hooks removed");
        Ok(())
    }
}
