//! Keyboard and pointer state collected from winit events.
//!
//! [`InputState`] is a plain value owned by the application and handed to
//! `Scene::update`, so the update logic can be driven without a window.
//! Pointer motion only counts while the pointer is locked; a click asks for the
//! lock, Escape or losing focus gives it back.

use std::collections::HashSet;

use winit::{
    event::{DeviceEvent, ElementState, MouseButton, WindowEvent},
    keyboard::{KeyCode, PhysicalKey},
    window::{CursorGrabMode, Window},
};

/// What the shell should do with the cursor after an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerLockRequest {
    Lock,
    Release,
}

#[derive(Debug, Default, Clone)]
pub struct InputState {
    keys: HashSet<KeyCode>,
    pointer_delta: (f64, f64),
    pointer_locked: bool,
    lock_request: Option<PointerLockRequest>,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_key(&mut self, key: KeyCode, pressed: bool) {
        if pressed {
            self.keys.insert(key);
        } else {
            self.keys.remove(&key);
        }
    }

    pub fn is_key_down(&self, key: KeyCode) -> bool {
        self.keys.contains(&key)
    }

    /// Forget every held key, e.g. when the window loses focus.
    pub fn clear(&mut self) {
        self.keys.clear();
        self.pointer_delta = (0.0, 0.0);
    }

    /// Accumulate relative motion. Ignored unless the pointer is locked.
    pub fn add_pointer_delta(&mut self, dx: f64, dy: f64) {
        if self.pointer_locked {
            self.pointer_delta.0 += dx;
            self.pointer_delta.1 += dy;
        }
    }

    /// Motion gathered since the last call.
    pub fn take_pointer_delta(&mut self) -> (f64, f64) {
        std::mem::take(&mut self.pointer_delta)
    }

    pub fn pointer_locked(&self) -> bool {
        self.pointer_locked
    }

    pub fn set_pointer_locked(&mut self, locked: bool) {
        self.pointer_locked = locked;
        if !locked {
            self.pointer_delta = (0.0, 0.0);
        }
    }

    pub fn take_lock_request(&mut self) -> Option<PointerLockRequest> {
        self.lock_request.take()
    }

    pub fn handle_window_event(&mut self, event: &WindowEvent) {
        match event {
            WindowEvent::KeyboardInput { event, .. } => {
                if let PhysicalKey::Code(code) = event.physical_key {
                    let pressed = event.state == ElementState::Pressed;
                    if code == KeyCode::Escape && pressed && self.pointer_locked {
                        self.lock_request = Some(PointerLockRequest::Release);
                    }
                    self.set_key(code, pressed);
                }
            }
            WindowEvent::MouseInput {
                state: ElementState::Pressed,
                button: MouseButton::Left,
                ..
            } if !self.pointer_locked => {
                self.lock_request = Some(PointerLockRequest::Lock);
            }
            WindowEvent::Focused(false) => {
                self.clear();
                if self.pointer_locked {
                    self.lock_request = Some(PointerLockRequest::Release);
                }
            }
            _ => (),
        }
    }

    pub fn handle_device_event(&mut self, event: &DeviceEvent) {
        if let DeviceEvent::MouseMotion { delta: (dx, dy) } = event {
            self.add_pointer_delta(*dx, *dy);
        }
    }
}

/// Apply a lock request to the window and record the outcome in `input`.
///
/// Not every platform supports `Locked`; `Confined` is the fallback.
pub fn apply_pointer_lock(window: &Window, input: &mut InputState, request: PointerLockRequest) {
    match request {
        PointerLockRequest::Lock => {
            let grabbed = window
                .set_cursor_grab(CursorGrabMode::Locked)
                .or_else(|_| window.set_cursor_grab(CursorGrabMode::Confined));
            match grabbed {
                Ok(()) => {
                    window.set_cursor_visible(false);
                    input.set_pointer_locked(true);
                }
                Err(e) => log::warn!("Pointer lock is not available: {}", e),
            }
        }
        PointerLockRequest::Release => {
            if let Err(e) = window.set_cursor_grab(CursorGrabMode::None) {
                log::warn!("Could not release the pointer: {}", e);
            }
            window.set_cursor_visible(true);
            input.set_pointer_locked(false);
        }
    }
}
