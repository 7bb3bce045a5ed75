//! Uniform pointer input for mouse and touch.
//!
//! Devices differ: a mouse hovers and clicks, a finger only exists while it
//! touches. [`PointerTranslator`] folds both into one [`PointerInput`] stream.
//! Only the first active touch is followed; other fingers are ignored until
//! it lifts.
//!
//! With the `winit` feature enabled, [`PointerTranslator::translate`] maps
//! window events directly:
//!
//! ```ignore
//! fn window_event(&mut self, event: WindowEvent) {
//!     for input in self.translator.translate(&event) {
//!         self.stage.pointer(input);
//!     }
//! }
//! ```

use glam::Vec2;

/// Device-independent pointer events, positions in logical pixels relative to
/// the host surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerInput {
    Down(Vec2),
    Move(Vec2),
    Up,
    Leave,
}

/// Lifecycle phase of a touch point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TouchPhase {
    Started,
    Moved,
    Ended,
    Cancelled,
}

/// Folds mouse and touch device events into [`PointerInput`].
#[derive(Debug, Clone)]
pub struct PointerTranslator {
    /// Physical pixels per logical pixel.
    scale_factor: f32,
    last_position: Vec2,
    /// Touch id currently being followed.
    active_touch: Option<u64>,
}

impl PointerTranslator {
    pub fn new(scale_factor: f32) -> Self {
        Self {
            scale_factor: if scale_factor > 0.0 { scale_factor } else { 1.0 },
            last_position: Vec2::ZERO,
            active_touch: None,
        }
    }

    pub fn set_scale_factor(&mut self, scale_factor: f32) {
        if scale_factor > 0.0 {
            self.scale_factor = scale_factor;
        }
    }

    fn logical(&self, physical: Vec2) -> Vec2 {
        physical / self.scale_factor
    }

    /// Cursor moved to a physical-pixel position.
    pub fn mouse_moved(&mut self, physical: Vec2) -> PointerInput {
        self.last_position = self.logical(physical);
        PointerInput::Move(self.last_position)
    }

    /// Primary button changed state at the last cursor position.
    pub fn mouse_button(&mut self, pressed: bool) -> PointerInput {
        if pressed {
            PointerInput::Down(self.last_position)
        } else {
            PointerInput::Up
        }
    }

    pub fn mouse_left(&mut self) -> PointerInput {
        PointerInput::Leave
    }

    /// A touch point changed. Events from non-primary fingers yield nothing.
    pub fn touch(&mut self, id: u64, phase: TouchPhase, physical: Vec2) -> Vec<PointerInput> {
        match phase {
            TouchPhase::Started => {
                if self.active_touch.is_some() {
                    return Vec::new();
                }
                self.active_touch = Some(id);
                self.last_position = self.logical(physical);
                vec![PointerInput::Down(self.last_position)]
            }
            TouchPhase::Moved => {
                if self.active_touch != Some(id) {
                    return Vec::new();
                }
                self.last_position = self.logical(physical);
                vec![PointerInput::Move(self.last_position)]
            }
            TouchPhase::Ended | TouchPhase::Cancelled => {
                if self.active_touch != Some(id) {
                    return Vec::new();
                }
                self.active_touch = None;
                // A lifted finger is no longer over anything
                vec![PointerInput::Up, PointerInput::Leave]
            }
        }
    }
}

impl Default for PointerTranslator {
    fn default() -> Self {
        Self::new(1.0)
    }
}

#[cfg(feature = "winit")]
mod winit_support {
    use super::{PointerInput, PointerTranslator, TouchPhase};
    use glam::Vec2;
    use winit::event::{ElementState, MouseButton, TouchPhase as WinitTouchPhase, WindowEvent};

    impl From<WinitTouchPhase> for TouchPhase {
        fn from(phase: WinitTouchPhase) -> Self {
            match phase {
                WinitTouchPhase::Started => TouchPhase::Started,
                WinitTouchPhase::Moved => TouchPhase::Moved,
                WinitTouchPhase::Ended => TouchPhase::Ended,
                WinitTouchPhase::Cancelled => TouchPhase::Cancelled,
            }
        }
    }

    impl PointerTranslator {
        /// Translate a winit window event. Unrelated events yield nothing.
        pub fn translate(&mut self, event: &WindowEvent) -> Vec<PointerInput> {
            match event {
                WindowEvent::CursorMoved { position, .. } => {
                    vec![self.mouse_moved(Vec2::new(position.x as f32, position.y as f32))]
                }
                WindowEvent::MouseInput {
                    state,
                    button: MouseButton::Left,
                    ..
                } => vec![self.mouse_button(*state == ElementState::Pressed)],
                WindowEvent::CursorLeft { .. } => vec![self.mouse_left()],
                WindowEvent::Touch(touch) => self.touch(
                    touch.id,
                    touch.phase.into(),
                    Vec2::new(touch.location.x as f32, touch.location.y as f32),
                ),
                WindowEvent::ScaleFactorChanged { scale_factor, .. } => {
                    self.set_scale_factor(*scale_factor as f32);
                    Vec::new()
                }
                _ => Vec::new(),
            }
        }
    }
}
