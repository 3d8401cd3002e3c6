//! Per-tick player input, already mapped from devices by the host

/// Discrete button phase for one tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ButtonState {
    #[default]
    Released,
    /// Went down this tick
    Down,
    Held,
    /// Went up this tick
    Up,
}

impl ButtonState {
    /// Derive the phase from the button level on the previous and current tick
    pub fn from_levels(was_down: bool, is_down: bool) -> Self {
        match (was_down, is_down) {
            (false, true) => ButtonState::Down,
            (true, true) => ButtonState::Held,
            (true, false) => ButtonState::Up,
            (false, false) => ButtonState::Released,
        }
    }

    pub fn pressed(self) -> bool {
        self == ButtonState::Down
    }

    pub fn is_down(self) -> bool {
        matches!(self, ButtonState::Down | ButtonState::Held)
    }
}

/// Normalised analog axes in [-1, 1]
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Axes {
    /// Strafe / steer, positive to the right
    pub horizontal: f32,
    /// Walk / throttle, positive forwards
    pub vertical: f32,
}

impl Axes {
    pub fn new(horizontal: f32, vertical: f32) -> Self {
        Self {
            horizontal,
            vertical,
        }
    }

    /// Sum keyboard and touch-joystick sources, keeping the result normalised
    pub fn merged(keyboard: Axes, touch: Axes) -> Axes {
        Axes {
            horizontal: (keyboard.horizontal + touch.horizontal).clamp(-1.0, 1.0),
            vertical: (keyboard.vertical + touch.vertical).clamp(-1.0, 1.0),
        }
    }
}

/// Everything the player did this tick
#[derive(Debug, Clone, Copy, Default)]
pub struct InputFrame {
    pub axes: Axes,
    pub interact: ButtonState,
    pub aim: ButtonState,
    pub fire: ButtonState,
    pub brake: ButtonState,
    pub sprint: ButtonState,
}
