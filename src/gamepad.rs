//! Game-controller input session.
//!
//! One pad, four axes, three buttons. The deadzone filter is a free
//! function rather than a session method so the boundary behavior is
//! testable without a device plugged in.

use crate::{Result, TeleopError};
use gilrs::{Axis, Button, GamepadId, Gilrs};
use log::info;

/// One tick's worth of stick readings, normalized to -1.0..1.0.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AxisSample {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub rot: f32,
}

impl AxisSample {
    /// Apply the deadzone to all four axes.
    pub fn filtered(self, deadzone: f32) -> Self {
        Self {
            x: deadzone_filter(self.x, deadzone),
            y: deadzone_filter(self.y, deadzone),
            z: deadzone_filter(self.z, deadzone),
            rot: deadzone_filter(self.rot, deadzone),
        }
    }
}

/// Snap `value` to 0.0 when its magnitude is below `deadzone`,
/// otherwise pass it through unchanged.
pub fn deadzone_filter(value: f32, deadzone: f32) -> f32 {
    if value.abs() < deadzone { 0.0 } else { value }
}

/// Buttons the control loop reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PadButton {
    GripperOpen,
    GripperClose,
    Stop,
}

/// Seam between the control loop and the physical pad; the integration
/// tests drive the workflows with a scripted implementation.
pub trait InputSource {
    /// Drain pending device events. Must run every tick so the event
    /// queue does not back up.
    fn pump_events(&mut self);
    fn axes(&mut self) -> AxisSample;
    fn pressed(&mut self, button: PadButton) -> bool;
    /// Hand the device back. Called exactly once, on quit.
    fn release(&mut self);
}

pub struct GamepadSession {
    gilrs: Gilrs,
    id: GamepadId,
}

impl GamepadSession {
    /// Open the first connected gamepad. No pad is an unrecoverable
    /// precondition — the caller is expected to exit, not retry.
    pub fn connect() -> Result<Self> {
        let gilrs = Gilrs::new().map_err(|e| TeleopError::Gamepad(e.to_string()))?;
        let id = gilrs
            .gamepads()
            .next()
            .map(|(id, _)| id)
            .ok_or(TeleopError::NoGamepad)?;
        info!("using gamepad: {}", gilrs.gamepad(id).name());
        Ok(Self { gilrs, id })
    }
}

impl InputSource for GamepadSession {
    fn pump_events(&mut self) {
        while self.gilrs.next_event().is_some() {}
    }

    fn axes(&mut self) -> AxisSample {
        let pad = self.gilrs.gamepad(self.id);
        // gilrs reports stick-up as +1; the jog math uses the raw
        // device convention (stick-down = +1), so Y axes are negated.
        AxisSample {
            x: pad.value(Axis::LeftStickX),
            y: -pad.value(Axis::LeftStickY),
            z: -pad.value(Axis::RightStickY),
            rot: pad.value(Axis::RightStickX),
        }
    }

    fn pressed(&mut self, button: PadButton) -> bool {
        let pad = self.gilrs.gamepad(self.id);
        let mapped = match button {
            PadButton::GripperClose => Button::South,
            PadButton::GripperOpen => Button::East,
            PadButton::Stop => Button::Select,
        };
        pad.is_pressed(mapped)
    }

    fn release(&mut self) {
        info!("gamepad released");
    }
}
