//! The two jogging strategies.
//!
//! Both translate one filtered [`AxisSample`] into one [`ArmCommand`]
//! per tick. Sign conventions and the 0.5 rotation scale-down are
//! tuning constants carried over from commissioning — do not "fix"
//! them.

use crate::gamepad::AxisSample;
use crate::pose::Pose;

/// Roll is pinned while jogging so the tool stays pointed down.
const JOG_ROLL_DEG: f64 = 180.0;
const JOG_PITCH_DEG: f64 = 0.0;

/// Rotation jogs at half the translation speed.
const ROTATION_SPEED_SCALE: f64 = 0.5;

/// What a strategy asks the arm to do this tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ArmCommand {
    /// Absolute target for a blocking position move.
    Step(Pose),
    /// Cartesian rate vector `[vx, vy, vz, 0, 0, vyaw]`, non-blocking.
    Velocity([f64; 6]),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JogMode {
    Step,
    Velocity,
}

/// Operator-selected jog parameters for one control-loop run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JogSettings {
    pub mode: JogMode,
    /// Step-mode increment, mm per full deflection.
    pub increment: f64,
    /// Velocity-mode speed, mm/s at full deflection.
    pub velocity: f64,
}

/// Discrete jogging: each tick moves the arm by a rounded multiple of
/// `increment` along each deflected axis.
#[derive(Debug, Clone, Copy)]
pub struct StepJog {
    /// Millimeters (or degrees, for yaw) per full stick deflection.
    pub increment: f64,
}

impl StepJog {
    pub fn next_command(&self, current: &Pose, axes: AxisSample) -> ArmCommand {
        ArmCommand::Step(Pose {
            x: current.x + (self.increment * axes.x as f64).round(),
            y: current.y - (self.increment * axes.y as f64).round(),
            z: current.z - (self.increment * axes.z as f64).round(),
            roll: JOG_ROLL_DEG,
            pitch: JOG_PITCH_DEG,
            yaw: current.yaw + (self.increment * axes.rot as f64).round(),
        })
    }
}

/// Continuous jogging: each tick streams a rate that holds until
/// superseded or the arm leaves velocity mode.
#[derive(Debug, Clone, Copy)]
pub struct VelocityJog {
    /// mm/s at full stick deflection.
    pub speed: f64,
}

impl VelocityJog {
    pub fn next_command(&self, axes: AxisSample) -> ArmCommand {
        ArmCommand::Velocity([
            (self.speed * axes.x as f64).round(),
            (-self.speed * axes.y as f64).round(),
            (-self.speed * axes.z as f64).round(),
            0.0,
            0.0,
            (ROTATION_SPEED_SCALE * self.speed * axes.rot as f64).round(),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn axes(x: f32, y: f32, z: f32, rot: f32) -> AxisSample {
        AxisSample { x, y, z, rot }
    }

    #[test]
    fn step_moves_along_deflected_axes() {
        let jog = StepJog { increment: 5.0 };
        let start = Pose::new(100.0, 200.0, 300.0, 180.0, 0.0, -90.0);
        let ArmCommand::Step(target) = jog.next_command(&start, axes(1.0, 1.0, 1.0, 1.0)) else {
            panic!("step jog must produce a step command");
        };
        assert_eq!(target.x, 105.0);
        assert_eq!(target.y, 195.0); // stick down pulls Y negative
        assert_eq!(target.z, 295.0);
        assert_eq!(target.yaw, -85.0);
        assert_eq!(target.roll, 180.0);
        assert_eq!(target.pitch, 0.0);
    }

    #[test]
    fn step_is_reversible_in_direction() {
        let jog = StepJog { increment: 7.0 };
        let start = Pose::new(50.0, 0.0, 0.0, 180.0, 0.0, 0.0);
        let ArmCommand::Step(out) = jog.next_command(&start, axes(1.0, 0.0, 0.0, 0.0)) else {
            panic!()
        };
        let ArmCommand::Step(back) = jog.next_command(&out, axes(-1.0, 0.0, 0.0, 0.0)) else {
            panic!()
        };
        assert_eq!(back.x, start.x);
    }

    #[test]
    fn step_is_deterministic() {
        let jog = StepJog { increment: 5.0 };
        let start = Pose::new(1.0, 2.0, 3.0, 180.0, 0.0, 4.0);
        let a = jog.next_command(&start, axes(0.5, -0.5, 0.25, -1.0));
        let b = jog.next_command(&start, axes(0.5, -0.5, 0.25, -1.0));
        assert_eq!(a, b);
    }

    #[test]
    fn velocity_sign_conventions() {
        let jog = VelocityJog { speed: 100.0 };
        let ArmCommand::Velocity(v) = jog.next_command(axes(0.0, 1.0, 1.0, 0.0)) else {
            panic!()
        };
        assert_eq!(v[1], -100.0);
        assert_eq!(v[2], -100.0);
    }

    #[test]
    fn rotation_runs_at_half_speed() {
        let jog = VelocityJog { speed: 100.0 };
        let ArmCommand::Velocity(v) = jog.next_command(axes(0.0, 0.0, 0.0, 1.0)) else {
            panic!()
        };
        assert_eq!(v[5], 50.0);
        assert_eq!(v[3], 0.0);
        assert_eq!(v[4], 0.0);
    }

    #[test]
    fn centered_sticks_command_zero_rate() {
        let jog = VelocityJog { speed: 100.0 };
        let ArmCommand::Velocity(v) = jog.next_command(AxisSample::default()) else {
            panic!()
        };
        assert_eq!(v, [0.0; 6]);
    }
}
