//! Arm session: connection lifecycle and motion dispatch.
//!
//! [`ArmCommander`] is the seam to the controller — the raw vendor
//! surface (modes, moves, gripper, pose query). [`ArmSession`] sits on
//! top of it and owns the things the workflows care about: the home
//! pose, the configured speeds, and which control mode the arm is
//! currently in. Tests drive the session with a recording commander;
//! the binary plugs in [`protocol::XArmClient`].

pub mod protocol;

use crate::config::Config;
use crate::jog::ArmCommand;
use crate::pose::Pose;
use crate::Result;
use log::{debug, info};

/// Controller-level control modes this tool uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlMode {
    /// Absolute position moves (controller mode 0).
    Position,
    /// Cartesian velocity streaming (controller mode 5).
    CartesianVelocity,
}

/// The raw motion surface of the controller.
///
/// Blocking semantics follow the controller: `wait = true` suspends the
/// caller until the physical motion completes. There are no timeouts —
/// a stalled controller stalls the caller.
pub trait ArmCommander: Send {
    fn motion_enable(&mut self, on: bool) -> Result<()>;
    fn set_mode(&mut self, mode: ControlMode) -> Result<()>;
    /// Put the controller in the "ready to move" run state.
    fn set_state_ready(&mut self) -> Result<()>;
    fn current_pose(&mut self) -> Result<Pose>;
    fn move_to(&mut self, pose: &Pose, speed: f64, wait: bool) -> Result<()>;
    fn set_cartesian_velocity(&mut self, v: [f64; 6]) -> Result<()>;
    /// Arc-blended move through an ordered list of poses.
    fn follow_path(&mut self, poses: &[Pose], speed: f64, wait: bool) -> Result<()>;
    /// One-time gripper setup: position mode, enabled, actuation speed.
    fn configure_gripper(&mut self, speed: f64) -> Result<()>;
    fn set_gripper(&mut self, width: f64, wait: bool) -> Result<()>;
    fn disconnect(&mut self) -> Result<()>;
}

pub struct ArmSession {
    commander: Box<dyn ArmCommander>,
    home: Pose,
    move_speed: f64,
    /// Last mode handed to the controller. Switching modes has a real
    /// settling cost on the hardware, so the session switches at most
    /// once per mode change instead of once per command.
    active_mode: Option<ControlMode>,
    connected: bool,
}

impl ArmSession {
    /// Bring the arm up: enable motion, enter position mode, configure
    /// and open the gripper, and move to home. Blocks until the arm is
    /// parked.
    pub fn connect(commander: Box<dyn ArmCommander>, config: &Config) -> Result<Self> {
        let mut session = Self {
            commander,
            home: config.home,
            move_speed: config.move_speed,
            active_mode: None,
            connected: true,
        };
        session.commander.motion_enable(true)?;
        session.enter_mode(ControlMode::Position)?;
        session.commander.configure_gripper(config.gripper_speed)?;
        session.commander.set_gripper(config.gripper_open, true)?;
        let home = session.home;
        session.commander.move_to(&home, session.move_speed, true)?;
        info!("arm connected and homed at {}", config.arm_address);
        Ok(session)
    }

    /// Re-enter position mode and return to the home pose, blocking.
    pub fn go_home(&mut self) -> Result<()> {
        self.enter_mode(ControlMode::Position)?;
        let home = self.home;
        self.commander.move_to(&home, self.move_speed, true)?;
        info!("arm at home position");
        Ok(())
    }

    pub fn current_pose(&mut self) -> Result<Pose> {
        self.commander.current_pose()
    }

    /// Dispatch one jog command. Exactly one of these is issued per
    /// control-loop tick.
    pub fn issue(&mut self, command: ArmCommand) -> Result<()> {
        match command {
            ArmCommand::Step(target) => self.issue_step(target),
            ArmCommand::Velocity(v) => self.issue_velocity(v),
        }
    }

    /// Blocking absolute move to `target`.
    pub fn issue_step(&mut self, target: Pose) -> Result<()> {
        self.enter_mode(ControlMode::Position)?;
        self.commander.move_to(&target, self.move_speed, true)?;
        debug!(
            "step move: x={} y={} z={} yaw={}",
            target.x, target.y, target.z, target.yaw
        );
        Ok(())
    }

    /// Non-blocking velocity command; the arm keeps moving at this rate
    /// until superseded or switched out of velocity mode.
    pub fn issue_velocity(&mut self, v: [f64; 6]) -> Result<()> {
        self.enter_mode(ControlMode::CartesianVelocity)?;
        self.commander.set_cartesian_velocity(v)?;
        debug!("velocity move: vx={} vy={} vz={} vyaw={}", v[0], v[1], v[2], v[5]);
        Ok(())
    }

    /// Blocking arc-blended replay of a taught path.
    pub fn follow_path(&mut self, poses: &[Pose], speed: f64) -> Result<()> {
        self.enter_mode(ControlMode::Position)?;
        self.commander.follow_path(poses, speed, true)
    }

    /// Command the gripper to `width`, blocking until it settles.
    pub fn set_gripper(&mut self, width: f64) -> Result<()> {
        self.commander.set_gripper(width, true)
    }

    /// Release the controller connection. Safe to call once; the
    /// session refuses further commands afterwards by construction
    /// (the workflow drops it).
    pub fn disconnect(&mut self) -> Result<()> {
        if self.connected {
            self.commander.disconnect()?;
            self.connected = false;
            info!("arm disconnected");
        }
        Ok(())
    }

    fn enter_mode(&mut self, mode: ControlMode) -> Result<()> {
        if self.active_mode == Some(mode) {
            return Ok(());
        }
        self.commander.set_mode(mode)?;
        self.commander.set_state_ready()?;
        self.active_mode = Some(mode);
        Ok(())
    }
}
