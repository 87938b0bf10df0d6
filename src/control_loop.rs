//! The fixed-period teleop loop.
//!
//! Per tick: pump device events, read and deadzone-filter the sticks,
//! issue exactly one motion command, service the gripper buttons, check
//! the stop button and the interrupt flag, sleep. The loop runs on a
//! worker thread so the prompt side stays responsive; ownership of both
//! sessions moves into the worker and comes back in the completion
//! message — there is no shared mutable state and nothing to poll.

use crate::arm::ArmSession;
use crate::config::Config;
use crate::gamepad::{InputSource, PadButton};
use crate::jog::{JogMode, JogSettings, StepJog, VelocityJog};
use crate::Result;
use log::{info, warn};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// Why the loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopOutcome {
    /// Operator pressed the stop button; normal completion.
    StopButton,
    /// Ctrl-C observed; the whole program is winding down.
    Interrupted,
}

/// Completion message: the sessions come home with the verdict.
pub struct LoopHandoff<I: InputSource> {
    pub arm: ArmSession,
    pub pad: I,
    pub outcome: Result<LoopOutcome>,
}

/// Start the loop on a worker thread. The returned channel delivers
/// exactly one [`LoopHandoff`] when the loop exits; the caller blocks
/// on `recv()` instead of polling the worker's liveness.
pub fn spawn<I>(
    arm: ArmSession,
    pad: I,
    settings: JogSettings,
    config: Config,
    interrupt: Arc<AtomicBool>,
) -> Receiver<LoopHandoff<I>>
where
    I: InputSource + Send + 'static,
{
    let (tx, rx) = mpsc::sync_channel(1);
    thread::spawn(move || {
        let mut arm = arm;
        let mut pad = pad;
        let outcome = run(&mut arm, &mut pad, settings, &config, &interrupt);
        // Receiver gone means the orchestrator died first; nothing to do.
        let _ = tx.send(LoopHandoff { arm, pad, outcome });
    });
    rx
}

/// Run the loop to completion on the current thread.
pub fn run<I: InputSource>(
    arm: &mut ArmSession,
    pad: &mut I,
    settings: JogSettings,
    config: &Config,
    interrupt: &AtomicBool,
) -> Result<LoopOutcome> {
    let step = StepJog {
        increment: settings.increment,
    };
    let velocity = VelocityJog {
        speed: settings.velocity,
    };
    let period = Duration::from_millis(config.tick_ms);
    info!("control loop started in {:?} mode", settings.mode);

    loop {
        pad.pump_events();
        let axes = pad.axes().filtered(config.deadzone);

        let command = match settings.mode {
            JogMode::Step => step.next_command(&arm.current_pose()?, axes),
            JogMode::Velocity => velocity.next_command(axes),
        };
        arm.issue(command)?;

        if pad.pressed(PadButton::GripperOpen) {
            arm.set_gripper(config.gripper_open)?;
            info!("gripper opened");
        }
        if pad.pressed(PadButton::GripperClose) {
            arm.set_gripper(config.gripper_close)?;
            info!("gripper closed");
        }
        if pad.pressed(PadButton::Stop) {
            info!("stop button pressed, ending control loop");
            return Ok(LoopOutcome::StopButton);
        }
        if interrupt.load(Ordering::Relaxed) {
            warn!("interrupt received, ending control loop");
            return Ok(LoopOutcome::Interrupted);
        }

        thread::sleep(period);
    }
}
