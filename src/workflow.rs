//! Mode orchestration: Manual, Teach, Goto, Quit.
//!
//! The state machine is a plain value driven through the [`Prompt`]
//! seam; the console adapter (or a scripted prompt in tests) only
//! translates operator answers into these inputs. No UI toolkit state
//! leaks in here.

use crate::arm::ArmSession;
use crate::config::Config;
use crate::control_loop::{self, LoopOutcome};
use crate::gamepad::InputSource;
use crate::jog::JogSettings;
use crate::waypoints::WaypointStore;
use crate::{Result, TeleopError};
use log::{info, warn};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Top-level mode selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Manual,
    Teach,
    Goto,
    Quit,
}

/// Teach-mode continuation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TeachStep {
    Add,
    Done,
}

/// Goto-mode actions over the taught sequences.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GotoAction {
    Pickup(String),
    Dropoff(String),
    Home,
    Done,
}

/// Presentation seam. Implementations only collect operator input;
/// all workflow decisions stay in [`Workflow`].
pub trait Prompt {
    fn choose_mode(&mut self) -> Result<Mode>;
    fn jog_settings(&mut self) -> Result<JogSettings>;
    fn sequence_name(&mut self) -> Result<String>;
    fn add_or_done(&mut self) -> Result<TeachStep>;
    fn goto_action(&mut self, names: &[String]) -> Result<GotoAction>;
    fn confirm_go_home(&mut self) -> Result<bool>;
}

pub struct Workflow<I: InputSource + Send + 'static, P: Prompt> {
    // Options so the sessions can move into the loop worker and back.
    arm: Option<ArmSession>,
    pad: Option<I>,
    prompt: P,
    config: Config,
    interrupt: Arc<AtomicBool>,
}

impl<I: InputSource + Send + 'static, P: Prompt> Workflow<I, P> {
    pub fn new(
        arm: ArmSession,
        pad: I,
        prompt: P,
        config: Config,
        interrupt: Arc<AtomicBool>,
    ) -> Self {
        Self {
            arm: Some(arm),
            pad: Some(pad),
            prompt,
            config,
            interrupt,
        }
    }

    /// Drive mode selection until Quit (or interrupt), then home the
    /// arm and release both sessions exactly once.
    pub fn run(mut self) -> Result<()> {
        loop {
            if self.interrupted() {
                break;
            }
            match self.prompt.choose_mode()? {
                Mode::Manual => self.manual()?,
                Mode::Teach => self.teach()?,
                Mode::Goto => self.goto()?,
                Mode::Quit => break,
            }
        }
        self.shutdown()
    }

    fn manual(&mut self) -> Result<()> {
        let settings = self.prompt.jog_settings()?;
        if let LoopOutcome::StopButton = self.run_loop_once(settings)? {
            // Offer a re-home before going back to mode selection, so
            // the arm can be parked without teaching anything.
            if self.prompt.confirm_go_home()? {
                self.arm()?.go_home()?;
            }
        }
        Ok(())
    }

    fn teach(&mut self) -> Result<()> {
        info!("teach mode: returning to home position");
        self.arm()?.go_home()?;
        let mut poses = vec![self.arm()?.current_pose()?];
        let name = self.prompt.sequence_name()?;

        loop {
            match self.prompt.add_or_done()? {
                TeachStep::Done => break,
                TeachStep::Add => {
                    let settings = self.prompt.jog_settings()?;
                    match self.run_loop_once(settings)? {
                        LoopOutcome::Interrupted => {
                            // Abandon the capture; nothing is written.
                            warn!("teach interrupted, sequence {name:?} discarded");
                            return Ok(());
                        }
                        LoopOutcome::StopButton => {
                            let pose = self.arm()?.current_pose()?;
                            info!("captured waypoint {} for {name:?}: {pose}", poses.len() + 1);
                            poses.push(pose);
                        }
                    }
                }
            }
        }

        let mut store = WaypointStore::load(&self.config.waypoint_file)?;
        store.insert(name.clone(), poses)?;
        store.save(&self.config.waypoint_file)?;
        info!("sequence {name:?} saved");
        Ok(())
    }

    fn goto(&mut self) -> Result<()> {
        let store = WaypointStore::load(&self.config.waypoint_file)?;
        if store.is_empty() {
            warn!(
                "waypoint file {} has no sequences; teach one first",
                self.config.waypoint_file.display()
            );
            return Ok(());
        }
        let names = store.names().to_vec();
        loop {
            if self.interrupted() {
                return Ok(());
            }
            match self.prompt.goto_action(&names)? {
                GotoAction::Pickup(name) => {
                    info!("picking up from sequence {name:?}");
                    self.replay(&store, &name, self.config.gripper_hold)?;
                }
                GotoAction::Dropoff(name) => {
                    info!("dropping off at sequence {name:?}");
                    self.replay(&store, &name, self.config.gripper_release)?;
                }
                GotoAction::Home => self.arm()?.go_home()?,
                GotoAction::Done => return Ok(()),
            }
        }
    }

    /// Move through the named sequence, actuate the gripper, and come
    /// back out along its reverse.
    fn replay(&mut self, store: &WaypointStore, name: &str, gripper_width: f64) -> Result<()> {
        let forward = store
            .get(name)
            .ok_or_else(|| TeleopError::UnknownSequence(name.to_string()))?
            .to_vec();
        let reverse = store
            .reverse(name)
            .ok_or_else(|| TeleopError::UnknownSequence(name.to_string()))?
            .to_vec();
        let speed = self.config.replay_speed;
        let arm = self.arm()?;
        arm.follow_path(&forward, speed)?;
        arm.set_gripper(gripper_width)?;
        arm.follow_path(&reverse, speed)?;
        Ok(())
    }

    /// Run the control loop on its worker thread and block on the
    /// one-shot completion message, taking the sessions back.
    fn run_loop_once(&mut self, settings: JogSettings) -> Result<LoopOutcome> {
        let arm = self.arm.take().ok_or(TeleopError::WorkerLost)?;
        let pad = self.pad.take().ok_or(TeleopError::WorkerLost)?;
        let rx = control_loop::spawn(
            arm,
            pad,
            settings,
            self.config.clone(),
            self.interrupt.clone(),
        );
        let handoff = rx.recv().map_err(|_| TeleopError::WorkerLost)?;
        self.arm = Some(handoff.arm);
        self.pad = Some(handoff.pad);
        handoff.outcome
    }

    fn shutdown(&mut self) -> Result<()> {
        info!("quitting: returning arm to home");
        if let Some(arm) = self.arm.as_mut() {
            arm.go_home()?;
        }
        if let Some(mut pad) = self.pad.take() {
            pad.release();
        }
        if let Some(mut arm) = self.arm.take() {
            arm.disconnect()?;
        }
        Ok(())
    }

    fn interrupted(&self) -> bool {
        self.interrupt.load(Ordering::Relaxed)
    }

    fn arm(&mut self) -> Result<&mut ArmSession> {
        self.arm.as_mut().ok_or(TeleopError::WorkerLost)
    }
}
