//! Operator configuration.
//!
//! Loaded from a JSON file next to the binary; every field has a
//! default taken from the shop-floor setup this tool was tuned on, so a
//! missing file or a partial file both work.

use crate::pose::Pose;
use crate::Result;
use log::info;
use serde::{Deserialize, Serialize};
use std::io;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Controller address. A bare IP gets the default control port
    /// appended on connect.
    pub arm_address: String,
    /// Reference pose the arm parks at between workflows.
    pub home: Pose,
    /// Speed for jog and homing moves, mm/s.
    pub move_speed: f64,
    /// Speed for replaying taught sequences, mm/s.
    pub replay_speed: f64,
    /// Gripper actuation speed, raw units.
    pub gripper_speed: f64,
    /// Gripper width for "fully open", raw units.
    pub gripper_open: f64,
    /// Gripper width for "fully closed", raw units.
    pub gripper_close: f64,
    /// Gripper width used to hold a part during pickup.
    pub gripper_hold: f64,
    /// Gripper width used to release a part during dropoff.
    pub gripper_release: f64,
    /// Stick magnitude below which an axis reads as zero.
    pub deadzone: f32,
    /// Control loop period, milliseconds.
    pub tick_ms: u64,
    /// Waypoint table location.
    pub waypoint_file: PathBuf,
    /// Step-mode increment offered as the prompt default, mm.
    pub default_increment: f64,
    /// Velocity-mode speed offered as the prompt default, mm/s.
    pub default_velocity: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            arm_address: "192.168.1.210".into(),
            home: Pose::new(-159.3, -193.5, 329.4, 180.0, 0.0, -90.0),
            move_speed: 400.0,
            replay_speed: 300.0,
            gripper_speed: 1000.0,
            gripper_open: 850.0,
            gripper_close: 270.0,
            gripper_hold: 800.0,
            gripper_release: 850.0,
            deadzone: 0.2,
            tick_ms: 100,
            waypoint_file: PathBuf::from("waypoints.csv"),
            default_increment: 5.0,
            default_velocity: 100.0,
        }
    }
}

impl Config {
    /// Read the config file, falling back to defaults when it does not
    /// exist yet.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            info!("no config at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(path)?;
        let config = serde_json::from_str(&contents)
            .map_err(|e| io::Error::other(format!("bad config JSON: {e}")))?;
        Ok(config)
    }

    /// Write the config out as pretty JSON. `--write-config` uses this
    /// to emit a starter file for editing.
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| io::Error::other(format!("config serialization failed: {e}")))?;
        std::fs::write(path, json)?;
        Ok(())
    }
}
