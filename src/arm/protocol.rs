//! Minimal controller register protocol — just enough of the xArm
//! private TCP protocol for the operations this tool issues.
//!
//! Framing is modbus-TCP-like: a 6-byte big-endian header
//! `(transaction id, protocol id = 2, length)` followed by one register
//! byte and a little-endian payload. The response echoes the register
//! and carries a state byte; bit 6 flags a controller error, bit 5 a
//! warning. Floats on the wire are `f32`.
//!
//! This is not a general SDK binding. Anything beyond the registers
//! below (joint-space moves, servo streaming, IO) is out of scope.

use crate::arm::{ArmCommander, ControlMode};
use crate::pose::Pose;
use crate::{Result, TeleopError};
use log::{debug, warn};
use std::io::{Read, Write};
use std::net::{Shutdown, TcpStream};
use std::time::Duration;

const CONTROL_PORT: u16 = 502;
const PROTOCOL_ID: u16 = 0x0002;

/// Register numbers for the protocol subset this tool uses.
mod reg {
    pub const MOTION_EN: u8 = 11;
    pub const SET_STATE: u8 = 12;
    pub const GET_STATE: u8 = 13;
    pub const SET_MODE: u8 = 19;
    pub const MOVE_LINE: u8 = 21;
    pub const MOVE_LINEB: u8 = 22;
    pub const GET_TCP_POSE: u8 = 41;
    pub const VC_SET_CARTV: u8 = 247;

    // End-effector block.
    pub const GRIPPER_MODE: u8 = 251;
    pub const GRIPPER_EN: u8 = 252;
    pub const GRIPPER_SPEED: u8 = 253;
    pub const GRIPPER_POS: u8 = 254;
    pub const GRIPPER_GET_POS: u8 = 255;
}

/// Run states accepted by `SET_STATE`.
const STATE_READY: u8 = 0;
/// `GET_STATE` value while a motion is executing.
const STATE_MOVING: u8 = 1;

/// All axes, for `MOTION_EN`.
const AXIS_ALL: u8 = 8;

const MODE_POSITION: u8 = 0;
const MODE_CARTESIAN_VELOCITY: u8 = 5;

/// Arc blend radius for taught-path replay, mm. 0 = stop at each
/// waypoint; a small radius keeps the replay fluid.
const BLEND_RADIUS_MM: f32 = 10.0;

/// Poll interval while waiting for a blocking motion to finish.
const MOTION_POLL: Duration = Duration::from_millis(100);

/// Polls allowed for the controller to enter the moving state after a
/// motion command is accepted. A short move can come and go between
/// polls, so an onset that never shows counts as done.
const MOTION_ONSET_POLLS: u32 = 5;

/// The gripper is considered settled once two consecutive reads agree
/// within this many raw units (it may stall short of the target when
/// closing onto a part).
const GRIPPER_SETTLE_TOL: f64 = 1.0;

pub struct XArmClient {
    stream: TcpStream,
    transaction: u16,
}

impl XArmClient {
    /// Connect to the controller. A bare IP gets the default control
    /// port appended. Reads block indefinitely, like the motions they
    /// wait on.
    pub fn connect(address: &str) -> Result<Self> {
        let target = if address.contains(':') {
            address.to_string()
        } else {
            format!("{address}:{CONTROL_PORT}")
        };
        let stream = TcpStream::connect(&target)?;
        stream.set_nodelay(true)?;
        debug!("connected to controller at {target}");
        Ok(Self {
            stream,
            transaction: 0,
        })
    }

    /// Send one register command and read back its response payload.
    fn exchange(&mut self, register: u8, params: &[u8]) -> Result<Vec<u8>> {
        self.transaction = self.transaction.wrapping_add(1);
        let mut frame = Vec::with_capacity(7 + params.len());
        frame.extend_from_slice(&self.transaction.to_be_bytes());
        frame.extend_from_slice(&PROTOCOL_ID.to_be_bytes());
        frame.extend_from_slice(&((params.len() as u16 + 1).to_be_bytes()));
        frame.push(register);
        frame.extend_from_slice(params);
        self.stream.write_all(&frame)?;
        self.stream.flush()?;

        let mut header = [0u8; 6];
        self.stream.read_exact(&mut header)?;
        let length = u16::from_be_bytes([header[4], header[5]]) as usize;
        if length < 2 {
            return Err(TeleopError::Arm("short response frame".into()));
        }
        let mut body = vec![0u8; length];
        self.stream.read_exact(&mut body)?;
        if body[0] != register {
            return Err(TeleopError::Arm(format!(
                "response register {} does not match request {register}",
                body[0]
            )));
        }
        let state = body[1];
        if state & 0x40 != 0 {
            return Err(TeleopError::Arm(format!(
                "controller reports error state (register {register})"
            )));
        }
        if state & 0x20 != 0 {
            warn!("controller reports warning state (register {register})");
        }
        Ok(body[2..].to_vec())
    }

    fn write_u8(&mut self, register: u8, value: u8) -> Result<()> {
        self.exchange(register, &[value]).map(drop)
    }

    fn write_f32s(&mut self, register: u8, values: &[f32]) -> Result<()> {
        let mut params = Vec::with_capacity(values.len() * 4);
        for v in values {
            params.extend_from_slice(&v.to_le_bytes());
        }
        self.exchange(register, &params).map(drop)
    }

    fn motion_state(&mut self) -> Result<u8> {
        let data = self.exchange(reg::GET_STATE, &[])?;
        data.first()
            .copied()
            .ok_or_else(|| TeleopError::Arm("empty GET_STATE response".into()))
    }

    /// Block until a just-issued motion has run to completion. The
    /// controller takes a beat to enter the moving state, so first wait
    /// for onset (bounded, in case the move already finished), then for
    /// the state to clear. No timeout on the clearing wait: a stalled
    /// motion stalls the caller, and the interrupt path handles that.
    fn wait_motion_done(&mut self) -> Result<()> {
        let mut onset_polls = MOTION_ONSET_POLLS;
        loop {
            std::thread::sleep(MOTION_POLL);
            if self.motion_state()? == STATE_MOVING {
                break;
            }
            onset_polls -= 1;
            if onset_polls == 0 {
                return Ok(());
            }
        }
        loop {
            std::thread::sleep(MOTION_POLL);
            if self.motion_state()? != STATE_MOVING {
                return Ok(());
            }
        }
    }

    fn gripper_position(&mut self) -> Result<f64> {
        let data = self.exchange(reg::GRIPPER_GET_POS, &[])?;
        if data.len() < 4 {
            return Err(TeleopError::Arm("short gripper position response".into()));
        }
        Ok(f32::from_le_bytes([data[0], data[1], data[2], data[3]]) as f64)
    }

    /// Wait for the gripper to stop moving. It may never reach the
    /// commanded width when closing onto a part, so "settled" means two
    /// consecutive reads agree, not that the target was reached.
    fn wait_gripper_settled(&mut self) -> Result<()> {
        let mut last = self.gripper_position()?;
        loop {
            std::thread::sleep(MOTION_POLL);
            let now = self.gripper_position()?;
            if (now - last).abs() < GRIPPER_SETTLE_TOL {
                return Ok(());
            }
            last = now;
        }
    }

    fn pose_params(pose: &Pose, speed: f64) -> [f32; 9] {
        let p = pose.as_array();
        [
            p[0] as f32,
            p[1] as f32,
            p[2] as f32,
            p[3] as f32,
            p[4] as f32,
            p[5] as f32,
            speed as f32,
            0.0, // acceleration: controller default
            0.0, // motion time: unused
        ]
    }
}

impl ArmCommander for XArmClient {
    fn motion_enable(&mut self, on: bool) -> Result<()> {
        self.exchange(reg::MOTION_EN, &[AXIS_ALL, on as u8]).map(drop)
    }

    fn set_mode(&mut self, mode: ControlMode) -> Result<()> {
        let value = match mode {
            ControlMode::Position => MODE_POSITION,
            ControlMode::CartesianVelocity => MODE_CARTESIAN_VELOCITY,
        };
        self.write_u8(reg::SET_MODE, value)
    }

    fn set_state_ready(&mut self) -> Result<()> {
        self.write_u8(reg::SET_STATE, STATE_READY)
    }

    fn current_pose(&mut self) -> Result<Pose> {
        let data = self.exchange(reg::GET_TCP_POSE, &[])?;
        if data.len() < 24 {
            return Err(TeleopError::Arm("short pose response".into()));
        }
        let mut fields = [0.0f64; 6];
        for (i, field) in fields.iter_mut().enumerate() {
            let off = i * 4;
            *field =
                f32::from_le_bytes([data[off], data[off + 1], data[off + 2], data[off + 3]])
                    as f64;
        }
        Ok(Pose::from_array(fields))
    }

    fn move_to(&mut self, pose: &Pose, speed: f64, wait: bool) -> Result<()> {
        self.write_f32s(reg::MOVE_LINE, &Self::pose_params(pose, speed))?;
        if wait {
            self.wait_motion_done()?;
        }
        Ok(())
    }

    fn set_cartesian_velocity(&mut self, v: [f64; 6]) -> Result<()> {
        let params: Vec<f32> = v.iter().map(|&x| x as f32).collect();
        self.write_f32s(reg::VC_SET_CARTV, &params)
    }

    fn follow_path(&mut self, poses: &[Pose], speed: f64, wait: bool) -> Result<()> {
        for pose in poses {
            let mut params = Self::pose_params(pose, speed).to_vec();
            params.push(BLEND_RADIUS_MM);
            self.write_f32s(reg::MOVE_LINEB, &params)?;
        }
        if wait {
            self.wait_motion_done()?;
        }
        Ok(())
    }

    fn configure_gripper(&mut self, speed: f64) -> Result<()> {
        self.write_u8(reg::GRIPPER_MODE, 0)?;
        self.write_u8(reg::GRIPPER_EN, 1)?;
        self.write_f32s(reg::GRIPPER_SPEED, &[speed as f32])
    }

    fn set_gripper(&mut self, width: f64, wait: bool) -> Result<()> {
        self.write_f32s(reg::GRIPPER_POS, &[width as f32])?;
        if wait {
            self.wait_gripper_settled()?;
        }
        Ok(())
    }

    fn disconnect(&mut self) -> Result<()> {
        self.stream.shutdown(Shutdown::Both)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::TcpListener;
    use std::thread;

    /// Serve one canned response per request, echoing the register.
    fn serve(responses: Vec<Vec<u8>>) -> (String, thread::JoinHandle<Vec<u8>>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        let handle = thread::spawn(move || {
            let (mut socket, _) = listener.accept().unwrap();
            let mut seen = Vec::new();
            for payload in responses {
                let mut header = [0u8; 6];
                socket.read_exact(&mut header).unwrap();
                let len = u16::from_be_bytes([header[4], header[5]]) as usize;
                let mut body = vec![0u8; len];
                socket.read_exact(&mut body).unwrap();
                let register = body[0];
                seen.extend_from_slice(&body);

                let mut frame = Vec::new();
                frame.extend_from_slice(&header[0..4]);
                frame.extend_from_slice(&((payload.len() as u16 + 2).to_be_bytes()));
                frame.push(register);
                frame.push(0); // clean state byte
                frame.extend_from_slice(&payload);
                socket.write_all(&frame).unwrap();
            }
            seen
        });
        (addr, handle)
    }

    #[test]
    fn pose_query_decodes_six_floats() {
        let mut payload = Vec::new();
        for v in [-159.3f32, -193.5, 329.4, 180.0, 0.0, -90.0] {
            payload.extend_from_slice(&v.to_le_bytes());
        }
        let (addr, server) = serve(vec![payload]);
        let mut client = XArmClient::connect(&addr).unwrap();
        let pose = client.current_pose().unwrap();
        assert!((pose.x + 159.3).abs() < 1e-3);
        assert!((pose.yaw + 90.0).abs() < 1e-3);
        server.join().unwrap();
    }

    #[test]
    fn error_state_bit_is_a_hard_fault() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        let server = thread::spawn(move || {
            let (mut socket, _) = listener.accept().unwrap();
            let mut header = [0u8; 6];
            socket.read_exact(&mut header).unwrap();
            let len = u16::from_be_bytes([header[4], header[5]]) as usize;
            let mut body = vec![0u8; len];
            socket.read_exact(&mut body).unwrap();
            let frame = [
                header[0], header[1], header[2], header[3], 0, 2, body[0], 0x40,
            ];
            socket.write_all(&frame).unwrap();
        });
        let mut client = XArmClient::connect(&addr).unwrap();
        let err = client.set_state_ready().unwrap_err();
        assert!(matches!(err, TeleopError::Arm(_)));
        server.join().unwrap();
    }

    #[test]
    fn blocking_move_waits_for_motion_onset() {
        // one idle poll before the controller reports moving, then
        // moving, then idle again
        let (addr, server) = serve(vec![Vec::new(), vec![2], vec![1], vec![2]]);
        let mut client = XArmClient::connect(&addr).unwrap();
        let pose = Pose::new(0.0, 0.0, 0.0, 180.0, 0.0, 0.0);
        client.move_to(&pose, 400.0, true).unwrap();
        drop(client);
        let seen = server.join().unwrap();
        // the move frame (37 bytes), then three state polls
        assert_eq!(&seen[37..], &[reg::GET_STATE; 3]);
    }

    #[test]
    fn motion_enable_targets_all_axes() {
        let (addr, server) = serve(vec![Vec::new()]);
        let mut client = XArmClient::connect(&addr).unwrap();
        client.motion_enable(true).unwrap();
        let seen = server.join().unwrap();
        assert_eq!(seen, vec![reg::MOTION_EN, AXIS_ALL, 1]);
    }
}
