//! Cartesian pose of the arm's tool flange.
//!
//! Positions are millimeters, orientations degrees, matching what the
//! controller reports. Poses round-trip through the waypoint table as a
//! bracketed 6-tuple literal, e.g.
//! `[-159.3, -193.5, 329.4, 180, 0, -90]`.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub roll: f64,
    pub pitch: f64,
    pub yaw: f64,
}

impl Pose {
    pub const fn new(x: f64, y: f64, z: f64, roll: f64, pitch: f64, yaw: f64) -> Self {
        Self {
            x,
            y,
            z,
            roll,
            pitch,
            yaw,
        }
    }

    pub fn as_array(&self) -> [f64; 6] {
        [self.x, self.y, self.z, self.roll, self.pitch, self.yaw]
    }

    pub fn from_array(v: [f64; 6]) -> Self {
        Self::new(v[0], v[1], v[2], v[3], v[4], v[5])
    }

    /// Parse a stored cell literal back into a pose.
    ///
    /// Accepts `[..]` or `(..)` around exactly six comma-separated
    /// numbers. Anything else is rejected with a reason string; the
    /// store wraps that into a malformed-waypoint error with the cell's
    /// coordinates. Cell text is never evaluated, only parsed.
    pub fn parse_literal(text: &str) -> std::result::Result<Self, String> {
        let trimmed = text.trim();
        let inner = match (trimmed.chars().next(), trimmed.chars().last()) {
            (Some('['), Some(']')) | (Some('('), Some(')')) => &trimmed[1..trimmed.len() - 1],
            _ => return Err("expected a bracketed tuple".into()),
        };
        let mut fields = [0.0f64; 6];
        let mut count = 0;
        for part in inner.split(',') {
            if count == 6 {
                return Err("more than 6 fields".into());
            }
            fields[count] = part
                .trim()
                .parse()
                .map_err(|_| format!("field {} ({:?}) is not a number", count + 1, part.trim()))?;
            count += 1;
        }
        if count != 6 {
            return Err(format!("expected 6 fields, found {count}"));
        }
        Ok(Self::from_array(fields))
    }
}

/// The cell encoding is the `Display` form.
impl fmt::Display for Pose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}, {}, {}, {}, {}, {}]",
            self.x, self.y, self.z, self.roll, self.pitch, self.yaw
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literal_round_trip() {
        let pose = Pose::new(-159.3, -193.5, 329.4, 180.0, 0.0, -90.0);
        let parsed = Pose::parse_literal(&pose.to_string()).unwrap();
        assert_eq!(parsed, pose);
    }

    #[test]
    fn accepts_parenthesised_tuples() {
        let parsed = Pose::parse_literal("(1, 2, 3, 4, 5, 6)").unwrap();
        assert_eq!(parsed, Pose::new(1.0, 2.0, 3.0, 4.0, 5.0, 6.0));
    }

    #[test]
    fn rejects_wrong_arity() {
        assert!(Pose::parse_literal("[1, 2, 3]").is_err());
        assert!(Pose::parse_literal("[1, 2, 3, 4, 5, 6, 7]").is_err());
    }

    #[test]
    fn rejects_non_numeric_fields() {
        let err = Pose::parse_literal("[1, 2, three, 4, 5, 6]").unwrap_err();
        assert!(err.contains("field 3"));
    }

    #[test]
    fn rejects_unbracketed_text() {
        assert!(Pose::parse_literal("1, 2, 3, 4, 5, 6").is_err());
        assert!(Pose::parse_literal("__import__('os')").is_err());
        assert!(Pose::parse_literal("").is_err());
    }
}
