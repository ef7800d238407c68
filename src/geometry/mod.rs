//! Rotation conversions between unit quaternions and Euler angles.
//!
//! The decomposition order is always explicit ([`AxisOrder`]): the same
//! rotation yields different roll/pitch/yaw triples under different orders,
//! so callers pick one and carry it through instead of hard-coding a
//! convention per call site.
//!
//! Gimbal lock (pitch at ±90°) is a singularity of every Euler decomposition.
//! The angles returned there stay finite, but the split between roll and yaw
//! is arbitrary and a round trip only recovers the rotation, not the angles.

use nalgebra::{UnitQuaternion, Vector3};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub mod gravity;

pub use gravity::{roll_pitch_from_gravity, vector_angle_deg};

#[derive(thiserror::Error, Debug)]
pub enum GeometryError {
    #[error("Unknown axis order '{0}', expected ZYX or ZXY")]
    UnknownAxisOrder(String),
    #[error("Vector has zero length")]
    DegenerateVector,
}

/// Order in which the elementary rotations are composed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AxisOrder {
    /// `R = Rz(yaw) * Ry(pitch) * Rx(roll)`: roll about X, pitch about Y,
    /// yaw about Z.
    #[default]
    #[serde(rename = "ZYX")]
    Zyx,
    /// `R = Ry(yaw) * Rx(pitch) * Rz(roll)`: roll about the optical Z axis,
    /// pitch about X, yaw about Y.
    #[serde(rename = "ZXY")]
    Zxy,
}

impl AxisOrder {
    pub const ALL: [AxisOrder; 2] = [AxisOrder::Zyx, AxisOrder::Zxy];

    pub fn as_str(&self) -> &'static str {
        match self {
            AxisOrder::Zyx => "ZYX",
            AxisOrder::Zxy => "ZXY",
        }
    }
}

impl fmt::Display for AxisOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AxisOrder {
    type Err = GeometryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "ZYX" => Ok(AxisOrder::Zyx),
            "ZXY" => Ok(AxisOrder::Zxy),
            _ => Err(GeometryError::UnknownAxisOrder(s.to_string())),
        }
    }
}

/// Roll, pitch and yaw in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct EulerAngles {
    pub roll: f64,
    pub pitch: f64,
    pub yaw: f64,
}

impl EulerAngles {
    pub fn new(roll: f64, pitch: f64, yaw: f64) -> Self {
        EulerAngles { roll, pitch, yaw }
    }

    pub fn negated(&self) -> Self {
        EulerAngles {
            roll: -self.roll,
            pitch: -self.pitch,
            yaw: -self.yaw,
        }
    }
}

/// Decodes `q` into Euler angles (degrees) under `order`.
///
/// The quaternion is renormalized before use and the `asin` argument is
/// clamped to `[-1, 1]`, so slightly non-unit input never produces NaN.
pub fn quat_to_euler(q: &UnitQuaternion<f64>, order: AxisOrder) -> EulerAngles {
    let q = q.quaternion().normalize();
    let (w, x, y, z) = (q.w, q.i, q.j, q.k);

    let (roll, pitch, yaw) = match order {
        AxisOrder::Zyx => {
            let r21 = 2.0 * (w * x + y * z);
            let r22 = 1.0 - 2.0 * (x * x + y * y);
            let r20 = 2.0 * (x * z - w * y);
            let r10 = 2.0 * (w * z + x * y);
            let r00 = 1.0 - 2.0 * (y * y + z * z);
            (
                r21.atan2(r22),
                (-r20).clamp(-1.0, 1.0).asin(),
                r10.atan2(r00),
            )
        }
        AxisOrder::Zxy => {
            let r10 = 2.0 * (x * y + w * z);
            let r11 = 1.0 - 2.0 * (x * x + z * z);
            let r12 = 2.0 * (y * z - w * x);
            let r02 = 2.0 * (x * z + w * y);
            let r22 = 1.0 - 2.0 * (x * x + y * y);
            (
                r10.atan2(r11),
                (-r12).clamp(-1.0, 1.0).asin(),
                r02.atan2(r22),
            )
        }
    };

    EulerAngles {
        roll: roll.to_degrees(),
        pitch: pitch.to_degrees(),
        yaw: yaw.to_degrees(),
    }
}

/// Composes Euler angles (degrees) back into a unit quaternion under `order`.
pub fn euler_to_quat(angles: &EulerAngles, order: AxisOrder) -> UnitQuaternion<f64> {
    let roll = angles.roll.to_radians();
    let pitch = angles.pitch.to_radians();
    let yaw = angles.yaw.to_radians();

    match order {
        AxisOrder::Zyx => {
            UnitQuaternion::from_axis_angle(&Vector3::z_axis(), yaw)
                * UnitQuaternion::from_axis_angle(&Vector3::y_axis(), pitch)
                * UnitQuaternion::from_axis_angle(&Vector3::x_axis(), roll)
        }
        AxisOrder::Zxy => {
            UnitQuaternion::from_axis_angle(&Vector3::y_axis(), yaw)
                * UnitQuaternion::from_axis_angle(&Vector3::x_axis(), pitch)
                * UnitQuaternion::from_axis_angle(&Vector3::z_axis(), roll)
        }
    }
}
