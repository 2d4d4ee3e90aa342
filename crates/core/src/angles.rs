//! View orientation snapshots.
//!
//! Every demo frame carries the client's view angles at the moment the
//! message arrived so playback can drive the camera without re-simulating
//! input.

use serde::{Deserialize, Serialize};

/// Pitch, yaw and roll in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ViewAngles {
    /// Up/down rotation.
    pub pitch: f32,
    /// Left/right rotation.
    pub yaw: f32,
    /// Tilt around the view axis.
    pub roll: f32,
}

impl ViewAngles {
    /// All three angles at zero.
    pub const ZERO: Self = Self {
        pitch: 0.0,
        yaw: 0.0,
        roll: 0.0,
    };

    /// Build from individual components.
    pub const fn new(pitch: f32, yaw: f32, roll: f32) -> Self {
        Self { pitch, yaw, roll }
    }

    /// Components in on-disk order.
    pub const fn to_array(self) -> [f32; 3] {
        [self.pitch, self.yaw, self.roll]
    }

    /// Inverse of [`ViewAngles::to_array`].
    pub const fn from_array(values: [f32; 3]) -> Self {
        Self {
            pitch: values[0],
            yaw: values[1],
            roll: values[2],
        }
    }
}

impl From<[f32; 3]> for ViewAngles {
    fn from(values: [f32; 3]) -> Self {
        Self::from_array(values)
    }
}
