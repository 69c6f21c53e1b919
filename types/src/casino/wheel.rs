use std::fmt;

use serde::{Deserialize, Serialize};

/// Phase of the wheel animation. Independent of [`super::RoundPhase`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WheelPhase {
    #[default]
    Idle,
    Spinning,
    Dropping,
    Settling,
    Settled,
}

impl WheelPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            WheelPhase::Idle => "idle",
            WheelPhase::Spinning => "spinning",
            WheelPhase::Dropping => "dropping",
            WheelPhase::Settling => "settling",
            WheelPhase::Settled => "settled",
        }
    }

    pub fn is_moving(&self) -> bool {
        matches!(
            self,
            WheelPhase::Spinning | WheelPhase::Dropping | WheelPhase::Settling
        )
    }
}

impl fmt::Display for WheelPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Physics state of the wheel and ball.
///
/// Angles are radians in `[0, 2π)`, speeds are radians per second (both positive;
/// the ball travels against the wheel), and `ball_radius` is a fraction of the
/// outer track radius.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WheelSimState {
    pub wheel_angle: f64,
    pub wheel_speed: f64,
    pub ball_angle: f64,
    pub ball_speed: f64,
    pub ball_radius: f64,
    pub phase: WheelPhase,
    pub bounce_count: u8,
}
