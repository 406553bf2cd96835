use chrono::prelude::{DateTime, Utc};
use nalgebra as na;
use serde::{Deserialize, Serialize};

use crate::actuation::ToggleState;
use crate::follower::PositionFix;

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ToggleReading {
    pub pin: u16,
    pub state: ToggleState,
    #[serde(default = "Utc::now")]
    pub time: DateTime<Utc>,
}

impl ToggleReading {
    pub fn is_on(&self) -> bool {
        self.state == ToggleState::On
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct PositionFixMessage {
    pub position: na::Point3<f32>,
    pub yaw: f32,
    #[serde(default = "default_available")]
    pub available: bool,
    #[serde(default = "Utc::now")]
    pub time: DateTime<Utc>,
}

fn default_available() -> bool {
    true
}

impl From<PositionFixMessage> for PositionFix {
    fn from(message: PositionFixMessage) -> Self {
        PositionFix {
            position: message.position,
            yaw: message.yaw,
            available: message.available,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct PwmRequest {
    pub pin: u16,
    pub duty: u32,
    pub time: DateTime<Utc>,
}

impl PwmRequest {
    pub fn new(pin: u16, duty: u32) -> Self {
        Self {
            pin,
            duty,
            time: Utc::now(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ToggleRequest {
    pub pin: u16,
    pub state: ToggleState,
    pub time: DateTime<Utc>,
}

impl ToggleRequest {
    pub fn new(pin: u16, state: ToggleState) -> Self {
        Self {
            pin,
            state,
            time: Utc::now(),
        }
    }
}
