use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, trace};

use crate::behavior::BehaviorState;

pub const E_FORWARD: i32 = 50000;
pub const E_REVERSE: i32 = -50000;
pub const E_ROTATE_RIGHT_L: i32 = 50000;
pub const E_ROTATE_RIGHT_R: i32 = -50000;
pub const E_ROTATE_LEFT_L: i32 = -50000;
pub const E_ROTATE_LEFT_R: i32 = 50000;
pub const E_STILL: i32 = 0;

/// Ticks without an emission before the command is repeated anyway
pub const UPDATE_FREQ: u32 = 50;

#[derive(Error, Debug, PartialEq)]
pub enum DutyProfileError {
    #[error("duty {name} = {value} exceeds forward duty {forward}")]
    ExceedsForward {
        name: &'static str,
        value: i32,
        forward: i32,
    },
    #[error("duty {name} = {value} has the wrong sign")]
    WrongSign { name: &'static str, value: i32 },
}

/// Fixed duty magnitudes for every behavior
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq)]
#[serde(default)]
pub struct DutyProfile {
    pub forward: i32,
    pub reverse: i32,
    pub rotate_right_left: i32,
    pub rotate_right_right: i32,
    pub rotate_left_left: i32,
    pub rotate_left_right: i32,
}

impl Default for DutyProfile {
    fn default() -> Self {
        Self {
            forward: E_FORWARD,
            reverse: E_REVERSE,
            rotate_right_left: E_ROTATE_RIGHT_L,
            rotate_right_right: E_ROTATE_RIGHT_R,
            rotate_left_left: E_ROTATE_LEFT_L,
            rotate_left_right: E_ROTATE_LEFT_R,
        }
    }
}

impl DutyProfile {
    pub fn validate(&self) -> Result<(), DutyProfileError> {
        let signed = [
            ("forward", self.forward, true),
            ("reverse", self.reverse, false),
            ("rotate_right_left", self.rotate_right_left, true),
            ("rotate_right_right", self.rotate_right_right, false),
            ("rotate_left_left", self.rotate_left_left, false),
            ("rotate_left_right", self.rotate_left_right, true),
        ];
        for (name, value, positive) in signed {
            if (value > 0) != positive {
                return Err(DutyProfileError::WrongSign { name, value });
            }
            if value.unsigned_abs() > self.forward.unsigned_abs() {
                return Err(DutyProfileError::ExceedsForward {
                    name,
                    value,
                    forward: self.forward,
                });
            }
        }
        Ok(())
    }
}

/// H-bridge pins of one wheel. Forward duty drives `forward_pin` on and
/// `reverse_pin` off, anything else the other way round
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq)]
pub struct WheelPins {
    pub pwm: u16,
    pub forward_pin: u16,
    pub reverse_pin: u16,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct MotorConfig {
    pub left: WheelPins,
    pub right: WheelPins,
    #[serde(default)]
    pub duties: DutyProfile,
}

impl Default for MotorConfig {
    fn default() -> Self {
        Self {
            left: WheelPins {
                pwm: 0,
                forward_pin: 60,
                reverse_pin: 51,
            },
            right: WheelPins {
                pwm: 1,
                forward_pin: 30,
                reverse_pin: 31,
            },
            duties: DutyProfile::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MotorCommand {
    pub left: i32,
    pub right: i32,
}

impl MotorCommand {
    pub fn new(left: i32, right: i32) -> Self {
        Self { left, right }
    }

    pub fn stopped() -> Self {
        Self::new(E_STILL, E_STILL)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ToggleState {
    On,
    Off,
}

/// Everything one wheel needs for a duty
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WheelRequest {
    pub pwm_pin: u16,
    pub magnitude: u32,
    pub direction: [(u16, ToggleState); 2],
}

impl WheelRequest {
    pub fn from_duty(pins: &WheelPins, duty: i32) -> Self {
        let (first, second) = if duty > 0 {
            (ToggleState::On, ToggleState::Off)
        } else {
            (ToggleState::Off, ToggleState::On)
        };
        Self {
            pwm_pin: pins.pwm,
            magnitude: duty.unsigned_abs(),
            direction: [(pins.forward_pin, first), (pins.reverse_pin, second)],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActuatorCommand {
    pub state: BehaviorState,
    pub duties: MotorCommand,
    pub left: WheelRequest,
    pub right: WheelRequest,
}

/// Turns behaviors into motor duties and rate limits what gets sent
#[derive(Debug, Clone)]
pub struct ActuationMapper {
    config: MotorConfig,
    refresh_ticks: u32,
    last_sent: Option<MotorCommand>,
    last_state: Option<BehaviorState>,
    update_counter: u32,
}

impl ActuationMapper {
    pub fn new(config: MotorConfig, refresh_ticks: u32) -> Self {
        Self {
            config,
            refresh_ticks,
            last_sent: None,
            last_state: None,
            update_counter: 0,
        }
    }

    pub fn duties(&self) -> &DutyProfile {
        &self.config.duties
    }

    pub fn map_duties(&self, state: BehaviorState, has_position_fix: bool) -> MotorCommand {
        let duties = &self.config.duties;
        match state {
            BehaviorState::Reverse => MotorCommand::new(duties.reverse, duties.reverse),
            BehaviorState::RotateRight => {
                MotorCommand::new(duties.rotate_right_left, duties.rotate_right_right)
            }
            BehaviorState::RotateLeft => {
                MotorCommand::new(duties.rotate_left_left, duties.rotate_left_right)
            }
            BehaviorState::Plan => MotorCommand::stopped(),
            BehaviorState::Follow if has_position_fix => self.route_following_duties(),
            BehaviorState::Follow => MotorCommand::new(duties.forward, duties.forward),
        }
    }

    /// No waypoint seeking law yet, a localised vehicle drives straight as well
    fn route_following_duties(&self) -> MotorCommand {
        MotorCommand::new(self.config.duties.forward, self.config.duties.forward)
    }

    /// Returns the command to emit this tick, if any.
    ///
    /// Emits when the duties changed, the state changed since the previous
    /// tick or the refresh counter ran past its limit.
    pub fn update(&mut self, state: BehaviorState, duties: MotorCommand) -> Option<ActuatorCommand> {
        let duties_changed = self.last_sent != Some(duties);
        let state_changed = self.last_state != Some(state);
        let refresh_due = self.update_counter > self.refresh_ticks;
        self.last_state = Some(state);

        if duties_changed || state_changed || refresh_due {
            debug!(
                ?state,
                left = duties.left,
                right = duties.right,
                duties_changed,
                state_changed,
                refresh_due,
                "Emitting motor command"
            );
            self.update_counter = 0;
            self.last_sent = Some(duties);
            Some(self.command_for(state, duties))
        } else {
            self.update_counter += 1;
            trace!(counter = self.update_counter, "Motor command unchanged");
            None
        }
    }

    /// Forgets what was last sent so the next update emits again.
    /// Used when a command never reached the wheels
    pub fn invalidate(&mut self) {
        self.last_sent = None;
        self.last_state = None;
    }

    pub fn command_for(&self, state: BehaviorState, duties: MotorCommand) -> ActuatorCommand {
        ActuatorCommand {
            state,
            duties,
            left: WheelRequest::from_duty(&self.config.left, duties.left),
            right: WheelRequest::from_duty(&self.config.right, duties.right),
        }
    }
}
