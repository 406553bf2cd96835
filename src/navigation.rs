use anyhow::Result;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, error, trace};

use crate::actuation::{ActuationMapper, ActuatorCommand, MotorCommand, MotorConfig, UPDATE_FREQ};
use crate::behavior::{BehaviorState, BehaviorStateMachine, BehaviorTimings};
use crate::driver::MotorDriver;
use crate::follower::{PositionFix, RouteFollower};
use crate::guard::StateModifier;
use crate::planner::{PathPlanner, Route};
use crate::sensor_latch::SensorLatch;

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct NavigationConfig {
    pub front_left_pin: u16,
    pub front_right_pin: u16,
    pub tick_hz: f32,
    /// ticks without an emission before the motor command is repeated
    pub refresh_ticks: u32,
    pub reverse_settle_secs: f32,
    pub turn_secs: f32,
    pub position_fix_timeout_secs: f32,
    pub waypoint_tolerance: f32,
}

impl Default for NavigationConfig {
    fn default() -> Self {
        Self {
            front_left_pin: 48,
            front_right_pin: 49,
            tick_hz: 10.0,
            refresh_ticks: UPDATE_FREQ,
            reverse_settle_secs: 1.0,
            turn_secs: 0.5,
            position_fix_timeout_secs: 1.0,
            waypoint_tolerance: 0.5,
        }
    }
}

#[derive(Error, Debug, PartialEq)]
pub enum NavigationConfigError {
    #[error("{name} must be finite and greater than zero but got {value}")]
    NotPositive { name: &'static str, value: f32 },
    #[error("{name} must be finite and not negative but got {value}")]
    Negative { name: &'static str, value: f32 },
}

impl NavigationConfig {
    pub fn validate(&self) -> Result<(), NavigationConfigError> {
        let period = Duration::try_from_secs_f32(1.0 / self.tick_hz);
        if !matches!(period, Ok(period) if !period.is_zero()) {
            return Err(NavigationConfigError::NotPositive {
                name: "tick_hz",
                value: self.tick_hz,
            });
        }
        let durations = [
            ("reverse_settle_secs", self.reverse_settle_secs),
            ("turn_secs", self.turn_secs),
            ("position_fix_timeout_secs", self.position_fix_timeout_secs),
            ("waypoint_tolerance", self.waypoint_tolerance),
        ];
        for (name, value) in durations {
            if Duration::try_from_secs_f32(value).is_err() {
                return Err(NavigationConfigError::Negative { name, value });
            }
        }
        Ok(())
    }

    /// Zero for a config that did not pass [`NavigationConfig::validate`]
    pub fn tick_period(&self) -> Duration {
        seconds(1.0 / self.tick_hz)
    }

    pub fn timings(&self) -> BehaviorTimings {
        BehaviorTimings {
            reverse_settle: seconds(self.reverse_settle_secs),
            turn: seconds(self.turn_secs),
        }
    }
}

fn seconds(value: f32) -> Duration {
    Duration::try_from_secs_f32(value).unwrap_or_default()
}

/// Owns every piece of mutable controller state.
///
/// Shared between the tick loop and the listeners through one [`Mutex`].
pub struct NavigationController {
    latch: SensorLatch,
    machine: BehaviorStateMachine,
    mapper: ActuationMapper,
    planner: PathPlanner,
    follower: RouteFollower,
    readings: HashMap<u16, bool>,
    position_fix: Option<(PositionFix, Instant)>,
    position_fix_timeout: Duration,
}

impl NavigationController {
    pub fn new(
        config: &NavigationConfig,
        motors: MotorConfig,
        planner: PathPlanner,
        now: Instant,
    ) -> Result<Self, NavigationConfigError> {
        config.validate()?;
        Ok(Self {
            latch: SensorLatch::new(config.front_left_pin, config.front_right_pin),
            machine: BehaviorStateMachine::new(config.timings(), now),
            mapper: ActuationMapper::new(motors, config.refresh_ticks),
            planner,
            follower: RouteFollower::new(config.waypoint_tolerance),
            readings: HashMap::new(),
            position_fix: None,
            position_fix_timeout: seconds(config.position_fix_timeout_secs),
        })
    }

    pub fn ingest_reading(&mut self, pin: u16, state: bool) {
        trace!(pin, state, "Toggle reading");
        self.readings.insert(pin, state);
    }

    pub fn ingest_position_fix(&mut self, fix: PositionFix, now: Instant) {
        trace!(%fix, available = fix.available, "Position fix");
        self.position_fix = Some((fix, now));
    }

    /// Latest fix if it is flagged available and not older than the timeout
    pub fn position_fix(&self, now: Instant) -> Option<&PositionFix> {
        self.position_fix
            .as_ref()
            .filter(|(fix, received)| {
                fix.available
                    && now.saturating_duration_since(*received) <= self.position_fix_timeout
            })
            .map(|(fix, _)| fix)
    }

    pub fn state(&self) -> BehaviorState {
        self.machine.current()
    }

    pub fn modifier(&self) -> StateModifier {
        self.machine.modifier()
    }

    pub fn route(&self) -> &Route {
        self.machine.route()
    }

    pub fn next_waypoint(&self) -> Option<&nalgebra::Point2<f32>> {
        self.follower.next_waypoint(self.machine.route())
    }

    /// latch, behavior, duties. Returns what has to be sent this tick
    pub fn tick(&mut self, now: Instant) -> Option<ActuatorCommand> {
        let contacts = self.latch.latch(&self.readings, now);
        if let Some(transition) = self.machine.step(&contacts, now, &mut self.planner) {
            if transition.from == BehaviorState::Plan {
                self.follower.restart();
            }
        }

        let state = self.machine.current();
        let fix = self.position_fix(now).copied();
        // an empty route falls back to the unlocalised behavior
        let following = match fix {
            Some(fix) if state == BehaviorState::Follow && !self.machine.route().is_empty() => {
                self.follower.advance(self.machine.route(), &fix);
                true
            }
            _ => false,
        };

        let duties = self.mapper.map_duties(state, following);
        debug!(%state, left = duties.left, right = duties.right, "Tick");
        self.mapper.update(state, duties)
    }

    /// Next tick emits regardless of gating
    pub fn command_lost(&mut self) {
        self.mapper.invalidate();
    }

    /// Both wheels still, used on shutdown
    pub fn stop_command(&self) -> ActuatorCommand {
        self.mapper
            .command_for(self.machine.current(), MotorCommand::stopped())
    }
}

/// One control tick with the lock held through emission.
///
/// A failed send is retried on the next tick.
pub async fn run_tick(
    controller: &Mutex<NavigationController>,
    driver: &mut dyn MotorDriver,
    now: Instant,
) -> Result<Option<ActuatorCommand>> {
    let mut controller = controller.lock().await;
    let command = controller.tick(now);
    if let Some(command) = &command {
        if let Err(err) = driver.send(command).await {
            error!(state = %command.state, "Motor command not delivered");
            controller.command_lost();
            return Err(err);
        }
    }
    Ok(command)
}
