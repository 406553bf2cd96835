use std::collections::HashMap;
use std::time::{Duration, Instant};

/// A single bumper switch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ContactSignal {
    active: bool,
    last_active_at: Option<Instant>,
}

impl ContactSignal {
    pub fn active(&self) -> bool {
        self.active
    }

    pub fn last_active_at(&self) -> Option<Instant> {
        self.last_active_at
    }

    /// Time since the switch last read closed.
    /// A switch that never triggered reports `Duration::MAX`
    pub fn since_last_trigger(&self, now: Instant) -> Duration {
        self.last_active_at
            .map(|triggered| now.saturating_duration_since(triggered))
            .unwrap_or(Duration::MAX)
    }

    fn observe(&mut self, active: bool, now: Instant) {
        self.active = active;
        if active {
            self.last_active_at = Some(now);
        }
    }
}

/// Latched view of both front bumpers for one tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ContactState {
    pub front_left: ContactSignal,
    pub front_right: ContactSignal,
}

impl ContactState {
    pub fn both_active(&self) -> bool {
        self.front_left.active() && self.front_right.active()
    }

    pub fn none_active(&self) -> bool {
        !self.front_left.active() && !self.front_right.active()
    }
}

#[derive(Debug, Clone)]
pub struct SensorLatch {
    front_left_pin: u16,
    front_right_pin: u16,
    state: ContactState,
}

impl SensorLatch {
    pub fn new(front_left_pin: u16, front_right_pin: u16) -> Self {
        Self {
            front_left_pin,
            front_right_pin,
            state: ContactState::default(),
        }
    }

    /// Pins missing from `readings` count as open
    pub fn latch(&mut self, readings: &HashMap<u16, bool>, now: Instant) -> ContactState {
        let read = |pin: u16| readings.get(&pin).copied().unwrap_or(false);
        self.state.front_right.observe(read(self.front_right_pin), now);
        self.state.front_left.observe(read(self.front_left_pin), now);
        self.state
    }

    pub fn state(&self) -> &ContactState {
        &self.state
    }
}
