use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{Duration, Instant};
use tracing::info;

use crate::guard::{guard, StateModifier};
use crate::planner::{PathPlanner, Route};
use crate::sensor_latch::ContactState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BehaviorState {
    Reverse,
    RotateRight,
    RotateLeft,
    Follow,
    Plan,
}

impl fmt::Display for BehaviorState {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            BehaviorState::Reverse => "REVERSE",
            BehaviorState::RotateRight => "ROTATE_RIGHT",
            BehaviorState::RotateLeft => "ROTATE_LEFT",
            BehaviorState::Follow => "FOLLOW",
            BehaviorState::Plan => "PLAN",
        };
        write!(f, "{}", name)
    }
}

/// Dwell times used by the delayed transitions
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BehaviorTimings {
    /// both bumpers must be clear this long before leaving REVERSE
    pub reverse_settle: Duration,
    /// minimum time spent in a rotation
    pub turn: Duration,
}

impl Default for BehaviorTimings {
    fn default() -> Self {
        Self {
            reverse_settle: Duration::from_secs(1),
            turn: Duration::from_millis(500),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub from: BehaviorState,
    pub to: BehaviorState,
    pub modifier: StateModifier,
}

/// Bumper driven behaviors with a planning phase.
///
/// Starts in PLAN. The first PLAN tick runs the planner, the next one moves on
/// to FOLLOW. Contacts while following push the vehicle into REVERSE or one of
/// the rotations, each of which waits out a dwell time before re-evaluating.
#[derive(Debug, Clone)]
pub struct BehaviorStateMachine {
    current: BehaviorState,
    previous: BehaviorState,
    modifier: StateModifier,
    last_transition_at: Instant,
    planned: bool,
    route: Route,
    timings: BehaviorTimings,
}

impl BehaviorStateMachine {
    pub fn new(timings: BehaviorTimings, now: Instant) -> Self {
        Self {
            current: BehaviorState::Plan,
            previous: BehaviorState::Plan,
            modifier: StateModifier::None,
            last_transition_at: now,
            planned: false,
            route: Route::default(),
            timings,
        }
    }

    pub fn current(&self) -> BehaviorState {
        self.current
    }

    pub fn previous(&self) -> BehaviorState {
        self.previous
    }

    pub fn modifier(&self) -> StateModifier {
        self.modifier
    }

    pub fn last_transition_at(&self) -> Instant {
        self.last_transition_at
    }

    pub fn route(&self) -> &Route {
        &self.route
    }

    /// Back to PLAN with no modifier so the next tick plans again.
    ///
    /// Public recovery hook for owners that lose track of the vehicle, for
    /// example after swapping the map. [`step`](Self::step) never calls it.
    pub fn reset(&mut self, now: Instant) {
        self.transition(BehaviorState::Plan, Some(StateModifier::None), now);
    }

    /// Runs one control tick. Returns the transition if the state changed
    pub fn step(
        &mut self,
        contacts: &ContactState,
        now: Instant,
        planner: &mut PathPlanner,
    ) -> Option<Transition> {
        let left = contacts.front_left.active();
        let right = contacts.front_right.active();

        let (next, modifier) = match self.current {
            BehaviorState::Plan => {
                if !self.planned {
                    self.route = planner.plan_route();
                    self.planned = true;
                    return None;
                }
                (BehaviorState::Follow, Some(StateModifier::None))
            }
            BehaviorState::Follow => match (left, right) {
                (true, true) => (BehaviorState::Reverse, Some(StateModifier::Delayed)),
                (false, true) => (BehaviorState::RotateLeft, Some(StateModifier::Delayed)),
                (true, false) => (BehaviorState::RotateRight, Some(StateModifier::Delayed)),
                (false, false) => return None,
            },
            BehaviorState::Reverse => {
                let since_left = contacts.front_left.since_last_trigger(now);
                let since_right = contacts.front_right.since_last_trigger(now);
                let settle = self.timings.reverse_settle;
                if !guard(&[(since_left, settle), (since_right, settle)], self.modifier) {
                    return None;
                }
                if since_left > since_right {
                    (BehaviorState::RotateRight, None)
                } else {
                    (BehaviorState::RotateLeft, None)
                }
            }
            BehaviorState::RotateRight | BehaviorState::RotateLeft => {
                let in_state = now.saturating_duration_since(self.last_transition_at);
                if !guard(&[(in_state, self.timings.turn)], self.modifier) {
                    return None;
                }
                if contacts.none_active() {
                    (BehaviorState::Follow, Some(StateModifier::None))
                } else if contacts.both_active() {
                    (BehaviorState::Reverse, Some(StateModifier::Delayed))
                } else {
                    return None;
                }
            }
        };

        Some(self.transition(next, modifier, now))
    }

    /// `None` keeps the active modifier
    fn transition(
        &mut self,
        next: BehaviorState,
        modifier: Option<StateModifier>,
        now: Instant,
    ) -> Transition {
        let from = self.current;
        self.previous = from;
        self.current = next;
        if let Some(modifier) = modifier {
            self.modifier = modifier;
        }
        self.last_transition_at = now;
        if next == BehaviorState::Plan {
            self.planned = false;
        }
        info!("[{}:{}] modifier {:?}", from, next, self.modifier);
        Transition {
            from,
            to: next,
            modifier: self.modifier,
        }
    }
}
