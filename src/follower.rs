use nalgebra as na;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::info;

use crate::planner::Route;

/// Position and heading reported by the marker tracking system
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PositionFix {
    pub position: na::Point3<f32>,
    pub yaw: f32,
    pub available: bool,
}

impl PositionFix {
    pub fn new(position: na::Point3<f32>, yaw: f32) -> Self {
        Self {
            position,
            yaw,
            available: true,
        }
    }

    /// Position projected onto the floor plane
    pub fn planar(&self) -> na::Point2<f32> {
        self.position.xy()
    }
}

impl fmt::Display for PositionFix {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "[{}, {}] -> {}",
            self.position.x,
            self.position.y,
            self.yaw.to_degrees()
        )
    }
}

/// Tracks progress along the current route
#[derive(Debug, Clone, Default)]
pub struct RouteFollower {
    next_waypoint: usize,
    tolerance: f32,
}

impl RouteFollower {
    pub fn new(tolerance: f32) -> Self {
        Self {
            next_waypoint: 0,
            tolerance,
        }
    }

    pub fn restart(&mut self) {
        self.next_waypoint = 0;
    }

    pub fn next_waypoint<'a>(&self, route: &'a Route) -> Option<&'a na::Point2<f32>> {
        route.points().get(self.next_waypoint)
    }

    pub fn finished(&self, route: &Route) -> bool {
        self.next_waypoint >= route.len()
    }

    /// Moves past every waypoint the fix is within tolerance of
    pub fn advance<'a>(
        &mut self,
        route: &'a Route,
        fix: &PositionFix,
    ) -> Option<&'a na::Point2<f32>> {
        let position = fix.planar();
        while let Some(waypoint) = route.points().get(self.next_waypoint) {
            if na::distance(waypoint, &position) > self.tolerance {
                break;
            }
            self.next_waypoint += 1;
            info!(
                reached = self.next_waypoint,
                total = route.len(),
                "Waypoint reached at {}",
                fix
            );
        }
        route.points().get(self.next_waypoint)
    }
}
