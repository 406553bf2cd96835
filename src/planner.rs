use nalgebra as na;
use tracing::{debug, error, info, warn};

use crate::grid::{NavigableGrid, UNREACHED};
use crate::map::{Map, MapConfig, MapError};

/// Ordered waypoints from start to goal inclusive
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Route {
    points: Vec<na::Point2<f32>>,
}

impl Route {
    pub fn new(points: Vec<na::Point2<f32>>) -> Self {
        Self { points }
    }

    pub fn points(&self) -> &[na::Point2<f32>] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Travelled distance along the route
    pub fn cost(&self) -> f32 {
        self.points
            .windows(2)
            .map(|pair| (pair[1] - pair[0]).norm())
            .sum()
    }
}

/// Uniform cost search over the 4-connected grid.
///
/// Frontier minimum is found with a linear scan, ties go to the node built
/// first. Scratch fields of the grid are reset before the search so repeated
/// runs are independent. Missing or unreachable endpoints give an empty route.
pub fn plan(grid: &mut NavigableGrid, start: &na::Point2<f32>, goal: &na::Point2<f32>) -> Route {
    grid.reset_scratch();

    let Some(start_slot) = grid.slot_at(start) else {
        warn!(?start, "Start is not a waypoint");
        return Route::default();
    };
    grid.node_mut(start_slot).distance = 0.0;
    let pitch = grid.pitch();

    let mut frontier: Vec<usize> = (0..grid.len()).collect();
    while !frontier.is_empty() {
        let mut best = 0;
        for (position, slot) in frontier.iter().enumerate().skip(1) {
            if grid.node(*slot).distance < grid.node(frontier[best]).distance {
                best = position;
            }
        }
        let selected = frontier.remove(best);
        let selected_index = grid.node(selected).index;
        let selected_distance = grid.node(selected).distance;
        if selected_distance == UNREACHED {
            // everything left is disconnected from the start
            break;
        }

        let candidate = selected_distance + pitch;
        for neighbour in selected_index.neighbours() {
            if let Some(slot) = grid.slot(&neighbour) {
                let node = grid.node_mut(slot);
                if candidate < node.distance {
                    node.distance = candidate;
                    node.predecessor = Some(selected_index);
                }
            }
        }
    }

    let Some(goal_slot) = grid.slot_at(goal) else {
        warn!(?goal, "Goal is not a waypoint");
        return Route::default();
    };
    if grid.node(goal_slot).distance == UNREACHED {
        warn!(?start, ?goal, "Goal is unreachable");
        return Route::default();
    }

    let start_index = grid.node(start_slot).index;
    let mut points = vec![];
    let mut current = goal_slot;
    while grid.node(current).index != start_index {
        points.push(grid.node(current).position);
        match grid.node(current).predecessor.and_then(|index| grid.slot(&index)) {
            Some(previous) => current = previous,
            None => return Route::default(),
        }
    }
    points.push(grid.node(start_slot).position);
    points.reverse();
    Route::new(points)
}

/// Grid and endpoints for planning episodes.
///
/// Without a grid or endpoints every episode yields an empty route.
#[derive(Debug, Clone, Default)]
pub struct PathPlanner {
    grid: Option<NavigableGrid>,
    endpoints: Option<(na::Point2<f32>, na::Point2<f32>)>,
}

impl PathPlanner {
    pub fn new(grid: NavigableGrid, start: na::Point2<f32>, goal: na::Point2<f32>) -> Self {
        Self {
            grid: Some(grid),
            endpoints: Some((start, goal)),
        }
    }

    /// Builds the grid and resolves the start and goal points of interest
    pub fn from_map(map: &Map, config: &MapConfig) -> Result<Self, MapError> {
        let grid = NavigableGrid::build(map, config.safety_margin)?;
        let start = map.point_of_interest(config.start_index)?;
        let goal = map.point_of_interest(config.goal_index)?;
        Ok(Self::new(grid, start, goal))
    }

    /// A malformed map disables planning instead of failing start-up
    pub fn from_config(config: &MapConfig) -> Self {
        match Map::from_config(config).and_then(|map| Self::from_map(&map, config)) {
            Ok(planner) => {
                info!(
                    nodes = planner.grid().map(NavigableGrid::len).unwrap_or_default(),
                    "Navigable grid built"
                );
                planner
            }
            Err(err) => {
                error!("Map unusable, planning disabled: {}", err);
                Self::unavailable()
            }
        }
    }

    pub fn unavailable() -> Self {
        Self::default()
    }

    pub fn is_available(&self) -> bool {
        self.grid.is_some() && self.endpoints.is_some()
    }

    pub fn grid(&self) -> Option<&NavigableGrid> {
        self.grid.as_ref()
    }

    pub fn plan_route(&mut self) -> Route {
        match (&mut self.grid, &self.endpoints) {
            (Some(grid), Some((start, goal))) => {
                debug!(nodes = grid.len(), "Planning route");
                let route = plan(grid, start, goal);
                info!(waypoints = route.len(), cost = route.cost(), "Planned route");
                route
            }
            _ => {
                warn!("No map available, can't plan a route");
                Route::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::{Map, WallSegment};
    use approx::assert_relative_eq;

    fn arena(min: f32, max: f32, inner_walls: Vec<WallSegment>, margin: f32) -> NavigableGrid {
        let map = Map::new(
            vec![
                na::Point2::new(min, min),
                na::Point2::new(max, min),
                na::Point2::new(max, max),
                na::Point2::new(min, max),
            ],
            inner_walls,
            vec![],
        );
        NavigableGrid::build(&map, margin).unwrap()
    }

    fn post(x: f32, y: f32) -> WallSegment {
        WallSegment::new(na::Point2::new(x, y), na::Point2::new(x, y))
    }

    fn assert_connected(route: &Route, pitch: f32) {
        for pair in route.points().windows(2) {
            assert_relative_eq!((pair[1] - pair[0]).norm(), pitch);
        }
        for (i, point) in route.points().iter().enumerate() {
            assert!(!route.points()[i + 1..].contains(point), "repeated {point:?}");
        }
    }

    #[test]
    fn three_by_three_corner_to_corner() {
        let mut grid = arena(-1.0, 5.0, vec![], 1.0);
        let route = plan(
            &mut grid,
            &na::Point2::new(0.0, 0.0),
            &na::Point2::new(4.0, 4.0),
        );
        assert_eq!(route.len(), 5);
        assert_relative_eq!(route.cost(), 8.0);
        assert_connected(&route, 2.0);
        // ties resolve in build order which runs along y first
        assert_eq!(
            route.points(),
            &[
                na::Point2::new(0.0, 0.0),
                na::Point2::new(0.0, 2.0),
                na::Point2::new(0.0, 4.0),
                na::Point2::new(2.0, 4.0),
                na::Point2::new(4.0, 4.0),
            ]
        );
    }

    #[test]
    fn open_arena_cost_is_manhattan() {
        let mut grid = arena(-1.0, 21.0, vec![], 1.0);
        let start = na::Point2::new(2.0, 18.0);
        let goal = na::Point2::new(14.0, 6.0);
        let route = plan(&mut grid, &start, &goal);
        assert_eq!(route.points().first(), Some(&start));
        assert_eq!(route.points().last(), Some(&goal));
        assert_relative_eq!(route.cost(), 24.0);
        assert_eq!(route.len(), 13);
        assert_connected(&route, 2.0);
    }

    #[test]
    fn route_goes_around_walls() {
        let wall = WallSegment::new(na::Point2::new(4.0, -1.0), na::Point2::new(4.0, 6.0));
        let mut grid = arena(-1.0, 11.0, vec![wall], 1.0);
        let route = plan(
            &mut grid,
            &na::Point2::new(0.0, 0.0),
            &na::Point2::new(8.0, 0.0),
        );
        assert!(!route.is_empty());
        assert_connected(&route, 2.0);
        assert!(route.cost() > 8.0);
        assert!(route
            .points()
            .iter()
            .all(|point| grid.slot_at(point).is_some()));
    }

    #[test]
    fn enclosed_goal_is_unreachable() {
        let posts = vec![post(6.0, 8.0), post(10.0, 8.0), post(8.0, 6.0), post(8.0, 10.0)];
        let mut grid = arena(-1.0, 11.0, posts, 0.5);
        assert!(grid.slot_at(&na::Point2::new(8.0, 8.0)).is_some());
        let route = plan(
            &mut grid,
            &na::Point2::new(0.0, 0.0),
            &na::Point2::new(8.0, 8.0),
        );
        assert!(route.is_empty());
    }

    #[test]
    fn missing_endpoints_give_empty_route() {
        let mut grid = arena(-1.0, 5.0, vec![], 1.0);
        let off_lattice = plan(
            &mut grid,
            &na::Point2::new(1.0, 0.0),
            &na::Point2::new(4.0, 4.0),
        );
        assert!(off_lattice.is_empty());
        let outside = plan(
            &mut grid,
            &na::Point2::new(0.0, 0.0),
            &na::Point2::new(40.0, 4.0),
        );
        assert!(outside.is_empty());
    }

    #[test]
    fn start_equals_goal() {
        let mut grid = arena(-1.0, 5.0, vec![], 1.0);
        let point = na::Point2::new(2.0, 2.0);
        let route = plan(&mut grid, &point, &point);
        assert_eq!(route.points(), &[point]);
        assert_relative_eq!(route.cost(), 0.0);
    }

    #[test]
    fn replanning_resets_scratch() {
        let mut grid = arena(-1.0, 9.0, vec![], 1.0);
        let first = plan(
            &mut grid,
            &na::Point2::new(0.0, 0.0),
            &na::Point2::new(8.0, 8.0),
        );
        let second = plan(
            &mut grid,
            &na::Point2::new(8.0, 8.0),
            &na::Point2::new(0.0, 0.0),
        );
        assert_relative_eq!(first.cost(), 16.0);
        assert_relative_eq!(second.cost(), 16.0);
        let positions: Vec<_> = grid.nodes().iter().map(|node| node.position).collect();
        let rebuilt = arena(-1.0, 9.0, vec![], 1.0);
        let rebuilt_positions: Vec<_> = rebuilt.nodes().iter().map(|node| node.position).collect();
        assert_eq!(positions, rebuilt_positions);
    }

    fn map_config(outer: &str, poi: &str, goal_index: usize) -> MapConfig {
        MapConfig {
            outer_walls: outer.to_owned(),
            inner_walls: "4,-1;4,4".to_owned(),
            points_of_interest: poi.to_owned(),
            start_index: 0,
            goal_index,
            safety_margin: 1.0,
        }
    }

    #[test]
    fn planner_from_config_plans_between_points_of_interest() {
        let config = map_config("-1,-1;9,-1;9,9;-1,9", "0,0;8,0", 1);
        let mut planner = PathPlanner::from_config(&config);
        assert!(planner.is_available());
        let route = planner.plan_route();
        assert_eq!(route.points().first(), Some(&na::Point2::new(0.0, 0.0)));
        assert_eq!(route.points().last(), Some(&na::Point2::new(8.0, 0.0)));
        // detour around the wall
        assert_relative_eq!(route.cost(), 20.0);
    }

    #[test]
    fn malformed_map_disables_planning() {
        let three_corners = map_config("-1,-1;9,-1;9,9", "0,0;8,0", 1);
        assert!(!PathPlanner::from_config(&three_corners).is_available());
        let bad_index = map_config("-1,-1;9,-1;9,9;-1,9", "0,0;8,0", 2);
        assert_eq!(
            PathPlanner::from_map(&Map::from_config(&bad_index).unwrap(), &bad_index).unwrap_err(),
            MapError::PointOfInterestOutOfRange { index: 2, count: 2 }
        );
        assert!(PathPlanner::from_config(&bad_index).plan_route().is_empty());
        let endless = map_config("-1,-1;inf,-1;inf,5;-1,5", "0,0;2,0", 1);
        assert!(!PathPlanner::from_config(&endless).is_available());
    }

    #[test]
    fn planner_without_map_has_no_route() {
        let mut planner = PathPlanner::unavailable();
        assert!(!planner.is_available());
        assert!(planner.plan_route().is_empty());
    }
}
