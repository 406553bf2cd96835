use nalgebra as na;
use std::collections::HashMap;

use crate::map::{Map, MapError};

/// Spacing between neighbouring waypoints
pub const GRID_PITCH: f32 = 2.0;

/// Planner working value for nodes that have not been reached
pub const UNREACHED: f32 = f32::MAX;

const LATTICE_TOLERANCE: f32 = 1e-3;

/// Integer lattice coordinate of a waypoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GridIndex {
    pub x: i32,
    pub y: i32,
}

impl GridIndex {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Returns `None` for points that are not on the lattice
    pub fn from_point(point: &na::Point2<f32>, pitch: f32) -> Option<Self> {
        let x = (point.x / pitch).round();
        let y = (point.y / pitch).round();
        let aligned = (point.x - x * pitch).abs() <= LATTICE_TOLERANCE * pitch
            && (point.y - y * pitch).abs() <= LATTICE_TOLERANCE * pitch;
        aligned.then(|| Self::new(x as i32, y as i32))
    }

    pub fn neighbours(&self) -> [GridIndex; 4] {
        [
            GridIndex::new(self.x + 1, self.y),
            GridIndex::new(self.x - 1, self.y),
            GridIndex::new(self.x, self.y + 1),
            GridIndex::new(self.x, self.y - 1),
        ]
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct WaypointNode {
    pub index: GridIndex,
    pub position: na::Point2<f32>,
    pub distance: f32,
    pub predecessor: Option<GridIndex>,
}

impl WaypointNode {
    fn new(index: GridIndex, position: na::Point2<f32>) -> Self {
        Self {
            index,
            position,
            distance: UNREACHED,
            predecessor: None,
        }
    }

    pub fn reset(&mut self) {
        self.distance = UNREACHED;
        self.predecessor = None;
    }
}

/// Area around an inner wall that waypoints must stay out of
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlockedArea {
    min: na::Point2<f32>,
    max: na::Point2<f32>,
}

impl BlockedArea {
    pub fn around(min: na::Point2<f32>, max: na::Point2<f32>, margin: f32) -> Self {
        let margin = na::Vector2::new(margin, margin);
        Self {
            min: min - margin,
            max: max + margin,
        }
    }

    /// Points on the edge are not inside
    pub fn contains(&self, point: &na::Point2<f32>) -> bool {
        point.x > self.min.x
            && point.x < self.max.x
            && point.y > self.min.y
            && point.y < self.max.y
    }
}

/// Collision free waypoints on a fixed pitch lattice.
///
/// Only the scratch fields of each node change after construction.
#[derive(Debug, Clone)]
pub struct NavigableGrid {
    pitch: f32,
    nodes: Vec<WaypointNode>,
    lookup: HashMap<GridIndex, usize>,
}

impl NavigableGrid {
    pub fn build(map: &Map, safety_margin: f32) -> Result<Self, MapError> {
        Self::build_with_pitch(map, safety_margin, GRID_PITCH)
    }

    pub fn build_with_pitch(map: &Map, safety_margin: f32, pitch: f32) -> Result<Self, MapError> {
        if !(pitch.is_finite() && pitch > 0.0) {
            return Err(MapError::InvalidPitch(pitch));
        }
        let outer_walls = map.outer_walls();
        if outer_walls.len() != 4 {
            return Err(MapError::OuterBoundary(outer_walls.len()));
        }

        // lattice indices are i32
        let lattice_limit = i32::MAX as f32 * pitch;
        if outer_walls
            .iter()
            .flat_map(|wall| [wall.start, wall.end])
            .flat_map(|corner| [corner.x, corner.y])
            .any(|bound| !bound.is_finite() || bound.abs() >= lattice_limit)
        {
            return Err(MapError::UnboundedOuterBoundary);
        }

        let blocked: Vec<BlockedArea> = map
            .inner_walls()
            .iter()
            .map(|wall| {
                let (min, max) = wall.bounding_box();
                BlockedArea::around(min, max, safety_margin)
            })
            .collect();

        // margin is only applied to inner walls
        let (outer_min, outer_max) = outer_walls.iter().fold(
            (outer_walls[0].start, outer_walls[0].start),
            |(min, max), wall| {
                let (wall_min, wall_max) = wall.bounding_box();
                (min.inf(&wall_min), max.sup(&wall_max))
            },
        );

        let first_x = first_line_inside(outer_min.x, pitch);
        let first_y = first_line_inside(outer_min.y, pitch);

        let mut nodes = vec![];
        let mut lookup = HashMap::new();
        let mut x_index = first_x;
        while (x_index as f32) * pitch < outer_max.x {
            let mut y_index = first_y;
            while (y_index as f32) * pitch < outer_max.y {
                let position = na::Point2::new(x_index as f32 * pitch, y_index as f32 * pitch);
                if !blocked.iter().any(|area| area.contains(&position)) {
                    let index = GridIndex::new(x_index, y_index);
                    lookup.insert(index, nodes.len());
                    nodes.push(WaypointNode::new(index, position));
                }
                y_index += 1;
            }
            x_index += 1;
        }

        Ok(Self {
            pitch,
            nodes,
            lookup,
        })
    }

    pub fn pitch(&self) -> f32 {
        self.pitch
    }

    /// Nodes in build order
    pub fn nodes(&self) -> &[WaypointNode] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn slot(&self, index: &GridIndex) -> Option<usize> {
        self.lookup.get(index).copied()
    }

    pub fn slot_at(&self, point: &na::Point2<f32>) -> Option<usize> {
        GridIndex::from_point(point, self.pitch).and_then(|index| self.slot(&index))
    }

    pub fn node(&self, slot: usize) -> &WaypointNode {
        &self.nodes[slot]
    }

    pub(crate) fn node_mut(&mut self, slot: usize) -> &mut WaypointNode {
        &mut self.nodes[slot]
    }

    pub(crate) fn reset_scratch(&mut self) {
        self.nodes.iter_mut().for_each(WaypointNode::reset);
    }
}

/// Index of the first lattice line strictly above `lower`
fn first_line_inside(lower: f32, pitch: f32) -> i32 {
    (lower / pitch).floor() as i32 + 1
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::WallSegment;

    fn square_map(min: f32, max: f32, inner_walls: Vec<WallSegment>) -> Map {
        Map::new(
            vec![
                na::Point2::new(min, min),
                na::Point2::new(max, min),
                na::Point2::new(max, max),
                na::Point2::new(min, max),
            ],
            inner_walls,
            vec![],
        )
    }

    #[test]
    fn empty_arena_fills_interior() {
        let grid = NavigableGrid::build(&square_map(-1.0, 5.0, vec![]), 1.0).unwrap();
        assert_eq!(grid.len(), 9);
        assert_eq!(grid.nodes()[0].position, na::Point2::new(0.0, 0.0));
        assert_eq!(grid.nodes()[1].position, na::Point2::new(0.0, 2.0));
        assert_eq!(grid.nodes()[8].position, na::Point2::new(4.0, 4.0));
        assert!(grid
            .nodes()
            .iter()
            .all(|node| node.distance == UNREACHED && node.predecessor.is_none()));
    }

    #[test]
    fn lower_bound_on_lattice_is_excluded() {
        let grid = NavigableGrid::build(&square_map(0.0, 6.0, vec![]), 1.0).unwrap();
        // lines 2 and 4 only, 0 and 6 sit on the walls
        assert_eq!(grid.len(), 4);
        assert!(grid.slot_at(&na::Point2::new(0.0, 0.0)).is_none());
        assert!(grid.slot_at(&na::Point2::new(2.0, 4.0)).is_some());
    }

    #[test]
    fn inner_wall_blocks_with_margin() {
        let wall = WallSegment::new(na::Point2::new(4.0, 1.0), na::Point2::new(4.0, 7.0));
        let grid = NavigableGrid::build(&square_map(-1.0, 9.0, vec![wall]), 1.0).unwrap();
        for y in [2.0, 4.0, 6.0] {
            assert!(grid.slot_at(&na::Point2::new(4.0, y)).is_none());
        }
        // edges of the blocked area stay open
        assert!(grid.slot_at(&na::Point2::new(2.0, 4.0)).is_some());
        assert!(grid.slot_at(&na::Point2::new(4.0, 8.0)).is_some());
        assert!(grid.slot_at(&na::Point2::new(4.0, 0.0)).is_some());
    }

    #[test]
    fn building_twice_is_identical() {
        let wall = WallSegment::new(na::Point2::new(2.0, 2.0), na::Point2::new(6.0, 2.0));
        let map = square_map(-1.0, 9.0, vec![wall]);
        let first = NavigableGrid::build(&map, 0.5).unwrap();
        let second = NavigableGrid::build(&map, 0.5).unwrap();
        assert_eq!(first.nodes(), second.nodes());
    }

    #[test]
    fn outer_boundary_must_have_four_walls() {
        let map = Map::new(
            vec![
                na::Point2::new(0.0, 0.0),
                na::Point2::new(4.0, 0.0),
                na::Point2::new(4.0, 4.0),
            ],
            vec![],
            vec![],
        );
        assert_eq!(
            NavigableGrid::build(&map, 1.0).unwrap_err(),
            MapError::OuterBoundary(3)
        );
    }

    #[test]
    fn rejects_bad_pitch_and_unbounded_arena() {
        let map = square_map(-1.0, 5.0, vec![]);
        for pitch in [0.0, -2.0, f32::NAN, f32::INFINITY] {
            assert!(matches!(
                NavigableGrid::build_with_pitch(&map, 1.0, pitch),
                Err(MapError::InvalidPitch(_))
            ));
        }
        let unbounded = square_map(-1.0, f32::INFINITY, vec![]);
        assert_eq!(
            NavigableGrid::build(&unbounded, 1.0).unwrap_err(),
            MapError::UnboundedOuterBoundary
        );
        let not_a_number = square_map(f32::NAN, 5.0, vec![]);
        assert!(NavigableGrid::build(&not_a_number, 1.0).is_err());
    }

    #[test]
    fn grid_index_requires_lattice_alignment() {
        assert_eq!(
            GridIndex::from_point(&na::Point2::new(4.0, -2.0), GRID_PITCH),
            Some(GridIndex::new(2, -1))
        );
        assert_eq!(
            GridIndex::from_point(&na::Point2::new(4.0000005, 2.0), GRID_PITCH),
            Some(GridIndex::new(2, 1))
        );
        assert_eq!(GridIndex::from_point(&na::Point2::new(1.0, 2.0), GRID_PITCH), None);
    }
}
