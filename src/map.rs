use nalgebra as na;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Arena geometry as `"x,y;x,y;..."` strings
#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct MapConfig {
    /// 4 corners of the outer boundary
    pub outer_walls: String,
    /// consecutive pairs of points, one pair per wall
    pub inner_walls: String,
    pub points_of_interest: String,
    pub start_index: usize,
    pub goal_index: usize,
    pub safety_margin: f32,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            outer_walls: String::new(),
            inner_walls: String::new(),
            points_of_interest: String::new(),
            start_index: 0,
            goal_index: 1,
            safety_margin: 1.0,
        }
    }
}

#[derive(Error, Debug, PartialEq)]
pub enum MapError {
    #[error("failed to parse coordinate {0:?}")]
    InvalidCoordinate(String),
    #[error("outer boundary needs 4 corners but got {0}")]
    OuterBoundary(usize),
    #[error("inner walls need pairs of points but got {0} points")]
    UnpairedWallPoint(usize),
    #[error("point of interest {index} out of range, map has {count}")]
    PointOfInterestOutOfRange { index: usize, count: usize },
    #[error("grid pitch must be finite and positive but got {0}")]
    InvalidPitch(f32),
    #[error("outer boundary is not finite")]
    UnboundedOuterBoundary,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WallSegment {
    pub start: na::Point2<f32>,
    pub end: na::Point2<f32>,
}

impl WallSegment {
    pub fn new(start: na::Point2<f32>, end: na::Point2<f32>) -> Self {
        Self { start, end }
    }

    /// Axis aligned bounds as (min, max)
    pub fn bounding_box(&self) -> (na::Point2<f32>, na::Point2<f32>) {
        (self.start.inf(&self.end), self.start.sup(&self.end))
    }
}

/// Static arena description. Parsed once at start-up
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Map {
    outer_corners: Vec<na::Point2<f32>>,
    inner_walls: Vec<WallSegment>,
    points_of_interest: Vec<na::Point2<f32>>,
}

impl Map {
    pub fn new(
        outer_corners: Vec<na::Point2<f32>>,
        inner_walls: Vec<WallSegment>,
        points_of_interest: Vec<na::Point2<f32>>,
    ) -> Self {
        Self {
            outer_corners,
            inner_walls,
            points_of_interest,
        }
    }

    pub fn from_config(config: &MapConfig) -> Result<Self, MapError> {
        let outer_corners = parse_points(&config.outer_walls)?;
        let inner_points = parse_points(&config.inner_walls)?;
        if inner_points.len() % 2 != 0 {
            return Err(MapError::UnpairedWallPoint(inner_points.len()));
        }
        let inner_walls = inner_points
            .chunks_exact(2)
            .map(|pair| WallSegment::new(pair[0], pair[1]))
            .collect();
        let points_of_interest = parse_points(&config.points_of_interest)?;
        Ok(Self::new(outer_corners, inner_walls, points_of_interest))
    }

    /// Closed loop of walls through the outer corners
    pub fn outer_walls(&self) -> Vec<WallSegment> {
        if self.outer_corners.len() < 2 {
            return vec![];
        }
        self.outer_corners
            .iter()
            .zip(self.outer_corners.iter().cycle().skip(1))
            .map(|(start, end)| WallSegment::new(*start, *end))
            .collect()
    }

    pub fn inner_walls(&self) -> &[WallSegment] {
        &self.inner_walls
    }

    pub fn points_of_interest(&self) -> &[na::Point2<f32>] {
        &self.points_of_interest
    }

    pub fn point_of_interest(&self, index: usize) -> Result<na::Point2<f32>, MapError> {
        self.points_of_interest
            .get(index)
            .copied()
            .ok_or(MapError::PointOfInterestOutOfRange {
                index,
                count: self.points_of_interest.len(),
            })
    }
}

/// Parses `"x,y;x,y;..."`. Blank input gives no points
pub fn parse_points(text: &str) -> Result<Vec<na::Point2<f32>>, MapError> {
    text.split(';')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(parse_point)
        .collect()
}

fn parse_point(entry: &str) -> Result<na::Point2<f32>, MapError> {
    let invalid = || MapError::InvalidCoordinate(entry.to_owned());
    let (x, y) = entry.split_once(',').ok_or_else(invalid)?;
    let x: f32 = x.trim().parse().map_err(|_| invalid())?;
    let y: f32 = y.trim().parse().map_err(|_| invalid())?;
    if !(x.is_finite() && y.is_finite()) {
        return Err(invalid());
    }
    Ok(na::Point2::new(x, y))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn map_config(outer: &str, inner: &str, poi: &str) -> MapConfig {
        MapConfig {
            outer_walls: outer.to_owned(),
            inner_walls: inner.to_owned(),
            points_of_interest: poi.to_owned(),
            ..Default::default()
        }
    }

    #[test]
    fn parse_point_list() {
        let points = parse_points(" 0,0; 10.5, -2 ;").unwrap();
        assert_eq!(points.len(), 2);
        assert_relative_eq!(points[1].x, 10.5);
        assert_relative_eq!(points[1].y, -2.0);
    }

    #[test]
    fn parse_rejects_garbage() {
        assert_eq!(
            parse_points("1,2;three,4"),
            Err(MapError::InvalidCoordinate("three,4".to_owned()))
        );
        assert!(parse_points("1;2").is_err());
    }

    #[test]
    fn parse_rejects_non_finite() {
        assert_eq!(
            parse_points("-1,-1;inf,-1"),
            Err(MapError::InvalidCoordinate("inf,-1".to_owned()))
        );
        assert!(parse_points("NaN,0").is_err());
        assert!(parse_points("0,-infinity").is_err());
        assert!(Map::from_config(&map_config("-1,-1;inf,-1;inf,5;-1,5", "", "")).is_err());
    }

    #[test]
    fn outer_walls_close_the_loop() {
        let map = Map::from_config(&map_config("0,0;10,0;10,10;0,10", "", "")).unwrap();
        let walls = map.outer_walls();
        assert_eq!(walls.len(), 4);
        assert_eq!(walls[3].start, na::Point2::new(0.0, 10.0));
        assert_eq!(walls[3].end, na::Point2::new(0.0, 0.0));
    }

    #[test]
    fn inner_walls_are_pairs() {
        let map = Map::from_config(&map_config("", "2,2;2,6;4,1;8,1", "")).unwrap();
        assert_eq!(map.inner_walls().len(), 2);
        let error = Map::from_config(&map_config("", "2,2;2,6;4,1", "")).unwrap_err();
        assert_eq!(error, MapError::UnpairedWallPoint(3));
    }

    #[test]
    fn bounding_box_orders_corners() {
        let wall = WallSegment::new(na::Point2::new(6.0, 1.0), na::Point2::new(2.0, 3.0));
        let (min, max) = wall.bounding_box();
        assert_eq!(min, na::Point2::new(2.0, 1.0));
        assert_eq!(max, na::Point2::new(6.0, 3.0));
    }

    #[test]
    fn point_of_interest_lookup() {
        let map = Map::from_config(&map_config("", "", "0,0;4,4")).unwrap();
        assert_eq!(map.point_of_interest(1), Ok(na::Point2::new(4.0, 4.0)));
        assert_eq!(
            map.point_of_interest(2),
            Err(MapError::PointOfInterestOutOfRange { index: 2, count: 2 })
        );
    }
}
