//! Grid geometry: integer points, cardinal directions and Manhattan distance.
//!
//! The harbor is a `width × height` grid with `y` growing downwards: row 0
//! is the top edge where entry points live. Points order row-major (by `y`,
//! then `x`) so that ordered maps keyed by `Point` iterate the grid the way
//! it is drawn.

use std::cmp::Ordering;
use std::fmt;
use std::ops::{Add, AddAssign, Sub};

use serde::{Deserialize, Serialize};

/// Integer grid coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Whether this point lies inside `[0, width) × [0, height)`.
    pub fn within(&self, width: u32, height: u32) -> bool {
        self.x >= 0 && self.y >= 0 && (self.x as u32) < width && (self.y as u32) < height
    }
}

impl Ord for Point {
    fn cmp(&self, other: &Self) -> Ordering {
        self.y.cmp(&other.y).then(self.x.cmp(&other.x))
    }
}

impl PartialOrd for Point {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Add for Point {
    type Output = Point;

    fn add(self, rhs: Point) -> Point {
        Point::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Point {
    type Output = Point;

    fn sub(self, rhs: Point) -> Point {
        Point::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Add<Direction> for Point {
    type Output = Point;

    fn add(self, rhs: Direction) -> Point {
        self + rhs.offset()
    }
}

impl AddAssign<Direction> for Point {
    fn add_assign(&mut self, rhs: Direction) {
        *self = *self + rhs;
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{} , {}]", self.x, self.y)
    }
}

/// One of the four cardinal directions on the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
    ];

    /// Unit offset for this direction. `Up` decreases `y`.
    pub fn offset(self) -> Point {
        match self {
            Self::Up => Point::new(0, -1),
            Self::Down => Point::new(0, 1),
            Self::Left => Point::new(-1, 0),
            Self::Right => Point::new(1, 0),
        }
    }

    /// Direction that most reduces `delta`: the axis with the larger
    /// magnitude wins, ties go to the vertical axis. A zero delta maps to
    /// `Up`.
    pub fn dominant(delta: Point) -> Self {
        if delta.x.abs() > delta.y.abs() {
            if delta.x > 0 {
                Self::Right
            } else {
                Self::Left
            }
        } else if delta.y > 0 {
            Self::Down
        } else {
            Self::Up
        }
    }
}

impl From<Direction> for Point {
    fn from(direction: Direction) -> Self {
        direction.offset()
    }
}

impl From<Point> for Direction {
    fn from(delta: Point) -> Self {
        Direction::dominant(delta)
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Up => "UP",
            Self::Down => "DOWN",
            Self::Left => "LEFT",
            Self::Right => "RIGHT",
        };
        f.write_str(label)
    }
}

/// Manhattan (taxicab) distance between two points.
pub fn manhattan_distance(a: Point, b: Point) -> u32 {
    a.x.abs_diff(b.x) + a.y.abs_diff(b.y)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn test_row_major_ordering() {
        let mut map = BTreeMap::new();
        map.insert(Point::new(3, 1), 'c');
        map.insert(Point::new(0, 1), 'b');
        map.insert(Point::new(9, 0), 'a');
        let order: Vec<char> = map.values().copied().collect();
        assert_eq!(order, vec!['a', 'b', 'c']);
    }

    #[test]
    fn test_point_arithmetic() {
        let a = Point::new(2, 5);
        let b = Point::new(-1, 3);
        assert_eq!(a + b, Point::new(1, 8));
        assert_eq!(a - b, Point::new(3, 2));
        assert_eq!(a + Direction::Up, Point::new(2, 4));
        assert_eq!(a + Direction::Right, Point::new(3, 5));

        let mut c = a;
        c += Direction::Left;
        c += Direction::Down;
        assert_eq!(c, Point::new(1, 6));
    }

    #[test]
    fn test_direction_offset_round_trip() {
        for d in Direction::ALL {
            assert_eq!(Direction::from(Point::from(d)), d);
        }
    }

    #[test]
    fn test_dominant_axis_wins() {
        assert_eq!(Direction::dominant(Point::new(5, 2)), Direction::Right);
        assert_eq!(Direction::dominant(Point::new(-5, 2)), Direction::Left);
        assert_eq!(Direction::dominant(Point::new(1, -4)), Direction::Up);
        assert_eq!(Direction::dominant(Point::new(0, 4)), Direction::Down);
    }

    #[test]
    fn test_ties_favor_vertical() {
        assert_eq!(Direction::dominant(Point::new(3, 3)), Direction::Down);
        assert_eq!(Direction::dominant(Point::new(-3, -3)), Direction::Up);
        assert_eq!(Direction::dominant(Point::new(2, -2)), Direction::Up);
    }

    #[test]
    fn test_manhattan_distance() {
        assert_eq!(manhattan_distance(Point::new(0, 0), Point::new(3, 4)), 7);
        assert_eq!(manhattan_distance(Point::new(3, 4), Point::new(0, 0)), 7);
        assert_eq!(manhattan_distance(Point::new(-2, 1), Point::new(2, -1)), 6);
        assert_eq!(manhattan_distance(Point::new(5, 5), Point::new(5, 5)), 0);
    }

    #[test]
    fn test_within_bounds() {
        assert!(Point::new(0, 0).within(4, 2));
        assert!(Point::new(3, 1).within(4, 2));
        assert!(!Point::new(4, 1).within(4, 2));
        assert!(!Point::new(0, 2).within(4, 2));
        assert!(!Point::new(-1, 0).within(4, 2));
    }

    #[test]
    fn test_display() {
        assert_eq!(Point::new(3, -1).to_string(), "[3 , -1]");
        assert_eq!(Direction::Left.to_string(), "LEFT");
    }
}
