use std::ops::{Add, Sub};
use serde::{Deserialize, Serialize};

/// Maximum width of a [board](crate::board::Board), end of word markers included.
pub const MAX_WIDTH: i32 = 17;

/// Maximum height of a [board](crate::board::Board), end of word markers included.
pub const MAX_HEIGHT: i32 = 12;

/// Represents a cell of the board, ordered by x first and y second.
#[derive(Clone, Copy, Eq, PartialEq, PartialOrd, Ord, Hash, Default, Debug, Serialize, Deserialize)]
pub struct Location
{
    pub x: i32,
    pub y: i32,
}

impl Location
{
    pub fn new(x: i32, y: i32) -> Location
    {
        Location { x, y }
    }

    /// Returns the location `steps` cells away in the given [direction](Direction) (negative steps go backwards).
    pub fn offset(&self, direction: Direction, steps: i32) -> Location
    {
        *self + direction.unit() * steps
    }
}

/// Represents a displacement between two [locations](Location)
#[derive(Clone, Copy, Eq, PartialEq, PartialOrd, Ord, Hash, Default, Debug, Serialize, Deserialize)]
pub struct Vector
{
    pub dx: i32,
    pub dy: i32,
}

impl Vector
{
    pub fn new(dx: i32, dy: i32) -> Vector
    {
        Vector { dx, dy }
    }

    pub fn is_zero(&self) -> bool
    {
        self.dx == 0 && self.dy == 0
    }
}

impl std::ops::Mul<i32> for Vector
{
    type Output = Vector;

    fn mul(self, rhs: i32) -> Vector
    {
        Vector { dx: self.dx * rhs, dy: self.dy * rhs }
    }
}

impl std::ops::Neg for Vector
{
    type Output = Vector;

    fn neg(self) -> Vector
    {
        Vector { dx: -self.dx, dy: -self.dy }
    }
}

impl Add<Vector> for Location
{
    type Output = Location;

    fn add(self, rhs: Vector) -> Location
    {
        Location { x: self.x + rhs.dx, y: self.y + rhs.dy }
    }
}

impl Sub<Location> for Location
{
    type Output = Vector;

    fn sub(self, rhs: Location) -> Vector
    {
        Vector { dx: self.x - rhs.x, dy: self.y - rhs.y }
    }
}

/// Represents the direction of a [word](crate::placement::WordPlacement) placed on a [board](crate::board::Board)
#[derive(Clone, Copy, Eq, PartialEq, PartialOrd, Ord, Hash, Default, Debug, Serialize, Deserialize)]
pub enum Direction
{
    #[default]
    Across,
    Down,
}

impl Direction
{
    pub fn opposite(&self) -> Direction
    {
        match *self
        {
            Direction::Across => Direction::Down,
            Direction::Down => Direction::Across,
        }
    }

    /// One cell forward along this direction.
    pub fn unit(&self) -> Vector
    {
        match *self
        {
            Direction::Across => Vector::new(1, 0),
            Direction::Down => Vector::new(0, 1),
        }
    }
}

/// An axis aligned rectangle of cells, `top_left` included, width and height never negative.
///
/// A rectangle with zero area is empty and acts as the identity for [Rectangle::union].
#[derive(Clone, Copy, Eq, PartialEq, PartialOrd, Ord, Hash, Default, Debug, Serialize, Deserialize)]
pub struct Rectangle
{
    pub top_left: Location,
    pub width: i32,
    pub height: i32,
}

impl Rectangle
{
    pub fn new(top_left: Location, width: i32, height: i32) -> Rectangle
    {
        Rectangle { top_left, width: width.max(0), height: height.max(0) }
    }

    pub fn is_empty(&self) -> bool
    {
        self.width == 0 || self.height == 0
    }

    pub fn left(&self) -> i32 { self.top_left.x }
    pub fn top(&self) -> i32 { self.top_left.y }
    /// Exclusive
    pub fn right(&self) -> i32 { self.top_left.x + self.width }
    /// Exclusive
    pub fn bottom(&self) -> i32 { self.top_left.y + self.height }

    pub fn area(&self) -> usize
    {
        (self.width * self.height) as usize
    }

    /// Returns the smallest rectangle containing both rectangles
    ///
    /// ## Examples
    /// ```
    /// # use crozzle_generator::geometry::{Location, Rectangle};
    /// let a = Rectangle::new(Location::new(-1, 0), 7, 1);
    /// let b = Rectangle::new(Location::new(2, -1), 1, 5);
    /// assert_eq!(a.union(&b), Rectangle::new(Location::new(-1, -1), 7, 5));
    /// ```
    pub fn union(&self, other: &Rectangle) -> Rectangle
    {
        if self.is_empty() { return *other; }
        if other.is_empty() { return *self; }

        let left = self.left().min(other.left());
        let top = self.top().min(other.top());
        let right = self.right().max(other.right());
        let bottom = self.bottom().max(other.bottom());

        Rectangle::new(Location::new(left, top), right - left, bottom - top)
    }

    pub fn contains(&self, location: &Location) -> bool
    {
        location.x >= self.left() && location.x < self.right() &&
        location.y >= self.top() && location.y < self.bottom()
    }

    pub fn contains_rectangle(&self, other: &Rectangle) -> bool
    {
        other.is_empty() ||
        (other.left() >= self.left() && other.right() <= self.right() &&
         other.top() >= self.top() && other.bottom() <= self.bottom())
    }

    pub fn intersects(&self, other: &Rectangle) -> bool
    {
        !self.is_empty() && !other.is_empty() &&
        (self.left() < other.right() && self.right() > other.left()) &&
        (self.top() < other.bottom() && self.bottom() > other.top())
    }

    pub fn translate(&self, vector: Vector) -> Rectangle
    {
        Rectangle { top_left: self.top_left + vector, ..*self }
    }

    /// Row major index of the location inside the rectangle, None for locations outside it
    pub fn index_of(&self, location: &Location) -> Option<usize>
    {
        self.contains(location).then(|| ((location.y - self.top()) * self.width + (location.x - self.left())) as usize)
    }

    /// Inverse of [Rectangle::index_of]
    pub fn location_of(&self, index: usize) -> Location
    {
        let index = index as i32;
        Location::new(self.left() + index % self.width, self.top() + index / self.width)
    }

    /// Iterates over all locations, row by row.
    pub fn locations(&self) -> impl Iterator<Item = Location> + '_
    {
        (self.top()..self.bottom()).flat_map(move |y| (self.left()..self.right()).map(move |x| Location::new(x, y)))
    }
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn test_rectangle_union_with_empty_is_identity()
    {
        let r = Rectangle::new(Location::new(3, 4), 2, 2);
        assert_eq!(Rectangle::default().union(&r), r);
        assert_eq!(r.union(&Rectangle::default()), r);
    }

    #[test]
    fn test_rectangle_intersections_and_containment()
    {
        let a = Rectangle::new(Location::new(0, 0), 3, 3);
        let b = Rectangle::new(Location::new(2, 2), 3, 3);
        let c = Rectangle::new(Location::new(3, 0), 1, 1);

        assert!(a.intersects(&b));
        assert!(!a.intersects(&c));
        assert!(a.contains(&Location::new(2, 2)));
        assert!(!a.contains(&Location::new(3, 2)));
        assert!(a.union(&b).contains_rectangle(&c));
    }

    #[test]
    fn test_rectangle_index_round_trip()
    {
        let r = Rectangle::new(Location::new(-1, -2), 4, 3);
        for (i, location) in r.locations().enumerate()
        {
            assert_eq!(r.index_of(&location), Some(i));
            assert_eq!(r.location_of(i), location);
        }
        assert_eq!(r.index_of(&Location::new(3, 0)), None);
    }

    #[test]
    fn test_location_order_is_x_major()
    {
        assert!(Location::new(0, 5) < Location::new(1, 0));
        assert!(Location::new(1, 0) < Location::new(1, 1));
        assert_eq!(Location::new(2, 3).offset(Direction::Down, -2), Location::new(2, 1));
    }
}
