use std::sync::Arc;

use serde::{Deserialize, Serialize};
use crate::geometry::{Direction, Location, Rectangle, Vector};

/// Represents a word placed on a [board](crate::board::Board): its first letter's [location](Location), its [direction](Direction) and its text.
///
/// A placement occupies `len + 2` cells along its direction, the two extra cells are the end of word markers
/// that must stay blank (or lie outside the board).
#[derive(Clone, Eq, PartialEq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
pub struct WordPlacement
{
    pub location: Location,
    pub direction: Direction,
    pub word: Arc<str>,
}

impl WordPlacement
{
    pub fn new(direction: Direction, location: Location, word: impl Into<Arc<str>>) -> WordPlacement
    {
        WordPlacement { location, direction, word: word.into() }
    }

    pub fn letters(&self) -> &[u8]
    {
        self.word.as_bytes()
    }

    pub fn len(&self) -> usize
    {
        self.word.len()
    }

    pub fn is_empty(&self) -> bool
    {
        self.word.is_empty()
    }

    /// Returns the cells covered by the letters of the word
    ///
    /// ## Examples
    /// ```
    /// # use crozzle_generator::geometry::{Direction, Location, Rectangle};
    /// # use crozzle_generator::placement::WordPlacement;
    /// let w = WordPlacement::new(Direction::Down, Location::new(2, 0), "CAT");
    /// assert_eq!(w.rectangle(), Rectangle::new(Location::new(2, 0), 1, 3));
    /// assert_eq!(w.extended_rectangle(), Rectangle::new(Location::new(2, -1), 1, 5));
    /// ```
    pub fn rectangle(&self) -> Rectangle
    {
        let len = self.len() as i32;
        match self.direction
        {
            Direction::Across => Rectangle::new(self.location, len, 1),
            Direction::Down => Rectangle::new(self.location, 1, len),
        }
    }

    /// Returns the cells covered by the word together with both end of word markers
    pub fn extended_rectangle(&self) -> Rectangle
    {
        let len = self.len() as i32 + 2;
        let start = self.start_marker();
        match self.direction
        {
            Direction::Across => Rectangle::new(start, len, 1),
            Direction::Down => Rectangle::new(start, 1, len),
        }
    }

    /// The cell right before the first letter.
    pub fn start_marker(&self) -> Location
    {
        self.location.offset(self.direction, -1)
    }

    /// The cell right after the last letter.
    pub fn end_marker(&self) -> Location
    {
        self.location.offset(self.direction, self.len() as i32)
    }

    pub fn location_at(&self, index: usize) -> Location
    {
        self.location.offset(self.direction, index as i32)
    }

    /// Iterates over `(index, location, letter)` of every letter in the word.
    pub fn cells(&self) -> impl Iterator<Item = (usize, Location, u8)> + '_
    {
        self.letters().iter().enumerate().map(move |(i, &letter)| (i, self.location_at(i), letter))
    }

    /// Returns the index of the letter placed at the location, if the word covers it.
    pub fn index_of(&self, location: &Location) -> Option<usize>
    {
        let offset = *location - self.location;
        let (along, across) = match self.direction
        {
            Direction::Across => (offset.dx, offset.dy),
            Direction::Down => (offset.dy, offset.dx),
        };
        (across == 0 && along >= 0 && (along as usize) < self.len()).then_some(along as usize)
    }

    pub fn letter_at(&self, location: &Location) -> Option<u8>
    {
        self.index_of(location).map(|i| self.letters()[i])
    }

    pub fn translate(&self, vector: Vector) -> WordPlacement
    {
        WordPlacement { location: self.location + vector, direction: self.direction, word: self.word.clone() }
    }
}

impl std::fmt::Display for WordPlacement
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result
    {
        write!(f, "{} {:?} at ({}, {})", self.word, self.direction, self.location.x, self.location.y)
    }
}
