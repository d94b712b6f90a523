use std::{cmp::Ordering, collections::BTreeSet, hash::{Hash, Hasher}, sync::{Arc, OnceLock}};

use serde::{Deserialize, Serialize};
use crate::{error::CrozzleError, geometry::{Direction, Location, Rectangle, Vector, MAX_HEIGHT, MAX_WIDTH}, placement::WordPlacement};

/// Character used for blank cells when rendering a [board](Board) as text.
pub const BLANK_CHAR: char = '_';

/// # Represents a crozzle board
///
/// A board is the set of [placed words](WordPlacement) together with the [rectangle](Rectangle) bounding them,
/// end of word markers included, so a single word always has a blank column (or row) on both of its ends.
///
/// The letter array is derived lazily on first use and cached, a board is never mutated after construction.
///
/// # Example
///
/// ```
/// # use crozzle_generator::board::Board;
/// # use crozzle_generator::geometry::{Direction, Location};
/// # use crozzle_generator::placement::WordPlacement;
/// let board = Board::from_placements([WordPlacement::new(Direction::Across, Location::new(0, 0), "APPLE")]).unwrap();
///
/// assert_eq!(board.to_string(), "_APPLE_\n");
/// assert_eq!(board.rectangle().top_left, Location::new(-1, 0));
/// ```
#[derive(Clone, Default, Debug, Serialize, Deserialize)]
pub struct Board
{
    placements: BTreeSet<WordPlacement>,
    rectangle: Rectangle,
    #[serde(skip)]
    letters: OnceLock<Arc<[Option<u8>]>>,
}

impl Board
{
    /// Creates a new empty board
    pub fn new() -> Board
    {
        Board::default()
    }

    /// Builds a board from placements, checking that the letters agree and that the board is not too big.
    ///
    /// # Errors
    ///
    /// [CrozzleError::ConflictingLetters] - two words put different letters into the same cell
    /// [CrozzleError::BoardTooLarge] - the bounding rectangle exceeds [MAX_WIDTH] x [MAX_HEIGHT]
    pub fn from_placements(placements: impl IntoIterator<Item = WordPlacement>) -> Result<Board, CrozzleError>
    {
        let mut board = Board::new();
        for placement in placements
        {
            if let Some((other, location)) = board.placements.iter()
                .find_map(|other| placement.cells().find(|(_, l, c)| other.letter_at(l).is_some_and(|o| o != *c)).map(|(_, l, _)| (other, l)))
            {
                return Err(CrozzleError::ConflictingLetters { first: other.word.to_string(), second: placement.word.to_string(), x: location.x, y: location.y });
            }
            board = board.with_placement(placement);
        }

        if board.rectangle.width > MAX_WIDTH || board.rectangle.height > MAX_HEIGHT
        {
            return Err(CrozzleError::BoardTooLarge { width: board.rectangle.width, height: board.rectangle.height });
        }

        Ok(board)
    }

    /// Returns a new board with the placement added, without any checks.
    pub fn with_placement(&self, placement: WordPlacement) -> Board
    {
        let rectangle = self.rectangle.union(&placement.extended_rectangle());
        let mut placements = self.placements.clone();
        placements.insert(placement);
        Board { placements, rectangle, letters: OnceLock::new() }
    }

    pub fn placements(&self) -> impl ExactSizeIterator<Item = &WordPlacement> + DoubleEndedIterator
    {
        self.placements.iter()
    }

    pub fn contains_placement(&self, placement: &WordPlacement) -> bool
    {
        self.placements.contains(placement)
    }

    pub fn rectangle(&self) -> Rectangle
    {
        self.rectangle
    }

    pub fn word_count(&self) -> usize
    {
        self.placements.len()
    }

    pub fn is_empty(&self) -> bool
    {
        self.placements.is_empty()
    }

    /// Finds the [word](WordPlacement) given its text.
    pub fn find_word(&self, word: &str) -> Option<&WordPlacement>
    {
        self.placements.iter().find(|p| &*p.word == word)
    }

    /// Finds the word running in `direction` that covers the location.
    pub fn placement_at(&self, location: &Location, direction: Direction) -> Option<&WordPlacement>
    {
        self.placements.iter().find(|p| p.direction == direction && p.index_of(location).is_some())
    }

    /// Returns the row major letter array over [Board::rectangle], computing it on first use.
    pub fn letters(&self) -> &[Option<u8>]
    {
        self.letters.get_or_init(||
        {
            let mut letters = vec![None; self.rectangle.area()];
            for placement in self.placements.iter()
            {
                for (_, location, letter) in placement.cells()
                {
                    if let Some(index) = self.rectangle.index_of(&location)
                    {
                        letters[index] = Some(letter);
                    }
                }
            }
            letters.into()
        })
    }

    /// Returns the letter at the location, None for blank cells and cells outside the board.
    pub fn letter_at(&self, location: &Location) -> Option<u8>
    {
        self.rectangle.index_of(location).and_then(|i| self.letters()[i])
    }

    /// Checks if a word can be placed on the board
    ///
    /// The word is rejected if the board would grow beyond [MAX_WIDTH] x [MAX_HEIGHT], if a letter sits right before
    /// or right after the word, or if any covered cell holds a different letter.
    ///
    /// # Example
    ///
    /// ```
    /// # use crozzle_generator::board::Board;
    /// # use crozzle_generator::geometry::{Direction, Location};
    /// # use crozzle_generator::placement::WordPlacement;
    /// let board = Board::from_placements([WordPlacement::new(Direction::Across, Location::new(0, 0), "HELLO")]).unwrap();
    ///
    /// assert!(board.can_place_word(Direction::Down, "LOCAL", Location::new(2, 0)));
    /// assert!(!board.can_place_word(Direction::Down, "CAT", Location::new(2, 0)));
    /// assert!(!board.can_place_word(Direction::Across, "OX", Location::new(5, 0)));
    /// ```
    pub fn can_place_word(&self, direction: Direction, word: &str, location: Location) -> bool
    {
        let len = word.len() as i32;
        let extended = match direction
        {
            Direction::Across => Rectangle::new(location.offset(direction, -1), len + 2, 1),
            Direction::Down => Rectangle::new(location.offset(direction, -1), 1, len + 2),
        };
        let bounds = self.rectangle.union(&extended);
        if bounds.width > MAX_WIDTH || bounds.height > MAX_HEIGHT { return false; }

        if self.letter_at(&location.offset(direction, -1)).is_some() || self.letter_at(&location.offset(direction, len)).is_some()
        {
            return false;
        }

        word.bytes().enumerate().all(|(i, letter)| self.letter_at(&location.offset(direction, i as i32)).map_or(true, |existing| existing == letter))
    }

    pub fn can_place(&self, placement: &WordPlacement) -> bool
    {
        self.can_place_word(placement.direction, &placement.word, placement.location)
    }

    /// Returns the board moved by the vector.
    pub fn translate(&self, vector: Vector) -> Board
    {
        if vector.is_zero() { return self.clone(); }

        Board
        {
            placements: self.placements.iter().map(|p| p.translate(vector)).collect(),
            rectangle: self.rectangle.translate(vector),
            letters: match self.letters.get()
            {
                Some(letters) => OnceLock::from(letters.clone()),
                None => OnceLock::new(),
            },
        }
    }

    /// Returns the vector that moves the board's top left corner to the origin.
    pub fn normalising_vector(&self) -> Vector
    {
        Location::default() - self.rectangle.top_left
    }

    /// Parses a board rendered as text back into placements
    ///
    /// Every character is a cell, letters are letters and anything else is blank.
    /// Every maximal run of two or more letters in a row or in a column becomes a word.
    ///
    /// # Errors
    ///
    /// See [Board::from_placements]
    pub fn parse(text: &str) -> Result<Board, CrozzleError>
    {
        let rows: Vec<Vec<Option<u8>>> = text.lines()
            .map(|line| line.chars().map(|c| c.is_ascii_alphabetic().then(|| c.to_ascii_uppercase() as u8)).collect())
            .collect();
        let width = rows.iter().map(Vec::len).max().unwrap_or(0);
        let cell = |x: usize, y: usize| rows.get(y).and_then(|row| row.get(x)).copied().flatten();

        let mut placements = vec![];
        let mut collect_runs = |direction: Direction, lines: usize, length: usize|
        {
            for line in 0..lines
            {
                let mut run: Vec<u8> = vec![];
                for along in 0..=length
                {
                    let (x, y) = match direction { Direction::Across => (along, line), Direction::Down => (line, along) };
                    match cell(x, y)
                    {
                        Some(letter) => run.push(letter),
                        None =>
                        {
                            if run.len() > 1
                            {
                                let start = (along - run.len()) as i32;
                                let location = match direction { Direction::Across => Location::new(start, line as i32), Direction::Down => Location::new(line as i32, start) };
                                placements.push(WordPlacement::new(direction, location, String::from_utf8_lossy(&run).into_owned()));
                            }
                            run.clear();
                        }
                    }
                }
            }
        };
        collect_runs(Direction::Across, rows.len(), width);
        collect_runs(Direction::Down, width, rows.len());

        Board::from_placements(placements)
    }
}

impl PartialEq for Board
{
    fn eq(&self, other: &Self) -> bool
    {
        self.placements == other.placements
    }
}

impl Eq for Board {}

impl Hash for Board
{
    fn hash<H: Hasher>(&self, state: &mut H)
    {
        self.placements.hash(state);
    }
}

impl PartialOrd for Board
{
    fn partial_cmp(&self, other: &Self) -> Option<Ordering>
    {
        Some(self.cmp(other))
    }
}

/// Boards are ordered by their word count first and by their placements second.
impl Ord for Board
{
    fn cmp(&self, other: &Self) -> Ordering
    {
        self.placements.len().cmp(&other.placements.len())
            .then_with(|| self.placements.iter().cmp(other.placements.iter()))
    }
}

impl std::fmt::Display for Board
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result
    {
        let rectangle = self.rectangle;
        for y in rectangle.top()..rectangle.bottom()
        {
            for x in rectangle.left()..rectangle.right()
            {
                let c = self.letter_at(&Location::new(x, y)).map_or(BLANK_CHAR, char::from);
                write!(f, "{c}")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
