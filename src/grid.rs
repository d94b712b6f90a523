use std::collections::{HashMap, HashSet};

use itertools::Itertools;
use serde::{Deserialize, Serialize};
use crate::{board::Board, geometry::{Direction, Location, Rectangle, MAX_HEIGHT, MAX_WIDTH}, placement::WordPlacement, slot::SlotEntry, word_database::WordDatabase, workspace::Workspace};

/// Classification of a cell of a [grid](Grid)
#[derive(Clone, Copy, Eq, PartialEq, Hash, Debug, Serialize, Deserialize)]
pub enum CellType
{
    /// Free space
    Blank,
    /// Free space next to an open slot along the slot's direction, only a word crossing that slot can fill it
    EnforcedBlank,
    /// A letter a crossing word can still pass through
    AvailableSlot,
    /// A letter closed for crossing
    Complete,
    /// Free space beside a closed letter, must stay empty
    BlankNoAdjacentSlots,
    /// The cell right before or after a word, must stay empty
    EndOfWordMarker,
}

impl CellType
{
    pub fn is_letter(&self) -> bool
    {
        matches!(self, CellType::AvailableSlot | CellType::Complete)
    }

    /// Free space that belongs to [regions](Region).
    pub fn is_space(&self) -> bool
    {
        matches!(self, CellType::Blank | CellType::EnforcedBlank)
    }

    /// Whether a new word may put a letter in a cell of this type.
    pub fn accepts_letter(&self) -> bool
    {
        matches!(self, CellType::Blank | CellType::EnforcedBlank | CellType::AvailableSlot)
    }
}

/// A run of two or more letters that is not a placed word, a crossing word must still cover it.
#[derive(Clone, Eq, PartialEq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
pub struct PartialWord
{
    pub location: Location,
    pub direction: Direction,
    pub fragment: Vec<u8>,
}

impl PartialWord
{
    pub fn len(&self) -> usize
    {
        self.fragment.len()
    }

    pub fn is_empty(&self) -> bool
    {
        self.fragment.is_empty()
    }

    /// Placements of available words covering the whole fragment.
    pub fn candidate_placements<'a>(&'a self, database: &'a WordDatabase) -> impl Iterator<Item = WordPlacement> + 'a
    {
        database.list_available_matching_words(&self.fragment)
            .map(|(word, offset)| WordPlacement::new(self.direction, self.location.offset(self.direction, -(offset as i32)), word.clone()))
    }
}

/// Walks from every slot along its direction and collects the runs longer than one letter.
///
/// Returns the partial words and, for each slot, whether it is still open. A slot covered by a placed word
/// running in the slot's own direction is already satisfied and not open anymore.
///
/// # Panics
///
/// Panics when a slot does not sit on a letter equal to its own, the slot bookkeeping is broken then.
pub fn find_partial_words(board: &Board, slots: &[SlotEntry]) -> (Vec<PartialWord>, Vec<bool>)
{
    let mut partial_words = vec![];
    let mut seen = HashSet::new();
    let mut open = Vec::with_capacity(slots.len());

    for entry in slots
    {
        let slot = &entry.slot;
        match board.letter_at(&slot.location)
        {
            Some(letter) if letter == slot.letter => {},
            found => panic!("slot {:?} expects {} but the board holds {:?}", slot.location, char::from(slot.letter), found.map(char::from)),
        }

        if board.placement_at(&slot.location, slot.direction).is_some()
        {
            open.push(false);
            continue;
        }
        open.push(true);

        let mut start = slot.location;
        while board.letter_at(&start.offset(slot.direction, -1)).is_some()
        {
            start = start.offset(slot.direction, -1);
        }
        let mut fragment = vec![];
        let mut cursor = start;
        while let Some(letter) = board.letter_at(&cursor)
        {
            fragment.push(letter);
            cursor = cursor.offset(slot.direction, 1);
        }

        if fragment.len() > 1 && seen.insert((slot.direction, start))
        {
            partial_words.push(PartialWord { location: start, direction: slot.direction, fragment });
        }
    }

    (partial_words, open)
}

/// A horizontal run of free cells
#[derive(Clone, Copy, Eq, PartialEq, Hash, Debug, Serialize, Deserialize)]
pub struct RowRange
{
    pub y: i32,
    pub start: i32,
    /// Exclusive
    pub end: i32,
}

impl RowRange
{
    pub fn len(&self) -> usize
    {
        (self.end - self.start) as usize
    }

    pub fn is_empty(&self) -> bool
    {
        self.end <= self.start
    }

    fn overlaps(&self, other: &RowRange) -> bool
    {
        self.start < other.end && other.start < self.end
    }
}

/// A maximal connected area of free space, stored as the row ranges it consists of.
#[derive(Clone, Eq, PartialEq, Debug, Serialize, Deserialize)]
pub struct Region
{
    pub rows: Vec<RowRange>,
    pub cell_count: usize,
    pub bounds: Rectangle,
}

impl Region
{
    pub fn contains(&self, location: &Location) -> bool
    {
        self.bounds.contains(location) &&
        self.rows.iter().any(|r| r.y == location.y && location.x >= r.start && location.x < r.end)
    }

    /// A region is open when it touches a side of the board that can still move outwards.
    pub fn is_open(&self, board: &Rectangle) -> bool
    {
        let can_widen = board.width < MAX_WIDTH;
        let can_heighten = board.height < MAX_HEIGHT;

        (can_widen && (self.bounds.left() == board.left() || self.bounds.right() == board.right())) ||
        (can_heighten && (self.bounds.top() == board.top() || self.bounds.bottom() == board.bottom()))
    }
}

/// Limits the size of the free [regions](Region) of a board
///
/// Enclosed regions may hold at most `max_cells` cells, open regions (see [Region::is_open]) `max_cells * open_region_factor`.
#[derive(Clone, Copy, Eq, PartialEq, Debug, Serialize, Deserialize)]
pub struct CoverageConstraint
{
    pub max_cells: usize,
    pub open_region_factor: usize,
}

impl CoverageConstraint
{
    pub fn limit_for(&self, region: &Region, board: &Rectangle) -> usize
    {
        if region.is_open(board) { self.max_cells * self.open_region_factor } else { self.max_cells }
    }

    pub fn is_violated_by(&self, region: &Region, board: &Rectangle) -> bool
    {
        region.cell_count > self.limit_for(region, board)
    }
}

/// # Per step view of a workspace
///
/// Classifies every cell of the board's rectangle, keeps the slots that are still open and the
/// [partial words](PartialWord) that must be covered. A grid is computed fresh whenever it's needed and never stored.
#[derive(Clone, Debug)]
pub struct Grid
{
    rectangle: Rectangle,
    cells: Vec<CellType>,
    slots: Vec<SlotEntry>,
    partial_words: Vec<PartialWord>,
}

impl Grid
{
    pub fn generate(workspace: &Workspace) -> Grid
    {
        Grid::new(workspace.board(), workspace.slots())
    }

    /// # Panics
    ///
    /// Panics when the slots disagree with the board, see [find_partial_words].
    pub fn new(board: &Board, slots: &[SlotEntry]) -> Grid
    {
        let rectangle = board.rectangle();
        let mut cells = vec![CellType::Blank; rectangle.area()];

        let (partial_words, open) = find_partial_words(board, slots);
        let slots: Vec<SlotEntry> = slots.iter().zip(open).filter_map(|(s, open)| (open && s.is_fillable()).then(|| s.clone())).collect();
        let open_slots: HashMap<Location, Direction> = slots.iter().map(|s| (s.slot.location, s.slot.direction)).collect();

        let index = |location: &Location| rectangle.index_of(location);

        for placement in board.placements()
        {
            for (_, location, _) in placement.cells()
            {
                let Some(i) = index(&location) else { continue };
                cells[i] = match open_slots.get(&location)
                {
                    Some(direction) if *direction == placement.direction.opposite() => CellType::AvailableSlot,
                    _ => CellType::Complete,
                };
            }
        }

        for (location, direction) in open_slots.iter()
        {
            for step in [-1, 1]
            {
                if let Some(i) = index(&location.offset(*direction, step))
                {
                    if cells[i] == CellType::Blank { cells[i] = CellType::EnforcedBlank; }
                }
            }
        }

        for placement in board.placements()
        {
            let across = placement.direction.opposite();
            for (_, location, _) in placement.cells()
            {
                let closed = index(&location).is_some_and(|i| cells[i] == CellType::Complete);
                if !closed || board.placement_at(&location, across).is_some() { continue; }

                for step in [-1, 1]
                {
                    if let Some(i) = index(&location.offset(across, step))
                    {
                        if cells[i].is_space() { cells[i] = CellType::BlankNoAdjacentSlots; }
                    }
                }
            }
        }

        for placement in board.placements()
        {
            for marker in [placement.start_marker(), placement.end_marker()]
            {
                let Some(i) = index(&marker) else { continue };
                if cells[i].is_letter()
                {
                    panic!("end of word marker of {placement} at {marker:?} holds a letter");
                }
                cells[i] = CellType::EndOfWordMarker;
            }
        }

        Grid { rectangle, cells, slots, partial_words }
    }

    pub fn rectangle(&self) -> Rectangle
    {
        self.rectangle
    }

    /// Type of the cell, cells outside the board are blank.
    pub fn cell_type(&self, location: &Location) -> CellType
    {
        self.rectangle.index_of(location).map_or(CellType::Blank, |i| self.cells[i])
    }

    /// Open slots in the order they were discovered.
    pub fn slots(&self) -> &[SlotEntry]
    {
        &self.slots
    }

    pub fn slot_at(&self, location: &Location) -> Option<&SlotEntry>
    {
        self.slots.iter().find(|s| s.slot.location == *location)
    }

    pub fn partial_words(&self) -> &[PartialWord]
    {
        &self.partial_words
    }

    pub fn has_partial_words(&self) -> bool
    {
        !self.partial_words.is_empty()
    }

    /// Finds all maximal regions of free space
    ///
    /// Free cells are collected row by row into contiguous ranges, ranges of neighbouring rows that overlap are merged.
    pub fn regions(&self) -> Vec<Region>
    {
        let rectangle = self.rectangle;
        let mut ranges: Vec<RowRange> = vec![];
        for y in rectangle.top()..rectangle.bottom()
        {
            let mut x = rectangle.left();
            while x < rectangle.right()
            {
                if !self.cell_type(&Location::new(x, y)).is_space() { x += 1; continue; }

                let start = x;
                while x < rectangle.right() && self.cell_type(&Location::new(x, y)).is_space() { x += 1; }
                ranges.push(RowRange { y, start, end: x });
            }
        }

        // union find over the ranges, ranges are sorted by row
        let mut parent: Vec<usize> = (0..ranges.len()).collect();
        fn find(parent: &mut [usize], mut i: usize) -> usize
        {
            while parent[i] != i
            {
                parent[i] = parent[parent[i]];
                i = parent[i];
            }
            i
        }

        for (i, a) in ranges.iter().enumerate()
        {
            for (j, b) in ranges.iter().enumerate().skip(i + 1)
            {
                if b.y > a.y + 1 { break; }
                if b.y == a.y + 1 && a.overlaps(b)
                {
                    let (ra, rb) = (find(&mut parent, i), find(&mut parent, j));
                    if ra != rb { parent[rb] = ra; }
                }
            }
        }

        let groups = (0..ranges.len()).into_group_map_by(|&i| find(&mut parent, i));

        groups.into_values()
            .sorted_by_key(|members| members[0])
            .map(|members|
            {
                let rows: Vec<RowRange> = members.into_iter().map(|i| ranges[i]).collect();
                let cell_count = rows.iter().map(RowRange::len).sum();
                let bounds = rows.iter()
                    .map(|r| Rectangle::new(Location::new(r.start, r.y), r.end - r.start, 1))
                    .fold(Rectangle::default(), |acc, r| acc.union(&r));
                Region { rows, cell_count, bounds }
            })
            .collect()
    }

    /// Open slots a crossing word through which would put letters into the region.
    pub fn adjacent_slots<'a>(&'a self, region: &'a Region) -> impl Iterator<Item = &'a SlotEntry> + 'a
    {
        self.slots.iter().filter(move |s| [-1, 1].iter().any(|&step| region.contains(&s.slot.location.offset(s.slot.direction, step))))
    }
}

#[cfg(test)]
mod tests
{
    use super::*;
    use crate::{slot::Slot, word_database::WordDatabase};

    fn workspace(words: &[&str], placements: &[(Direction, i32, i32, &str)]) -> Workspace
    {
        let db = WordDatabase::new(words.iter().copied());
        Workspace::from_placements(db, placements.iter().map(|&(d, x, y, w)| WordPlacement::new(d, Location::new(x, y), w))).unwrap()
    }

    #[test]
    fn test_single_word_classification()
    {
        let ws = workspace(&["APPLE", "PEAR"], &[(Direction::Across, 0, 0, "APPLE")]);
        let grid = Grid::generate(&ws);

        assert_eq!(grid.cell_type(&Location::new(-1, 0)), CellType::EndOfWordMarker);
        assert_eq!(grid.cell_type(&Location::new(5, 0)), CellType::EndOfWordMarker);
        assert_eq!(grid.cell_type(&Location::new(2, 0)), CellType::AvailableSlot);
        assert_eq!(grid.cell_type(&Location::new(2, 1)), CellType::Blank);
        assert_eq!(grid.slots().len(), 5);
        assert!(!grid.has_partial_words());
        assert!(grid.regions().is_empty());
    }

    #[test]
    fn test_crossing_classification()
    {
        let ws = workspace(&["HELLO", "LOCAL"], &[(Direction::Across, 0, 0, "HELLO"), (Direction::Down, 2, 0, "LOCAL")]);
        let grid = Grid::generate(&ws);

        assert_eq!(grid.cell_type(&Location::new(2, 0)), CellType::Complete);
        assert_eq!(grid.cell_type(&Location::new(1, 0)), CellType::AvailableSlot);
        assert_eq!(grid.cell_type(&Location::new(1, 1)), CellType::EnforcedBlank);
        assert_eq!(grid.cell_type(&Location::new(3, 2)), CellType::EnforcedBlank);
        assert_eq!(grid.cell_type(&Location::new(2, -1)), CellType::EndOfWordMarker);
        assert_eq!(grid.cell_type(&Location::new(0, 4)), CellType::Blank);
        assert_eq!(grid.slots().len(), 8);
    }

    #[test]
    fn test_regions_of_a_cross()
    {
        let ws = workspace(&["HELLO", "LOCAL"], &[(Direction::Across, 0, 0, "HELLO"), (Direction::Down, 2, 0, "LOCAL")]);
        let grid = Grid::generate(&ws);
        let regions = grid.regions();

        // above HELLO on both sides of LOCAL's marker, and the two areas below HELLO
        let mut sizes: Vec<usize> = regions.iter().map(|r| r.cell_count).collect();
        sizes.sort();
        assert_eq!(sizes, vec![3, 3, 15, 15]);

        let below_left = regions.iter().find(|r| r.contains(&Location::new(0, 3))).unwrap();
        assert!(below_left.is_open(&grid.rectangle()));
        let adjacent: Vec<Location> = grid.adjacent_slots(below_left).map(|s| s.slot.location).sorted().collect();
        assert_eq!(adjacent, vec![Location::new(0, 0), Location::new(1, 0), Location::new(2, 1), Location::new(2, 2), Location::new(2, 3), Location::new(2, 4)]);

        let constraint = CoverageConstraint { max_cells: 8, open_region_factor: 2 };
        assert!(!constraint.is_violated_by(below_left, &grid.rectangle()));
        assert!(CoverageConstraint { max_cells: 7, open_region_factor: 2 }.is_violated_by(below_left, &grid.rectangle()));
    }

    #[test]
    fn test_closed_slots_block_their_neighbours()
    {
        let ws = workspace(&["APPLE"], &[(Direction::Across, 0, 0, "APPLE")]);
        let mut slots = ws.slots().to_vec();
        slots[0] = SlotEntry::with_candidates(slots[0].slot, vec![]);
        let grid = Grid::new(ws.board(), &slots);

        assert_eq!(grid.cell_type(&Location::new(0, 0)), CellType::Complete);
        assert_eq!(grid.slots().len(), 4);
    }

    #[test]
    fn test_partial_words_are_found_from_slots()
    {
        let board = Board::from_placements([
            WordPlacement::new(Direction::Across, Location::new(0, 0), "CAT"),
            WordPlacement::new(Direction::Across, Location::new(0, 1), "ORE"),
        ]).unwrap();
        let slots: Vec<SlotEntry> = board.placements()
            .flat_map(|p| p.cells().map(|(_, l, c)| SlotEntry::new(Slot::new(Direction::Down, c, l))).collect::<Vec<_>>())
            .collect();

        let grid = Grid::new(&board, &slots);
        let fragments: Vec<&[u8]> = grid.partial_words().iter().map(|p| p.fragment.as_slice()).sorted().collect();
        assert_eq!(fragments, vec![b"AR".as_slice(), b"CO".as_slice(), b"TE".as_slice()]);
    }

    #[test]
    #[should_panic]
    fn test_slot_on_blank_cell_panics()
    {
        let board = Board::from_placements([WordPlacement::new(Direction::Across, Location::new(0, 0), "CAT")]).unwrap();
        Grid::new(&board, &[SlotEntry::new(Slot::new(Direction::Down, b'C', Location::new(0, 1)))]);
    }
}
