use std::{collections::hash_map::DefaultHasher, hash::{Hash, Hasher}, sync::{Arc, OnceLock}};

use itertools::Itertools;
use crate::{
    board::Board,
    error::CrozzleError,
    geometry::{Direction, Location},
    grid::{find_partial_words, CellType, Grid},
    placement::WordPlacement,
    scoring::{letter_score, ScoreBreakdown, WORD_BONUS},
    slot::{Intersection, Slot, SlotEntry, WordIndex},
    word_database::WordDatabase,
};

/// # A node of the search
///
/// Holds the [board](Board), the [words](WordDatabase) still available, the open [slots](SlotEntry) in the order they were
/// discovered, the intersections made so far and the score. A workspace is never modified, placing a word creates a new one.
///
/// Two workspaces are equal when their scores, boards, databases and *sets* of slots are equal, the order the slots were
/// discovered in does not matter. Compare [normalised](Workspace::normalise) workspaces, boards that grew in different
/// directions are shifted otherwise.
///
/// # Example
///
/// ```
/// # use crozzle_generator::geometry::{Direction, Location};
/// # use crozzle_generator::placement::WordPlacement;
/// # use crozzle_generator::word_database::WordDatabase;
/// # use crozzle_generator::workspace::Workspace;
/// let db = WordDatabase::new(["HELLO", "LOCAL"]);
/// let ws = Workspace::new(db)
///     .place_word(&WordPlacement::new(Direction::Across, Location::new(0, 0), "HELLO")).unwrap()
///     .place_word(&WordPlacement::new(Direction::Down, Location::new(2, 0), "LOCAL")).unwrap();
///
/// // two words and the L they share
/// assert_eq!(ws.score(), 2 * 10 + 4);
/// assert!(ws.is_valid());
/// ```
#[derive(Clone, Debug)]
pub struct Workspace
{
    board: Board,
    database: WordDatabase,
    slots: Vec<SlotEntry>,
    intersections: Vec<Intersection>,
    included_words: Vec<Arc<str>>,
    score: i32,
    is_valid: bool,
    potential_score: OnceLock<i32>,
    hash: OnceLock<u64>,
}

impl Workspace
{
    /// Creates a workspace with an empty board.
    pub fn new(database: WordDatabase) -> Workspace
    {
        Workspace
        {
            board: Board::new(),
            database,
            slots: vec![],
            intersections: vec![],
            included_words: vec![],
            score: 0,
            is_valid: true,
            potential_score: OnceLock::new(),
            hash: OnceLock::new(),
        }
    }

    /// Places the word alone at the origin, across.
    pub fn seed(database: WordDatabase, word: &str) -> Option<Workspace>
    {
        let word = database.word(word)?.clone();
        Workspace::new(database).place_word(&WordPlacement::new(Direction::Across, Location::default(), word)).map(|ws| ws.normalise())
    }

    /// One normalised workspace per distinct available word of the database.
    pub fn seeds(database: &WordDatabase) -> Vec<Workspace>
    {
        database.available_words().filter_map(|word| Workspace::seed(database.clone(), word)).collect()
    }

    /// Replays the placements in order, starting from an empty board.
    ///
    /// # Errors
    ///
    /// [CrozzleError::WordUnavailable] - the word is not in the database or was already placed
    /// [CrozzleError::CantPlaceWord] - the placement was rejected
    pub fn from_placements(database: WordDatabase, placements: impl IntoIterator<Item = WordPlacement>) -> Result<Workspace, CrozzleError>
    {
        placements.into_iter().try_fold(Workspace::new(database), |ws, placement|
        {
            if !ws.database.is_available(&placement.word)
            {
                return Err(CrozzleError::WordUnavailable(placement.word.to_string()));
            }
            ws.place_word(&placement).ok_or_else(|| CrozzleError::CantPlaceWord(placement.to_string()))
        })
    }

    pub fn board(&self) -> &Board { &self.board }
    pub fn database(&self) -> &WordDatabase { &self.database }
    pub fn slots(&self) -> &[SlotEntry] { &self.slots }
    pub fn intersections(&self) -> &[Intersection] { &self.intersections }
    pub fn included_words(&self) -> &[Arc<str>] { &self.included_words }
    pub fn score(&self) -> i32 { self.score }

    pub fn word_count(&self) -> usize
    {
        self.included_words.len()
    }

    /// False when the board holds a run of letters that still has to be covered by a crossing word.
    pub fn is_valid(&self) -> bool
    {
        self.is_valid
    }

    /// Upper bound of the score reachable from this workspace: the score plus half the letter scores of every
    /// slot that may still be filled.
    pub fn potential_score(&self) -> i32
    {
        *self.potential_score.get_or_init(||
        {
            let open: i32 = self.slots.iter().filter(|s| s.is_fillable()).map(|s| letter_score(s.slot.letter)).sum();
            (self.score + open / 2).max(self.score)
        })
    }

    /// Places the word, see [Workspace::try_place_word], computing the grid on the way.
    pub fn place_word(&self, placement: &WordPlacement) -> Option<Workspace>
    {
        self.try_place_word(&Grid::generate(self), placement)
    }

    /// Creates the workspace with the word placed, `grid` must be generated from this workspace.
    ///
    /// Returns None when the word is used up, doesn't fit on the board, collides with a letter, touches a cell that must stay
    /// blank, crosses a closed letter or leaves a run of letters no available word can cover.
    ///
    /// Every crossed slot is consumed and scored, every newly covered cell becomes a slot for the other direction.
    /// The new workspace is invalid when it leaves runs of letters that still have to be covered.
    pub fn try_place_word(&self, grid: &Grid, placement: &WordPlacement) -> Option<Workspace>
    {
        if !self.database.is_available(&placement.word) || self.board.contains_placement(placement) { return None; }
        if !self.board.can_place(placement) { return None; }

        let across = placement.direction.opposite();
        let mut slots = self.slots.clone();
        let mut intersections = self.intersections.clone();
        let mut score = self.score + WORD_BONUS;

        for (index, location, letter) in placement.cells()
        {
            match grid.cell_type(&location)
            {
                CellType::AvailableSlot =>
                {
                    let position = slots.iter().position(|s| s.slot.location == location && s.slot.direction == placement.direction)?;
                    slots.remove(position);
                    score += letter_score(letter);

                    let host = self.board.placement_at(&location, across)
                        .unwrap_or_else(|| panic!("slot at {location:?} has no word running {across:?} under it"));
                    let host_index = host.index_of(&location).unwrap_or_default();
                    intersections.push(Intersection::new(WordIndex::new(placement.word.clone(), index), WordIndex::new(host.word.clone(), host_index)));
                },
                CellType::Blank | CellType::EnforcedBlank =>
                {
                    slots.push(SlotEntry::new(Slot::new(across, letter, location)));
                },
                CellType::Complete | CellType::BlankNoAdjacentSlots | CellType::EndOfWordMarker => return None,
            }
        }

        let board = self.board.with_placement(placement.clone());
        let database = self.database.remove(&placement.word);

        let (partial_words, open) = find_partial_words(&board, &slots);
        if partial_words.iter().any(|p| !database.can_match_word(&p.fragment)) { return None; }

        let slots: Vec<SlotEntry> = slots.into_iter().zip(open).filter_map(|(s, open)| open.then_some(s)).collect();
        let mut included_words = self.included_words.clone();
        included_words.push(placement.word.clone());

        Some(Workspace
        {
            board,
            database,
            slots,
            intersections,
            included_words,
            score,
            is_valid: partial_words.is_empty(),
            potential_score: OnceLock::new(),
            hash: OnceLock::new(),
        })
    }

    /// Moves everything so the board's top left corner is the origin.
    pub fn normalise(&self) -> Workspace
    {
        let vector = self.board.normalising_vector();
        if vector.is_zero() { return self.clone(); }

        Workspace
        {
            board: self.board.translate(vector),
            slots: self.slots.iter().map(|s| s.translate(vector)).collect(),
            hash: OnceLock::new(),
            ..self.clone()
        }
    }

    /// Words of the database that could cross the slot, by board bounds and letters alone.
    pub fn slot_candidates(&self, slot: &Slot) -> Vec<WordIndex>
    {
        self.database.list_available_matching_words(&[slot.letter])
            .filter(|(word, offset)| self.board.can_place_word(slot.direction, word, slot.location.offset(slot.direction, -(*offset as i32))))
            .map(|(word, offset)| WordIndex { word: word.clone(), index: offset })
            .collect()
    }

    /// Returns the workspace with the slots sorted and the candidates of every slot computed.
    ///
    /// Slots without candidates stay in the list but count as closed from then on.
    pub fn recompute_slots(&self) -> Workspace
    {
        let slots = self.slots.iter()
            .sorted_by_key(|s| s.slot)
            .map(|s| SlotEntry::with_candidates(s.slot, self.slot_candidates(&s.slot)))
            .collect();

        Workspace { slots, potential_score: OnceLock::new(), ..self.clone() }
    }

    pub fn score_breakdown(&self) -> ScoreBreakdown
    {
        ScoreBreakdown::new(self.included_words.iter().map(|w| &**w), self.intersections.iter())
    }

    fn hash_value(&self) -> u64
    {
        *self.hash.get_or_init(||
        {
            let mut hasher = DefaultHasher::new();
            self.score.hash(&mut hasher);
            self.board.hash(&mut hasher);
            self.database.hash(&mut hasher);

            let slots = self.slots.iter().fold(0u64, |acc, s|
            {
                let mut slot_hasher = DefaultHasher::new();
                s.slot.hash(&mut slot_hasher);
                acc.wrapping_add(slot_hasher.finish())
            });
            slots.hash(&mut hasher);
            hasher.finish()
        })
    }

    fn sorted_slots(&self) -> Vec<Slot>
    {
        self.slots.iter().map(|s| s.slot).sorted().collect()
    }
}

impl PartialEq for Workspace
{
    fn eq(&self, other: &Self) -> bool
    {
        self.hash_value() == other.hash_value() &&
        self.score == other.score &&
        self.slots.len() == other.slots.len() &&
        self.board == other.board &&
        self.database == other.database &&
        self.sorted_slots() == other.sorted_slots()
    }
}

impl Eq for Workspace {}

impl Hash for Workspace
{
    fn hash<H: Hasher>(&self, state: &mut H)
    {
        state.write_u64(self.hash_value());
    }
}
