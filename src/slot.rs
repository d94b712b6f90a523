use std::{hash::{Hash, Hasher}, sync::Arc};

use serde::{Deserialize, Serialize};
use crate::geometry::{Direction, Location, Vector};

/// A letter of a word, given by the word and the letter's index in it
#[derive(Clone, Eq, PartialEq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
pub struct WordIndex
{
    pub word: Arc<str>,
    pub index: usize,
}

impl WordIndex
{
    pub fn new(word: impl Into<Arc<str>>, index: usize) -> WordIndex
    {
        WordIndex { word: word.into(), index }
    }

    pub fn letter(&self) -> u8
    {
        self.word.as_bytes()[self.index]
    }
}

impl std::fmt::Display for WordIndex
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result
    {
        write!(f, "{}[{}]", self.word, self.index)
    }
}

/// Two words sharing a cell, stored with the smaller [letter](WordIndex) first so equal crossings compare equal.
#[derive(Clone, Eq, PartialEq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
pub struct Intersection
{
    first: WordIndex,
    second: WordIndex,
}

impl Intersection
{
    pub fn new(a: WordIndex, b: WordIndex) -> Intersection
    {
        if a <= b { Intersection { first: a, second: b } } else { Intersection { first: b, second: a } }
    }

    pub fn first(&self) -> &WordIndex { &self.first }
    pub fn second(&self) -> &WordIndex { &self.second }

    /// The shared letter.
    pub fn letter(&self) -> u8
    {
        self.first.letter()
    }
}

impl std::fmt::Display for Intersection
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result
    {
        write!(f, "{} x {}", self.first, self.second)
    }
}

/// An open intersection point: a placed letter a word running in `direction` could still cross.
#[derive(Clone, Copy, Eq, PartialEq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
pub struct Slot
{
    pub location: Location,
    pub direction: Direction,
    pub letter: u8,
}

impl Slot
{
    pub fn new(direction: Direction, letter: u8, location: Location) -> Slot
    {
        Slot { location, direction, letter }
    }
}

/// A [slot](Slot) with the words that could cross it, if they were computed
///
/// `None` candidates mean "not computed yet", an empty list means the slot can never be filled.
/// Entries compare and hash by their slot only.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SlotEntry
{
    pub slot: Slot,
    pub candidates: Option<Arc<[WordIndex]>>,
}

impl SlotEntry
{
    pub fn new(slot: Slot) -> SlotEntry
    {
        SlotEntry { slot, candidates: None }
    }

    pub fn with_candidates(slot: Slot, candidates: Vec<WordIndex>) -> SlotEntry
    {
        SlotEntry { slot, candidates: Some(candidates.into()) }
    }

    /// False only when the candidates were computed and there are none.
    pub fn is_fillable(&self) -> bool
    {
        self.candidates.as_ref().map_or(true, |c| !c.is_empty())
    }

    pub fn translate(&self, vector: Vector) -> SlotEntry
    {
        SlotEntry { slot: Slot { location: self.slot.location + vector, ..self.slot }, candidates: self.candidates.clone() }
    }
}

impl PartialEq for SlotEntry
{
    fn eq(&self, other: &Self) -> bool
    {
        self.slot == other.slot
    }
}

impl Eq for SlotEntry {}

impl Hash for SlotEntry
{
    fn hash<H: Hasher>(&self, state: &mut H)
    {
        self.slot.hash(state);
    }
}
