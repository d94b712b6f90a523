//! Strategies expanding a [workspace](Workspace) into its children.
//!
//! Both strategies first look for [partial words](crate::grid::PartialWord) on the fresh [grid](Grid): as long as one
//! exists the only children are the workspaces covering it.

pub mod slot_filling;
pub mod space_filling;

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use crate::{grid::{CoverageConstraint, Grid}, placement::WordPlacement, slot::{Slot, WordIndex}, workspace::Workspace};

pub use slot_filling::SlotFillingGenerator;
pub use space_filling::SpaceFillingGenerator;

/// Produces the children of a workspace
///
/// The sequence is finite and computed anew on every call, its order is up to the strategy.
pub trait NextStepGenerator
{
    fn generate_next_steps<'a>(&'a self, workspace: &'a Workspace) -> Box<dyn Iterator<Item = Workspace> + 'a>;
}

/// Settings of the [generator](Generator) to search with.
#[derive(Clone, Eq, PartialEq, Debug, Serialize, Deserialize)]
pub enum GeneratorSettings
{
    SlotFilling
    {
        min_adjacent_group_size: usize,
    },
    SpaceFilling
    {
        max_contiguous_spaces: usize,
        open_region_factor: usize,
        combination_limit: usize,
    },
}

impl Default for GeneratorSettings
{
    fn default() -> Self
    {
        GeneratorSettings::SlotFilling { min_adjacent_group_size: 2 }
    }
}

impl GeneratorSettings
{
    pub fn space_filling() -> GeneratorSettings
    {
        GeneratorSettings::SpaceFilling { max_contiguous_spaces: 8, open_region_factor: 2, combination_limit: 64 }
    }

    pub fn build(&self) -> Generator
    {
        match *self
        {
            GeneratorSettings::SlotFilling { min_adjacent_group_size } =>
                Generator::SlotFilling(SlotFillingGenerator::new(min_adjacent_group_size)),
            GeneratorSettings::SpaceFilling { max_contiguous_spaces, open_region_factor, combination_limit } =>
                Generator::SpaceFilling(SpaceFillingGenerator::new(CoverageConstraint { max_cells: max_contiguous_spaces, open_region_factor }, combination_limit)),
        }
    }
}

/// The available strategies.
#[derive(Clone, Debug)]
pub enum Generator
{
    SlotFilling(SlotFillingGenerator),
    SpaceFilling(SpaceFillingGenerator),
}

impl NextStepGenerator for Generator
{
    fn generate_next_steps<'a>(&'a self, workspace: &'a Workspace) -> Box<dyn Iterator<Item = Workspace> + 'a>
    {
        match self
        {
            Generator::SlotFilling(generator) => generator.generate_next_steps(workspace),
            Generator::SpaceFilling(generator) => generator.generate_next_steps(workspace),
        }
    }
}

/// Children covering the most constrained partial word of the grid, None if the grid has no partial words.
///
/// An empty list means the workspace is a dead end.
pub(crate) fn cover_partial_word(workspace: &Workspace, grid: &Grid) -> Option<Vec<Workspace>>
{
    let database = workspace.database();
    let partial = grid.partial_words().iter().min_by_key(|p| database.count_matching_words(&p.fragment))?;

    log::trace!("covering {} with {} candidates", String::from_utf8_lossy(&partial.fragment), database.count_matching_words(&partial.fragment));

    Some(partial.candidate_placements(database)
        .filter_map(|placement| workspace.try_place_word(grid, &placement))
        .map(|ws| ws.normalise())
        .collect())
}

/// Placements of the slot's candidates crossing it.
pub(crate) fn slot_placements(workspace: &Workspace, slot: &Slot) -> Vec<WordPlacement>
{
    let candidates: Vec<WordIndex> = match workspace.slots().iter().find(|s| s.slot == *slot).and_then(|s| s.candidates.clone())
    {
        Some(candidates) => candidates.iter().filter(|c| workspace.database().is_available(&c.word)).cloned().collect(),
        None => workspace.database().list_available_matching_words(&[slot.letter])
            .map(|(word, index)| WordIndex { word: word.clone(), index })
            .collect(),
    };

    candidates.into_iter()
        .map(|c| WordPlacement::new(slot.direction, slot.location.offset(slot.direction, -(c.index as i32)), c.word))
        .collect()
}

/// Lazily places every candidate of the slot, the children are normalised.
pub(crate) fn fill_slot(workspace: &Workspace, grid: Arc<Grid>, slot: Slot) -> impl Iterator<Item = Workspace> + '_
{
    slot_placements(workspace, &slot).into_iter()
        .filter_map(move |placement| workspace.try_place_word(&grid, &placement))
        .map(|ws| ws.normalise())
}
