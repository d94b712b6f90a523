use std::{collections::HashMap, sync::Arc};

use itertools::Itertools;
use serde::{Deserialize, Serialize};
use crate::{geometry::{Direction, Location}, grid::Grid, scoring::letter_score, slot::Slot, workspace::Workspace};
use super::{cover_partial_word, fill_slot, NextStepGenerator};

/// Fills open slots, a few at a time
///
/// Slots sitting next to each other along their word form a group. Small groups are filled completely,
/// the first group larger than `min_adjacent_group_size` only at the slots closest to its ends and the rest waits for
/// later steps. A board holding one word is only crossed at its highest scoring letters.
#[derive(Clone, Copy, Eq, PartialEq, Debug, Serialize, Deserialize)]
pub struct SlotFillingGenerator
{
    pub min_adjacent_group_size: usize,
}

impl SlotFillingGenerator
{
    pub fn new(min_adjacent_group_size: usize) -> SlotFillingGenerator
    {
        SlotFillingGenerator { min_adjacent_group_size }
    }

    /// The slots to fill, in the order they are tried.
    pub fn slots_to_fill(&self, workspace: &Workspace, grid: &Grid) -> Vec<Slot>
    {
        let slots: Vec<Slot> = grid.slots().iter().map(|s| s.slot).collect();

        if workspace.word_count() == 1
        {
            let best = slots.iter().map(|s| letter_score(s.letter)).max();
            return slots.into_iter().filter(|s| Some(letter_score(s.letter)) == best).collect();
        }

        let mut chosen = vec![];
        for group in adjacent_groups(&slots)
        {
            if group.len() <= self.min_adjacent_group_size
            {
                chosen.extend(group);
                continue;
            }

            let last = group.len() - 1;
            chosen.extend(group.iter()
                .enumerate()
                .sorted_by_key(|(i, _)| (*i).min(last - *i))
                .take(self.min_adjacent_group_size + 1)
                .map(|(_, s)| *s));
            break;
        }
        chosen
    }
}

impl NextStepGenerator for SlotFillingGenerator
{
    fn generate_next_steps<'a>(&'a self, workspace: &'a Workspace) -> Box<dyn Iterator<Item = Workspace> + 'a>
    {
        let grid = Grid::generate(workspace);
        if let Some(children) = cover_partial_word(workspace, &grid)
        {
            return Box::new(children.into_iter());
        }

        let slots = self.slots_to_fill(workspace, &grid);
        let grid = Arc::new(grid);
        Box::new(slots.into_iter().flat_map(move |slot| fill_slot(workspace, grid.clone(), slot)))
    }
}

/// Splits the slots into runs of neighbours crossable in the same direction
///
/// Groups are ordered by their earliest slot in `slots`, the slots of a group by location.
pub fn adjacent_groups(slots: &[Slot]) -> Vec<Vec<Slot>>
{
    let position: HashMap<(Direction, Location), usize> = slots.iter().enumerate().map(|(i, s)| ((s.direction, s.location), i)).collect();
    let mut visited = vec![false; slots.len()];
    let mut groups = vec![];

    for i in 0..slots.len()
    {
        if visited[i] { continue; }
        visited[i] = true;

        let mut group = vec![slots[i]];
        let mut stack = vec![i];
        while let Some(j) = stack.pop()
        {
            let slot = slots[j];
            for step in [-1, 1]
            {
                let Some(&k) = position.get(&(slot.direction, slot.location.offset(slot.direction.opposite(), step))) else { continue };
                if !visited[k]
                {
                    visited[k] = true;
                    group.push(slots[k]);
                    stack.push(k);
                }
            }
        }

        group.sort();
        groups.push(group);
    }
    groups
}
