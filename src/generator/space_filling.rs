use std::{cmp::Reverse, sync::Arc};

use itertools::Itertools;
use serde::{Deserialize, Serialize};
use crate::{grid::{CoverageConstraint, Grid, Region}, placement::WordPlacement, slot::Slot, workspace::Workspace};
use super::{cover_partial_word, fill_slot, slot_placements, NextStepGenerator};

/// Covers free space that grew too large
///
/// Every [region](Region) of free space breaking the [constraint](CoverageConstraint) gets a word reaching into it.
/// The placements of different regions are combined into single children, at most `combination_limit` of the best
/// scoring combinations are kept after every region. Without such regions the open slots are filled one at a time,
/// the most recently discovered first.
///
/// Regions are covered one level per step: a child whose new words still leave a region too large is covered again
/// when the child itself is expanded.
#[derive(Clone, Copy, Eq, PartialEq, Debug, Serialize, Deserialize)]
pub struct SpaceFillingGenerator
{
    pub constraint: CoverageConstraint,
    pub combination_limit: usize,
}

impl SpaceFillingGenerator
{
    pub fn new(constraint: CoverageConstraint, combination_limit: usize) -> SpaceFillingGenerator
    {
        SpaceFillingGenerator { constraint, combination_limit }
    }

    /// Children covering the regions breaking the constraint, None when no region can be reached.
    pub fn cover_regions(&self, workspace: &Workspace, grid: &Grid) -> Option<Vec<Workspace>>
    {
        let rectangle = grid.rectangle();
        let branches: Vec<Vec<Workspace>> = grid.regions().iter()
            .filter(|r| self.constraint.is_violated_by(r, &rectangle))
            .map(|r| self.region_children(workspace, grid, r))
            .filter(|children| !children.is_empty())
            .collect();

        let mut branches = branches.into_iter();
        let mut combined = branches.next()?;

        for children in branches
        {
            let next: Vec<Workspace> = combined.iter()
                .cartesian_product(children.iter())
                .filter_map(|(a, b)| combine(workspace, a, b))
                .unique()
                .sorted_by_key(|ws| Reverse(ws.score()))
                .take(self.combination_limit)
                .collect();

            // regions nothing combines with are left for a later step
            if !next.is_empty() { combined = next; }
        }

        log::trace!("covered regions with {} combinations", combined.len());
        Some(combined.into_iter().map(|ws| ws.normalise()).collect())
    }

    /// Children putting at least one letter into the region, best first and not normalised.
    fn region_children(&self, workspace: &Workspace, grid: &Grid, region: &Region) -> Vec<Workspace>
    {
        grid.adjacent_slots(region)
            .flat_map(|entry| slot_placements(workspace, &entry.slot))
            .filter(|p| p.cells().any(|(_, location, _)| region.contains(&location)))
            .unique()
            .filter_map(|p| workspace.try_place_word(grid, &p))
            .sorted_by_key(|ws| Reverse(ws.score()))
            .take(self.combination_limit)
            .collect()
    }
}

impl NextStepGenerator for SpaceFillingGenerator
{
    fn generate_next_steps<'a>(&'a self, workspace: &'a Workspace) -> Box<dyn Iterator<Item = Workspace> + 'a>
    {
        let grid = Grid::generate(workspace);
        if let Some(children) = cover_partial_word(workspace, &grid)
        {
            return Box::new(children.into_iter());
        }
        if let Some(children) = self.cover_regions(workspace, &grid)
        {
            return Box::new(children.into_iter());
        }

        let slots: Vec<Slot> = grid.slots().iter().rev().map(|s| s.slot).collect();
        let grid = Arc::new(grid);
        Box::new(slots.into_iter().flat_map(move |slot| fill_slot(workspace, grid.clone(), slot)))
    }
}

/// Puts the words `b` added to `parent` onto `a`
///
/// `a` and `b` must be children of `parent` that were not normalised. Fails when a word of `b` is already on `a`,
/// when it runs into a word only `a` added, or when it can't be placed on `a`.
pub fn combine(parent: &Workspace, a: &Workspace, b: &Workspace) -> Option<Workspace>
{
    let added_by_a: Vec<&WordPlacement> = a.board().placements().filter(|p| !parent.board().contains_placement(p)).collect();
    let added_by_b: Vec<&WordPlacement> = b.board().placements().filter(|p| !a.board().contains_placement(p)).collect();

    for placement in added_by_b.iter()
    {
        if a.board().find_word(&placement.word).is_some() { return None; }

        let extended = placement.extended_rectangle();
        if added_by_a.iter().any(|p| p.extended_rectangle().intersects(&extended)) { return None; }
    }

    added_by_b.into_iter().try_fold(a.clone(), |ws, placement| ws.place_word(placement))
}
