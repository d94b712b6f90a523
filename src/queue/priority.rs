use std::{cmp::Ordering, collections::HashMap, sync::Arc};

use crate::workspace::Workspace;

/// A queued [workspace](Workspace) with the ids of the nodes it was expanded from
///
/// The ancestry only feeds batch diversity, equality delegates to the workspace.
#[derive(Clone, Debug)]
pub struct WorkspaceNode
{
    pub id: u64,
    pub workspace: Arc<Workspace>,
    /// Ids of the ancestors, the parent last
    pub ancestry: Vec<u64>,
}

impl WorkspaceNode
{
    pub fn root(id: u64, workspace: Workspace) -> WorkspaceNode
    {
        WorkspaceNode { id, workspace: Arc::new(workspace), ancestry: vec![] }
    }

    pub fn child(&self, id: u64, workspace: Workspace) -> WorkspaceNode
    {
        let mut ancestry = self.ancestry.clone();
        ancestry.push(self.id);
        WorkspaceNode { id, workspace: Arc::new(workspace), ancestry }
    }

    pub fn parent(&self) -> Option<u64>
    {
        self.ancestry.last().copied()
    }

    pub fn depth(&self) -> usize
    {
        self.ancestry.len()
    }
}

impl PartialEq for WorkspaceNode
{
    fn eq(&self, other: &Self) -> bool
    {
        self.workspace == other.workspace
    }
}

impl Eq for WorkspaceNode {}

/// Search order of workspaces, `Greater` is better
///
/// Higher scores first, then fewer words, then the smaller board.
pub fn priority(a: &Workspace, b: &Workspace) -> Ordering
{
    a.score().cmp(&b.score())
        .then_with(|| b.word_count().cmp(&a.word_count()))
        .then_with(|| b.board().cmp(a.board()))
}

/// # Bounded, deduplicating priority queue of workspaces
///
/// A min-max heap: the best node sits at the root, the worst one on the second level, so both ends are reachable in
/// constant time and removable in logarithmic time.
///
/// * Pushing a workspace equal to a queued one doesn't add a node, the queued workspace gets its
///   [slots recomputed](Workspace::recompute_slots) instead.
/// * A full queue drops new nodes that aren't better than its worst node, and evicts the worst node otherwise.
///   The length never exceeds the capacity.
#[derive(Clone, Debug)]
pub struct WorkspacePriorityQueue
{
    capacity: usize,
    nodes: Vec<WorkspaceNode>,
    positions: HashMap<Arc<Workspace>, usize>,
}

impl WorkspacePriorityQueue
{
    pub fn new(capacity: usize) -> WorkspacePriorityQueue
    {
        WorkspacePriorityQueue { capacity, nodes: Vec::with_capacity(capacity), positions: HashMap::with_capacity(capacity) }
    }

    pub fn capacity(&self) -> usize { self.capacity }
    pub fn len(&self) -> usize { self.nodes.len() }
    pub fn is_empty(&self) -> bool { self.nodes.is_empty() }

    pub fn contains(&self, workspace: &Workspace) -> bool
    {
        self.positions.contains_key(workspace)
    }

    pub fn peek_best(&self) -> Option<&WorkspaceNode>
    {
        self.nodes.first()
    }

    pub fn peek_worst(&self) -> Option<&WorkspaceNode>
    {
        self.worst_index().map(|i| &self.nodes[i])
    }

    /// Adds the node, returns true when the queue got a new node.
    pub fn push(&mut self, node: WorkspaceNode) -> bool
    {
        if let Some(&i) = self.positions.get(&*node.workspace)
        {
            // equal workspaces have equal priorities, the heap order holds
            let refreshed = Arc::new(self.nodes[i].workspace.recompute_slots());
            self.positions.remove(&*node.workspace);
            self.positions.insert(refreshed.clone(), i);
            self.nodes[i].workspace = refreshed;
            log::trace!("collapsed duplicate node {} into {}", node.id, self.nodes[i].id);
            return false;
        }

        if self.nodes.len() >= self.capacity
        {
            let Some(worst) = self.worst_index() else { return false };
            if priority(&node.workspace, &self.nodes[worst].workspace) != Ordering::Greater
            {
                return false;
            }
            self.remove_at(worst);
        }

        let i = self.nodes.len();
        self.positions.insert(node.workspace.clone(), i);
        self.nodes.push(node);
        self.sift_up(i);
        true
    }

    pub fn pop_best(&mut self) -> Option<WorkspaceNode>
    {
        if self.nodes.is_empty() { return None; }
        Some(self.remove_at(0))
    }

    pub fn pop_worst(&mut self) -> Option<WorkspaceNode>
    {
        let i = self.worst_index()?;
        Some(self.remove_at(i))
    }

    /// Removes every node, best first.
    pub fn drain_sorted(&mut self) -> Vec<WorkspaceNode>
    {
        std::iter::from_fn(|| self.pop_best()).collect()
    }

    fn worst_index(&self) -> Option<usize>
    {
        match self.nodes.len()
        {
            0 => None,
            1 => Some(0),
            2 => Some(1),
            _ => Some(if self.better(1, 2) { 2 } else { 1 }),
        }
    }

    /// Only called for the root or the worst node, the replacement then only has to move down.
    fn remove_at(&mut self, i: usize) -> WorkspaceNode
    {
        let last = self.nodes.len() - 1;
        self.swap(i, last);
        let node = self.nodes.pop().unwrap_or_else(|| panic!("removing from an empty queue"));
        self.positions.remove(&*node.workspace);
        if i < self.nodes.len()
        {
            self.sift_down(i);
        }
        node
    }

    fn better(&self, i: usize, j: usize) -> bool
    {
        priority(&self.nodes[i].workspace, &self.nodes[j].workspace) == Ordering::Greater
    }

    fn swap(&mut self, i: usize, j: usize)
    {
        if i == j { return; }
        self.nodes.swap(i, j);
        for k in [i, j]
        {
            if let Some(position) = self.positions.get_mut(&*self.nodes[k].workspace)
            {
                *position = k;
            }
        }
    }

    /// Even levels hold nodes better than their descendants, odd levels worse ones.
    fn is_best_level(i: usize) -> bool
    {
        (usize::BITS - (i + 1).leading_zeros() - 1) % 2 == 0
    }

    fn parent(i: usize) -> Option<usize>
    {
        (i > 0).then(|| (i - 1) / 2)
    }

    fn grandparent(i: usize) -> Option<usize>
    {
        Self::parent(i).and_then(Self::parent)
    }

    fn sift_up(&mut self, i: usize)
    {
        let Some(parent) = Self::parent(i) else { return };
        let best_level = Self::is_best_level(i);

        if best_level && self.better(parent, i)
        {
            self.swap(i, parent);
            self.sift_up_by(parent, false);
        }
        else if !best_level && self.better(i, parent)
        {
            self.swap(i, parent);
            self.sift_up_by(parent, true);
        }
        else
        {
            self.sift_up_by(i, best_level);
        }
    }

    fn sift_up_by(&mut self, mut i: usize, best: bool)
    {
        while let Some(grandparent) = Self::grandparent(i)
        {
            let out_of_order = if best { self.better(i, grandparent) } else { self.better(grandparent, i) };
            if !out_of_order { break; }
            self.swap(i, grandparent);
            i = grandparent;
        }
    }

    fn sift_down(&mut self, mut i: usize)
    {
        let best = Self::is_best_level(i);
        let first = |a: &Self, x: usize, y: usize| if best { a.better(x, y) } else { a.better(y, x) };

        loop
        {
            let descendants = [2 * i + 1, 2 * i + 2, 4 * i + 3, 4 * i + 4, 4 * i + 5, 4 * i + 6];
            let Some(m) = descendants.into_iter()
                .filter(|&d| d < self.nodes.len())
                .reduce(|m, d| if first(self, d, m) { d } else { m })
            else { return };

            if !first(self, m, i) { return; }
            self.swap(m, i);

            if m <= 2 * i + 2 { return; }

            let parent = (m - 1) / 2;
            if first(self, parent, m)
            {
                self.swap(m, parent);
            }
            i = m;
        }
    }
}

#[cfg(test)]
mod tests
{
    use super::*;
    use crate::{geometry::{Direction, Location}, placement::WordPlacement, word_database::WordDatabase};

    const WORDS: [&str; 12] = ["ZOO", "ZEN", "OAK", "HELLO", "LOCAL", "HALO", "CAT", "ART", "TAXI", "AXE", "JAZZ", "QUIZ"];

    fn database() -> WordDatabase
    {
        WordDatabase::new(WORDS)
    }

    /// Every seed and every child of every seed, many with equal scores.
    fn workspaces() -> Vec<Workspace>
    {
        let seeds = Workspace::seeds(&database());
        let children: Vec<Workspace> = seeds.iter()
            .flat_map(|seed| seed.slots().iter().flat_map(|s| crate::generator::slot_placements(seed, &s.slot)
                .into_iter()
                .filter_map(|p| seed.place_word(&p))
                .map(|ws| ws.normalise())
                .collect::<Vec<_>>()))
            .collect();
        seeds.into_iter().chain(children).collect()
    }

    fn fill(capacity: usize, items: Vec<Workspace>) -> WorkspacePriorityQueue
    {
        let mut queue = WorkspacePriorityQueue::new(capacity);
        for (id, ws) in items.into_iter().enumerate()
        {
            queue.push(WorkspaceNode::root(id as u64, ws));
        }
        queue
    }

    fn assert_best_first(nodes: &[WorkspaceNode])
    {
        for pair in nodes.windows(2)
        {
            assert_ne!(priority(&pair[0].workspace, &pair[1].workspace), Ordering::Less);
        }
        for pair in nodes.windows(2)
        {
            assert!(pair[0].workspace.score() >= pair[1].workspace.score());
        }
    }

    #[test]
    fn test_pops_best_first()
    {
        let items = workspaces();
        assert!(items.len() > 20);

        let mut queue = fill(1000, items);
        let popped = queue.drain_sorted();
        assert!(queue.is_empty());
        assert_best_first(&popped);
    }

    #[test]
    fn test_capacity_is_never_exceeded_and_keeps_the_best()
    {
        let items = workspaces();
        let mut all = fill(1000, items.clone());
        let expected: Vec<i32> = all.drain_sorted().iter().take(7).map(|n| n.workspace.score()).collect();

        let mut queue = WorkspacePriorityQueue::new(7);
        for (id, ws) in items.into_iter().enumerate()
        {
            queue.push(WorkspaceNode::root(id as u64, ws));
            assert!(queue.len() <= 7);
        }

        let popped = queue.drain_sorted();
        assert_best_first(&popped);
        assert_eq!(popped.iter().map(|n| n.workspace.score()).collect::<Vec<_>>(), expected);
    }

    #[test]
    fn test_equal_workspaces_collapse()
    {
        let ws = Workspace::seed(database(), "HELLO").unwrap();
        let mut queue = WorkspacePriorityQueue::new(10);

        assert!(queue.push(WorkspaceNode::root(0, ws.clone())));
        assert!(!queue.push(WorkspaceNode::root(1, ws.clone())));
        assert_eq!(queue.len(), 1);
        assert!(queue.contains(&ws));

        // the survivor has its slots recomputed
        let survivor = queue.pop_best().unwrap();
        assert_eq!(survivor.id, 0);
        assert!(survivor.workspace.slots().iter().all(|s| s.candidates.is_some()));
    }

    #[test]
    fn test_worst_is_tracked()
    {
        let mut queue = fill(100, workspaces());
        let worst = queue.peek_worst().unwrap().workspace.clone();

        let popped = queue.pop_worst().unwrap();
        assert_eq!(popped.workspace, worst);
        assert!(queue.drain_sorted().iter().all(|n| priority(&n.workspace, &worst) != Ordering::Less));
    }

    #[test]
    fn test_node_ancestry()
    {
        let db = database();
        let root = WorkspaceNode::root(1, Workspace::seed(db.clone(), "HELLO").unwrap());
        let child = root.child(2, Workspace::new(db).place_word(&WordPlacement::new(Direction::Across, Location::new(0, 0), "HALO")).unwrap());

        assert_eq!(root.parent(), None);
        assert_eq!(child.parent(), Some(1));
        assert_eq!(child.depth(), 1);
        assert_eq!(child.child(3, Workspace::seed(database(), "CAT").unwrap()).ancestry, vec![1, 2]);
    }
}
