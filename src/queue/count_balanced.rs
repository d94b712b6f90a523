use std::{collections::HashMap, sync::{Mutex, MutexGuard, PoisonError}};

use super::{WorkspaceNode, WorkspacePriorityQueue};

/// # Frontier split by word count
///
/// Every word count gets its own bounded [queue](WorkspacePriorityQueue) behind its own lock, so depths
/// producing many children can't crowd out the others and workers touching different depths don't wait on each other.
///
/// Queues of the deepest word counts are drained first once they hold `flush_length` nodes, then queues filled beyond
/// two thirds of their capacity, otherwise the shallowest non-empty queue is popped.
#[derive(Debug)]
pub struct CountBalancedQueue
{
    queues: Vec<Mutex<WorkspacePriorityQueue>>,
    flush_length: usize,
}

impl CountBalancedQueue
{
    /// Queues for boards of 0 to `max_words` words, boards with more words share the last queue.
    pub fn new(max_words: usize, capacity: usize, flush_length: usize) -> CountBalancedQueue
    {
        CountBalancedQueue
        {
            queues: (0..=max_words).map(|_| Mutex::new(WorkspacePriorityQueue::new(capacity))).collect(),
            flush_length: flush_length.max(1),
        }
    }

    pub fn len(&self) -> usize
    {
        (0..self.queues.len()).map(|i| self.lock(i).len()).sum()
    }

    pub fn is_empty(&self) -> bool
    {
        (0..self.queues.len()).all(|i| self.lock(i).is_empty())
    }

    /// Total capacity of all word counts.
    pub fn capacity(&self) -> usize
    {
        (0..self.queues.len()).map(|i| self.lock(i).capacity()).sum()
    }

    /// Number of nodes queued per word count.
    pub fn lengths(&self) -> Vec<usize>
    {
        (0..self.queues.len()).map(|i| self.lock(i).len()).collect()
    }

    /// Queues the node
    ///
    /// Once the queue of the node's word count is filled beyond two thirds of its capacity, its best node is taken out
    /// again and returned, the caller should expand it right away.
    pub fn push(&self, node: WorkspaceNode) -> Option<WorkspaceNode>
    {
        let index = self.index_of(&node);
        let mut queue = self.lock(index);
        queue.push(node);

        if over_threshold(&queue)
        {
            log::trace!("queue of {index} words over threshold, {}/{} nodes", queue.len(), queue.capacity());
            return queue.pop_best();
        }
        None
    }

    /// Queues the node without the threshold check.
    pub fn push_back(&self, node: WorkspaceNode)
    {
        self.lock(self.index_of(&node)).push(node);
    }

    pub fn pop(&self) -> Option<WorkspaceNode>
    {
        for i in (0..self.queues.len()).rev()
        {
            let mut queue = self.lock(i);
            if queue.len() >= self.flush_length
            {
                return queue.pop_best();
            }
        }

        // push_back skips the threshold check
        for i in (0..self.queues.len()).rev()
        {
            let mut queue = self.lock(i);
            if over_threshold(&queue)
            {
                return queue.pop_best();
            }
        }

        (0..self.queues.len()).find_map(|i| self.lock(i).pop_best())
    }

    /// Pops up to `size` nodes, at most `max_siblings` of them sharing a parent
    ///
    /// Nodes skipped for having too many siblings in the batch are queued again.
    pub fn pop_batch(&self, size: usize, max_siblings: usize) -> Vec<WorkspaceNode>
    {
        let mut batch = Vec::with_capacity(size);
        let mut deferred = vec![];
        let mut siblings: HashMap<Option<u64>, usize> = HashMap::new();

        while batch.len() < size && deferred.len() < size * 4
        {
            let Some(node) = self.pop() else { break };

            let count = siblings.entry(node.parent()).or_default();
            if *count >= max_siblings
            {
                deferred.push(node);
                continue;
            }
            *count += 1;
            batch.push(node);
        }

        for node in deferred
        {
            self.push_back(node);
        }
        batch
    }

    fn index_of(&self, node: &WorkspaceNode) -> usize
    {
        node.workspace.word_count().min(self.queues.len() - 1)
    }

    fn lock(&self, i: usize) -> MutexGuard<'_, WorkspacePriorityQueue>
    {
        self.queues[i].lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn over_threshold(queue: &WorkspacePriorityQueue) -> bool
{
    queue.len() * 3 > queue.capacity() * 2
}

#[cfg(test)]
mod tests
{
    use super::*;
    use crate::{geometry::{Direction, Location}, placement::WordPlacement, word_database::WordDatabase, workspace::Workspace};

    fn database() -> WordDatabase
    {
        WordDatabase::new(["HELLO", "LOCAL", "HALO", "OAK", "CAT", "ZOO"])
    }

    fn seeds() -> Vec<WorkspaceNode>
    {
        Workspace::seeds(&database()).into_iter().enumerate().map(|(i, ws)| WorkspaceNode::root(i as u64, ws)).collect()
    }

    fn two_words(parent: &WorkspaceNode, id: u64) -> WorkspaceNode
    {
        let ws = Workspace::from_placements(database(), [
            WordPlacement::new(Direction::Across, Location::new(0, 0), "HELLO"),
            WordPlacement::new(Direction::Down, Location::new(2, 0), "LOCAL"),
        ]).unwrap();
        parent.child(id, ws.normalise())
    }

    #[test]
    fn test_nodes_are_split_by_word_count()
    {
        let queue = CountBalancedQueue::new(6, 100, 10);
        let roots = seeds();
        let child = two_words(&roots[0], 100);

        for node in roots
        {
            assert!(queue.push(node).is_none());
        }
        assert!(queue.push(child).is_none());

        assert_eq!(queue.lengths(), vec![0, 6, 1, 0, 0, 0, 0]);
        assert_eq!(queue.len(), 7);
        assert_eq!(queue.capacity(), 700);
    }

    #[test]
    fn test_shallow_first_until_deep_queue_flushes()
    {
        let queue = CountBalancedQueue::new(6, 100, 2);
        let roots = seeds();
        let child = two_words(&roots[0], 100);
        for node in roots
        {
            queue.push(node);
        }
        queue.push(child);

        // one deep node is below the flush length
        assert_eq!(queue.pop().unwrap().workspace.word_count(), 1);

        let queue = CountBalancedQueue::new(6, 100, 1);
        for node in seeds()
        {
            queue.push(node);
        }
        queue.push(two_words(&seeds()[0], 100));
        assert_eq!(queue.pop().unwrap().workspace.word_count(), 2);
    }

    #[test]
    fn test_queues_over_threshold_pop_before_shallower_ones()
    {
        let db = database();
        let queue = CountBalancedQueue::new(4, 4, 4);
        let root = WorkspaceNode::root(0, Workspace::seed(db.clone(), "HELLO").unwrap());
        let crossings = [
            WordPlacement::new(Direction::Down, Location::new(2, 0), "LOCAL"),
            WordPlacement::new(Direction::Down, Location::new(3, 0), "LOCAL"),
            WordPlacement::new(Direction::Down, Location::new(0, 0), "HALO"),
        ];
        for (i, crossing) in crossings.into_iter().enumerate()
        {
            let ws = Workspace::from_placements(db.clone(), [WordPlacement::new(Direction::Across, Location::new(0, 0), "HELLO"), crossing]).unwrap();
            queue.push_back(root.child(i as u64 + 1, ws.normalise()));
        }
        queue.push_back(root);

        // 3 of 4 is below the flush length but over two thirds
        assert_eq!(queue.lengths(), vec![0, 1, 3, 0, 0]);
        assert_eq!(queue.pop().unwrap().workspace.word_count(), 2);
        assert_eq!(queue.lengths(), vec![0, 1, 2, 0, 0]);
        assert_eq!(queue.pop().unwrap().workspace.word_count(), 1);
    }

    #[test]
    fn test_overflow_returns_the_best_node()
    {
        let queue = CountBalancedQueue::new(2, 3, 10);
        let mut returned = vec![];
        for node in seeds()
        {
            if let Some(node) = queue.push(node)
            {
                returned.push(node);
            }
            assert!(queue.lengths()[1] <= 2);
        }

        assert!(!returned.is_empty());
        assert_eq!(returned.len() + queue.len(), 6);
    }

    #[test]
    fn test_batches_limit_siblings()
    {
        let queue = CountBalancedQueue::new(6, 100, 100);
        for node in seeds()
        {
            queue.push(node);
        }

        let batch = queue.pop_batch(5, 2);
        assert_eq!(batch.len(), 2);
        assert_eq!(queue.len(), 4);

        let batch = queue.pop_batch(3, 10);
        assert_eq!(batch.len(), 3);
        assert_eq!(queue.len(), 1);
    }
}
