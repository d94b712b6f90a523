use std::{pin::Pin, sync::{atomic::{AtomicBool, AtomicI64, AtomicU64, AtomicUsize, Ordering}, Arc}, task::{Context, Poll}};

use async_recursion::async_recursion;
use itertools::Itertools;
use log::{debug, info, trace, warn};
use tokio::{sync::{mpsc::{self, Receiver, Sender}, Notify}, task};
use tokio_stream::Stream;

use crate::{
    error::CrozzleError,
    generator::Generator,
    queue::{CountBalancedQueue, WorkspaceNode},
    settings::SearchSettings,
    traits::SharedGenerator,
    word_database::WordDatabase,
    workspace::Workspace,
};

/// Cooperative stop signal of a search, checked by the workers before every batch.
#[derive(Clone, Default, Debug)]
pub struct CancellationFlag(Arc<AtomicBool>);

impl CancellationFlag
{
    pub fn new() -> CancellationFlag
    {
        CancellationFlag::default()
    }

    pub fn cancel(&self)
    {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool
    {
        self.0.load(Ordering::Relaxed)
    }
}

/// Represents a best first search for valid workspaces, runs in an async runtime.
///
/// # Example
/// ```
/// use crozzle_generator::runner::{CancellationFlag, Runner};
/// use crozzle_generator::settings::SearchSettings;
/// use crozzle_generator::word_database::WordDatabase;
///
/// use tokio_stream::StreamExt;
///
/// #[tokio::main(flavor = "current_thread")]
/// async fn main()
/// {
///     let db = WordDatabase::new(["HELLO", "LOCAL", "HALO"]);
///     let runner = Runner::from_settings(SearchSettings::default()).unwrap();
///
///     let solutions: Vec<_> = runner.solve_words(db, CancellationFlag::new()).collect().await;
///
///     assert!(!solutions.is_empty());
///     assert!(solutions.iter().all(|s| s.is_valid() && s.word_count() >= 2));
/// }
/// ```
#[derive(Clone, Debug)]
pub struct Runner<G: SharedGenerator>
{
    generator: G,
    settings: SearchSettings,
}

impl Runner<Generator>
{
    /// Creates a runner with the generator the settings describe.
    ///
    /// # Errors
    ///
    /// [CrozzleError::InvalidSettings] - see [SearchSettings::validate]
    pub fn from_settings(settings: SearchSettings) -> Result<Runner<Generator>, CrozzleError>
    {
        settings.validate()?;
        Ok(Runner { generator: settings.generator.build(), settings })
    }
}

impl<G: SharedGenerator> Runner<G>
{
    pub fn new(generator: G, settings: SearchSettings) -> Runner<G>
    {
        Runner { generator, settings }
    }

    pub fn settings(&self) -> &SearchSettings
    {
        &self.settings
    }

    /// Searches from one seed per word of the database, each placed alone at the origin.
    pub fn solve_words(&self, database: WordDatabase, cancellation: CancellationFlag) -> SolutionStream
    {
        self.solve(Workspace::seeds(&database), cancellation)
    }

    /// Starts the workers and returns the stream of valid workspaces they find
    ///
    /// The stream ends when the frontier runs empty, the search is cancelled or the stream is dropped.
    /// Solutions arrive in no particular order.
    pub fn solve(&self, start: Vec<Workspace>, cancellation: CancellationFlag) -> SolutionStream
    {
        let (sender, receiver) = mpsc::channel(self.settings.channel_capacity.max(1));

        let max_words = start.iter().map(|ws| ws.word_count() + ws.database().available_count()).max().unwrap_or(0);
        let search = Arc::new(Search::new(self.generator.clone(), self.settings.clone(), max_words, sender, cancellation.clone()));

        let seeds = start.len();
        for ws in start
        {
            search.queue.push_back(WorkspaceNode::root(search.next_id(), ws));
        }

        let worker_count = self.settings.worker_count.max(1);
        info!("starting search with {seeds} seeds, {worker_count} workers and {} nodes per word count", self.settings.queue_capacity);

        task::spawn(async move
        {
            let workers = (0..worker_count).map(|worker| task::spawn(search.clone().work(worker)));
            for (worker, result) in futures::future::join_all(workers).await.into_iter().enumerate()
            {
                if let Err(e) = result
                {
                    warn!("worker {worker} failed: {e}");
                }
            }

            let best = search.incumbent.load(Ordering::Relaxed);
            info!("search finished, best score {}, {} nodes left in the frontier", if best == i64::MIN { 0 } else { best }, search.queue.len());
        });

        SolutionStream { solutions: receiver, cancellation }
    }
}

/// Searches for solutions from the start workspaces with default settings for everything not given.
pub fn solve(start: Vec<Workspace>, queue_capacity: usize, batch_size: usize, generator: impl SharedGenerator, cancellation: CancellationFlag) -> SolutionStream
{
    let settings = SearchSettings
    {
        queue_capacity,
        batch_size,
        flush_length: (queue_capacity / 4).max(1),
        ..Default::default()
    };
    Runner::new(generator, settings).solve(start, cancellation)
}

/// Valid workspaces found by a [runner](Runner).
pub struct SolutionStream
{
    solutions: Receiver<Workspace>,
    cancellation: CancellationFlag,
}

impl SolutionStream
{
    /// Asks the workers to stop, solutions already sent can still be received.
    pub fn cancel(&self)
    {
        self.cancellation.cancel();
    }

    pub fn cancellation(&self) -> &CancellationFlag
    {
        &self.cancellation
    }
}

impl Stream for SolutionStream
{
    type Item = Workspace;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context) -> Poll<Option<Self::Item>>
    {
        self.solutions.poll_recv(cx)
    }
}

/// State the workers of one search share.
struct Search<G: SharedGenerator>
{
    generator: G,
    settings: SearchSettings,
    queue: CountBalancedQueue,
    solutions: Sender<Workspace>,
    cancellation: CancellationFlag,
    next_id: AtomicU64,
    /// Best published score
    incumbent: AtomicI64,
    /// Workers holding a batch
    active: AtomicUsize,
    /// Signalled whenever a worker puts its batch down
    refilled: Notify,
}

impl<G: SharedGenerator> Search<G>
{
    fn new(generator: G, settings: SearchSettings, max_words: usize, solutions: Sender<Workspace>, cancellation: CancellationFlag) -> Search<G>
    {
        Search
        {
            queue: CountBalancedQueue::new(max_words.max(1), settings.queue_capacity, settings.flush_length),
            generator,
            settings,
            solutions,
            cancellation,
            next_id: AtomicU64::new(0),
            incumbent: AtomicI64::new(i64::MIN),
            active: AtomicUsize::new(0),
            refilled: Notify::new(),
        }
    }

    fn next_id(&self) -> u64
    {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }

    async fn work(self: Arc<Self>, worker: usize)
    {
        let mut carried: Vec<WorkspaceNode> = vec![];
        let mut batches = 0usize;

        loop
        {
            if self.cancellation.is_cancelled()
            {
                debug!("worker {worker} cancelled after {batches} batches");
                return;
            }

            // created before popping so a refill between the pop and the wait isn't missed
            let refilled = self.refilled.notified();
            self.active.fetch_add(1, Ordering::SeqCst);
            let mut batch = std::mem::take(&mut carried);
            let room = self.settings.batch_size.saturating_sub(batch.len());
            batch.extend(self.queue.pop_batch(room, self.settings.max_siblings_per_batch));

            if batch.is_empty()
            {
                // others may still be refilling the frontier
                if self.active.fetch_sub(1, Ordering::SeqCst) == 1
                {
                    debug!("worker {worker} done after {batches} batches, the frontier is empty");
                    self.refilled.notify_waiters();
                    return;
                }
                refilled.await;
                continue;
            }

            let expanded = self.expand_batch(worker, batch).await;
            self.active.fetch_sub(1, Ordering::SeqCst);
            self.refilled.notify_waiters();
            batches += 1;

            match expanded
            {
                Some(overflow) => carried = overflow,
                None =>
                {
                    debug!("worker {worker} stopped, nobody receives solutions anymore");
                    return;
                },
            }
        }
    }

    /// Expands the batch and queues the children, returns the nodes the queue handed back for immediate expansion.
    ///
    /// None when the solutions can't be sent anymore.
    async fn expand_batch(&self, worker: usize, batch: Vec<WorkspaceNode>) -> Option<Vec<WorkspaceNode>>
    {
        let burst_limit = self.settings.burst_limit(self.queue.capacity());
        let batch_len = batch.len();
        let mut children: Vec<WorkspaceNode> = vec![];
        let mut published = 0usize;
        let mut pending = batch.into_iter();

        while let Some(node) = pending.next()
        {
            if children.len() > burst_limit
            {
                let returned: Vec<WorkspaceNode> = std::iter::once(node).chain(pending.by_ref()).collect();
                debug!("worker {worker} aborted its batch at {} children, {} nodes returned", children.len(), returned.len());
                for node in returned
                {
                    self.queue.push_back(node);
                }
                break;
            }

            if self.settings.prune_by_potential && i64::from(node.workspace.potential_score()) <= self.incumbent.load(Ordering::Relaxed)
            {
                trace!("pruned node {} with potential {}", node.id, node.workspace.potential_score());
                continue;
            }

            let next_steps: Vec<Workspace> = self.generator.generate_next_steps(&node.workspace).collect();
            trace!("node {} of {} words has {} children", node.id, node.workspace.word_count(), next_steps.len());

            for ws in next_steps
            {
                let child = node.child(self.next_id(), ws);
                if child.workspace.is_valid()
                {
                    self.publish(&child.workspace).await?;
                    published += 1;
                    children.push(child);
                }
                else
                {
                    let harvested = self.harvest(&child, self.settings.max_harvest_depth).await?;
                    published += harvested.len();
                    children.extend(harvested);
                }
            }
        }

        let produced = children.len();
        let mut overflow = vec![];
        for child in children.into_iter().unique_by(|n| n.workspace.board().clone())
        {
            if let Some(node) = self.queue.push(child)
            {
                overflow.push(node);
            }
        }

        debug!("worker {worker} expanded {batch_len} nodes into {produced} children, published {published}, {} nodes queued", self.queue.len());

        if overflow.len() > self.settings.batch_size
        {
            for node in overflow.split_off(self.settings.batch_size)
            {
                self.queue.push_back(node);
            }
        }
        Some(overflow)
    }

    /// Expands an invalid node until valid descendants turn up, those are published and returned.
    #[async_recursion]
    async fn harvest(&self, node: &WorkspaceNode, depth: usize) -> Option<Vec<WorkspaceNode>>
    {
        if depth == 0 || self.cancellation.is_cancelled()
        {
            return Some(vec![]);
        }

        let next_steps: Vec<Workspace> = self.generator.generate_next_steps(&node.workspace).collect();
        let mut found = vec![];
        for ws in next_steps
        {
            let child = node.child(self.next_id(), ws);
            if child.workspace.is_valid()
            {
                self.publish(&child.workspace).await?;
                found.push(child);
            }
            else
            {
                found.extend(self.harvest(&child, depth - 1).await?);
            }
        }
        Some(found)
    }

    async fn publish(&self, workspace: &Workspace) -> Option<()>
    {
        let best = self.incumbent.fetch_max(i64::from(workspace.score()), Ordering::Relaxed);
        if i64::from(workspace.score()) > best
        {
            debug!("new best score {} with {} words", workspace.score(), workspace.word_count());
        }
        self.solutions.send(workspace.clone()).await.ok()
    }
}

#[cfg(test)]
mod tests
{
    use super::*;
    use crate::{generator::GeneratorSettings, geometry::{Direction, Location}, placement::WordPlacement};
    use tokio_stream::StreamExt;

    fn database() -> WordDatabase
    {
        WordDatabase::new(["HELLO", "LOCAL", "HALO", "CAT", "OAK", "ZOO"])
    }

    fn assert_replays(solution: &Workspace)
    {
        let replayed = Workspace::from_placements(database(), solution.board().placements().cloned()).unwrap();
        assert!(replayed.is_valid());
        assert_eq!(replayed.score(), solution.score());
        assert_eq!(replayed.normalise().board(), solution.normalise().board());
    }

    #[tokio::test]
    async fn test_search_runs_until_the_frontier_is_empty()
    {
        let _ = env_logger::builder().is_test(true).try_init();

        let runner = Runner::from_settings(SearchSettings::default()).unwrap();
        let solutions: Vec<Workspace> = runner.solve_words(database(), CancellationFlag::new()).collect().await;

        assert!(!solutions.is_empty());
        for solution in solutions.iter()
        {
            assert!(solution.is_valid());
            assert!(solution.word_count() >= 2);
            assert_replays(solution);
        }
    }

    #[tokio::test]
    async fn test_space_filling_search()
    {
        let settings = SearchSettings { generator: GeneratorSettings::space_filling(), worker_count: 1, ..Default::default() };
        let runner = Runner::from_settings(settings).unwrap();
        let solutions: Vec<Workspace> = runner.solve_words(database(), CancellationFlag::new()).collect().await;

        assert!(!solutions.is_empty());
        solutions.iter().for_each(assert_replays);
    }

    #[tokio::test]
    async fn test_cancelled_search_finds_nothing()
    {
        let cancellation = CancellationFlag::new();
        cancellation.cancel();

        let stream = solve(Workspace::seeds(&database()), 100, 4, GeneratorSettings::default().build(), cancellation);
        let solutions: Vec<Workspace> = stream.collect().await;
        assert!(solutions.is_empty());
    }

    #[tokio::test]
    async fn test_dropping_the_stream_stops_the_search()
    {
        let settings = SearchSettings { channel_capacity: 1, ..Default::default() };
        let runner = Runner::from_settings(settings).unwrap();

        let mut stream = runner.solve_words(database(), CancellationFlag::new());
        let first = stream.next().await.unwrap();
        assert!(first.is_valid());
        stream.cancel();
        assert!(stream.cancellation().is_cancelled());
        drop(stream);
    }

    fn search(database: &WordDatabase, settings: SearchSettings) -> (Search<Generator>, Receiver<Workspace>)
    {
        let (sender, receiver) = mpsc::channel(100);
        let generator = settings.generator.build();
        (Search::new(generator, settings, database.available_count(), sender, CancellationFlag::new()), receiver)
    }

    #[tokio::test]
    async fn test_batch_stops_after_a_burst_of_children()
    {
        let db = database();
        let settings = SearchSettings { queue_capacity: 20, flush_length: 5, burst_divisor: 1000, ..Default::default() };
        let (search, mut receiver) = search(&db, settings);
        assert_eq!(search.settings.burst_limit(search.queue.capacity()), 1);

        // crossing the O of HELLO already gives several children, so LOCAL is never expanded
        let hello = WorkspaceNode::root(search.next_id(), Workspace::seed(db.clone(), "HELLO").unwrap());
        let local = WorkspaceNode::root(search.next_id(), Workspace::seed(db.clone(), "LOCAL").unwrap());
        let overflow = search.expand_batch(0, vec![hello, local.clone()]).await.unwrap();

        assert!(overflow.is_empty());
        assert_eq!(search.queue.lengths()[1], 1);
        assert_eq!(search.queue.pop_batch(10, 10).iter().filter(|n| n.workspace.word_count() == 1).collect::<Vec<_>>(), vec![&local]);

        let mut published = 0;
        while let Ok(solution) = receiver.try_recv()
        {
            assert!(solution.board().find_word("HELLO").is_some());
            assert_replays(&solution);
            published += 1;
        }
        assert!(published >= 2);
    }

    #[tokio::test]
    async fn test_harvest_publishes_valid_descendants_up_to_its_depth()
    {
        // T above O is covered by TOE only
        let db = WordDatabase::new(["CAT", "OAK", "TOE"]);
        let ws = Workspace::from_placements(db.clone(), [
            WordPlacement::new(Direction::Across, Location::new(0, 0), "CAT"),
            WordPlacement::new(Direction::Across, Location::new(2, 1), "OAK"),
        ]).unwrap();
        assert!(!ws.is_valid());

        let (search, mut receiver) = search(&db, SearchSettings::default());
        let node = WorkspaceNode::root(search.next_id(), ws);

        assert!(search.harvest(&node, 0).await.unwrap().is_empty());
        assert!(receiver.try_recv().is_err());

        let harvested = search.harvest(&node, search.settings.max_harvest_depth).await.unwrap();
        assert_eq!(harvested.len(), 1);
        assert!(harvested[0].workspace.is_valid());
        assert!(harvested[0].workspace.board().find_word("TOE").is_some());
        assert_eq!(harvested[0].parent(), Some(node.id));

        assert_eq!(receiver.try_recv().unwrap(), *harvested[0].workspace);
        assert_eq!(search.incumbent.load(Ordering::Relaxed), i64::from(harvested[0].workspace.score()));
    }

    #[tokio::test]
    async fn test_idle_workers_finish_with_the_search()
    {
        let settings = SearchSettings { worker_count: 4, batch_size: 1, ..Default::default() };
        let runner = Runner::from_settings(settings).unwrap();

        let solutions: Vec<Workspace> = runner.solve_words(database(), CancellationFlag::new()).collect().await;
        assert!(!solutions.is_empty());
        solutions.iter().for_each(assert_replays);
    }

    #[tokio::test]
    async fn test_pruning_keeps_the_best_solution()
    {
        let plain = Runner::from_settings(SearchSettings { worker_count: 1, ..Default::default() }).unwrap();
        let pruned = Runner::from_settings(SearchSettings { worker_count: 1, prune_by_potential: true, ..Default::default() }).unwrap();

        let all: Vec<Workspace> = plain.solve_words(database(), CancellationFlag::new()).collect().await;
        let some: Vec<Workspace> = pruned.solve_words(database(), CancellationFlag::new()).collect().await;

        assert!(!some.is_empty());
        assert!(some.len() <= all.len());
        some.iter().for_each(assert_replays);
    }
}
