// Copyright (c) 2017 Jason White
//
// Permission is hereby granted, free of charge, to any person obtaining a copy
// of this software and associated documentation files (the "Software"), to deal
// in the Software without restriction, including without limitation the rights
// to use, copy, modify, merge, publish, distribute, sublicense, and/or sell
// copies of the Software, and to permit persons to whom the Software is
// furnished to do so, subject to the following conditions:
//
// The above copyright notice and this permission notice shall be included in
// all copies or substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
// IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
// FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
// AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
// LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
// OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN
// THE SOFTWARE.

use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Condvar, Mutex};

use crate::build_graph::{BuildGraph, BuildGraphExt, Edge, FromRules, Node};
use crate::logger::{EchoMode, EventLogger, TaskLogger};
use crate::res::{self, Resource, ResourceState};
use crate::rules::Rules;
use crate::state::{BuildLock, BuildState};
use crate::task::{self, Detected, Task};

use crate::graph::{
    Algo, Edges, IndexSet, Indexable, Neighbors, NodeIndex, Nodes, Subgraph,
};

use crate::error::{Error, ErrorKind, ResultExt};

/// A build failure. Contains each of the node indexes that failed and the
/// associated error.
#[derive(Fail, Debug)]
pub struct BuildFailure {
    errors: Vec<(NodeIndex, Error)>,
}

impl BuildFailure {
    pub fn new(errors: Vec<(NodeIndex, Error)>) -> BuildFailure {
        BuildFailure { errors }
    }
}

impl fmt::Display for BuildFailure {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.errors.len() == 1 {
            write!(f, "Build failed with {} error", self.errors.len())
        } else {
            write!(f, "Build failed with {} errors", self.errors.len())
        }
    }
}

/// Options controlling how a build is executed. These are independent of the
/// build rules themselves.
#[derive(Clone, Debug)]
pub struct BuildOptions {
    /// Don't actually execute anything, just print what would happen.
    pub dryrun: bool,

    /// Number of worker threads to use.
    pub threads: usize,

    /// If `false`, stop scheduling new, independent work as soon as the
    /// first task fails. Work already in flight is allowed to finish.
    pub keep_going: bool,

    /// Maximum number of concurrently running tasks per named pool. A pool
    /// with no entry here is unbounded.
    pub job_limits: HashMap<String, usize>,

    /// After a task finishes, verify that its declared outputs actually
    /// exist on disk.
    pub check_outputs: bool,

    /// Don't trust the previously recorded checksums when deciding what's
    /// out of date: probe and queue every resource as though its state had
    /// never been computed before.
    pub force_probe: bool,

    /// How much of a task to print before it runs.
    pub echo: EchoMode,
}

impl Default for BuildOptions {
    fn default() -> BuildOptions {
        BuildOptions {
            dryrun: false,
            threads: 0,
            keep_going: true,
            job_limits: HashMap::new(),
            check_outputs: false,
            force_probe: false,
            echo: EchoMode::default(),
        }
    }
}

/// Blocks worker threads until a free slot is available in every named pool
/// a task belongs to. Pools with no configured limit never block.
struct PoolLimiter {
    limits: HashMap<String, usize>,
    running: Mutex<HashMap<String, usize>>,
    cond: Condvar,
}

impl PoolLimiter {
    fn new(limits: HashMap<String, usize>) -> PoolLimiter {
        let running = limits.keys().map(|k| (k.clone(), 0)).collect();

        PoolLimiter {
            limits,
            running: Mutex::new(running),
            cond: Condvar::new(),
        }
    }

    /// Acquires a slot in each of `pools` that has a configured limit,
    /// blocking until all of them are available.
    fn acquire<'a>(&'a self, pools: &[String]) -> PoolGuard<'a> {
        let relevant: Vec<String> = pools
            .iter()
            .filter(|p| self.limits.contains_key(p.as_str()))
            .cloned()
            .collect();

        if !relevant.is_empty() {
            let mut running = self.running.lock().unwrap();

            loop {
                let has_room = relevant
                    .iter()
                    .all(|p| running[p.as_str()] < self.limits[p.as_str()]);

                if has_room {
                    for p in &relevant {
                        *running.get_mut(p.as_str()).unwrap() += 1;
                    }
                    break;
                }

                running = self.cond.wait(running).unwrap();
            }
        }

        PoolGuard {
            limiter: self,
            pools: relevant,
        }
    }
}

/// Releases the pool slots acquired by `PoolLimiter::acquire` when dropped.
struct PoolGuard<'a> {
    limiter: &'a PoolLimiter,
    pools: Vec<String>,
}

impl<'a> Drop for PoolGuard<'a> {
    fn drop(&mut self) {
        if self.pools.is_empty() {
            return;
        }

        {
            let mut running = self.limiter.running.lock().unwrap();
            for p in &self.pools {
                if let Some(count) = running.get_mut(p.as_str()) {
                    *count -= 1;
                }
            }
        }

        self.limiter.cond.notify_all();
    }
}

struct BuildContext<'a> {
    root: &'a Path,
    options: &'a BuildOptions,
    checksums: Mutex<HashMap<NodeIndex, ResourceState>>,

    // Detected inputs/outputs during the build.
    detected: Mutex<Vec<(NodeIndex, Detected)>>,

    pools: PoolLimiter,

    // Set once a task fails and `keep_going` is `false`, or once the logger
    // reports cancellation. Checked at the top of `build_node` so that no
    // new, independent work gets scheduled afterward.
    stop: AtomicBool,

    done: AtomicUsize,
    total: usize,
}

fn delete_resources<L>(
    state: &BuildState,
    to_remove: &IndexSet<NodeIndex>,
    root: &Path,
    threads: usize,
    logger: &L,
    dryrun: bool,
) -> Result<(), Error>
where
    L: EventLogger,
{
    if to_remove.is_empty() {
        return Ok(());
    }

    let graph = &state.graph;
    let checksums = &state.checksums;

    graph
        .traverse(
            |tid, index, node| {
                if let Node::Resource(r) = node {
                    // Only delete the resource if its in our set of removed
                    // resources and if the state has been computed. A computed
                    // state indicates that the build system "owns" the
                    // resource.
                    if !graph.is_root_node(index)
                        && to_remove.contains(&index)
                        && checksums.contains_key(&index)
                    {
                        logger.delete(tid, r)?;

                        if !dryrun {
                            r.delete(root)?;
                        }
                    }
                }

                // Let the traversal proceed to the next node.
                Ok(true)
            },
            threads,
            true,
        )
        .map_err(BuildFailure::new)?; // TODO: Return a ResourceDeletion error.

    Ok(())
}

/// Updates the build state with the build graph loaded from the on-disk rules.
///
/// This is one of the most important algorithms in the build system.
fn sync_state<L>(
    state: &mut BuildState,
    graph: BuildGraph,
    root: &Path,
    threads: usize,
    logger: &L,
    dryrun: bool,
) -> Result<(), Error>
where
    L: EventLogger,
{
    // Diff with the explicit subgraph in order to have a one-to-one comparison
    // with the rules build graph.
    let diff = state.graph.explicit_subgraph().diff(&graph);
    log::debug!(
        "rules diff: +{} nodes, -{} nodes, +{} edges, -{} edges",
        diff.right_only_nodes.len(),
        diff.left_only_nodes.len(),
        diff.right_only_edges.len(),
        diff.left_only_edges.len(),
    );

    let nodes_to_delete: Vec<_> = diff
        .left_only_edges
        .iter()
        .map(|index| {
            let (_, b) = state.graph.edge_from_index(index).0;
            b
        })
        .collect();

    let nodes_to_delete: IndexSet<_> = nodes_to_delete.into_iter().collect();

    // Delete the non-root resources in reverse-topological order that we own.
    delete_resources(state, &nodes_to_delete, root, threads, logger, dryrun)?;

    // Remove edges before removing nodes so that the node removal has less work
    // to do. (If a node has fewer neighbors, it has fewer edges to remove.)
    for index in diff.left_only_edges.iter() {
        assert!(state.graph.remove_edge(index).is_some());
    }

    // Remove nodes from the graph. This may invalidate the queue if the queue
    // contains any of the nodes being removed here. Thus, we need to fix the
    // queue after this removal.
    for index in diff.left_only_nodes.iter() {
        assert!(state.graph.remove_node(index).is_some());

        // Fix the checksums.
        state.checksums.remove(&index);
    }

    // Rebuild the queue with invalid indices filtered out.
    let mut queue: Vec<_> = state
        .queue
        .iter()
        .cloned()
        .filter(|&index| state.graph.contains_node_index(index))
        .collect();

    for index in diff.right_only_nodes.iter() {
        // New nodes should always be added to the queue such that they get
        // traversed.
        let node = graph.node_from_index(index);
        let index = state.graph.add_node(node.clone());
        queue.push(index);
    }

    for index in diff.right_only_edges.iter() {
        let ((a, b), weight) = graph.edge_from_index(index);

        // unwrapping because these nodes are guaranteed to exist in the graph
        // at this point already.
        let a = state.graph.node_to_index(graph.node_from_index(a)).unwrap();
        let b = state.graph.node_to_index(graph.node_from_index(b)).unwrap();

        state.graph.add_edge(a, b, *weight);
    }

    state.queue = queue;

    Ok(())
}

/// Updates the build graph with the detected inputs/outputs.
///
/// Note that there is one case where this can fail: adding a dependency on
/// a non-root node. Such a scenario can change the build order or create a race
/// condition.
fn sync_detected<L>(
    graph: &mut BuildGraph,
    detected: Vec<(NodeIndex, Detected)>,
    checksums: &mut HashMap<NodeIndex, ResourceState>,
    _root: &Path,
    _threads: usize,
    _logger: &L,
    _dryrun: bool,
) -> Result<(), Error> {
    for (node, detected) in detected {
        let mut inputs_to_remove = Vec::new();

        // Find edges that can be removed.
        for (index, edge) in graph.incoming(node) {
            if graph.edge_from_index(edge).1 == &Edge::Implicit {
                // We can safely assume this will always be a resource-type
                // node.
                let r = match graph.node_from_index(index) {
                    Node::Resource(r) => r,
                    _ => unreachable!(),
                };

                if !detected.inputs.contains(r) {
                    // This node is no longer being detected as an input. We
                    // need to remove it from the graph.
                    inputs_to_remove.push(index);
                }
            }
        }

        for input in inputs_to_remove {
            let edge_index = graph.edge_to_index(input, node).unwrap();
            graph.remove_edge(edge_index);

            // Remove the node if it has become disconnected from the graph.
            // Orphaned nodes shouldn't cause any problems, but cleaning them up
            // immediately after they form simplifies some logic and keeps the
            // graph looking clean.
            if graph.is_root_node(input) && graph.is_terminal_node(input) {
                graph.remove_node(input);
            }

            // Any time a resource is removed from the graph, it needs to be
            // removed from the checksums.
            checksums.remove(&input);
        }

        // Find new edges.
        for input in detected.inputs {
            let input = Node::Resource(input);

            if let Some(index) = graph.node_to_index(&input) {
                if !graph.contains_edge(&(index, node)) {
                    // It's only valid to add an edge to this node if the node
                    // is a root node.
                    // TODO: Return an error if it's not a root node!
                    if graph.is_root_node(index) {
                        graph.add_edge(index, node, Edge::Implicit);
                    }
                }
            } else {
                // A new node! It's always valid to add a new node as an input.
                let index = graph.add_node(input);
                graph.add_edge(index, node, Edge::Implicit);
            }
        }

        // For detected outputs, we must only
        //  1. add an edge to new nodes.
        //  2. delete resources *after* the graph has been fully updated and in
        //     reverse topological order. That way, if anything fails, nothing
        //     has been deleted yet.
    }

    Ok(())
}

/// Iterator over nodes that should be traversed during the build.
///
/// Yields nodes that should be queued. Root resources are queued if they have
/// changed. The parent task of non-root resources are queued if they have
/// changed.
///
/// This does not modify the stored checksums. The checksums will be updated as
/// the graph is traversed so that it represents the most recent state at the
/// time of the build. There may be some time delay between this step and
/// actually starting the build.
///
/// Unfortunately, this also means that we are hashing every file *twice*. Once
/// before the build and once during the build.
///
/// In the future, there will be a daemon process continuously monitoring file
/// changes and maintaining a queue in the background alleviating this build
/// latency.
struct DirtyNodes<'a> {
    root: &'a Path,
    graph: &'a BuildGraph,
    nodes: <BuildGraph as Nodes<'a>>::Iter,
    checksums: &'a HashMap<NodeIndex, ResourceState>,

    /// When set, every resource is treated as though its checksum had never
    /// been computed, forcing it (or its producing task) to be queued
    /// regardless of whether a freshly-probed state actually differs from
    /// what's on record. Used by `BuildOptions::force_probe`.
    force: bool,
}

impl<'a> DirtyNodes<'a> {
    pub fn new(
        root: &'a Path,
        graph: &'a BuildGraph,
        checksums: &'a HashMap<NodeIndex, ResourceState>,
        force: bool,
    ) -> DirtyNodes<'a> {
        DirtyNodes {
            root,
            graph,
            nodes: graph.nodes(),
            checksums,
            force,
        }
    }
}

impl<'a> Iterator for DirtyNodes<'a> {
    type Item = NodeIndex;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(index) = self.nodes.next() {
            if let Node::Resource(r) = self.graph.node_from_index(index) {
                let stored_state = if self.force {
                    None
                } else {
                    self.checksums.get(&index)
                };

                match stored_state {
                    Some(stored_state) => {
                        // Compute the current state and see if they differ.
                        if let Ok(current_state) = r.state(self.root) {
                            if stored_state != &current_state {
                                if let Some((parent, _)) =
                                    self.graph.incoming(index).next()
                                {
                                    // If this is a non-root node, return
                                    // the task that produces this resource
                                    // instead.
                                    return Some(parent);
                                } else {
                                    return Some(index);
                                }
                            }
                        } else if let Some((parent, _)) =
                            self.graph.incoming(index).next()
                        {
                            // If this is a non-root node, return
                            // the task that produces this resource
                            // instead.
                            return Some(parent);
                        } else {
                            return Some(index);
                        }
                    }
                    None => {
                        // Queue unconditionally if this is a root node: its
                        // checksum either has never been computed, or
                        // `force` is telling us not to trust the one we
                        // have.
                        if self.graph.is_root_node(index) {
                            return Some(index);
                        } else if self.force {
                            // A forced, previously-computed non-root
                            // resource: queue the task that produces it.
                            if let Some((parent, _)) =
                                self.graph.incoming(index).next()
                            {
                                return Some(parent);
                            }
                        }
                    }
                }
            }
        }

        None
    }
}

pub struct Build<'a> {
    /// Path to the root of the project. This is used to ensure tasks start in
    /// the correct working directory.
    root: &'a Path,

    /// Path to the build state. If this has a parent directory, the parent
    /// directory must exist.
    state: &'a Path,
}

impl<'a> Build<'a> {
    /// Creates a new `Build`.
    pub fn new(root: &'a Path, state: &'a Path) -> Build<'a> {
        Build { root, state }
    }

    /// Path to the advisory lock file guarding `self.state`.
    fn lock_path(&self) -> PathBuf {
        let mut path = self.state.as_os_str().to_owned();
        path.push(".lock");
        PathBuf::from(path)
    }

    /// Cleans all outputs of the build and the build state.
    ///
    /// This does *not* clean up build logs or anything else. Since the client
    /// is creating these things, it's up to the client to clean them up.
    pub fn clean<L>(
        &self,
        dryrun: bool,
        threads: usize,
        logger: &L,
    ) -> Result<(), Error>
    where
        L: EventLogger,
    {
        let _lock = BuildLock::acquire(self.lock_path())?;

        let state = match fs::File::open(self.state) {
            Ok(f) => BuildState::from_reader(io::BufReader::new(f))
                .with_context(|_| {
                    format!(
                        "Failed loading build state from file {:?}. \
                         Is it corrupted? Consider doing a `git clean -fdx` \
                         or equivalent.",
                        self.state
                    )
                })?,
            Err(err) => {
                if err.kind() == io::ErrorKind::NotFound {
                    // Nothing to do if it doesn't exist.
                    return Ok(());
                } else {
                    // Some other fatal IO error occurred.
                    return Err(err.into());
                }
            }
        };

        // Delete resources in reverse topological order.
        state
            .graph
            .traverse(
                |tid, index, node| {
                    if let Node::Resource(r) = node {
                        // Only delete the resource if the state has been
                        // computed. A computed state indicates that the build
                        // system "owns" the resource.
                        if !state.graph.is_root_node(index)
                            && state.checksums.contains_key(&index)
                        {
                            logger.delete(tid, r)?;

                            if !dryrun {
                                r.delete(self.root)?;
                            }
                        }
                    }

                    // Let the traversal proceed to the next node.
                    Ok(true)
                },
                threads,
                true,
            )
            .map_err(BuildFailure::new)?;
        // TODO: Return a ResourceDeletion error.

        // Delete the build state
        fs::remove_file(self.state)?;

        Ok(())
    }

    /// Runs an incremental build.
    ///
    /// The build algorithm proceeds as follows:
    ///
    ///  1. Load the build state if possible. If there is no build state,
    ///     creates a new one.
    ///
    ///     (a) Updates the build state with the new build graph (which is
    ///         constructed from the passed in build rules). This is done
    ///         diffing the set of nodes in the two graphs.
    ///
    ///     (b) For resources that don't exist in the new graph, they are
    ///         deleted from disk. Resources are deleted in reverse topological
    ///         order such that files are deleted before their parent
    ///         directories. If any resources fail to be deleted, the
    ///         build fails. Resources that are not owned by the build system
    ///         yet (i.e., resources whose state has not yet been computed) are
    ///         not deleted.
    ///
    ///  2. Find out-of-date nodes and queue them. For root resources that have
    ///     changed state, queue them. For non-root resources that have changed,
    ///     queue the task that produces them.
    ///
    ///     If the queue is empty after this, then there is nothing to do.
    ///
    ///  3. Create a subgraph from the queued nodes.
    ///
    ///  4. Traverse the subgraph in topological order, thereby building
    ///     everything. For resources that don't change state after being built,
    ///     traversal doesn't go any further.
    ///
    ///  5. For any nodes that failed to build, add them to the queue for
    ///     execution next time. We don't want the build to succeed as long as
    ///     there are failing nodes.
    ///
    ///  6. Persist the build state to disk. This is done atomically using a
    ///     temporary file and rename.
    pub fn build<L>(
        &self,
        rules: Rules,
        options: &BuildOptions,
        logger: &mut L,
    ) -> Result<(), Error>
    where
        L: EventLogger,
    {
        logger.begin_build(options.threads)?;

        let result = self.build_impl(rules, options, logger);

        logger.end_build(&result)?;
        result
    }

    fn build_impl<L>(
        &self,
        rules: Rules,
        options: &BuildOptions,
        logger: &L,
    ) -> Result<(), Error>
    where
        L: EventLogger,
    {
        let _lock = BuildLock::acquire(self.lock_path())?;
        log::debug!("acquired build lock at {:?}", self.lock_path());

        let threads = options.threads;
        let dryrun = options.dryrun;

        let graph = BuildGraph::from_rules(rules)
            .context("Failed to create build graph from rules")?;
        log::debug!(
            "constructed build graph with {} nodes",
            graph.nodes().count()
        );

        // Load/create the build state.
        let BuildState {
            mut graph,
            mut queue,
            checksums,
        } = {
            match fs::File::open(self.state) {
                Ok(f) => {
                    let mut state =
                        BuildState::from_reader(io::BufReader::new(f))
                            .with_context(|_| {
                                format!(
                                "Failed loading build state from file {:?}. \
                                 Is it corrupted? Consider doing a \
                                 `git clean -fdx` or equivalent.",
                                self.state
                            )
                            })?;

                    sync_state(
                        &mut state, graph, self.root, threads, logger, dryrun,
                    )
                    .context("Failed updating build graph")?;

                    state
                }
                Err(err) => {
                    if err.kind() == io::ErrorKind::NotFound {
                        // If it doesn't exist, create it.
                        BuildState::from_graph(graph)
                    } else {
                        // Some other fatal IO error occurred.
                        return Err(err.into());
                    }
                }
            }
        };

        queue.extend(DirtyNodes::new(
            self.root,
            &graph,
            &checksums,
            options.force_probe,
        ));

        if queue.is_empty() {
            // Don't bother traversing the graph if the queue is empty.
            return Ok(());
        }

        // Used only to give the logger a rough sense of overall progress;
        // doesn't need to be exact, so we count queued roots rather than the
        // full reachable subgraph.
        let total = queue.len();

        let context = BuildContext {
            root: self.root,
            options,
            checksums: Mutex::new(checksums),
            detected: Mutex::new(Vec::new()),
            pools: PoolLimiter::new(options.job_limits.clone()),
            stop: AtomicBool::new(false),
            done: AtomicUsize::new(0),
            total,
        };

        let result = {
            // Create the subgraph from the queued nodes.
            let subgraph = Subgraph::with_edges(
                &graph,
                graph.dfs(queue.into_iter()),
                graph.edges(),
            );

            // Build the subgraph.
            subgraph.traverse(
                |tid, index, node| {
                    build_node(&context, tid, index, node, logger)
                },
                threads,
                false,
            )
        };

        let queue = {
            if let Err(errors) = &result {
                // Queue all failed tasks so that they get visited again next
                // time.
                errors.iter().map(|x| x.0).collect()
            } else {
                Vec::new()
            }
        };

        let BuildContext {
            root: _,
            options: _,
            checksums,
            detected,
            pools: _,
            stop: _,
            done: _,
            total: _,
        } = context;
        let mut checksums = checksums.into_inner().unwrap();
        let detected = detected.into_inner().unwrap();

        // TODO: Add the detected inputs/outputs to the build graph. We must not
        // modify the build order when adding new edges to the graph. That is,
        // we can only add edges to *root* nodes. If we attempt to do otherwise,
        // then the build state shouldn't be committed.
        sync_detected(
            &mut graph, detected, &mut checksums, self.root, threads, logger,
            dryrun,
        )?;

        // Serialize the state. This must be the last thing that we do. If
        // anything fails above (e.g., failing to delete a resource), the state
        // will remain untouched and the error should be reproducible. Note that
        // task failures should not prevent the state from being saved. Instead,
        // those are added to the queue to be executed again.
        BuildState {
            graph,
            queue,
            checksums,
        }
        .write_to_path(self.state)
        .with_context(|_| {
            format!("Failed writing build state to {:?}", self.state)
        })?;

        result.map_err(BuildFailure::new)?;

        Ok(())
    }
}

fn build_node<L>(
    context: &BuildContext,
    tid: usize,
    index: NodeIndex,
    node: &Node,
    logger: &L,
) -> Result<bool, Error>
where
    L: EventLogger,
{
    if context.stop.load(Ordering::SeqCst) {
        // A prior task failed and `keep_going` is `false` (or the build was
        // cancelled). Don't do any more work, but don't report this node as
        // failed either -- it'll simply be retried on the next build.
        return Ok(false);
    }

    if logger.is_cancelled() {
        context.stop.store(true, Ordering::SeqCst);
        return Err(ErrorKind::Cancelled.into());
    }

    let result = match node {
        Node::Resource(r) => build_resource(context, tid, index, r),
        Node::Task(t) => build_task(context, tid, index, t, logger),
    };

    if result.is_err() && !context.options.keep_going {
        context.stop.store(true, Ordering::SeqCst);
    }

    let done = context.done.fetch_add(1, Ordering::SeqCst) + 1;
    logger.task_progress(done, context.total)?;

    result
}

fn build_resource(
    context: &BuildContext,
    _tid: usize,
    index: NodeIndex,
    node: &res::Any,
) -> Result<bool, Error> {
    let state = node.state(context.root)?;

    let mut checksums = context.checksums.lock().unwrap();

    let ret = if let Some(prev_state) = checksums.get(&index) {
        // Only need to proceed down the graph if this resource changed.
        Ok(&state != prev_state)
    } else {
        // Previous state wasn't computed. Unconditionally proceed down the
        // graph.
        Ok(true)
    };

    checksums.insert(index, state);

    ret
}

fn build_task<L>(
    context: &BuildContext,
    tid: usize,
    index: NodeIndex,
    node: &task::List,
    logger: &L,
) -> Result<bool, Error>
where
    L: EventLogger,
{
    let _slots = context.pools.acquire(node.pools());

    for task in node.iter() {
        let mut task_logger = logger.start_task(tid, &task)?;

        if context.options.dryrun {
            task_logger.finish(&Ok(Detected::new()))?;
        } else {
            let result = task.execute(context.root, &mut task_logger, &context.stop);

            task_logger.finish(&result)?;

            // Accumulate the detected inputs/outputs such that we can add them
            // to the implicit resources to the graph later. (We cannot modify
            // the build graph while traversing it.)
            let detected = result?;

            if context.options.check_outputs {
                check_outputs(context.root, &detected)?;
            }

            context.detected.lock().unwrap().push((index, detected));
        }
    }

    Ok(true)
}

/// Verifies that every output a task claims to have produced actually exists
/// on disk.
fn check_outputs(root: &Path, detected: &Detected) -> Result<(), Error> {
    for output in &detected.outputs {
        let state = output.state(root)?;

        if state == ResourceState::Missing {
            return Err(ErrorKind::OutputMissing(PathBuf::from(
                output.to_string(),
            ))
            .into());
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::res::File;
    use crate::rules::Rules;
    use std::sync::atomic::AtomicBool;
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;
    use tempfile::tempdir;

    #[test]
    fn build_options_default_keeps_going_by_default() {
        let options = BuildOptions::default();

        assert!(options.keep_going);
        assert!(!options.dryrun);
        assert!(!options.check_outputs);
        assert!(!options.force_probe);
        assert!(options.job_limits.is_empty());
        assert_eq!(options.echo, EchoMode::Description);
    }

    #[test]
    fn check_outputs_passes_when_all_outputs_exist() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("out.txt"), b"hello").unwrap();

        let mut detected = Detected::new();
        detected.add_output(File::from("out.txt").into());

        assert!(check_outputs(dir.path(), &detected).is_ok());
    }

    #[test]
    fn check_outputs_fails_when_an_output_is_missing() {
        let dir = tempdir().unwrap();

        let mut detected = Detected::new();
        detected.add_output(File::from("missing.txt").into());

        match check_outputs(dir.path(), &detected) {
            Err(err) => match err.kind() {
                ErrorKind::OutputMissing(path) => {
                    assert_eq!(path, &PathBuf::from("missing.txt"))
                }
                other => panic!("expected OutputMissing, got {:?}", other),
            },
            Ok(()) => panic!("expected an error"),
        }
    }

    #[test]
    fn pool_limiter_ignores_pools_with_no_configured_limit() {
        let limiter = PoolLimiter::new(HashMap::new());

        // Neither of these should block, since "links" has no limit.
        let _a = limiter.acquire(&["links".to_string()]);
        let _b = limiter.acquire(&["links".to_string()]);
    }

    #[test]
    fn pool_limiter_blocks_until_a_slot_is_released() {
        let mut limits = HashMap::new();
        limits.insert("links".to_string(), 1);

        let limiter = Arc::new(PoolLimiter::new(limits));
        let pools = vec!["links".to_string()];

        let first = limiter.acquire(&pools);

        let limiter2 = limiter.clone();
        let pools2 = pools.clone();
        let acquired = Arc::new(AtomicBool::new(false));
        let acquired2 = acquired.clone();

        let handle = thread::spawn(move || {
            let _second = limiter2.acquire(&pools2);
            acquired2.store(true, Ordering::SeqCst);
        });

        thread::sleep(Duration::from_millis(100));
        assert!(
            !acquired.load(Ordering::SeqCst),
            "second acquire should still be blocked on a saturated pool"
        );

        drop(first);
        handle.join().unwrap();
        assert!(acquired.load(Ordering::SeqCst));
    }

    #[test]
    fn dirty_nodes_force_probe_requeues_unchanged_resources() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("foo.c"), b"int main() {}").unwrap();
        fs::write(dir.path().join("foo.o"), b"binary").unwrap();

        let data = r#"[{
            "inputs": ["foo.c"],
            "outputs": ["foo.o"],
            "tasks": [
                {"type": "command", "program": "gcc", "args": ["foo.c"]}
            ]
        }]"#;

        let graph = BuildGraph::from_rules(Rules::from_str(data).unwrap())
            .unwrap();

        // Pretend a prior build already recorded every resource's state.
        let mut checksums = HashMap::new();
        for index in graph.nodes() {
            if let Node::Resource(r) = graph.node_from_index(index) {
                checksums.insert(index, r.state(dir.path()).unwrap());
            }
        }

        // Nothing changed since the recorded state, so an unforced pass
        // finds nothing to do.
        let queued: Vec<_> =
            DirtyNodes::new(dir.path(), &graph, &checksums, false).collect();
        assert!(queued.is_empty());

        // Forcing a probe requeues every resource's producing task, even
        // though their on-disk state hasn't actually changed.
        let queued: Vec<_> =
            DirtyNodes::new(dir.path(), &graph, &checksums, true).collect();
        assert!(!queued.is_empty());
    }

    /// A no-op logger whose `is_cancelled` result is controlled by the test.
    struct NullLogger {
        cancelled: bool,
    }

    struct NullTask;

    impl io::Write for NullTask {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl TaskLogger for NullTask {
        fn finish(self, _result: &Result<Detected, Error>) -> Result<(), Error> {
            Ok(())
        }
    }

    impl EventLogger for NullLogger {
        type TaskLogger = NullTask;

        fn begin_build(&mut self, _threads: usize) -> Result<(), Error> {
            Ok(())
        }

        fn end_build(&mut self, _result: &Result<(), Error>) -> Result<(), Error> {
            Ok(())
        }

        fn start_task(
            &self,
            _thread: usize,
            _task: &task::Any,
        ) -> Result<NullTask, Error> {
            Ok(NullTask)
        }

        fn delete(&self, _thread: usize, _resource: &res::Any) -> Result<(), Error> {
            Ok(())
        }

        fn is_cancelled(&self) -> bool {
            self.cancelled
        }
    }

    fn empty_context(options: &BuildOptions) -> BuildContext<'_> {
        BuildContext {
            root: Path::new("."),
            options,
            checksums: Mutex::new(HashMap::new()),
            detected: Mutex::new(Vec::new()),
            pools: PoolLimiter::new(options.job_limits.clone()),
            stop: AtomicBool::new(false),
            done: AtomicUsize::new(0),
            total: 1,
        }
    }

    #[test]
    fn build_node_skips_work_once_stop_is_set() {
        let options = BuildOptions::default();
        let context = empty_context(&options);
        context.stop.store(true, Ordering::SeqCst);

        let logger = NullLogger { cancelled: false };
        let node = Node::Resource(File::from("foo.txt").into());

        let result = build_node(&context, 0, NodeIndex::from(0usize), &node, &logger);

        assert_eq!(result.unwrap(), false);
        assert_eq!(context.done.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn build_node_stops_the_build_once_the_logger_reports_cancellation() {
        let options = BuildOptions::default();
        let context = empty_context(&options);

        let logger = NullLogger { cancelled: true };
        let node = Node::Resource(File::from("foo.txt").into());

        let result = build_node(&context, 0, NodeIndex::from(0usize), &node, &logger);

        assert!(result.is_err());
        assert!(context.stop.load(Ordering::SeqCst));
    }
}
