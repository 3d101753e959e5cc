//! Action-graph resolution — dependency closure, dedup, cycles, ordering.
//!
//! Expands plan requests into a DAG of concrete actions. Nodes are keyed
//! by (kind, package, platform) and inserted at most once; edges mean
//! "must complete before". The final schedule is a topological order with
//! ties broken by first-discovered order, so identical input always yields
//! an identical schedule.

use super::types::{ActionRequest, RequestKind, ResolveError, ResolvedAction};
use crate::specs::{Primitive, SpecRepo};
use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};

/// Directed acyclic graph over resolved actions.
///
/// Edges are stored by node index, so a dangling edge cannot be
/// represented. Insertion order doubles as discovery order.
#[derive(Debug, Default, Clone)]
pub struct ActionGraph {
    nodes: Vec<ResolvedAction>,
    index: HashMap<ResolvedAction, usize>,
    preds: Vec<Vec<usize>>,
    succs: Vec<Vec<usize>>,
}

impl ActionGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an action, reusing the existing node for a known triple.
    fn insert(&mut self, action: ResolvedAction) -> usize {
        if let Some(&id) = self.index.get(&action) {
            return id;
        }
        let id = self.nodes.len();
        self.index.insert(action.clone(), id);
        self.nodes.push(action);
        self.preds.push(Vec::new());
        self.succs.push(Vec::new());
        id
    }

    /// Record that `before` must complete before `after`.
    fn add_edge(&mut self, before: usize, after: usize) {
        if before == after || self.preds[after].contains(&before) {
            return;
        }
        self.preds[after].push(before);
        self.succs[before].push(after);
    }

    fn find(&self, action: &ResolvedAction) -> Option<usize> {
        self.index.get(action).copied()
    }

    pub fn contains(&self, action: &ResolvedAction) -> bool {
        self.index.contains_key(action)
    }

    pub fn node(&self, id: usize) -> &ResolvedAction {
        &self.nodes[id]
    }

    /// Predecessors of a node — the actions it waits on.
    pub fn predecessors(&self, action: &ResolvedAction) -> Vec<&ResolvedAction> {
        match self.find(action) {
            Some(id) => self.preds[id].iter().map(|&p| &self.nodes[p]).collect(),
            None => Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Topological order via Kahn's algorithm. Among ready nodes the
    /// lowest insertion index (first-discovered) goes first.
    pub fn topo_order(&self) -> Vec<usize> {
        let n = self.nodes.len();
        let mut in_degree: Vec<usize> = (0..n).map(|id| self.preds[id].len()).collect();

        let mut ready = BinaryHeap::new();
        for (id, &degree) in in_degree.iter().enumerate() {
            if degree == 0 {
                ready.push(Reverse(id));
            }
        }

        let mut order = Vec::with_capacity(n);
        while let Some(Reverse(id)) = ready.pop() {
            order.push(id);
            for &next in &self.succs[id] {
                in_degree[next] -= 1;
                if in_degree[next] == 0 {
                    ready.push(Reverse(next));
                }
            }
        }

        debug_assert_eq!(order.len(), n, "action graph must be acyclic");
        order
    }
}

/// How Install obtains an artifact when a spec declares both download
/// and build primitives.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum InstallPolicy {
    /// Prefer a prebuilt artifact whenever the spec offers one.
    #[default]
    PreferDownload,
    /// Build from source even when a download is available.
    PreferBuild,
}

/// Expands requests into a cumulative action graph.
///
/// One resolver serves a whole plan: feeding every request through the
/// same instance is what dedups shared sub-builds across requests.
pub struct Resolver<'a> {
    specs: &'a SpecRepo,
    policy: InstallPolicy,
    graph: ActionGraph,
    stack: Vec<(RequestKind, String)>,
}

impl<'a> Resolver<'a> {
    pub fn new(specs: &'a SpecRepo) -> Self {
        Self::with_policy(specs, InstallPolicy::default())
    }

    pub fn with_policy(specs: &'a SpecRepo, policy: InstallPolicy) -> Self {
        Self {
            specs,
            policy,
            graph: ActionGraph::new(),
            stack: Vec::new(),
        }
    }

    /// Expand one top-level request for one target platform.
    ///
    /// On error the whole resolution is abandoned; the graph must not be
    /// used for a schedule afterwards.
    pub fn resolve(
        &mut self,
        request: &ActionRequest,
        platform: &str,
    ) -> Result<(), ResolveError> {
        match request.kind {
            RequestKind::Build => self.resolve_build(&request.package, platform)?,
            RequestKind::Install => self.resolve_install(&request.package, platform)?,
            RequestKind::Test => self.resolve_test(&request.package, platform)?,
            RequestKind::Download => self.resolve_download(&request.package, platform)?,
        };
        debug_assert!(self.stack.is_empty());
        Ok(())
    }

    /// The schedule so far: every node, topologically ordered.
    pub fn schedule(&self) -> Vec<ResolvedAction> {
        self.graph
            .topo_order()
            .into_iter()
            .map(|id| self.graph.node(id).clone())
            .collect()
    }

    pub fn graph(&self) -> &ActionGraph {
        &self.graph
    }

    pub fn finish(self) -> (Vec<ResolvedAction>, ActionGraph) {
        (self.schedule(), self.graph)
    }

    /// Cycle guard: revisiting a (kind, package) pair already being
    /// expanded on the current path is a fatal configuration error.
    fn enter(&mut self, kind: RequestKind, package: &str) -> Result<(), ResolveError> {
        let key = (kind, package.to_string());
        if let Some(pos) = self.stack.iter().position(|k| *k == key) {
            let mut cycle: Vec<String> = self.stack[pos..]
                .iter()
                .map(|(k, p)| format!("{} {}", k, p))
                .collect();
            cycle.push(format!("{} {}", kind, package));
            return Err(ResolveError::CyclicDependency(cycle));
        }
        self.stack.push(key);
        Ok(())
    }

    fn leave(&mut self) {
        self.stack.pop();
    }

    fn resolve_build(&mut self, package: &str, platform: &str) -> Result<usize, ResolveError> {
        let action = ResolvedAction::build(package, platform);
        if let Some(id) = self.graph.find(&action) {
            return Ok(id);
        }
        self.enter(RequestKind::Build, package)?;

        let spec = self.specs.lookup(package)?;
        if !spec.has_primitive(Primitive::Build) {
            return Err(ResolveError::NoSuchPrimitive {
                package: package.to_string(),
                primitive: Primitive::Build.to_string(),
            });
        }

        let mut before = Vec::new();
        for dep in spec.dependencies(Primitive::Build) {
            before.push(self.resolve_build(dep, platform)?);
        }

        let id = self.graph.insert(action);
        for dep_id in before {
            self.graph.add_edge(dep_id, id);
        }
        self.leave();
        Ok(id)
    }

    fn resolve_install(&mut self, package: &str, platform: &str) -> Result<usize, ResolveError> {
        let action = ResolvedAction::install(package, platform);
        if let Some(id) = self.graph.find(&action) {
            return Ok(id);
        }
        self.enter(RequestKind::Install, package)?;

        let spec = self.specs.lookup(package)?;

        let mut before = Vec::new();
        for dep in spec.dependencies(Primitive::Install) {
            before.push(self.resolve_install(dep, platform)?);
        }

        // Under the default policy a prebuilt artifact wins over building
        // from source whenever the spec makes a download available.
        let use_download = match self.policy {
            InstallPolicy::PreferDownload => spec.has_primitive(Primitive::Download),
            InstallPolicy::PreferBuild => {
                !spec.has_primitive(Primitive::Build) && spec.has_primitive(Primitive::Download)
            }
        };
        let provider = if use_download {
            self.graph
                .insert(ResolvedAction::download_binary(package, platform))
        } else if spec.has_primitive(Primitive::Build) {
            self.resolve_build(package, platform)?
        } else {
            return Err(ResolveError::NoBinaryAndNoBuild(package.to_string()));
        };
        before.push(provider);

        let id = self.graph.insert(action);
        for dep_id in before {
            self.graph.add_edge(dep_id, id);
        }
        self.leave();
        Ok(id)
    }

    fn resolve_test(&mut self, package: &str, platform: &str) -> Result<usize, ResolveError> {
        let action = ResolvedAction::test(package, platform);
        if let Some(id) = self.graph.find(&action) {
            return Ok(id);
        }
        self.enter(RequestKind::Test, package)?;

        let spec = self.specs.lookup(package)?;
        if !spec.has_primitive(Primitive::Test) {
            return Err(ResolveError::NoSuchPrimitive {
                package: package.to_string(),
                primitive: Primitive::Test.to_string(),
            });
        }

        let mut before = Vec::new();
        for source in &spec.source_packages {
            before.push(self.resolve_source(source));
        }
        for dep in spec.dependencies(Primitive::Test) {
            before.push(self.resolve_install(dep, platform)?);
        }

        let id = self.graph.insert(action);
        for dep_id in before {
            self.graph.add_edge(dep_id, id);
        }
        self.leave();
        Ok(id)
    }

    fn resolve_download(&mut self, package: &str, platform: &str) -> Result<usize, ResolveError> {
        let spec = self.specs.lookup(package)?;
        if !spec.has_primitive(Primitive::Download) {
            return Err(ResolveError::NoDownloadPrimitive(package.to_string()));
        }
        Ok(self
            .graph
            .insert(ResolvedAction::download_binary(package, platform)))
    }

    /// Source packages contribute a fixed download → checkout → install
    /// chain; the returned node is the tail the consumer depends on.
    fn resolve_source(&mut self, package: &str) -> usize {
        let download = self
            .graph
            .insert(ResolvedAction::download_source(package));
        let get = self.graph.insert(ResolvedAction::get_source(package));
        let install = self.graph.insert(ResolvedAction::install_source(package));
        self.graph.add_edge(download, get);
        self.graph.add_edge(get, install);
        install
    }
}

/// One-shot resolution of a single request against a fresh graph.
pub fn resolve_request(
    specs: &SpecRepo,
    request: &ActionRequest,
    platform: &str,
) -> Result<(Vec<ResolvedAction>, ActionGraph), ResolveError> {
    let mut resolver = Resolver::new(specs);
    resolver.resolve(request, platform)?;
    Ok(resolver.finish())
}
