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

//! Resolving a build description into a build graph.
//!
//! A build description is a flat list of [`Rule`]s, each naming the product
//! it belongs to. Resolving turns that list into a [`BuildGraph`]: a
//! bipartite DAG of resource nodes and task nodes, validated to be free of
//! cycles and of resources produced by more than one task.

use std::cmp::Reverse;
use std::collections::{BTreeSet, BinaryHeap, HashMap, HashSet};
use std::fmt;

use crate::graph::{
    Algo, Edges, Graph, Indexable, Neighbors, NodeIndex, Nodes, Subgraph,
};
use crate::res;
use crate::rules::{ProductDecl, Rule, Rules};
use crate::task;

/// A node in the build graph.
#[derive(Clone, Ord, Eq, PartialOrd, PartialEq, Hash, Debug)]
pub enum Node {
    /// An artifact: a file or directory, either a source the user maintains
    /// or an output some task produces.
    Resource(res::Any),

    /// A transformer: a task instantiated from a rule.
    Task(task::List),
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Node::Resource(x) => write!(f, "({})", x),
            Node::Task(x) => write!(f, "[{}]", x),
        }
    }
}

/// An edge in the build graph.
#[derive(Clone, Copy, Ord, Eq, PartialOrd, PartialEq, Hash, Debug)]
pub enum Edge {
    /// An explicit edge is one that is user-defined in the build
    /// description. That is, it is *explicitly* declared.
    Explicit,

    /// An implicit edge is one that is automatically determined after the
    /// task is executed. That is, it is *implicitly* discovered. Tasks, when
    /// executed, return resources that are read from or written to. The
    /// edges associated with these resources are then implicit. It is
    /// usually the case that, for every implicit edge, there is an
    /// equivalent explicit edge.
    Implicit,
}

/// A named group of rules that a user can ask to build by name (e.g.,
/// `button build mylib`).
#[derive(Debug, Clone)]
pub struct Product {
    pub name: String,

    /// Indices into the `Rules` this product was resolved from.
    pub rules: Vec<usize>,

    /// File-tags this product is ultimately responsible for producing.
    /// Empty unless the build description declared a matching
    /// `rules::ProductDecl`.
    pub target_tags: BTreeSet<String>,

    /// Names of the other products this one depends on.
    pub dependencies: Vec<String>,
}

/// Owns every product known to a build description.
#[derive(Debug, Clone, Default)]
pub struct Project {
    pub products: Vec<Product>,
}

impl Project {
    pub fn find(&self, name: &str) -> Option<&Product> {
        self.products.iter().find(|p| p.name == name)
    }
}

/// The concrete build graph type: a bipartite graph of resources and tasks.
pub type BuildGraph = Graph<Node, Edge>;

/// A single strongly connected component of size > 1, i.e., a cycle.
pub type Cycle = Vec<NodeIndex>;

const CYCLE_EXPLANATION: &str = "\
Cycles in the build graph cause incorrect builds and are strictly forbidden.
Please edit the build description to remove the cycle(s) listed above.";

/// One or more cycles were detected while resolving the rule graph.
pub struct CyclesError {
    pub graph: BuildGraph,
    pub cycles: Vec<Cycle>,
}

impl fmt::Display for CyclesError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{} cycle(s) detected in the build graph...\n",
            self.cycles.len()
        )?;

        for (i, cycle) in self.cycles.iter().enumerate() {
            writeln!(f, "Cycle {}", i + 1)?;

            // The nodes in a cycle come back from Tarjan's algorithm in
            // reverse topological order.
            let mut it =
                cycle.iter().rev().map(|&index| self.graph.node_from_index(index));

            let first = it.next().expect("a cycle always has at least one node");

            writeln!(f, "    {}", first)?;

            for node in it {
                writeln!(f, " -> {}", node)?;
            }

            writeln!(f, " -> {}", first)?;
        }

        write!(f, "\n{}", CYCLE_EXPLANATION)
    }
}

impl fmt::Debug for CyclesError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self)
    }
}

/// A resource produced by more than one task.
#[derive(Debug, Ord, PartialOrd, Eq, PartialEq, Hash)]
pub struct Race {
    pub node: res::Any,
    pub count: usize,
}

impl fmt::Display for Race {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (output of {} tasks)", self.node, self.count)
    }
}

const RACE_EXPLANATION: &str = "\
Race conditions in the build graph cause incorrect incremental builds and are
strictly forbidden. The resources listed above are the output of more than one
task. Depending on the order in which the tasks are executed, one task will
overwrite the output of the other. Please edit the build description to fix
the race condition(s).";

/// One or more resources were found to be generated by more than one task.
pub struct RaceError {
    pub races: Vec<Race>,
}

impl fmt::Display for RaceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{} race condition(s) detected in the build graph:\n",
            self.races.len()
        )?;

        for race in &self.races {
            writeln!(f, " - {}", race)?;
        }

        write!(f, "\n{}", RACE_EXPLANATION)
    }
}

/// Errors that can occur while resolving a build description into a build
/// graph.
#[derive(Fail, Debug)]
pub enum Error {
    /// A product was declared (referenced by name) but no rule contributes
    /// any artifacts to it.
    #[fail(display = "product {:?} has no rules and produces nothing", _0)]
    ProductWithoutProducts(String),

    /// The same artifact is produced by more than one transformer.
    #[fail(display = "{}", _0)]
    DuplicateGeneratedArtifact(RaceError),

    /// The rule graph contains one or more cycles.
    #[fail(display = "{}", _0)]
    CyclicRuleGraph(CyclesError),

    /// A product declares a dependency on a name not present among the
    /// resolved project's products.
    #[fail(
        display = "product {:?} depends on undefined product {:?}",
        _0, _1
    )]
    UnresolvedDependency(String, String),

    /// The rule graph -- the DAG over rules induced by `input_tags`/
    /// `output_tags` intersections -- contains a cycle, so
    /// `topological_sort(roots)` cannot produce a rule application order.
    #[fail(
        display = "cycle detected in the rule graph (by file-tag) across \
                    rule indices {:?}",
        _0
    )]
    CyclicRuleTagGraph(Vec<usize>),

    /// A non-multiplex rule's primary inputs and outputs don't pair up
    /// 1-to-1, so per-input transformer instantiation is ambiguous.
    #[fail(
        display = "rule in product {:?} has multiplex=false but {} input(s) \
                    and {} output(s); these must be equal so each input \
                    pairs with exactly one output",
        _0, _1, _2
    )]
    PerInputOutputMismatch(Option<String>, usize, usize),
}

impl fmt::Debug for RaceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self)
    }
}

/// Constructs `Self` from a flat list of rules, checking the invariants that
/// must hold for any build graph: no cycles, no duplicate generated
/// artifacts, and every named product actually has rules.
pub trait FromRules: Sized {
    fn from_rules(rules: Rules) -> Result<Self, Error>;
}

impl FromRules for BuildGraph {
    fn from_rules(rules: Rules) -> Result<BuildGraph, Error> {
        let (graph, project) = build(rules)?;

        for product in &project.products {
            if product.rules.is_empty() {
                return Err(Error::ProductWithoutProducts(product.name.clone()));
            }
        }

        let graph = check_races(graph)?;
        let graph = check_cycles(graph)?;

        Ok(graph)
    }
}

/// Builds the rule graph (spec.md #3's "Rule graph"): an edge `a -> b`
/// whenever some `output_tags` entry of rule `a` is also in rule `b`'s
/// `input_tags`. Rules that declare no tags participate in no edges --
/// their ordering is governed entirely by their position in `rules`.
fn rule_graph_edges(rules: &[Rule]) -> Vec<(usize, usize)> {
    let mut edges = Vec::new();

    for (a, ra) in rules.iter().enumerate() {
        if ra.output_tags.is_empty() {
            continue;
        }

        for (b, rb) in rules.iter().enumerate() {
            if a == b || rb.input_tags.is_empty() {
                continue;
            }

            if !ra.output_tags.is_disjoint(&rb.input_tags) {
                edges.push((a, b));
            }
        }
    }

    edges
}

/// Determines which rules are needed and in what order to apply them.
///
/// Implements spec.md #3/#4.1: `topological_sort(roots)`, where roots are
/// the rules of a product whose `output_tags` intersect that product's
/// declared `target_tags`. A rule belonging to a product that never
/// declared `target_tags` (including every rule, when the build
/// description declares no products at all) is unconditionally part of the
/// working set -- the tag-driven reachability restriction only applies once
/// a product opts into it.
fn rule_order(
    rules: &[Rule],
    products: &[ProductDecl],
    product_rules: &HashMap<String, Vec<usize>>,
) -> Result<Vec<usize>, Error> {
    let edges = rule_graph_edges(rules);

    let mut successors: Vec<Vec<usize>> = vec![Vec::new(); rules.len()];
    let mut predecessors: Vec<Vec<usize>> = vec![Vec::new(); rules.len()];

    for (a, b) in edges {
        successors[a].push(b);
        predecessors[b].push(a);
    }

    let decl_by_name: HashMap<&str, &ProductDecl> =
        products.iter().map(|p| (p.name.as_str(), p)).collect();

    let mut working: BTreeSet<usize> = BTreeSet::new();

    for (index, rule) in rules.iter().enumerate() {
        let restricted = rule
            .product
            .as_ref()
            .and_then(|name| decl_by_name.get(name.as_str()))
            .map_or(false, |decl| !decl.target_tags.is_empty());

        if !restricted {
            working.insert(index);
        }
    }

    // Products that opted into target-tag filtering pull in the
    // transitive predecessor closure of their tag-matching roots.
    for decl in products {
        if decl.target_tags.is_empty() {
            continue;
        }

        let own_rules = product_rules
            .get(&decl.name)
            .map(Vec::as_slice)
            .unwrap_or(&[]);

        let mut stack: Vec<usize> = own_rules
            .iter()
            .copied()
            .filter(|&i| !rules[i].output_tags.is_disjoint(&decl.target_tags))
            .collect();

        while let Some(index) = stack.pop() {
            if working.insert(index) {
                for &pred in &predecessors[index] {
                    stack.push(pred);
                }
            }
        }
    }

    // Kahn's algorithm restricted to `working`; ties are broken by
    // ascending original index so an edgeless rule graph (the common case
    // when no tags are declared at all) reproduces plain file order.
    let mut in_degree: HashMap<usize, usize> = working
        .iter()
        .map(|&i| {
            let count =
                predecessors[i].iter().filter(|p| working.contains(p)).count();
            (i, count)
        })
        .collect();

    let mut ready: BinaryHeap<Reverse<usize>> = in_degree
        .iter()
        .filter(|(_, &degree)| degree == 0)
        .map(|(&i, _)| Reverse(i))
        .collect();

    let mut order = Vec::with_capacity(working.len());

    while let Some(Reverse(index)) = ready.pop() {
        order.push(index);

        for &next in &successors[index] {
            if !working.contains(&next) {
                continue;
            }

            let degree = in_degree.get_mut(&next).expect("successor is in working set");
            *degree -= 1;

            if *degree == 0 {
                ready.push(Reverse(next));
            }
        }
    }

    if order.len() != working.len() {
        let done: HashSet<usize> = order.iter().copied().collect();
        let remaining: Vec<usize> =
            working.into_iter().filter(|i| !done.contains(i)).collect();
        return Err(Error::CyclicRuleTagGraph(remaining));
    }

    Ok(order)
}

/// Wires one transformer (task node) into the graph, connecting its
/// primary/auxiliary/order-only inputs and its outputs.
fn add_transformer(
    g: &mut BuildGraph,
    primary_inputs: impl Iterator<Item = res::Any>,
    aux_inputs: impl Iterator<Item = res::Any>,
    order_only: impl Iterator<Item = res::Any>,
    outputs: impl Iterator<Item = res::Any>,
    tasks: task::List,
) {
    let task = g.add_node(Node::Task(tasks));

    for r in primary_inputs.chain(aux_inputs).chain(order_only) {
        let node = g.add_node(Node::Resource(r));
        g.add_edge(node, task, Edge::Explicit);
    }

    for r in outputs {
        let node = g.add_node(Node::Resource(r));
        g.add_edge(task, node, Edge::Explicit);
    }
}

/// Applies a single rule, implementing its multiplex-vs-per-input
/// cardinality (spec.md #3's "cardinality flag"). A multiplex rule (the
/// default) becomes one transformer consuming every primary input; a
/// per-input rule becomes one transformer per primary input, paired
/// positionally with `outputs` (both are iterated in `res::Set`'s sorted
/// order, since there is no per-input output-path templating here).
fn apply_rule(g: &mut BuildGraph, rule: &Rule) -> Result<(), Error> {
    if rule.multiplex {
        add_transformer(
            g,
            rule.inputs.iter().cloned(),
            rule.aux_inputs.iter().cloned(),
            rule.order_only.iter().cloned(),
            rule.outputs.iter().cloned(),
            rule.tasks.clone(),
        );

        return Ok(());
    }

    if rule.inputs.len() != rule.outputs.len() {
        return Err(Error::PerInputOutputMismatch(
            rule.product.clone(),
            rule.inputs.len(),
            rule.outputs.len(),
        ));
    }

    for (input, output) in rule.inputs.iter().zip(rule.outputs.iter()) {
        add_transformer(
            g,
            std::iter::once(input.clone()),
            rule.aux_inputs.iter().cloned(),
            rule.order_only.iter().cloned(),
            std::iter::once(output.clone()),
            rule.tasks.clone(),
        );
    }

    Ok(())
}

fn build(rules: Rules) -> Result<(BuildGraph, Project), Error> {
    let Rules {
        rules: rules_list,
        products: decls,
    } = rules;

    let mut product_rules: HashMap<String, Vec<usize>> = HashMap::new();

    for (index, rule) in rules_list.iter().enumerate() {
        if let Some(name) = &rule.product {
            product_rules.entry(name.clone()).or_default().push(index);
        }
    }

    let decl_names: HashSet<&str> = decls.iter().map(|p| p.name.as_str()).collect();

    for decl in &decls {
        for dep in &decl.dependencies {
            if !decl_names.contains(dep.as_str()) {
                return Err(Error::UnresolvedDependency(
                    decl.name.clone(),
                    dep.clone(),
                ));
            }
        }
    }

    let order = rule_order(&rules_list, &decls, &product_rules)?;

    let mut g = BuildGraph::new();

    for index in order {
        apply_rule(&mut g, &rules_list[index])?;
    }

    let decl_by_name: HashMap<&str, &ProductDecl> =
        decls.iter().map(|p| (p.name.as_str(), p)).collect();

    let mut names: Vec<String> = product_rules.keys().cloned().collect();
    for decl in &decls {
        if !product_rules.contains_key(&decl.name) {
            names.push(decl.name.clone());
        }
    }
    names.sort();

    let products = names
        .into_iter()
        .map(|name| {
            let decl = decl_by_name.get(name.as_str());
            Product {
                rules: product_rules.get(&name).cloned().unwrap_or_default(),
                target_tags: decl.map_or_else(BTreeSet::new, |d| d.target_tags.clone()),
                dependencies: decl.map_or_else(Vec::new, |d| d.dependencies.clone()),
                name,
            }
        })
        .collect();

    Ok((g, Project { products }))
}

/// Checks for race conditions in the graph. That is, if any resource node
/// has two or more incoming edges. In such a case, depending on the order in
/// which the producing tasks get executed, one task's output will clobber
/// the other's.
fn check_races(graph: BuildGraph) -> Result<BuildGraph, Error> {
    let mut races = Vec::new();

    for index in graph.nodes() {
        if let Node::Resource(r) = graph.node_from_index(index) {
            let incoming = graph.incoming(index).count();

            if incoming > 1 {
                races.push(Race {
                    node: r.clone(),
                    count: incoming,
                });
            }
        }
    }

    if races.is_empty() {
        Ok(graph)
    } else {
        races.sort();
        Err(Error::DuplicateGeneratedArtifact(RaceError { races }))
    }
}

/// Checks for cycles in the graph using Tarjan's algorithm for finding
/// strongly connected components.
fn check_cycles(graph: BuildGraph) -> Result<BuildGraph, Error> {
    let cycles: Vec<Cycle> = graph
        .tarjan_scc()
        .into_iter()
        .filter(|scc| scc.len() > 1)
        .collect();

    if cycles.is_empty() {
        Ok(graph)
    } else {
        Err(Error::CyclicRuleGraph(CyclesError { graph, cycles }))
    }
}

/// Extension methods on [`BuildGraph`] that don't belong on the generic
/// graph traits.
pub trait BuildGraphExt<'a> {
    /// Returns a view of the graph containing only explicit edges. Used to
    /// diff the persisted graph against a freshly-resolved one: implicit
    /// (discovered) edges shouldn't cause nodes to be considered added or
    /// removed.
    fn explicit_subgraph(&'a self) -> Subgraph<'a, BuildGraph>;
}

impl<'a> BuildGraphExt<'a> for BuildGraph {
    fn explicit_subgraph(&'a self) -> Subgraph<'a, BuildGraph> {
        let nodes = self.nodes();

        let edges = self.edges().filter(|&edge| {
            let (_, weight) = self.edge_from_index(edge);
            *weight == Edge::Explicit
        });

        Subgraph::with_edges(self, nodes, edges)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::res::File;

    fn rules(data: &str) -> Rules {
        Rules::from_str(data).unwrap()
    }

    #[test]
    fn test_good_graph() {
        let data = r#"[
        {
            "inputs": ["foo.c", "foo.h"],
            "tasks": [
                {
                    "type": "command",
                    "program": "gcc",
                    "args": ["-c", "foo.c", "-o", "foo.o"]
                }
            ],
            "outputs": ["foo.o"]
        },
        {
            "inputs": ["bar.c", "foo.h"],
            "tasks": [
                {
                    "type": "command",
                    "program": "gcc",
                    "args": ["-c", "bar.c", "-o", "bar.o"]
                }
            ],
            "outputs": ["bar.o"]
        },
        {
            "inputs": ["foo.o", "bar.o"],
            "tasks": [
                {
                    "type": "command",
                    "program": "gcc",
                    "args": ["foo.o", "bar.o", "-o", "foobar"]
                }
            ],
            "outputs": ["foobar"]
        }
        ]"#;

        assert!(BuildGraph::from_rules(rules(data)).is_ok());
    }

    #[test]
    fn test_races() {
        let data = r#"[
        {
            "inputs": ["foo.c"],
            "tasks": [{"type": "command", "program": "gcc", "args": ["foo.c"]}],
            "outputs": ["foo.o", "bar.o"]
        },
        {
            "inputs": ["bar.c"],
            "tasks": [{"type": "command", "program": "gcc", "args": ["bar.c"]}],
            "outputs": ["bar.o", "foo.o"]
        }
        ]"#;

        let result = BuildGraph::from_rules(rules(data));

        match result {
            Err(Error::DuplicateGeneratedArtifact(err)) => {
                assert_eq!(err.races.len(), 2);
            }
            _ => panic!("expected a DuplicateGeneratedArtifact error"),
        }

        let _ = File::from("foo.o");
    }

    #[test]
    fn test_cycles() {
        let data = r#"[
        {
            "inputs": ["foo.c"],
            "tasks": [{"type": "command", "program": "gcc", "args": ["foo.c"]}],
            "outputs": ["foo.o", "foo.c"]
        },
        {
            "inputs": ["foo.o"],
            "tasks": [{"type": "command", "program": "gcc", "args": ["foo.o"]}],
            "outputs": ["foobar"]
        }
        ]"#;

        let result = BuildGraph::from_rules(rules(data));

        match result {
            Err(Error::CyclicRuleGraph(err)) => assert_eq!(err.cycles.len(), 1),
            _ => panic!("expected a CyclicRuleGraph error"),
        }
    }

    #[test]
    fn test_product_without_products() {
        let data = r#"[
        {
            "inputs": [],
            "tasks": [],
            "outputs": [],
            "product": "empty"
        }
        ]"#;

        // A product is only considered "without products" if no rule
        // resolved for it at all; here the rule itself has no outputs,
        // which is a degenerate but distinct case we still accept.
        assert!(BuildGraph::from_rules(rules(data)).is_ok());
    }

    #[test]
    fn test_product_declared_but_unreferenced_is_without_products() {
        let data = r#"{
            "rules": [],
            "products": [{"name": "app"}]
        }"#;

        match BuildGraph::from_rules(rules(data)) {
            Err(Error::ProductWithoutProducts(name)) => assert_eq!(name, "app"),
            other => panic!("expected ProductWithoutProducts, got {:?}", other),
        }
    }

    #[test]
    fn test_unresolved_dependency() {
        let data = r#"{
            "rules": [{
                "inputs": [], "outputs": [], "tasks": [], "product": "app"
            }],
            "products": [{"name": "app", "dependencies": ["lib"]}]
        }"#;

        match BuildGraph::from_rules(rules(data)) {
            Err(Error::UnresolvedDependency(product, dep)) => {
                assert_eq!(product, "app");
                assert_eq!(dep, "lib");
            }
            other => panic!("expected UnresolvedDependency, got {:?}", other),
        }
    }

    #[test]
    fn test_tag_restricted_product_skips_unrelated_rules() {
        // Only the rule whose output_tags intersect "app"'s target_tags (and
        // its transitive predecessors) are applied; the unrelated "docs"
        // rule is dropped from the working set entirely.
        let data = r#"{
            "rules": [
                {
                    "inputs": ["foo.c"],
                    "outputs": ["foo.o"],
                    "tasks": [{"type": "command", "program": "gcc", "args": ["foo.c"]}],
                    "product": "app",
                    "output_tags": ["obj"]
                },
                {
                    "inputs": ["foo.o"],
                    "outputs": ["app.bin"],
                    "tasks": [{"type": "command", "program": "ld", "args": ["foo.o"]}],
                    "product": "app",
                    "input_tags": ["obj"],
                    "output_tags": ["bin"]
                },
                {
                    "inputs": ["README.md"],
                    "outputs": ["README.html"],
                    "tasks": [{"type": "command", "program": "md2html", "args": []}],
                    "product": "docs",
                    "output_tags": ["html"]
                }
            ],
            "products": [
                {"name": "app", "target_tags": ["bin"]},
                {"name": "docs"}
            ]
        }"#;

        let graph = BuildGraph::from_rules(rules(data)).unwrap();

        let readme = res::Any::from(File::from("README.md"));
        assert!(!graph.nodes().any(|i| match graph.node_from_index(i) {
            Node::Resource(r) => *r == readme,
            _ => false,
        }));

        let binary = res::Any::from(File::from("app.bin"));
        assert!(graph.nodes().any(|i| match graph.node_from_index(i) {
            Node::Resource(r) => *r == binary,
            _ => false,
        }));
    }

    #[test]
    fn test_per_input_rule_pairs_inputs_and_outputs_positionally() {
        let data = r#"[
        {
            "inputs": ["a.txt", "b.txt"],
            "outputs": ["a.out", "b.out"],
            "tasks": [{"type": "command", "program": "cp", "args": []}],
            "multiplex": false
        }
        ]"#;

        let graph = BuildGraph::from_rules(rules(data)).unwrap();

        // Each input/output pair is wired through its own task node, so
        // there are two task nodes rather than one.
        let task_count =
            graph.nodes().filter(|&i| matches!(graph.node_from_index(i), Node::Task(_))).count();
        assert_eq!(task_count, 2);
    }

    #[test]
    fn test_per_input_rule_rejects_mismatched_cardinality() {
        let data = r#"[
        {
            "inputs": ["a.txt", "b.txt"],
            "outputs": ["a.out"],
            "tasks": [{"type": "command", "program": "cp", "args": []}],
            "multiplex": false
        }
        ]"#;

        match BuildGraph::from_rules(rules(data)) {
            Err(Error::PerInputOutputMismatch(_, inputs, outputs)) => {
                assert_eq!(inputs, 2);
                assert_eq!(outputs, 1);
            }
            other => panic!("expected PerInputOutputMismatch, got {:?}", other),
        }
    }

    #[test]
    fn test_cyclic_rule_tag_graph_is_rejected() {
        let data = r#"[
        {
            "inputs": ["a"], "outputs": ["b"],
            "tasks": [{"type": "command", "program": "x", "args": []}],
            "input_tags": ["t2"], "output_tags": ["t1"]
        },
        {
            "inputs": ["b"], "outputs": ["a"],
            "tasks": [{"type": "command", "program": "y", "args": []}],
            "input_tags": ["t1"], "output_tags": ["t2"]
        }
        ]"#;

        match BuildGraph::from_rules(rules(data)) {
            Err(Error::CyclicRuleTagGraph(remaining)) => {
                assert_eq!(remaining.len(), 2);
            }
            other => panic!("expected CyclicRuleTagGraph, got {:?}", other),
        }
    }
}
