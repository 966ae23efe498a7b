//! The and-inverter graph container: nodes, complement-carrying edges,
//! structural hashing, and fanout substitution.

use std::collections::HashMap;
use std::ops::Not;

use itertools::Itertools;
use petgraph::prelude::*;
use petgraph::visit::{EdgeRef, NodeIndexable};

/// An edge descriptor: a node plus a complement bit.
///
/// A signal denotes either a node's function or its negation; negating a
/// signal flips the complement bit and nothing else, so it is free. Two
/// signals are equal only if both the node and the polarity match.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Signal {
    node: NodeIndex,
    complement: bool,
}

impl Signal {
    /// Build a signal from a node and a polarity.
    #[must_use]
    pub const fn new(node: NodeIndex, complement: bool) -> Self {
        Self { node, complement }
    }

    /// The node this signal refers to.
    #[must_use]
    pub const fn node(&self) -> NodeIndex {
        self.node
    }

    /// Whether the signal carries an inverter.
    #[must_use]
    pub const fn is_complemented(&self) -> bool {
        self.complement
    }
}

impl From<NodeIndex> for Signal {
    fn from(node: NodeIndex) -> Self {
        Self::new(node, false)
    }
}

impl Not for Signal {
    type Output = Self;

    fn not(mut self) -> Self::Output {
        self.complement = !self.complement;
        self
    }
}

/// An and-inverter graph node.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AigNode {
    /// The constant-zero node. Exactly one exists per graph.
    Zero,
    /// A primary input, carrying its input index.
    Input(u32),
    /// A primary output, carrying its output index. Its driver is the
    /// single incoming edge.
    Output(u32),
    /// A two-input AND gate. Its fanins are the two incoming edges.
    And,
}

/// An and-inverter graph.
///
/// Fanin edges run from the fanin node to the gate; the `bool` edge weight is
/// the complement bit of that edge. AND gates are structurally hashed, so
/// [`Aig::create_and`] over an already-known pair of signals returns the
/// existing gate.
pub struct Aig {
    graph: StableGraph<AigNode, bool, Directed>,
    zero: NodeIndex,
    inputs: Vec<NodeIndex>,
    outputs: Vec<NodeIndex>,
    strash: HashMap<(Signal, Signal), NodeIndex>,
}

impl Aig {
    /// Create an empty graph containing only the constant-zero node.
    #[must_use]
    pub fn new() -> Self {
        let mut graph = StableGraph::default();
        let zero = graph.add_node(AigNode::Zero);
        Self {
            graph,
            zero,
            inputs: Vec::new(),
            outputs: Vec::new(),
            strash: HashMap::new(),
        }
    }

    /// The underlying graph, for read-only traversal.
    #[must_use]
    pub const fn graph(&self) -> &StableGraph<AigNode, bool, Directed> {
        &self.graph
    }

    /// The constant-zero signal.
    #[must_use]
    pub fn zero(&self) -> Signal {
        Signal::from(self.zero)
    }

    /// The constant-one signal.
    #[must_use]
    pub fn one(&self) -> Signal {
        !self.zero()
    }

    /// Append a primary input, returning its (non-complemented) signal.
    pub fn add_input(&mut self) -> Signal {
        let index = u32::try_from(self.inputs.len()).expect("input count fits in u32");
        let node = self.graph.add_node(AigNode::Input(index));
        self.inputs.push(node);
        Signal::from(node)
    }

    /// Append a primary output driven by `driver`.
    pub fn add_output(&mut self, driver: Signal) -> NodeIndex {
        let index = u32::try_from(self.outputs.len()).expect("output count fits in u32");
        let node = self.graph.add_node(AigNode::Output(index));
        self.graph.add_edge(driver.node(), node, driver.is_complemented());
        self.outputs.push(node);
        node
    }

    /// The primary inputs, in creation order.
    #[must_use]
    pub fn inputs(&self) -> &[NodeIndex] {
        &self.inputs
    }

    /// The primary outputs, in creation order.
    #[must_use]
    pub fn outputs(&self) -> &[NodeIndex] {
        &self.outputs
    }

    /// The signal driving a primary output.
    #[must_use]
    pub fn output_driver(&self, output: NodeIndex) -> Signal {
        let edge = self
            .graph
            .edges_directed(output, Incoming)
            .next()
            .expect("output has a driver");
        Signal::new(edge.source(), *edge.weight())
    }

    /// Construct the AND of two signals, with structural hashing.
    ///
    /// The trivial cases `x · 0`, `x · 1`, `x · x` and `x · x'` fold without
    /// creating a gate, so the returned signal may be an existing node and
    /// may be complemented.
    pub fn create_and(&mut self, a: Signal, b: Signal) -> Signal {
        if a == self.one() {
            return b;
        }
        if b == self.one() {
            return a;
        }
        if a == self.zero() || b == self.zero() || a == !b {
            return self.zero();
        }
        if a == b {
            return a;
        }
        let key = Self::strash_key(a, b);
        if let Some(&node) = self.strash.get(&key) {
            return Signal::from(node);
        }
        let node = self.graph.add_node(AigNode::And);
        self.graph.add_edge(a.node(), node, a.is_complemented());
        self.graph.add_edge(b.node(), node, b.is_complemented());
        self.strash.insert(key, node);
        Signal::from(node)
    }

    /// Return the fanin signals of `n`, if `n` is an AND gate with exactly
    /// two fanin edges.
    #[must_use]
    pub fn try_unwrap_and(&self, n: NodeIndex) -> Option<(Signal, Signal)> {
        if !matches!(self.graph.node_weight(n), Some(AigNode::And)) {
            return None;
        }
        let (e0, e1) = self.graph.edges_directed(n, Incoming).collect_tuple()?;
        Some((
            Signal::new(e0.source(), *e0.weight()),
            Signal::new(e1.source(), *e1.weight()),
        ))
    }

    /// Every current AND gate, in ascending node-index order.
    #[must_use]
    pub fn gates(&self) -> Vec<NodeIndex> {
        self.graph
            .node_indices()
            .filter(|n| matches!(self.graph[*n], AigNode::And))
            .collect()
    }

    /// The number of AND gates in the graph.
    #[must_use]
    pub fn gate_count(&self) -> usize {
        self.graph
            .node_indices()
            .filter(|n| matches!(self.graph[*n], AigNode::And))
            .count()
    }

    /// The number of nodes of all kinds in the graph.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// An upper bound on node indices, for sizing side tables.
    #[must_use]
    pub fn node_bound(&self) -> usize {
        self.graph.node_bound()
    }

    /// Redirect every fanout edge of `old` to `new_signal`.
    ///
    /// The complement of `new_signal` composes XOR-wise with each redirected
    /// edge's own complement. `old` keeps its fanins and may be left as an
    /// orphan; [`Aig::cleanup`] sweeps those. Substituting a node for a
    /// signal of itself is a no-op.
    pub fn substitute_node(&mut self, old: NodeIndex, new_signal: Signal) {
        if new_signal.node() == old {
            return;
        }
        let mut fanouts = self.graph.neighbors_directed(old, Outgoing).detach();
        while let Some((edge, fanout)) = fanouts.next(&self.graph) {
            if let Some(key) = self.strash_key_of(fanout) {
                if self.strash.get(&key) == Some(&fanout) {
                    self.strash.remove(&key);
                }
            }
            let complement = self.graph.remove_edge(edge).unwrap();
            self.graph.add_edge(
                new_signal.node(),
                fanout,
                complement ^ new_signal.is_complemented(),
            );
            if let Some(key) = self.strash_key_of(fanout) {
                self.strash.entry(key).or_insert(fanout);
            }
        }
    }

    /// Garbage-collect orphan gates (ANDs not connected to any output),
    /// returning how many nodes were removed.
    pub fn cleanup(&mut self) -> usize {
        let before = self.graph.node_count();
        let mut did_something = true;
        while did_something {
            did_something = false;
            let indices = self.graph.node_indices().collect::<Vec<_>>();
            for node in indices {
                if !matches!(self.graph[node], AigNode::And) {
                    continue;
                }
                if self.graph.neighbors_directed(node, Outgoing).count() == 0 {
                    if let Some(key) = self.strash_key_of(node) {
                        if self.strash.get(&key) == Some(&node) {
                            self.strash.remove(&key);
                        }
                    }
                    self.graph.remove_node(node);
                    did_something = true;
                }
            }
        }
        let removed = before - self.graph.node_count();
        eprintln!("GC: removed {removed} nodes");
        removed
    }

    // Strash keys are fanin pairs in ascending signal order, so that operand
    // order never splits a class.
    fn strash_key(a: Signal, b: Signal) -> (Signal, Signal) {
        if b < a {
            (b, a)
        } else {
            (a, b)
        }
    }

    fn strash_key_of(&self, n: NodeIndex) -> Option<(Signal, Signal)> {
        let (a, b) = self.try_unwrap_and(n)?;
        Some(Self::strash_key(a, b))
    }
}

impl Default for Aig {
    fn default() -> Self {
        Self::new()
    }
}
