//! Level annotation and critical-path tracking over an [`Aig`].

use petgraph::prelude::*;
use petgraph::visit::Topo;

use crate::aig::{Aig, AigNode};

/// Cached levels and critical-path membership for every node of an [`Aig`].
///
/// Primary inputs and the constant sit at level 0 and an AND gate at
/// `1 + max` over its fanin nodes, so a node's level is the longest path
/// from the inputs measured in gates. The circuit depth is the maximum
/// level over primary-output drivers, and a node is on the critical path
/// iff some input-to-output path of that length passes through it.
///
/// The cache is a snapshot: it reflects the graph as of the last
/// [`DepthMap::update`] and must be refreshed after any mutation before
/// its queries are trusted again.
pub struct DepthMap {
    level: Vec<u32>,
    critical: Vec<bool>,
    depth: u32,
}

impl DepthMap {
    /// Compute levels and critical-path flags for the current graph.
    #[must_use]
    pub fn compute(aig: &Aig) -> Self {
        let mut map = Self {
            level: Vec::new(),
            critical: Vec::new(),
            depth: 0,
        };
        map.update(aig);
        map
    }

    /// Recompute the whole cache from scratch.
    pub fn update(&mut self, aig: &Aig) {
        let bound = aig.node_bound();
        self.level = vec![0; bound];
        self.critical = vec![false; bound];

        let mut topo = Topo::new(aig.graph());
        while let Some(n) = topo.next(aig.graph()) {
            match aig.graph()[n] {
                AigNode::Zero | AigNode::Input(_) => {}
                AigNode::And => {
                    if let Some((f0, f1)) = aig.try_unwrap_and(n) {
                        let l0 = self.level[f0.node().index()];
                        let l1 = self.level[f1.node().index()];
                        self.level[n.index()] = l0.max(l1) + 1;
                    }
                }
                AigNode::Output(_) => {
                    self.level[n.index()] = self.level[aig.output_driver(n).node().index()];
                }
            }
        }

        self.depth = aig
            .outputs()
            .iter()
            .map(|output| self.level[aig.output_driver(*output).node().index()])
            .max()
            .unwrap_or(0);

        // Walk down from the deepest output drivers; criticality continues
        // through exactly the fanins one level below their gate.
        let mut stack = aig
            .outputs()
            .iter()
            .map(|output| aig.output_driver(*output).node())
            .filter(|driver| self.level[driver.index()] == self.depth)
            .collect::<Vec<_>>();
        while let Some(n) = stack.pop() {
            if self.critical[n.index()] {
                continue;
            }
            self.critical[n.index()] = true;
            if let Some((f0, f1)) = aig.try_unwrap_and(n) {
                for fanin in [f0, f1] {
                    if self.level[fanin.node().index()] + 1 == self.level[n.index()] {
                        stack.push(fanin.node());
                    }
                }
            }
        }
    }

    /// The cached level of `n`.
    #[must_use]
    pub fn level(&self, n: NodeIndex) -> u32 {
        self.level[n.index()]
    }

    /// Whether `n` lies on some longest input-to-output path.
    #[must_use]
    pub fn is_on_critical_path(&self, n: NodeIndex) -> bool {
        self.critical[n.index()]
    }

    /// The maximum level over primary-output drivers.
    #[must_use]
    pub const fn depth(&self) -> u32 {
        self.depth
    }
}
