//! Depth-reducing algebraic rewriting.
//!
//! Three identities are applied to gates on the critical path, each only
//! when it strictly reduces the level of the rewritten gate: associativity
//! across plain edges, De Morgan distributivity over a shared deep signal,
//! and a three-level distributivity that moves a deep OR operand down past
//! an AND.

use petgraph::prelude::*;

use crate::aig::{Aig, Signal};
use crate::aig_depth::DepthMap;

/// One collected fanin of a gate: its signal, node, and cached level.
struct Fanin {
    sig: Signal,
    node: NodeIndex,
    level: u32,
}

/// Depth-oriented algebraic rewriter.
///
/// Holds the network exclusively for the duration of [`Rewriter::run`],
/// together with the level cache the rules read. Every rule is a
/// predicate-with-effect: it either declines without touching the graph,
/// or performs its substitution and reports success, in which case the
/// driver refreshes the level cache before anything else runs.
pub struct Rewriter<'a> {
    aig: &'a mut Aig,
    depth: DepthMap,
}

impl<'a> Rewriter<'a> {
    /// Wrap a network together with a freshly computed level cache.
    pub fn new(aig: &'a mut Aig) -> Self {
        let depth = DepthMap::compute(aig);
        Self { aig, depth }
    }

    /// Run the rewrite loop to a fixed point.
    ///
    /// Each sweep visits every current gate in ascending index order. A
    /// successful rewrite restarts the sweep, since the substitution can
    /// shift critical-path membership anywhere in the graph. Returns the
    /// number of substitutions performed.
    pub fn run(&mut self) -> usize {
        let depth_before = self.depth.depth();
        let mut rewrites = 0;
        'sweep: loop {
            for n in self.aig.gates() {
                if self.try_algebraic_rules(n).is_some() {
                    self.depth.update(self.aig);
                    rewrites += 1;
                    continue 'sweep;
                }
            }
            break;
        }
        eprintln!(
            "rewrite: {rewrites} substitutions, depth {depth_before} -> {}",
            self.depth.depth()
        );
        rewrites
    }

    fn try_algebraic_rules(&mut self, n: NodeIndex) -> Option<()> {
        self.try_associativity(n)
            .or_else(|| self.try_distributivity(n))
            .or_else(|| self.try_three_level_distributivity(n))
    }

    /// Collect the two fanins of `n` with their levels, deeper fanin first.
    ///
    /// Ties keep the host's fanin order. Returns `None` for anything that
    /// is not an AND gate with exactly two fanins, which every rule treats
    /// as a pattern mismatch.
    fn ordered_fanins(&self, n: NodeIndex) -> Option<[Fanin; 2]> {
        let (s0, s1) = self.aig.try_unwrap_and(n)?;
        let mut fanins = [s0, s1].map(|sig| Fanin {
            sig,
            node: sig.node(),
            level: self.depth.level(sig.node()),
        });
        if fanins[1].level > fanins[0].level {
            fanins.swap(0, 1);
        }
        Some(fanins)
    }

    /// Transform `(g0 · g1) · c1` into `(c1 · g1) · g0` when `g0` is the
    /// deep input, so that `g0` rises one level towards the root.
    ///
    /// Only fires on a critical gate whose deep child is critical,
    /// uncomplemented and at least two levels above the shallow child; AND
    /// is not associative across an inverter, so a complemented child edge
    /// is left for the distributivity rules.
    fn try_associativity(&mut self, n: NodeIndex) -> Option<()> {
        if !self.depth.is_on_critical_path(n) {
            return None;
        }
        let children = self.ordered_fanins(n)?;
        if children[0].level - children[1].level < 2 {
            return None;
        }
        if !self.depth.is_on_critical_path(children[0].node)
            || self.depth.is_on_critical_path(children[1].node)
        {
            return None;
        }
        if children[0].sig.is_complemented() {
            return None;
        }
        let nephews = self.ordered_fanins(children[0].node)?;
        // Equal nephew levels leave no single deep grandchild to hoist.
        if nephews[0].level == nephews[1].level {
            return None;
        }

        let bottom = self.aig.create_and(children[1].sig, nephews[1].sig);
        let top = self.aig.create_and(bottom, nephews[0].sig);
        self.aig.substitute_node(n, top);
        Some(())
    }

    /// Transform `(s · a1)' · (s · b1)'` into `(s · (a1' · b1')')'`,
    /// pulling the shared critical signal `s` up by one level.
    fn try_distributivity(&mut self, n: NodeIndex) -> Option<()> {
        if !self.depth.is_on_critical_path(n) {
            return None;
        }
        let (c0, c1) = self.aig.try_unwrap_and(n)?;
        if !self.depth.is_on_critical_path(c0.node())
            || !self.depth.is_on_critical_path(c1.node())
        {
            return None;
        }
        if self.depth.level(c0.node()) == 0 || self.depth.level(c1.node()) == 0 {
            return None;
        }
        if !c0.is_complemented() || !c1.is_complemented() {
            return None;
        }
        let a = self.ordered_fanins(c0.node())?;
        if !self.depth.is_on_critical_path(a[0].node) || self.depth.is_on_critical_path(a[1].node)
        {
            return None;
        }
        let b = self.ordered_fanins(c1.node())?;
        if !self.depth.is_on_critical_path(b[0].node) || self.depth.is_on_critical_path(b[1].node)
        {
            return None;
        }
        // The shared signal must match exactly, polarity included. The level
        // comparison is implied by node identity with a coherent cache, but
        // it is kept as an extra guard.
        if a[0].sig != b[0].sig || a[0].level != b[0].level {
            return None;
        }

        let lower = self.aig.create_and(!a[1].sig, !b[1].sig);
        let top = self.aig.create_and(a[0].sig, !lower);
        self.aig.substitute_node(n, !top);
        Some(())
    }

    /// Transform `((g · x2)' · x3')' · x4` into
    /// `((g · (x2 · x4))' · (x3 · x4)')'`, shortening the path of a deep
    /// `g` buried two complemented levels down by one gate.
    fn try_three_level_distributivity(&mut self, n: NodeIndex) -> Option<()> {
        if !self.depth.is_on_critical_path(n) {
            return None;
        }
        let children = self.ordered_fanins(n)?;
        // The rebuilt cone puts three gates above x4; anything shallower
        // than that gap cannot win.
        if children[0].level - children[1].level < 3 {
            return None;
        }
        if !self.depth.is_on_critical_path(children[0].node)
            || self.depth.is_on_critical_path(children[1].node)
        {
            return None;
        }
        if !children[0].sig.is_complemented() {
            return None;
        }
        let nephews = self.ordered_fanins(children[0].node)?;
        if !nephews[0].sig.is_complemented() || !nephews[1].sig.is_complemented() {
            return None;
        }
        if !self.depth.is_on_critical_path(nephews[0].node)
            || self.depth.is_on_critical_path(nephews[1].node)
        {
            return None;
        }
        let grand_nephews = self.ordered_fanins(nephews[0].node)?;
        if self.depth.is_on_critical_path(grand_nephews[1].node) {
            return None;
        }

        // x4 = children[1], x3 = nephews[1]', x2 = grand_nephews[1],
        // g = grand_nephews[0].
        let x3_x4 = self.aig.create_and(!nephews[1].sig, children[1].sig);
        let x2_x4 = self.aig.create_and(grand_nephews[1].sig, children[1].sig);
        let g_x2x4 = self.aig.create_and(grand_nephews[0].sig, x2_x4);
        let top = self.aig.create_and(!g_x2x4, !x3_x4);
        self.aig.substitute_node(n, !top);
        Some(())
    }
}

/// Rewrite `aig` to a fixed point of the three depth-reducing identities,
/// returning the number of substitutions performed.
pub fn rewrite(aig: &mut Aig) -> usize {
    Rewriter::new(aig).run()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aig_sim::TruthTable;

    fn tables(aig: &Aig) -> Vec<TruthTable> {
        aig.simulate_exhaustive()
    }

    #[test]
    fn associativity_rebalances_a_left_deep_chain() {
        let mut aig = Aig::new();
        let a = aig.add_input();
        let b = aig.add_input();
        let c = aig.add_input();
        let d = aig.add_input();
        let e = aig.add_input();

        let ab = aig.create_and(a, b);
        let abc = aig.create_and(ab, c);
        let abcd = aig.create_and(abc, d);
        let abcde = aig.create_and(abcd, e);
        aig.add_output(abcde);

        assert_eq!(DepthMap::compute(&aig).depth(), 4);
        let before = tables(&aig);

        let rewrites = rewrite(&mut aig);

        assert!(rewrites >= 1);
        assert_eq!(DepthMap::compute(&aig).depth(), 3);
        assert_eq!(tables(&aig), before);
    }

    #[test]
    fn associativity_balances_a_longer_chain() {
        let mut aig = Aig::new();
        let inputs = (0..6).map(|_| aig.add_input()).collect::<Vec<_>>();
        let mut chain = inputs[0];
        for input in &inputs[1..] {
            chain = aig.create_and(chain, *input);
        }
        aig.add_output(chain);

        assert_eq!(DepthMap::compute(&aig).depth(), 5);
        let before = tables(&aig);

        let rewrites = rewrite(&mut aig);

        assert_eq!(rewrites, 2);
        assert_eq!(DepthMap::compute(&aig).depth(), 3);
        assert_eq!(tables(&aig), before);
    }

    #[test]
    fn distributivity_extracts_the_shared_critical_signal() {
        let mut aig = Aig::new();
        let u = aig.add_input();
        let v = aig.add_input();
        let p = aig.add_input();
        let q = aig.add_input();

        // s = u·v sits one level up; p and q are shallow, so the level gap
        // of 1 keeps associativity out of the way on both children.
        let s = aig.create_and(u, v);
        let sp = aig.create_and(s, p);
        let sq = aig.create_and(s, q);
        let n = aig.create_and(!sp, !sq);
        let output = aig.add_output(n);

        assert_eq!(DepthMap::compute(&aig).depth(), 3);
        let before = tables(&aig);

        let rewrites = rewrite(&mut aig);

        assert_eq!(rewrites, 1);
        assert_eq!(DepthMap::compute(&aig).depth(), 2);
        assert_eq!(tables(&aig), before);

        // The root became ((p'·q')' · s)', with s directly below it.
        let driver = aig.output_driver(output);
        assert!(driver.is_complemented());
        let (f0, f1) = aig.try_unwrap_and(driver.node()).unwrap();
        assert!(f0 == s || f1 == s);
    }

    #[test]
    fn associativity_preempts_distributivity_on_a_deeper_shared_signal() {
        let mut aig = Aig::new();
        let u = aig.add_input();
        let v = aig.add_input();
        let w = aig.add_input();
        let p = aig.add_input();
        let q = aig.add_input();

        // With s = (u·v)·w two levels above p and q, each child of the root
        // has a level gap of 2, so associativity rebalances s·p and s·q
        // before the distributivity pattern at the root ever matches.
        let uv = aig.create_and(u, v);
        let s = aig.create_and(uv, w);
        let sp = aig.create_and(s, p);
        let sq = aig.create_and(s, q);
        let n = aig.create_and(!sp, !sq);
        aig.add_output(n);

        assert_eq!(DepthMap::compute(&aig).depth(), 4);
        let before = tables(&aig);

        let rewrites = rewrite(&mut aig);

        assert_eq!(rewrites, 2);
        assert_eq!(DepthMap::compute(&aig).depth(), 3);
        assert_eq!(tables(&aig), before);
    }

    #[test]
    fn three_level_distributivity_shortens_a_deep_or_operand() {
        let mut aig = Aig::new();
        let ga = aig.add_input();
        let gb = aig.add_input();
        let x2 = aig.add_input();
        let x3 = aig.add_input();
        let x4 = aig.add_input();

        // ((g·x2) + x3) · x4 with the OR spelled as NAND-of-NANDs.
        let g = aig.create_and(ga, gb);
        let g_x2 = aig.create_and(g, x2);
        let or = aig.create_and(!g_x2, !x3);
        let n = aig.create_and(!or, x4);
        aig.add_output(n);

        assert_eq!(DepthMap::compute(&aig).depth(), 4);
        let before = tables(&aig);

        let rewrites = rewrite(&mut aig);

        assert_eq!(rewrites, 1);
        assert_eq!(DepthMap::compute(&aig).depth(), 3);
        assert_eq!(tables(&aig), before);
    }

    #[test]
    fn associativity_declines_on_a_shallow_level_gap() {
        let mut aig = Aig::new();
        let a = aig.add_input();
        let b = aig.add_input();
        let c = aig.add_input();

        let ab = aig.create_and(a, b);
        let n = aig.create_and(ab, c);
        aig.add_output(n);

        let nodes = aig.node_count();
        let rewrites = rewrite(&mut aig);

        assert_eq!(rewrites, 0);
        assert_eq!(aig.node_count(), nodes);
    }

    #[test]
    fn complemented_child_blocks_associativity() {
        let mut aig = Aig::new();
        let a = aig.add_input();
        let b = aig.add_input();
        let c = aig.add_input();
        let d = aig.add_input();

        // The deep child is two levels above c but enters complemented, and
        // only one side of the root is complemented, so nothing matches.
        let ab = aig.create_and(a, b);
        let abd = aig.create_and(ab, d);
        let n = aig.create_and(!abd, c);
        aig.add_output(n);

        assert_eq!(DepthMap::compute(&aig).depth(), 3);
        let nodes = aig.node_count();
        let rewrites = rewrite(&mut aig);

        assert_eq!(rewrites, 0);
        assert_eq!(aig.node_count(), nodes);
        assert_eq!(DepthMap::compute(&aig).depth(), 3);
    }

    #[test]
    fn balanced_tree_is_a_fixed_point() {
        let mut aig = Aig::new();
        let inputs = (0..8).map(|_| aig.add_input()).collect::<Vec<_>>();
        let mut layer = inputs;
        while layer.len() > 1 {
            layer = layer
                .chunks(2)
                .map(|pair| aig.create_and(pair[0], pair[1]))
                .collect();
        }
        aig.add_output(layer[0]);

        assert_eq!(DepthMap::compute(&aig).depth(), 3);
        let nodes = aig.node_count();

        assert_eq!(rewrite(&mut aig), 0);
        assert_eq!(aig.node_count(), nodes);
        assert_eq!(DepthMap::compute(&aig).depth(), 3);
    }

    #[test]
    fn rewriting_twice_reaches_the_same_fixed_point() {
        let mut aig = Aig::new();
        let a = aig.add_input();
        let b = aig.add_input();
        let c = aig.add_input();
        let d = aig.add_input();
        let e = aig.add_input();

        let ab = aig.create_and(a, b);
        let abc = aig.create_and(ab, c);
        let abcd = aig.create_and(abc, d);
        let abcde = aig.create_and(abcd, e);
        aig.add_output(abcde);

        assert!(rewrite(&mut aig) >= 1);
        let nodes = aig.node_count();
        let after_first = tables(&aig);

        assert_eq!(rewrite(&mut aig), 0);
        assert_eq!(aig.node_count(), nodes);
        assert_eq!(tables(&aig), after_first);
    }

    #[test]
    fn orphans_left_by_rewriting_are_sweepable() {
        let mut aig = Aig::new();
        let a = aig.add_input();
        let b = aig.add_input();
        let c = aig.add_input();
        let d = aig.add_input();
        let e = aig.add_input();

        let ab = aig.create_and(a, b);
        let abc = aig.create_and(ab, c);
        let abcd = aig.create_and(abc, d);
        let abcde = aig.create_and(abcd, e);
        aig.add_output(abcde);

        assert!(rewrite(&mut aig) >= 1);
        let before = tables(&aig);
        aig.cleanup();

        // Sweeping orphans never changes the function or the depth.
        assert_eq!(tables(&aig), before);
        assert_eq!(DepthMap::compute(&aig).depth(), 3);
    }
}
