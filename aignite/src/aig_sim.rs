//! Word-parallel exhaustive simulation, the equivalence oracle for the
//! rewriting tests.

use std::ops::{BitAnd, Not};

use petgraph::visit::Topo;

use crate::aig::{Aig, AigNode, Signal};

// Truth table of input variable i over the low six variables of a pattern
// index; variables beyond the sixth select whole words instead.
const COFACTOR_MASKS: [u64; 6] = [
    0xaaaa_aaaa_aaaa_aaaa,
    0xcccc_cccc_cccc_cccc,
    0xf0f0_f0f0_f0f0_f0f0,
    0xff00_ff00_ff00_ff00,
    0xffff_0000_ffff_0000,
    0xffff_ffff_0000_0000,
];

/// A function of the primary inputs as a packed table of all `2^n`
/// evaluations, one bit per input assignment.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TruthTable {
    bits: usize,
    words: Vec<u64>,
}

impl TruthTable {
    fn word_count(bits: usize) -> usize {
        bits.div_ceil(64).max(1)
    }

    /// The constant-zero function over `num_inputs` variables.
    #[must_use]
    pub fn zeros(num_inputs: usize) -> Self {
        let bits = 1usize << num_inputs;
        Self {
            bits,
            words: vec![0; Self::word_count(bits)],
        }
    }

    /// The projection of input variable `var` over `num_inputs` variables:
    /// bit `p` is set iff bit `var` of the pattern index `p` is set.
    #[must_use]
    pub fn input_pattern(var: usize, num_inputs: usize) -> Self {
        assert!(var < num_inputs);
        let mut table = Self::zeros(num_inputs);
        if var < 6 {
            for word in &mut table.words {
                *word = COFACTOR_MASKS[var];
            }
        } else {
            for (index, word) in table.words.iter_mut().enumerate() {
                if index >> (var - 6) & 1 == 1 {
                    *word = u64::MAX;
                }
            }
        }
        table.mask_tail();
        table
    }

    /// Whether the function is true for the given pattern index.
    #[must_use]
    pub fn bit(&self, pattern: usize) -> bool {
        assert!(pattern < self.bits);
        self.words[pattern / 64] >> (pattern % 64) & 1 == 1
    }

    // Patterns beyond 2^n in the last word stay zero so that tables
    // compare equal bit-for-bit.
    fn mask_tail(&mut self) {
        let tail = self.bits % 64;
        if tail != 0 {
            let last = self.words.len() - 1;
            self.words[last] &= (1 << tail) - 1;
        }
    }
}

impl Not for TruthTable {
    type Output = Self;

    fn not(mut self) -> Self::Output {
        for word in &mut self.words {
            *word = !*word;
        }
        self.mask_tail();
        self
    }
}

impl BitAnd for TruthTable {
    type Output = Self;

    fn bitand(mut self, rhs: Self) -> Self::Output {
        assert_eq!(self.bits, rhs.bits);
        for (word, other) in self.words.iter_mut().zip(&rhs.words) {
            *word &= other;
        }
        self
    }
}

impl Aig {
    /// Evaluate every primary output over all assignments of the primary
    /// inputs, in output order.
    ///
    /// The cost is `2^n` in the input count; callers keep `n` small. This
    /// is the equivalence oracle used by the rewriting tests.
    #[must_use]
    pub fn simulate_exhaustive(&self) -> Vec<TruthTable> {
        let num_inputs = self.inputs().len();
        assert!(
            num_inputs <= 16,
            "exhaustive simulation is exponential in the input count"
        );

        let mut tables: Vec<Option<TruthTable>> = vec![None; self.node_bound()];
        let mut topo = Topo::new(self.graph());
        while let Some(n) = topo.next(self.graph()) {
            let table = match self.graph()[n] {
                AigNode::Zero => TruthTable::zeros(num_inputs),
                AigNode::Input(index) => TruthTable::input_pattern(index as usize, num_inputs),
                AigNode::And => {
                    let Some((f0, f1)) = self.try_unwrap_and(n) else {
                        continue;
                    };
                    resolve(&tables, f0) & resolve(&tables, f1)
                }
                AigNode::Output(_) => continue,
            };
            tables[n.index()] = Some(table);
        }

        self.outputs()
            .iter()
            .map(|output| resolve(&tables, self.output_driver(*output)))
            .collect()
    }
}

fn resolve(tables: &[Option<TruthTable>], sig: Signal) -> TruthTable {
    let table = tables[sig.node().index()]
        .clone()
        .expect("fanin simulated before its fanouts");
    if sig.is_complemented() {
        !table
    } else {
        table
    }
}
