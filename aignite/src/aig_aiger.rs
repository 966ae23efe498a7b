//! Reading and writing AIGER files.

use std::io;
use std::path::Path;

use petgraph::visit::Topo;
use thiserror::Error;

use crate::aig::{Aig, AigNode, Signal};

/// Error returned when reading an AIGER file fails.
#[derive(Debug, Error)]
pub enum AigerReadError {
    /// The file could not be opened or read.
    #[error("io error: {0}")]
    Io(#[from] io::Error),

    /// The AIGER data itself is malformed.
    #[error("aiger parse error: {0}")]
    Parse(String),

    /// The file is valid AIGER but uses a feature outside this crate's
    /// combinational scope.
    #[error("unsupported aiger feature: {0}")]
    Unsupported(&'static str),
}

impl Aig {
    /// Read an AIGER file from a path.
    pub fn from_aiger_path<P: AsRef<Path>>(path: P) -> Result<Self, AigerReadError> {
        let file = std::fs::File::open(path)?;
        Self::from_aiger_reader(file)
    }

    /// Read an AIGER network.
    ///
    /// AND gates go through [`Aig::create_and`], so the network is strashed
    /// and constant-folded as it is read. Latches are rejected: the rewriter
    /// works on combinational networks only.
    pub fn from_aiger_reader<R: io::Read>(reader: R) -> Result<Self, AigerReadError> {
        let reader = aiger::Reader::from_reader(reader)
            .map_err(|e| AigerReadError::Parse(format!("{e:?}")))?;
        let header = reader.header();

        let mut aig = Self::new();
        let mut signal_of_var: Vec<Option<Signal>> = vec![None; header.m + 1];
        signal_of_var[0] = Some(aig.zero());
        let mut output_literals = Vec::new();

        for record in reader.records() {
            let record = record.map_err(|e| AigerReadError::Parse(format!("{e:?}")))?;
            match record {
                aiger::Aiger::Input(literal) => {
                    let signal = aig.add_input();
                    *var_slot(&mut signal_of_var, literal.0)? = Some(signal);
                }
                aiger::Aiger::Latch { .. } => {
                    return Err(AigerReadError::Unsupported("latches"));
                }
                aiger::Aiger::Output(literal) => {
                    // Outputs may name gates that are defined later.
                    output_literals.push(literal.0);
                }
                aiger::Aiger::AndGate { output, inputs } => {
                    let fanin0 = resolve(&signal_of_var, inputs[0].0)?;
                    let fanin1 = resolve(&signal_of_var, inputs[1].0)?;
                    let signal = aig.create_and(fanin0, fanin1);
                    *var_slot(&mut signal_of_var, output.0)? = Some(signal);
                }
                _ => {}
            }
        }

        for literal in output_literals {
            let driver = resolve(&signal_of_var, literal)?;
            aig.add_output(driver);
        }

        Ok(aig)
    }

    /// Write the network in the ASCII AIGER (`aag`) format.
    ///
    /// Live nodes are renumbered: inputs keep their creation order, AND
    /// gates follow in topological order, so fanins are always defined
    /// before their fanouts. Orphan gates are written too; run
    /// [`Aig::cleanup`] first to drop them.
    pub fn write_aag<W: io::Write>(&self, writer: &mut W) -> io::Result<()> {
        let mut var_of = vec![0usize; self.node_bound()];
        for (position, input) in self.inputs().iter().enumerate() {
            var_of[input.index()] = position + 1;
        }

        let mut gates = Vec::new();
        let mut topo = Topo::new(self.graph());
        while let Some(n) = topo.next(self.graph()) {
            if matches!(self.graph()[n], AigNode::And) {
                var_of[n.index()] = self.inputs().len() + gates.len() + 1;
                gates.push(n);
            }
        }

        let literal = |sig: Signal| 2 * var_of[sig.node().index()] + usize::from(sig.is_complemented());

        writeln!(
            writer,
            "aag {} {} 0 {} {}",
            self.inputs().len() + gates.len(),
            self.inputs().len(),
            self.outputs().len(),
            gates.len()
        )?;
        for input in self.inputs() {
            writeln!(writer, "{}", 2 * var_of[input.index()])?;
        }
        for output in self.outputs() {
            writeln!(writer, "{}", literal(self.output_driver(*output)))?;
        }
        for gate in gates {
            let (f0, f1) = self.try_unwrap_and(gate).expect("gate has two fanins");
            writeln!(
                writer,
                "{} {} {}",
                2 * var_of[gate.index()],
                literal(f0),
                literal(f1)
            )?;
        }
        Ok(())
    }
}

fn var_slot(
    signal_of_var: &mut [Option<Signal>],
    literal: usize,
) -> Result<&mut Option<Signal>, AigerReadError> {
    signal_of_var
        .get_mut(literal >> 1)
        .ok_or_else(|| AigerReadError::Parse(format!("literal {literal} out of range")))
}

fn resolve(signal_of_var: &[Option<Signal>], literal: usize) -> Result<Signal, AigerReadError> {
    let signal = signal_of_var
        .get(literal >> 1)
        .copied()
        .flatten()
        .ok_or_else(|| AigerReadError::Parse(format!("literal {literal} used before definition")))?;
    Ok(if literal & 1 == 1 { !signal } else { signal })
}
