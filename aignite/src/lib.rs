//! Utilities for working with and-inverter graphs.
//!
//! And-inverter graphs represent boolean logic as a network of two-input AND
//! gates whose edges may carry inverters (NOT gates). These two primitives are
//! enough to represent any logic function (i.e. they are universal), and the
//! representation is popular because the gates are so simple that structural
//! hashing makes sharing automatic: two ANDs over the same pair of signals are
//! always the same node.
//!
//! Because inversion lives on the edges rather than in the nodes, algebraic
//! identities over AIGs are sensitive to edge polarity. A two-input AND is
//! associative only across plain edges; once a complement is involved, the
//! useful rewrites come from De Morgan-style distributivity instead.
//!
//! An AND gate will be notated as `x · y`, and the inversion of `x` as `x'`.
//!
//! The rewriting pass in [`aig_transform`] applies three such identities to
//! gates on the critical path, with the single goal of reducing network depth:
//! - Associativity: `(g · c) · d = (d · c) · g`, applied when `g` is much
//!   deeper than its siblings so that it can rise towards the root.
//! - Distributivity: `(s · p)' · (s · q)' = (s · (p' · q')')'`, which pulls a
//!   shared deep signal `s` up by one level.
//! - Three-level distributivity: `((g · x2)' · x3')' · x4 =
//!   ((g · (x2 · x4))' · (x3 · x4)')'`, which shortens the path of a deep `g`
//!   buried under two complemented levels.

#![forbid(unsafe_code)]
#![warn(clippy::pedantic, clippy::nursery)]
#![warn(missing_docs)]

pub mod aig;
pub mod aig_aiger;
pub mod aig_depth;
pub mod aig_sim;
pub mod aig_transform;
