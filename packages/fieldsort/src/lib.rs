//! Deterministic, cycle-aware field ordering for rendering unified records.
//!
//! When an evaluator unifies several partial declarations of one record,
//! the result has to be printed with its fields in *some* order. This
//! crate takes the observed precedence relationships between field labels
//! (declaration order, plus one field's value referencing another) and
//! produces a single reproducible total order: a valid topological order
//! whenever one exists, and a well-defined deterministic fallback when
//! genuine reference cycles make one impossible. The same logical edge
//! set always yields the same output, whatever order the edges were
//! inserted in.
//!
//! # Usage
//!
//! ```
//! use fieldsort::{GraphBuilder, StringInterner};
//!
//! let mut interner = StringInterner::new();
//! let (x, w) = (interner.label("x"), interner.label("w"));
//! let (z, y) = (interner.label("z"), interner.label("y"));
//!
//! let mut builder = GraphBuilder::new();
//! builder.add_chain(&[x, w]); // first operand's declaration order
//! builder.add_chain(&[z, y]); // second operand's declaration order
//! builder.add_edge(w, z); // unification boundary
//!
//! assert_eq!(builder.build().sort(&interner), vec![x, w, z, y]);
//! ```
//!
//! Graphs are cheap and single-use: build one per record being rendered,
//! sort it once, discard it. Nothing is shared between invocations, so
//! independent threads may each sort their own graph freely.

mod cycles;
mod graph;
mod label;
mod scc;
mod sort;

pub use cycles::Cycle;
pub use graph::{Graph, GraphBuilder, NodeIx};
pub use label::{FieldLabel, LabelResolver, NameToken, StringInterner};
pub use scc::Scc;
pub use sort::CycleBreaking;
