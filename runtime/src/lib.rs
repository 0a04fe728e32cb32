//! Runtime support for nex-generated scanners
//!
//! This crate provides:
//! - The `Automaton` trait every per-rule DFA implements
//! - `Family`: the automata active in one scanning context plus its end-of-input action
//! - `StaticDfa`: the table form emitted by the generator (plain `fn` + `static` slices)
//! - `Frame`: one scanning context running the longest-match algorithm
//! - `Scanner`: the frame stack handle (`start`, `advance`, `push`, `pop`, `text`)
//!
//! Scanning is single-threaded and pull-driven. The only suspension point is
//! pulling the next symbol out of the input iterator.

// Automaton trait, family bundle and the static table form
mod automaton;
pub use automaton::*;

// Longest-match arbitration over one family
mod frame;
pub use frame::{Frame, Match};

// Nested scanning contexts
mod scanner;
pub use scanner::Scanner;

#[cfg(test)]
mod testing;
