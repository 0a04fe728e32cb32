//! Automata infrastructure for scanner generation.
//!
//! Provides NFA/DFA types and the per-rule compilation pipeline:
//! `Pattern -> NFA -> Alphabet -> DFA -> Codegen`

pub mod codegen;
pub mod nfa;
pub mod partition;
pub mod regex;
pub mod subset;

use serde::Serialize;

pub use nex_runtime::{ActionId, StateId, DEAD_STATE, START_STATE};

use partition::Alphabet;

/// Identifier for an NFA node. Scoped to one rule's construction.
pub type NodeId = u32;

/// A bracket class: a set of inclusive code-point intervals, optionally negated.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize)]
pub struct RuneClass {
    pub ranges: Vec<(char, char)>,
    pub negated: bool,
}

impl RuneClass {
    /// Whether `code` falls inside one of the intervals (negation not applied).
    pub fn contains(&self, code: u32) -> bool {
        self.ranges
            .iter()
            .any(|&(lo, hi)| lo as u32 <= code && code <= hi as u32)
    }

    /// Whether the class matches `code` once negation is applied.
    #[inline]
    pub fn matches(&self, code: u32) -> bool {
        self.negated != self.contains(code)
    }
}

/// Label of an NFA edge.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub enum EdgeKind {
    /// Consumes nothing.
    Epsilon,
    /// Exactly one code point.
    Rune(char),
    /// Any code point (`.`).
    Wild,
    /// A bracket class.
    Class(RuneClass),
}

impl EdgeKind {
    /// Whether this edge consumes `code`. Epsilon edges never do.
    pub fn matches(&self, code: u32) -> bool {
        match self {
            EdgeKind::Epsilon => false,
            EdgeKind::Rune(r) => *r as u32 == code,
            EdgeKind::Wild => true,
            EdgeKind::Class(class) => class.matches(code),
        }
    }
}

/// An outgoing edge. Owned by its source node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Edge {
    pub kind: EdgeKind,
    pub target: NodeId,
}

/// NFA node with an ordered list of outgoing edges.
#[derive(Debug, Clone, Default, Serialize)]
pub struct NfaNode {
    pub edges: Vec<Edge>,
    pub accept: bool,
}

/// An arena of NFA nodes addressed by dense index.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Nfa {
    pub nodes: Vec<NfaNode>,
    pub start: NodeId,
}

/// An NFA fragment (sub-automaton) with designated start and end nodes.
/// Used during Thompson's construction to build up the NFA incrementally.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NfaFragment {
    pub start: NodeId,
    pub end: NodeId,
}

/// DFA state: one canonical epsilon-closed subset of NFA nodes.
#[derive(Debug, Clone, Serialize)]
pub struct DfaState {
    /// Dense transition table: `transitions[segment] = target_state`.
    /// `DEAD_STATE` means the empty subset.
    pub transitions: Vec<StateId>,
    /// Transition for code points outside every alphabet segment.
    pub other: StateId,
    pub accept: bool,
    /// The NFA nodes this state stands for, sorted ascending.
    pub nodes: Vec<NodeId>,
}

/// The finished automaton of one rule.
#[derive(Debug, Clone, Serialize)]
pub struct Dfa {
    pub states: Vec<DfaState>,
    pub alphabet: Alphabet,
    /// Global id of the rule this automaton recognizes.
    pub action: ActionId,
}

impl Dfa {
    /// Transition lookup for a single input symbol.
    #[inline]
    pub fn transition(&self, state: StateId, c: char) -> StateId {
        let row = &self.states[state as usize];
        match self.alphabet.segment_of(c as u32) {
            Some(segment) => row.transitions[segment],
            None => row.other,
        }
    }

    /// Run the automaton over `input` from the start state; true if it ends accepting.
    pub fn accepts(&self, input: &str) -> bool {
        let mut state = START_STATE;
        for c in input.chars() {
            state = self.transition(state, c);
            if state == DEAD_STATE {
                return false;
            }
        }
        self.states[state as usize].accept
    }

    pub fn num_states(&self) -> usize {
        self.states.len()
    }
}

impl nex_runtime::Automaton for Dfa {
    #[inline]
    fn step(&self, state: StateId, c: char) -> StateId {
        self.transition(state, c)
    }

    #[inline]
    fn is_accepting(&self, state: StateId) -> bool {
        self.states[state as usize].accept
    }

    #[inline]
    fn action(&self) -> ActionId {
        self.action
    }
}
