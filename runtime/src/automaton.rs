//! Automaton trait and family bundle shared by compiled and generated scanners.

/// Identifier for a DFA state within one rule's automaton.
pub type StateId = u32;

/// Identifier for a rule's action (global rule id across all families).
pub type ActionId = usize;

/// Every automaton starts in state 0.
pub const START_STATE: StateId = 0;

/// A sentinel value representing the dead state (the empty NFA subset).
pub const DEAD_STATE: StateId = u32::MAX;

/// A deterministic automaton recognizing one rule's pattern.
///
/// Implemented by the in-memory tables built by `nex-lexgen` and by the
/// `StaticDfa` tables emitted into generated modules.
pub trait Automaton {
    /// Next state after reading `c` in `state`. Returns `DEAD_STATE` when
    /// no continuation of the current prefix can match.
    fn step(&self, state: StateId, c: char) -> StateId;

    /// Whether `state` accepts.
    fn is_accepting(&self, state: StateId) -> bool;

    /// Action fired when this automaton wins the arbitration.
    fn action(&self) -> ActionId;
}

impl<A: Automaton + ?Sized> Automaton for &A {
    #[inline]
    fn step(&self, state: StateId, c: char) -> StateId {
        (**self).step(state, c)
    }

    #[inline]
    fn is_accepting(&self, state: StateId) -> bool {
        (**self).is_accepting(state)
    }

    #[inline]
    fn action(&self) -> ActionId {
        (**self).action()
    }
}

/// Table form used by generated modules.
///
/// The transition function is emitted as a `match` over states and symbols;
/// accept flags are a `static` slice indexed by state.
#[derive(Debug, Clone, Copy)]
pub struct StaticDfa {
    pub action: ActionId,
    pub accept: &'static [bool],
    pub step: fn(StateId, char) -> StateId,
}

impl Automaton for StaticDfa {
    #[inline]
    fn step(&self, state: StateId, c: char) -> StateId {
        (self.step)(state, c)
    }

    #[inline]
    fn is_accepting(&self, state: StateId) -> bool {
        self.accept[state as usize]
    }

    #[inline]
    fn action(&self) -> ActionId {
        self.action
    }
}

/// The automata active in one scanning context.
///
/// `automata` is index-aligned with rule declaration order inside the
/// context; a lower index wins ties.
#[derive(Debug, Clone)]
pub struct Family<A> {
    pub id: usize,
    pub automata: Vec<A>,
    pub end_action: ActionId,
}

impl<A: Automaton> Family<A> {
    pub fn new(id: usize, automata: Vec<A>, end_action: ActionId) -> Self {
        Family { id, automata, end_action }
    }

    pub fn len(&self) -> usize {
        self.automata.len()
    }

    pub fn is_empty(&self) -> bool {
        self.automata.is_empty()
    }
}
