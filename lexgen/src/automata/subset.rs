//! Subset construction: NFA → DFA conversion.
//!
//! Implements the powerset construction over the rule's alphabet:
//! 1. The epsilon-closure of the NFA start node is DFA state 0
//! 2. For each unprocessed DFA state and each alphabet segment, collect the
//!    NFA nodes reachable by one matching edge, close them under epsilon, and
//!    map the resulting subset to its canonical DFA state
//! 3. One more transition per state covers "other" code points
//!
//! Canonical states are keyed by their sorted node subset, so two different
//! paths that reach the same subset always land on the same state id. The
//! empty subset is never a state; it maps to `DEAD_STATE`.

use std::collections::HashMap;

use super::{
    nfa::epsilon_closure, partition::Alphabet, ActionId, Dfa, DfaState, EdgeKind, Nfa, NodeId,
    StateId, DEAD_STATE,
};

/// Canonical-state table for one rule: node subset → DFA state id.
///
/// States are numbered in creation order; the first interned subset is the
/// start state.
#[derive(Debug, Default)]
pub struct StateTable {
    ids: HashMap<Vec<NodeId>, StateId>,
    subsets: Vec<Vec<NodeId>>,
}

impl StateTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up `subset`, creating a new state if it is unseen.
    /// Returns `(id, created)`.
    pub fn intern(&mut self, subset: Vec<NodeId>) -> (StateId, bool) {
        if let Some(&id) = self.ids.get(&subset) {
            return (id, false);
        }
        let id = self.subsets.len() as StateId;
        self.subsets.push(subset.clone());
        self.ids.insert(subset, id);
        (id, true)
    }

    pub fn get(&self, subset: &[NodeId]) -> Option<StateId> {
        self.ids.get(subset).copied()
    }

    pub fn subset(&self, id: StateId) -> &[NodeId] {
        &self.subsets[id as usize]
    }

    pub fn len(&self) -> usize {
        self.subsets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subsets.is_empty()
    }
}

/// Convert a rule's NFA into a DFA over `alphabet`.
///
/// The resulting DFA has a dense row per state: one column per alphabet
/// segment plus the "other" column.
pub fn subset_construction(nfa: &Nfa, alphabet: &Alphabet, action: ActionId) -> Dfa {
    let mut table = StateTable::new();
    let mut rows: Vec<Option<(Vec<StateId>, StateId)>> = Vec::new();
    let mut worklist: Vec<StateId> = Vec::new();

    let (start, _) = table.intern(epsilon_closure(nfa, &[nfa.start]));
    rows.push(None);
    worklist.push(start);

    while let Some(current) = worklist.pop() {
        let subset = table.subset(current).to_vec();

        let mut transitions = Vec::with_capacity(alphabet.len());
        for segment in &alphabet.segments {
            let code = segment.representative();
            let target = step(nfa, &subset, |kind| kind.matches(code));
            transitions.push(resolve(nfa, &mut table, &mut rows, &mut worklist, target));
        }

        // "other": only wildcard and negated classes can take unmentioned code points.
        let target = step(nfa, &subset, |kind| match kind {
            EdgeKind::Wild => true,
            EdgeKind::Class(class) => class.negated,
            EdgeKind::Epsilon | EdgeKind::Rune(_) => false,
        });
        let other = resolve(nfa, &mut table, &mut rows, &mut worklist, target);

        rows[current as usize] = Some((transitions, other));
    }

    let states = rows
        .into_iter()
        .enumerate()
        .map(|(id, row)| {
            let (transitions, other) = row.expect("every interned state is processed");
            let nodes = table.subset(id as StateId).to_vec();
            let accept = nodes.iter().any(|&n| nfa.nodes[n as usize].accept);
            DfaState { transitions, other, accept, nodes }
        })
        .collect();

    Dfa { states, alphabet: alphabet.clone(), action }
}

/// NFA nodes reachable from `subset` by one edge whose label satisfies `takes`.
fn step(nfa: &Nfa, subset: &[NodeId], takes: impl Fn(&EdgeKind) -> bool) -> Vec<NodeId> {
    subset
        .iter()
        .flat_map(|&n| nfa.nodes[n as usize].edges.iter())
        .filter(|edge| edge.kind != EdgeKind::Epsilon && takes(&edge.kind))
        .map(|edge| edge.target)
        .collect()
}

/// Close `target` under epsilon and map it to its canonical state,
/// queueing newly created states.
fn resolve(
    nfa: &Nfa,
    table: &mut StateTable,
    rows: &mut Vec<Option<(Vec<StateId>, StateId)>>,
    worklist: &mut Vec<StateId>,
    target: Vec<NodeId>,
) -> StateId {
    if target.is_empty() {
        return DEAD_STATE;
    }
    let (id, created) = table.intern(epsilon_closure(nfa, &target));
    if created {
        rows.push(None);
        worklist.push(id);
    }
    id
}
