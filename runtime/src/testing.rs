//! Hand-built automata for exercising frames without the generator.

use crate::automaton::{ActionId, Automaton, Family, StateId, DEAD_STATE};

/// Recognizes exactly one literal string; state `i` means `i` symbols matched.
#[derive(Debug, Clone)]
pub struct LiteralDfa {
    symbols: Vec<char>,
    action: ActionId,
}

impl LiteralDfa {
    pub fn new(literal: &str, action: ActionId) -> Self {
        LiteralDfa { symbols: literal.chars().collect(), action }
    }
}

impl Automaton for LiteralDfa {
    fn step(&self, state: StateId, c: char) -> StateId {
        match self.symbols.get(state as usize) {
            Some(&expected) if expected == c => state + 1,
            _ => DEAD_STATE,
        }
    }

    fn is_accepting(&self, state: StateId) -> bool {
        state as usize == self.symbols.len()
    }

    fn action(&self) -> ActionId {
        self.action
    }
}

/// A family of literal automata whose action ids start at `first_action`.
pub fn literal_family_from(
    id: usize,
    literals: &[&str],
    first_action: ActionId,
    end_action: ActionId,
) -> Family<LiteralDfa> {
    let automata = literals
        .iter()
        .enumerate()
        .map(|(i, lit)| LiteralDfa::new(lit, first_action + i))
        .collect();
    Family::new(id, automata, end_action)
}

/// A family of literal automata whose action ids equal their index.
pub fn literal_family(id: usize, literals: &[&str], end_action: ActionId) -> Family<LiteralDfa> {
    literal_family_from(id, literals, 0, end_action)
}
