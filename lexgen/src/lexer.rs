//! Per-rule automaton pipeline.
//!
//! Each rule compiles independently:
//! 1. Parse the pattern into a Thompson NFA (start node 0)
//! 2. Partition the code points the pattern mentions into segments
//! 3. Convert NFA → DFA via subset construction over those segments
//!
//! Rules share nothing, so a rule set can compile its rules in any order or
//! in parallel. `materialize` then groups finished automata into families.

use nex_runtime::Family;
use tracing::debug;

use crate::automata::{
    partition::Alphabet, regex::compile_pattern, subset::subset_construction, ActionId, Dfa,
};
use crate::error::CompileError;
use crate::rules::Rule;

/// Statistics from compiling one rule (for diagnostics).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RuleStats {
    pub num_nfa_nodes: usize,
    pub num_segments: usize,
    pub num_dfa_states: usize,
}

/// Compile one rule's pattern into its automaton.
///
/// # Errors
///
/// `CompileError::Pattern` carrying the rule id and pattern text.
pub fn compile(rule: &Rule) -> Result<Dfa, CompileError> {
    compile_with_stats(rule).map(|(dfa, _)| dfa)
}

/// [`compile`], also reporting the size of each intermediate form.
pub fn compile_with_stats(rule: &Rule) -> Result<(Dfa, RuleStats), CompileError> {
    let nfa = compile_pattern(&rule.pattern).map_err(|source| CompileError::Pattern {
        rule: rule.id,
        line: rule.line,
        pattern: rule.pattern_text(),
        source,
    })?;
    let alphabet = Alphabet::from_intervals(&nfa.mentioned_intervals());
    let dfa = subset_construction(&nfa, &alphabet, rule.id);

    let stats = RuleStats {
        num_nfa_nodes: nfa.num_nodes(),
        num_segments: alphabet.len(),
        num_dfa_states: dfa.num_states(),
    };
    debug!(
        rule = rule.id,
        family = rule.family,
        nfa_nodes = stats.num_nfa_nodes,
        segments = stats.num_segments,
        dfa_states = stats.num_dfa_states,
        "compiled rule"
    );
    Ok((dfa, stats))
}

/// Bundle a family's automata, in declaration order, with its end action.
pub fn materialize(family_id: usize, automata: Vec<Dfa>, end_action: ActionId) -> Family<Dfa> {
    Family::new(family_id, automata, end_action)
}
