//! DFA → Rust scanner module generation.
//!
//! For each rule automaton the generated module contains:
//! - `fn dfa_<id>(state, c) -> StateId`: a `match` over states, each arm a
//!   `match` over the symbol with single-symbol arms, range arms and one
//!   default arm for the "other" column
//! - `static ACCEPT_<id>: [bool; N]`: accept flags indexed by state
//!
//! plus `families()`, which assembles every family once, and `start()`,
//! which opens a scanner on family 0.
//!
//! The dispatcher that replaces `NN_FUN` in user code is generated here too:
//! a closure that loops on `advance()` and runs the action of each rule,
//! pushing or popping frames around actions as the rule file directs.
//!
//! Like the rest of the generator, code is written into one `String` and
//! parsed into a `TokenStream` once.

use std::fmt::Write;

use nex_runtime::Family;
use proc_macro2::TokenStream;
use thiserror::Error;

use super::{partition::Segment, ActionId, Dfa, StateId, DEAD_STATE};
use crate::rules::{Effect, Rule, RuleSet};

/// Placeholder in user code replaced by the dispatch closure.
pub const DISPATCH_PLACEHOLDER: &str = "NN_FUN";

/// Error from emitting Rust for a rule set.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodegenError {
    #[error("package name `{0}` is not a valid Rust identifier")]
    InvalidPackage(String),
    #[error("rule {rule} (line {line}): action is not a valid Rust block: {message}")]
    InvalidAction { rule: ActionId, line: usize, message: String },
}

// ══════════════════════════════════════════════════════════════════════════════
// Primary API
// ══════════════════════════════════════════════════════════════════════════════

/// Generate the scanner module for `rule_set`.
///
/// `families[f]` must hold the automata of family `f` in declaration order.
pub fn generate_scanner_module(
    rule_set: &RuleSet,
    families: &[Family<Dfa>],
) -> Result<TokenStream, CodegenError> {
    let buf = generate_scanner_string(rule_set, families)?;
    Ok(buf
        .parse::<TokenStream>()
        .expect("generated scanner code must be valid Rust"))
}

/// Generate the scanner module as a `String`.
pub fn generate_scanner_string(
    rule_set: &RuleSet,
    families: &[Family<Dfa>],
) -> Result<String, CodegenError> {
    if syn::parse_str::<syn::Ident>(&rule_set.package).is_err() {
        return Err(CodegenError::InvalidPackage(rule_set.package.clone()));
    }

    let estimated_size = 1024
        + families
            .iter()
            .flat_map(|f| f.automata.iter())
            .map(|dfa| dfa.states.len() * (dfa.alphabet.len() + 1) * 24)
            .sum::<usize>();
    let mut buf = String::with_capacity(estimated_size);

    buf.push_str("use ::nex_runtime::{DEAD_STATE, Family, Scanner, StateId, StaticDfa};");

    for dfa in families.iter().flat_map(|f| f.automata.iter()) {
        write_step_fn(&mut buf, dfa);
        write_accept_table(&mut buf, dfa);
    }
    write_families_fn(&mut buf, families);
    write_start_fn(&mut buf);

    Ok(buf)
}

/// Generate the dispatch closure that replaces `NN_FUN`.
///
/// Every action is checked to be a Rust block; the closure is built from
/// the checked text.
pub fn generate_dispatch(rule_set: &RuleSet) -> Result<TokenStream, CodegenError> {
    let mut buf = String::with_capacity(256 + rule_set.rules.len() * 64);
    buf.push_str(
        "|nn: &mut ::nex_runtime::Scanner<'_, ::nex_runtime::StaticDfa>| { \
         let mut nn_done = false; \
         while !nn_done { match nn.advance() {",
    );
    for rule in &rule_set.rules {
        write_action_arm(&mut buf, rule)?;
    }
    buf.push_str("_ => unreachable!(\"action id outside the rule set\"), } } }");

    Ok(buf
        .parse::<TokenStream>()
        .expect("dispatch closure built from validated blocks must be valid Rust"))
}

/// User code with every `NN_FUN` replaced by the dispatch closure, or `None`
/// when the rule file carries no user code.
///
/// Actions are validated even when there is no user code to expand.
pub fn expand_user_code(rule_set: &RuleSet) -> Result<Option<String>, CodegenError> {
    let dispatch = generate_dispatch(rule_set)?;
    let Some(user_code) = &rule_set.user_code else {
        return Ok(None);
    };
    Ok(Some(user_code.replace(DISPATCH_PLACEHOLDER, &format!("({})", dispatch))))
}

// ══════════════════════════════════════════════════════════════════════════════
// Writers
// ══════════════════════════════════════════════════════════════════════════════

fn write_step_fn(buf: &mut String, dfa: &Dfa) {
    write!(buf, "fn dfa_{}(state: StateId, c: char) -> StateId {{ match state {{", dfa.action)
        .unwrap();
    for (id, state) in dfa.states.iter().enumerate() {
        write!(buf, "{}u32 => match c {{", id).unwrap();
        for (segment, &target) in dfa.alphabet.segments.iter().zip(&state.transitions) {
            // The default arm already covers targets equal to "other".
            if target == state.other {
                continue;
            }
            let Some((lo, hi)) = char_bounds(segment) else {
                continue;
            };
            if lo == hi {
                write!(buf, "{} => {},", char_literal(lo), state_literal(target)).unwrap();
            } else {
                write!(
                    buf,
                    "{}..={} => {},",
                    char_literal(lo),
                    char_literal(hi),
                    state_literal(target)
                )
                .unwrap();
            }
        }
        write!(buf, "_ => {}, }},", state_literal(state.other)).unwrap();
    }
    buf.push_str("_ => DEAD_STATE, } }");
}

fn write_accept_table(buf: &mut String, dfa: &Dfa) {
    write!(buf, "static ACCEPT_{}: [bool; {}] = [", dfa.action, dfa.states.len()).unwrap();
    for state in &dfa.states {
        buf.push_str(if state.accept { "true," } else { "false," });
    }
    buf.push_str("];");
}

fn write_families_fn(buf: &mut String, families: &[Family<Dfa>]) {
    buf.push_str(
        "pub fn families() -> &'static [Family<StaticDfa>] { \
         static FAMILIES: ::std::sync::OnceLock<Vec<Family<StaticDfa>>> = ::std::sync::OnceLock::new(); \
         FAMILIES.get_or_init(|| vec![",
    );
    for family in families {
        write!(buf, "Family::new({}usize, vec![", family.id).unwrap();
        for dfa in &family.automata {
            write!(
                buf,
                "StaticDfa {{ action: {id}usize, accept: &ACCEPT_{id}, step: dfa_{id} }},",
                id = dfa.action
            )
            .unwrap();
        }
        write!(buf, "], {}usize),", family.end_action).unwrap();
    }
    buf.push_str("]) }");
}

fn write_start_fn(buf: &mut String) {
    buf.push_str(
        "pub fn start<'f, I>(input: I) -> Scanner<'f, StaticDfa> \
         where I: IntoIterator<Item = char>, I::IntoIter: 'f { \
         Scanner::start(families(), input) }",
    );
}

fn write_action_arm(buf: &mut String, rule: &Rule) -> Result<(), CodegenError> {
    write!(buf, "{}usize => {{", rule.id).unwrap();
    match rule.effect {
        Effect::Push(family) => write!(buf, "nn.push({}usize);", family).unwrap(),
        Effect::Pop => buf.push_str("nn.pop();"),
        Effect::Stop => buf.push_str("nn_done = true;"),
        Effect::None => {},
    }
    if !rule.action.is_empty() {
        if let Err(err) = syn::parse_str::<syn::Block>(&rule.action) {
            return Err(CodegenError::InvalidAction {
                rule: rule.id,
                line: rule.line,
                message: err.to_string(),
            });
        }
        buf.push_str(&rule.action);
    }
    buf.push_str("}");
    Ok(())
}

// ══════════════════════════════════════════════════════════════════════════════
// Literals
// ══════════════════════════════════════════════════════════════════════════════

/// The valid `char` bounds of a segment. Segments may straddle the
/// surrogate gap; one lying wholly inside it has no symbols.
fn char_bounds(segment: &Segment) -> Option<(char, char)> {
    let lo = (segment.lo..=segment.hi).find_map(char::from_u32)?;
    let hi = (segment.lo..=segment.hi).rev().find_map(char::from_u32)?;
    Some((lo, hi))
}

fn char_literal(c: char) -> String {
    if c.is_ascii_alphanumeric() {
        format!("'{}'", c)
    } else {
        format!("'\\u{{{:x}}}'", c as u32)
    }
}

fn state_literal(state: StateId) -> String {
    if state == DEAD_STATE {
        "DEAD_STATE".to_string()
    } else {
        format!("{}u32", state)
    }
}
