//! Tests for scanner module and dispatcher generation.
//!
//! Generated text is checked by parsing it back with `syn`; the dispatcher
//! is checked for the push/pop/stop wiring of each rule. Emitted step
//! functions are evaluated arm by arm and compared with the in-memory DFAs.

use std::collections::HashMap;

use proptest::prelude::*;

use crate::{
    automata::{
        codegen::{expand_user_code, generate_dispatch, generate_scanner_module, CodegenError},
        Dfa, StateId, DEAD_STATE,
    },
    compile_rule_set, generate, generate_from_source, parse_rule_file, CompileError,
    CompileOptions,
};

const NESTED: &str = "package strings\n\
                      /\"[^\"]*\"/ < { println!(\"string\"); }\n\
                      /[a-z]+/ { println!(\"word {}\", nn.text()); }\n\
                      > { println!(\"done\"); }\n\
                      /[0-9]+/ { }\n\
                      //\n\
                      fn main() { let mut nn = strings::start(\"a\".chars()); (NN_FUN)(&mut nn); }\n";

fn sequential() -> CompileOptions {
    CompileOptions { parallel: false, dump: None }
}

#[test]
fn test_scanner_module_is_valid_rust() {
    let module = generate_from_source(NESTED, &sequential()).expect("generates");
    let file = syn::parse_file(&module.scanner).expect("scanner module parses as a Rust file");

    let fns: Vec<String> = file
        .items
        .iter()
        .filter_map(|item| match item {
            syn::Item::Fn(f) => Some(f.sig.ident.to_string()),
            _ => None,
        })
        .collect();
    assert!(fns.contains(&"dfa_0".to_string()));
    assert!(fns.contains(&"dfa_1".to_string()));
    assert!(fns.contains(&"dfa_3".to_string()));
    assert!(fns.contains(&"families".to_string()));
    assert!(fns.contains(&"start".to_string()));
    assert!(!fns.contains(&"dfa_2".to_string()), "end rules have no automaton");

    let statics = file
        .items
        .iter()
        .filter(|item| matches!(item, syn::Item::Static(s) if s.ident.to_string().starts_with("ACCEPT_")))
        .count();
    assert_eq!(statics, 3);

    // Nothing beyond the step functions, their tables and the entry points,
    // so consumers build without dead-code warnings.
    assert!(
        file.items
            .iter()
            .all(|item| matches!(item, syn::Item::Use(_) | syn::Item::Fn(_) | syn::Item::Static(_))),
        "unexpected item kind in scanner module"
    );
}

#[test]
fn test_scanner_module_lists_families_in_order() {
    let module = generate_from_source(NESTED, &sequential()).expect("generates");
    let compact: String = module.scanner.chars().filter(|c| !c.is_whitespace()).collect();
    assert!(compact.contains("Family::new(0usize,vec![StaticDfa{action:0usize"));
    assert!(compact.contains("Family::new(1usize,vec![StaticDfa{action:1usize"));
    assert!(compact.contains("],4usize)"), "root end action is the last rule");
    assert!(compact.contains("],2usize)"), "nested end action is its pop rule");
}

#[test]
fn test_step_fn_uses_ranges_and_default_arm() {
    let module = generate_from_source("package r\n/[0-9]+/ { }\n", &sequential()).expect("generates");
    let compact: String = module.scanner.chars().filter(|c| !c.is_whitespace()).collect();
    assert!(compact.contains("'0'..='9'=>1u32"));
    assert!(compact.contains("_=>DEAD_STATE"));
    assert!(compact.contains("staticACCEPT_0:[bool;2]=[false,true,]"));
}

#[test]
fn test_surrogate_spanning_class_emits_valid_range() {
    let source = format!("package r\n/[{}-{}]/ {{ }}\n", '\u{D000}', '\u{E000}');
    let module = generate_from_source(&source, &sequential()).expect("generates");
    syn::parse_file(&module.scanner).expect("ranges across the surrogate gap stay valid");
}

#[test]
fn test_dispatch_wires_effects() {
    let rule_set = parse_rule_file(NESTED).expect("valid rule file");
    let dispatch = generate_dispatch(&rule_set).expect("valid actions");
    syn::parse2::<syn::ExprClosure>(dispatch.clone()).expect("dispatch is a closure");

    let compact: String = dispatch.to_string().chars().filter(|c| !c.is_whitespace()).collect();
    assert!(compact.contains("0usize=>{nn.push(1usize);"));
    assert!(compact.contains("2usize=>{nn.pop();"));
    assert!(compact.contains("4usize=>{nn_done=true;}"));
}

#[test]
fn test_user_code_expansion() {
    let rule_set = parse_rule_file(NESTED).expect("valid rule file");
    let user_code = expand_user_code(&rule_set).expect("valid actions").expect("has user code");
    assert!(!user_code.contains("NN_FUN"));
    syn::parse_file(&user_code).expect("expanded user code parses");

    let bare = parse_rule_file("package p\n/a/ { }\n").expect("valid rule file");
    assert_eq!(expand_user_code(&bare), Ok(None));
}

#[test]
fn test_invalid_action_is_rejected() {
    let rule_set = parse_rule_file("package p\n/a/ { }\n/b/ { let = ; }\n").expect("valid rule file");
    let err = generate(&rule_set, &sequential()).err();
    let Some(CompileError::Codegen(CodegenError::InvalidAction { rule, line, .. })) = err else {
        panic!("expected an invalid-action error, got {:?}", err);
    };
    assert_eq!(rule, 1);
    assert_eq!(line, 3);
}

#[test]
fn test_invalid_package_is_rejected() {
    let err = generate_from_source("package not-an-ident\n/a/ { }\n", &sequential()).err();
    assert!(
        matches!(err, Some(CompileError::Codegen(CodegenError::InvalidPackage(ref name))) if name == "not-an-ident"),
        "got {:?}",
        err
    );
}

// ══════════════════════════════════════════════════════════════════════════════
// Emitted step functions against the in-memory DFAs
// ══════════════════════════════════════════════════════════════════════════════

/// Overlapping classes, a negated class, a wildcard, and two classes that
/// split at the surrogate gap, plus a nested family.
fn tables_source() -> String {
    format!(
        "package tables\n\
         /[a-m][f-z]*/ {{ }}\n\
         /[^aeiou]x/ {{ }}\n\
         /a.b/ {{ }}\n\
         /[{lo}-{hi}]|[{lo}-{gap}]y/ {{ }}\n\
         /\"/ < {{ }}\n\
           /[^\"\\\\]+/ {{ }}\n\
           /\"/ {{ }}\n\
         > {{ }}\n",
        lo = '\u{D000}',
        gap = '\u{D7FF}',
        hi = '\u{E000}',
    )
}

/// The emitted module's step functions and accept tables, keyed by action.
struct EmittedTables {
    steps: HashMap<usize, syn::ItemFn>,
    accepts: HashMap<usize, Vec<bool>>,
}

impl EmittedTables {
    fn parse(scanner: &str) -> Self {
        let file = syn::parse_file(scanner).expect("scanner module parses as a Rust file");
        let mut steps = HashMap::new();
        let mut accepts = HashMap::new();
        for item in file.items {
            match item {
                syn::Item::Fn(f) => {
                    if let Some(id) = f.sig.ident.to_string().strip_prefix("dfa_") {
                        steps.insert(id.parse().expect("numeric automaton id"), f);
                    }
                },
                syn::Item::Static(s) => {
                    if let Some(id) = s.ident.to_string().strip_prefix("ACCEPT_") {
                        let id = id.parse().expect("numeric automaton id");
                        accepts.insert(id, accept_flags(&s.expr));
                    }
                },
                _ => {},
            }
        }
        EmittedTables { steps, accepts }
    }

    /// Evaluate `dfa_<action>(state, c)` by walking its match arms.
    fn step(&self, action: usize, state: StateId, c: char) -> StateId {
        let step = &self.steps[&action];
        let Some(syn::Stmt::Expr(syn::Expr::Match(by_state), None)) = step.block.stmts.first()
        else {
            panic!("dfa_{} body is not a match on the state", action);
        };
        let arm = first_matching_arm(&by_state.arms, |pat| state_pattern_matches(pat, state));
        match &*arm.body {
            syn::Expr::Match(by_symbol) => {
                let arm = first_matching_arm(&by_symbol.arms, |pat| symbol_pattern_matches(pat, c));
                state_value(&arm.body)
            },
            other => state_value(other),
        }
    }
}

fn first_matching_arm(arms: &[syn::Arm], matches: impl Fn(&syn::Pat) -> bool) -> &syn::Arm {
    arms.iter()
        .find(|arm| matches(&arm.pat))
        .expect("emitted match is exhaustive")
}

fn state_pattern_matches(pat: &syn::Pat, state: StateId) -> bool {
    match pat {
        syn::Pat::Wild(_) => true,
        syn::Pat::Lit(syn::ExprLit { lit: syn::Lit::Int(lit), .. }) => {
            lit.base10_parse::<StateId>().expect("state literal") == state
        },
        _ => panic!("state arms use integer literals or `_`"),
    }
}

fn symbol_pattern_matches(pat: &syn::Pat, c: char) -> bool {
    match pat {
        syn::Pat::Wild(_) => true,
        syn::Pat::Lit(syn::ExprLit { lit: syn::Lit::Char(lit), .. }) => lit.value() == c,
        syn::Pat::Range(range) => {
            let bound = |expr: &Option<Box<syn::Expr>>| match expr.as_deref() {
                Some(syn::Expr::Lit(syn::ExprLit { lit: syn::Lit::Char(lit), .. })) => lit.value(),
                _ => panic!("range bound is not a char literal"),
            };
            assert!(matches!(range.limits, syn::RangeLimits::Closed(_)), "ranges are inclusive");
            let (lo, hi) = (bound(&range.start), bound(&range.end));
            assert!(lo <= hi, "empty range {:?}..={:?}", lo, hi);
            lo <= c && c <= hi
        },
        _ => panic!("symbol arms use char literals, char ranges or `_`"),
    }
}

fn state_value(expr: &syn::Expr) -> StateId {
    match expr {
        syn::Expr::Lit(syn::ExprLit { lit: syn::Lit::Int(lit), .. }) => {
            lit.base10_parse().expect("state literal")
        },
        syn::Expr::Path(path) if path.path.is_ident("DEAD_STATE") => DEAD_STATE,
        _ => panic!("unexpected step result"),
    }
}

fn accept_flags(expr: &syn::Expr) -> Vec<bool> {
    let syn::Expr::Array(array) = expr else {
        panic!("accept table is not an array literal");
    };
    array
        .elems
        .iter()
        .map(|elem| match elem {
            syn::Expr::Lit(syn::ExprLit { lit: syn::Lit::Bool(flag), .. }) => flag.value,
            _ => panic!("accept flag is not a bool literal"),
        })
        .collect()
}

/// Symbols at every segment edge, just outside it, and in "other".
fn boundary_symbols(dfa: &Dfa) -> Vec<char> {
    let mut symbols: Vec<char> = dfa.alphabet.other_representative().into_iter().collect();
    for segment in &dfa.alphabet.segments {
        let codes = [
            segment.lo.checked_sub(1),
            Some(segment.lo),
            Some(segment.hi),
            segment.hi.checked_add(1),
        ];
        for code in codes.into_iter().flatten() {
            // Edges inside the surrogate gap clamp to the nearest valid symbol.
            let forward = (code..=char::MAX as u32).find_map(char::from_u32);
            let backward = (0..=code).rev().find_map(char::from_u32);
            symbols.extend(forward);
            symbols.extend(backward);
        }
    }
    symbols.sort_unstable();
    symbols.dedup();
    symbols
}

fn emitted_and_compiled() -> (EmittedTables, Vec<Dfa>) {
    let rule_set = parse_rule_file(&tables_source()).expect("valid rule file");
    let compiled = compile_rule_set(&rule_set, &sequential()).expect("compiles");
    let scanner = generate_scanner_module(&rule_set, &compiled.families)
        .expect("generates")
        .to_string();
    let dfas = compiled
        .families
        .into_iter()
        .flat_map(|family| family.automata)
        .collect();
    (EmittedTables::parse(&scanner), dfas)
}

#[test]
fn test_emitted_step_fns_match_dfa_transitions() {
    let (emitted, dfas) = emitted_and_compiled();
    assert_eq!(emitted.steps.len(), dfas.len());

    for dfa in &dfas {
        let symbols = boundary_symbols(dfa);
        for state in 0..dfa.states.len() as StateId {
            for &c in &symbols {
                assert_eq!(
                    emitted.step(dfa.action, state, c),
                    dfa.transition(state, c),
                    "dfa_{} state {} on {:?}",
                    dfa.action,
                    state,
                    c
                );
            }
        }
        // Rows past the last state fall into the dead arm.
        let beyond = dfa.states.len() as StateId;
        assert_eq!(emitted.step(dfa.action, beyond, 'a'), DEAD_STATE);
    }
}

#[test]
fn test_emitted_accept_tables_match_dfa() {
    let (emitted, dfas) = emitted_and_compiled();
    for dfa in &dfas {
        let expected: Vec<bool> = dfa.states.iter().map(|state| state.accept).collect();
        assert_eq!(emitted.accepts[&dfa.action], expected, "ACCEPT_{}", dfa.action);
    }
}

#[test]
fn test_surrogate_split_segments_clamp_to_valid_symbols() {
    let (emitted, dfas) = emitted_and_compiled();
    let dfa = dfas.iter().find(|dfa| dfa.action == 3).expect("surrogate rule");
    // [D000-E000] and [D000-D7FF] cut the alphabet at the gap.
    assert!(dfa.alphabet.segments.iter().any(|s| s.lo == 0xD800 && s.hi == 0xE000));

    let after_gap = emitted.step(3, 0, '\u{E000}');
    assert_ne!(after_gap, DEAD_STATE);
    assert_eq!(after_gap, dfa.transition(0, '\u{E000}'));
    assert_eq!(emitted.step(3, 0, '\u{E001}'), DEAD_STATE);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_emitted_step_fns_agree_on_any_symbol(
        input in prop::collection::vec(any::<char>(), 1..24),
    ) {
        let (emitted, dfas) = emitted_and_compiled();
        for dfa in &dfas {
            let mut state = 0;
            for &c in &input {
                let expected = dfa.transition(state, c);
                prop_assert_eq!(emitted.step(dfa.action, state, c), expected);
                if expected == DEAD_STATE {
                    break;
                }
                state = expected;
            }
        }
    }
}
