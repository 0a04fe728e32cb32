//! Rule set → scanner module orchestration.
//!
//! 1. **Compile**: every pattern rule becomes a DFA (`rayon::par_iter`, or
//!    sequentially when `CompileOptions::parallel` is off)
//! 2. **Materialize**: automata are grouped by family in declaration order,
//!    each family with its end-of-input action
//! 3. **Generate**: the scanner module and the expanded user code are emitted
//!
//! Rule compilations share nothing. Their results are collected in rule
//! order and the first error in that order is the one reported, so a run
//! fails identically whether or not it was parallel.

use std::path::PathBuf;

use nex_runtime::Family;
use rayon::prelude::*;
use serde::Serialize;
use tracing::{info, warn};

use crate::automata::{
    codegen::{expand_user_code, generate_scanner_module},
    ActionId, Dfa,
};
use crate::error::CompileError;
use crate::lexer::{compile_with_stats, materialize, RuleStats};
use crate::rules::{parse_rule_file, RuleSet};

/// Environment variable that enables automaton dumps.
pub const DUMP_ENV_VAR: &str = "NEX_DUMP_DFA";

// ══════════════════════════════════════════════════════════════════════════════
// Options and results
// ══════════════════════════════════════════════════════════════════════════════

/// Where automaton dumps go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DumpTarget {
    Stderr,
    /// `<dir>/<package>.dfa.json`
    Dir(PathBuf),
}

/// Knobs for one generator run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileOptions {
    /// Compile rules on the rayon pool.
    pub parallel: bool,
    pub dump: Option<DumpTarget>,
}

impl Default for CompileOptions {
    fn default() -> Self {
        CompileOptions { parallel: true, dump: None }
    }
}

impl CompileOptions {
    /// Defaults, with `dump` taken from `NEX_DUMP_DFA`:
    /// - `NEX_DUMP_DFA=stderr` (or `1`) prints the dump to stderr
    /// - `NEX_DUMP_DFA=<dir>` writes `<dir>/<package>.dfa.json`
    pub fn from_env() -> Self {
        let dump = std::env::var(DUMP_ENV_VAR).ok().and_then(|value| parse_dump_target(&value));
        CompileOptions { dump, ..CompileOptions::default() }
    }
}

fn parse_dump_target(value: &str) -> Option<DumpTarget> {
    match value.trim() {
        "" | "0" => None,
        "1" | "stderr" => Some(DumpTarget::Stderr),
        dir => Some(DumpTarget::Dir(PathBuf::from(dir))),
    }
}

/// Statistics from a rule-set compilation (for diagnostics).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CompileStats {
    pub num_rules: usize,
    pub num_families: usize,
    pub num_nfa_nodes: usize,
    pub num_dfa_states: usize,
    /// Largest per-rule alphabet, in segments.
    pub max_segments: usize,
}

impl CompileStats {
    fn add(&mut self, rule: &RuleStats) {
        self.num_rules += 1;
        self.num_nfa_nodes += rule.num_nfa_nodes;
        self.num_dfa_states += rule.num_dfa_states;
        self.max_segments = self.max_segments.max(rule.num_segments);
    }
}

/// Materialized families, indexed by family id.
#[derive(Debug, Clone)]
pub struct CompiledRules {
    pub families: Vec<Family<Dfa>>,
    pub stats: CompileStats,
}

/// Output of a full generator run.
#[derive(Debug, Clone)]
pub struct GeneratedModule {
    pub package: String,
    /// Source of the scanner module, as token text.
    pub scanner: String,
    /// User code with `NN_FUN` expanded, if the rule file has any.
    pub user_code: Option<String>,
    pub stats: CompileStats,
}

// ══════════════════════════════════════════════════════════════════════════════
// Pipeline
// ══════════════════════════════════════════════════════════════════════════════

/// Compile every pattern of `rule_set` and materialize its families.
///
/// # Errors
///
/// The pattern error of the lowest-id failing rule.
pub fn compile_rule_set(
    rule_set: &RuleSet,
    options: &CompileOptions,
) -> Result<CompiledRules, CompileError> {
    let rules: Vec<_> = rule_set.pattern_rules().collect();

    let results: Vec<_> = if options.parallel {
        rules.par_iter().map(|rule| compile_with_stats(rule)).collect()
    } else {
        rules.iter().map(|rule| compile_with_stats(rule)).collect()
    };

    let mut stats = CompileStats { num_families: rule_set.num_families, ..CompileStats::default() };
    let mut by_family: Vec<Vec<Dfa>> = vec![Vec::new(); rule_set.num_families];
    for (rule, result) in rules.iter().zip(results) {
        let (dfa, rule_stats) = result?;
        stats.add(&rule_stats);
        by_family[rule.family].push(dfa);
    }

    let families = by_family
        .into_iter()
        .enumerate()
        .map(|(id, automata)| {
            let end_action = rule_set
                .end_rule(id)
                .map(|rule| rule.id)
                .expect("every family has an end-of-input rule");
            materialize(id, automata, end_action)
        })
        .collect::<Vec<_>>();

    if let Some(target) = &options.dump {
        write_dump(&rule_set.package, &families, target);
    }

    Ok(CompiledRules { families, stats })
}

/// Compile `rule_set` and emit its scanner module and user code.
pub fn generate(
    rule_set: &RuleSet,
    options: &CompileOptions,
) -> Result<GeneratedModule, CompileError> {
    let compiled = compile_rule_set(rule_set, options)?;
    let scanner = generate_scanner_module(rule_set, &compiled.families)?.to_string();
    let user_code = expand_user_code(rule_set)?;

    info!(
        package = %rule_set.package,
        rules = compiled.stats.num_rules,
        families = compiled.stats.num_families,
        dfa_states = compiled.stats.num_dfa_states,
        "generated scanner module"
    );

    Ok(GeneratedModule {
        package: rule_set.package.clone(),
        scanner,
        user_code,
        stats: compiled.stats,
    })
}

/// Parse a rule file and run [`generate`] on it.
pub fn generate_from_source(
    source: &str,
    options: &CompileOptions,
) -> Result<GeneratedModule, CompileError> {
    let rule_set = parse_rule_file(source)?;
    generate(&rule_set, options)
}

// ══════════════════════════════════════════════════════════════════════════════
// Automaton dump
// ══════════════════════════════════════════════════════════════════════════════

#[derive(Serialize)]
struct FamilyDump<'a> {
    id: usize,
    end_action: ActionId,
    automata: &'a [Dfa],
}

#[derive(Serialize)]
struct RuleSetDump<'a> {
    package: &'a str,
    families: Vec<FamilyDump<'a>>,
}

/// Serialize `families` as JSON. Failures are logged, never fatal.
fn write_dump(package: &str, families: &[Family<Dfa>], target: &DumpTarget) {
    let dump = RuleSetDump {
        package,
        families: families
            .iter()
            .map(|f| FamilyDump { id: f.id, end_action: f.end_action, automata: &f.automata })
            .collect(),
    };
    let json = match serde_json::to_string_pretty(&dump) {
        Ok(json) => json,
        Err(e) => {
            warn!("{}: failed to serialize automata: {}", DUMP_ENV_VAR, e);
            return;
        },
    };

    match target {
        DumpTarget::Stderr => eprintln!("{}", json),
        DumpTarget::Dir(dir) => {
            if let Err(e) = std::fs::create_dir_all(dir) {
                warn!("{}: failed to create directory {:?}: {}", DUMP_ENV_VAR, dir, e);
                return;
            }
            let path = dir.join(format!("{}.dfa.json", package));
            match std::fs::write(&path, json) {
                Ok(()) => info!("{}: wrote {}", DUMP_ENV_VAR, path.display()),
                Err(e) => warn!("{}: failed to write {:?}: {}", DUMP_ENV_VAR, path, e),
            }
        },
    }
}
