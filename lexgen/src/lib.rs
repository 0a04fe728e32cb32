//! # nex: lexer generator
//!
//! nex turns a rule file (patterns paired with Rust actions) into a scanner
//! module. Every rule compiles to its own DFA; at run time all automata of
//! the active family advance in lockstep and the longest match wins, ties
//! going to the rule declared first. A rule may push a nested family that
//! rescans the text it just matched.
//!
//! ## Architecture
//!
//! ```text
//!  rule file
//!      │
//!      ▼
//!  ┌──────────────┐     ┌────────────────────────────────────────┐
//!  │ rules reader │────▶│ per rule (rayon):                      │
//!  └──────────────┘     │   Pattern → NFA → Alphabet → DFA        │
//!                       └────────────────────────────────────────┘
//!                                        │
//!                                        ▼
//!                       ┌────────────────────────────────────────┐
//!                       │ families (declaration order, end rule)  │
//!                       └────────────────────────────────────────┘
//!                            │                         │
//!                            ▼                         ▼
//!                  nex_runtime::Scanner         codegen: module text
//!                  (in-memory tables)           + NN_FUN dispatcher
//! ```

pub mod automata;
pub mod error;
pub mod lexer;
pub mod pipeline;
pub mod rules;

#[cfg(test)]
mod tests;

pub use automata::{codegen::CodegenError, regex::PatternError, regex::PatternErrorKind, Dfa};
pub use error::CompileError;
pub use lexer::{compile, materialize};
pub use pipeline::{
    compile_rule_set, generate, generate_from_source, CompileOptions, CompileStats, CompiledRules,
    DumpTarget, GeneratedModule,
};
pub use rules::{parse_rule_file, Effect, Rule, RuleFileError, RuleSet};
