//! Errors surfaced by the generator.

use thiserror::Error;

use crate::automata::{codegen::CodegenError, regex::PatternError, ActionId};
use crate::rules::RuleFileError;

/// Any failure between reading a rule file and emitting its scanner.
///
/// The first failure aborts the run; nothing partial is emitted.
#[derive(Debug, Error)]
pub enum CompileError {
    #[error("rule {rule} (line {line}) /{pattern}/: {source}")]
    Pattern {
        rule: ActionId,
        line: usize,
        pattern: String,
        #[source]
        source: PatternError,
    },
    #[error(transparent)]
    RuleFile(#[from] RuleFileError),
    #[error(transparent)]
    Codegen(#[from] CodegenError),
}

impl CompileError {
    /// The pattern error behind this failure, if any.
    pub fn pattern_error(&self) -> Option<&PatternError> {
        match self {
            CompileError::Pattern { source, .. } => Some(source),
            _ => None,
        }
    }
}
