//! Pattern compiler: one rule's pattern → Thompson NFA.
//!
//! Recursive descent over the pattern's symbols. Each level returns an
//! `NfaFragment` whose start/end nodes live in a shared arena; operators
//! only add fresh nodes and epsilon edges, so composing fragments never
//! rewrites edges that already exist.
//!
//! ## Grammar (highest to lowest binding)
//!
//! | Level | Syntax | Notes |
//! |-------|--------|-------|
//! | atom | `a`, `\.`, `\n`, `.`, `[...]`, `(...)` | `.` matches any symbol |
//! | closure | `atom*` `atom+` `atom?` | one operator per atom |
//! | concatenation | `ab` | |
//! | alternation | <code>a&#124;b</code> | empty alternatives match ε |
//!
//! A backslash before ASCII punctuation yields that symbol; `\a \b \f \n \r
//! \t \v` yield the control symbols; any other escape is rejected.
//!
//! Bracket classes: a leading `^` negates; members are single symbols or
//! `lo-hi` ranges with `lo <= hi`. A `-` in member position is an error.

use thiserror::Error;

use super::{EdgeKind, Nfa, NfaFragment, RuneClass};

// ══════════════════════════════════════════════════════════════════════════════
// Error types
// ══════════════════════════════════════════════════════════════════════════════

/// The kind of pattern error. Every kind aborts the whole compilation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
pub enum PatternErrorKind {
    #[error("unmatched '('")]
    UnmatchedLpar,
    #[error("unmatched ')'")]
    UnmatchedRpar,
    #[error("unmatched '['")]
    UnmatchedLbkt,
    #[error("unmatched ']'")]
    UnmatchedRbkt,
    #[error("bad range in character class")]
    BadRange,
    #[error("extraneous backslash")]
    ExtraneousBackslash,
    #[error("closure applies to nothing")]
    BareClosure,
    #[error("illegal backslash escape")]
    BadBackslash,
}

/// Error from pattern parsing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind} at symbol {position}")]
pub struct PatternError {
    pub kind: PatternErrorKind,
    /// Symbol offset into the pattern where the error was detected.
    pub position: usize,
}

impl PatternError {
    fn new(kind: PatternErrorKind, position: usize) -> Self {
        PatternError { kind, position }
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Public API
// ══════════════════════════════════════════════════════════════════════════════

/// Compile a pattern into a compacted NFA whose start node is 0 and whose
/// single accepting node is the end of the top-level fragment.
///
/// # Errors
///
/// Returns the first `PatternError` found; no NFA is produced.
pub fn compile_pattern(pattern: &[char]) -> Result<Nfa, PatternError> {
    let mut parser = Parser::new(pattern);
    let frag = parser.alternation()?;
    debug_assert_eq!(parser.pos, pattern.len(), "top-level parse stops only at end of pattern");

    let mut nfa = parser.nfa;
    nfa.nodes[frag.end as usize].accept = true;
    Ok(nfa.compact(frag.start))
}

/// Convenience wrapper over [`compile_pattern`] for string patterns.
pub fn compile_str(pattern: &str) -> Result<Nfa, PatternError> {
    let symbols: Vec<char> = pattern.chars().collect();
    compile_pattern(&symbols)
}

/// The control symbol named by an escape letter.
fn control_escape(letter: char) -> Option<char> {
    match letter {
        'a' => Some('\u{07}'),
        'b' => Some('\u{08}'),
        'f' => Some('\u{0C}'),
        'n' => Some('\n'),
        'r' => Some('\r'),
        't' => Some('\t'),
        'v' => Some('\u{0B}'),
        _ => None,
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Recursive descent
// ══════════════════════════════════════════════════════════════════════════════

struct Parser<'p> {
    input: &'p [char],
    pos: usize,
    /// Number of open groups; a `)` at depth 0 is unmatched.
    depth: usize,
    nfa: Nfa,
}

impl<'p> Parser<'p> {
    fn new(input: &'p [char]) -> Self {
        Parser { input, pos: 0, depth: 0, nfa: Nfa::new() }
    }

    #[inline]
    fn peek(&self) -> Option<char> {
        self.input.get(self.pos).copied()
    }

    #[inline]
    fn bump(&mut self) {
        self.pos += 1;
    }

    /// alternation := concat ('|' concat)*
    fn alternation(&mut self) -> Result<NfaFragment, PatternError> {
        let mut left = self.concat()?;
        while self.peek() == Some('|') {
            self.bump();
            let right = self.concat()?;
            let start = self.nfa.add_node();
            let end = self.nfa.add_node();
            self.nfa.add_epsilon(start, left.start);
            self.nfa.add_epsilon(start, right.start);
            self.nfa.add_epsilon(left.end, end);
            self.nfa.add_epsilon(right.end, end);
            left = NfaFragment { start, end };
        }
        Ok(left)
    }

    /// concat := closure*
    fn concat(&mut self) -> Result<NfaFragment, PatternError> {
        let mut result: Option<NfaFragment> = None;
        while let Some(next) = self.closure()? {
            result = Some(match result {
                None => next,
                Some(prev) => {
                    self.nfa.add_epsilon(prev.end, next.start);
                    NfaFragment { start: prev.start, end: next.end }
                },
            });
        }
        Ok(match result {
            Some(frag) => frag,
            None => self.nfa.empty(),
        })
    }

    /// closure := term ('*' | '+' | '?')?
    fn closure(&mut self) -> Result<Option<NfaFragment>, PatternError> {
        let Some(atom) = self.term()? else {
            return Ok(None);
        };
        let frag = match self.peek() {
            Some('*') => {
                self.bump();
                let start = self.nfa.add_node();
                let end = self.nfa.add_node();
                self.nfa.add_epsilon(start, atom.start);
                self.nfa.add_epsilon(start, end);
                self.nfa.add_epsilon(atom.end, atom.start);
                self.nfa.add_epsilon(atom.end, end);
                NfaFragment { start, end }
            },
            Some('+') => {
                self.bump();
                let start = self.nfa.add_node();
                let end = self.nfa.add_node();
                self.nfa.add_epsilon(start, atom.start);
                self.nfa.add_epsilon(atom.end, atom.start);
                self.nfa.add_epsilon(atom.end, end);
                NfaFragment { start, end }
            },
            Some('?') => {
                self.bump();
                let start = self.nfa.add_node();
                let end = self.nfa.add_node();
                self.nfa.add_epsilon(start, atom.start);
                self.nfa.add_epsilon(start, end);
                self.nfa.add_epsilon(atom.end, end);
                NfaFragment { start, end }
            },
            _ => atom,
        };
        Ok(Some(frag))
    }

    /// term := symbol | '.' | '[' class ']' | '(' alternation ')'
    ///
    /// Returns `None` where a concatenation ends: end of pattern, `|`, or
    /// the `)` closing an open group.
    fn term(&mut self) -> Result<Option<NfaFragment>, PatternError> {
        let Some(c) = self.peek() else {
            return Ok(None);
        };
        let frag = match c {
            '|' => return Ok(None),
            ')' => {
                if self.depth == 0 {
                    return Err(PatternError::new(PatternErrorKind::UnmatchedRpar, self.pos));
                }
                return Ok(None);
            },
            '*' | '+' | '?' => {
                return Err(PatternError::new(PatternErrorKind::BareClosure, self.pos));
            },
            ']' => {
                return Err(PatternError::new(PatternErrorKind::UnmatchedRbkt, self.pos));
            },
            '(' => {
                let open = self.pos;
                self.bump();
                self.depth += 1;
                let inner = self.alternation()?;
                if self.peek() != Some(')') {
                    return Err(PatternError::new(PatternErrorKind::UnmatchedLpar, open));
                }
                self.bump();
                self.depth -= 1;
                inner
            },
            '.' => {
                self.bump();
                self.nfa.single_edge(EdgeKind::Wild)
            },
            '[' => {
                let open = self.pos;
                self.bump();
                let class = self.class(open)?;
                self.nfa.single_edge(EdgeKind::Class(class))
            },
            _ => {
                let r = self.symbol()?;
                self.nfa.single_edge(EdgeKind::Rune(r))
            },
        };
        Ok(Some(frag))
    }

    /// Read one symbol at the cursor, resolving a backslash escape.
    fn symbol(&mut self) -> Result<char, PatternError> {
        let at = self.pos;
        let c = self.input[at];
        if c != '\\' {
            self.bump();
            return Ok(c);
        }
        let Some(&escaped) = self.input.get(at + 1) else {
            return Err(PatternError::new(PatternErrorKind::ExtraneousBackslash, at));
        };
        let resolved = if escaped.is_ascii_punctuation() {
            escaped
        } else {
            control_escape(escaped)
                .ok_or_else(|| PatternError::new(PatternErrorKind::BadBackslash, at))?
        };
        self.pos = at + 2;
        Ok(resolved)
    }

    /// Parse a bracket class body; the cursor is just past `[` at `open`.
    /// Consumes the closing `]`.
    fn class(&mut self, open: usize) -> Result<RuneClass, PatternError> {
        let mut class = RuneClass::default();
        if self.peek() == Some('^') {
            class.negated = true;
            self.bump();
        }

        let mut lower: Option<char> = None;
        loop {
            match self.peek() {
                None => return Err(PatternError::new(PatternErrorKind::UnmatchedLbkt, open)),
                Some(']') => {
                    if lower.is_some() {
                        return Err(PatternError::new(PatternErrorKind::BadRange, self.pos));
                    }
                    self.bump();
                    return Ok(class);
                },
                Some('-') => return Err(PatternError::new(PatternErrorKind::BadRange, self.pos)),
                Some(_) => {
                    let at = self.pos;
                    let c = self.symbol()?;
                    match lower.take() {
                        None if self.peek() == Some('-') => {
                            self.bump();
                            lower = Some(c);
                        },
                        None => class.ranges.push((c, c)),
                        Some(lo) if lo <= c => class.ranges.push((lo, c)),
                        Some(_) => return Err(PatternError::new(PatternErrorKind::BadRange, at)),
                    }
                },
            }
        }
    }
}
