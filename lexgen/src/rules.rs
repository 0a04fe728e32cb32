//! Rule-file reader.
//!
//! A rule file declares a package name followed by rules. Each rule is a
//! delimited pattern and a brace-delimited action:
//!
//! ```text
//! package calc
//! /[0-9]+/    { println!("num {}", nn.text()); }
//! /"/ <       { }
//!   /[^"\\]+/ { println!("chunk {}", nn.text()); }
//!   /\\./     { println!("escape {}", nn.text()); }
//! >           { println!("end of string"); }
//! /./         { }
//! //
//! fn main() { let mut nn = calc::start(std::io::stdin().lines().flatten().flat_map(|l| l.chars().collect::<Vec<_>>())); (NN_FUN)(&mut nn); }
//! ```
//!
//! - The first non-blank symbol of a rule is its delimiter; a delimiter
//!   preceded by `\` stays in the pattern.
//! - `<` after a pattern pushes: the rules up to the matching `>` form a
//!   nested family that scans the text this rule matched.
//! - `>` closes the nested family; its action runs when the family reaches
//!   the end of that text.
//! - An empty pattern ends the rules; everything after it is user code.
//!
//! Families are numbered in order of appearance, family 0 being the root.
//! Every family receives one end-of-input rule.

use thiserror::Error;

use crate::automata::ActionId;

/// Error from reading a rule file. Lines are 1-based.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuleFileError {
    #[error("line {line}: expected package declaration")]
    MissingPackage { line: usize },
    #[error("line {line}: expected package name")]
    MissingPackageName { line: usize },
    #[error("line {line}: unterminated pattern")]
    UnterminatedPattern { line: usize },
    #[error("line {line}: pattern interrupted by newline")]
    PatternNewline { line: usize },
    #[error("line {line}: last pattern lacks action")]
    MissingAction { line: usize },
    #[error("line {line}: '<' lacks action")]
    PushLacksAction { line: usize },
    #[error("line {line}: expected '{{'")]
    ExpectedBlock { line: usize },
    #[error("line {line}: unmatched '{{'")]
    UnmatchedBrace { line: usize },
    #[error("line {line}: unmatched '<'")]
    UnmatchedPush { line: usize },
    #[error("line {line}: unmatched '>'")]
    UnmatchedPop { line: usize },
}

/// What the generated dispatcher does around a rule's action text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Effect {
    /// Run the action.
    None,
    /// Enter the given nested family over the matched text, then run the action.
    Push(usize),
    /// End-of-input of a nested family: pop, then run the action.
    Pop,
    /// End-of-input of the root family: stop scanning.
    Stop,
}

/// One rule of the rule file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    /// Global id; also the action id reported by the scanner.
    pub id: ActionId,
    pub family: usize,
    /// Position within the family, or `None` for its end-of-input rule.
    pub index: Option<usize>,
    pub pattern: Vec<char>,
    /// Action text as written, braces included.
    pub action: String,
    pub effect: Effect,
    /// Line the rule starts on.
    pub line: usize,
}

impl Rule {
    pub fn is_end_of_input(&self) -> bool {
        self.index.is_none()
    }

    pub fn pattern_text(&self) -> String {
        self.pattern.iter().collect()
    }
}

/// All rules of a file, in creation order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleSet {
    pub package: String,
    pub rules: Vec<Rule>,
    pub num_families: usize,
    /// Text after the empty pattern, if any.
    pub user_code: Option<String>,
}

impl RuleSet {
    /// Pattern rules of `family` in declaration order.
    pub fn family_rules(&self, family: usize) -> impl Iterator<Item = &Rule> + '_ {
        self.rules
            .iter()
            .filter(move |r| r.family == family && !r.is_end_of_input())
    }

    /// The end-of-input rule of `family`.
    pub fn end_rule(&self, family: usize) -> Option<&Rule> {
        self.rules
            .iter()
            .find(|r| r.family == family && r.is_end_of_input())
    }

    /// Every rule that carries a pattern.
    pub fn pattern_rules(&self) -> impl Iterator<Item = &Rule> + '_ {
        self.rules.iter().filter(|r| !r.is_end_of_input())
    }
}

/// Parse a complete rule file.
pub fn parse_rule_file(source: &str) -> Result<RuleSet, RuleFileError> {
    let mut reader = Reader::new(source);

    reader.skip_ws();
    if reader.at_end() || reader.word() != "package" {
        return Err(RuleFileError::MissingPackage { line: reader.line });
    }
    reader.skip_ws();
    if reader.at_end() {
        return Err(RuleFileError::MissingPackageName { line: reader.line });
    }
    let package = reader.word();

    let mut builder = Builder { rules: Vec::new(), num_families: 1, user_code: None };
    builder.family(&mut reader, 0)?;

    Ok(RuleSet {
        package,
        rules: builder.rules,
        num_families: builder.num_families,
        user_code: builder.user_code,
    })
}

// ══════════════════════════════════════════════════════════════════════════════
// Family parsing
// ══════════════════════════════════════════════════════════════════════════════

struct Builder {
    rules: Vec<Rule>,
    num_families: usize,
    user_code: Option<String>,
}

impl Builder {
    fn add(
        &mut self,
        family: usize,
        index: Option<usize>,
        pattern: Vec<char>,
        action: String,
        effect: Effect,
        line: usize,
    ) -> usize {
        let id = self.rules.len();
        self.rules.push(Rule { id, family, index, pattern, action, effect, line });
        id
    }

    /// Parse the rules of `family` up to its `>` (nested) or the end of the
    /// rules (root).
    fn family(&mut self, reader: &mut Reader, family: usize) -> Result<(), RuleFileError> {
        let mut count = 0;
        loop {
            reader.skip_ws();
            if reader.at_end() {
                break;
            }
            let line = reader.line;

            if reader.peek() == Some('>') {
                if family == 0 {
                    return Err(RuleFileError::UnmatchedPop { line });
                }
                reader.bump();
                reader.skip_ws();
                let action = reader.block()?;
                self.add(family, None, Vec::new(), action, Effect::Pop, line);
                return Ok(());
            }

            let pattern = reader.pattern()?;
            if pattern.is_empty() {
                reader.skip_ws();
                self.user_code = Some(reader.rest());
                break;
            }

            reader.skip_ws();
            if reader.at_end() {
                return Err(RuleFileError::MissingAction { line: reader.line });
            }

            let mut nested = None;
            if reader.peek() == Some('<') {
                reader.bump();
                reader.skip_ws();
                if reader.at_end() {
                    return Err(RuleFileError::PushLacksAction { line: reader.line });
                }
                nested = Some(self.num_families);
                self.num_families += 1;
            }

            let action = reader.block()?;
            let effect = nested.map_or(Effect::None, Effect::Push);
            self.add(family, Some(count), pattern, action, effect, line);
            count += 1;

            if let Some(inner) = nested {
                self.family(reader, inner)?;
            }
        }

        if family != 0 {
            return Err(RuleFileError::UnmatchedPush { line: reader.line });
        }
        self.add(0, None, Vec::new(), String::new(), Effect::Stop, reader.line);
        Ok(())
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Symbol reader
// ══════════════════════════════════════════════════════════════════════════════

struct Reader {
    chars: Vec<char>,
    pos: usize,
    line: usize,
}

impl Reader {
    fn new(source: &str) -> Self {
        Reader { chars: source.chars().collect(), pos: 0, line: 1 }
    }

    fn at_end(&self) -> bool {
        self.pos >= self.chars.len()
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        if c == '\n' {
            self.line += 1;
        }
        self.pos += 1;
        Some(c)
    }

    fn skip_ws(&mut self) {
        while matches!(self.peek(), Some(' ' | '\t' | '\n' | '\r')) {
            self.bump();
        }
    }

    /// Symbols up to the next whitespace.
    fn word(&mut self) -> String {
        let mut word = String::new();
        while let Some(c) = self.peek() {
            if matches!(c, ' ' | '\t' | '\n' | '\r') {
                break;
            }
            word.push(c);
            self.bump();
        }
        word
    }

    /// A delimited pattern; the cursor is on the opening delimiter.
    fn pattern(&mut self) -> Result<Vec<char>, RuleFileError> {
        let delim = self.bump().ok_or(RuleFileError::UnterminatedPattern { line: self.line })?;
        let mut pattern: Vec<char> = Vec::new();
        loop {
            let Some(c) = self.peek() else {
                return Err(RuleFileError::UnterminatedPattern { line: self.line });
            };
            if c == delim && pattern.last() != Some(&'\\') {
                self.bump();
                return Ok(pattern);
            }
            if c == '\n' {
                return Err(RuleFileError::PatternNewline { line: self.line });
            }
            pattern.push(c);
            self.bump();
        }
    }

    /// A brace-delimited block with balanced nesting, braces included.
    fn block(&mut self) -> Result<String, RuleFileError> {
        if self.peek() != Some('{') {
            return Err(RuleFileError::ExpectedBlock { line: self.line });
        }
        let open_line = self.line;
        let mut depth = 0usize;
        let mut text = String::new();
        while let Some(c) = self.bump() {
            text.push(c);
            match c {
                '{' => depth += 1,
                '}' => {
                    depth -= 1;
                    if depth == 0 {
                        return Ok(text);
                    }
                },
                _ => {},
            }
        }
        Err(RuleFileError::UnmatchedBrace { line: open_line })
    }

    fn rest(&mut self) -> String {
        let rest: String = self.chars[self.pos..].iter().collect();
        self.pos = self.chars.len();
        rest
    }
}
