//! One scanning context: lookahead buffer, per-automaton states, best match.
//!
//! `Frame::advance` feeds buffered symbols to every live automaton of the
//! family in declaration order. An accepting automaton replaces the recorded
//! match only when it has consumed strictly more symbols, so the longest
//! match wins and, at equal length, the earliest-declared rule wins.
//!
//! When every automaton is dead for the current symbol (a jam) or the input
//! is exhausted, the frame emits the best match and resets. Symbols past the
//! match stay in the buffer and are scanned again on the next call without
//! re-reading the source.

use crate::automaton::{ActionId, Automaton, Family, StateId, DEAD_STATE, START_STATE};

/// The best match recorded so far in a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Match {
    /// Number of buffered symbols the match consumes.
    pub len: usize,
    /// Index of the winning automaton within the family.
    pub index: usize,
}

pub struct Frame<'f, A> {
    family: &'f Family<A>,
    input: Box<dyn Iterator<Item = char> + 'f>,
    exhausted: bool,
    buf: Vec<char>,
    /// Number of buffered symbols already fed to the automata.
    pos: usize,
    states: Box<[StateId]>,
    best: Option<Match>,
    text: String,
}

impl<'f, A: Automaton> Frame<'f, A> {
    pub fn new(family: &'f Family<A>, input: Box<dyn Iterator<Item = char> + 'f>) -> Self {
        Frame {
            family,
            input,
            exhausted: false,
            buf: Vec::with_capacity(128),
            pos: 0,
            states: vec![START_STATE; family.automata.len()].into_boxed_slice(),
            best: None,
            text: String::new(),
        }
    }

    /// Run the longest-match algorithm until one decision is reached.
    ///
    /// Returns the winning rule's action, or the family's end-of-input
    /// action when nothing matched before a jam or the end of input.
    pub fn advance(&mut self) -> ActionId {
        loop {
            if self.pos == self.buf.len() {
                if !self.exhausted {
                    match self.input.next() {
                        Some(c) => self.buf.push(c),
                        None => self.exhausted = true,
                    }
                }
                if self.exhausted {
                    return self.settle();
                }
            }

            let c = self.buf[self.pos];
            let consumed = self.pos + 1;
            let mut jammed = true;

            for (index, (automaton, state)) in
                self.family.automata.iter().zip(self.states.iter_mut()).enumerate()
            {
                if *state == DEAD_STATE {
                    continue;
                }
                *state = automaton.step(*state, c);
                if *state == DEAD_STATE {
                    continue;
                }
                jammed = false;
                if automaton.is_accepting(*state) {
                    let improves = match self.best {
                        None => true,
                        Some(best) => consumed > best.len,
                    };
                    if improves {
                        self.best = Some(Match { len: consumed, index });
                    }
                }
            }

            if jammed {
                return self.settle();
            }
            self.pos = consumed;
        }
    }

    /// Emit the recorded match (or the end-of-input action) and reset for
    /// the next token.
    fn settle(&mut self) -> ActionId {
        self.pos = 0;
        self.states.fill(START_STATE);
        match self.best.take() {
            Some(best) => {
                self.text = self.buf.drain(..best.len).collect();
                self.family.automata[best.index].action()
            },
            None => self.family.end_action,
        }
    }

    /// The most recently matched text.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// The family this frame scans.
    pub fn family(&self) -> &'f Family<A> {
        self.family
    }

    /// Buffered symbols not yet consumed by a match.
    pub fn lookahead(&self) -> &[char] {
        &self.buf
    }

    /// Number of buffered symbols fed to the automata for the pending token.
    pub fn cursor(&self) -> usize {
        self.pos
    }

    /// Whether the input source has reported its end.
    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    /// The best match recorded for the pending token, if any.
    pub fn best(&self) -> Option<Match> {
        self.best
    }
}

impl<A> std::fmt::Debug for Frame<'_, A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Frame")
            .field("family", &self.family.id)
            .field("exhausted", &self.exhausted)
            .field("buf", &self.buf)
            .field("pos", &self.pos)
            .field("states", &self.states)
            .field("best", &self.best)
            .field("text", &self.text)
            .finish()
    }
}
