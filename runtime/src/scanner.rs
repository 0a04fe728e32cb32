//! Frame stack: nested scanning contexts.
//!
//! The root frame scans family 0 over the caller's input. An action may push
//! a frame for another family over the text just matched; that frame owns a
//! copy of the text, so the outer frame's buffer is never touched. Popping
//! returns control to the frame beneath, which resumes exactly where it was.

use tracing::trace;

use crate::automaton::{ActionId, Automaton, Family};
use crate::frame::Frame;

/// Handle for a running scan: a non-empty stack of frames.
#[derive(Debug)]
pub struct Scanner<'f, A> {
    families: &'f [Family<A>],
    stack: Vec<Frame<'f, A>>,
}

impl<'f, A: Automaton> Scanner<'f, A> {
    /// Begin scanning family 0 over `input`.
    ///
    /// # Panics
    ///
    /// Panics if `families` is empty.
    pub fn start<I>(families: &'f [Family<A>], input: I) -> Self
    where
        I: IntoIterator<Item = char>,
        I::IntoIter: 'f,
    {
        assert!(!families.is_empty(), "scanner needs at least the root family");
        let mut stack = Vec::with_capacity(4);
        stack.push(Frame::new(&families[0], Box::new(input.into_iter())));
        Scanner { families, stack }
    }

    /// Run the longest-match algorithm on the active frame and return the
    /// matched rule's action or the active family's end-of-input action.
    pub fn advance(&mut self) -> ActionId {
        self.top_mut().advance()
    }

    /// Open a nested frame for `family` over the most recently matched text.
    ///
    /// # Panics
    ///
    /// Panics if `family` is not a materialized family id.
    pub fn push(&mut self, family: usize) {
        assert!(family < self.families.len(), "push into unknown family {}", family);
        let text: Vec<char> = self.top().text().chars().collect();
        trace!(family, depth = self.stack.len(), text_len = text.len(), "push frame");
        let frame = Frame::new(&self.families[family], Box::new(text.into_iter()));
        self.stack.push(frame);
    }

    /// Discard the active frame.
    ///
    /// # Panics
    ///
    /// Panics when only the root frame remains.
    pub fn pop(&mut self) {
        assert!(self.stack.len() > 1, "cannot pop the root frame");
        self.stack.pop();
        trace!(depth = self.stack.len(), "pop frame");
    }

    /// The most recently matched text of the active frame.
    pub fn text(&self) -> &str {
        self.top().text()
    }

    /// Number of live frames (1 = only the root).
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    /// The active frame.
    pub fn top(&self) -> &Frame<'f, A> {
        // The stack is never empty: `start` pushes the root and `pop` keeps it.
        &self.stack[self.stack.len() - 1]
    }

    fn top_mut(&mut self) -> &mut Frame<'f, A> {
        let last = self.stack.len() - 1;
        &mut self.stack[last]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{literal_family_from, LiteralDfa};

    /// Family 0: "abc" (0), "x" (1), end 2. Family 1: "a" (3), "bc" (4), end 5.
    fn nested_families() -> Vec<Family<LiteralDfa>> {
        vec![
            literal_family_from(0, &["abc", "x"], 0, 2),
            literal_family_from(1, &["a", "bc"], 3, 5),
        ]
    }

    #[test]
    fn test_push_scans_matched_text_only() {
        let families = nested_families();
        let mut scanner = Scanner::start(&families, "abcx".chars());

        assert_eq!(scanner.advance(), 0);
        assert_eq!(scanner.text(), "abc");

        scanner.push(1);
        assert_eq!(scanner.depth(), 2);
        assert_eq!(scanner.advance(), 3);
        assert_eq!(scanner.text(), "a");
        assert_eq!(scanner.advance(), 4);
        assert_eq!(scanner.text(), "bc");
        assert_eq!(scanner.advance(), 5);

        scanner.pop();
        assert_eq!(scanner.depth(), 1);
        assert_eq!(scanner.text(), "abc");
        assert_eq!(scanner.advance(), 1);
        assert_eq!(scanner.advance(), 2);
    }

    #[test]
    fn test_push_pop_leaves_outer_frame_untouched() {
        let families = nested_families();
        let mut scanner = Scanner::start(&families, "abcx".chars());
        assert_eq!(scanner.advance(), 0);

        let lookahead_before = scanner.top().lookahead().to_vec();
        let cursor_before = scanner.top().cursor();
        let best_before = scanner.top().best();

        scanner.push(1);
        while scanner.advance() != 5 {}
        scanner.pop();

        assert_eq!(scanner.top().lookahead(), lookahead_before.as_slice());
        assert_eq!(scanner.top().cursor(), cursor_before);
        assert_eq!(scanner.top().best(), best_before);
    }

    #[test]
    #[should_panic(expected = "cannot pop the root frame")]
    fn test_pop_root_panics() {
        let families = nested_families();
        let mut scanner = Scanner::start(&families, "".chars());
        scanner.pop();
    }

    #[test]
    #[should_panic(expected = "push into unknown family")]
    fn test_push_unknown_family_panics() {
        let families = nested_families();
        let mut scanner = Scanner::start(&families, "abc".chars());
        scanner.advance();
        scanner.push(7);
    }
}
