//! Alphabet partitioning over code points.
//!
//! A rule mentions a handful of code points: literal runes and the
//! intervals of its bracket classes. Splitting the mentioned intervals at
//! every boundary yields disjoint segments inside which every code point
//! takes the same edges in every NFA node. Code points outside all segments
//! can only be taken by wildcard and negated-class edges, so together they
//! form one more bucket, "other".
//!
//! The DFA stores one column per segment plus one for "other", which keeps
//! transition rows small even though the input alphabet is all of Unicode.

use serde::Serialize;

/// A maximal run of code points that behave identically for one rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct Segment {
    pub lo: u32,
    pub hi: u32,
}

impl Segment {
    #[inline]
    pub fn contains(&self, code: u32) -> bool {
        self.lo <= code && code <= self.hi
    }

    /// The code point used to compute this segment's transitions.
    #[inline]
    pub fn representative(&self) -> u32 {
        self.lo
    }
}

/// The rule-specific alphabet: sorted, disjoint segments.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Alphabet {
    pub segments: Vec<Segment>,
}

impl Alphabet {
    /// Build the alphabet from every explicitly mentioned interval.
    pub fn from_intervals(intervals: &[(u32, u32)]) -> Self {
        // Boundaries: each interval opens at `lo` and closes before `hi + 1`.
        let mut cuts: Vec<u32> = Vec::with_capacity(intervals.len() * 2);
        for &(lo, hi) in intervals {
            cuts.push(lo);
            cuts.push(hi + 1);
        }
        cuts.sort_unstable();
        cuts.dedup();

        let mut segments = Vec::new();
        for pair in cuts.windows(2) {
            let segment = Segment { lo: pair[0], hi: pair[1] - 1 };
            let covered = intervals
                .iter()
                .any(|&(lo, hi)| lo <= segment.lo && segment.hi <= hi);
            if covered {
                segments.push(segment);
            }
        }

        Alphabet { segments }
    }

    /// Index of the segment containing `code`, or `None` for "other".
    pub fn segment_of(&self, code: u32) -> Option<usize> {
        // Last segment whose `lo` does not exceed `code`.
        let idx = self.segments.partition_point(|s| s.lo <= code);
        if idx == 0 {
            return None;
        }
        let candidate = idx - 1;
        if self.segments[candidate].contains(code) {
            Some(candidate)
        } else {
            None
        }
    }

    /// Number of segments (excluding "other").
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// A code point that falls in no segment, if one exists.
    pub fn other_representative(&self) -> Option<char> {
        let mut next = 0u32;
        for segment in &self.segments {
            if segment.lo > next {
                if let Some(c) = first_char_in(next, segment.lo - 1) {
                    return Some(c);
                }
            }
            next = segment.hi + 1;
        }
        first_char_in(next, char::MAX as u32)
    }
}

/// First valid `char` in `lo..=hi` (skips the surrogate gap).
fn first_char_in(lo: u32, hi: u32) -> Option<char> {
    (lo..=hi).find_map(char::from_u32)
}
