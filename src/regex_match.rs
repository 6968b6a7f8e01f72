//! The partial-regex matcher contract (C7).
//!
//! The cursor never touches `regex` directly: it goes through [`PartialMatcher`], so a
//! host embedding this crate can swap in a different engine (or a hand-rolled DFA
//! stepper) without touching the cursor or any dialect code. [`RegexMatcher`] is the
//! default, `regex`-crate-backed implementation.

use std::ops::Range;
use std::sync::Arc;

/// Result of searching for a pattern in a (possibly truncated) haystack.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchOutcome {
    /// The pattern does not occur, and the tail of the haystack gives no indication
    /// that it's about to.
    None,
    /// No full match, but the haystack could be the prefix of a future match if more
    /// text arrives. `start` is where that candidate prefix begins.
    Partial { start: usize },
    /// A full match, with capture group ranges (group 0 is the whole match).
    Full {
        range: Range<usize>,
        groups: Vec<Option<Range<usize>>>,
    },
}

/// External collaborator: something that can search for a pattern and report whether
/// the match is complete, absent, or merely promised by a truncated tail.
pub trait PartialMatcher: Send + Sync {
    fn search(&self, haystack: &str, from: usize) -> MatchOutcome;
}

/// Default `regex`-backed [`PartialMatcher`].
///
/// Full matches delegate straight to [`regex::Regex`]. Partial-match detection is an
/// approximation documented in the design notes: rather than stepping a DFA (which
/// would need a lower-level crate than `regex` exposes), this checks whether the tail
/// of the haystack is a non-empty prefix of the pattern's leading literal run — the
/// run of characters before the first regex metacharacter. That covers the patterns
/// this parser actually searches for (fixed tag literals like `<think>`, `</think>`,
/// `<tool_call>`, possibly followed by a character class); patterns with no literal
/// prefix conservatively report `None` rather than a false `Partial`.
#[derive(Clone)]
pub struct RegexMatcher {
    re: Arc<regex::Regex>,
    literal_prefix: String,
}

impl RegexMatcher {
    pub fn new(re: regex::Regex) -> Self {
        let literal_prefix = leading_literal_run(re.as_str());
        Self {
            re: Arc::new(re),
            literal_prefix,
        }
    }

    pub fn compile(pattern: &str) -> Result<Self, regex::Error> {
        Ok(Self::new(regex::Regex::new(pattern)?))
    }
}

impl PartialMatcher for RegexMatcher {
    fn search(&self, haystack: &str, from: usize) -> MatchOutcome {
        let tail = &haystack[from..];
        if let Some(caps) = self.re.captures(tail) {
            let m = caps.get(0).expect("group 0 always present on a match");
            let groups = (0..caps.len())
                .map(|i| caps.get(i).map(|g| (from + g.start())..(from + g.end())))
                .collect();
            return MatchOutcome::Full {
                range: (from + m.start())..(from + m.end()),
                groups,
            };
        }

        if self.literal_prefix.is_empty() {
            return MatchOutcome::None;
        }

        // Longest suffix of `tail` that is a proper, non-empty prefix of the literal
        // run wins; there can be only one such suffix length that matches exactly
        // (prefixes of a fixed string don't collide ambiguously), so first hit wins.
        let max_len = tail.len().min(self.literal_prefix.len().saturating_sub(1));
        for len in (1..=max_len).rev() {
            let suffix_start = tail.len() - len;
            if char_boundary(tail, suffix_start) && self.literal_prefix.starts_with(&tail[suffix_start..]) {
                return MatchOutcome::Partial {
                    start: from + suffix_start,
                };
            }
        }
        MatchOutcome::None
    }
}

fn char_boundary(s: &str, idx: usize) -> bool {
    s.is_char_boundary(idx)
}

/// The run of characters at the start of a regex source that are guaranteed literal
/// (no escaping, grouping, or quantifier metacharacters). Conservative: stops at the
/// first character that could conceivably be special.
fn leading_literal_run(pattern: &str) -> String {
    const META: &[char] = &[
        '\\', '.', '+', '*', '?', '(', ')', '[', ']', '{', '}', '^', '$', '|',
    ];
    pattern.chars().take_while(|c| !META.contains(c)).collect()
}
