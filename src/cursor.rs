//! Position-tracked view over the raw input text (C1).
//!
//! Every `try_*` method leaves `pos` untouched on failure; only a successful match
//! advances it. The non-`try_` `consume_*` variants additionally raise
//! [`ParseError::Partial`] instead of returning `None`/`false` — used where the
//! grammar requires the token and running out of input just means "not yet".

use std::ops::Range;

use crate::error::{ParseError, ParseResult};
use crate::regex_match::{MatchOutcome, PartialMatcher};

/// A located match: the text before it (`prelude`), the byte range of the match
/// itself, and any capture groups (regex matches only).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FoundMatch {
    pub prelude: String,
    pub range: Range<usize>,
    pub groups: Vec<Option<Range<usize>>>,
}

pub struct Cursor<'a> {
    input: &'a str,
    pos: usize,
    is_partial: bool,
}

impl<'a> Cursor<'a> {
    pub fn new(input: &'a str, is_partial: bool) -> Self {
        Self {
            input,
            pos: 0,
            is_partial,
        }
    }

    pub fn pos(&self) -> usize {
        self.pos
    }

    pub fn input(&self) -> &'a str {
        self.input
    }

    pub fn is_partial(&self) -> bool {
        self.is_partial
    }

    pub fn at_eof(&self) -> bool {
        self.pos >= self.input.len()
    }

    /// Everything from the cursor's current position to the end, without consuming it.
    pub fn tail(&self) -> &'a str {
        &self.input[self.pos..]
    }

    /// Advance while the next character is ASCII whitespace. Returns whether anything
    /// was consumed.
    pub fn consume_spaces(&mut self) -> bool {
        let start = self.pos;
        let tail = self.tail();
        let consumed = tail.len() - tail.trim_start().len();
        self.pos += consumed;
        self.pos != start
    }

    /// Advance past `s` if the cursor is sitting on it exactly.
    pub fn try_consume_literal(&mut self, s: &str) -> bool {
        if self.tail().starts_with(s) {
            self.pos += s.len();
            true
        } else {
            false
        }
    }

    /// As [`Cursor::try_consume_literal`], but a miss is a hard "not yet" rather than
    /// a quiet `false` — the grammar requires this literal to appear eventually.
    pub fn consume_literal(&mut self, s: &str) -> ParseResult<()> {
        if self.try_consume_literal(s) {
            Ok(())
        } else {
            Err(ParseError::Partial(s.to_string()))
        }
    }

    /// Find `s` at or after the cursor. On a clean hit, returns the text before the
    /// match and advances past it. On a miss with `is_partial`, checks whether the
    /// tail is a non-empty proper prefix of `s` (the token is mid-arrival) and, if so,
    /// returns a match spanning that trailing fragment.
    ///
    /// When `append_prelude_to` is supplied, the prelude is pushed there instead of
    /// being returned (and the returned `prelude` field is left empty) — the shortcut
    /// dialect handlers use to accumulate plain text while scanning forward for a
    /// marker.
    pub fn try_find_literal(
        &mut self,
        s: &str,
        mut append_prelude_to: Option<&mut String>,
    ) -> Option<FoundMatch> {
        let tail = self.tail();
        if let Some(rel) = tail.find(s) {
            let prelude = tail[..rel].to_string();
            let match_start = self.pos + rel;
            let match_end = match_start + s.len();
            self.pos = match_end;
            let prelude = match append_prelude_to.take() {
                Some(buf) => {
                    buf.push_str(&prelude);
                    String::new()
                }
                None => prelude,
            };
            return Some(FoundMatch {
                prelude,
                range: match_start..match_end,
                groups: vec![Some(match_start..match_end)],
            });
        }

        if !self.is_partial {
            return None;
        }

        // Longest suffix of the tail that is a proper prefix of `s`.
        let max_len = tail.len().min(s.len().saturating_sub(1));
        for len in (1..=max_len).rev() {
            let suffix_start = tail.len() - len;
            if !tail.is_char_boundary(suffix_start) {
                continue;
            }
            let suffix = &tail[suffix_start..];
            if s.starts_with(suffix) {
                let prelude = tail[..suffix_start].to_string();
                let abs_start = self.pos + suffix_start;
                let abs_end = self.input.len();
                self.pos = abs_end;
                let prelude = match append_prelude_to.take() {
                    Some(buf) => {
                        buf.push_str(&prelude);
                        String::new()
                    }
                    None => prelude,
                };
                return Some(FoundMatch {
                    prelude,
                    range: abs_start..abs_end,
                    groups: vec![Some(abs_start..abs_end)],
                });
            }
        }
        None
    }

    /// Search `matcher` from byte offset `from` (must be `>= pos`). `Full` behaves
    /// like [`Cursor::try_find_literal`]; a `Partial` outcome on partial input raises
    /// [`ParseError::Partial`] instead of returning `None`, since the caller cannot
    /// yet tell whether the match will complete.
    pub fn try_find_regex(
        &mut self,
        matcher: &dyn PartialMatcher,
        from: usize,
        mut append_prelude_to: Option<&mut String>,
    ) -> ParseResult<Option<FoundMatch>> {
        debug_assert!(from >= self.pos);
        match matcher.search(self.input, from) {
            MatchOutcome::Full { range, groups } => {
                let prelude = self.input[self.pos..range.start].to_string();
                self.pos = range.end;
                let prelude = match append_prelude_to.take() {
                    Some(buf) => {
                        buf.push_str(&prelude);
                        String::new()
                    }
                    None => prelude,
                };
                Ok(Some(FoundMatch {
                    prelude,
                    range,
                    groups,
                }))
            }
            MatchOutcome::Partial { .. } => {
                if self.is_partial {
                    Err(ParseError::Partial("regex".to_string()))
                } else {
                    Ok(None)
                }
            }
            MatchOutcome::None => Ok(None),
        }
    }

    /// A `Full` match anchored exactly at `pos` (not searched forward).
    pub fn try_consume_regex(&mut self, matcher: &dyn PartialMatcher) -> ParseResult<Option<FoundMatch>> {
        let pos = self.pos;
        match matcher.search(self.input, pos) {
            MatchOutcome::Full { range, groups } if range.start == pos => {
                self.pos = range.end;
                Ok(Some(FoundMatch {
                    prelude: String::new(),
                    range,
                    groups,
                }))
            }
            MatchOutcome::Partial { start } if start == pos && self.is_partial => {
                Err(ParseError::Partial("regex".to_string()))
            }
            _ => Ok(None),
        }
    }

    /// As [`Cursor::try_consume_regex`], but a miss is a hard "not yet".
    pub fn consume_regex(&mut self, matcher: &dyn PartialMatcher) -> ParseResult<FoundMatch> {
        match self.try_consume_regex(matcher)? {
            Some(m) => Ok(m),
            None => Err(ParseError::Partial("regex".to_string())),
        }
    }

    /// Consume and return everything remaining.
    pub fn consume_rest(&mut self) -> &'a str {
        let rest = self.tail();
        self.pos = self.input.len();
        rest
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::regex_match::RegexMatcher;

    #[test]
    fn consume_spaces_advances_and_reports() {
        let mut c = Cursor::new("   abc", false);
        assert!(c.consume_spaces());
        assert_eq!(c.pos(), 3);
        assert!(!c.consume_spaces());
    }

    #[test]
    fn try_consume_literal_leaves_pos_on_miss() {
        let mut c = Cursor::new("abc", false);
        assert!(!c.try_consume_literal("xyz"));
        assert_eq!(c.pos(), 0);
        assert!(c.try_consume_literal("ab"));
        assert_eq!(c.pos(), 2);
    }

    #[test]
    fn consume_literal_fails_partial_on_miss() {
        let mut c = Cursor::new("ab", false);
        let err = c.consume_literal("abc").unwrap_err();
        assert_eq!(err, ParseError::Partial("abc".to_string()));
        assert_eq!(c.pos(), 0);
    }

    #[test]
    fn try_find_literal_returns_prelude_and_advances() {
        let mut c = Cursor::new("hello </think> world", false);
        let m = c.try_find_literal("</think>", None).unwrap();
        assert_eq!(m.prelude, "hello ");
        assert_eq!(c.pos(), "hello </think>".len());
    }

    #[test]
    fn try_find_literal_partial_suffix_on_partial_input() {
        let mut c = Cursor::new("hello </thi", true);
        let m = c.try_find_literal("</think>", None).unwrap();
        assert_eq!(m.prelude, "hello ");
        assert!(c.at_eof());
    }

    #[test]
    fn try_find_literal_no_partial_suffix_on_complete_input() {
        let mut c = Cursor::new("hello </thi", false);
        assert!(c.try_find_literal("</think>", None).is_none());
        assert_eq!(c.pos(), 0);
    }

    #[test]
    fn try_find_literal_appends_prelude_to_sink() {
        let mut c = Cursor::new("pre</end>post", false);
        let mut sink = String::new();
        let m = c.try_find_literal("</end>", Some(&mut sink)).unwrap();
        assert_eq!(sink, "pre");
        assert_eq!(m.prelude, "");
    }

    #[test]
    fn try_find_regex_partial_raises_on_partial_input() {
        let re = RegexMatcher::compile(r"</think>").unwrap();
        let mut c = Cursor::new("abc</thi", true);
        let err = c.try_find_regex(&re, 0, None).unwrap_err();
        assert_eq!(err, ParseError::Partial("regex".to_string()));
    }

    #[test]
    fn try_find_regex_partial_returns_none_on_complete_input() {
        let re = RegexMatcher::compile(r"</think>").unwrap();
        let mut c = Cursor::new("abc</thi", false);
        assert!(c.try_find_regex(&re, 0, None).unwrap().is_none());
    }

    #[test]
    fn consume_rest_drains_tail() {
        let mut c = Cursor::new("abcdef", false);
        c.try_consume_literal("abc");
        assert_eq!(c.consume_rest(), "def");
        assert!(c.at_eof());
    }
}
