//! Reasoning-window extractor (C2): recognizes `<think>…</think>`-style windows and
//! routes the text to either `reasoning_content` or `content` depending on dialect
//! policy.
//!
//! Unlike the teacher's [`nano_v3`/`cohere_cmd`] parsers, which hold open-ended
//! streaming state across chunks, this operates on one cursor position per call —
//! this crate re-parses from scratch on every invocation (§1, Non-goals), so there is
//! no parser-owned state to carry between calls beyond what's already in the cursor
//! and the message under construction.

use crate::cursor::Cursor;
use crate::error::ParseResult;
use crate::message::MessageBuilder;

/// Which reasoning dialect (if any) is active for this parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReasoningFormat {
    /// No reasoning recognition at all.
    None,
    /// `<think>...</think>`, always wrapped in those literal tags in the
    /// content-routed case regardless of the configured start/end tokens.
    DeepSeek,
    /// A dialect-supplied pair of start/end tokens.
    Generic,
}

#[derive(Debug, Clone)]
pub struct ReasoningConfig {
    pub format: ReasoningFormat,
    pub think_start: String,
    pub think_end: String,
    /// Route recognized reasoning text into `content` (wrapped in tags) instead of
    /// `reasoning_content`.
    pub reasoning_in_content: bool,
    /// Treat the cursor as already inside a reasoning window, without requiring
    /// `think_start` to appear (some dialects start "hot" in reasoning mode).
    pub thinking_forced_open: bool,
}

/// Attempts to recognize and consume one reasoning window at the cursor. Returns
/// whether a window was recognized (even if left open by partial input).
pub fn extract_reasoning(cursor: &mut Cursor<'_>, config: &ReasoningConfig, message: &mut MessageBuilder) -> ParseResult<bool> {
    if config.format == ReasoningFormat::None {
        return Ok(false);
    }

    if !config.thinking_forced_open && !cursor.try_consume_literal(&config.think_start) {
        return Ok(false);
    }

    let (reasoning_text, closed) = match cursor.try_find_literal(&config.think_end, None) {
        Some(found) => (found.prelude, true),
        None => (cursor.consume_rest().to_string(), !cursor.is_partial()),
    };

    if reasoning_text.trim().is_empty() {
        if closed {
            cursor.consume_spaces();
        }
        return Ok(true);
    }

    if config.reasoning_in_content {
        let (open, close) = match config.format {
            ReasoningFormat::DeepSeek => ("<think>", "</think>"),
            _ => (config.think_start.as_str(), config.think_end.as_str()),
        };
        message.add_content(open);
        message.add_content(&reasoning_text);
        if closed {
            message.add_content(close);
        }
    } else {
        message.add_reasoning_content(reasoning_text.trim());
    }

    if closed {
        cursor.consume_spaces();
    }
    Ok(true)
}
