//! Message accumulator (C6).
//!
//! Mirrors the shape `openai_protocol::common` gives a chat message in the teacher
//! crate, but built incrementally: dialect handlers and the XML parser append to it
//! as they recognize content, reasoning, and tool calls, and `finish()` enforces the
//! "fully consumed unless still partial" invariant.

use serde::{Deserialize, Serialize};

use crate::cursor::Cursor;
use crate::error::{ParseError, ParseResult};

/// A single extracted tool call. `arguments` is always a JSON text — complete, or the
/// healed/truncated prefix of one when produced from partial input.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCall {
    pub name: String,
    #[serde(default)]
    pub id: String,
    pub arguments: String,
}

/// The assistant message under construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: String,
    pub content: String,
    pub reasoning_content: String,
    pub tool_calls: Vec<ToolCall>,
}

impl Default for Message {
    fn default() -> Self {
        Self {
            role: "assistant".to_string(),
            content: String::new(),
            reasoning_content: String::new(),
            tool_calls: Vec::new(),
        }
    }
}

/// Builds a [`Message`] incrementally. All accumulators are append-only and
/// idempotent to call with empty input.
#[derive(Debug, Default)]
pub struct MessageBuilder {
    message: Message,
}

impl MessageBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_content(&mut self, text: &str) {
        self.message.content.push_str(text);
    }

    pub fn add_reasoning_content(&mut self, text: &str) {
        self.message.reasoning_content.push_str(text);
    }

    /// Appends a tool call. Rejects (returns `false`, does not append) a call with an
    /// empty name.
    pub fn add_tool_call(&mut self, name: impl Into<String>, id: impl Into<String>, arguments: impl Into<String>) -> bool {
        let name = name.into();
        if name.is_empty() {
            return false;
        }
        self.message.tool_calls.push(ToolCall {
            name,
            id: id.into(),
            arguments: arguments.into(),
        });
        true
    }

    /// All-or-nothing batch append: the first invalid call fails the whole batch and
    /// nothing from it is appended.
    pub fn add_tool_calls(&mut self, calls: Vec<ToolCall>) -> bool {
        if calls.iter().any(|c| c.name.is_empty()) {
            return false;
        }
        self.message.tool_calls.extend(calls);
        true
    }

    pub fn clear_tools(&mut self) {
        self.message.tool_calls.clear();
    }

    pub fn content(&self) -> &str {
        &self.message.content
    }

    pub fn reasoning_content(&self) -> &str {
        &self.message.reasoning_content
    }

    pub fn tool_calls(&self) -> &[ToolCall] {
        &self.message.tool_calls
    }

    /// Finalize the message. Requires that the cursor is either still partial or
    /// fully consumed; a complete parse with leftover input is a hard error.
    pub fn finish(self, cursor: &Cursor<'_>) -> ParseResult<Message> {
        if !cursor.is_partial() && !cursor.at_eof() {
            return Err(ParseError::UnconsumedInput(cursor.pos()));
        }
        Ok(self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_tool_name() {
        let mut b = MessageBuilder::new();
        assert!(!b.add_tool_call("", "id", "{}"));
        assert!(b.tool_calls().is_empty());
    }

    #[test]
    fn accumulates_content_in_order() {
        let mut b = MessageBuilder::new();
        b.add_content("Hello");
        b.add_content(", world");
        assert_eq!(b.content(), "Hello, world");
    }

    #[test]
    fn add_tool_calls_is_all_or_nothing() {
        let mut b = MessageBuilder::new();
        let calls = vec![
            ToolCall { name: "ok".into(), id: String::new(), arguments: "{}".into() },
            ToolCall { name: String::new(), id: String::new(), arguments: "{}".into() },
        ];
        assert!(!b.add_tool_calls(calls));
        assert!(b.tool_calls().is_empty());
    }

    #[test]
    fn finish_rejects_leftover_input_on_complete_parse() {
        let mut cursor = Cursor::new("abc", false);
        cursor.try_consume_literal("ab");
        let b = MessageBuilder::new();
        assert!(matches!(b.finish(&cursor), Err(ParseError::UnconsumedInput(2))));
    }

    #[test]
    fn finish_allows_leftover_input_when_partial() {
        let mut cursor = Cursor::new("abc", true);
        cursor.try_consume_literal("ab");
        let b = MessageBuilder::new();
        assert!(b.finish(&cursor).is_ok());
    }

    #[test]
    fn finish_allows_fully_consumed_complete_input() {
        let mut cursor = Cursor::new("ab", false);
        cursor.try_consume_literal("ab");
        let b = MessageBuilder::new();
        assert!(b.finish(&cursor).is_ok());
    }
}
