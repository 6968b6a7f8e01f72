//! Incremental parser for streaming chat-model output.
//!
//! Converts raw model-generated text into a structured assistant message —
//! [`Message`] — comprising plain content, optional reasoning content, and zero or
//! more tool calls, operating on both complete and still-streaming (partial) input.
//! Truncation mid-token is tolerated via a healing-marker technique ([`partial_json`])
//! so downstream consumers always see well-formed JSON, even from a cut-off stream.
//!
//! The crate is organized leaves-first, matching the component layering of the
//! design this was built against:
//! - [`cursor`] — position-tracked view over the input, with literal/regex primitives.
//! - [`regex_match`] — the pluggable partial-regex matcher contract.
//! - [`reasoning`] — `<think>…</think>`-style reasoning window extraction.
//! - [`partial_json`] / [`json_consumer`] — partial-JSON healing.
//! - [`dumper`] — projects a healed value back to argument/content text.
//! - [`xml_tool_call`] — the embedded XML-subset tool-call extractor.
//! - [`message`] — the message-under-construction accumulator.
//! - [`schema`] — tool/function schema types consulted by parameter coercion.
//! - [`marker`] — healing-marker generation.
//! - [`dialect`] — a minimal concrete JSON tool-call format, exercising the above
//!   pipeline end to end; real format dialects are out of this crate's scope.

pub mod cursor;
pub mod dialect;
pub mod dumper;
pub mod error;
pub mod json_consumer;
pub mod marker;
pub mod message;
pub mod partial_json;
pub mod reasoning;
pub mod regex_match;
pub mod schema;
pub mod xml_tool_call;

pub use cursor::Cursor;
pub use error::{ParseError, ParseResult};
pub use message::{Message, MessageBuilder, ToolCall};
pub use schema::{Function, Tool};
