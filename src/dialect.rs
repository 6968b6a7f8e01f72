//! A minimal concrete JSON tool-call dialect (C9): `{"name": ..., "arguments": {...}}`,
//! grounded on the field shape `CohereParser::convert_tool_call` reads off a parsed
//! `Value` (`tool_parser/src/parsers/cohere.rs`), simplified to the plain OpenAI-style
//! `name`/`arguments` keys since format aliasing is itself a dialect concern and out
//! of scope here (§1).
//!
//! Format dialects proper are out of scope for this crate; this one exists so the
//! core primitives (cursor, JSON healing, the dumper, the message builder) are
//! exercised end to end rather than only unit-tested in isolation.

use crate::cursor::Cursor;
use crate::dumper::dump;
use crate::error::ParseResult;
use crate::json_consumer::try_consume_json;
use crate::marker::generate_healing_marker;
use crate::message::Message;
use crate::message::MessageBuilder;
use crate::partial_json::DefaultPartialJsonParser;
use crate::schema::Tool;

/// Parses `input` as plain text optionally followed by one
/// `{"name": ..., "arguments": {...}}` tool call. `tools`, if non-empty, is consulted
/// to reject an unrecognized function name.
pub fn parse(input: &str, is_partial: bool, tools: &[Tool]) -> ParseResult<Message> {
    let healing_marker = generate_healing_marker(input);
    let mut cursor = Cursor::new(input, is_partial);
    let mut builder = MessageBuilder::new();

    match try_consume_json(&mut cursor, &DefaultPartialJsonParser, &healing_marker)? {
        None => {
            builder.add_content(cursor.consume_rest());
        }
        Some(healed) => {
            let (cleaned, _is_partial_result) = dump(
                healed.value,
                &[vec!["arguments".to_string()]],
                &[],
                healed.healing.as_ref(),
                is_partial,
            )?;
            let name = cleaned.get("name").and_then(|v| v.as_str()).unwrap_or_default();
            if !name.is_empty() && (tools.is_empty() || tools.iter().any(|t| t.function.name == name)) {
                let arguments = cleaned
                    .get("arguments")
                    .and_then(|v| v.as_str())
                    .unwrap_or("{}")
                    .to_string();
                builder.add_tool_call(name, "", arguments);
            }
        }
    }

    builder.finish(&cursor)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::test_tool;
    use serde_json::json;

    #[test]
    fn plain_text_with_no_tool_call() {
        let message = parse("Hello.", false, &[]).unwrap();
        assert_eq!(message.content, "Hello.");
        assert!(message.tool_calls.is_empty());
    }

    #[test]
    fn complete_tool_call_round_trips_arguments() {
        let input = r#"{"name":"sum","arguments":{"a":1,"b":2}}"#;
        let message = parse(input, false, &[]).unwrap();
        assert_eq!(message.tool_calls.len(), 1);
        assert_eq!(message.tool_calls[0].name, "sum");
        let args: serde_json::Value = serde_json::from_str(&message.tool_calls[0].arguments).unwrap();
        assert_eq!(args, json!({"a": 1, "b": 2}));
    }

    #[test]
    fn partial_tool_call_heals_arguments() {
        let input = r#"{"name":"sum","arguments":{"a":1,"b":"#;
        let message = parse(input, true, &[]).unwrap();
        assert_eq!(message.tool_calls.len(), 1);
        assert_eq!(message.tool_calls[0].name, "sum");
        assert_eq!(message.tool_calls[0].arguments, r#"{"a":1,"b":"#);
    }

    #[test]
    fn unknown_tool_name_is_silently_skipped() {
        let tools = vec![test_tool("sum", json!({}))];
        let input = r#"{"name":"mul","arguments":{}}"#;
        let message = parse(input, false, &tools).unwrap();
        assert!(message.tool_calls.is_empty());
    }

}
