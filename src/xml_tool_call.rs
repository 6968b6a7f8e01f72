//! Embedded XML tool-call extractor (C5).
//!
//! A bounded, iterative scan for
//! `<tool_call><function=NAME><parameter=KEY>VALUE</parameter>…</function></tool_call>`
//! blocks, zero-copy over the input slice wherever the content doesn't need rewriting.
//! Grounded on the find-and-resume-search shape of `CohereParser::extract_action_json`
//! (`tool_parser/src/parsers/cohere.rs`), generalized from a fixed pair of markers to
//! named, attributed tags.

use std::collections::HashSet;

use num_traits::cast::NumCast;
use serde_json::Value;

use crate::error::{ParseError, ParseResult};
use crate::message::MessageBuilder;
use crate::schema::Tool;

pub const MAX_INPUT: usize = 1024 * 1024;
pub const MAX_PARAMS: usize = 100;
pub const MAX_TOOLS: usize = 100;
pub const MAX_TAG_NAME: usize = 256;
pub const MAX_ATTR: usize = 1024;

/// A located tag: `content` is the zero-copy slice between the opening tag's `>` and
/// the matching closing tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlTag<'a> {
    pub name: &'a str,
    pub attribute: Option<String>,
    pub content: &'a str,
    pub start: usize,
    pub end: usize,
}

/// Locate `<name…>…</name>` at or after `from`. Resumes past prefix collisions (e.g.
/// searching for `tool` inside `<tool_call>`) rather than treating them as a match.
/// `Ok(None)` means not found (or not yet complete) — not an error.
pub fn find_tag<'a>(text: &'a str, name: &'a str, from: usize) -> ParseResult<Option<XmlTag<'a>>> {
    let open_needle = format!("<{name}");
    let mut search_from = from;
    loop {
        if search_from > text.len() {
            return Ok(None);
        }
        let Some(rel) = text[search_from..].find(open_needle.as_str()) else {
            return Ok(None);
        };
        let cand_start = search_from + rel;
        let after_name = cand_start + open_needle.len();
        match text[after_name..].chars().next() {
            Some('>') | Some('=') => {}
            Some(c) if c.is_whitespace() => {}
            None => return Ok(None),
            _ => {
                search_from = cand_start + 1;
                continue;
            }
        }

        let Some(gt_rel) = text[after_name..].find('>') else {
            return Ok(None);
        };
        let gt_pos = after_name + gt_rel;
        let attribute = parse_attribute(&text[after_name..gt_pos], cand_start)?;

        let open_end = gt_pos + 1;
        let close_needle = format!("</{name}>");
        let Some(close_rel) = text[open_end..].find(close_needle.as_str()) else {
            return Ok(None);
        };
        let close_start = open_end + close_rel;
        let close_end = close_start + close_needle.len();

        return Ok(Some(XmlTag {
            name,
            attribute,
            content: &text[open_end..close_start],
            start: cand_start,
            end: close_end,
        }));
    }
}

/// Repeated [`find_tag`] calls, each resuming at the previous match's end. Errors with
/// [`ParseError::TooManyParameters`] past `MAX_PARAMS` matches.
pub fn find_all_tags<'a>(text: &'a str, name: &'a str, from: usize) -> ParseResult<Vec<XmlTag<'a>>> {
    let mut tags = Vec::new();
    let mut pos = from;
    while let Some(tag) = find_tag(text, name, pos)? {
        pos = tag.end;
        tags.push(tag);
        if tags.len() > MAX_PARAMS {
            return Err(ParseError::TooManyParameters { max: MAX_PARAMS });
        }
    }
    Ok(tags)
}

fn parse_attribute(src: &str, tag_pos: usize) -> ParseResult<Option<String>> {
    let after_ws = src.trim_start();
    let Some(after_eq) = after_ws.strip_prefix('=') else {
        return Ok(None);
    };
    let after_eq = after_eq.trim_start();
    let value = if let Some(rest) = after_eq.strip_prefix('"') {
        &rest[..rest.find('"').unwrap_or(rest.len())]
    } else if let Some(rest) = after_eq.strip_prefix('\'') {
        &rest[..rest.find('\'').unwrap_or(rest.len())]
    } else {
        after_eq.trim_end()
    };
    if value.len() > MAX_ATTR {
        return Err(ParseError::AttributeTooLong {
            position: tag_pos,
            max: MAX_ATTR,
        });
    }
    Ok(Some(value.to_string()))
}

/// Scans `text` for top-level `<tool_call>` blocks, appending everything else to
/// `message`'s content and each recognized call via `add_tool_call`. Stops and
/// propagates on the first hard error (size limits, malformed framing, unknown
/// function); text and tool calls already committed stand.
pub fn extract_tool_calls(text: &str, tools: &[Tool], message: &mut MessageBuilder) -> ParseResult<()> {
    if text.len() > MAX_INPUT {
        return Err(ParseError::InputTooLarge { max: MAX_INPUT });
    }
    if tools.len() > MAX_TOOLS {
        return Err(ParseError::TooManyTools { max: MAX_TOOLS });
    }
    let tool_names: HashSet<&str> = tools.iter().map(|t| t.function.name.as_str()).collect();

    let mut pos = 0;
    loop {
        match find_tag(text, "tool_call", pos)? {
            Some(tag) => {
                message.add_content(&text[pos..tag.start]);
                let (name, arguments) = parse_single_tool_call(tag.content, tools, &tool_names)?;
                message.add_tool_call(name, "", arguments);
                pos = tag.end;
            }
            None => {
                message.add_content(&text[pos..]);
                break;
            }
        }
    }
    Ok(())
}

fn parse_single_tool_call(
    content: &str,
    tools: &[Tool],
    tool_names: &HashSet<&str>,
) -> ParseResult<(String, String)> {
    let function_tag = find_tag(content, "function", 0)?
        .ok_or_else(|| ParseError::InvalidXmlStructure {
            position: 0,
            message: "no <function=NAME> block inside <tool_call>".to_string(),
        })?;

    let name = function_tag.attribute.unwrap_or_default();
    if name.is_empty() {
        return Err(ParseError::InvalidFunctionName {
            position: function_tag.start,
            message: "function name is empty".to_string(),
        });
    }
    if name.len() > MAX_TAG_NAME {
        return Err(ParseError::TagNameTooLong {
            position: function_tag.start,
            max: MAX_TAG_NAME,
        });
    }
    if !tools.is_empty() && !tool_names.contains(name.as_str()) {
        return Err(ParseError::FunctionNotFound { name });
    }

    let schema = tools.iter().find(|t| t.function.name == name);
    let mut arguments = serde_json::Map::new();
    for param in find_all_tags(function_tag.content, "parameter", 0)? {
        let Some(key) = param.attribute.filter(|k| !k.is_empty()) else {
            tracing::debug!("skipping <parameter> with missing key");
            continue;
        };
        if key.len() > MAX_TAG_NAME {
            return Err(ParseError::TagNameTooLong {
                position: param.start,
                max: MAX_TAG_NAME,
            });
        }
        let (value, conversion_error) = convert_value(param.content, &key, schema);
        if let Some(err) = conversion_error {
            tracing::debug!(%key, %err, "parameter conversion fell back to string");
        }
        arguments.insert(key, value);
    }

    let serialized = serde_json::to_string(&Value::Object(arguments))
        .map_err(|e| ParseError::JsonSerializationFailed(e.to_string()))?;
    Ok((name, serialized))
}

/// Coerces a raw parameter VALUE per the declared schema type for `key` (falling back
/// to a JSON-escaped string on any mismatch), or infers a type when no schema entry
/// exists. Returns the coerced value plus a soft [`ParseError::ParameterConversionFailed`]
/// to log (not raise) when a typed coercion had to fall back.
fn convert_value(raw: &str, key: &str, schema: Option<&Tool>) -> (Value, Option<ParseError>) {
    let trimmed = raw.trim();
    if trimmed == "null" {
        return (Value::Null, None);
    }

    if let Some(ty) = schema.and_then(|tool| tool.param_type(key)) {
        return match ty {
            "string" | "str" | "text" => (Value::String(trimmed.to_string()), None),
            "integer" | "int" => match trimmed.parse::<i64>().ok().and_then(<i32 as NumCast>::from) {
                Some(i) => (Value::Number(i.into()), None),
                None => (
                    Value::String(trimmed.to_string()),
                    Some(ParseError::ParameterConversionFailed {
                        key: key.to_string(),
                        message: format!("{trimmed:?} is not a valid 32-bit integer"),
                    }),
                ),
            },
            "number" | "float" => match trimmed.parse::<f64>().ok().and_then(|v| {
                let f = v as f32;
                f.is_finite().then_some(f)
            }) {
                Some(f) => (
                    Value::Number(serde_json::Number::from_f64(f as f64).expect("finite f32 always serializes")),
                    None,
                ),
                None => (
                    Value::String(trimmed.to_string()),
                    Some(ParseError::ParameterConversionFailed {
                        key: key.to_string(),
                        message: format!("{trimmed:?} is not a valid 32-bit float"),
                    }),
                ),
            },
            "boolean" | "bool" => (Value::Bool(trimmed == "true"), None),
            "object" | "array" => match serde_json::from_str(trimmed) {
                Ok(v) => (v, None),
                Err(e) => (
                    Value::String(trimmed.to_string()),
                    Some(ParseError::ParameterConversionFailed {
                        key: key.to_string(),
                        message: e.to_string(),
                    }),
                ),
            },
            _ => (Value::String(trimmed.to_string()), None),
        };
    }

    if let Ok(v) = serde_json::from_str::<Value>(trimmed) {
        return (v, None);
    }
    if let Ok(i) = trimmed.parse::<i64>() {
        return (Value::Number(i.into()), None);
    }
    if let Ok(f) = trimmed.parse::<f64>() {
        if let Some(n) = serde_json::Number::from_f64(f) {
            return (Value::Number(n), None);
        }
    }
    match trimmed {
        "true" => (Value::Bool(true), None),
        "false" => (Value::Bool(false), None),
        _ => (Value::String(trimmed.to_string()), None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::test_tool;
    use serde_json::json;

    #[test]
    fn find_tag_skips_prefix_collision() {
        let text = "<tool_call>hi</tool_call>";
        let tag = find_tag(text, "tool", 0).unwrap();
        assert!(tag.is_none());
    }

    #[test]
    fn find_tag_extracts_content_and_attribute() {
        let text = "before<function=add>body</function>after";
        let tag = find_tag(text, "function", 0).unwrap().unwrap();
        assert_eq!(tag.attribute.as_deref(), Some("add"));
        assert_eq!(tag.content, "body");
        assert_eq!(&text[tag.start..tag.end], "<function=add>body</function>");
    }

    #[test]
    fn find_tag_accepts_quoted_attribute() {
        let text = r#"<parameter="x y">1</parameter>"#;
        let tag = find_tag(text, "parameter", 0).unwrap().unwrap();
        assert_eq!(tag.attribute.as_deref(), Some("x y"));
    }

    #[test]
    fn find_all_tags_resumes_after_each_match() {
        let text = "<parameter=x>1</parameter><parameter=y>2</parameter>";
        let tags = find_all_tags(text, "parameter", 0).unwrap();
        assert_eq!(tags.len(), 2);
        assert_eq!(tags[0].attribute.as_deref(), Some("x"));
        assert_eq!(tags[1].attribute.as_deref(), Some("y"));
    }

    #[test]
    fn extract_tool_call_with_typed_parameters() {
        let tools = vec![test_tool(
            "add",
            json!({"x": {"type": "integer"}, "y": {"type": "number"}}),
        )];
        let mut message = MessageBuilder::new();
        let input = "ok <tool_call><function=add><parameter=x>3</parameter><parameter=y>4.5</parameter></function></tool_call>";
        extract_tool_calls(input, &tools, &mut message).unwrap();
        assert_eq!(message.content(), "ok ");
        assert_eq!(message.tool_calls().len(), 1);
        let call = &message.tool_calls()[0];
        assert_eq!(call.name, "add");
        let args: Value = serde_json::from_str(&call.arguments).unwrap();
        assert_eq!(args, json!({"x": 3, "y": 4.5}));
    }

    #[test]
    fn unknown_function_is_rejected() {
        let tools = vec![test_tool("add", json!({}))];
        let mut message = MessageBuilder::new();
        let input = "<tool_call><function=mul><parameter=x>3</parameter></function></tool_call>";
        let err = extract_tool_calls(input, &tools, &mut message).unwrap_err();
        assert!(matches!(err, ParseError::FunctionNotFound { .. }));
        assert!(message.tool_calls().is_empty());
    }

    #[test]
    fn string_value_escaping_round_trips() {
        let tools = vec![test_tool("q", json!({"q": {"type": "string"}}))];
        let mut message = MessageBuilder::new();
        let input = r#"<tool_call><function=q><parameter=q>He said "hi"</parameter></function></tool_call>"#;
        extract_tool_calls(input, &tools, &mut message).unwrap();
        let call = &message.tool_calls()[0];
        let args: Value = serde_json::from_str(&call.arguments).unwrap();
        assert_eq!(args["q"], "He said \"hi\"");
    }

    #[test]
    fn integer_out_of_range_falls_back_to_string() {
        let tools = vec![test_tool("f", json!({"n": {"type": "integer"}}))];
        let mut message = MessageBuilder::new();
        let input = "<tool_call><function=f><parameter=n>2147483648</parameter></function></tool_call>";
        extract_tool_calls(input, &tools, &mut message).unwrap();
        let call = &message.tool_calls()[0];
        let args: Value = serde_json::from_str(&call.arguments).unwrap();
        assert_eq!(args["n"], "2147483648");
    }

    #[test]
    fn untyped_parameter_infers_number() {
        let mut message = MessageBuilder::new();
        let input = "<tool_call><function=f><parameter=n>42</parameter></function></tool_call>";
        extract_tool_calls(input, &[], &mut message).unwrap();
        let call = &message.tool_calls()[0];
        let args: Value = serde_json::from_str(&call.arguments).unwrap();
        assert_eq!(args["n"], 42);
    }

    #[test]
    fn input_over_max_size_is_rejected() {
        let huge = "x".repeat(MAX_INPUT + 1);
        let mut message = MessageBuilder::new();
        let err = extract_tool_calls(&huge, &[], &mut message).unwrap_err();
        assert!(matches!(err, ParseError::InputTooLarge { .. }));
    }

    #[test]
    fn too_many_parameters_is_rejected() {
        let mut body = String::new();
        for i in 0..=MAX_PARAMS {
            body.push_str(&format!("<parameter=p{i}>1</parameter>"));
        }
        let input = format!("<tool_call><function=f>{body}</function></tool_call>");
        let mut message = MessageBuilder::new();
        let err = extract_tool_calls(&input, &[], &mut message).unwrap_err();
        assert!(matches!(err, ParseError::TooManyParameters { .. }));
    }
}
