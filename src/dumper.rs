//! Argument/content dumper (C4): walks a healed value tree and decides, path by
//! path, whether to serialize a subtree to JSON text (`args_paths`), keep a subtree
//! as a plain string (`content_paths`), or drop a subtree whose key or value shows
//! the healing marker landed there.
//!
//! Traversal is iterative via an explicit work stack rather than host recursion —
//! the tree comes from untrusted model output, and nothing bounds its nesting depth.

use serde_json::Value;

use crate::error::{ParseError, ParseResult};
use crate::partial_json::HealingToken;

/// A path into the value tree: a sequence of object keys (array indices are not
/// addressable as declared paths — arrays are always truncated wholesale, never
/// projected through a declared path).
pub type JsonPath = Vec<String>;

/// Walks `value`, projecting `args_paths` to JSON text and `content_paths` to plain
/// strings, and dropping anything downstream of where the healing marker landed.
/// Returns the cleaned value and whether the marker was found anywhere in it.
pub fn dump(
    value: Value,
    args_paths: &[JsonPath],
    content_paths: &[JsonPath],
    healing: Option<&HealingToken>,
    is_partial: bool,
) -> ParseResult<(Value, bool)> {
    // Fast paths (§4.4): nothing to project and nothing was healed.
    if healing.is_none() && args_paths.is_empty() && content_paths.is_empty() {
        return Ok((value, false));
    }
    if args_paths == [Vec::<String>::new()] && healing.is_none() {
        let text = serde_json::to_string(&value).map_err(|e| ParseError::JsonSerializationFailed(e.to_string()))?;
        return Ok((Value::String(text), false));
    }

    let marker = healing.map(|h| h.marker.as_str()).unwrap_or("");
    let json_dump_marker = healing.map(|h| h.json_dump_marker.as_str()).unwrap_or("");

    let mut work = vec![Frame::Enter { value, path: vec![] }];
    let mut results: Vec<(Value, bool)> = vec![];

    while let Some(frame) = work.pop() {
        match frame {
            Frame::Enter { value, path } => {
                if args_paths.iter().any(|p| p == &path) {
                    results.push(serialize_and_truncate(&value, is_partial, marker, json_dump_marker)?);
                    continue;
                }
                if content_paths.iter().any(|p| p == &path) {
                    results.push(truncate_content(value, is_partial, marker)?);
                    continue;
                }
                match value {
                    Value::Object(map) => {
                        let mut kept_keys = Vec::new();
                        let mut key_truncated = false;
                        for key in map.keys() {
                            if is_partial && !marker.is_empty() && key.contains(marker) {
                                key_truncated = true;
                                break;
                            }
                            kept_keys.push(key.clone());
                        }
                        let declared: Vec<bool> = kept_keys
                            .iter()
                            .map(|key| {
                                let mut child_path = path.clone();
                                child_path.push(key.clone());
                                args_paths.iter().any(|p| p == &child_path) || content_paths.iter().any(|p| p == &child_path)
                            })
                            .collect();
                        work.push(Frame::ExitObject {
                            keys: kept_keys.clone(),
                            declared: declared.clone(),
                            found_from_key: key_truncated,
                        });
                        for key in kept_keys.into_iter().rev() {
                            let child = map.get(&key).cloned().unwrap_or(Value::Null);
                            let mut child_path = path.clone();
                            child_path.push(key);
                            work.push(Frame::Enter {
                                value: child,
                                path: child_path,
                            });
                        }
                    }
                    Value::Array(items) => {
                        work.push(Frame::ExitArray { len: items.len() });
                        for (i, item) in items.into_iter().enumerate().rev() {
                            let mut child_path = path.clone();
                            child_path.push(i.to_string());
                            work.push(Frame::Enter {
                                value: item,
                                path: child_path,
                            });
                        }
                    }
                    Value::String(s) => {
                        let found = is_partial && !marker.is_empty() && s.contains(marker);
                        results.push((Value::String(s), found));
                    }
                    scalar => results.push((scalar, false)),
                }
            }
            Frame::ExitObject { keys, declared, found_from_key } => {
                let n = keys.len();
                let mut children: Vec<(Value, bool)> = (0..n).map(|_| results.pop().expect("child pushed")).collect();
                children.reverse();
                let mut entries = serde_json::Map::new();
                let mut found = found_from_key;
                for ((key, is_declared), (child_value, child_found)) in keys.into_iter().zip(declared).zip(children) {
                    if child_found && !is_declared {
                        found = true;
                        break;
                    }
                    entries.insert(key, child_value);
                    if child_found {
                        found = true;
                        break;
                    }
                }
                results.push((Value::Object(entries), found));
            }
            Frame::ExitArray { len } => {
                let mut children: Vec<(Value, bool)> = (0..len).map(|_| results.pop().expect("child pushed")).collect();
                children.reverse();
                let mut items = Vec::new();
                let mut found = false;
                for (child_value, child_found) in children {
                    if child_found {
                        found = true;
                        break;
                    }
                    items.push(child_value);
                }
                results.push((Value::Array(items), found));
            }
        }
    }

    Ok(results.pop().expect("root result always produced"))
}

enum Frame {
    Enter { value: Value, path: JsonPath },
    ExitObject {
        keys: Vec<String>,
        declared: Vec<bool>,
        found_from_key: bool,
    },
    ExitArray { len: usize },
}

/// Serializes `value` to JSON text, truncating it at the point the healing marker
/// landed. A marker spliced in as a whole placeholder value (nothing had been
/// written yet) appears quoted — `json_dump_marker` — and truncating there drops the
/// dangling open quote along with it. A marker appended mid-string (onto a partial
/// string field or key that had already started) appears unquoted inside a longer
/// JSON string literal, so it's located by the raw `marker` instead; the resulting
/// text is left with a dangling open quote, same as any other args subtree that's
/// still mid-token.
fn serialize_and_truncate(value: &Value, is_partial: bool, marker: &str, json_dump_marker: &str) -> ParseResult<(Value, bool)> {
    let mut text = serde_json::to_string(value).map_err(|e| ParseError::JsonSerializationFailed(e.to_string()))?;
    let mut found = false;
    if is_partial && !json_dump_marker.is_empty() {
        if let Some(idx) = text.find(json_dump_marker) {
            text.truncate(idx);
            if text == "\"" {
                text.clear();
            }
            found = true;
        } else if !marker.is_empty() {
            if let Some(idx) = text.find(marker) {
                text.truncate(idx);
                found = true;
            }
        }
    }
    Ok((Value::String(text), found))
}

fn truncate_content(value: Value, is_partial: bool, marker: &str) -> ParseResult<(Value, bool)> {
    let Value::String(mut s) = value else {
        return Err(ParseError::JsonSerializationFailed(
            "content path did not resolve to a string".to_string(),
        ));
    };
    let mut found = false;
    if is_partial && !marker.is_empty() {
        if let Some(idx) = s.find(marker) {
            s.truncate(idx);
            found = true;
        }
    }
    Ok((Value::String(s), found))
}
