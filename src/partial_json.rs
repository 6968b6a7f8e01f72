//! The partial-JSON parser contract (C8) and its default implementation — the first
//! of the two non-trivial sub-algorithms (§1): given a possibly-truncated JSON
//! fragment, produce a value that is valid JSON, plus a marker recording exactly
//! where truncation occurred so a later pass (the dumper, C4) can strip the healed
//! parts back out.

use serde_json::Value;

/// A healing marker pair: `marker` is the raw string spliced into the tree; alongside
/// it callers also need the form the marker takes once re-serialized as a JSON string
/// literal (quotes included) — the two differ because the literal carries its own
/// quote characters. `try_consume_json` (C3) and the dumper (C4) search for whichever
/// form is appropriate to where the marker landed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HealingToken {
    pub marker: String,
    pub json_dump_marker: String,
}

impl HealingToken {
    pub fn new(marker: &str) -> Self {
        let json_dump_marker =
            serde_json::to_string(&Value::String(marker.to_string())).expect("string always serializes");
        Self {
            marker: marker.to_string(),
            json_dump_marker,
        }
    }
}

/// Result of a (possibly tolerant) JSON parse.
#[derive(Debug, Clone, PartialEq)]
pub struct Healed {
    pub value: Value,
    pub healing: Option<HealingToken>,
}

/// External collaborator (C8): parses a JSON fragment, healing truncation with the
/// supplied marker. Returns `None` on a syntax error that isn't explained by running
/// out of input (a malformed fragment, not merely an incomplete one).
pub trait PartialJsonParser: Send + Sync {
    fn parse(&self, text: &str, healing_marker: &str) -> Option<Healed>;
}

/// Default [`PartialJsonParser`]: a strict `serde_json` parse first, falling back to
/// a tolerant hand-written scanner that repairs exactly the truncations a streaming
/// LLM produces (see module docs and the design notes for the three cases it heals).
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultPartialJsonParser;

impl PartialJsonParser for DefaultPartialJsonParser {
    fn parse(&self, text: &str, healing_marker: &str) -> Option<Healed> {
        if let Ok(value) = serde_json::from_str::<Value>(text) {
            return Some(Healed { value, healing: None });
        }
        heal(text, healing_marker)
    }
}

/// Whether a value-parsing attempt produced a real value, or had to be abandoned
/// because the ambiguity of the truncation makes any value unsafe to report (e.g. a
/// number cut off mid-digit — more digits might still be coming).
enum ValueOutcome {
    Present(Value),
    Dropped,
}

struct Scanner<'a> {
    text: &'a str,
    bytes: &'a [u8],
    pos: usize,
    marker: &'a str,
    healed: bool,
}

fn heal(text: &str, marker: &str) -> Option<Healed> {
    let mut sc = Scanner {
        text,
        bytes: text.as_bytes(),
        pos: 0,
        marker,
        healed: false,
    };
    sc.skip_ws();
    if sc.pos >= sc.bytes.len() {
        return None;
    }
    let value = match sc.parse_value()? {
        ValueOutcome::Present(v) => v,
        ValueOutcome::Dropped => return None,
    };
    if !sc.healed {
        sc.skip_ws();
        if sc.pos != sc.bytes.len() {
            return None; // trailing garbage after a value serde_json itself would reject
        }
    }
    Some(Healed {
        value,
        healing: sc.healed.then(|| HealingToken::new(marker)),
    })
}

impl<'a> Scanner<'a> {
    fn skip_ws(&mut self) {
        while self.pos < self.bytes.len() && (self.bytes[self.pos] as char).is_ascii_whitespace() {
            self.pos += 1;
        }
    }

    fn eof(&self) -> bool {
        self.pos >= self.bytes.len()
    }

    fn parse_value(&mut self) -> Option<ValueOutcome> {
        self.skip_ws();
        if self.eof() {
            // A value was expected but input ran out before it started at all.
            self.healed = true;
            return Some(ValueOutcome::Present(Value::String(self.marker.to_string())));
        }
        match self.bytes[self.pos] {
            b'{' => self.parse_object(),
            b'[' => self.parse_array(),
            b'"' => Some(ValueOutcome::Present(Value::String(self.parse_string()?))),
            b't' | b'f' | b'n' => self.parse_keyword(),
            b'-' | b'0'..=b'9' => self.parse_number(),
            _ => None,
        }
    }

    fn parse_string(&mut self) -> Option<String> {
        debug_assert_eq!(self.bytes[self.pos], b'"');
        self.pos += 1;
        let mut out = String::new();
        loop {
            if self.eof() {
                self.healed = true;
                out.push_str(self.marker);
                return Some(out);
            }
            match self.bytes[self.pos] {
                b'"' => {
                    self.pos += 1;
                    return Some(out);
                }
                b'\\' => {
                    self.pos += 1;
                    if self.eof() {
                        self.healed = true;
                        out.push_str(self.marker);
                        return Some(out);
                    }
                    match self.bytes[self.pos] {
                        b'"' => { out.push('"'); self.pos += 1; }
                        b'\\' => { out.push('\\'); self.pos += 1; }
                        b'/' => { out.push('/'); self.pos += 1; }
                        b'b' => { out.push('\u{8}'); self.pos += 1; }
                        b'f' => { out.push('\u{c}'); self.pos += 1; }
                        b'n' => { out.push('\n'); self.pos += 1; }
                        b'r' => { out.push('\r'); self.pos += 1; }
                        b't' => { out.push('\t'); self.pos += 1; }
                        b'u' => {
                            self.pos += 1;
                            if self.pos + 4 > self.bytes.len() {
                                self.healed = true;
                                out.push_str(self.marker);
                                return Some(out);
                            }
                            if let Ok(cp) = u32::from_str_radix(&self.text[self.pos..self.pos + 4], 16) {
                                if let Some(ch) = char::from_u32(cp) {
                                    out.push(ch);
                                }
                            }
                            self.pos += 4;
                        }
                        other => {
                            out.push(other as char);
                            self.pos += 1;
                        }
                    }
                }
                b0 => {
                    let len = utf8_len(b0);
                    if self.pos + len > self.bytes.len() {
                        self.healed = true;
                        out.push_str(self.marker);
                        return Some(out);
                    }
                    out.push_str(&self.text[self.pos..self.pos + len]);
                    self.pos += len;
                }
            }
        }
    }

    fn parse_keyword(&mut self) -> Option<ValueOutcome> {
        for (kw, val) in [
            ("true", Value::Bool(true)),
            ("false", Value::Bool(false)),
            ("null", Value::Null),
        ] {
            let tail = &self.text[self.pos..];
            if tail.starts_with(kw) {
                self.pos += kw.len();
                return Some(ValueOutcome::Present(val));
            }
            if kw.starts_with(tail) {
                self.pos = self.bytes.len();
                self.healed = true;
                return Some(ValueOutcome::Dropped);
            }
        }
        None
    }

    fn parse_number(&mut self) -> Option<ValueOutcome> {
        let start = self.pos;
        if self.bytes[self.pos] == b'-' {
            self.pos += 1;
        }
        let digits_start = self.pos;
        while !self.eof() && self.bytes[self.pos].is_ascii_digit() {
            self.pos += 1;
        }
        if self.pos == digits_start {
            return None;
        }
        if !self.eof() && self.bytes[self.pos] == b'.' {
            self.pos += 1;
            while !self.eof() && self.bytes[self.pos].is_ascii_digit() {
                self.pos += 1;
            }
        }
        if !self.eof() && matches!(self.bytes[self.pos], b'e' | b'E') {
            self.pos += 1;
            if !self.eof() && matches!(self.bytes[self.pos], b'+' | b'-') {
                self.pos += 1;
            }
            while !self.eof() && self.bytes[self.pos].is_ascii_digit() {
                self.pos += 1;
            }
        }
        if self.eof() {
            // Ran off the end while still reading digits — could still grow.
            self.healed = true;
            return Some(ValueOutcome::Dropped);
        }
        let text = &self.text[start..self.pos];
        let number = if let Ok(i) = text.parse::<i64>() {
            serde_json::Number::from(i)
        } else {
            serde_json::Number::from_f64(text.parse::<f64>().ok()?)?
        };
        Some(ValueOutcome::Present(Value::Number(number)))
    }

    fn parse_object(&mut self) -> Option<ValueOutcome> {
        self.pos += 1;
        let mut map = serde_json::Map::new();
        loop {
            self.skip_ws();
            if self.eof() {
                self.healed = true;
                break;
            }
            if self.bytes[self.pos] == b'}' {
                self.pos += 1;
                break;
            }
            if self.bytes[self.pos] != b'"' {
                return None;
            }
            let key_heal_before = self.healed;
            let key = self.parse_string()?;
            if self.healed && !key_heal_before {
                // The key itself was mid-write; store it (with the marker spliced in)
                // so the dumper can recognize the truncated key and stop there.
                map.insert(key, Value::Null);
                break;
            }
            self.skip_ws();
            if self.eof() {
                self.healed = true;
                map.insert(key, Value::Null);
                break;
            }
            if self.bytes[self.pos] != b':' {
                return None;
            }
            self.pos += 1;
            match self.parse_value()? {
                ValueOutcome::Present(v) => {
                    map.insert(key, v);
                }
                ValueOutcome::Dropped => {
                    self.healed = true;
                    break;
                }
            }
            self.skip_ws();
            if self.eof() {
                self.healed = true;
                break;
            }
            match self.bytes[self.pos] {
                b'}' => {
                    self.pos += 1;
                    break;
                }
                b',' => {
                    self.pos += 1;
                }
                _ => return None,
            }
        }
        Some(ValueOutcome::Present(Value::Object(map)))
    }

    fn parse_array(&mut self) -> Option<ValueOutcome> {
        self.pos += 1;
        let mut items = Vec::new();
        loop {
            self.skip_ws();
            if self.eof() {
                self.healed = true;
                break;
            }
            if self.bytes[self.pos] == b']' {
                self.pos += 1;
                break;
            }
            match self.parse_value()? {
                ValueOutcome::Present(v) => items.push(v),
                ValueOutcome::Dropped => {
                    self.healed = true;
                    break;
                }
            }
            self.skip_ws();
            if self.eof() {
                self.healed = true;
                break;
            }
            match self.bytes[self.pos] {
                b']' => {
                    self.pos += 1;
                    break;
                }
                b',' => {
                    self.pos += 1;
                }
                _ => return None,
            }
        }
        Some(ValueOutcome::Present(Value::Array(items)))
    }
}

fn utf8_len(lead_byte: u8) -> usize {
    if lead_byte & 0x80 == 0 {
        1
    } else if lead_byte & 0xE0 == 0xC0 {
        2
    } else if lead_byte & 0xF0 == 0xE0 {
        3
    } else {
        4
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MARKER: &str = "XHEALXMARKERX";

    #[test]
    fn complete_json_has_no_healing() {
        let healed = DefaultPartialJsonParser.parse(r#"{"a":1}"#, MARKER).unwrap();
        assert!(healed.healing.is_none());
        assert_eq!(healed.value, serde_json::json!({"a": 1}));
    }

    #[test]
    fn truncated_after_colon_inserts_marker_placeholder() {
        let healed = DefaultPartialJsonParser
            .parse(r#"{"name":"sum","arguments":{"a":1,"b":"#, MARKER)
            .unwrap();
        assert!(healed.healing.is_some());
        assert_eq!(
            healed.value,
            serde_json::json!({"name": "sum", "arguments": {"a": 1, "b": MARKER}})
        );
    }

    #[test]
    fn truncated_mid_string_appends_marker() {
        let healed = DefaultPartialJsonParser.parse(r#"{"name":"su"#, MARKER).unwrap();
        assert!(healed.healing.is_some());
        assert_eq!(
            healed.value,
            serde_json::json!({"name": format!("su{MARKER}")})
        );
    }

    #[test]
    fn truncated_mid_number_drops_the_field() {
        let healed = DefaultPartialJsonParser
            .parse(r#"{"a":1,"b":12"#, MARKER)
            .unwrap();
        assert!(healed.healing.is_some());
        assert_eq!(healed.value, serde_json::json!({"a": 1}));
    }

    #[test]
    fn truncated_key_stores_marker_key_with_null() {
        let healed = DefaultPartialJsonParser.parse(r#"{"a":1,"ar"#, MARKER).unwrap();
        assert!(healed.healing.is_some());
        let obj = healed.value.as_object().unwrap();
        assert_eq!(obj["a"], 1);
        assert!(obj.keys().any(|k| k.contains(MARKER)));
    }

    #[test]
    fn array_truncated_mid_element_is_dropped() {
        let healed = DefaultPartialJsonParser.parse(r#"[1, 2, 3"#, MARKER).unwrap();
        assert!(healed.healing.is_some());
        assert_eq!(healed.value, serde_json::json!([1, 2]));
    }

    #[test]
    fn unclosed_array_with_trailing_comma_closes_without_marker() {
        let healed = DefaultPartialJsonParser.parse(r#"[1, 2,"#, MARKER).unwrap();
        assert!(healed.healing.is_some());
        assert_eq!(healed.value, serde_json::json!([1, 2]));
    }

    #[test]
    fn keyword_true_complete_at_eof_is_not_dropped() {
        let healed = DefaultPartialJsonParser.parse(r#"{"a":true"#, MARKER).unwrap();
        assert!(healed.healing.is_some()); // object itself still unclosed
        assert_eq!(healed.value, serde_json::json!({"a": true}));
    }

    #[test]
    fn keyword_partial_prefix_is_dropped() {
        let healed = DefaultPartialJsonParser.parse(r#"{"a":tru"#, MARKER).unwrap();
        assert!(healed.healing.is_some());
        assert_eq!(healed.value, serde_json::json!({}));
    }

    #[test]
    fn malformed_json_is_a_hard_failure() {
        assert!(DefaultPartialJsonParser.parse(r#"{"a": invalid}"#, MARKER).is_none());
    }

    #[test]
    fn escapes_roundtrip_through_truncated_string() {
        let healed = DefaultPartialJsonParser
            .parse(r#"{"q":"He said \"hi\" and \n more"#, MARKER)
            .unwrap();
        let obj = healed.value.as_object().unwrap();
        assert_eq!(obj["q"], format!("He said \"hi\" and \n more{MARKER}"));
    }
}
